use std::collections::BTreeMap;

use chrono::Utc;
use kharcha_core::{
    default_categories, history, Category, CategoryStore, CategorySuggestion, Money, RawMessage,
    StoreError, Transaction, TransactionStore,
};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::engine::SmsEngine;

/// What happened to one ingested batch.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub received: usize,
    /// Transactions assembled from this batch, including ones already stored.
    pub assembled: Vec<Transaction>,
    pub inserted: usize,
    pub skipped_duplicates: usize,
    pub rejected: BTreeMap<&'static str, usize>,
}

/// A proposed category change from the enhancement pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recategorization {
    pub transaction_id: String,
    pub previous: String,
    pub suggestion: CategorySuggestion,
}

/// Connects the engine to a transaction store.
///
/// Every read-modify-write of the history goes through one lock, so merges
/// and corrections never interleave.
pub struct TransactionService<S> {
    engine: SmsEngine,
    store: S,
    write_lock: Mutex<()>,
}

impl<S: TransactionStore> TransactionService<S> {
    pub fn new(engine: SmsEngine, store: S) -> Self {
        Self {
            engine,
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn engine(&self) -> &SmsEngine {
        &self.engine
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Assemble `messages` and merge the result into the stored history.
    ///
    /// Safe to retry with the same batch: already-known source messages are skipped.
    pub async fn ingest(&self, messages: &[RawMessage]) -> Result<IngestReport, StoreError> {
        let outcome = self.engine.process_batch(messages, Utc::now());

        let _guard = self.write_lock.lock().await;
        let existing = self.store.get_all().await?;
        let merged = history::merge(outcome.transactions.clone(), existing);
        if merged.inserted > 0 {
            self.store.save_batch(&merged.history).await?;
        }

        tracing::info!(
            received = messages.len(),
            inserted = merged.inserted,
            skipped = merged.skipped,
            rejected = outcome.rejected_total(),
            "merged message batch"
        );

        Ok(IngestReport {
            received: messages.len(),
            assembled: outcome.transactions,
            inserted: merged.inserted,
            skipped_duplicates: merged.skipped,
            rejected: outcome.rejected,
        })
    }

    pub async fn history(&self) -> Result<Vec<Transaction>, StoreError> {
        self.store.get_all().await
    }

    /// Store a user correction. The record is matched by `id` and always
    /// comes back with `is_edited` set.
    pub async fn update_transaction(&self, tx: Transaction) -> Result<Transaction, StoreError> {
        let edited = tx.into_edited()?;
        let _guard = self.write_lock.lock().await;
        self.store.update_one(&edited).await?;
        tracing::debug!(transaction_id = %edited.id, "transaction corrected");
        Ok(edited)
    }

    /// Enhancement suggestions for every stored transaction whose category
    /// would change. User-edited records are left out.
    pub async fn suggest_categories(
        &self,
        categories: &[Category],
    ) -> Result<Vec<Recategorization>, StoreError> {
        let classifier = self.engine.assembler().classifier();
        Ok(self
            .store
            .get_all()
            .await?
            .iter()
            .filter(|tx| !tx.is_edited)
            .filter_map(|tx| {
                let suggestion = classifier.enhance(tx, categories);
                (suggestion.category != tx.category).then(|| Recategorization {
                    transaction_id: tx.id.clone(),
                    previous: tx.category.clone(),
                    suggestion,
                })
            })
            .collect())
    }

    /// Persist accepted suggestions. Returns how many records changed.
    pub async fn apply_suggestions(&self, changes: &[Recategorization]) -> Result<usize, StoreError> {
        if changes.is_empty() {
            return Ok(0);
        }
        let _guard = self.write_lock.lock().await;
        let mut stored = self.store.get_all().await?;
        let mut applied = 0;
        for change in changes {
            if let Some(tx) = stored
                .iter_mut()
                .find(|t| t.id == change.transaction_id && !t.is_edited)
            {
                tx.category = change.suggestion.category.clone();
                tx.confidence = change.suggestion.confidence;
                applied += 1;
            }
        }
        if applied > 0 {
            self.store.save_batch(&stored).await?;
        }
        tracing::info!(applied, "applied category suggestions");
        Ok(applied)
    }

    pub async fn monthly_spending(
        &self,
        year: i32,
        month: u32,
    ) -> Result<BTreeMap<String, Money>, StoreError> {
        Ok(history::monthly_spending(&self.store.get_all().await?, year, month))
    }

    pub async fn current_balance(&self) -> Result<Option<Money>, StoreError> {
        Ok(history::current_balance(&self.store.get_all().await?))
    }
}

/// Seed the default categories when the store has none, then return the
/// stored list.
pub async fn initialize_categories<C>(store: &C) -> Result<Vec<Category>, StoreError>
where
    C: CategoryStore + ?Sized,
{
    let existing = store.get_categories().await?;
    if !existing.is_empty() {
        return Ok(existing);
    }
    let defaults = default_categories();
    store.save_categories(&defaults).await?;
    tracing::info!(count = defaults.len(), "seeded default categories");
    Ok(defaults)
}
