use async_trait::async_trait;
use std::sync::Mutex;
use thiserror::Error;

use super::category::Category;
use super::history;
use super::transaction::Transaction;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Transaction not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid transaction: {0}")]
    Invalid(#[from] super::transaction::TransactionError),
}

/// Persisted transaction history.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Every stored transaction, newest first.
    async fn get_all(&self) -> Result<Vec<Transaction>, StoreError>;

    /// Persist the full merged history.
    async fn save_batch(&self, history: &[Transaction]) -> Result<(), StoreError>;

    /// Replace the record with the same `id`.
    async fn update_one(&self, tx: &Transaction) -> Result<(), StoreError>;
}

/// User-editable category list.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn get_categories(&self) -> Result<Vec<Category>, StoreError>;

    async fn save_categories(&self, categories: &[Category]) -> Result<(), StoreError>;
}

/// Process-local store, used by tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    transactions: Mutex<Vec<Transaction>>,
    categories: Mutex<Vec<Category>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Backend("in-memory store lock poisoned".to_string())
    }
}

#[async_trait]
impl TransactionStore for InMemoryStore {
    async fn get_all(&self) -> Result<Vec<Transaction>, StoreError> {
        Ok(self.transactions.lock().map_err(|_| Self::poisoned())?.clone())
    }

    async fn save_batch(&self, history: &[Transaction]) -> Result<(), StoreError> {
        *self.transactions.lock().map_err(|_| Self::poisoned())? = history.to_vec();
        Ok(())
    }

    async fn update_one(&self, tx: &Transaction) -> Result<(), StoreError> {
        let mut guard = self.transactions.lock().map_err(|_| Self::poisoned())?;
        if history::replace_by_id(&mut guard, tx.clone()) {
            Ok(())
        } else {
            Err(StoreError::NotFound(tx.id.clone()))
        }
    }
}

#[async_trait]
impl CategoryStore for InMemoryStore {
    async fn get_categories(&self) -> Result<Vec<Category>, StoreError> {
        Ok(self.categories.lock().map_err(|_| Self::poisoned())?.clone())
    }

    async fn save_categories(&self, categories: &[Category]) -> Result<(), StoreError> {
        *self.categories.lock().map_err(|_| Self::poisoned())? = categories.to_vec();
        Ok(())
    }
}
