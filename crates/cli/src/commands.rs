use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local};
use kharcha_core::{filter_known_senders, DateRange, RawMessage, StoreError, Transaction, TransactionStore};
use kharcha_sms::{initialize_categories, BankRegistry, TransactionService};
use kharcha_storage::SqliteStore;
use serde::Serialize;

type Service = TransactionService<SqliteStore>;

#[derive(Debug, Serialize)]
struct IngestSummary<'a> {
    received: usize,
    assembled: usize,
    inserted: usize,
    skipped_duplicates: usize,
    rejected: &'a std::collections::BTreeMap<&'static str, usize>,
}

pub fn read_messages(path: &Path) -> Result<Vec<RawMessage>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of messages", path.display()))
}

pub async fn ingest(service: &Service, file: &Path, known_only: bool, json: bool) -> Result<()> {
    let mut messages = read_messages(file)?;
    if known_only {
        let before = messages.len();
        messages = filter_known_senders(messages);
        tracing::info!(dropped = before - messages.len(), "filtered unknown senders");
    }

    let report = service.ingest(&messages).await?;
    let summary = IngestSummary {
        received: report.received,
        assembled: report.assembled.len(),
        inserted: report.inserted,
        skipped_duplicates: report.skipped_duplicates,
        rejected: &report.rejected,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "{} messages, {} assembled, {} new, {} already stored",
        summary.received, summary.assembled, summary.inserted, summary.skipped_duplicates
    );
    for (reason, count) in summary.rejected {
        println!("  rejected ({reason}): {count}");
    }
    Ok(())
}

fn print_row(tx: &Transaction) {
    let sign = if tx.is_debit() { "-" } else { "+" };
    let edited = if tx.is_edited { " *" } else { "" };
    println!(
        "{}  {:<20} {}{:>12}  {:<18} {:<10} {}{}",
        tx.date.format("%Y-%m-%d %H:%M"),
        tx.id,
        sign,
        tx.amount.to_string(),
        tx.category,
        tx.account,
        tx.description,
        edited
    );
}

pub async fn list(service: &Service, limit: Option<usize>, json: bool) -> Result<()> {
    let mut history = service.history().await?;
    if let Some(limit) = limit {
        history.truncate(limit);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }
    if history.is_empty() {
        println!("No transactions.");
    }
    for tx in &history {
        print_row(tx);
    }
    Ok(())
}

pub async fn spending(
    service: &Service,
    year: Option<i32>,
    month: Option<u32>,
    json: bool,
) -> Result<()> {
    let today = Local::now().date_naive();
    let year = year.unwrap_or(today.year());
    let month = month.unwrap_or(today.month());
    let Some(range) = DateRange::month(year, month) else {
        bail!("month must be between 1 and 12, got {month}");
    };

    let totals = service.monthly_spending(year, month).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&totals)?);
        return Ok(());
    }

    println!("Spending for {range}");
    if totals.is_empty() {
        println!("  nothing recorded");
    }
    for (category, total) in &totals {
        println!("  {category:<20} {total}");
    }
    let total: kharcha_core::Money = totals.values().copied().sum();
    println!("  {:<20} {total}", "Total");
    Ok(())
}

pub async fn balance(service: &Service) -> Result<()> {
    match service.current_balance().await? {
        Some(balance) => println!("{balance}"),
        None => println!("No balance reported yet."),
    }
    Ok(())
}

pub async fn categorize(service: &Service, apply: bool, json: bool) -> Result<()> {
    let categories = initialize_categories(service.store()).await?;
    let changes = service.suggest_categories(&categories).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&changes)?);
    } else if changes.is_empty() {
        println!("No category changes suggested.");
    } else {
        for change in &changes {
            println!(
                "{:<20} {} -> {} ({:.2})",
                change.transaction_id,
                change.previous,
                change.suggestion.category,
                change.suggestion.confidence
            );
        }
    }

    if apply {
        let applied = service.apply_suggestions(&changes).await?;
        if !json {
            println!("Applied {applied} suggestion(s).");
        }
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct Edit {
    pub category: Option<String>,
    pub description: Option<String>,
    pub merchant: Option<String>,
}

impl Edit {
    fn is_empty(&self) -> bool {
        self.category.is_none() && self.description.is_none() && self.merchant.is_none()
    }

    fn apply(self, tx: &mut Transaction) {
        if let Some(category) = self.category {
            tx.category = category;
        }
        if let Some(description) = self.description {
            tx.description = description;
        }
        if let Some(merchant) = self.merchant {
            tx.merchant = Some(merchant).filter(|m| !m.trim().is_empty());
        }
    }
}

pub async fn edit(service: &Service, id: &str, edit: Edit) -> Result<()> {
    if edit.is_empty() {
        bail!("nothing to change; pass --category, --description or --merchant");
    }

    let mut tx = service
        .store()
        .get_all()
        .await?
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
    edit.apply(&mut tx);

    let saved = service.update_transaction(tx).await?;
    print_row(&saved);
    Ok(())
}

pub fn banks(registry: &BankRegistry) {
    for profile in registry.profiles() {
        println!("{:<22} {}", profile.name, profile.sender_ids.join(", "));
    }
    for overlap in registry.sender_overlaps() {
        tracing::warn!(
            "sender id {} of {} also matches {} ({}); {} wins",
            overlap.shadowed_id,
            overlap.shadowed,
            overlap.winner,
            overlap.winner_id,
            overlap.winner
        );
    }
}
