//! The persisted transaction history: dedup merge and read-side summaries.

use std::collections::{BTreeMap, HashSet};

use super::money::Money;
use super::period::DateRange;
use super::transaction::Transaction;

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// Full history, newest first.
    pub history: Vec<Transaction>,
    pub inserted: usize,
    /// New records dropped because their source message was already present.
    pub skipped: usize,
}

/// Folds `incoming` into `existing`, skipping any record whose
/// `source_message_id` is already known (including earlier records of the
/// same batch), then orders the result by date, newest first.
///
/// The sort is stable, so records sharing a timestamp keep their relative order.
pub fn merge(incoming: Vec<Transaction>, existing: Vec<Transaction>) -> MergeOutcome {
    let mut seen: HashSet<String> = existing
        .iter()
        .map(|t| t.source_message_id.clone())
        .collect();
    let mut history = existing;
    let mut inserted = 0;
    let mut skipped = 0;

    for tx in incoming {
        if seen.insert(tx.source_message_id.clone()) {
            history.push(tx);
            inserted += 1;
        } else {
            skipped += 1;
        }
    }

    history.sort_by(|a, b| b.date.cmp(&a.date));

    MergeOutcome {
        history,
        inserted,
        skipped,
    }
}

/// Replaces the record with the same `id` in place. Returns `false` when no
/// record matched. Ordering is left alone.
pub fn replace_by_id(history: &mut [Transaction], updated: Transaction) -> bool {
    match history.iter_mut().find(|t| t.id == updated.id) {
        Some(slot) => {
            *slot = updated;
            true
        }
        None => false,
    }
}

/// Total debited per category within the calendar month.
pub fn monthly_spending(
    history: &[Transaction],
    year: i32,
    month: u32,
) -> BTreeMap<String, Money> {
    let mut spending = BTreeMap::new();
    let Some(range) = DateRange::month(year, month) else {
        return spending;
    };

    for tx in history
        .iter()
        .filter(|t| t.is_debit() && range.contains_instant(t.date))
    {
        let total = spending.entry(tx.category.clone()).or_insert_with(Money::zero);
        *total = *total + tx.amount;
    }
    spending
}

/// Balance reported by the newest transaction that carries one.
pub fn current_balance(history: &[Transaction]) -> Option<Money> {
    history
        .iter()
        .filter(|t| t.balance.is_some())
        .max_by_key(|t| t.date)
        .and_then(|t| t.balance)
}
