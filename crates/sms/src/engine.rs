use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use kharcha_core::{RawMessage, Transaction};

use crate::assemble::{Assembler, Rejection};
use crate::bank::BankRegistry;
use crate::classify::CategoryClassifier;

/// Outcome of running a batch through the assembler.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Assembled transactions, in message order.
    pub transactions: Vec<Transaction>,
    /// Rejected message count per [`Rejection::kind`].
    pub rejected: BTreeMap<&'static str, usize>,
}

impl BatchOutcome {
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

/// Batch front-end over [`Assembler`].
#[derive(Debug, Clone)]
pub struct SmsEngine {
    assembler: Assembler,
}

impl SmsEngine {
    pub fn new(registry: Arc<BankRegistry>, classifier: Arc<CategoryClassifier>) -> Self {
        Self {
            assembler: Assembler::new(registry, classifier),
        }
    }

    pub fn assembler(&self) -> &Assembler {
        &self.assembler
    }

    /// Assemble every message, dropping the ones that are rejected.
    pub fn process_messages(&self, messages: &[RawMessage]) -> Vec<Transaction> {
        self.process_batch(messages, Utc::now()).transactions
    }

    /// Like [`Self::process_messages`], stamping every id with `assembled_at`
    /// and keeping rejection counts.
    pub fn process_batch(&self, messages: &[RawMessage], assembled_at: DateTime<Utc>) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for msg in messages {
            match self.assembler.assemble(msg, assembled_at) {
                Ok(tx) => outcome.transactions.push(tx),
                Err(rejection) => {
                    tracing::debug!(message_id = %msg.id, sender = %msg.sender, reason = %rejection, "message rejected");
                    *outcome.rejected.entry(rejection.kind()).or_insert(0) += 1;
                }
            }
        }
        outcome
    }
}

impl Default for SmsEngine {
    fn default() -> Self {
        Self::new(
            Arc::new(BankRegistry::builtin()),
            Arc::new(CategoryClassifier::default()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn msg(id: &str, sender: &str, body: &str) -> RawMessage {
        RawMessage::new(id, sender, body, Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap())
    }

    #[test]
    fn batch_keeps_order_and_counts_rejections() {
        let engine = SmsEngine::default();
        let outcome = engine.process_batch(
            &[
                msg("1", "SBIALERT", "Rs.10.00 debited from A/c **1234"),
                msg("2", "UNKNOWNBANK", "Rs.10.00 debited from A/c **1234"),
                msg("3", "HDFCBK", "Rs.20.00 credited to A/c **5678"),
                msg("4", "HDFCBK", "Your OTP is 4321"),
                msg("5", "AXISBK", "Rs.0.00 debited"),
            ],
            Utc::now(),
        );
        let ids: Vec<_> = outcome
            .transactions
            .iter()
            .map(|t| t.source_message_id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(outcome.rejected.get("unrecognized_sender"), Some(&1));
        assert_eq!(outcome.rejected.get("incomplete_extraction"), Some(&1));
        assert_eq!(outcome.rejected.get("malformed_amount"), Some(&1));
        assert_eq!(outcome.rejected_total(), 3);
    }

    #[test]
    fn process_messages_empty_batch() {
        assert!(SmsEngine::default().process_messages(&[]).is_empty());
    }
}
