use std::sync::Arc;

use chrono::{DateTime, Utc};
use kharcha_core::{RawMessage, Transaction};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::bank::BankRegistry;
use crate::classify::CategoryClassifier;
use crate::confidence;
use crate::describe::describe;
use crate::extract::Extractor;

/// Why a message produced no transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Sender '{0}' matches no bank profile")]
    UnrecognizedSender(String),
    #[error("Message has no {0}")]
    IncompleteExtraction(&'static str),
    #[error("Amount '{0}' is not a positive number")]
    MalformedAmount(String),
}

impl Rejection {
    /// Short stable label, used for report counters.
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::UnrecognizedSender(_) => "unrecognized_sender",
            Rejection::IncompleteExtraction(_) => "incomplete_extraction",
            Rejection::MalformedAmount(_) => "malformed_amount",
        }
    }
}

/// Turns one raw message into a transaction. Pure: no I/O, no shared state.
#[derive(Debug, Clone)]
pub struct Assembler {
    registry: Arc<BankRegistry>,
    classifier: Arc<CategoryClassifier>,
}

impl Assembler {
    pub fn new(registry: Arc<BankRegistry>, classifier: Arc<CategoryClassifier>) -> Self {
        Self { registry, classifier }
    }

    pub fn registry(&self) -> &BankRegistry {
        &self.registry
    }

    pub fn classifier(&self) -> &CategoryClassifier {
        &self.classifier
    }

    pub fn assemble(
        &self,
        msg: &RawMessage,
        assembled_at: DateTime<Utc>,
    ) -> Result<Transaction, Rejection> {
        let profile = self
            .registry
            .resolve(&msg.sender)
            .ok_or_else(|| Rejection::UnrecognizedSender(msg.sender.clone()))?;

        let fields = Extractor::extract(&msg.body, profile);

        let amount = match (fields.amount, &fields.amount_text) {
            (Some(amount), _) => amount,
            (None, Some(text)) => return Err(Rejection::MalformedAmount(text.clone())),
            (None, None) => return Err(Rejection::IncompleteExtraction("amount")),
        };
        let kind = fields
            .kind
            .ok_or(Rejection::IncompleteExtraction("transaction type"))?;

        let merchant = fields.merchant.as_deref();
        Ok(Transaction {
            id: transaction_id(&msg.id, assembled_at),
            amount,
            kind,
            description: describe(&msg.body, merchant, fields.is_upi),
            category: self
                .classifier
                .initial_category(&msg.body, merchant, fields.is_upi),
            date: msg.timestamp,
            account: fields.account,
            balance: fields.balance,
            merchant: fields.merchant,
            upi_id: fields.upi_id,
            is_upi: fields.is_upi,
            source_message_id: msg.id.clone(),
            bank_name: profile.name.clone(),
            confidence: confidence::score(&msg.body),
            is_edited: false,
            raw_text: msg.body.clone(),
        })
    }
}

/// `txn_` followed by the first 16 hex digits of
/// SHA-256(`source_id` `:` assembly time in milliseconds).
pub fn transaction_id(source_id: &str, assembled_at: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_id.as_bytes());
    hasher.update(b":");
    hasher.update(assembled_at.timestamp_millis().to_be_bytes());
    let digest: [u8; 32] = hasher.finalize().into();
    let hex: String = digest[..8].iter().map(|b| format!("{b:02x}")).collect();
    format!("txn_{hex}")
}
