use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::money::Money;

pub const UNKNOWN_ACCOUNT: &str = "Unknown Account";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Debit,
    Credit,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Debit => write!(f, "debit"),
            TransactionType::Credit => write!(f, "credit"),
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debit" => Ok(TransactionType::Debit),
            "credit" => Ok(TransactionType::Credit),
            other => Err(format!("Unknown transaction type: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransactionError {
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(Money),
    #[error("Confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f32),
    #[error("Transaction {0} has an empty source message id")]
    MissingSource(String),
}

/// A bank transaction recovered from one SMS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub amount: Money,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub description: String,
    pub category: String,
    pub date: DateTime<Utc>,
    /// Masked suffix such as `****1234`, or [`UNKNOWN_ACCOUNT`].
    pub account: String,
    pub balance: Option<Money>,
    pub merchant: Option<String>,
    pub upi_id: Option<String>,
    pub is_upi: bool,
    /// Dedup key: the id of the SMS this record came from.
    pub source_message_id: String,
    pub bank_name: String,
    pub confidence: f32,
    pub is_edited: bool,
    pub raw_text: String,
}

impl Transaction {
    pub fn validate(&self) -> Result<(), TransactionError> {
        if !self.amount.is_positive() {
            return Err(TransactionError::NonPositiveAmount(self.amount));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(TransactionError::ConfidenceOutOfRange(self.confidence));
        }
        if self.source_message_id.is_empty() {
            return Err(TransactionError::MissingSource(self.id.clone()));
        }
        Ok(())
    }

    /// Marks the record as a user correction.
    pub fn into_edited(self) -> Result<Self, TransactionError> {
        self.validate()?;
        Ok(Transaction {
            is_edited: true,
            ..self
        })
    }

    pub fn is_debit(&self) -> bool {
        self.kind == TransactionType::Debit
    }
}
