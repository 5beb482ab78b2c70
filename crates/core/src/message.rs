use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single SMS as handed over by the message source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Unique per message; becomes the dedup key of the resulting transaction.
    pub id: String,
    pub sender: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

impl RawMessage {
    pub fn new(id: &str, sender: &str, body: &str, timestamp: DateTime<Utc>) -> Self {
        RawMessage {
            id: id.to_string(),
            sender: sender.to_string(),
            body: body.to_string(),
            timestamp,
        }
    }
}

/// Sender codes of banks and wallets that the message source keeps when it
/// scans the inbox.
pub const KNOWN_SENDERS: &[&str] = &[
    "SBIALERT", "SBIUPI", "SBIPAY", "HDFCBK", "HDFCUPI", "ICICIB", "ICICIUPI", "AXISBK",
    "AXISUPI", "KOTAKBK", "YESBNK", "PAYTM", "GPAY", "PHONEPE", "AMAZONPAY",
];

/// Keeps messages whose sender contains one of [`KNOWN_SENDERS`], ignoring case.
pub fn filter_known_senders(messages: Vec<RawMessage>) -> Vec<RawMessage> {
    messages
        .into_iter()
        .filter(|m| {
            let sender = m.sender.to_uppercase();
            KNOWN_SENDERS.iter().any(|id| sender.contains(id))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(id: &str, sender: &str) -> RawMessage {
        RawMessage::new(id, sender, "body", Utc::now())
    }

    #[test]
    fn filter_keeps_bank_and_wallet_senders() {
        let kept = filter_known_senders(vec![
            msg("1", "AD-SBIALERT"),
            msg("2", "VM-hdfcbk"),
            msg("3", "+919876543210"),
            msg("4", "JD-PHONEPE"),
            msg("5", "SWIGGY"),
        ]);
        let ids: Vec<_> = kept.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "4"]);
    }

    #[test]
    fn message_deserializes_from_json() {
        let json = r#"{"id":"sms_1","sender":"SBIALERT","body":"hi","timestamp":"2025-01-15T14:30:00Z"}"#;
        let m: RawMessage = serde_json::from_str(json).unwrap();
        assert_eq!(m.id, "sms_1");
        assert_eq!(m.timestamp.to_rfc3339(), "2025-01-15T14:30:00+00:00");
    }
}
