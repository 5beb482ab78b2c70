use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use kharcha_core::{default_categories, InMemoryStore, Money, RawMessage, StoreError, TransactionType};
use kharcha_sms::{SmsEngine, TransactionService, UPI_CATEGORY};

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, day, hour, 0, 0).unwrap()
}

fn msg(id: &str, sender: &str, body: &str, day: u32, hour: u32) -> RawMessage {
    RawMessage::new(id, sender, body, at(day, hour))
}

fn inbox() -> Vec<RawMessage> {
    vec![
        msg(
            "sms_1",
            "SBIALERT",
            "Rs.500.00 debited from your SBI A/c **1234 on 15-Jan-25 at SWIGGY BANGALORE. Available balance: Rs.15,000.00",
            15,
            14,
        ),
        msg(
            "sms_2",
            "HDFCBK",
            "Rs.2500.00 credited to your HDFC Bank A/c **5678 on 15-Jan-25. Salary credit from TECHCORP INDIA. Balance: Rs.45,000.00",
            15,
            9,
        ),
        msg(
            "sms_3",
            "ICICIUPI",
            "UPI payment of Rs.150.00 sent to phonepe@ybl via ICICI Bank A/c **9012. UPI Ref: 789123456789. Balance: Rs.12,850.00",
            15,
            12,
        ),
        msg(
            "sms_4",
            "AXISBK",
            "Rs.800.00 debited from Axis Bank A/c **3456 on 14-Jan-25 for AMAZON PAY purchase. Available balance: Rs.25,200.00",
            14,
            18,
        ),
        msg(
            "sms_5",
            "SBIALERT",
            "Rs.1200.00 debited from your SBI A/c **1234 on 14-Jan-25 at BIG BAZAAR MUMBAI. Available balance: Rs.14,000.00",
            14,
            16,
        ),
    ]
}

fn service() -> TransactionService<InMemoryStore> {
    TransactionService::new(SmsEngine::default(), InMemoryStore::new())
}

#[test]
fn scenario_a_card_debit_at_merchant() {
    let engine = SmsEngine::default();
    let txs = engine.process_messages(&inbox()[..1]);
    let tx = &txs[0];
    assert_eq!(tx.amount, Money::from_paise(500_00));
    assert_eq!(tx.kind, TransactionType::Debit);
    assert!(!tx.is_upi);
    assert_eq!(tx.balance, Some(Money::from_paise(15_000_00)));
    assert_eq!(tx.category, "Food & Dining");
    assert_eq!(tx.account, "****1234");
    assert_eq!(tx.bank_name, "State Bank of India");
}

#[test]
fn scenario_b_upi_payment() {
    let engine = SmsEngine::default();
    let txs = engine.process_messages(&inbox()[2..3]);
    let tx = &txs[0];
    assert_eq!(tx.amount, Money::from_paise(150_00));
    assert_eq!(tx.kind, TransactionType::Debit);
    assert!(tx.is_upi);
    assert_eq!(tx.upi_id.as_deref(), Some("phonepe@ybl"));
    assert_eq!(tx.balance, Some(Money::from_paise(12_850_00)));
    assert_eq!(tx.category, UPI_CATEGORY);
    assert_eq!(tx.description, "UPI payment to phonepe");
}

#[test]
fn scenario_c_unknown_sender_produces_nothing() {
    let engine = SmsEngine::default();
    let body = "Rs.500.00 debited from your A/c **1234 at SWIGGY BANGALORE";
    assert!(engine
        .process_messages(&[msg("x", "UNKNOWNBANK", body, 15, 10)])
        .is_empty());
}

#[test]
fn scenario_d_debit_takes_precedence() {
    let engine = SmsEngine::default();
    let body = "Rs.300.00 debited from A/c **1234 and Rs.300.00 credited to A/c **9876";
    let txs = engine.process_messages(&[msg("x", "SBIALERT", body, 15, 10)]);
    assert_eq!(txs[0].kind, TransactionType::Debit);
}

#[tokio::test]
async fn scenario_e_same_source_id_persists_once() {
    let service = service();
    let first = msg("dup", "SBIALERT", "Rs.10.00 debited from A/c **1234", 15, 10);
    let second = msg("dup", "SBIALERT", "Rs.10.00 debited from A/c **1234", 15, 11);

    let r1 = service.ingest(&[first]).await.unwrap();
    let r2 = service.ingest(&[second]).await.unwrap();

    assert_eq!(r1.inserted, 1);
    assert_eq!(r2.inserted, 0);
    assert_eq!(r2.skipped_duplicates, 1);
    assert_eq!(service.history().await.unwrap().len(), 1);
}

#[tokio::test]
async fn reingesting_a_batch_never_duplicates() {
    let service = service();
    service.ingest(&inbox()).await.unwrap();
    service.ingest(&inbox()).await.unwrap();

    let history = service.history().await.unwrap();
    let sources: HashSet<_> = history.iter().map(|t| t.source_message_id.clone()).collect();
    assert_eq!(history.len(), 5);
    assert_eq!(sources.len(), 5);
}

#[tokio::test]
async fn concurrent_ingests_are_serialized() {
    let service = Arc::new(service());
    let a = {
        let s = Arc::clone(&service);
        tokio::spawn(async move { s.ingest(&inbox()).await })
    };
    let b = {
        let s = Arc::clone(&service);
        tokio::spawn(async move { s.ingest(&inbox()).await })
    };
    let (ra, rb) = (a.await.unwrap().unwrap(), b.await.unwrap().unwrap());

    assert_eq!(ra.inserted + rb.inserted, 5);
    assert_eq!(service.history().await.unwrap().len(), 5);
}

#[tokio::test]
async fn history_is_sorted_newest_first() {
    let service = service();
    service.ingest(&inbox()[3..]).await.unwrap();
    service.ingest(&inbox()[..3]).await.unwrap();

    let history = service.history().await.unwrap();
    assert!(history.windows(2).all(|w| w[0].date >= w[1].date));
    assert_eq!(history[0].source_message_id, "sms_1");
}

#[tokio::test]
async fn assembled_records_respect_invariants() {
    let service = service();
    let report = service.ingest(&inbox()).await.unwrap();
    assert_eq!(report.received, 5);
    assert_eq!(report.assembled.len(), 5);
    for tx in &report.assembled {
        assert!(tx.amount.is_positive());
        assert!((0.0..=1.0).contains(&tx.confidence));
        assert!(tx.validate().is_ok());
    }
}

#[tokio::test]
async fn correction_marks_edited_without_reordering() {
    let service = service();
    service.ingest(&inbox()).await.unwrap();
    let before = service.history().await.unwrap();

    let mut tx = before[2].clone();
    tx.category = "Groceries".to_string();
    let saved = service.update_transaction(tx.clone()).await.unwrap();
    assert!(saved.is_edited);

    let after = service.history().await.unwrap();
    assert_eq!(after[2].id, tx.id);
    assert_eq!(after[2].category, "Groceries");
    assert!(after[2].is_edited);
    assert_eq!(
        before.iter().map(|t| &t.id).collect::<Vec<_>>(),
        after.iter().map(|t| &t.id).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn correction_of_unknown_id_fails() {
    let service = service();
    service.ingest(&inbox()[..1]).await.unwrap();
    let mut tx = service.history().await.unwrap().remove(0);
    tx.id = "txn_missing".to_string();
    assert!(matches!(
        service.update_transaction(tx).await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn enhancement_never_lowers_confidence_and_skips_edits() {
    let service = service();
    service.ingest(&inbox()).await.unwrap();
    let categories = default_categories();

    let before = service.history().await.unwrap();
    let changes = service.suggest_categories(&categories).await.unwrap();
    for change in &changes {
        let original = before.iter().find(|t| t.id == change.transaction_id).unwrap();
        assert!(change.suggestion.confidence >= original.confidence);
        assert_ne!(change.suggestion.category, original.category);
    }

    let applied = service.apply_suggestions(&changes).await.unwrap();
    assert_eq!(applied, changes.len());
    assert!(service.suggest_categories(&categories).await.unwrap().is_empty());

    let mut edited = service.history().await.unwrap().remove(0);
    edited.category = "Mine".to_string();
    edited.confidence = 0.0;
    service.update_transaction(edited.clone()).await.unwrap();
    assert!(service
        .suggest_categories(&categories)
        .await
        .unwrap()
        .iter()
        .all(|c| c.transaction_id != edited.id));
}

#[tokio::test]
async fn spending_and_balance_summaries() {
    let service = service();
    service.ingest(&inbox()).await.unwrap();

    let spending = service.monthly_spending(2025, 1).await.unwrap();
    assert_eq!(spending.get("Food & Dining"), Some(&Money::from_paise(500_00)));
    assert_eq!(spending.get(UPI_CATEGORY), Some(&Money::from_paise(150_00)));
    assert!(spending.get("Income").is_none());

    // sms_1 at 14:00 on the 15th is the newest record with a balance.
    assert_eq!(
        service.current_balance().await.unwrap(),
        Some(Money::from_paise(15_000_00))
    );
}
