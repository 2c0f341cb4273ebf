//! Integration tests for sift-core
//!
//! These tests exercise the full classify → duplicate-check → persist
//! workflow against an in-memory store standing in for the host's
//! database.

use std::sync::Mutex;

use sift_core::{
    BankId, DedupConfig, Direction, Error, Pipeline, Result, Transaction, TransactionStore,
};

// 2024-01-01T10:30:00Z
const TS: i64 = 1_704_105_000_000;

/// In-memory stand-in for the host's persistent store
#[derive(Default)]
struct MemoryStore {
    transactions: Mutex<Vec<Transaction>>,
    unreachable: bool,
}

impl MemoryStore {
    fn unreachable() -> Self {
        Self {
            transactions: Mutex::new(Vec::new()),
            unreachable: true,
        }
    }

    /// What the host does with an accepted transaction
    fn persist(&self, tx: Transaction) {
        self.transactions.lock().unwrap().push(tx);
    }

    fn len(&self) -> usize {
        self.transactions.lock().unwrap().len()
    }
}

impl TransactionStore for MemoryStore {
    fn exists_by_fingerprint(&self, fingerprint: &str) -> Result<bool> {
        if self.unreachable {
            return Err(Error::Store("store unreachable".into()));
        }
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .any(|t| t.fingerprint == fingerprint))
    }

    fn find_between(&self, start_millis: i64, end_millis: i64) -> Result<Vec<Transaction>> {
        if self.unreachable {
            return Err(Error::Store("store unreachable".into()));
        }
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.timestamp_millis >= start_millis && t.timestamp_millis <= end_millis)
            .cloned()
            .collect())
    }
}

#[test]
fn test_full_classify_and_persist_workflow() {
    let pipeline = Pipeline::new().expect("built-in patterns must compile");
    let store = MemoryStore::default();

    let tx = pipeline
        .classify(
            "Rs.500.00 debited from your HDFC A/c for UPI payment to Swiggy on 01-01-24. Ref: ABC123",
            "HDFCBK",
            TS,
            &store,
        )
        .expect("store is reachable")
        .expect("genuine debit alert should be accepted");

    assert_eq!(tx.bank, BankId::Hdfc);
    assert_eq!(tx.direction, Direction::Debit);
    assert_eq!(tx.amount, 500.0);
    assert_eq!(tx.merchant.as_deref(), Some("Swiggy"));
    assert!(tx.description.contains("UPI payment to Swiggy"));
    assert!(tx.description.contains("Ref: ABC123"));

    store.persist(tx);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_identical_message_twice_is_duplicate() {
    let pipeline = Pipeline::new().unwrap();
    let store = MemoryStore::default();
    let message =
        "Rs.500.00 debited from your HDFC A/c for UPI payment to Swiggy on 01-01-24. Ref: ABC123";

    let first = pipeline.classify(message, "HDFCBK", TS, &store).unwrap();
    assert!(first.is_some());

    // Second delivery short-circuits at the fingerprint cache even though
    // nothing was persisted yet
    let second = pipeline.classify(message, "HDFCBK", TS, &store).unwrap();
    assert!(second.is_none());
}

#[test]
fn test_reworded_redelivery_is_duplicate_via_store() {
    let pipeline = Pipeline::new().unwrap();
    let store = MemoryStore::default();

    let tx = pipeline
        .classify(
            "Rs.500.00 debited from your HDFC A/c for UPI payment to Swiggy on 01-01-24. Ref: ABC123",
            "HDFCBK",
            TS,
            &store,
        )
        .unwrap()
        .unwrap();
    store.persist(tx);

    // Fresh pipeline: cold cache, so only the store can catch this
    let pipeline = Pipeline::new().unwrap();
    let redelivery = pipeline
        .classify(
            "Alert: Rs 500.00 debited from your HDFC Bank A/c towards Swiggy. Ref: ABC123",
            "HDFCBK",
            TS + 30 * 60 * 1000,
            &store,
        )
        .unwrap();
    assert!(redelivery.is_none());
    assert_eq!(store.len(), 1);
}

#[test]
fn test_complementary_pair_suppressed() {
    let pipeline = Pipeline::new().unwrap();
    let store = MemoryStore::default();

    // Sender-side debit alert, persisted first
    let debit = pipeline
        .classify(
            "Rs.200 debited from your A/c for UPI payment to Raju Stores. UPI Ref No: 400123456789",
            "",
            TS,
            &store,
        )
        .unwrap()
        .expect("debit side should be accepted");
    assert_eq!(debit.direction, Direction::Debit);
    store.persist(debit);

    // Receiver-side view of the same transfer, delivered within the hour
    let credit = pipeline
        .classify(
            "Rs.200 received in your A/c from Raju Stores. UPI Ref No: 400123456789",
            "",
            TS + 40 * 60 * 1000,
            &store,
        )
        .unwrap();
    assert!(credit.is_none(), "complementary re-delivery should be suppressed");
}

#[test]
fn test_otp_and_promotional_messages_dropped() {
    let pipeline = Pipeline::new().unwrap();
    let store = MemoryStore::default();

    let rejected = [
        "Your OTP for login is 482913. Do not share.",
        "Use code SAVE20 for flat 20% off on your next order!",
        "Avl Bal in A/c XX1234 is Rs 20,500.00 as on 01-01-24",
        "Rs 999.00 will be debited from your A/c for Netflix autopay",
    ];

    for message in rejected {
        let outcome = pipeline.classify(message, "", TS, &store).unwrap();
        assert!(outcome.is_none(), "should reject: {}", message);
    }
    assert_eq!(store.len(), 0);
}

#[test]
fn test_sbi_credit_with_balance_mention_accepted() {
    let pipeline = Pipeline::new().unwrap();
    let store = MemoryStore::default();

    let tx = pipeline
        .classify("Rs 1500 credited to your SBI account. Avl Bal Rs 20500", "", TS, &store)
        .unwrap()
        .expect("credit verb + amount + account reference dominate");

    assert_eq!(tx.bank, BankId::Sbi);
    assert_eq!(tx.direction, Direction::Credit);
    assert_eq!(tx.amount, 1500.0);
}

#[test]
fn test_same_amount_different_merchants_both_kept() {
    let pipeline = Pipeline::new().unwrap();
    let store = MemoryStore::default();

    let first = pipeline
        .classify(
            "Rs.150.00 paid to Blue Tokai via UPI. Ref: AA1111",
            "",
            TS,
            &store,
        )
        .unwrap()
        .expect("first payment accepted");
    store.persist(first);

    let second = pipeline
        .classify(
            "Rs.150.00 paid to Third Wave via UPI. Ref: BB2222",
            "",
            TS + 10 * 60 * 1000,
            &store,
        )
        .unwrap();
    assert!(
        second.is_some(),
        "distinct merchants at the same price are not duplicates"
    );
}

#[test]
fn test_store_failure_propagates_to_caller() {
    let pipeline = Pipeline::new().unwrap();
    let store = MemoryStore::unreachable();

    let outcome = pipeline.classify(
        "Rs.500.00 debited from your HDFC A/c for UPI payment to Swiggy. Ref: ABC123",
        "HDFCBK",
        TS,
        &store,
    );
    assert!(
        matches!(outcome, Err(Error::Store(_))),
        "a classifiable message must not be silently accepted when the store is down"
    );
}

#[test]
fn test_windowed_duplicate_outside_window_not_suppressed() {
    let pipeline = Pipeline::new().unwrap();
    let store = MemoryStore::default();

    let tx = pipeline
        .classify(
            "Rs.150.00 paid to Blue Tokai via UPI. Ref: AA1111",
            "",
            TS,
            &store,
        )
        .unwrap()
        .unwrap();
    store.persist(tx);

    // Two days later: same merchant, same amount, a genuinely new purchase
    let later = pipeline
        .classify(
            "Rs.150.00 paid to Blue Tokai via UPI. Ref: CC3333",
            "",
            TS + 48 * 3600 * 1000,
            &store,
        )
        .unwrap();
    assert!(later.is_some());
}

#[test]
fn test_custom_window_config() {
    let config = DedupConfig {
        window_hours: 1,
        ..DedupConfig::default()
    };
    let pipeline = Pipeline::with_config(config).unwrap();
    let store = MemoryStore::default();

    let tx = pipeline
        .classify(
            "Rs.150.00 paid to Blue Tokai via UPI. Ref: AA1111",
            "",
            TS,
            &store,
        )
        .unwrap()
        .unwrap();
    store.persist(tx);

    // Next day: outside the narrowed window and a fresh fingerprint day
    // bucket, so nothing suppresses it
    let next_day = pipeline
        .classify(
            "Rs.150.00 paid to Blue Tokai via UPI. Ref: CC3333",
            "",
            TS + 26 * 3600 * 1000,
            &store,
        )
        .unwrap();
    assert!(next_day.is_some());
}
