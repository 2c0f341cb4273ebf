//! End-to-end message pipeline
//!
//! Thin façade over the classifier and the duplicate checker: one call
//! takes a `(message, sender, timestamp)` triple plus the host's store and
//! returns either a fresh transaction for the host to persist, or nothing.

use tracing::debug;

use crate::classify::Classifier;
use crate::dedup::{DedupConfig, DuplicateChecker, TransactionStore};
use crate::error::Result;
use crate::models::Transaction;

/// Classify → extract → duplicate-check, as one synchronous call
///
/// Shared resources (pattern registry, fingerprint cache) are built once
/// here and safe for concurrent workers.
pub struct Pipeline {
    classifier: Classifier,
    checker: DuplicateChecker,
}

impl Pipeline {
    pub fn new() -> Result<Self> {
        Ok(Self {
            classifier: Classifier::new()?,
            checker: DuplicateChecker::new(),
        })
    }

    pub fn with_config(config: DedupConfig) -> Result<Self> {
        Ok(Self {
            classifier: Classifier::new()?,
            checker: DuplicateChecker::with_config(config),
        })
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn checker(&self) -> &DuplicateChecker {
        &self.checker
    }

    /// Process one inbound message
    ///
    /// `Ok(None)` means the message was rejected or is a duplicate — both
    /// expected, frequent outcomes. `Ok(Some(tx))` hands the host a fresh
    /// transaction to persist. `Err` only on store failure, which the
    /// caller must not treat as "not a duplicate".
    pub fn classify(
        &self,
        message: &str,
        sender: &str,
        timestamp_millis: i64,
        store: &dyn TransactionStore,
    ) -> Result<Option<Transaction>> {
        let Some(candidate) = self.classifier.parse(message, sender, timestamp_millis) else {
            return Ok(None);
        };

        if self.checker.is_duplicate(&candidate, store)? {
            debug!(fingerprint = %candidate.fingerprint, "suppressed duplicate");
            return Ok(None);
        }

        Ok(Some(candidate))
    }
}
