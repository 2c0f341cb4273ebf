//! Duplicate detection orchestration
//!
//! Three tiers, cheapest first:
//! 1. In-memory fingerprint cache (immediate repeats)
//! 2. Exact fingerprint lookup in the host's store (re-delivery)
//! 3. Windowed similarity scan (paraphrased and complementary
//!    re-deliveries)
//!
//! The core only reads from the store; persisting an accepted transaction
//! is the host's job. Store failures propagate — a message that cannot be
//! duplicate-checked must not be silently accepted or dropped.

use tracing::{debug, warn};

use crate::cache::{FingerprintCache, DEFAULT_CAPACITY};
use crate::error::Result;
use crate::models::Transaction;
use crate::similarity;

/// Host-provided persistence queries
///
/// Consumed, never implemented, by the core. Implementations decide their
/// own retry/timeout policy; the core performs none.
pub trait TransactionStore {
    /// Whether a transaction with this fingerprint is already persisted
    fn exists_by_fingerprint(&self, fingerprint: &str) -> Result<bool>;

    /// All persisted transactions in `[start_millis, end_millis]`
    fn find_between(&self, start_millis: i64, end_millis: i64) -> Result<Vec<Transaction>>;
}

/// Duplicate detection tunables
#[derive(Debug, Clone)]
pub struct DedupConfig {
    /// Half-width of the similarity window around a candidate
    pub window_hours: i64,
    /// Maximum entries in the fingerprint cache
    pub cache_capacity: usize,
    /// Maximum amount difference still considered the same money
    pub amount_tolerance: f64,
    /// Combined similarity score at which two records are duplicates
    pub similarity_threshold: f64,
    /// Merchant similarity that alone lifts the combined score
    pub merchant_override_threshold: f64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            window_hours: 24,
            cache_capacity: DEFAULT_CAPACITY,
            amount_tolerance: 0.01,
            similarity_threshold: 0.7,
            merchant_override_threshold: 0.8,
        }
    }
}

/// Stateful duplicate checker
///
/// Owns the fingerprint cache; one checker is shared by all workers
/// feeding the same store.
pub struct DuplicateChecker {
    cache: FingerprintCache,
    config: DedupConfig,
}

impl DuplicateChecker {
    pub fn new() -> Self {
        Self::with_config(DedupConfig::default())
    }

    pub fn with_config(config: DedupConfig) -> Self {
        Self {
            cache: FingerprintCache::new(config.cache_capacity),
            config,
        }
    }

    pub fn cache(&self) -> &FingerprintCache {
        &self.cache
    }

    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    /// Decide whether a candidate repeats an already-recorded event
    ///
    /// A negative verdict still records the candidate's fingerprint in the
    /// cache so an identical near-future repeat short-circuits at tier 1.
    pub fn is_duplicate(
        &self,
        candidate: &Transaction,
        store: &dyn TransactionStore,
    ) -> Result<bool> {
        // Tier 1: recently seen fingerprint
        if self.cache.contains(&candidate.fingerprint) {
            debug!(fingerprint = %candidate.fingerprint, "duplicate via cache");
            return Ok(true);
        }

        // Tier 2: exact match already persisted
        if store
            .exists_by_fingerprint(&candidate.fingerprint)
            .map_err(|e| {
                warn!(error = %e, "store fingerprint lookup failed");
                e
            })?
        {
            self.cache
                .add(&candidate.fingerprint, candidate.timestamp_millis);
            debug!(fingerprint = %candidate.fingerprint, "duplicate via store");
            return Ok(true);
        }

        // Tier 3: similar record inside the window
        let window_millis = self.config.window_hours * 3600 * 1000;
        let neighbors = store.find_between(
            candidate.timestamp_millis - window_millis,
            candidate.timestamp_millis + window_millis,
        )?;

        for existing in &neighbors {
            if similarity::are_transactions_similar(candidate, existing, &self.config) {
                self.cache
                    .add(&candidate.fingerprint, candidate.timestamp_millis);
                debug!("duplicate via similarity");
                return Ok(true);
            }
        }

        self.cache
            .add(&candidate.fingerprint, candidate.timestamp_millis);
        Ok(false)
    }
}

impl Default for DuplicateChecker {
    fn default() -> Self {
        Self::new()
    }
}
