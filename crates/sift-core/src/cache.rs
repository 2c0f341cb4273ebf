//! Bounded fingerprint cache
//!
//! Remembers recently seen transaction fingerprints so immediate
//! re-deliveries never reach the store. Two independent eviction
//! mechanisms:
//! - Capacity pressure: least-recently-used entries fall out when the
//!   cache is full
//! - Age: `cleanup` drops entries older than a cutoff, regardless of
//!   recency, whenever the host decides to run maintenance

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use tracing::debug;

/// Default maximum number of cached fingerprints
pub const DEFAULT_CAPACITY: usize = 200;

/// Thread-safe bounded map of fingerprint → last-seen timestamp
pub struct FingerprintCache {
    entries: Mutex<LruCache<String, i64>>,
}

impl FingerprintCache {
    /// Create a cache bounded to `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Insert a fingerprint, or refresh its timestamp and recency
    pub fn add(&self, fingerprint: &str, timestamp_millis: i64) {
        self.entries
            .lock()
            .unwrap()
            .put(fingerprint.to_string(), timestamp_millis);
    }

    /// Whether the fingerprint is cached; a hit refreshes its recency
    pub fn contains(&self, fingerprint: &str) -> bool {
        self.entries.lock().unwrap().get(fingerprint).is_some()
    }

    /// Drop every entry whose timestamp predates the cutoff
    ///
    /// Independent of LRU recency; invoked by the host on its own
    /// maintenance schedule. Returns the number of entries removed.
    pub fn cleanup(&self, older_than_millis: i64) -> usize {
        let mut entries = self.entries.lock().unwrap();
        let stale: Vec<String> = entries
            .iter()
            .filter(|&(_, &ts)| ts < older_than_millis)
            .map(|(fp, _)| fp.clone())
            .collect();
        for fp in &stale {
            entries.pop(fp);
        }
        if !stale.is_empty() {
            debug!(removed = stale.len(), "evicted stale fingerprints");
        }
        stale.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FingerprintCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
