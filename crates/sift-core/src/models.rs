//! Domain models for Sift

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::banks::BankId;

/// Direction of money movement relative to the account holder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Money leaving the account
    Debit,
    /// Money entering the account
    Credit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            _ => Err(format!("Unknown direction: {}", s)),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A structured transaction extracted from a notification message
///
/// Built by the classifier, then checked for duplicates. Persistence is the
/// host's responsibility; the same shape comes back from the store
/// collaborator for windowed duplicate lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub bank: BankId,
    pub direction: Direction,
    /// Always positive; direction carries the sign
    pub amount: f64,
    /// Epoch milliseconds of message delivery
    pub timestamp_millis: i64,
    /// Human-readable summary, e.g. "UPI payment to Swiggy (Ref: ABC123)"
    pub description: String,
    pub merchant: Option<String>,
    /// Original message text, kept for host-side auditing
    pub raw_message: Option<String>,
    /// Hash for deduplication
    pub fingerprint: String,
}

/// Generate the deduplication fingerprint for a transaction
///
/// Hashes the amount (2-decimal formatting), the UTC calendar day of the
/// timestamp, the lower-cased merchant name (empty when absent), and the
/// `bank:direction` pair. Deterministic across runs and machines; never
/// depends on the raw message text, so re-worded deliveries of the same
/// event collide.
pub fn fingerprint(
    amount: f64,
    timestamp_millis: i64,
    merchant: Option<&str>,
    bank: BankId,
    direction: Direction,
) -> String {
    let day = Utc
        .timestamp_millis_opt(timestamp_millis)
        .single()
        .map(|dt| dt.date_naive().to_string())
        .unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(format!("{:.2}", amount).as_bytes());
    hasher.update(day.as_bytes());
    hasher.update(
        merchant
            .map(|m| m.to_lowercase())
            .unwrap_or_default()
            .as_bytes(),
    );
    hasher.update(format!("{}:{}", bank, direction).as_bytes());
    hex::encode(hasher.finalize())
}
