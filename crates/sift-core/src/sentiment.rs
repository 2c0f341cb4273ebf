//! Weighted-token direction scoring
//!
//! Fallback classifier for messages whose surface heuristics are tied: two
//! hand-authored token→weight maps (credit-leaning and debit-leaning) are
//! summed over the tokens present in the message. Deterministic rule
//! weighting, not a learned model.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::models::Direction;

/// Anchored phrases worth more than any single token
const CREDIT_PHRASES: &[&str] = &["credited to your", "deposited in your", "received in your"];
const DEBIT_PHRASES: &[&str] = &["debited from your", "paid from your", "spent using your"];
const PHRASE_BONUS: f64 = 1.5;

/// Negation/failure tokens that invert the message's meaning
const NEGATION_TOKENS: &[&str] = &[
    "not",
    "failed",
    "rejected",
    "declined",
    "unsuccessful",
    "cancelled",
];

/// Token-weight fallback classifier
///
/// Built once at startup; the weight maps never change afterwards.
pub struct LexiconScorer {
    credit_weights: HashMap<&'static str, f64>,
    debit_weights: HashMap<&'static str, f64>,
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconScorer {
    pub fn new() -> Self {
        let credit_weights = HashMap::from([
            ("credited", 0.9),
            ("credit", 0.6),
            ("received", 0.8),
            ("deposited", 0.8),
            ("deposit", 0.6),
            ("refund", 0.7),
            ("refunded", 0.7),
            ("cashback", 0.6),
            ("salary", 0.7),
            ("income", 0.6),
            ("reversal", 0.5),
            ("added", 0.4),
        ]);
        let debit_weights = HashMap::from([
            ("debited", 0.9),
            ("debit", 0.6),
            ("paid", 0.8),
            ("spent", 0.8),
            ("sent", 0.7),
            ("purchase", 0.7),
            ("purchased", 0.7),
            ("withdrawn", 0.7),
            ("withdrawal", 0.7),
            ("deducted", 0.8),
            ("charged", 0.6),
            ("transferred", 0.5),
            ("payment", 0.4),
        ]);
        Self {
            credit_weights,
            debit_weights,
        }
    }

    /// Score a message and return the more likely direction
    ///
    /// Ties resolve to DEBIT, the majority class for bank alerts. A
    /// negation/failure token swaps the two scores before comparison: a
    /// message about money *not* leaving reads as the opposite direction.
    pub fn score(&self, message: &str) -> Direction {
        let msg = message.to_lowercase();
        let tokens: HashSet<&str> = msg
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        let mut positive: f64 = tokens
            .iter()
            .filter_map(|t| self.credit_weights.get(t))
            .sum();
        let mut negative: f64 = tokens
            .iter()
            .filter_map(|t| self.debit_weights.get(t))
            .sum();

        if CREDIT_PHRASES.iter().any(|p| msg.contains(p)) {
            positive += PHRASE_BONUS;
        }
        if DEBIT_PHRASES.iter().any(|p| msg.contains(p)) {
            negative += PHRASE_BONUS;
        }

        if NEGATION_TOKENS.iter().any(|t| tokens.contains(t)) {
            std::mem::swap(&mut positive, &mut negative);
        }

        debug!(positive, negative, "lexicon scores");

        if positive > negative {
            Direction::Credit
        } else {
            Direction::Debit
        }
    }
}
