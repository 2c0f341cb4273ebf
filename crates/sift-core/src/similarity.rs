//! Duplicate-by-meaning detection
//!
//! Decides whether two already-persisted transactions describe the same
//! real-world event:
//! - Complementary pairs: the same transfer seen from sender and receiver
//!   sides (opposite directions, "sent"/"received" language, shared
//!   reference or shared merchant tokens)
//! - Same-direction re-deliveries: token-set (Jaccard) similarity over the
//!   descriptions, blended with merchant-name similarity
//!
//! Callers are expected to have applied the exact-fingerprint check first;
//! this module handles only the fuzzy remainder inside the time window.

use std::collections::HashSet;

use tracing::debug;

use crate::dedup::DedupConfig;
use crate::extract;
use crate::models::Transaction;

/// Filler tokens carrying no merchant identity, removed before comparing
/// complementary-pair descriptions
const DESCRIPTION_STOPWORDS: &[&str] = &[
    "the", "and", "for", "from", "with", "your", "you", "was", "has", "been", "have", "payment",
    "received", "sent", "paid", "account", "bank", "transaction", "upi", "neft", "imps", "rtgs",
    "ref", "txn", "amount", "dated",
];

/// Jaccard similarity of two token sets: |intersection| / |union|
///
/// Defined as 0.0 when both sets are empty. Symmetric and bounded in
/// [0, 1]; a non-empty set compared with itself scores 1.0.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    intersection / union
}

/// Tokenize a description for similarity scoring
///
/// Lower-cases, strips non-alphanumerics, and drops tokens that are too
/// short (≤2 chars) or purely numeric — those are glue words and ids, not
/// meaning.
pub fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2)
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
        .map(|t| t.to_string())
        .collect()
}

/// Decide whether two transactions describe the same event
///
/// Hard prefilter first: timestamps within the configured window and
/// amounts within tolerance, else never similar. Then the complementary
/// pair check for opposite directions, then the Jaccard check for same
/// direction.
pub fn are_transactions_similar(a: &Transaction, b: &Transaction, config: &DedupConfig) -> bool {
    let window_millis = config.window_hours * 3600 * 1000;
    if (a.timestamp_millis - b.timestamp_millis).abs() > window_millis {
        return false;
    }
    if (a.amount - b.amount).abs() > config.amount_tolerance {
        return false;
    }

    if a.direction != b.direction {
        return is_complementary_pair(a, b);
    }

    let desc_similarity = jaccard(&tokenize(&a.description), &tokenize(&b.description));

    let merchant_similarity = match (&a.merchant, &b.merchant) {
        (Some(ma), Some(mb)) if !ma.is_empty() && !mb.is_empty() => {
            jaccard(&tokenize(ma), &tokenize(mb))
        }
        _ => 0.0,
    };

    let mut combined = 0.7 * desc_similarity + 0.3 * merchant_similarity;
    // A near-exact merchant match is decisive even when descriptions are
    // phrased differently
    if merchant_similarity > config.merchant_override_threshold {
        combined = combined.max(config.merchant_override_threshold);
    }

    debug!(desc_similarity, merchant_similarity, combined, "similarity scores");

    combined >= config.similarity_threshold
}

/// Opposite-direction transactions that are the same transfer seen from
/// both ends
fn is_complementary_pair(a: &Transaction, b: &Transaction) -> bool {
    let desc_a = a.description.to_lowercase();
    let desc_b = b.description.to_lowercase();

    let complementary_language = (desc_a.contains("sent") && desc_b.contains("received"))
        || (desc_b.contains("sent") && desc_a.contains("received"))
        || (desc_a.contains(" to ") && desc_b.contains(" from "))
        || (desc_b.contains(" to ") && desc_a.contains(" from "));

    if !complementary_language {
        return false;
    }

    if shared_reference(&a.description, &b.description) {
        return true;
    }

    shared_content_tokens(&desc_a, &desc_b)
}

fn shared_reference(a: &str, b: &str) -> bool {
    let ref_a = normalize_reference(&extract::extract_reference(a));
    let ref_b = normalize_reference(&extract::extract_reference(b));
    !ref_a.is_empty() && ref_a == ref_b
}

fn normalize_reference(reference: &str) -> String {
    reference
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

fn shared_content_tokens(a: &str, b: &str) -> bool {
    let strip = |text: &str| -> HashSet<String> {
        tokenize(text)
            .into_iter()
            .filter(|t| !DESCRIPTION_STOPWORDS.contains(&t.as_str()))
            .collect()
    };
    let tokens_a = strip(a);
    let tokens_b = strip(b);
    tokens_a.intersection(&tokens_b).next().is_some()
}
