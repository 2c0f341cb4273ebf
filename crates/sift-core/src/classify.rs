//! Message classification and parsing
//!
//! The orchestration entry point: decides whether a message describes a
//! completed financial transaction and, when it does, extracts the
//! structured record. Stages run in strict order and reject as early as
//! possible:
//! 1. Exclusion filters (balance enquiry, OTP, scheduled/future, due
//!    reminders)
//! 2. Positive evidence gate (currency amount + transaction verb)
//! 3. Bank-specific shape confirmation
//! 4. Conservative confidence scoring
//!
//! Rejection is the common case for inbound messages and is signaled by
//! a reason, never an error.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::banks::BankRegistry;
use crate::error::Result;
use crate::extract;
use crate::models::{fingerprint, Direction, Transaction};
use crate::sentiment::LexiconScorer;

/// Verbs that count as transaction evidence
const TRANSACTION_VERBS: &[&str] = &[
    "debited",
    "credited",
    "paid",
    "sent",
    "received",
    "transfer",
    "payment",
    "spent",
    "purchased",
    "transaction",
];

/// Verbs strong enough to accept on their own (with an amount present)
const STRONG_VERBS: &[&str] = &["debited", "credited", "paid", "received"];

/// Currency-amount shape required by the positive evidence gate
const CURRENCY_SHAPE: &str =
    r"(?i)(?:rs\.?|inr|₹)\s*[0-9,]+(?:\.[0-9]{1,2})?|[0-9,]+(?:\.[0-9]{1,2})?\s*(?:rs\.?|inr)";

/// Account-reference shape ("A/c", "Acct XX1234", masked digits)
const ACCOUNT_REFERENCE_SHAPE: &str = r"(?i)\ba/?c\b|\bacct\b|\baccount\b|[x*]{2,}\d+";

/// Phrases indicating the transaction already happened
const COMPLETION_INDICATORS: &[&str] = &[
    "debited",
    "credited",
    "has been",
    "was",
    "successful",
    "successfully",
    "completed",
];

/// Why a message was rejected by the classification gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Balance/statement enquiry with no debit/credit verb
    BalanceEnquiry,
    /// OTP, verification, or login message
    Otp,
    /// Future-tense/scheduled/reminder phrasing without completion language
    FutureTense,
    /// Due-date or minimum-due statement phrasing
    DueReminder,
    /// No currency-amount-shaped substring
    NoAmount,
    /// No transaction verb from the fixed vocabulary
    NoTransactionVerb,
    /// Known bank, but no transaction-shape pattern matched
    BankPatternMismatch,
    /// Evidence too weak for the conservative confidence gate
    LowConfidence,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BalanceEnquiry => "balance_enquiry",
            Self::Otp => "otp",
            Self::FutureTense => "future_tense",
            Self::DueReminder => "due_reminder",
            Self::NoAmount => "no_amount",
            Self::NoTransactionVerb => "no_transaction_verb",
            Self::BankPatternMismatch => "bank_pattern_mismatch",
            Self::LowConfidence => "low_confidence",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Exclusion filters, evaluated in order over the lower-cased message.
/// Any one matching rejects the message with its reason tag.
const EXCLUSION_FILTERS: &[(RejectReason, fn(&str) -> bool)] = &[
    (RejectReason::BalanceEnquiry, is_balance_enquiry),
    (RejectReason::Otp, is_otp_message),
    (RejectReason::FutureTense, is_scheduled_notice),
    (RejectReason::DueReminder, is_due_statement),
];

fn is_balance_enquiry(msg: &str) -> bool {
    let balance_mention = ["avl bal", "available balance", "available bal", "a/c bal", "balance is", "bal:"]
        .iter()
        .any(|p| msg.contains(p));
    balance_mention && !TRANSACTION_VERBS.iter().any(|v| msg.contains(v))
}

fn is_otp_message(msg: &str) -> bool {
    [
        "otp",
        "one time password",
        "one-time password",
        "verification code",
        "verification pin",
        "login",
        "log in to",
        "passcode",
    ]
    .iter()
    .any(|p| msg.contains(p))
}

fn is_scheduled_notice(msg: &str) -> bool {
    let future = ["will be debited", "will be credited", "scheduled for", "upcoming", "reminder:", "standing instruction"]
        .iter()
        .any(|p| msg.contains(p));
    // Completion language must be unambiguously past tense here; bare
    // "debited" also appears inside "will be debited"
    let completed = ["has been", "was debited", "was credited", "successful", "completed"]
        .iter()
        .any(|p| msg.contains(p));
    future && !completed
}

fn is_due_statement(msg: &str) -> bool {
    ["minimum due", "min due", "min amt due", "total due", "payment due", "due date", "is due by"]
        .iter()
        .any(|p| msg.contains(p))
}

/// Explicit direction phrases that win outright, in evaluation order
const EXPLICIT_DIRECTION_PHRASES: &[(&str, Direction)] = &[
    ("debited from", Direction::Debit),
    ("credited to", Direction::Credit),
    ("withdrawn from", Direction::Debit),
    ("deposited in", Direction::Credit),
    ("deposited to", Direction::Credit),
];

/// Message classifier and transaction parser
///
/// Owns the bank registry and the fallback scorer; both are built once and
/// read-only afterwards, so a single classifier can serve concurrent
/// workers.
pub struct Classifier {
    registry: BankRegistry,
    scorer: LexiconScorer,
}

impl Classifier {
    pub fn new() -> Result<Self> {
        Ok(Self {
            registry: BankRegistry::new()?,
            scorer: LexiconScorer::new(),
        })
    }

    pub fn registry(&self) -> &BankRegistry {
        &self.registry
    }

    /// Run the full accept/reject gate
    ///
    /// `Err(reason)` tags the stage that rejected the message; rejection
    /// is an expected outcome, not a failure.
    pub fn classify_message(
        &self,
        message: &str,
        sender: &str,
    ) -> std::result::Result<(), RejectReason> {
        let msg = message.to_lowercase();

        // Stage 1: exclusion filters
        for (reason, filter) in EXCLUSION_FILTERS {
            if filter(&msg) {
                debug!(reason = %reason, "message excluded");
                return Err(*reason);
            }
        }

        // Stage 2: positive evidence
        let has_amount = Regex::new(CURRENCY_SHAPE)
            .map(|re| re.is_match(message))
            .unwrap_or(false);
        if !has_amount {
            return Err(RejectReason::NoAmount);
        }
        let has_verb = TRANSACTION_VERBS.iter().any(|v| msg.contains(v));
        if !has_verb {
            return Err(RejectReason::NoTransactionVerb);
        }

        // Stage 3: bank-specific confirmation
        let bank = self.registry.identify(sender, message);
        if !bank.is_general() {
            if let Some(profile) = self.registry.profile(bank) {
                if !profile.transaction_shapes().is_empty() && !profile.matches_shape(message) {
                    debug!(bank = %bank, "no transaction shape matched");
                    return Err(RejectReason::BankPatternMismatch);
                }
            }
        }

        // Stage 4: conservative confidence scoring
        let has_account_ref = Regex::new(ACCOUNT_REFERENCE_SHAPE)
            .map(|re| re.is_match(message))
            .unwrap_or(false);
        let has_completion = COMPLETION_INDICATORS.iter().any(|p| msg.contains(p));
        let has_strong_verb = STRONG_VERBS.iter().any(|v| msg.contains(v));

        let confident = (has_account_ref && has_completion)
            || (has_strong_verb && has_amount)
            || (!bank.is_general() && has_amount && has_verb);

        if !confident {
            return Err(RejectReason::LowConfidence);
        }

        Ok(())
    }

    /// Whether a message describes a completed transaction
    pub fn is_transaction_message(&self, message: &str, sender: &str) -> bool {
        self.classify_message(message, sender).is_ok()
    }

    /// Classify the direction of money movement
    ///
    /// Ordered cascade: explicit phrases win outright; then verb +
    /// possessive-context flags, with strong-verb and first-occurrence
    /// tie-breaking; the lexicon scorer decides anything left over (its
    /// tie default is DEBIT, the majority class).
    pub fn determine_direction(&self, message: &str) -> Direction {
        let msg = message.to_lowercase();

        for (phrase, direction) in EXPLICIT_DIRECTION_PHRASES {
            if msg.contains(phrase) {
                return *direction;
            }
        }

        let possessive_context =
            msg.contains("your") || msg.contains("a/c") || msg.contains("account");
        let debit_flagged = msg.contains("debited") && possessive_context;
        let credit_flagged = msg.contains("credited") && possessive_context;

        match (debit_flagged, credit_flagged) {
            (true, false) => Direction::Debit,
            (false, true) => Direction::Credit,
            (true, true) => {
                // Strong-verb override, else first occurrence wins
                if ["paid", "spent", "purchase"].iter().any(|v| msg.contains(v)) {
                    Direction::Debit
                } else if ["received", "income", "salary"].iter().any(|v| msg.contains(v)) {
                    Direction::Credit
                } else {
                    let debit_pos = msg.find("debited").unwrap_or(usize::MAX);
                    let credit_pos = msg.find("credited").unwrap_or(usize::MAX);
                    if debit_pos <= credit_pos {
                        Direction::Debit
                    } else {
                        Direction::Credit
                    }
                }
            }
            (false, false) => self.scorer.score(message),
        }
    }

    /// Parse a message into a structured transaction
    ///
    /// Runs the gate, resolves the bank, extracts the amount (rejecting on
    /// a miss), determines direction, extracts the merchant, synthesizes
    /// the description, and fingerprints the result. `None` on any
    /// rejection.
    pub fn parse(&self, message: &str, sender: &str, timestamp_millis: i64) -> Option<Transaction> {
        if let Err(reason) = self.classify_message(message, sender) {
            debug!(%reason, "message rejected");
            return None;
        }

        let bank = self.registry.identify(sender, message);
        let profile = self.registry.profile(bank);

        let amount = match extract::extract_amount(message, profile) {
            Some(amount) => (amount * 100.0).round() / 100.0,
            None => {
                debug!("no extractable amount");
                return None;
            }
        };

        let direction = self.determine_direction(message);
        let merchant_name = extract::extract_merchant_name(message);
        let description = extract::generate_description(message, direction, &merchant_name);
        let merchant = (!merchant_name.is_empty()).then_some(merchant_name);

        let fingerprint = fingerprint(amount, timestamp_millis, merchant.as_deref(), bank, direction);

        debug!(%bank, %direction, amount, "message parsed");

        Some(Transaction {
            bank,
            direction,
            amount,
            timestamp_millis,
            description,
            merchant,
            raw_message: Some(message.to_string()),
            fingerprint,
        })
    }
}
