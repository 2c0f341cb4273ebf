//! Bank pattern registry
//!
//! Maps a sender id and/or message body to a bank, and supplies that bank's
//! pattern set:
//! - Identification patterns: matched against the sender id first, then the
//!   message body
//! - Amount patterns: bank-specific currency phrasings, tried before the
//!   general ones
//! - Transaction-shape patterns: whole-message shapes a genuine alert from
//!   that bank is expected to match
//!
//! The registry is built once at startup and read-only afterwards, so it is
//! safe to share across worker threads without synchronization.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Supported banks
///
/// `General` is the explicit fallback for senders no profile claims; it is
/// a valid outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BankId {
    Hdfc,
    Sbi,
    Icici,
    Axis,
    Kotak,
    Pnb,
    General,
}

impl BankId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hdfc => "HDFC",
            Self::Sbi => "SBI",
            Self::Icici => "ICICI",
            Self::Axis => "AXIS",
            Self::Kotak => "KOTAK",
            Self::Pnb => "PNB",
            Self::General => "GENERAL",
        }
    }

    pub fn is_general(&self) -> bool {
        matches!(self, Self::General)
    }
}

impl std::str::FromStr for BankId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "HDFC" => Ok(Self::Hdfc),
            "SBI" => Ok(Self::Sbi),
            "ICICI" => Ok(Self::Icici),
            "AXIS" => Ok(Self::Axis),
            "KOTAK" => Ok(Self::Kotak),
            "PNB" => Ok(Self::Pnb),
            "GENERAL" => Ok(Self::General),
            _ => Err(format!("Unknown bank: {}", s)),
        }
    }
}

impl std::fmt::Display for BankId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pattern bundle for one institution
///
/// Immutable after construction. Every profile except `General` carries at
/// least one identification pattern.
#[derive(Debug)]
pub struct BankProfile {
    pub bank: BankId,
    identification: Vec<Regex>,
    amount_patterns: Vec<Regex>,
    transaction_shapes: Vec<Regex>,
}

impl BankProfile {
    fn new(
        bank: BankId,
        identification: &[&str],
        amount_patterns: &[&str],
        transaction_shapes: &[&str],
    ) -> Result<Self> {
        Ok(Self {
            bank,
            identification: compile_all(identification)?,
            amount_patterns: compile_all(amount_patterns)?,
            transaction_shapes: compile_all(transaction_shapes)?,
        })
    }

    /// Bank-specific amount patterns, tried before the general cascade
    pub fn amount_patterns(&self) -> &[Regex] {
        &self.amount_patterns
    }

    /// Whole-message shapes a genuine alert from this bank matches
    pub fn transaction_shapes(&self) -> &[Regex] {
        &self.transaction_shapes
    }

    fn identifies(&self, text: &str) -> bool {
        !text.is_empty() && self.identification.iter().any(|re| re.is_match(text))
    }

    /// True when the message matches at least one transaction shape
    pub fn matches_shape(&self, message: &str) -> bool {
        self.transaction_shapes.iter().any(|re| re.is_match(message))
    }
}

fn compile_all(patterns: &[&str]) -> Result<Vec<Regex>> {
    patterns.iter().map(|p| Ok(Regex::new(p)?)).collect()
}

/// Registry of all known bank profiles
///
/// Profile order is fixed at construction; `identify` resolves ties by
/// first match in that order.
#[derive(Debug)]
pub struct BankRegistry {
    profiles: Vec<BankProfile>,
}

impl BankRegistry {
    /// Compile the built-in profiles
    pub fn new() -> Result<Self> {
        let profiles = vec![
            BankProfile::new(
                BankId::Hdfc,
                &[r"(?i)hdfc"],
                &[r"(?i)(?:rs\.?|inr)\s*([0-9,]+(?:\.[0-9]{1,2})?)\s+(?:is\s+)?(?:debited|credited|sent)"],
                &[
                    r"(?i)(?:rs\.?|inr)\s*[0-9,.]+\s+(?:is\s+)?(?:debited|credited)",
                    r"(?i)(?:debited|credited)\s+(?:from|to)\s+(?:your\s+)?(?:hdfc\s+)?(?:bank\s+)?a/?c",
                    r"(?i)sent\s+(?:rs\.?|inr)\s*[0-9,.]+\s+from\s+hdfc\s+bank",
                ],
            )?,
            BankProfile::new(
                BankId::Sbi,
                &[r"(?i)sbi"],
                &[r"(?i)(?:rs\.?|inr)\s*([0-9,]+(?:\.[0-9]{1,2})?)\s+(?:is\s+)?(?:debited|credited|withdrawn)"],
                &[
                    r"(?i)(?:rs\.?|inr)\s*[0-9,.]+\s+(?:is\s+)?(?:debited|credited)\s+(?:from|to)",
                    r"(?i)a/?c\s+\S+\s*-?\s*(?:debited|credited)\s+by",
                    r"(?i)(?:debited|credited)\s+to\s+your\s+sbi",
                ],
            )?,
            BankProfile::new(
                BankId::Icici,
                &[r"(?i)icici"],
                &[r"(?i)(?:debited|credited)\s+(?:for|with)\s+(?:rs\.?|inr)\s*([0-9,]+(?:\.[0-9]{1,2})?)"],
                &[
                    r"(?i)(?:acct|a/?c)\s+\S+\s+(?:is\s+)?(?:debited|credited)\s+(?:for|with)",
                    r"(?i)icici\s+bank\s+(?:acct|a/?c)",
                ],
            )?,
            BankProfile::new(
                BankId::Axis,
                &[r"(?i)axis"],
                &[r"(?i)(?:inr|rs\.?)\s*([0-9,]+(?:\.[0-9]{1,2})?)\s+(?:debited|credited)"],
                &[
                    r"(?i)(?:inr|rs\.?)\s*[0-9,.]+\s+(?:debited|credited)\s+(?:from|to)\s+a/?c",
                    r"(?i)axis\s+bank\s+a/?c",
                ],
            )?,
            BankProfile::new(
                BankId::Kotak,
                &[r"(?i)kotak"],
                &[r"(?i)(?:rs\.?|inr)\s*([0-9,]+(?:\.[0-9]{1,2})?)\s+(?:sent|received|debited|credited)"],
                &[
                    r"(?i)(?:sent|received)\s+(?:from|to|in)\s+kotak",
                    r"(?i)kotak\s+bank\s+a/?c",
                ],
            )?,
            BankProfile::new(
                BankId::Pnb,
                &[r"(?i)pnb|punjab\s+national"],
                &[r"(?i)(?:rs\.?|inr)\s*([0-9,]+(?:\.[0-9]{1,2})?)"],
                &[r"(?i)your\s+a/?c\s+\S+\s+is\s+(?:debited|credited)"],
            )?,
            // Fallback profile: no identification, no shape requirement
            BankProfile::new(BankId::General, &[], &[], &[])?,
        ];

        debug_assert!(profiles
            .iter()
            .filter(|p| !p.bank.is_general())
            .all(|p| !p.identification.is_empty()));

        Ok(Self { profiles })
    }

    /// Resolve a sender id and message body to a bank
    ///
    /// Sender patterns are tried first across all profiles (first match
    /// wins), then the message body. Misses resolve to `General`.
    pub fn identify(&self, sender: &str, message: &str) -> BankId {
        for profile in &self.profiles {
            if profile.identifies(sender) {
                debug!(bank = %profile.bank, "bank identified by sender");
                return profile.bank;
            }
        }
        for profile in &self.profiles {
            if profile.identifies(message) {
                debug!(bank = %profile.bank, "bank identified by message body");
                return profile.bank;
            }
        }
        BankId::General
    }

    /// Direct profile lookup; callers treat `None` as "use General"
    pub fn profile(&self, bank: BankId) -> Option<&BankProfile> {
        self.profiles.iter().find(|p| p.bank == bank)
    }
}
