//! Lexical extraction from notification text
//!
//! Pulls the structured pieces out of a message that already passed the
//! classification gate:
//! - Currency amount (bank-specific patterns first, then a general cascade)
//! - Merchant name (sentence scan for indicator tokens, with UPI and
//!   reference-adjacent fallbacks)
//! - Reference number (Ref/txn id/UPI ref/IMPS code)
//! - Human-readable description synthesis
//!
//! Extraction never errors: a pattern that matches but fails to parse is a
//! miss for that pattern only, and a total miss is an empty/None result.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::banks::BankProfile;
use crate::models::Direction;

/// General currency patterns, in priority order
const GENERAL_AMOUNT_PATTERNS: &[&str] = &[
    r"(?i)(?:rs\.?|inr|₹)\s*([0-9,]+(?:\.[0-9]{1,2})?)",
    r"(?i)([0-9,]+(?:\.[0-9]{1,2})?)\s*(?:rs\.?|inr|₹)",
    r"(?i)(?:amount|amt)\.?\s*:?\s*(?:rs\.?|inr|₹)?\s*([0-9,]+(?:\.[0-9]{1,2})?)",
];

/// Last-resort pattern: a number adjacent to a transaction verb
const LOOSE_AMOUNT_PATTERN: &str =
    r"(?i)(?:debited|credited|paid|sent|received|spent)\s+(?:by|with|for|of)?\s*([0-9,]+(?:\.[0-9]{1,2})?)";

/// Tokens that introduce a merchant name
const MERCHANT_INDICATORS: &[&str] = &["at", "to", "for", "towards", "via", "through", "from"];

/// Tokens that end a merchant name
const MERCHANT_TERMINATORS: &[&str] = &[
    "on", "of", "via", "using", "through", "for", "info", "alert", "inr", "rs", "upi", "dated",
    "ref", "txn", "your", "a/c", "ac", "account", "bank", "hdfc", "sbi", "icici", "axis", "kotak",
    "pnb",
];

/// Reference-number patterns, in priority order
const REFERENCE_PATTERNS: &[&str] = &[
    r"(?i)\bref(?:erence)?\s*(?:no\.?)?\s*:\s*([A-Za-z0-9]+)",
    r"(?i)\b(?:txn|transaction)\s*(?:id|no)\.?\s*:\s*([A-Za-z0-9]+)",
    r"(?i)\bupi\s*ref\s*(?:no\.?)?\s*:?\s*([0-9]{6,})",
    r"(?i)\bimps\s*[-:/]?\s*([0-9]{6,})",
];

/// Extract the transaction amount
///
/// Tries the resolved bank's own amount patterns first, then the general
/// cascade, then the loose last-resort pattern. First successful parse
/// wins. Commas are stripped before parsing; a capture that fails to parse
/// (or is non-positive) is skipped and scanning continues.
pub fn extract_amount(message: &str, profile: Option<&BankProfile>) -> Option<f64> {
    if let Some(profile) = profile {
        for re in profile.amount_patterns() {
            if let Some(amount) = capture_amount(re, message) {
                return Some(amount);
            }
        }
    }

    for pattern in GENERAL_AMOUNT_PATTERNS {
        if let Ok(re) = Regex::new(pattern) {
            if let Some(amount) = capture_amount(&re, message) {
                return Some(amount);
            }
        }
    }

    Regex::new(LOOSE_AMOUNT_PATTERN)
        .ok()
        .and_then(|re| capture_amount(&re, message))
}

fn capture_amount(re: &Regex, message: &str) -> Option<f64> {
    for caps in re.captures_iter(message) {
        if let Some(m) = caps.get(1) {
            let cleaned = m.as_str().replace(',', "");
            if let Ok(value) = cleaned.parse::<f64>() {
                if value > 0.0 {
                    return Some(value);
                }
            }
        }
    }
    None
}

/// Extract the merchant name from a message
///
/// Scans each sentence for an indicator token and collects up to the next
/// 4 words, stopping at terminator tokens or anything that looks like a
/// number or date. An indicator whose following words are all terminators
/// yields nothing and the scan continues. Falls back to a UPI-style
/// `UPI-<name>-` pattern, then to a name sitting just before a reference
/// marker. Returns an empty string, never an error, on a total miss.
pub fn extract_merchant_name(message: &str) -> String {
    for sentence in message.split(['.', '!', '?']) {
        let words: Vec<&str> = sentence.split_whitespace().collect();

        for (i, word) in words.iter().enumerate() {
            let lower = word.to_lowercase();
            if !MERCHANT_INDICATORS.contains(&lower.as_str()) {
                continue;
            }

            let mut name_words = Vec::new();
            for next in words.iter().skip(i + 1).take(4) {
                if is_merchant_terminator(next) {
                    break;
                }
                let trimmed = next.trim_end_matches([',', ';', ':', '-', '.']);
                if trimmed.is_empty() {
                    break;
                }
                name_words.push(title_case(trimmed));
            }

            if !name_words.is_empty() {
                return name_words.join(" ");
            }
        }
    }

    // UPI narration fallback: "UPI-SWIGGY-..." / "UPI/Swiggy/..."
    if let Ok(re) = Regex::new(r"(?i)upi[-/]([A-Za-z][A-Za-z0-9 .&_]*?)[-/]") {
        if let Some(caps) = re.captures(message) {
            if let Some(m) = caps.get(1) {
                return m
                    .as_str()
                    .split_whitespace()
                    .map(title_case)
                    .collect::<Vec<_>>()
                    .join(" ");
            }
        }
    }

    // Name sitting just before a reference marker: "to Swiggy Ref: ..."
    if let Ok(re) = Regex::new(r"(?i)\bto\s+([A-Za-z][A-Za-z0-9 .&]{2,30}?)\s+(?:ref|txn)") {
        if let Some(caps) = re.captures(message) {
            if let Some(m) = caps.get(1) {
                return m
                    .as_str()
                    .split_whitespace()
                    .map(title_case)
                    .collect::<Vec<_>>()
                    .join(" ");
            }
        }
    }

    String::new()
}

fn is_merchant_terminator(word: &str) -> bool {
    let lower = word.to_lowercase();
    let trimmed = lower.trim_end_matches([',', ';', ':', '.']);
    if MERCHANT_TERMINATORS.contains(&trimmed) {
        return true;
    }
    // Numbers, dates, masked accounts, glued narration ids (UPI-XXX-123)
    if trimmed.chars().any(|c| c.is_ascii_digit()) {
        return true;
    }
    matches!(
        trimmed.split(['-', '/']).next(),
        Some(head) if MERCHANT_TERMINATORS.contains(&head)
    )
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

/// Extract a reference number, or an empty string when none is present
pub fn extract_reference(message: &str) -> String {
    for pattern in REFERENCE_PATTERNS {
        if let Ok(re) = Regex::new(pattern) {
            if let Some(caps) = re.captures(message) {
                if let Some(m) = caps.get(1) {
                    return m.as_str().to_string();
                }
            }
        }
    }
    String::new()
}

/// Transaction method mentioned in a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionMethod {
    Upi,
    Neft,
    Imps,
    Rtgs,
    Atm,
    NetBanking,
    CreditCard,
    DebitCard,
    /// No recognizable method mention
    Generic,
}

impl TransactionMethod {
    /// Detect the method from message text, in fixed precedence order
    pub fn detect(message: &str) -> Self {
        let msg = message.to_lowercase();
        if msg.contains("upi") {
            Self::Upi
        } else if msg.contains("neft") {
            Self::Neft
        } else if msg.contains("imps") {
            Self::Imps
        } else if msg.contains("rtgs") {
            Self::Rtgs
        } else if msg.contains("atm") || msg.contains("cash withdrawal") || msg.contains("cash wdl")
        {
            Self::Atm
        } else if msg.contains("netbanking") || msg.contains("net banking") {
            Self::NetBanking
        } else if msg.contains("credit card") {
            Self::CreditCard
        } else if msg.contains("debit card") {
            Self::DebitCard
        } else {
            Self::Generic
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upi => "UPI",
            Self::Neft => "NEFT",
            Self::Imps => "IMPS",
            Self::Rtgs => "RTGS",
            Self::Atm => "ATM",
            Self::NetBanking => "NetBanking",
            Self::CreditCard => "Credit Card",
            Self::DebitCard => "Debit Card",
            Self::Generic => "Transaction",
        }
    }
}

impl std::fmt::Display for TransactionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Synthesize the human-readable description for a transaction
///
/// `"<method> payment to <merchant>"` for debits, `"<method> received from
/// <merchant>"` for credits; the merchant clause is omitted when empty. A
/// reference number, when extractable, is appended as `" (Ref: <ref>)"`.
pub fn generate_description(message: &str, direction: Direction, merchant: &str) -> String {
    let method = TransactionMethod::detect(message);

    let mut description = match direction {
        Direction::Debit => {
            if merchant.is_empty() {
                format!("{} payment", method)
            } else {
                format!("{} payment to {}", method, merchant)
            }
        }
        Direction::Credit => {
            if merchant.is_empty() {
                format!("{} received", method)
            } else {
                format!("{} received from {}", method, merchant)
            }
        }
    };

    let reference = extract_reference(message);
    if !reference.is_empty() {
        description.push_str(&format!(" (Ref: {})", reference));
    }

    description
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::banks::{BankId, BankRegistry};

    #[test]
    fn test_extract_amount_general_patterns() {
        assert_eq!(
            extract_amount("Rs.500.00 debited from your A/c", None),
            Some(500.0)
        );
        assert_eq!(extract_amount("INR 99 paid via UPI", None), Some(99.0));
        assert_eq!(extract_amount("Amount: 250.50 towards bill", None), Some(250.5));
    }

    #[test]
    fn test_extract_amount_strips_commas() {
        assert_eq!(
            extract_amount("Rs 1,50,000.00 credited to your account", None),
            Some(150_000.0)
        );
    }

    #[test]
    fn test_extract_amount_first_match_wins() {
        // The balance mention comes later in the text
        assert_eq!(
            extract_amount("Rs 1500 credited to your SBI account. Avl Bal Rs 20500", None),
            Some(1500.0)
        );
    }

    #[test]
    fn test_extract_amount_loose_fallback() {
        assert_eq!(extract_amount("debited by 320 for recharge", None), Some(320.0));
    }

    #[test]
    fn test_extract_amount_miss() {
        assert_eq!(extract_amount("Your OTP for login is 482913", None), None);
        assert_eq!(extract_amount("", None), None);
    }

    #[test]
    fn test_extract_amount_prefers_bank_pattern() {
        let registry = BankRegistry::new().unwrap();
        let profile = registry.profile(BankId::Hdfc);
        assert_eq!(
            extract_amount("Rs.500.00 debited from your HDFC A/c", profile),
            Some(500.0)
        );
    }

    #[test]
    fn test_extract_merchant_from_indicator() {
        let msg = "Rs.500.00 debited from your HDFC A/c for UPI payment to Swiggy on 01-01-24. Ref: ABC123";
        assert_eq!(extract_merchant_name(msg), "Swiggy");
    }

    #[test]
    fn test_extract_merchant_multi_word_stops_at_terminator() {
        let msg = "You have paid Rs.200 to Raju General Stores on 02-01-24";
        assert_eq!(extract_merchant_name(msg), "Raju General Stores");
    }

    #[test]
    fn test_extract_merchant_skips_possessive_account_phrase() {
        // "to your SBI account" is not a merchant
        let msg = "Rs 1500 credited to your SBI account";
        assert_eq!(extract_merchant_name(msg), "");
    }

    #[test]
    fn test_extract_merchant_after_from_on_credits() {
        let msg = "Rs.200 received in your A/c from Raju Stores. UPI Ref No: 400123456789";
        assert_eq!(extract_merchant_name(msg), "Raju Stores");
    }

    #[test]
    fn test_extract_merchant_skips_sending_bank() {
        let msg = "Sent Rs.50.00 from Kotak Bank AC X1234 to PhonePe Recharge";
        assert_eq!(extract_merchant_name(msg), "Phonepe Recharge");
    }

    #[test]
    fn test_extract_merchant_upi_fallback() {
        let msg = "Paid via UPI-BIGBASKET-443322110 successfully";
        assert_eq!(extract_merchant_name(msg), "Bigbasket");
    }

    #[test]
    fn test_extract_merchant_miss_is_empty() {
        assert_eq!(extract_merchant_name("Salary received"), "");
    }

    #[test]
    fn test_extract_reference_patterns() {
        assert_eq!(extract_reference("payment done. Ref: ABC123"), "ABC123");
        assert_eq!(extract_reference("Ref No: 776655"), "776655");
        assert_eq!(extract_reference("txn id: T9988"), "T9988");
        assert_eq!(extract_reference("UPI Ref No 400123456789"), "400123456789");
        assert_eq!(extract_reference("via IMPS/123456789012"), "123456789012");
        assert_eq!(extract_reference("no reference here"), "");
    }

    #[test]
    fn test_method_precedence() {
        assert_eq!(
            TransactionMethod::detect("paid via UPI using NEFT rails"),
            TransactionMethod::Upi
        );
        assert_eq!(
            TransactionMethod::detect("NEFT transfer completed"),
            TransactionMethod::Neft
        );
        assert_eq!(
            TransactionMethod::detect("cash withdrawal at branch"),
            TransactionMethod::Atm
        );
        assert_eq!(
            TransactionMethod::detect("spent on your credit card"),
            TransactionMethod::CreditCard
        );
        assert_eq!(
            TransactionMethod::detect("money moved"),
            TransactionMethod::Generic
        );
    }

    #[test]
    fn test_generate_description_debit_with_reference() {
        let msg = "Rs.500.00 debited from your HDFC A/c for UPI payment to Swiggy on 01-01-24. Ref: ABC123";
        let description = generate_description(msg, Direction::Debit, "Swiggy");
        assert_eq!(description, "UPI payment to Swiggy (Ref: ABC123)");
    }

    #[test]
    fn test_generate_description_credit_without_merchant() {
        let description = generate_description(
            "Rs 1500 credited to your SBI account",
            Direction::Credit,
            "",
        );
        assert_eq!(description, "Transaction received");
    }

    #[test]
    fn test_generate_description_credit_with_merchant() {
        let description = generate_description(
            "NEFT credit of Rs 5000 received from ACME CORP",
            Direction::Credit,
            "Acme Corp",
        );
        assert_eq!(description, "NEFT received from Acme Corp");
    }
}
