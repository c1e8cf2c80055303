//! Numeric well-formedness checks shared by resolution, coercion and scoring.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::{GROUPED_DECIMAL, PLAIN_DECIMAL};

/// Parse a plain decimal number ("50", "-1.5", "+3").
///
/// Comma thousands separators are accepted only in well-formed groups
/// ("1,234.50"); anything else, such as "12,3,4", is rejected.
/// Commas are not simply stripped, so a garbled amount stays text.
pub fn parse_decimal(s: &str) -> Option<Decimal> {
    let t = s.trim();
    if !PLAIN_DECIMAL.is_match(t) && !GROUPED_DECIMAL.is_match(t) {
        return None;
    }

    let cleaned: String = t.chars().filter(|c| *c != ',' && *c != '+').collect();
    Decimal::from_str(&cleaned).ok()
}

/// Lenient parse used when coercing count-like fields at write time.
///
/// Tolerates surrounding whitespace and a trailing percent sign.
pub fn parse_count(s: &str) -> Option<Decimal> {
    let t = s.trim();
    let t = t.strip_suffix('%').unwrap_or(t);
    parse_decimal(t)
}

/// Whether a string is a well-formed amount.
pub fn is_well_formed_amount(s: &str) -> bool {
    parse_decimal(s).is_some()
}
