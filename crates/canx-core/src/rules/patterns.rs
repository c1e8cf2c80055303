//! Fixed regex patterns used by the expression language and number checks.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Plain decimal: optional sign, digits, optional fraction
    pub static ref PLAIN_DECIMAL: Regex = Regex::new(
        r"^[+-]?[0-9]+(?:\.[0-9]+)?$"
    ).unwrap();

    // Decimal with comma thousands separators (1,234 or 12,345.50)
    pub static ref GROUPED_DECIMAL: Regex = Regex::new(
        r"^[+-]?[0-9]{1,3}(?:,[0-9]{3})+(?:\.[0-9]+)?$"
    ).unwrap();

    // Capture reference inside an expression term ($days, $amt2)
    pub static ref CAPTURE_REF: Regex = Regex::new(
        r"\$([A-Za-z_][A-Za-z0-9_]*)"
    ).unwrap();

    // ceil(...) call wrapping a whole term
    pub static ref CEIL_CALL: Regex = Regex::new(
        r"(?i)^ceil\(\s*([^)]+?)\s*\)$"
    ).unwrap();

    // OR separator between expression terms
    pub static ref OR_SEPARATOR: Regex = Regex::new(
        r"(?i)\s+or\s+"
    ).unwrap();
}
