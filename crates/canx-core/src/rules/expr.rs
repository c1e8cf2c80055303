//! Field-map expression language.
//!
//! An expression is a list of terms separated by `or`. Each term may reference
//! named captures as `$name`, may be wrapped in `ceil(X)` or `ceil(X/Y)`, and
//! otherwise resolves to a number or verbatim text. The first term that
//! resolves to a non-empty value wins.

use std::fmt;

use rust_decimal::Decimal;

use super::number::parse_decimal;
use super::patterns::{CAPTURE_REF, CEIL_CALL, OR_SEPARATOR};
use super::CaptureMap;
use crate::models::record::FieldValue;

/// A parsed field-map expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    terms: Vec<String>,
}

impl Expression {
    /// Split an expression template into its OR-terms.
    pub fn parse(template: &str) -> Self {
        let terms = OR_SEPARATOR
            .split(template.trim())
            .map(|t| t.trim().to_string())
            .collect();
        Self { terms }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Resolve against one occurrence's captures.
    ///
    /// Returns `None` when no term yields a non-empty value.
    pub fn resolve(&self, captures: &CaptureMap) -> Option<FieldValue> {
        self.terms
            .iter()
            .filter_map(|term| eval_term(term, captures))
            .find(|value| !value.is_empty())
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.terms.join(" or "))
    }
}

fn eval_term(term: &str, captures: &CaptureMap) -> Option<FieldValue> {
    let substituted = substitute(term, captures)?;
    let s = substituted.trim();

    if let Some(caps) = CEIL_CALL.captures(s) {
        return eval_ceil(&caps[1]).map(FieldValue::Number);
    }

    if let Some(n) = parse_decimal(s) {
        return Some(FieldValue::Number(n));
    }

    if s.is_empty() {
        None
    } else {
        Some(FieldValue::text(s))
    }
}

/// Replace every `$name` with its capture; a missing or empty capture
/// abandons the whole term.
fn substitute(term: &str, captures: &CaptureMap) -> Option<String> {
    let all_present = CAPTURE_REF.captures_iter(term).all(|caps| {
        captures
            .get(&caps[1])
            .is_some_and(|value| !value.is_empty())
    });
    if !all_present {
        return None;
    }

    let replaced = CAPTURE_REF.replace_all(term, |caps: &regex::Captures| {
        captures.get(&caps[1]).cloned().unwrap_or_default()
    });
    Some(replaced.into_owned())
}

fn eval_ceil(inner: &str) -> Option<Decimal> {
    let parts: Vec<&str> = inner.split('/').collect();
    match parts.as_slice() {
        [x] => parse_decimal(x).map(|x| x.ceil()),
        [x, y] => {
            let x = parse_decimal(x)?;
            let y = parse_decimal(y)?;
            if y.is_zero() {
                return None;
            }
            x.checked_div(y).map(|q| q.ceil())
        }
        _ => None,
    }
}
