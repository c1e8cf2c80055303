//! Interval coverage of matched text.

use std::cmp::Reverse;

use regex::Regex;
use tracing::warn;

use crate::models::span::Span;
use crate::normalize::{collapse_whitespace, normalize};

/// Merge overlapping or touching spans into disjoint, sorted intervals.
pub fn merge_spans(spans: &[Span]) -> Vec<Span> {
    let mut sorted = spans.to_vec();
    sorted.sort_by_key(Span::start);

    let mut merged: Vec<Span> = Vec::with_capacity(sorted.len());
    for span in sorted {
        match merged.last_mut() {
            Some(last) if span.start() <= last.end() => {
                *last = Span::new(last.start(), last.end().max(span.end()));
            }
            _ => merged.push(span),
        }
    }
    merged
}

/// Total length covered by the union of `spans`.
pub fn covered_length(spans: &[Span]) -> usize {
    merge_spans(spans).iter().map(Span::len).sum()
}

/// Fraction of `denominator` covered by `spans`.
///
/// Returns 0 for no spans or a zero denominator. The ratio is not clamped.
pub fn coverage(spans: &[Span], denominator: usize) -> f32 {
    if spans.is_empty() || denominator == 0 {
        return 0.0;
    }
    covered_length(spans) as f32 / denominator as f32
}

/// Length of `text` after removing boilerplate phrases and ignorable
/// characters and re-collapsing whitespace.
///
/// Boilerplate is removed as whole words only: `THANK YOU` does not touch
/// `THANK YOUR`.
pub fn filtered_length(text: &str, ignorable_chars: &str, boilerplate: &[String]) -> usize {
    let filtered = match boilerplate_pattern(boilerplate) {
        Some(pattern) => pattern.replace_all(text, " ").into_owned(),
        None => text.to_string(),
    };

    let stripped: String = filtered
        .chars()
        .filter(|c| !ignorable_chars.contains(*c))
        .collect();

    collapse_whitespace(&stripped).len()
}

/// One alternation over the normalized tokens, longest first, with word
/// boundaries on the edges that are word characters.
fn boilerplate_pattern(boilerplate: &[String]) -> Option<Regex> {
    let mut tokens: Vec<String> = boilerplate
        .iter()
        .map(|t| normalize(t))
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return None;
    }
    tokens.sort_by_key(|t| Reverse(t.len()));

    let alternatives: Vec<String> = tokens
        .iter()
        .map(|token| {
            let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
            let lead = if is_word(token.chars().next()) { r"\b" } else { "" };
            let trail = if is_word(token.chars().last()) { r"\b" } else { "" };
            format!("{}{}{}", lead, regex::escape(token), trail)
        })
        .collect();

    match Regex::new(&alternatives.join("|")) {
        Ok(pattern) => Some(pattern),
        Err(e) => {
            warn!("Ignoring boilerplate tokens: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn spans(pairs: &[(usize, usize)]) -> Vec<Span> {
        pairs.iter().copied().map(Span::from).collect()
    }

    #[test]
    fn test_merge_overlapping_and_touching() {
        let merged = merge_spans(&spans(&[(10, 15), (0, 5), (3, 8), (8, 9), (20, 22)]));
        assert_eq!(merged, spans(&[(0, 9), (10, 15), (20, 22)]));
    }

    #[test]
    fn test_contained_span_does_not_shrink() {
        let merged = merge_spans(&spans(&[(0, 10), (2, 4)]));
        assert_eq!(merged, spans(&[(0, 10)]));
    }

    #[test]
    fn test_coverage_ratio() {
        assert_eq!(coverage(&spans(&[(0, 5), (3, 10)]), 20), 0.5);
        assert_eq!(coverage(&spans(&[(0, 20)]), 20), 1.0);
    }

    #[test]
    fn test_coverage_zero_cases() {
        assert_eq!(coverage(&[], 10), 0.0);
        assert_eq!(coverage(&spans(&[(0, 5)]), 0), 0.0);
    }

    #[test]
    fn test_filtered_length() {
        let text = "PLEASE NOTE THAT: FREE CANCELLATION. THANK YOU!";
        let boilerplate = vec!["please note".to_string(), "Please note that".to_string(), "THANK YOU".to_string()];
        assert_eq!(filtered_length(text, ".,;:!", &boilerplate), "FREE CANCELLATION".len());
    }

    #[test]
    fn test_boilerplate_removed_only_as_whole_words() {
        let boilerplate = vec!["THANK YOU".to_string()];
        let text = "THANK YOUR STAY";
        assert_eq!(filtered_length(text, "", &boilerplate), text.len());
        assert_eq!(filtered_length("THANK YOU, STAY", ",", &boilerplate), "STAY".len());
    }

    #[test]
    fn test_filtered_length_without_filters() {
        assert_eq!(filtered_length("A B", "", &[]), 3);
    }
}
