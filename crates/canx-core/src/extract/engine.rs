//! Rule-ordered matching that builds the policy record and span list.

use std::cmp::Reverse;

use tracing::debug;

use super::{MatchHit, MatchOutcome};
use crate::models::record::WriteOutcome;
use crate::models::span::Span;
use crate::rules::Rule;

/// Applies rules to normalized text in descending priority order.
pub struct MatchEngine<'a> {
    rules: Vec<&'a Rule>,
}

impl<'a> MatchEngine<'a> {
    /// Order rules for evaluation; equal priorities keep their input order.
    pub fn new(rules: &'a [Rule]) -> Self {
        let mut rules: Vec<&Rule> = rules.iter().collect();
        rules.sort_by_key(|r| Reverse(r.priority()));
        Self { rules }
    }

    /// Run every enabled rule over `text`.
    ///
    /// Each occurrence contributes a span and a hit whether or not it wrote
    /// a field; the first value written to a path is kept.
    pub fn apply(&self, text: &str) -> MatchOutcome {
        let mut outcome = MatchOutcome::default();

        for rule in &self.rules {
            let Some(fields) = rule.fields() else {
                debug!("Skipping disabled rule {}", rule.id());
                continue;
            };

            let mut cursor = 0;
            while let Some(occurrence) = rule.next_occurrence(text, cursor) {
                cursor = advance(text, occurrence.span);

                debug!(
                    "[match] {} at {}..{} {:?}",
                    rule.id(),
                    occurrence.span.start(),
                    occurrence.span.end(),
                    occurrence.captures
                );

                for mapping in fields {
                    let Some(value) = mapping.expr.resolve(&occurrence.captures) else {
                        continue;
                    };
                    match outcome.record.write(&mapping.path, value) {
                        WriteOutcome::Written => {}
                        refused => debug!(
                            "Rule {} did not write {}: {:?}",
                            rule.id(),
                            mapping.path,
                            refused
                        ),
                    }
                }

                outcome.spans.push(occurrence.span);
                outcome.hits.push(MatchHit {
                    rule_id: rule.id().to_string(),
                    span: occurrence.span,
                    captures: occurrence.captures,
                });
            }
        }

        outcome
    }
}

/// Offset to resume searching from; empty matches step over one character.
fn advance(text: &str, span: Span) -> usize {
    if !span.is_empty() {
        return span.end();
    }
    text[span.end()..]
        .chars()
        .next()
        .map_or(text.len() + 1, |c| span.end() + c.len_utf8())
}

/// Convenience wrapper: match `rules` against `text`.
pub fn apply(rules: &[Rule], text: &str) -> MatchOutcome {
    MatchEngine::new(rules).apply(text)
}
