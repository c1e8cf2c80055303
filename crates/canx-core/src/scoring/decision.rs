//! Hard accept/fallback gate for rule-derived records.

use serde::Serialize;

use super::coverage::{coverage, filtered_length};
use crate::models::config::DecisionConfig;
use crate::models::record::PolicyRecord;
use crate::models::span::Span;

/// Fee types that count as a fee signal on their own.
const FULL_STAY_FEE_TYPES: &[&str] = &["full_stay", "entire_stay_room_and_tax"];

/// A family of alternative fields that together form one critical signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalFamily {
    Fee,
    Deadline,
    Window,
}

impl SignalFamily {
    pub const ALL: [SignalFamily; 3] = [SignalFamily::Fee, SignalFamily::Deadline, SignalFamily::Window];

    /// Whether any member of the family is set in `record`.
    pub fn is_present(self, record: &PolicyRecord) -> bool {
        match self {
            SignalFamily::Fee => {
                ["fee.amount", "fee.nights", "fee.percent"]
                    .iter()
                    .any(|p| record.is_present(p))
                    || record
                        .text("fee.type")
                        .is_some_and(|t| FULL_STAY_FEE_TYPES.iter().any(|f| t.eq_ignore_ascii_case(f)))
            }
            SignalFamily::Deadline => ["deadline.iso", "deadline.date_ddmmmyy", "deadline.local_hour"]
                .iter()
                .any(|p| record.is_present(p)),
            SignalFamily::Window => ["window.cutoff_days", "window.cutoff_hours", "special_window.cutoff_days"]
                .iter()
                .any(|p| record.is_present(p)),
        }
    }
}

/// Accept/fallback decision and the evidence behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionResult {
    /// Rule output is usable without fallback.
    pub accept: bool,
    /// Coverage over the filtered denominator.
    pub coverage: f32,
    /// Number of critical signal families present.
    pub critical_signals: usize,
    /// The families that were present.
    pub signals: Vec<SignalFamily>,
}

/// Thresholds filtered coverage and signal count into a decision.
pub struct DecisionPolicy<'a> {
    config: &'a DecisionConfig,
}

impl<'a> DecisionPolicy<'a> {
    pub fn new(config: &'a DecisionConfig) -> Self {
        Self { config }
    }

    pub fn decide(&self, record: &PolicyRecord, spans: &[Span], text: &str) -> DecisionResult {
        let denominator = filtered_length(text, &self.config.ignorable_chars, &self.config.boilerplate_tokens);
        let coverage = coverage(spans, denominator);

        let signals: Vec<SignalFamily> = SignalFamily::ALL
            .into_iter()
            .filter(|family| family.is_present(record))
            .collect();
        let critical_signals = signals.len();

        let accept = coverage >= self.config.coverage_threshold
            && critical_signals >= self.config.min_critical_signals;

        DecisionResult {
            accept,
            coverage,
            critical_signals,
            signals,
        }
    }
}
