//! Policy extraction: matching and the end-to-end pipeline.

mod engine;
mod parser;

pub use engine::{apply, MatchEngine};
pub use parser::{ExtractionMeta, ExtractionResult, Gate, RulePolicyParser};

use serde::Serialize;

use crate::models::record::PolicyRecord;
use crate::models::span::Span;
use crate::rules::CaptureMap;

/// One rule occurrence, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchHit {
    /// Identifier of the rule that matched.
    pub rule_id: String,
    /// Matched interval in the normalized text.
    pub span: Span,
    /// Named captures of the occurrence.
    pub captures: CaptureMap,
}

/// Output of one matching pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    pub record: PolicyRecord,
    pub spans: Vec<Span>,
    pub hits: Vec<MatchHit>,
}

/// Trait for policy parsers.
///
/// The rule-based parser implements it; an external fallback classifier can
/// implement it as well and be swapped in when rule confidence is low.
pub trait PolicyParser {
    /// Parse free-form policy text. Never fails: unrecognized text yields an
    /// empty record.
    fn parse(&self, text: &str) -> ExtractionResult;
}
