//! Trust scoring for rule-derived records.
//!
//! Two independent policies: [`ConfidenceScorer`] produces a soft score,
//! [`DecisionPolicy`] a hard accept/fallback gate. Callers pick one.

pub mod confidence;
pub mod coverage;
pub mod decision;

pub use confidence::{ConfidenceResult, ConfidenceScorer};
pub use coverage::{coverage, covered_length, filtered_length, merge_spans};
pub use decision::{DecisionPolicy, DecisionResult, SignalFamily};
