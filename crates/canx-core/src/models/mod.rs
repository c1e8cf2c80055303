//! Data models shared across the pipeline.

pub mod config;
pub mod embedded;
pub mod record;
pub mod span;

pub use config::{CanxConfig, ConfidenceConfig, CoverageBucket, DecisionConfig, Penalties, RulesConfig, ScoringConfig};
pub use record::{FieldValue, PolicyRecord, WriteOutcome};
pub use span::Span;
