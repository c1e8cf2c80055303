//! Core library for cancellation-policy extraction.
//!
//! This crate provides:
//! - Text normalization
//! - Prioritized regex rules with a small field-map expression language
//! - A first-match-wins policy record built from rule occurrences
//! - Span coverage, confidence scoring and an accept/fallback decision
//! - English/Chinese rendering of extracted policies

pub mod error;
pub mod extract;
pub mod models;
pub mod normalize;
pub mod render;
pub mod rules;
pub mod scoring;

pub use error::{CanxError, Result, RuleError};
pub use extract::{ExtractionResult, Gate, MatchEngine, MatchHit, MatchOutcome, PolicyParser, RulePolicyParser};
pub use models::config::CanxConfig;
pub use models::record::{FieldValue, PolicyRecord};
pub use models::span::Span;
pub use normalize::normalize;
pub use render::{render_policy, RenderedPolicy};
pub use rules::{Rule, RuleSet};
pub use scoring::{ConfidenceResult, ConfidenceScorer, DecisionPolicy, DecisionResult};
