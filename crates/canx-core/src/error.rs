//! Error types for the canx-core library.
//!
//! Extraction itself never fails; these errors cover loading rules and
//! configuration before any text is processed.

use thiserror::Error;

/// Main error type for the canx library.
#[derive(Error, Debug)]
pub enum CanxError {
    /// Rule definition error.
    #[error("rule error: {0}")]
    Rules(#[from] RuleError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors raised while compiling a rule set.
#[derive(Error, Debug)]
pub enum RuleError {
    /// The rule pattern is not a valid regular expression.
    #[error("invalid pattern in rule {id}: {source}")]
    InvalidPattern {
        id: String,
        #[source]
        source: regex::Error,
    },

    /// Two rules share the same identifier.
    #[error("duplicate rule id: {0}")]
    DuplicateId(String),

    /// A rule has an empty identifier.
    #[error("rule with empty id")]
    EmptyId,
}

/// Result type for the canx library.
pub type Result<T> = std::result::Result<T, CanxError>;
