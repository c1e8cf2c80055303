//! Configuration structures for the extraction pipeline.
//!
//! Configuration is loaded once and borrowed by the scorers; nothing reads
//! it from global state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CanxError, Result};

/// Main configuration for canx.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CanxConfig {
    /// Rule source configuration.
    pub rules: RulesConfig,

    /// Scoring configuration.
    pub scoring: ScoringConfig,
}

/// Where rules are loaded from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Rule file (YAML or JSON). `None` uses the embedded rule set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Configuration for both scoring paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Soft confidence scoring.
    pub confidence: ConfidenceConfig,

    /// Hard accept/fallback gate.
    pub decision: DecisionConfig,
}

/// One row of the coverage-to-score table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverageBucket {
    /// Minimum coverage for this bucket.
    pub min: f32,
    /// Score assigned when the minimum is met.
    pub score: f32,
}

/// Penalty magnitudes subtracted from the blended confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Penalties {
    /// `fee.amount` holds a string that is not a well-formed number.
    pub bad_fee_amount: f32,

    /// A count-like field could not be coerced to a number.
    pub malformed_numeric: f32,
}

impl Default for Penalties {
    fn default() -> Self {
        Self {
            bad_fee_amount: 0.1,
            malformed_numeric: 0.05,
        }
    }
}

/// Confidence scorer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Blend weight of the field score against the coverage score.
    pub alpha: f32,

    /// Field path to weight.
    pub field_weights: BTreeMap<String, f32>,

    /// Fields whose presence counts as a critical signal.
    pub critical_fields: Vec<String>,

    /// Strength of a present non-critical field (critical fields count 1.0).
    pub non_critical_strength: f32,

    /// Coverage-to-score buckets.
    pub coverage_to_score: Vec<CoverageBucket>,

    /// Critical fields required before confidence may exceed the cap.
    pub min_critical_signals: usize,

    /// Confidence ceiling applied below the critical minimum.
    pub low_critical_cap: f32,

    /// Penalty magnitudes.
    pub penalties: Penalties,

    /// Confidence at which the rule output is trusted without fallback.
    pub accept_threshold: f32,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        let field_weights = [
            ("deadline.iso", 0.45),
            ("window.cutoff_days", 0.25),
            ("fee.amount", 0.15),
            ("fee.nights", 0.15),
            ("deadline.local_hour", 0.05),
            ("deadline.date_ddmmmyy", 0.05),
            ("fee.currency", 0.05),
            ("fee.percent", 0.10),
        ]
        .into_iter()
        .map(|(k, w)| (k.to_string(), w))
        .collect();

        let critical_fields = [
            "deadline.iso",
            "window.cutoff_days",
            "fee.amount",
            "fee.nights",
            "fee.percent",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        Self {
            alpha: 0.75,
            field_weights,
            critical_fields,
            non_critical_strength: 0.6,
            coverage_to_score: vec![
                CoverageBucket { min: 0.40, score: 1.0 },
                CoverageBucket { min: 0.20, score: 0.6 },
                CoverageBucket { min: 0.00, score: 0.3 },
            ],
            min_critical_signals: 2,
            low_critical_cap: 0.6,
            penalties: Penalties::default(),
            accept_threshold: 0.8,
        }
    }
}

/// Decision policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// Minimum filtered coverage to accept rule output.
    pub coverage_threshold: f32,

    /// Minimum number of critical signal families present.
    pub min_critical_signals: usize,

    /// Characters removed before measuring the coverage denominator.
    pub ignorable_chars: String,

    /// Phrases removed before measuring the coverage denominator.
    pub boilerplate_tokens: Vec<String>,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            coverage_threshold: 0.35,
            min_critical_signals: 2,
            ignorable_chars: ".,;:!()\"'".to_string(),
            boilerplate_tokens: vec![
                "PLEASE NOTE THAT".to_string(),
                "PLEASE NOTE".to_string(),
                "THANK YOU".to_string(),
            ],
        }
    }
}

impl CanxConfig {
    /// Load configuration from a JSON file and validate it.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values that would make scoring meaningless.
    pub fn validate(&self) -> Result<()> {
        let conf = &self.scoring.confidence;
        check_unit("scoring.confidence.alpha", conf.alpha)?;
        check_unit("scoring.confidence.non_critical_strength", conf.non_critical_strength)?;
        check_unit("scoring.confidence.low_critical_cap", conf.low_critical_cap)?;
        check_unit("scoring.confidence.accept_threshold", conf.accept_threshold)?;

        if let Some((field, w)) = conf.field_weights.iter().find(|(_, w)| !(**w >= 0.0)) {
            return Err(CanxError::Config(format!(
                "weight for {} must be non-negative, got {}",
                field, w
            )));
        }

        if let Some(bucket) = conf
            .coverage_to_score
            .iter()
            .find(|b| !b.min.is_finite() || !b.score.is_finite())
        {
            return Err(CanxError::Config(format!(
                "coverage bucket {:?} must be finite",
                bucket
            )));
        }

        let penalties = &conf.penalties;
        if !(penalties.bad_fee_amount >= 0.0) || !(penalties.malformed_numeric >= 0.0) {
            return Err(CanxError::Config("penalties must be non-negative".to_string()));
        }

        if !(self.scoring.decision.coverage_threshold >= 0.0) {
            return Err(CanxError::Config(
                "scoring.decision.coverage_threshold must be non-negative".to_string(),
            ));
        }

        Ok(())
    }
}

fn check_unit(name: &str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(CanxError::Config(format!("{} must be within [0, 1], got {}", name, value)))
    }
}
