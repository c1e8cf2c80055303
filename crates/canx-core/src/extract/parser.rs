//! Rule-based policy parser: normalize, match, score.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use super::{MatchEngine, MatchHit, PolicyParser};
use crate::models::config::ScoringConfig;
use crate::models::record::PolicyRecord;
use crate::models::span::Span;
use crate::normalize::normalize;
use crate::rules::RuleSet;
use crate::scoring::{ConfidenceResult, ConfidenceScorer, DecisionPolicy, DecisionResult};

/// Which scoring path decides whether rule output is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gate {
    /// Confidence must reach the configured acceptance threshold.
    #[default]
    Confidence,
    /// Filtered coverage and critical signals must meet their minimums.
    Decision,
}

/// Extraction metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionMeta {
    /// Version tag of the rule set used.
    pub rules_version: String,
    /// Number of rule occurrences.
    pub matches: usize,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Result of policy extraction.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// Input text as received.
    pub original: String,
    /// Normalized text the rules ran against.
    pub normalized: String,
    /// Extracted policy record.
    pub structured: PolicyRecord,
    /// Matched intervals in the normalized text.
    pub spans: Vec<Span>,
    /// Rule occurrences.
    pub hits: Vec<MatchHit>,
    /// Soft confidence score.
    pub confidence: ConfidenceResult,
    /// Accept/fallback decision.
    pub decision: DecisionResult,
    /// Extraction metadata.
    pub meta: ExtractionMeta,
}

impl ExtractionResult {
    /// Whether the rule output can be used without a fallback under `gate`.
    pub fn is_accepted(&self, gate: Gate) -> bool {
        match gate {
            Gate::Confidence => self.confidence.trusted,
            Gate::Decision => self.decision.accept,
        }
    }
}

/// Rule-based parser holding a compiled rule set and scoring configuration.
pub struct RulePolicyParser {
    rules: RuleSet,
    scoring: ScoringConfig,
}

impl RulePolicyParser {
    /// Create a parser with default scoring.
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            scoring: ScoringConfig::default(),
        }
    }

    /// Set the scoring configuration.
    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }
}

impl PolicyParser for RulePolicyParser {
    fn parse(&self, text: &str) -> ExtractionResult {
        let start = Instant::now();

        let normalized = normalize(text);
        let outcome = MatchEngine::new(self.rules.rules()).apply(&normalized);

        let confidence = ConfidenceScorer::new(&self.scoring.confidence)
            .score(&outcome.record, &outcome.spans, &normalized);
        let decision = DecisionPolicy::new(&self.scoring.decision)
            .decide(&outcome.record, &outcome.spans, &normalized);

        info!(
            "Extracted {} fields from {} matches (confidence {:.2}, accept {})",
            outcome.record.len(),
            outcome.hits.len(),
            confidence.confidence,
            decision.accept
        );
        debug!("Confidence components: {:?}", confidence);

        ExtractionResult {
            original: text.to_string(),
            normalized,
            meta: ExtractionMeta {
                rules_version: self.rules.version().to_string(),
                matches: outcome.hits.len(),
                processing_time_ms: start.elapsed().as_millis() as u64,
            },
            structured: outcome.record,
            spans: outcome.spans,
            hits: outcome.hits,
            confidence,
            decision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;
    use rust_decimal::Decimal;

    const SCENARIO_A: &str =
        "Free cancellation until 3 days before arrival. After that, a fee of 50% of the stay applies.";

    fn scenario_rules() -> RuleSet {
        RuleSet::new(vec![
            Rule::new(
                "cutoff_days",
                90,
                r"FREE CANCELLATION UNTIL (?P<days>\d+) DAYS? BEFORE ARRIVAL",
                Some([("window.cutoff_days", "$days"), ("window.type", "relative_to_arrival")]),
            )
            .unwrap(),
            Rule::new(
                "fee_percent",
                70,
                r"(?P<pct>\d+)% OF THE STAY",
                Some([("fee.percent", "$pct"), ("fee.type", "percentage")]),
            )
            .unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_scenario_a_accepts() {
        let parser = RulePolicyParser::new(scenario_rules());
        let result = parser.parse(SCENARIO_A);

        assert_eq!(result.structured.number("window.cutoff_days"), Some(Decimal::from(3)));
        assert_eq!(result.structured.number("fee.percent"), Some(Decimal::from(50)));
        assert_eq!(result.spans.len(), 2);
        assert!(result.spans.iter().all(|s| !s.is_empty()));
        assert!(result.decision.coverage > parser.scoring().decision.coverage_threshold);
        assert!(result.decision.accept);
        assert!(result.is_accepted(Gate::Decision));
        assert_eq!(result.meta.matches, 2);
    }

    #[test]
    fn test_scenario_b_falls_back() {
        let parser = RulePolicyParser::new(scenario_rules());
        let result = parser.parse("Please contact the front desk.");

        assert!(result.structured.is_empty());
        assert!(result.spans.is_empty());
        assert!(result.hits.is_empty());
        assert_eq!(result.decision.coverage, 0.0);
        assert_eq!(result.confidence.confidence, 0.0);
        assert!(!result.decision.accept);
        assert!(!result.is_accepted(Gate::Confidence));
    }

    #[test]
    fn test_empty_input() {
        let parser = RulePolicyParser::new(scenario_rules());
        let result = parser.parse("");
        assert_eq!(result.normalized, "");
        assert!(result.structured.is_empty());
        assert!(!result.decision.accept);
    }

    #[test]
    fn test_output_serializes_nested_record() {
        let parser = RulePolicyParser::new(scenario_rules().with_version("v9"));
        let json = serde_json::to_value(parser.parse(SCENARIO_A)).unwrap();

        assert_eq!(json["structured"]["window"]["cutoff_days"], 3);
        assert_eq!(json["structured"]["fee"]["type"], "percentage");
        assert_eq!(json["meta"]["rules_version"], "v9");
        assert_eq!(json["hits"][0]["rule_id"], "cutoff_days");
    }
}
