//! Soft confidence score for rule-derived records.

use serde::Serialize;

use super::coverage::coverage;
use crate::models::config::ConfidenceConfig;
use crate::models::record::PolicyRecord;
use crate::models::span::Span;
use crate::rules::number::is_well_formed_amount;

/// Monetary field checked for well-formedness.
const FEE_AMOUNT: &str = "fee.amount";

/// Confidence plus the components it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceResult {
    /// Final confidence (0.0 - 1.0).
    pub confidence: f32,
    /// Weighted field-presence score.
    pub field_score: f32,
    /// Raw coverage of the normalized text.
    pub coverage: f32,
    /// Bucketed coverage score.
    pub coverage_score: f32,
    /// Number of critical fields present.
    pub critical_present: usize,
    /// Total penalty subtracted.
    pub penalties: f32,
    /// Whether the low-signal cap was applied.
    pub capped: bool,
    /// Whether confidence reaches the acceptance threshold.
    pub trusted: bool,
}

/// Blends field presence and coverage into a confidence value.
pub struct ConfidenceScorer<'a> {
    config: &'a ConfidenceConfig,
}

impl<'a> ConfidenceScorer<'a> {
    pub fn new(config: &'a ConfidenceConfig) -> Self {
        Self { config }
    }

    /// Score a record against the spans it came from and the normalized text.
    pub fn score(&self, record: &PolicyRecord, spans: &[Span], text: &str) -> ConfidenceResult {
        let (field_score, critical_present) = self.field_score(record);
        let coverage = coverage(spans, text.len());
        let coverage_score = self.coverage_score(coverage);
        let penalties = self.penalties(record);
        let (confidence, capped) = self.blend(field_score, coverage_score, critical_present, penalties);

        ConfidenceResult {
            confidence,
            field_score,
            coverage,
            coverage_score,
            critical_present,
            penalties,
            capped,
            trusted: confidence >= self.config.accept_threshold,
        }
    }

    /// Weighted-average presence strength and the critical-field count.
    pub fn field_score(&self, record: &PolicyRecord) -> (f32, usize) {
        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        let mut critical = 0;

        for (field, weight) in &self.config.field_weights {
            total_weight += weight;
            if !record.is_present(field) {
                continue;
            }
            if self.is_critical(field) {
                critical += 1;
                weighted += weight;
            } else {
                weighted += self.config.non_critical_strength * weight;
            }
        }

        let score = if total_weight > 0.0 { weighted / total_weight } else { 0.0 };
        (score, critical)
    }

    fn is_critical(&self, field: &str) -> bool {
        self.config.critical_fields.iter().any(|f| f == field)
    }

    /// Score of the highest bucket whose minimum `coverage` meets.
    pub fn coverage_score(&self, coverage: f32) -> f32 {
        if !(coverage > 0.0) {
            return 0.0;
        }
        self.config
            .coverage_to_score
            .iter()
            .filter(|b| coverage >= b.min)
            .max_by(|a, b| a.min.total_cmp(&b.min))
            .map_or(0.0, |b| b.score)
    }

    /// Total penalty for malformed values in the record.
    pub fn penalties(&self, record: &PolicyRecord) -> f32 {
        let mut total = 0.0;
        if record
            .text(FEE_AMOUNT)
            .is_some_and(|amount| !is_well_formed_amount(amount))
        {
            total += self.config.penalties.bad_fee_amount;
        }
        if record.has_malformed_numeric() {
            total += self.config.penalties.malformed_numeric;
        }
        total
    }

    /// Blend components, clamp to [0, 1] and apply the low-signal cap.
    pub fn blend(
        &self,
        field_score: f32,
        coverage_score: f32,
        critical_present: usize,
        penalties: f32,
    ) -> (f32, bool) {
        let alpha = self.config.alpha;
        let blended = (alpha * field_score + (1.0 - alpha) * coverage_score - penalties).clamp(0.0, 1.0);

        if critical_present < self.config.min_critical_signals && blended > self.config.low_critical_cap {
            (self.config.low_critical_cap, true)
        } else {
            (blended, false)
        }
    }
}
