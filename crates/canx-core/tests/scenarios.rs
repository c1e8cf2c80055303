//! End-to-end extraction with the embedded rule set.

use canx_core::scoring::ConfidenceScorer;
use canx_core::{CanxConfig, FieldValue, Gate, PolicyParser, PolicyRecord, RulePolicyParser, RuleSet, Span};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

fn parser() -> RulePolicyParser {
    RulePolicyParser::new(RuleSet::embedded().unwrap())
}

#[test]
fn scenario_a_window_and_percentage_fee() {
    let result = parser().parse(
        "Free cancellation until 3 days before arrival. After that, a fee of 50% of the stay applies.",
    );

    assert_eq!(result.structured.number("window.cutoff_days"), Some(Decimal::from(3)));
    assert_eq!(result.structured.number("fee.percent"), Some(Decimal::from(50)));
    assert_eq!(result.structured.text("fee.type"), Some("percentage"));

    let rule_ids: Vec<&str> = result.hits.iter().map(|h| h.rule_id.as_str()).collect();
    assert_eq!(rule_ids, vec!["free_cancel_days", "fee_percent_of_stay"]);
    assert!(result.decision.accept);
    assert!(result.is_accepted(Gate::Decision));
    assert_eq!(result.meta.rules_version, "v1");
}

#[test]
fn scenario_b_no_recognizable_pattern() {
    let result = parser().parse("Please contact the front desk.");

    assert!(result.structured.is_empty());
    assert!(result.spans.is_empty());
    assert_eq!(result.decision.coverage, 0.0);
    assert_eq!(result.confidence.coverage, 0.0);
    assert_eq!(result.confidence.confidence, 0.0);
    assert!(!result.decision.accept);
}

#[test]
fn scenario_c_malformed_amount_lowers_confidence() {
    let config = CanxConfig::default();
    let scorer = ConfidenceScorer::new(&config.scoring.confidence);
    let text = "A FEE OF EUR 1234 APPLIES WITHIN 2 DAYS OF ARRIVAL";
    let spans = [Span::new(2, 17), Span::new(26, 50)];

    let build = |amount: FieldValue| {
        let mut record = PolicyRecord::new();
        record.write("fee.type", "fixed_amount".into());
        record.write("fee.amount", amount);
        record.write("fee.currency", "EUR".into());
        record.write("window.cutoff_days", 2i64.into());
        record
    };

    let good = scorer.score(&build(Decimal::from(1234).into()), &spans, text);
    let bad = scorer.score(&build("12,3,4".into()), &spans, text);

    assert!(bad.penalties > 0.0);
    assert!(bad.confidence < good.confidence);
}

#[test]
fn malformed_amount_from_rules_is_penalized() {
    let result = parser().parse("A cancellation fee of EUR 12,3,4 applies.");

    assert_eq!(result.structured.text("fee.amount"), Some("12,3,4"));
    assert_eq!(result.structured.text("fee.currency"), Some("EUR"));
    assert!(result.confidence.penalties > 0.0);
}

#[test]
fn hours_window_derives_cutoff_days() {
    let result = parser().parse("Cancel up to 36 hours before arrival free of charge; 1 night penalty afterwards.");

    assert_eq!(result.structured.number("window.cutoff_hours"), Some(Decimal::from(36)));
    assert_eq!(result.structured.number("window.cutoff_days"), Some(Decimal::from(2)));
    assert_eq!(result.structured.number("fee.nights"), Some(Decimal::from(1)));
    assert_eq!(result.structured.text("fee.type"), Some("nights_penalty"));
}

#[test]
fn fixed_amount_with_trailing_currency() {
    let result = parser().parse("Penalty of 150.50 USD per room, excluding taxes.");

    assert_eq!(
        result.structured.number("fee.amount"),
        Some("150.50".parse::<Decimal>().unwrap())
    );
    assert_eq!(result.structured.text("fee.currency"), Some("USD"));
    assert_eq!(result.structured.text("fee.per_room"), Some("true"));
    assert_eq!(result.structured.text("fee.tax_scope"), Some("excluded"));
}

#[test]
fn non_refundable_outranks_later_fee_types() {
    let result = parser().parse("This rate is non-refundable. The full stay will be charged.");

    assert_eq!(result.structured.text("policy.cancellable"), Some("false"));
    assert_eq!(result.structured.text("fee.type"), Some("percentage_or_nrf"));
    assert_eq!(result.structured.number("fee.percent"), Some(Decimal::from(100)));
    assert_eq!(result.hits.len(), 2);
}
