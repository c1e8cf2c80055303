//! Integration tests for the `canx` binary.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

const SCENARIO_A: &str =
    "Free cancellation until 3 days before arrival. After that, a fee of 50% of the stay applies.";

/// The binary with the per-user config directory pointed away from the
/// developer's own config.
fn canx() -> Command {
    let mut cmd = Command::cargo_bin("canx").unwrap();
    cmd.env("XDG_CONFIG_HOME", "/nonexistent/canx-test-config");
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

#[test]
fn extract_outputs_structured_json() {
    let json = stdout_json(canx().args(["extract", SCENARIO_A]));

    assert_eq!(json["structured"]["window"]["cutoff_days"], 3);
    assert_eq!(json["structured"]["fee"]["percent"], 50);
    assert_eq!(json["structured"]["fee"]["type"], "percentage");
    assert_eq!(json["hits"].as_array().unwrap().len(), 2);
    assert_eq!(json["decision"]["accept"], true);
    assert_eq!(json["meta"]["rules_version"], "v1");
}

#[test]
fn extract_unrecognized_text_is_not_accepted() {
    let json = stdout_json(canx().args(["extract", "--gate", "decision", "Please contact the front desk."]));

    assert_eq!(json["structured"], serde_json::json!({}));
    assert_eq!(json["spans"], serde_json::json!([]));
    assert_eq!(json["accepted"], false);
}

#[test]
fn extract_text_format_with_render() {
    canx()
        .args(["extract", "--format", "text", "--render", SCENARIO_A])
        .assert()
        .success()
        .stdout(predicate::str::contains("window.cutoff_days = 3"))
        .stdout(predicate::str::contains(
            "EN: Free cancellation until 3 day(s) before arrival.",
        ))
        .stdout(predicate::str::contains("CN: "));
}

#[test]
fn extract_reads_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("policy.txt");
    fs::write(&input, "This rate is\r\nnon-refundable.").unwrap();

    let json = stdout_json(canx().arg("extract").arg("--file").arg(&input));
    assert_eq!(json["normalized"], "THIS RATE IS NON-REFUNDABLE.");
    assert_eq!(json["structured"]["policy"]["cancellable"], "false");
}

#[test]
fn extract_missing_file_fails() {
    canx()
        .args(["extract", "--file", "/nonexistent/policy.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn extract_with_custom_rule_file() {
    let dir = TempDir::new().unwrap();
    let rules = dir.path().join("rules.json");
    fs::write(
        &rules,
        r#"{
            "version": "custom-1",
            "rules": [
                {
                    "id": "deposit",
                    "priority": 10,
                    "regex": "DEPOSIT OF (?P<pct>\\d+)%",
                    "map": { "fee": { "type": "percentage", "percent": "$pct" } }
                }
            ]
        }"#,
    )
    .unwrap();

    let json = stdout_json(
        canx()
            .arg("extract")
            .arg("--rules")
            .arg(&rules)
            .arg("A deposit of 30% is kept on cancellation."),
    );

    assert_eq!(json["structured"]["fee"]["percent"], 30);
    assert_eq!(json["meta"]["rules_version"], "custom-1");
}

#[test]
fn batch_writes_results_and_summary() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.json");
    let output = dir.path().join("output.json");
    let summary = dir.path().join("summary.csv");
    fs::write(
        &input,
        serde_json::json!([
            { "cancellationText": SCENARIO_A },
            { "otherField": "no text here" },
            { "cancellationText": "Please contact the front desk." }
        ])
        .to_string(),
    )
    .unwrap();

    canx()
        .arg("batch")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .arg("--summary")
        .arg(&summary)
        .arg("--continue-on-error")
        .assert()
        .success();

    let results: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let entries = results.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["result"]["structured"]["window"]["cutoff_days"], 3);
    assert!(entries[1]["error"]
        .as_str()
        .unwrap()
        .contains("missing field 'cancellationText'"));
    assert_eq!(entries[2]["accepted"], false);

    let csv = fs::read_to_string(&summary).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("index,status,fields"));
    assert!(lines[1].starts_with("0,success,4,2,"));
    assert!(lines[2].starts_with("1,error,"));
}

#[test]
fn batch_stops_on_first_error_by_default() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.json");
    fs::write(&input, r#"[{ "text": "non-refundable" }]"#).unwrap();

    canx()
        .arg("batch")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Processing failed at record 0"));
}

#[test]
fn batch_custom_text_field() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.json");
    fs::write(&input, r#"[{ "text": "This rate is non-refundable." }]"#).unwrap();

    let json = stdout_json(canx().arg("batch").arg(&input).args(["--text-field", "text"]));
    assert_eq!(json[0]["result"]["structured"]["fee"]["percent"], 100);
}

#[test]
fn batch_rejects_non_array_input() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.json");
    fs::write(&input, r#"{ "cancellationText": "x" }"#).unwrap();

    canx()
        .arg("batch")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Expected a JSON array"));
}

#[test]
fn rules_list_shows_embedded_rules() {
    canx()
        .args(["rules", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("non_refundable"))
        .stdout(predicate::str::contains("version v1"));
}

#[test]
fn rules_check_reports_disabled_rules() {
    let dir = TempDir::new().unwrap();
    let rules = dir.path().join("rules.yml");
    fs::write(
        &rules,
        "version: t1\nrules:\n  - id: good\n    priority: 5\n    regex: 'NO SHOW'\n    map:\n      policy.no_show_charged: 'true'\n  - id: unmapped\n    priority: 1\n    regex: 'FOO'\n",
    )
    .unwrap();

    canx()
        .args(["rules", "check"])
        .arg(&rules)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 rules compiled (version t1)"))
        .stdout(predicate::str::contains("disabled by a missing or malformed map: unmapped"));
}

#[test]
fn rules_check_rejects_invalid_pattern() {
    let dir = TempDir::new().unwrap();
    let rules = dir.path().join("rules.yml");
    fs::write(
        &rules,
        "rules:\n  - id: broken\n    regex: '(UNCLOSED'\n    map:\n      fee.type: x\n",
    )
    .unwrap();

    canx()
        .args(["rules", "check"])
        .arg(&rules)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid pattern in rule broken"));
}

#[test]
fn config_init_then_get() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.json");

    canx()
        .args(["config", "init", "--output"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));
    assert!(path.exists());

    canx()
        .arg("--config")
        .arg(&path)
        .args(["config", "get", "scoring.confidence.alpha"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0.75"));

    canx()
        .args(["config", "init", "--output"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn config_get_unknown_key_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    canx()
        .arg("--config")
        .arg(&path)
        .args(["config", "get", "scoring.nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}

#[test]
fn invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{ "scoring": { "confidence": { "alpha": 1.5 } } }"#).unwrap();

    canx()
        .arg("--config")
        .arg(&path)
        .args(["extract", SCENARIO_A])
        .assert()
        .failure()
        .stderr(predicate::str::contains("alpha"));
}

#[cfg(target_os = "linux")]
#[test]
fn per_user_config_applies_without_flag() {
    let home = TempDir::new().unwrap();
    let user_config = home.path().join("canx").join("config.json");

    canx()
        .env("XDG_CONFIG_HOME", home.path())
        .args(["config", "init"])
        .assert()
        .success();
    assert!(user_config.exists());

    let mut config: Value = serde_json::from_str(&fs::read_to_string(&user_config).unwrap()).unwrap();
    config["scoring"]["confidence"]["accept_threshold"] = serde_json::json!(0.0);
    config["scoring"]["decision"]["coverage_threshold"] = serde_json::json!(0.0);
    config["scoring"]["decision"]["min_critical_signals"] = serde_json::json!(0);
    fs::write(&user_config, config.to_string()).unwrap();

    let json = stdout_json(
        canx()
            .env("XDG_CONFIG_HOME", home.path())
            .args(["extract", "Please contact the front desk."]),
    );
    assert_eq!(json["accepted"], true);
    assert_eq!(json["decision"]["accept"], true);

    let json = stdout_json(canx().args(["extract", "Please contact the front desk."]));
    assert_eq!(json["accepted"], false);
}
