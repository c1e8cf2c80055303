//! Batch command - extract policies from a JSON array of records.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

use canx_core::{render_policy, ExtractionResult, Gate, PolicyParser, RenderedPolicy, RulePolicyParser};

use super::{build_parser, load_config, GateArg};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// JSON file holding an array of records
    #[arg(required = true)]
    input: PathBuf,

    /// Output JSON file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write a summary CSV to this path
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Record field holding the policy text
    #[arg(long, default_value = "cancellationText")]
    text_field: String,

    /// Include English and Chinese summaries
    #[arg(long)]
    render: bool,

    /// Rule file overriding the configured rules
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Gate used to report acceptance
    #[arg(long, value_enum, default_value = "confidence")]
    gate: GateArg,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Outcome for one input record.
#[derive(Serialize)]
struct BatchEntry {
    index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<ExtractionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    accepted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rendered: Option<RenderedPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let parser = build_parser(&config, args.rules.as_ref())?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let content = fs::read_to_string(&args.input)?;
    let records: Vec<Value> = match serde_json::from_str(&content)? {
        Value::Array(items) => items,
        _ => anyhow::bail!("Expected a JSON array in {}", args.input.display()),
    };

    eprintln!(
        "{} Found {} records to process",
        style("ℹ").blue(),
        records.len()
    );

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} records")?
            .progress_chars("=>-"),
    );

    let gate = Gate::from(args.gate);
    let mut entries = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        match process_record(record, &args.text_field, &parser) {
            Ok(result) => {
                let accepted = result.is_accepted(gate);
                let rendered = args.render.then(|| render_policy(&result.structured));
                entries.push(BatchEntry {
                    index,
                    result: Some(result),
                    accepted: Some(accepted),
                    rendered,
                    error: None,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process record {}: {}", index, error_msg);
                    entries.push(BatchEntry {
                        index,
                        result: None,
                        accepted: None,
                        rendered: None,
                        error: Some(error_msg),
                    });
                } else {
                    pb.abandon();
                    error!("Failed to process record {}: {}", index, error_msg);
                    anyhow::bail!("Processing failed at record {}: {}", index, error_msg);
                }
            }
        }

        pb.inc(1);
    }

    pb.finish_and_clear();

    let json = serde_json::to_string_pretty(&entries)?;
    match &args.output {
        Some(path) => fs::write(path, json)?,
        None => println!("{}", json),
    }

    if let Some(summary_path) = &args.summary {
        write_summary(summary_path, &entries)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed = entries.iter().filter(|e| e.error.is_some()).count();
    let accepted = entries.iter().filter(|e| e.accepted == Some(true)).count();

    eprintln!();
    eprintln!(
        "{} Processed {} records in {:?}",
        style("✓").green(),
        entries.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} accepted, {} need fallback, {} failed",
        style(accepted).green(),
        style(entries.len() - accepted - failed).yellow(),
        style(failed).red()
    );

    Ok(())
}

fn process_record(
    record: &Value,
    text_field: &str,
    parser: &RulePolicyParser,
) -> anyhow::Result<ExtractionResult> {
    let text = record
        .get(text_field)
        .ok_or_else(|| anyhow::anyhow!("missing field '{}'", text_field))?
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("field '{}' is not a string", text_field))?;

    Ok(parser.parse(text))
}

fn write_summary(path: &Path, entries: &[BatchEntry]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "index",
        "status",
        "fields",
        "matches",
        "confidence",
        "coverage",
        "critical_signals",
        "accepted",
        "error",
    ])?;

    for entry in entries {
        let index = entry.index.to_string();

        match &entry.result {
            Some(result) => {
                wtr.write_record([
                    index.as_str(),
                    "success",
                    &result.structured.len().to_string(),
                    &result.meta.matches.to_string(),
                    &format!("{:.2}", result.confidence.confidence),
                    &format!("{:.2}", result.decision.coverage),
                    &result.decision.critical_signals.to_string(),
                    &entry.accepted.unwrap_or(false).to_string(),
                    "",
                ])?;
            }
            None => {
                wtr.write_record([
                    index.as_str(),
                    "error",
                    "",
                    "",
                    "",
                    "",
                    "",
                    "",
                    entry.error.as_deref().unwrap_or(""),
                ])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
