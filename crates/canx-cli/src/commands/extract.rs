//! Extract command - parse a single policy text.

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use console::style;
use serde::Serialize;
use tracing::info;

use canx_core::{render_policy, ExtractionResult, Gate, PolicyParser, RenderedPolicy};

use super::{build_parser, load_config, GateArg};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Policy text (reads --file or stdin when omitted)
    text: Option<String>,

    /// Read the policy text from a file
    #[arg(short, long, conflicts_with = "text")]
    file: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Include English and Chinese summaries
    #[arg(long)]
    render: bool,

    /// Rule file overriding the configured rules
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Gate used to report acceptance
    #[arg(long, value_enum, default_value = "confidence")]
    gate: GateArg,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

#[derive(Serialize)]
struct ExtractOutput<'a> {
    #[serde(flatten)]
    result: &'a ExtractionResult,
    accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    rendered: Option<RenderedPolicy>,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let parser = build_parser(&config, args.rules.as_ref())?;

    let text = read_input(&args)?;
    let result = parser.parse(&text);
    let gate = Gate::from(args.gate);
    let accepted = result.is_accepted(gate);

    info!(
        "Extracted {} fields in {}ms",
        result.structured.len(),
        result.meta.processing_time_ms
    );

    let rendered = args.render.then(|| render_policy(&result.structured));

    let content = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&ExtractOutput {
            result: &result,
            accepted,
            rendered,
        })?,
        OutputFormat::Text => format_text(&result, accepted, rendered.as_ref()),
    };

    match &args.output {
        Some(path) => {
            fs::write(path, content)?;
            println!(
                "{} Wrote result to {}",
                style("✓").green(),
                path.display()
            );
        }
        None => println!("{}", content),
    }

    Ok(())
}

fn read_input(args: &ExtractArgs) -> anyhow::Result<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }

    if let Some(path) = &args.file {
        if !path.exists() {
            anyhow::bail!("Input file not found: {}", path.display());
        }
        return Ok(fs::read_to_string(path)?);
    }

    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn format_text(result: &ExtractionResult, accepted: bool, rendered: Option<&RenderedPolicy>) -> String {
    let mut output = String::new();

    output.push_str(&format!("Normalized: {}\n", result.normalized));
    output.push('\n');

    output.push_str("Fields:\n");
    if result.structured.is_empty() {
        output.push_str("  (none)\n");
    }
    for (path, value) in result.structured.iter() {
        output.push_str(&format!("  {} = {}\n", path, value));
    }
    output.push('\n');

    output.push_str("Matches:\n");
    for hit in &result.hits {
        output.push_str(&format!(
            "  {} [{}..{}]\n",
            hit.rule_id, hit.span.start(), hit.span.end()
        ));
    }
    output.push('\n');

    output.push_str(&format!(
        "Confidence: {:.2} (coverage {:.2}, field score {:.2}, penalties {:.2})\n",
        result.confidence.confidence,
        result.confidence.coverage,
        result.confidence.field_score,
        result.confidence.penalties
    ));
    output.push_str(&format!(
        "Decision:   coverage {:.2}, {} critical signal(s)\n",
        result.decision.coverage, result.decision.critical_signals
    ));
    output.push_str(&format!(
        "Accepted:   {}\n",
        if accepted { "yes" } else { "no (fallback)" }
    ));

    if let Some(rendered) = rendered {
        output.push('\n');
        output.push_str(&format!("EN: {}\n", rendered.en));
        output.push_str(&format!("CN: {}\n", rendered.cn));
    }

    output
}
