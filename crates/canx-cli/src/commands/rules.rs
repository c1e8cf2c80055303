//! Rules command - inspect and validate rule files.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use canx_core::RuleSet;

use super::load_config;

/// Arguments for the rules command.
#[derive(Args)]
pub struct RulesArgs {
    #[command(subcommand)]
    command: RulesCommand,
}

#[derive(Subcommand)]
enum RulesCommand {
    /// List rules in priority order
    List {
        /// Rule file (default: configured or embedded rules)
        path: Option<PathBuf>,
    },

    /// Compile a rule file and report problems
    Check {
        /// Rule file (default: configured or embedded rules)
        path: Option<PathBuf>,
    },
}

pub async fn run(args: RulesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    match args.command {
        RulesCommand::List { path } => list_rules(path.or(config.rules.path)),
        RulesCommand::Check { path } => check_rules(path.or(config.rules.path)),
    }
}

fn list_rules(path: Option<PathBuf>) -> anyhow::Result<()> {
    let rules = RuleSet::load(path.as_deref())?;

    println!(
        "{} ({} rules, version {})",
        style("Rules").bold(),
        rules.len(),
        rules.version()
    );
    println!();

    for rule in rules.iter() {
        let status = if rule.is_enabled() {
            style("enabled").green()
        } else {
            style("disabled").yellow()
        };

        println!("{:>5}  {:<24} {}", rule.priority(), rule.id(), status);
        println!("       {}", style(rule.pattern()).dim());
        for field in rule.fields().unwrap_or_default() {
            println!("       {} <- {}", field.path, field.expr);
        }
    }

    Ok(())
}

fn check_rules(path: Option<PathBuf>) -> anyhow::Result<()> {
    let source = path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "embedded rules".to_string());

    let rules = RuleSet::load(path.as_deref())
        .map_err(|e| anyhow::anyhow!("{}: {}", source, e))?;

    let disabled: Vec<&str> = rules
        .iter()
        .filter(|r| !r.is_enabled())
        .map(|r| r.id())
        .collect();

    println!(
        "{} {}: {} rules compiled (version {})",
        style("✓").green(),
        source,
        rules.len(),
        rules.version()
    );

    if !disabled.is_empty() {
        println!(
            "{} {} rule(s) disabled by a missing or malformed map: {}",
            style("⚠").yellow(),
            disabled.len(),
            disabled.join(", ")
        );
    }

    Ok(())
}
