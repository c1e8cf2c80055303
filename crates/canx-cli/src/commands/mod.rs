//! Subcommand implementations and the helpers they share.

pub mod batch;
pub mod config;
pub mod extract;
pub mod rules;

use std::path::{Path, PathBuf};

use tracing::debug;

use canx_core::models::config::CanxConfig;
use canx_core::{Gate, RulePolicyParser, RuleSet};

/// Which gate decides acceptance in command output.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum GateArg {
    /// Confidence threshold
    #[default]
    Confidence,
    /// Filtered coverage and critical signals
    Decision,
}

impl From<GateArg> for Gate {
    fn from(gate: GateArg) -> Self {
        match gate {
            GateArg::Confidence => Gate::Confidence,
            GateArg::Decision => Gate::Decision,
        }
    }
}

/// Per-user config file written by `canx config init`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("canx")
        .join("config.json")
}

/// Load the config file given on the command line, else the per-user file
/// when it exists, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<CanxConfig> {
    if let Some(path) = config_path {
        return Ok(CanxConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config file {}", default_path.display());
        return Ok(CanxConfig::from_file(&default_path)?);
    }

    Ok(CanxConfig::default())
}

/// Build a parser from the config, with `rules_override` taking precedence
/// over `rules.path`.
pub fn build_parser(
    config: &CanxConfig,
    rules_override: Option<&PathBuf>,
) -> anyhow::Result<RulePolicyParser> {
    let rules_path = rules_override.or(config.rules.path.as_ref());
    match rules_path {
        Some(path) => debug!("Loading rules from {}", path.display()),
        None => debug!("Using embedded rules"),
    }

    let rules = RuleSet::load(rules_path.map(PathBuf::as_path))?;
    Ok(RulePolicyParser::new(rules).with_scoring(config.scoring.clone()))
}
