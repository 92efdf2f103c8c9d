//! TOML scenario file parsing

use super::*;
use crate::config::cli::Cli;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML scenario file
pub fn parse_toml_file(path: &Path) -> Result<ScenarioConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML scenario from string
pub fn parse_toml_string(contents: &str) -> Result<ScenarioConfig> {
    let config: ScenarioConfig = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
pub fn merge_cli_with_config(cli: &Cli, mut config: ScenarioConfig) -> ScenarioConfig {
    if let Some(workers) = cli.workers {
        config.race.workers = workers;
        // Explicit seeds sized for another pool no longer apply
        if config.race.seeds.len() != workers {
            config.race.seeds.clear();
        }
    }
    if let Some(seed) = cli.seed {
        config.race.seeds.clear();
        config.race.base_seed = Some(seed);
    }
    if let Some(poll) = cli.poll_timeout_us {
        config.race.poll_timeout_us = poll;
    }
    if let Some(path) = &cli.timing_log {
        config.race.timing_log = Some(path.clone());
    }
    if cli.json {
        config.output.json = true;
    }
    if let Some(path) = &cli.json_output {
        config.output.json_output = Some(path.clone());
    }

    config
}
