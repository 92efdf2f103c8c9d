//! planrace CLI entry point

use anyhow::{Context, Result};
use planrace::config::cli::Cli;
use planrace::config::{toml, validator, ScenarioConfig};
use planrace::coordinator::RaceCoordinator;
use planrace::output::{json, text};
use planrace::planning::RandomizedSolver;
use std::time::Instant;
use tracing::{debug, info};

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    cli.validate()?;

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;
    debug!(race = ?config.race, "configuration loaded");

    let template = RandomizedSolver::new(config.solver.clone());
    let coordinator = RaceCoordinator::new(
        &template,
        &config.skeleton(),
        config.backends(),
        &config.race.resolved_seeds(),
        config.race.options(),
    )
    .context("Failed to provision workers")?;
    info!(workers = coordinator.len(), "workers provisioned");
    debug!(
        workers = ?coordinator.worker_ids(),
        poll_timeout_us = coordinator.options().poll_timeout.as_micros() as u64,
        busy_wait_ms = coordinator.options().busy_wait.as_millis() as u64,
        "coordinator ready"
    );

    if cli.dry_run {
        text::print_dry_run(&config, coordinator.len());
        return Ok(());
    }

    let start = Instant::now();
    let outcome = coordinator.race(&config.problem)?;
    let elapsed = start.elapsed();

    if config.output.json || config.output.json_output.is_some() {
        let report = json::build_race_report(&outcome, &config.problem, coordinator.len(), elapsed);
        if let Some(path) = &config.output.json_output {
            json::write_json_output(path, &report, true)?;
            info!(path = %path.display(), "JSON report written");
        }
        if config.output.json {
            println!("{}", json::to_json_string(&report, true)?);
        }
    }
    if !config.output.json {
        text::print_results(&outcome, elapsed, &config);
    }

    if outcome.is_success() {
        Ok(())
    } else {
        anyhow::bail!("race ended without a plan: {}", text::outcome_summary(&outcome))
    }
}

/// Load the scenario file, apply CLI overrides and validate the result
fn load_config(cli: &Cli) -> Result<ScenarioConfig> {
    let config = toml::parse_toml_file(&cli.config)?;
    let config = toml::merge_cli_with_config(cli, config);
    validator::validate_config(&config)?;
    Ok(config)
}
