//! CLI argument parsing using clap

use clap::Parser;
use std::path::PathBuf;

/// planrace - race independent motion planners, keep the first plan found
#[derive(Parser, Debug)]
#[command(name = "planrace")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Scenario file (TOML)
    #[arg(short = 'c', long, value_name = "FILE", env = "PLANRACE_CONFIG")]
    pub config: PathBuf,

    /// Number of workers (overrides [race].workers)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Base seed; worker i gets seed + i (overrides [race] seeds)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Result polling timeout per slot in microseconds (0 = non-blocking)
    #[arg(long)]
    pub poll_timeout_us: Option<u64>,

    /// Append per-worker timings to this file
    #[arg(long, value_name = "FILE")]
    pub timing_log: Option<PathBuf>,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,

    /// Also write the JSON outcome to this file
    #[arg(long, value_name = "FILE")]
    pub json_output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Validate the scenario and provision workers without racing
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate CLI arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.workers == Some(0) {
            anyhow::bail!("workers must be at least 1");
        }
        Ok(())
    }
}
