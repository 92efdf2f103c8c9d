//! Per-worker timing log
//!
//! Optional diagnostic side channel. Each finished worker appends one line:
//!
//! ```text
//! 2th solver: 0.412
//! 0th solver [fail]: 1.003
//! ```
//!
//! Write errors are logged and otherwise ignored; the log never affects the
//! outcome of a race.

use crate::worker::{RaceResult, WorkerRun};
use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Append-only timing log shared by every worker thread
#[derive(Debug)]
pub struct TimingLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl TimingLog {
    /// Open (or create) the log at `path` and write a race header
    pub fn open(path: &Path, workers: usize) -> Result<Self> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open timing log: {}", path.display()))?;

        writeln!(
            file,
            "# {} solvers, started {}",
            workers,
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )
        .with_context(|| format!("Failed to write timing log: {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    /// Default file name for a pool of `workers` solvers
    pub fn default_file_name(workers: usize) -> String {
        format!("{}_solvers.txt", workers)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line for a finished worker
    pub fn record<A>(&self, run: &WorkerRun<A>) {
        let line = format_line(run);
        let mut file = match self.file.lock() {
            Ok(file) => file,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(file, "{}", line) {
            warn!(path = %self.path.display(), error = %e, "failed to append timing log");
        }
    }
}

fn format_line<A>(run: &WorkerRun<A>) -> String {
    let secs = run.elapsed.as_secs_f64();
    match run.result {
        RaceResult::Success(_) => format!("{}th solver: {:.3}", run.worker, secs),
        RaceResult::Failure(_) => format!("{}th solver [fail]: {:.3}", run.worker, secs),
    }
}
