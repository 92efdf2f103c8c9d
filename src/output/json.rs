//! JSON output formatting
//!
//! One report per race: outcome, winning worker, elapsed time and, on
//! success, the trajectory that won.

use crate::coordinator::RaceOutcome;
use crate::planning::{PlanningProblem, ProblemKind, Trajectory};
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use std::time::Duration;

/// Duration with both microseconds and human-readable format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonDuration {
    pub micros: u64,
    pub human: String,
}

impl JsonDuration {
    pub fn from_duration(d: Duration) -> Self {
        let micros = d.as_micros() as u64;
        let human = format_duration_human(d);
        Self { micros, human }
    }
}

/// Winning trajectory
#[derive(Debug, Clone, Serialize)]
pub struct JsonTrajectory {
    pub waypoints: Vec<Vec<f64>>,
    pub path_length: f64,
}

/// Complete race report
#[derive(Debug, Clone, Serialize)]
pub struct JsonRaceReport {
    pub timestamp: String,
    pub outcome: &'static str,
    pub problem: ProblemKind,
    pub workers: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<usize>,
    pub elapsed: JsonDuration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trajectory: Option<JsonTrajectory>,
}

/// Build the report for a finished race
pub fn build_race_report(
    outcome: &RaceOutcome<Trajectory>,
    problem: &PlanningProblem,
    workers: usize,
    elapsed: Duration,
) -> JsonRaceReport {
    let (winner, trajectory) = match outcome {
        RaceOutcome::Succeeded { worker, artifact } => (
            Some(*worker),
            Some(JsonTrajectory {
                waypoints: artifact.waypoints.clone(),
                path_length: artifact.path_length(),
            }),
        ),
        _ => (None, None),
    };

    JsonRaceReport {
        timestamp: chrono::Utc::now().to_rfc3339(),
        outcome: outcome.label(),
        problem: problem.kind(),
        workers,
        winner,
        elapsed: JsonDuration::from_duration(elapsed),
        trajectory,
    }
}

/// Serialize a report to a string
pub fn to_json_string(report: &JsonRaceReport, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    Ok(text)
}

/// Write JSON output to file
pub fn write_json_output(output_path: &Path, report: &JsonRaceReport, pretty: bool) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create JSON output: {}", output_path.display()))?;

    if pretty {
        serde_json::to_writer_pretty(file, report)?;
    } else {
        serde_json::to_writer(file, report)?;
    }

    Ok(())
}

/// Format duration in human-readable format
fn format_duration_human(d: Duration) -> String {
    let micros = d.as_micros() as u64;

    if micros == 0 {
        return "0µs".to_string();
    }

    if micros < 1000 {
        format!("{}µs", micros)
    } else if micros < 1_000_000 {
        format!("{:.3}ms", micros as f64 / 1000.0)
    } else if micros < 60_000_000 {
        format!("{:.3}s", micros as f64 / 1_000_000.0)
    } else {
        format!("{:.2}m", micros as f64 / 60_000_000.0)
    }
}
