//! Configuration module
//!
//! Handles CLI argument parsing, TOML scenario files, and validation.

pub mod cli;
pub mod toml;
pub mod validator;

use crate::coordinator::RaceOptions;
use crate::planning::{Circle, CircleObstacles, Joint, PlanningProblem, Skeleton, SolverConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Complete race scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub race: RaceConfig,
    pub world: WorldConfig,
    #[serde(default)]
    pub obstacles: Vec<Circle>,
    #[serde(default)]
    pub solver: SolverConfig,
    pub problem: PlanningProblem,
    #[serde(default)]
    pub output: OutputConfig,
}

impl ScenarioConfig {
    /// Build the arm described by `[world]`
    pub fn skeleton(&self) -> Skeleton {
        Skeleton::new(self.world.name.clone(), self.world.joints.clone())
            .with_base(self.world.base[0], self.world.base[1])
    }

    /// One collision backend per worker
    pub fn backends(&self) -> Vec<CircleObstacles> {
        let template = CircleObstacles::new(self.obstacles.clone()).with_margin(self.world.margin);
        vec![template; self.race.workers]
    }
}

/// Worker pool and coordinator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceConfig {
    /// Number of workers (one backend each)
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Explicit per-worker seeds; must match `workers` when non-empty
    #[serde(default)]
    pub seeds: Vec<u64>,
    /// Derive seeds as `base_seed + worker index` when `seeds` is empty
    pub base_seed: Option<u64>,
    /// Result polling timeout per slot in microseconds (0 = non-blocking)
    #[serde(default = "default_poll_timeout_us")]
    pub poll_timeout_us: u64,
    /// How long a new race waits for workers of an aborted race to stand
    /// down, in milliseconds (0 = do not wait)
    #[serde(default = "default_busy_wait_ms")]
    pub busy_wait_ms: u64,
    /// Per-worker timing log file
    pub timing_log: Option<PathBuf>,
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_poll_timeout_us() -> u64 {
    200
}

fn default_busy_wait_ms() -> u64 {
    100
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            seeds: Vec::new(),
            base_seed: None,
            poll_timeout_us: default_poll_timeout_us(),
            busy_wait_ms: default_busy_wait_ms(),
            timing_log: None,
        }
    }
}

impl RaceConfig {
    /// Seeds handed to the provisioner
    ///
    /// Explicit seeds win over `base_seed`; with neither, workers keep their
    /// default randomness.
    pub fn resolved_seeds(&self) -> Vec<u64> {
        if !self.seeds.is_empty() {
            return self.seeds.clone();
        }
        match self.base_seed {
            Some(base) => (0..self.workers as u64).map(|i| base.wrapping_add(i)).collect(),
            None => Vec::new(),
        }
    }

    pub fn options(&self) -> RaceOptions {
        RaceOptions {
            poll_timeout: Duration::from_micros(self.poll_timeout_us),
            busy_wait: Duration::from_millis(self.busy_wait_ms),
            timing_log: self.timing_log.clone(),
        }
    }
}

/// Arm description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    #[serde(default = "default_world_name")]
    pub name: String,
    #[serde(default)]
    pub base: [f64; 2],
    /// Clearance required around every obstacle
    #[serde(default)]
    pub margin: f64,
    pub joints: Vec<Joint>,
}

fn default_world_name() -> String {
    "arm".to_string()
}

/// Result reporting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Print the outcome as JSON instead of text
    #[serde(default)]
    pub json: bool,
    /// Also write the JSON outcome to this file
    pub json_output: Option<PathBuf>,
}
