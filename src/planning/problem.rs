//! Planning problems
//!
//! Problems are a closed set. Solvers advertise which kinds they handle and
//! the coordinator asks each worker before launching it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Disc the end effector must end up in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalRegion {
    pub center: [f64; 2],
    pub radius: f64,
}

impl GoalRegion {
    pub fn new(x: f64, y: f64, radius: f64) -> Self {
        Self {
            center: [x, y],
            radius,
        }
    }

    pub fn contains(&self, point: [f64; 2]) -> bool {
        let dx = point[0] - self.center[0];
        let dy = point[1] - self.center[1];
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

/// Kind tag used for eligibility checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemKind {
    ConfigurationToConfiguration,
    ConfigurationToRegion,
}

impl ProblemKind {
    pub const ALL: [ProblemKind; 2] = [
        ProblemKind::ConfigurationToConfiguration,
        ProblemKind::ConfigurationToRegion,
    ];
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProblemKind::ConfigurationToConfiguration => write!(f, "configuration_to_configuration"),
            ProblemKind::ConfigurationToRegion => write!(f, "configuration_to_region"),
        }
    }
}

/// Motion planning query over joint space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanningProblem {
    /// Reach a goal configuration
    ConfigurationToConfiguration { start: Vec<f64>, goal: Vec<f64> },
    /// Reach any configuration whose end effector lies in `region`
    ConfigurationToRegion { start: Vec<f64>, region: GoalRegion },
}

impl PlanningProblem {
    pub fn kind(&self) -> ProblemKind {
        match self {
            PlanningProblem::ConfigurationToConfiguration { .. } => {
                ProblemKind::ConfigurationToConfiguration
            }
            PlanningProblem::ConfigurationToRegion { .. } => ProblemKind::ConfigurationToRegion,
        }
    }

    pub fn start(&self) -> &[f64] {
        match self {
            PlanningProblem::ConfigurationToConfiguration { start, .. } => start,
            PlanningProblem::ConfigurationToRegion { start, .. } => start,
        }
    }

    /// Dimensionality implied by the start configuration
    pub fn dof(&self) -> usize {
        self.start().len()
    }
}
