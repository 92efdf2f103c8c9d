//! Configuration validation

use super::*;
use crate::planning::GoalRegion;
use anyhow::{Context, Result};
use std::collections::HashSet;

/// Validate complete scenario
pub fn validate_config(config: &ScenarioConfig) -> Result<()> {
    validate_race(&config.race)?;
    validate_world(&config.world)?;
    validate_obstacles(&config.obstacles)?;
    validate_solver(&config.solver)?;
    validate_problem(&config.problem, config.world.joints.len())
        .context("Invalid [problem] section")?;

    Ok(())
}

/// Validate race settings
pub fn validate_race(race: &RaceConfig) -> Result<()> {
    if race.workers == 0 {
        anyhow::bail!("workers must be at least 1");
    }

    if !race.seeds.is_empty() && race.seeds.len() != race.workers {
        anyhow::bail!(
            "seeds has {} entries but workers is {}",
            race.seeds.len(),
            race.workers
        );
    }

    Ok(())
}

/// Validate the arm description
pub fn validate_world(world: &WorldConfig) -> Result<()> {
    if world.joints.is_empty() {
        anyhow::bail!("world '{}' must have at least one joint", world.name);
    }

    if !world.base.iter().all(|v| v.is_finite()) {
        anyhow::bail!("world base must be finite");
    }

    if !world.margin.is_finite() || world.margin < 0.0 {
        anyhow::bail!("margin must be a non-negative number, got {}", world.margin);
    }

    let mut names = HashSet::new();
    for (i, joint) in world.joints.iter().enumerate() {
        if !names.insert(joint.name.as_str()) {
            anyhow::bail!("joint {} reuses name '{}'", i, joint.name);
        }
        if !joint.length.is_finite() || joint.length <= 0.0 {
            anyhow::bail!("joint '{}': length must be positive, got {}", joint.name, joint.length);
        }
        if !joint.lower.is_finite() || !joint.upper.is_finite() || joint.lower > joint.upper {
            anyhow::bail!(
                "joint '{}': invalid limits [{}, {}]",
                joint.name,
                joint.lower,
                joint.upper
            );
        }
        if !joint.contains(joint.position) {
            anyhow::bail!(
                "joint '{}': initial position {} is outside its limits",
                joint.name,
                joint.position
            );
        }
    }

    Ok(())
}

/// Validate obstacle geometry
pub fn validate_obstacles(obstacles: &[Circle]) -> Result<()> {
    for (i, c) in obstacles.iter().enumerate() {
        if !c.x.is_finite() || !c.y.is_finite() {
            anyhow::bail!("obstacle {}: center must be finite", i);
        }
        if !c.radius.is_finite() || c.radius <= 0.0 {
            anyhow::bail!("obstacle {}: radius must be positive, got {}", i, c.radius);
        }
    }
    Ok(())
}

/// Validate solver tuning
pub fn validate_solver(solver: &SolverConfig) -> Result<()> {
    if !solver.resolution.is_finite() || solver.resolution <= 0.0 {
        anyhow::bail!("solver resolution must be positive, got {}", solver.resolution);
    }
    if solver.max_attempts == 0 {
        anyhow::bail!("solver max_attempts must be at least 1");
    }
    if solver.goal_samples == 0 {
        anyhow::bail!("solver goal_samples must be at least 1");
    }
    if solver.supports.is_empty() {
        anyhow::bail!("solver must support at least one problem kind");
    }
    Ok(())
}

/// Validate the problem against the arm's degrees of freedom
pub fn validate_problem(problem: &PlanningProblem, dof: usize) -> Result<()> {
    let start = problem.start();
    if start.len() != dof {
        anyhow::bail!("start has {} values but the arm has {} joints", start.len(), dof);
    }
    if !start.iter().all(|v| v.is_finite()) {
        anyhow::bail!("start must be finite");
    }

    match problem {
        PlanningProblem::ConfigurationToConfiguration { goal, .. } => {
            if goal.len() != dof {
                anyhow::bail!("goal has {} values but the arm has {} joints", goal.len(), dof);
            }
            if !goal.iter().all(|v| v.is_finite()) {
                anyhow::bail!("goal must be finite");
            }
        }
        PlanningProblem::ConfigurationToRegion { region, .. } => validate_region(region)?,
    }

    Ok(())
}

fn validate_region(region: &GoalRegion) -> Result<()> {
    if !region.center.iter().all(|v| v.is_finite()) {
        anyhow::bail!("region center must be finite");
    }
    if !region.radius.is_finite() || region.radius <= 0.0 {
        anyhow::bail!("region radius must be positive, got {}", region.radius);
    }
    Ok(())
}
