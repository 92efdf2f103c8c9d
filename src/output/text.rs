//! Human-readable text output

use crate::config::ScenarioConfig;
use crate::coordinator::RaceOutcome;
use crate::planning::Trajectory;
use std::time::Duration;

/// Print race results to console
pub fn print_results(outcome: &RaceOutcome<Trajectory>, elapsed: Duration, config: &ScenarioConfig) {
    println!("═══════════════════════════════════════════════════════════");
    println!("                    RACE RESULTS");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    println!("Elapsed Time: {:.3}s", elapsed.as_secs_f64());
    println!("Workers:      {}", config.race.workers);
    println!("Problem:      {}", config.problem.kind());
    println!("Outcome:      {}", outcome_summary(outcome));

    if let RaceOutcome::Succeeded { artifact, .. } = outcome {
        println!();
        println!("Trajectory:");
        println!("  Waypoints:   {}", artifact.len());
        println!("  Path length: {:.4} rad", artifact.path_length());
        for (i, q) in artifact.waypoints.iter().enumerate() {
            println!("  [{}] {}", i, format_configuration(q));
        }
    }

    println!();
}

/// Print the provisioning summary for `--dry-run`
pub fn print_dry_run(config: &ScenarioConfig, provisioned: usize) {
    println!("Scenario OK");
    println!("  World:     {} ({} joints)", config.world.name, config.world.joints.len());
    println!("  Obstacles: {}", config.obstacles.len());
    println!("  Workers:   {} of {} provisioned", provisioned, config.race.workers);
    println!("  Problem:   {}", config.problem.kind());
}

/// One line description of an outcome
pub fn outcome_summary<A>(outcome: &RaceOutcome<A>) -> String {
    match outcome {
        RaceOutcome::Succeeded { worker, .. } => format!("solved by worker {}", worker),
        RaceOutcome::AllFailed => "every worker failed".to_string(),
        RaceOutcome::NoneEligible => "no worker accepts this problem".to_string(),
        RaceOutcome::Aborted => "aborted".to_string(),
    }
}

fn format_configuration(q: &[f64]) -> String {
    let values: Vec<String> = q.iter().map(|v| format!("{:+.4}", v)).collect();
    format!("({})", values.join(", "))
}
