//! Randomized via-point planner
//!
//! Tries the straight joint space segment first, then samples random via
//! points and accepts the first start-via-goal path whose segments are valid at
//! the configured resolution. Region goals are found by rejection sampling
//! configurations until the end effector lands in the region.
//!
//! Each worker gets its own RNG stream: seeded when the pool is provisioned
//! with seeds, from entropy otherwise.

use super::collision::CircleObstacles;
use super::problem::{GoalRegion, PlanningProblem, ProblemKind};
use super::skeleton::Skeleton;
use super::trajectory::{distance, Trajectory};
use crate::solver::{SolveContext, SolveFailure, Solver};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use tracing::warn;

type Context<'a> = SolveContext<'a, Skeleton, CircleObstacles>;

/// Tuning for `RandomizedSolver`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Via points sampled per connection attempt
    pub max_attempts: usize,
    /// Maximum joint space step between collision checks along a segment
    pub resolution: f64,
    /// Goal configurations sampled for region problems
    pub goal_samples: usize,
    /// Problem kinds this solver accepts
    pub supports: Vec<ProblemKind>,
}

/// Default joint space step between collision checks
pub const DEFAULT_RESOLUTION: f64 = 0.05;

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_attempts: 500,
            resolution: DEFAULT_RESOLUTION,
            goal_samples: 2000,
            supports: ProblemKind::ALL.to_vec(),
        }
    }
}

/// Planner used by every worker in the planning domain
#[derive(Debug, Clone)]
pub struct RandomizedSolver {
    config: SolverConfig,
    rng: Xoshiro256PlusPlus,
    limits: Vec<(f64, f64)>,
}

impl RandomizedSolver {
    /// Build a solver from `config`
    ///
    /// A non-finite or non-positive `resolution` would never finish a segment
    /// check and is replaced by `DEFAULT_RESOLUTION`.
    pub fn new(mut config: SolverConfig) -> Self {
        if !config.resolution.is_finite() || config.resolution <= 0.0 {
            warn!(
                resolution = config.resolution,
                fallback = DEFAULT_RESOLUTION,
                "invalid solver resolution"
            );
            config.resolution = DEFAULT_RESOLUTION;
        }
        Self {
            config,
            rng: Xoshiro256PlusPlus::from_entropy(),
            limits: Vec::new(),
        }
    }

    /// Fix the RNG stream
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        self
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Joint limits captured from the world this instance was cloned for
    pub fn limits(&self) -> &[(f64, f64)] {
        &self.limits
    }

    fn sample(&mut self) -> Vec<f64> {
        let rng = &mut self.rng;
        self.limits
            .iter()
            .map(|&(lo, hi)| if lo < hi { rng.gen_range(lo..=hi) } else { lo })
            .collect()
    }

    fn state_valid(ctx: &mut Context<'_>, q: &[f64]) -> bool {
        ctx.check_with(|world| world.set_positions(q))
    }

    /// Check every interpolated state between `a` and `b`, endpoints included
    ///
    /// A stop request makes the segment invalid.
    fn segment_valid(&self, ctx: &mut Context<'_>, a: &[f64], b: &[f64]) -> bool {
        let span = a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f64::max);
        let steps = ((span / self.config.resolution).ceil() as usize).max(1);
        let mut q = vec![0.0; a.len()];
        for i in 0..=steps {
            if ctx.should_stop() {
                return false;
            }
            let t = i as f64 / steps as f64;
            for (k, v) in q.iter_mut().enumerate() {
                *v = a[k] + (b[k] - a[k]) * t;
            }
            if !Self::state_valid(ctx, &q) {
                return false;
            }
        }
        true
    }

    fn connect(
        &mut self,
        ctx: &mut Context<'_>,
        start: &[f64],
        goal: &[f64],
    ) -> Result<Trajectory, SolveFailure> {
        if self.segment_valid(ctx, start, goal) {
            return Ok(Trajectory::new(vec![start.to_vec(), goal.to_vec()]));
        }
        if ctx.should_stop() {
            return Err(SolveFailure::Cancelled);
        }

        for _ in 0..self.config.max_attempts {
            if ctx.should_stop() {
                return Err(SolveFailure::Cancelled);
            }
            let via = self.sample();
            if !Self::state_valid(ctx, &via) {
                continue;
            }
            if self.segment_valid(ctx, start, &via) && self.segment_valid(ctx, &via, goal) {
                return Ok(Trajectory::new(vec![start.to_vec(), via, goal.to_vec()]));
            }
        }
        if ctx.should_stop() {
            return Err(SolveFailure::Cancelled);
        }
        Err(SolveFailure::Exhausted)
    }

    fn reach_region(
        &mut self,
        ctx: &mut Context<'_>,
        start: &[f64],
        region: &GoalRegion,
    ) -> Result<Trajectory, SolveFailure> {
        let mut goals_found = 0usize;
        for _ in 0..self.config.goal_samples {
            if ctx.should_stop() {
                return Err(SolveFailure::Cancelled);
            }
            let q = self.sample();
            if !Self::state_valid(ctx, &q) || !region.contains(ctx.world().end_effector()) {
                continue;
            }
            goals_found += 1;
            match self.connect(ctx, start, &q) {
                Ok(trajectory) => return Ok(trajectory),
                Err(SolveFailure::Exhausted) => continue,
                Err(other) => return Err(other),
            }
        }
        if goals_found == 0 {
            Err(SolveFailure::InvalidGoal)
        } else {
            Err(SolveFailure::Exhausted)
        }
    }
}

impl Default for RandomizedSolver {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

impl Solver for RandomizedSolver {
    type Problem = PlanningProblem;
    type World = Skeleton;
    type Backend = CircleObstacles;
    type Artifact = Trajectory;

    fn name(&self) -> &str {
        "randomized"
    }

    fn can_solve(&self, problem: &PlanningProblem) -> bool {
        if !self.config.supports.contains(&problem.kind()) {
            return false;
        }
        if problem.dof() != self.limits.len() {
            return false;
        }
        match problem {
            PlanningProblem::ConfigurationToConfiguration { goal, .. } => {
                goal.len() == self.limits.len()
            }
            PlanningProblem::ConfigurationToRegion { .. } => true,
        }
    }

    fn solve(
        &mut self,
        problem: &PlanningProblem,
        ctx: &mut Context<'_>,
    ) -> Result<Trajectory, SolveFailure> {
        let start = problem.start();
        if start.len() != ctx.world().dof() || !Self::state_valid(ctx, start) {
            return Err(SolveFailure::InvalidStart);
        }

        match problem {
            PlanningProblem::ConfigurationToConfiguration { goal, .. } => {
                if goal.len() != start.len() || !Self::state_valid(ctx, goal) {
                    return Err(SolveFailure::InvalidGoal);
                }
                if distance(start, goal) == 0.0 {
                    return Ok(Trajectory::new(vec![start.to_vec()]));
                }
                self.connect(ctx, start, goal)
            }
            PlanningProblem::ConfigurationToRegion { region, .. } => {
                if region.contains(ctx.world().end_effector()) {
                    return Ok(Trajectory::new(vec![start.to_vec()]));
                }
                self.reach_region(ctx, start, region)
            }
        }
    }

    fn clone_for_resource(&self, world: &Skeleton, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };
        Self {
            config: self.config.clone(),
            rng,
            limits: world.limits(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::cancel::StopToken;
    use crate::planning::collision::Circle;
    use crate::world::{ValidityBackend, World};
    use std::f64::consts::PI;

    struct Fixture {
        solver: RandomizedSolver,
        world: Skeleton,
        backend: CircleObstacles,
        stop: StopToken,
    }

    impl Fixture {
        fn new(obstacles: Vec<Circle>) -> Self {
            let arm = Skeleton::planar_arm("arm", &[1.0, 1.0]);
            let mut backend = CircleObstacles::new(obstacles);
            backend.install(&arm).unwrap();
            let solver = RandomizedSolver::default().clone_for_resource(&arm, Some(11));
            Self {
                solver,
                world: arm,
                backend,
                stop: StopToken::new(),
            }
        }

        fn solve(&mut self, problem: &PlanningProblem) -> Result<Trajectory, SolveFailure> {
            let mut scratch = self.world.try_clone().unwrap();
            let mut ctx = SolveContext::new(&mut scratch, &mut self.backend, &self.stop);
            self.solver.solve(problem, &mut ctx)
        }
    }

    fn to_config(start: Vec<f64>, goal: Vec<f64>) -> PlanningProblem {
        PlanningProblem::ConfigurationToConfiguration { start, goal }
    }

    #[test]
    fn test_free_space_direct_connection() {
        let mut f = Fixture::new(vec![]);
        let t = f.solve(&to_config(vec![0.0, 0.0], vec![1.0, -0.5])).unwrap();
        assert_eq!(t.waypoints, vec![vec![0.0, 0.0], vec![1.0, -0.5]]);
    }

    #[test]
    fn test_start_equals_goal() {
        let mut f = Fixture::new(vec![]);
        let t = f.solve(&to_config(vec![0.3, 0.3], vec![0.3, 0.3])).unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t.path_length(), 0.0);
    }

    #[test]
    fn test_invalid_start_and_goal() {
        // Straight arm along +x runs through this obstacle
        let mut f = Fixture::new(vec![Circle::new(1.5, 0.0, 0.2)]);
        assert_eq!(
            f.solve(&to_config(vec![0.0, 0.0], vec![PI / 2.0, 0.0])),
            Err(SolveFailure::InvalidStart)
        );
        assert_eq!(
            f.solve(&to_config(vec![PI / 2.0, 0.0], vec![0.0, 0.0])),
            Err(SolveFailure::InvalidGoal)
        );
    }

    #[test]
    fn test_routes_around_obstacle() {
        let mut f = Fixture::new(vec![Circle::new(1.5, 0.0, 0.2)]);
        let start = vec![1.0, 0.0];
        let goal = vec![-1.0, 0.0];
        let t = f.solve(&to_config(start.clone(), goal.clone())).unwrap();

        assert_eq!(t.len(), 3);
        assert_eq!(t.start(), Some(&start[..]));
        assert_eq!(t.end(), Some(&goal[..]));

        // The via point itself must be a valid configuration
        let mut checker = CircleObstacles::new(vec![Circle::new(1.5, 0.0, 0.2)]);
        let mut arm = Skeleton::planar_arm("arm", &[1.0, 1.0]);
        for q in &t.waypoints {
            arm.set_positions(q);
            assert!(checker.is_valid(&arm), "collision at {:?}", q);
        }
    }

    #[test]
    fn test_reaches_goal_region() {
        let mut f = Fixture::new(vec![]);
        let region = GoalRegion::new(0.0, 1.5, 0.5);
        let problem = PlanningProblem::ConfigurationToRegion {
            start: vec![0.0, 0.0],
            region,
        };
        let t = f.solve(&problem).unwrap();

        let mut arm = Skeleton::planar_arm("arm", &[1.0, 1.0]);
        arm.set_positions(t.end().unwrap());
        assert!(region.contains(arm.end_effector()));
    }

    #[test]
    fn test_unreachable_region_is_invalid_goal() {
        let mut f = Fixture::new(vec![]);
        f.solver.config.goal_samples = 50;
        let problem = PlanningProblem::ConfigurationToRegion {
            start: vec![0.0, 0.0],
            region: GoalRegion::new(10.0, 10.0, 0.5),
        };
        assert_eq!(f.solve(&problem), Err(SolveFailure::InvalidGoal));
    }

    #[test]
    fn test_stop_requested_cancels_search() {
        let mut f = Fixture::new(vec![Circle::new(1.5, 0.0, 0.2)]);
        f.stop.request_stop();
        assert_eq!(
            f.solve(&to_config(vec![1.0, 0.0], vec![-1.0, 0.0])),
            Err(SolveFailure::Cancelled)
        );
    }

    #[test]
    fn test_stop_cancels_direct_segment() {
        // Free space: only the straight segment check runs before returning
        let mut f = Fixture::new(vec![]);
        f.stop.request_stop();
        assert_eq!(
            f.solve(&to_config(vec![0.0, 0.0], vec![1.0, -0.5])),
            Err(SolveFailure::Cancelled)
        );
    }

    #[test]
    fn test_stop_interrupts_fine_segment_check() {
        let mut f = Fixture::new(vec![]);
        f.solver.config.resolution = 1e-12;
        let stop = f.stop.clone();
        let stopper = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            stop.request_stop();
        });

        let result = f.solve(&to_config(vec![0.0, 0.0], vec![1.0, -0.5]));
        stopper.join().unwrap();
        assert_eq!(result, Err(SolveFailure::Cancelled));
    }

    #[test]
    fn test_invalid_resolution_falls_back_to_default() {
        for resolution in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            let solver = RandomizedSolver::new(SolverConfig {
                resolution,
                ..SolverConfig::default()
            });
            assert_eq!(solver.config().resolution, DEFAULT_RESOLUTION);
        }

        let arm = Skeleton::planar_arm("arm", &[1.0, 1.0]);
        let fine = RandomizedSolver::new(SolverConfig {
            resolution: 0.01,
            ..SolverConfig::default()
        });
        assert_eq!(fine.clone_for_resource(&arm, None).config().resolution, 0.01);
    }

    #[test]
    fn test_can_solve_checks_kind_and_dof() {
        let arm = Skeleton::planar_arm("arm", &[1.0, 1.0]);
        let solver = RandomizedSolver::default().clone_for_resource(&arm, None);
        assert!(solver.can_solve(&to_config(vec![0.0, 0.0], vec![1.0, 1.0])));
        assert!(!solver.can_solve(&to_config(vec![0.0], vec![1.0])));
        assert!(!solver.can_solve(&to_config(vec![0.0, 0.0], vec![1.0])));

        let config_only = RandomizedSolver::new(SolverConfig {
            supports: vec![ProblemKind::ConfigurationToConfiguration],
            ..SolverConfig::default()
        })
        .clone_for_resource(&arm, None);
        let region = PlanningProblem::ConfigurationToRegion {
            start: vec![0.0, 0.0],
            region: GoalRegion::new(0.0, 1.5, 0.5),
        };
        assert!(!config_only.can_solve(&region));
        assert!(solver.can_solve(&region));
    }

    #[test]
    fn test_seeded_clones_are_reproducible() {
        let arm = Skeleton::planar_arm("arm", &[1.0, 1.0]);
        let template = RandomizedSolver::default();
        let mut a = template.clone_for_resource(&arm, Some(3));
        let mut b = template.clone_for_resource(&arm, Some(3));
        let mut c = template.clone_for_resource(&arm, Some(4));

        let sa = a.sample();
        assert_eq!(sa, b.sample());
        assert_ne!(sa, c.sample());
        assert_eq!(a.limits(), &[(-PI, PI), (-PI, PI)]);
    }
}
