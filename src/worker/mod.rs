//! Worker instances and pool provisioning
//!
//! A Worker is the unit that takes part in a race: one solver clone, one
//! private world clone, one validity backend and an optional seed. Workers are
//! provisioned once when the coordinator is built and reused across races.
//!
//! # Lifecycle
//!
//! 1. **Provisioning**: `provision()` clones the caller's world once per
//!    backend, installs the backend, and clones the solver template
//! 2. **Racing**: `Worker::run()` takes a scratch clone of the worker's world,
//!    so every race starts from the state captured at provisioning
//! 3. **Reuse**: the scratch clone is dropped after each run; the worker's own
//!    world is never handed to the solver
//!
//! # Example
//!
//! ```no_run
//! use planrace::planning::{CircleObstacles, RandomizedSolver, Skeleton};
//! use planrace::worker::provision;
//!
//! let arm = Skeleton::planar_arm("arm", &[1.0, 1.0]);
//! let template = RandomizedSolver::default();
//! let backends = vec![CircleObstacles::new(vec![]); 4];
//! let workers = provision(&template, &arm, backends, &[1, 2, 3, 4])?;
//! assert_eq!(workers.len(), 4);
//! # Ok::<(), planrace::error::ConfigurationError>(())
//! ```

use crate::coordinator::cancel::StopToken;
use crate::error::{CloneError, ConfigurationError};
use crate::solver::{SolveContext, SolveFailure, Solver};
use crate::world::{clone_for_workers, ValidityBackend, World};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Outcome of one worker in one race
///
/// Exactly one is produced per launched worker. A worker the eligibility
/// filter rejects is not applicable: it gets no slot and produces nothing.
#[derive(Debug)]
pub enum RaceResult<A> {
    Success(A),
    Failure(SolveFailure),
}

impl<A> RaceResult<A> {
    pub fn is_success(&self) -> bool {
        matches!(self, RaceResult::Success(_))
    }
}

/// A finished run together with how long it took
#[derive(Debug)]
pub struct WorkerRun<A> {
    pub worker: usize,
    pub result: RaceResult<A>,
    pub elapsed: Duration,
}

/// One racing participant
///
/// # Thread Safety
///
/// Each worker owns its solver, world and backend outright and is moved behind
/// its own lock by the coordinator. Workers never share mutable state.
pub struct Worker<S: Solver> {
    /// Position of this worker's backend in the provisioning input
    id: usize,

    /// Solver clone bound to this worker
    solver: S,

    /// World clone taken at provisioning (never mutated by the solver)
    world: S::World,

    /// Validity backend installed into `world`
    backend: S::Backend,

    /// Seed override given to the solver clone, if any
    seed: Option<u64>,
}

impl<S: Solver> Worker<S> {
    /// Build a worker around an already cloned world
    ///
    /// # Errors
    ///
    /// Returns `CloneError::BackendRejected` if the backend refuses the world.
    pub fn new(
        id: usize,
        template: &S,
        world: S::World,
        mut backend: S::Backend,
        seed: Option<u64>,
    ) -> Result<Self, CloneError> {
        backend.install(&world)?;
        let solver = template.clone_for_resource(&world, seed);

        Ok(Self {
            id,
            solver,
            world,
            backend,
            seed,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// The world captured at provisioning
    pub fn world(&self) -> &S::World {
        &self.world
    }

    /// Ask the solver whether it can attempt `problem`
    pub fn can_solve(&self, problem: &S::Problem) -> bool {
        self.solver.can_solve(problem)
    }

    /// Run the solver once against a fresh scratch world
    ///
    /// Never panics: a panic inside the solver is caught and reported as
    /// `SolveFailure::Crashed`. A stop requested before the run starts skips
    /// the solve entirely.
    pub fn run(&mut self, problem: &S::Problem, stop: &StopToken) -> WorkerRun<S::Artifact> {
        let start = Instant::now();
        let result = self.attempt(problem, stop);
        let elapsed = start.elapsed();

        match &result {
            RaceResult::Success(_) => {
                debug!(worker = self.id, elapsed_ms = elapsed.as_millis() as u64, "solve succeeded")
            }
            RaceResult::Failure(reason) => {
                debug!(worker = self.id, elapsed_ms = elapsed.as_millis() as u64, %reason, "solve failed")
            }
        }

        WorkerRun {
            worker: self.id,
            result,
            elapsed,
        }
    }

    fn attempt(&mut self, problem: &S::Problem, stop: &StopToken) -> RaceResult<S::Artifact> {
        if stop.is_stopped() {
            return RaceResult::Failure(SolveFailure::Cancelled);
        }

        let mut scratch = match self.world.try_clone() {
            Ok(scratch) => scratch,
            Err(e) => {
                warn!(worker = self.id, error = %e, "scratch clone failed");
                return RaceResult::Failure(SolveFailure::Other(e.to_string()));
            }
        };

        let solver = &mut self.solver;
        let backend = &mut self.backend;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut ctx = SolveContext::new(&mut scratch, backend, stop);
            solver.solve(problem, &mut ctx)
        }));

        match outcome {
            Ok(Ok(artifact)) => RaceResult::Success(artifact),
            Ok(Err(reason)) => RaceResult::Failure(reason),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(worker = self.id, %message, "solver panicked");
                RaceResult::Failure(SolveFailure::Crashed(message))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Build one worker per validity backend
///
/// Seeds pair 1:1 with backends when the counts match. An empty seed list
/// leaves every solver clone on its default randomness.
///
/// # Errors
///
/// - `ConfigurationError::NoBackends` when `backends` is empty
/// - `ConfigurationError::SeedCountMismatch` when seeds are given but their
///   count differs from the backend count; no worker is created
/// - `ConfigurationError::NoWorkers` when every worker failed to clone or
///   install. Individual failures are skipped with a warning as long as one
///   worker survives.
pub fn provision<S: Solver>(
    template: &S,
    world: &S::World,
    backends: Vec<S::Backend>,
    seeds: &[u64],
) -> Result<Vec<Worker<S>>, ConfigurationError> {
    if backends.is_empty() {
        return Err(ConfigurationError::NoBackends);
    }
    if !seeds.is_empty() && seeds.len() != backends.len() {
        return Err(ConfigurationError::SeedCountMismatch {
            backends: backends.len(),
            seeds: seeds.len(),
        });
    }

    let attempted = backends.len();
    let mut workers = Vec::with_capacity(attempted);
    let mut last_error = None;

    let clones = clone_for_workers(world, attempted);
    for (id, (backend, clone)) in backends.into_iter().zip(clones).enumerate() {
        let seed = seeds.get(id).copied();
        let built = clone.and_then(|clone| Worker::new(id, template, clone, backend, seed));

        match built {
            Ok(worker) => workers.push(worker),
            Err(e) => {
                warn!(worker = id, backend_count = attempted, error = %e, "excluding worker");
                last_error = Some(e);
            }
        }
    }

    match (workers.is_empty(), last_error) {
        (true, Some(last)) => Err(ConfigurationError::NoWorkers { attempted, last }),
        _ => {
            debug!(workers = workers.len(), solver = template.name(), "provisioned worker pool");
            Ok(workers)
        }
    }
}
