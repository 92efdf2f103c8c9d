//! Solver abstraction
//!
//! A solver is the black box each worker runs. The racing coordinator only
//! needs four things from it: an eligibility check, a solve call that confines
//! its side effects to the worker's own world and backend, a cooperative stop
//! check, and a factory that produces a per-worker copy.
//!
//! Problem kinds are resolved through the associated `Problem` type rather
//! than runtime downcasts. A solver that handles several kinds usually makes
//! `Problem` a closed enum and matches on it in `can_solve`.

use crate::coordinator::cancel::StopToken;
use crate::world::{ValidityBackend, World};
use serde::Serialize;
use std::fmt;

/// Reason a single worker failed to produce an artifact
///
/// These never reach the caller individually. They are logged and folded into
/// `RaceOutcome::AllFailed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SolveFailure {
    /// The start state is invalid
    InvalidStart,
    /// The goal state is invalid or unreachable by construction
    InvalidGoal,
    /// The problem kind is not one this solver understands
    UnrecognizedGoal,
    /// The solver used up its own attempt budget
    Exhausted,
    /// The solver observed its stop signal
    Cancelled,
    /// The solver panicked or its thread vanished
    Crashed(String),
    /// Any other solver-specific reason
    Other(String),
}

impl fmt::Display for SolveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveFailure::InvalidStart => write!(f, "invalid start state"),
            SolveFailure::InvalidGoal => write!(f, "invalid goal"),
            SolveFailure::UnrecognizedGoal => write!(f, "unrecognized goal type"),
            SolveFailure::Exhausted => write!(f, "attempt budget exhausted"),
            SolveFailure::Cancelled => write!(f, "cancelled"),
            SolveFailure::Crashed(msg) => write!(f, "crashed: {}", msg),
            SolveFailure::Other(msg) => write!(f, "{}", msg),
        }
    }
}

/// Everything a solver may touch during one solve call
///
/// The world is a scratch clone private to this worker and this race; the
/// backend is the worker's own instance.
pub struct SolveContext<'a, W, B> {
    world: &'a mut W,
    backend: &'a mut B,
    stop: &'a StopToken,
}

impl<'a, W: World, B: ValidityBackend<W>> SolveContext<'a, W, B> {
    pub fn new(world: &'a mut W, backend: &'a mut B, stop: &'a StopToken) -> Self {
        Self { world, backend, stop }
    }

    /// Read access to the scratch world
    pub fn world(&self) -> &W {
        &*self.world
    }

    /// Mutable access to the scratch world
    pub fn world_mut(&mut self) -> &mut W {
        &mut *self.world
    }

    /// Check whether the world's current state is valid
    pub fn is_valid(&mut self) -> bool {
        self.backend.is_valid(&*self.world)
    }

    /// Apply `f` to the world, then run the validity check on the result
    pub fn check_with<F>(&mut self, f: F) -> bool
    where
        F: FnOnce(&mut W),
    {
        f(&mut *self.world);
        self.backend.is_valid(&*self.world)
    }

    /// Advisory stop signal; solvers should poll this at safe points
    #[inline]
    pub fn should_stop(&self) -> bool {
        self.stop.is_stopped()
    }
}

/// A solver that can take part in a race
///
/// # Thread Safety
///
/// Solvers must be `Send`; each worker owns its own instance and runs it on a
/// dedicated thread.
pub trait Solver: Send + Sized + 'static {
    /// Problem description, shared read-only with every worker via clones
    type Problem: Clone + Send + Sync + 'static;
    /// Mutable world each worker gets a private copy of
    type World: World;
    /// Validity backend, one instance per worker
    type Backend: ValidityBackend<Self::World>;
    /// Successful result
    type Artifact: Send + 'static;

    /// Short name used in logs
    fn name(&self) -> &str;

    /// Returns true if this solver can attempt `problem`
    fn can_solve(&self, problem: &Self::Problem) -> bool;

    /// Attempt `problem`
    ///
    /// Side effects must stay inside `ctx`. Long searches should poll
    /// `ctx.should_stop()` and return `SolveFailure::Cancelled` once it flips.
    fn solve(
        &mut self,
        problem: &Self::Problem,
        ctx: &mut SolveContext<'_, Self::World, Self::Backend>,
    ) -> Result<Self::Artifact, SolveFailure>;

    /// Produce a copy of this solver bound to a worker's world
    ///
    /// `seed` overrides the solver's default randomness when present.
    fn clone_for_resource(&self, world: &Self::World, seed: Option<u64>) -> Self;
}
