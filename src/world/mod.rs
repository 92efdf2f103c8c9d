//! World and validity backend abstractions
//!
//! A world is the mutable state a solver reads and perturbs while it searches
//! (for example a skeleton whose joint positions are set during collision
//! checks). Workers never share a world: each one receives a deep clone taken
//! before the race starts, and the caller's original is only ever read.
//!
//! # Thread Safety
//!
//! Worlds and backends must be `Send` so they can move onto worker threads.
//! They are not required to be `Sync`; exactly one thread touches a given
//! instance at a time.

use crate::error::CloneError;

/// Mutable world state that can be deep-cloned per worker
///
/// Implementations must guarantee that mutations to the returned value are
/// invisible to `self` and to every other clone. Named structure the solver
/// depends on (joint names, frames) must survive the clone.
pub trait World: Send + Sized + 'static {
    /// Produce an independent deep copy
    ///
    /// # Errors
    ///
    /// Returns `CloneError::Malformed` when the source is not in a clonable
    /// state. This is fatal only for the worker being provisioned.
    fn try_clone(&self) -> Result<Self, CloneError>;
}

/// Per-worker validity checker (collision detection and the like)
///
/// One distinct instance is created per worker and installed into that
/// worker's cloned world at provisioning time.
pub trait ValidityBackend<W: World>: Send + 'static {
    /// Human readable backend name (used in logs and errors)
    fn name(&self) -> &str;

    /// Bind this backend to a freshly cloned world
    ///
    /// # Errors
    ///
    /// Returns `CloneError::BackendRejected` when the world does not have the
    /// structure this backend needs.
    fn install(&mut self, world: &W) -> Result<(), CloneError>;

    /// Returns true if the current state of `world` is valid
    fn is_valid(&mut self, world: &W) -> bool;
}

/// Clone `world` once per requested worker
///
/// Each entry is independent: a failing clone does not prevent the others.
pub fn clone_for_workers<W: World>(world: &W, count: usize) -> Vec<Result<W, CloneError>> {
    (0..count).map(|_| world.try_clone()).collect()
}
