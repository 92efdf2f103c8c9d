//! Error types for provisioning and racing
//!
//! Configuration errors are fatal to setup and surface synchronously from
//! coordinator construction. Clone errors only ever exclude a single worker.
//! Per-worker solve failures never appear here; they are folded into
//! `RaceOutcome::AllFailed`.

use thiserror::Error;

/// Malformed provisioning input. The race never starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// No validity backends were supplied, so no worker can be built
    #[error("at least one validity backend is required, got 0")]
    NoBackends,

    /// Seeds were supplied but cannot be paired 1:1 with backends
    #[error("Number of validity backends [{backends}] does not match number of seeds [{seeds}]")]
    SeedCountMismatch { backends: usize, seeds: usize },

    /// Every worker failed to provision
    #[error("no worker could be provisioned ({attempted} attempted): {last}")]
    NoWorkers { attempted: usize, last: CloneError },
}

/// A world or backend could not be prepared for one worker
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloneError {
    /// The source world is not in a clonable state
    #[error("world is malformed: {0}")]
    Malformed(String),

    /// The validity backend refused to install into the cloned world
    #[error("backend '{backend}' rejected world: {reason}")]
    BackendRejected { backend: String, reason: String },
}

/// Errors returned by `RaceCoordinator::race`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RaceError {
    /// Another race is in flight on this coordinator
    #[error("coordinator is already racing another problem")]
    AlreadyRacing,

    /// No worker was free: workers of an earlier race had not yet observed
    /// their stop signal
    #[error("{busy} worker(s) still running an earlier race")]
    WorkersBusy { busy: usize },
}
