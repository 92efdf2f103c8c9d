//! planrace - first-success-wins racing of independent solvers
//!
//! Several solver instances attack the same query concurrently, each with its
//! own private copy of the mutable world and its own validity backend. The
//! first success observed wins; the others are told to stop and are left to
//! wind down on their own.
//!
//! # Architecture
//!
//! - **Worlds and backends**: deep-cloned per worker, never shared
//! - **Workers**: provisioned once, reused across races
//! - **Coordinator**: single-flight guard, one thread per eligible worker,
//!   non-blocking round-robin result polling, advisory cancellation
//! - **Planning domain**: planar arm, circle obstacles and a randomized
//!   via-point planner that exercise the core end to end

pub mod config;
pub mod coordinator;
pub mod error;
pub mod output;
pub mod planning;
pub mod solver;
pub mod util;
pub mod worker;
pub mod world;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::ScenarioConfig;
pub use coordinator::{RaceCoordinator, RaceOptions, RaceOutcome};
pub use error::{CloneError, ConfigurationError, RaceError};
pub use solver::{SolveContext, SolveFailure, Solver};
pub use world::{ValidityBackend, World};

/// Result type used by application-level plumbing
pub type Result<T> = anyhow::Result<T>;
