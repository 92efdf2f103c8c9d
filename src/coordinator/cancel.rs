//! Advisory cancellation
//!
//! A `StopToken` is a shared flag a solver polls at safe points in its own
//! loop. Setting it never interrupts a blocking call; a worker may keep
//! consuming resources until it next checks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative stop flag shared between the coordinator and one worker
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    flag: Arc<AtomicBool>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the holder to stop. Idempotent.
    pub fn request_stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check whether a stop was requested
    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Broadcasts a stop request to every worker of one race
#[derive(Debug, Default)]
pub struct CancellationBridge {
    tokens: Vec<StopToken>,
}

impl CancellationBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a worker token; returns a handle for the worker side
    pub fn register(&mut self) -> StopToken {
        let token = StopToken::new();
        self.tokens.push(token.clone());
        token
    }

    /// Number of workers this bridge can signal
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Signal every registered worker
    ///
    /// Returns true when at least one worker was signaled.
    pub fn stop_all(&self) -> bool {
        for token in &self.tokens {
            token.request_stop();
        }
        !self.tokens.is_empty()
    }
}
