//! Scripted worlds, backends and solvers for unit tests
//!
//! `ScriptedSolver` picks its behavior from a shared script by index. The
//! index comes from the provisioning seed when one is given, otherwise clones
//! are numbered in creation order.

use crate::error::CloneError;
use crate::solver::{SolveContext, SolveFailure, Solver};
use crate::world::{ValidityBackend, World};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// World made of plain values that counts how often it was cloned
#[derive(Debug)]
pub struct CountingWorld {
    pub values: Vec<f64>,
    pub malformed: bool,
    clones: Arc<AtomicUsize>,
}

impl CountingWorld {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            malformed: false,
            clones: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Total clones taken from this world and from any of its clones
    pub fn clones_taken(&self) -> usize {
        self.clones.load(Ordering::SeqCst)
    }
}

impl World for CountingWorld {
    fn try_clone(&self) -> Result<Self, CloneError> {
        if self.malformed {
            return Err(CloneError::Malformed("scripted malformed world".to_string()));
        }
        self.clones.fetch_add(1, Ordering::SeqCst);
        Ok(Self {
            values: self.values.clone(),
            malformed: false,
            clones: Arc::clone(&self.clones),
        })
    }
}

/// Valid while every value stays within `limit`
#[derive(Debug, Clone)]
pub struct ThresholdBackend {
    pub limit: f64,
    pub reject_install: bool,
    pub installed: bool,
}

impl ThresholdBackend {
    pub fn new(limit: f64) -> Self {
        Self {
            limit,
            reject_install: false,
            installed: false,
        }
    }

    pub fn rejecting() -> Self {
        Self {
            reject_install: true,
            ..Self::new(1.0)
        }
    }
}

impl ValidityBackend<CountingWorld> for ThresholdBackend {
    fn name(&self) -> &str {
        "threshold"
    }

    fn install(&mut self, _world: &CountingWorld) -> Result<(), CloneError> {
        if self.reject_install {
            return Err(CloneError::BackendRejected {
                backend: self.name().to_string(),
                reason: "scripted rejection".to_string(),
            });
        }
        self.installed = true;
        Ok(())
    }

    fn is_valid(&mut self, world: &CountingWorld) -> bool {
        world.values.iter().all(|v| v.abs() <= self.limit)
    }
}

/// What one scripted worker does when asked to solve
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Succeed at once with `value`
    Succeed(u64),
    /// Sleep without polling the stop flag, then succeed
    SucceedAfter(u64, Duration),
    /// Fail at once
    Fail,
    /// Sleep, then fail
    FailAfter(Duration),
    /// Poll the stop flag until it flips, then report cancellation
    SpinUntilStopped,
    /// Wait until `release` is set, then succeed with `value`
    HoldUntil(Arc<AtomicBool>, u64),
    /// Panic inside solve
    Panic,
    /// Refuse every problem in `can_solve`
    Ineligible,
    /// Block in `can_solve` until `gate` is set, then succeed with `value`
    GatedEligibility(Arc<AtomicBool>, u64),
    /// Overwrite every world value, then succeed reporting the world seen
    Scribble(f64),
}

/// Result of a scripted solve
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptArtifact {
    pub index: usize,
    pub value: u64,
    pub world: Vec<f64>,
}

/// Shared observations across every clone of one script
#[derive(Debug)]
pub struct ScriptTally {
    pub stop_seen: Vec<AtomicBool>,
    pub solve_calls: AtomicUsize,
}

impl ScriptTally {
    pub fn saw_stop(&self, index: usize) -> bool {
        self.stop_seen[index].load(Ordering::SeqCst)
    }

    pub fn solve_calls(&self) -> usize {
        self.solve_calls.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct ScriptedSolver {
    script: Arc<Vec<Behavior>>,
    next: Arc<AtomicUsize>,
    tally: Arc<ScriptTally>,
    index: usize,
    seed: Option<u64>,
}

impl ScriptedSolver {
    pub fn new(script: Vec<Behavior>) -> Self {
        let tally = ScriptTally {
            stop_seen: script.iter().map(|_| AtomicBool::new(false)).collect(),
            solve_calls: AtomicUsize::new(0),
        };
        Self {
            script: Arc::new(script),
            next: Arc::new(AtomicUsize::new(0)),
            tally: Arc::new(tally),
            index: 0,
            seed: None,
        }
    }

    pub fn tally(&self) -> Arc<ScriptTally> {
        Arc::clone(&self.tally)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn behavior(&self) -> &Behavior {
        &self.script[self.index]
    }
}

fn wait_for_stop(stop: impl Fn() -> bool, limit: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < limit {
        if stop() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    false
}

impl Solver for ScriptedSolver {
    type Problem = String;
    type World = CountingWorld;
    type Backend = ThresholdBackend;
    type Artifact = ScriptArtifact;

    fn name(&self) -> &str {
        "scripted"
    }

    fn can_solve(&self, _problem: &String) -> bool {
        match self.behavior() {
            Behavior::Ineligible => false,
            Behavior::GatedEligibility(gate, _) => {
                wait_for_stop(|| gate.load(Ordering::SeqCst), Duration::from_secs(10))
            }
            _ => true,
        }
    }

    fn solve(
        &mut self,
        _problem: &String,
        ctx: &mut SolveContext<'_, CountingWorld, ThresholdBackend>,
    ) -> Result<ScriptArtifact, SolveFailure> {
        self.tally.solve_calls.fetch_add(1, Ordering::SeqCst);
        let index = self.index;
        let artifact = |value: u64, world: &CountingWorld| ScriptArtifact {
            index,
            value,
            world: world.values.clone(),
        };

        match self.behavior().clone() {
            Behavior::Succeed(value) | Behavior::GatedEligibility(_, value) => {
                Ok(artifact(value, ctx.world()))
            }
            Behavior::SucceedAfter(value, delay) => {
                thread::sleep(delay);
                Ok(artifact(value, ctx.world()))
            }
            Behavior::Fail => Err(SolveFailure::Other("scripted failure".to_string())),
            Behavior::FailAfter(delay) => {
                thread::sleep(delay);
                Err(SolveFailure::Exhausted)
            }
            Behavior::SpinUntilStopped => {
                if wait_for_stop(|| ctx.should_stop(), Duration::from_secs(10)) {
                    self.tally.stop_seen[index].store(true, Ordering::SeqCst);
                    Err(SolveFailure::Cancelled)
                } else {
                    Err(SolveFailure::Exhausted)
                }
            }
            Behavior::HoldUntil(release, value) => {
                let released = wait_for_stop(
                    || release.load(Ordering::SeqCst) || ctx.should_stop(),
                    Duration::from_secs(10),
                );
                if ctx.should_stop() {
                    self.tally.stop_seen[index].store(true, Ordering::SeqCst);
                    return Err(SolveFailure::Cancelled);
                }
                if released {
                    Ok(artifact(value, ctx.world()))
                } else {
                    Err(SolveFailure::Exhausted)
                }
            }
            Behavior::Panic => panic!("scripted panic in worker {}", index),
            Behavior::Ineligible => Err(SolveFailure::UnrecognizedGoal),
            Behavior::Scribble(value) => {
                for v in ctx.world_mut().values.iter_mut() {
                    *v = value;
                }
                thread::sleep(Duration::from_millis(5));
                Ok(artifact(index as u64, ctx.world()))
            }
        }
    }

    fn clone_for_resource(&self, _world: &CountingWorld, seed: Option<u64>) -> Self {
        let index = match seed {
            Some(seed) => seed as usize,
            None => self.next.fetch_add(1, Ordering::SeqCst),
        };
        Self {
            index,
            seed,
            ..self.clone()
        }
    }
}
