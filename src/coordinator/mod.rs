//! Racing coordinator
//!
//! Runs every eligible worker on its own thread against the same problem and
//! returns the first success it observes. Losers get an advisory stop signal
//! and are never joined.
//!
//! # State machine
//!
//! ```text
//!          race()                 first success / all failed / abort
//!   Idle ──────────▶ Racing ──────────────────────────────────────▶ Idle
//!                      │
//!                      └─ race() while Racing ─▶ RaceError::AlreadyRacing
//! ```
//!
//! The state lives behind one mutex that is only held for the flag check and
//! for signaling stop tokens, never across a blocking call.
//!
//! Losers of an earlier race keep their worker busy until they notice the
//! stop signal. A new race waits up to `RaceOptions::busy_wait` for them and
//! fails with `RaceError::WorkersBusy` if nothing else could be launched.
//!
//! # Result collection
//!
//! Each worker deposits exactly one `RaceResult` into its own bounded(1)
//! channel. The calling thread polls the slots round-robin with a short
//! timeout, so a success from one worker is seen promptly even while another
//! slot is still empty. The first slot observed holding a success wins; this
//! is poll order, not completion order.
//!
//! # Example
//!
//! ```no_run
//! use planrace::coordinator::{RaceCoordinator, RaceOptions, RaceOutcome};
//! use planrace::planning::{CircleObstacles, PlanningProblem, RandomizedSolver, Skeleton};
//!
//! let arm = Skeleton::planar_arm("arm", &[1.0, 1.0]);
//! let backends = vec![CircleObstacles::new(vec![]); 4];
//! let coordinator = RaceCoordinator::new(
//!     &RandomizedSolver::default(),
//!     &arm,
//!     backends,
//!     &[],
//!     RaceOptions::default(),
//! )?;
//!
//! let problem = PlanningProblem::ConfigurationToConfiguration {
//!     start: vec![0.0, 0.0],
//!     goal: vec![1.0, -0.5],
//! };
//! if let RaceOutcome::Succeeded { worker, artifact } = coordinator.race(&problem)? {
//!     println!("worker {} found {} waypoints", worker, artifact.waypoints.len());
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cancel;

use crate::error::{ConfigurationError, RaceError};
use crate::solver::Solver;
use crate::util::timing_log::TimingLog;
use crate::worker::{provision, RaceResult, Worker};
use cancel::{CancellationBridge, StopToken};
use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default per-slot poll timeout
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_micros(200);

/// Default time a new race waits for workers still winding down
pub const DEFAULT_BUSY_WAIT: Duration = Duration::from_millis(100);

/// Tunables for a coordinator
#[derive(Debug, Clone)]
pub struct RaceOptions {
    /// How long a single slot check may wait; zero means a non-blocking check
    pub poll_timeout: Duration,
    /// How long a new race waits for workers of an earlier race to observe
    /// their stop signal before the eligibility pass; zero means no wait
    pub busy_wait: Duration,
    /// Append per-worker timings to this file
    pub timing_log: Option<PathBuf>,
}

impl Default for RaceOptions {
    fn default() -> Self {
        Self {
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            busy_wait: DEFAULT_BUSY_WAIT,
            timing_log: None,
        }
    }
}

/// Terminal outcome of one race
#[derive(Debug)]
pub enum RaceOutcome<A> {
    /// A worker succeeded; every other worker was asked to stop
    Succeeded { worker: usize, artifact: A },
    /// Every launched worker reported failure
    AllFailed,
    /// No worker accepted the problem; nothing was launched
    NoneEligible,
    /// `abort()` was called while the race was in flight
    Aborted,
}

impl<A> RaceOutcome<A> {
    pub fn is_success(&self) -> bool {
        matches!(self, RaceOutcome::Succeeded { .. })
    }

    /// Short label for logs and reports
    pub fn label(&self) -> &'static str {
        match self {
            RaceOutcome::Succeeded { .. } => "succeeded",
            RaceOutcome::AllFailed => "all_failed",
            RaceOutcome::NoneEligible => "none_eligible",
            RaceOutcome::Aborted => "aborted",
        }
    }
}

/// Coordinator state guarded by a single lock
///
/// `bridge` and `abort` belong to the race in flight and are replaced when
/// the next race begins.
#[derive(Debug, Default)]
struct RaceState {
    racing: bool,
    bridge: CancellationBridge,
    abort: StopToken,
}

/// Returns the coordinator to `Idle` on every exit path
struct RacingGuard<'a> {
    state: &'a Mutex<RaceState>,
}

impl Drop for RacingGuard<'_> {
    fn drop(&mut self) {
        lock(self.state).racing = false;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A provisioned worker plus the flag marking it as still running
struct WorkerSlot<S: Solver> {
    id: usize,
    busy: Arc<AtomicBool>,
    worker: Arc<Mutex<Worker<S>>>,
}

/// A launched worker whose result has not been observed yet
struct PendingSlot<A> {
    worker: usize,
    rx: Receiver<RaceResult<A>>,
}

enum SlotPoll<A> {
    Empty,
    Ready(RaceResult<A>),
    Vanished,
}

/// Races a fixed pool of workers, one race at a time
pub struct RaceCoordinator<S: Solver> {
    slots: Vec<WorkerSlot<S>>,
    state: Mutex<RaceState>,
    options: RaceOptions,
    timing_log: Option<Arc<TimingLog>>,
}

impl<S: Solver> RaceCoordinator<S> {
    /// Provision one worker per backend and build a coordinator around them
    ///
    /// # Errors
    ///
    /// Any `ConfigurationError` from `provision`. The coordinator is never
    /// built with zero workers.
    pub fn new(
        template: &S,
        world: &S::World,
        backends: Vec<S::Backend>,
        seeds: &[u64],
        options: RaceOptions,
    ) -> Result<Self, ConfigurationError> {
        let workers = provision(template, world, backends, seeds)?;
        Ok(Self::from_workers(workers, options))
    }

    /// Build a coordinator around already provisioned workers
    pub fn from_workers(workers: Vec<Worker<S>>, options: RaceOptions) -> Self {
        let timing_log = options.timing_log.as_ref().and_then(|path| {
            match TimingLog::open(path, workers.len()) {
                Ok(log) => Some(Arc::new(log)),
                Err(e) => {
                    warn!(error = %e, "timing log disabled");
                    None
                }
            }
        });

        let slots = workers
            .into_iter()
            .map(|worker| WorkerSlot {
                id: worker.id(),
                busy: Arc::new(AtomicBool::new(false)),
                worker: Arc::new(Mutex::new(worker)),
            })
            .collect();

        Self {
            slots,
            state: Mutex::new(RaceState::default()),
            options,
            timing_log,
        }
    }

    /// Number of provisioned workers
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// IDs of the provisioned workers, in pool order
    pub fn worker_ids(&self) -> Vec<usize> {
        self.slots.iter().map(|slot| slot.id).collect()
    }

    pub fn options(&self) -> &RaceOptions {
        &self.options
    }

    /// Returns true while a race is in flight
    pub fn is_racing(&self) -> bool {
        lock(&self.state).racing
    }

    /// Race every eligible worker against `problem`
    ///
    /// Blocks the calling thread until a success is observed, every launched
    /// worker has failed, or `abort()` is called. There is no coordinator
    /// deadline.
    ///
    /// # Errors
    ///
    /// Returns `RaceError::AlreadyRacing` immediately if another race is in
    /// flight on this coordinator; that race is left undisturbed.
    ///
    /// Returns `RaceError::WorkersBusy` when no worker could be launched
    /// because workers of an earlier race were still running after
    /// `busy_wait`.
    pub fn race(&self, problem: &S::Problem) -> Result<RaceOutcome<S::Artifact>, RaceError> {
        let _guard = self.begin()?;
        let started = Instant::now();

        self.wait_for_busy_workers();
        let (eligible, busy) = self.claim_eligible(problem);
        if eligible.is_empty() {
            if busy > 0 {
                warn!(busy, "every available worker is still running an earlier race");
                return Err(RaceError::WorkersBusy { busy });
            }
            info!(workers = self.slots.len(), "no eligible worker");
            return Ok(RaceOutcome::NoneEligible);
        }

        let (tokens, abort) = self.register(eligible.len());
        if abort.is_stopped() {
            for slot in &eligible {
                slot.busy.store(false, Ordering::SeqCst);
            }
            info!("race aborted before launch");
            return Ok(RaceOutcome::Aborted);
        }
        let launched = eligible.len();
        let mut failures = 0;
        let mut pending = Vec::with_capacity(launched);

        for (slot, token) in eligible.into_iter().zip(tokens) {
            let (tx, rx) = bounded(1);
            match self.launch(slot, problem.clone(), token, tx) {
                Ok(()) => pending.push(Some(PendingSlot { worker: slot.id, rx })),
                Err(e) => {
                    warn!(worker = slot.id, error = %e, "failed to spawn worker thread");
                    slot.busy.store(false, Ordering::SeqCst);
                    failures += 1;
                }
            }
        }

        info!(launched, "race started");
        let outcome = self.collect(pending, failures, launched, &abort);
        info!(
            outcome = outcome.label(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "race finished"
        );
        Ok(outcome)
    }

    /// Signal every in-flight worker and end the current race
    ///
    /// No-op returning false when no race is active. Returns true when a race
    /// was in flight; workers registered later in that race are never
    /// launched.
    pub fn abort(&self) -> bool {
        let state = lock(&self.state);
        if !state.racing {
            return false;
        }
        state.abort.request_stop();
        let signaled = state.bridge.stop_all();
        debug!(workers = state.bridge.len(), signaled, "abort requested");
        true
    }

    fn begin(&self) -> Result<RacingGuard<'_>, RaceError> {
        let mut state = lock(&self.state);
        if state.racing {
            return Err(RaceError::AlreadyRacing);
        }
        *state = RaceState {
            racing: true,
            bridge: CancellationBridge::new(),
            abort: StopToken::new(),
        };
        Ok(RacingGuard { state: &self.state })
    }

    /// Give workers signaled by an earlier race up to `busy_wait` to finish
    fn wait_for_busy_workers(&self) {
        let busy_wait = self.options.busy_wait;
        if busy_wait.is_zero() {
            return;
        }
        let deadline = Instant::now() + busy_wait;
        while self.slots.iter().any(|slot| slot.busy.load(Ordering::SeqCst)) {
            if Instant::now() >= deadline {
                debug!("busy wait expired with workers still running");
                return;
            }
            thread::sleep(Duration::from_micros(200));
        }
    }

    /// Claim every idle worker that accepts `problem`
    ///
    /// Workers still running from an earlier race are skipped and counted in
    /// the second return value. Claimed workers are marked busy until their
    /// thread finishes.
    fn claim_eligible(&self, problem: &S::Problem) -> (Vec<&WorkerSlot<S>>, usize) {
        let mut eligible = Vec::with_capacity(self.slots.len());
        let mut busy = 0;
        for slot in &self.slots {
            if slot
                .busy
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                debug!(worker = slot.id, "worker still busy from a previous race");
                busy += 1;
                continue;
            }

            if lock(&slot.worker).can_solve(problem) {
                eligible.push(slot);
            } else {
                debug!(worker = slot.id, "worker cannot solve problem");
                slot.busy.store(false, Ordering::SeqCst);
            }
        }
        (eligible, busy)
    }

    /// Register one stop token per launched worker with the current race
    fn register(&self, count: usize) -> (Vec<StopToken>, StopToken) {
        let mut state = lock(&self.state);
        let tokens: Vec<StopToken> = (0..count).map(|_| state.bridge.register()).collect();
        (tokens, state.abort.clone())
    }

    fn launch(
        &self,
        slot: &WorkerSlot<S>,
        problem: S::Problem,
        token: StopToken,
        tx: Sender<RaceResult<S::Artifact>>,
    ) -> std::io::Result<()> {
        let worker = Arc::clone(&slot.worker);
        let busy = Arc::clone(&slot.busy);
        let timing_log = self.timing_log.clone();

        thread::Builder::new()
            .name(format!("race-worker-{}", slot.id))
            .spawn(move || {
                let run = lock(&worker).run(&problem, &token);
                busy.store(false, Ordering::SeqCst);
                if let Some(log) = timing_log {
                    log.record(&run);
                }
                // The coordinator may already have returned
                let _ = tx.send(run.result);
            })
            .map(|_| ())
    }

    fn collect(
        &self,
        pending: Vec<Option<PendingSlot<S::Artifact>>>,
        mut failures: usize,
        launched: usize,
        abort: &StopToken,
    ) -> RaceOutcome<S::Artifact> {
        let mut pending = pending;
        let timeout = self.options.poll_timeout;

        loop {
            if abort.is_stopped() {
                self.stop_all();
                return RaceOutcome::Aborted;
            }
            if failures == launched {
                return RaceOutcome::AllFailed;
            }

            let mut observed = false;
            for entry in pending.iter_mut() {
                let (worker, polled) = match entry {
                    Some(slot) => (slot.worker, poll_slot(&slot.rx, timeout)),
                    None => continue,
                };

                match polled {
                    SlotPoll::Empty => continue,
                    SlotPoll::Ready(RaceResult::Success(artifact)) => {
                        self.stop_all();
                        return RaceOutcome::Succeeded { worker, artifact };
                    }
                    SlotPoll::Ready(RaceResult::Failure(reason)) => {
                        debug!(worker, %reason, "worker failed");
                    }
                    SlotPoll::Vanished => {
                        warn!(worker, "worker exited without reporting");
                    }
                }
                *entry = None;
                failures += 1;
                observed = true;
            }

            if !observed && timeout.is_zero() {
                thread::yield_now();
            }
        }
    }

    fn stop_all(&self) -> bool {
        let state = lock(&self.state);
        debug!(workers = state.bridge.len(), "signaling stop");
        state.bridge.stop_all()
    }
}

fn poll_slot<A>(rx: &Receiver<RaceResult<A>>, timeout: Duration) -> SlotPoll<A> {
    if timeout.is_zero() {
        match rx.try_recv() {
            Ok(result) => SlotPoll::Ready(result),
            Err(TryRecvError::Empty) => SlotPoll::Empty,
            Err(TryRecvError::Disconnected) => SlotPoll::Vanished,
        }
    } else {
        match rx.recv_timeout(timeout) {
            Ok(result) => SlotPoll::Ready(result),
            Err(RecvTimeoutError::Timeout) => SlotPoll::Empty,
            Err(RecvTimeoutError::Disconnected) => SlotPoll::Vanished,
        }
    }
}
