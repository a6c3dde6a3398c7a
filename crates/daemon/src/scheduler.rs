//! The per-backend scheduler loop: ticks every registered backend on its
//! own interval, coalesces `notify`-triggered passes into a single extra
//! run, and feeds every outcome through the engine crate's circuit
//! breaker, backoff, and consecutive-error cutoff.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::Mutex;
use todoat_core::{Ctx, Error, SystemClock};
use todoat_engine::{
    backoff_delay, run_with_timeout, stuck_operations, CircuitBreaker, CircuitState, Claim, ConsecutiveErrorCutoff,
    CutoffOutcome,
};
use todoat_wire::{BackendStatus, StatusSnapshot};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::shutdown::ShutdownKernel;

pub type SyncFuture = Pin<Box<dyn Future<Output = Result<(), Error>> + Send>>;
pub type SyncFn = Arc<dyn Fn(Ctx) -> SyncFuture + Send + Sync>;
/// Fired with `(backend_name, elapsed)` whenever a sync call is abandoned
/// for exceeding `task_timeout`.
pub type TimeoutCallback = Arc<dyn Fn(&str, Duration) + Send + Sync>;

/// A single registered backend, as in the daemon's per-backend state
/// table: name, how to sync it, its effective interval, and the
/// circuit/counters the scheduler updates on every attempt.
pub struct BackendEntry {
    pub name: String,
    sync_fn: SyncFn,
    pub interval: Duration,
    #[allow(dead_code)]
    pub background_pull_cooldown: Option<Duration>,
    last_sync: Mutex<Option<Instant>>,
    last_sync_rfc3339: Mutex<Option<String>>,
    sync_count: AtomicU64,
    error_count: AtomicU64,
    last_error: Mutex<Option<String>>,
    circuit: CircuitBreaker<SystemClock>,
    run_lock: tokio::sync::Mutex<()>,
}

impl BackendEntry {
    pub fn new(name: impl Into<String>, interval: Duration, sync_fn: SyncFn) -> Self {
        Self {
            name: name.into(),
            sync_fn,
            interval,
            background_pull_cooldown: None,
            last_sync: Mutex::new(None),
            last_sync_rfc3339: Mutex::new(None),
            sync_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
            last_error: Mutex::new(None),
            circuit: CircuitBreaker::with_defaults(SystemClock),
            run_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.background_pull_cooldown = Some(cooldown);
        self
    }

    fn due(&self, now: Instant) -> bool {
        match *self.last_sync.lock() {
            None => true,
            Some(last) => now.duration_since(last) >= self.interval,
        }
    }

    fn status(&self) -> BackendStatus {
        BackendStatus {
            sync_count: self.sync_count.load(Ordering::SeqCst),
            error_count: self.error_count.load(Ordering::SeqCst),
            last_sync: self.last_sync_rfc3339.lock().clone(),
            last_error: self.last_error.lock().clone(),
            circuit_state: wire_circuit_state(self.circuit.state()),
        }
    }

    pub fn sync_count(&self) -> u64 {
        self.sync_count.load(Ordering::SeqCst)
    }

    pub fn error_count(&self) -> u64 {
        self.error_count.load(Ordering::SeqCst)
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.circuit.state()
    }
}

fn wire_circuit_state(state: CircuitState) -> todoat_wire::CircuitState {
    match state {
        CircuitState::Closed => todoat_wire::CircuitState::Closed,
        CircuitState::Open => todoat_wire::CircuitState::Open,
        CircuitState::HalfOpen => todoat_wire::CircuitState::HalfOpen,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncOutcome {
    Success,
    Failure,
    Blocked,
}

/// Drives every registered backend's periodic reconciliation. Owns the
/// global consecutive-error cutoff and the notify-coalescing channel; the
/// per-backend circuit breakers live on each `BackendEntry`.
pub struct Scheduler {
    entries: Vec<Arc<BackendEntry>>,
    cutoff: ConsecutiveErrorCutoff,
    consecutive_all_fail_ticks: AtomicU32,
    task_timeout: Option<Duration>,
    default_interval: Duration,
    notify_tx: mpsc::Sender<()>,
    notify_rx: Mutex<Option<mpsc::Receiver<()>>>,
    last_activity: Mutex<Instant>,
    started_at: Instant,
    started_at_rfc3339: String,
    on_task_timeout: Mutex<Option<TimeoutCallback>>,
    /// In-flight sync calls, keyed by backend name: the daemon's own
    /// "claims" table for stuck-task detection. Entered just before the
    /// sync call starts, removed as soon as `run_with_timeout` resolves —
    /// a claim only outlives `task_timeout` when `task_timeout` itself is
    /// disabled and the backend hangs.
    claims: Mutex<BTreeMap<String, Instant>>,
}

impl Scheduler {
    pub fn new(entries: Vec<Arc<BackendEntry>>, default_interval: Duration, task_timeout: Option<Duration>) -> Arc<Self> {
        // A single-slot channel: a second `notify()` while one is already
        // pending collapses into it rather than queuing, matching the
        // "mutex + single boolean pending flag" coalescing model.
        let (notify_tx, notify_rx) = mpsc::channel(1);
        Arc::new(Self {
            entries,
            cutoff: ConsecutiveErrorCutoff::with_default_threshold(),
            consecutive_all_fail_ticks: AtomicU32::new(0),
            task_timeout,
            default_interval,
            notify_tx,
            notify_rx: Mutex::new(Some(notify_rx)),
            last_activity: Mutex::new(Instant::now()),
            started_at: Instant::now(),
            started_at_rfc3339: Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Nanos, true),
            on_task_timeout: Mutex::new(None),
            claims: Mutex::new(BTreeMap::new()),
        })
    }

    /// Backends whose claim has outlived `stuck_timeout`. `daemon_alive`
    /// stands in for "is the claiming worker still alive" (spec.md's
    /// per-worker heartbeat check, reduced to this daemon's own heartbeat
    /// since there is exactly one claimant): when the daemon's own
    /// heartbeat is stale, every outstanding claim is reported stuck.
    pub fn stuck_backends(&self, stuck_timeout: Duration, daemon_alive: bool) -> Vec<String> {
        let now = Instant::now();
        let claims: Vec<Claim> = self
            .claims
            .lock()
            .iter()
            .map(|(name, claimed_at)| Claim { operation_id: name.clone(), worker_id: "daemon".into(), claimed_at: *claimed_at })
            .collect();
        stuck_operations(&claims, now, stuck_timeout, |_worker_id| daemon_alive)
            .into_iter()
            .map(|claim| claim.operation_id.clone())
            .collect()
    }

    /// Enqueue a coalesced sync pass. Returns immediately once enqueued (or
    /// immediately if one is already pending — that's the point).
    pub fn notify(&self) {
        let _ = self.notify_tx.try_send(());
    }

    /// Registers the callback fired with `(backend_name, elapsed)` on every
    /// per-task timeout. Replaces any callback registered earlier.
    pub fn set_on_task_timeout(&self, callback: TimeoutCallback) {
        *self.on_task_timeout.lock() = Some(callback);
    }

    pub fn status_response(&self) -> StatusSnapshot {
        let mut backends = BTreeMap::new();
        for entry in &self.entries {
            backends.insert(entry.name.clone(), entry.status());
        }
        let sync_count = self.entries.iter().map(|e| e.sync_count()).sum();
        StatusSnapshot {
            running: true,
            pid: std::process::id(),
            started_at: self.started_at_rfc3339.clone(),
            interval_sec: self.default_interval.as_secs(),
            sync_count,
            backends,
        }
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.lock().elapsed()
    }

    fn touch_activity(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    /// Main scheduler loop. Ticks on the shortest remaining interval among
    /// backends, and wakes early on a coalesced notify. Runs until `kernel`
    /// is cancelled (including self-cancellation via the consecutive-error
    /// cutoff, which this loop drives by calling `kernel.shutdown()` itself).
    pub async fn run(self: Arc<Self>, kernel: &'static ShutdownKernel, shutdown_deadline: Duration) {
        let mut notify_rx = self.notify_rx.lock().take().expect("Scheduler::run called more than once");
        let token = kernel.token();
        loop {
            let tick_delay = self.next_tick_delay();
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(tick_delay) => {
                    self.touch_activity();
                    if self.run_pass(&kernel, true).await {
                        let _ = kernel.shutdown(shutdown_deadline).await;
                        break;
                    }
                }
                Some(()) = notify_rx.recv() => {
                    self.touch_activity();
                    if self.run_pass(&kernel, false).await {
                        let _ = kernel.shutdown(shutdown_deadline).await;
                        break;
                    }
                }
            }
        }
    }

    fn next_tick_delay(&self) -> Duration {
        let now = Instant::now();
        self.entries
            .iter()
            .map(|entry| {
                let last = *entry.last_sync.lock();
                match last {
                    None => Duration::ZERO,
                    Some(last) => entry.interval.saturating_sub(now.duration_since(last)),
                }
            })
            .min()
            .unwrap_or(self.default_interval)
    }

    /// Runs one pass over backends (`due_only` for a scheduled tick, all of
    /// them for a notify). Returns `true` if the pass tripped the
    /// consecutive-error cutoff and the caller should stop the loop.
    async fn run_pass(&self, kernel: &'static ShutdownKernel, due_only: bool) -> bool {
        let now = Instant::now();
        let mut any_success = false;
        let mut any_attempted = false;

        for entry in &self.entries {
            if kernel.is_shutting_down() {
                return false;
            }
            if due_only && !entry.due(now) {
                continue;
            }
            any_attempted = true;
            let (outcome, cutoff_outcome) = self.perform_backend_sync(entry).await;
            match outcome {
                SyncOutcome::Success => {
                    any_success = true;
                    self.consecutive_all_fail_ticks.store(0, Ordering::SeqCst);
                }
                SyncOutcome::Failure | SyncOutcome::Blocked => {}
            }
            if cutoff_outcome == CutoffOutcome::ShutDown {
                warn!("consecutive error cutoff reached; initiating graceful shutdown");
                return true;
            }
        }

        if any_attempted && !any_success {
            let n = self.consecutive_all_fail_ticks.fetch_add(1, Ordering::SeqCst) + 1;
            let delay = backoff_delay(n);
            let token = kernel.token();
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {}
            }
        }

        kernel.is_shutting_down()
    }

    /// Step-by-step as in the daemon's per-backend sync procedure:
    /// 1. ask the circuit breaker; 2/3. race the sync call against
    /// `task_timeout`; 4/5. record the outcome on both the entry and the
    /// global consecutive-error cutoff.
    async fn perform_backend_sync(&self, entry: &Arc<BackendEntry>) -> (SyncOutcome, CutoffOutcome) {
        let _guard = entry.run_lock.lock().await;

        if !entry.circuit.allow() {
            return (SyncOutcome::Blocked, self.cutoff.record_failure());
        }

        let ctx = Ctx::new();
        let started = Instant::now();
        self.claims.lock().insert(entry.name.clone(), started);
        let result = run_with_timeout(self.task_timeout, (entry.sync_fn)(ctx)).await;
        self.claims.lock().remove(&entry.name);

        match result {
            Ok(()) => {
                entry.circuit.record_success();
                entry.sync_count.fetch_add(1, Ordering::SeqCst);
                *entry.last_error.lock() = None;
                *entry.last_sync.lock() = Some(Instant::now());
                *entry.last_sync_rfc3339.lock() = Some(Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Nanos, true));
                self.cutoff.record_success();
                info!(
                    backend = %entry.name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "backend sync succeeded"
                );
                (SyncOutcome::Success, CutoffOutcome::Continue)
            }
            Err(err) => {
                entry.circuit.record_failure();
                entry.error_count.fetch_add(1, Ordering::SeqCst);
                *entry.last_error.lock() = Some(err.to_string());
                let outcome = self.cutoff.record_failure();
                let elapsed = started.elapsed();
                if matches!(err, Error::Timeout) {
                    if let Some(callback) = self.on_task_timeout.lock().as_ref() {
                        callback(&entry.name, elapsed);
                    }
                }
                warn!(
                    backend = %entry.name,
                    circuit_state = ?entry.circuit.state(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %err,
                    "backend sync failed"
                );
                (SyncOutcome::Failure, outcome)
            }
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
