// ABOUTME: Boot lifecycle orchestration with deadline and emergency failsafe timers
// ABOUTME: Owns BootState and produces the signal that un-gates the application shell
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2026 Stride Labs

//! Boot Lifecycle Orchestration
//!
//! This module provides the time-bounded boot state machine:
//! - A deadline timer whose expiry is the *only* normal path out of the
//!   loading state
//! - Background readiness checks that race the deadline and never gate it
//! - An emergency failsafe timer guarding the deadline path itself
//! - A recovery flow for the pathological case where both paths stall
//!
//! At most one of the two timers may cause a state transition per boot
//! attempt: whichever fires first while the state is still `Booting` wins,
//! and the loser is canceled so a delayed, now-irrelevant expiry is a
//! no-op.

use crate::background::{BackgroundChecks, BackgroundStatus};
use crate::config::BootConfig;
use crate::constants::defaults;
use crate::errors::BootResult;
use crate::recovery::RecoveryFlow;
use crate::session::SessionStore;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Boot lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BootState {
    /// Loading screen is up; timers and background checks are running
    Booting,
    /// The application shell has been released
    Ready,
    /// The failsafe fired; the user is offered retry or guest continue
    Recovery,
}

impl std::fmt::Display for BootState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Booting => write!(f, "booting"),
            Self::Ready => write!(f, "ready"),
            Self::Recovery => write!(f, "recovery"),
        }
    }
}

/// Fault-injection switches for watchdog drills
///
/// `start` arms everything; dropping the deadline simulates a lost timer
/// callback so the emergency failsafe path can be exercised end to end.
/// Use sparingly - this should typically only be called from tests or
/// chaos drills, never in a shipping boot path.
#[derive(Debug, Clone, Copy, Default)]
pub struct BootFaults {
    /// Do not arm the deadline timer for this attempt
    pub drop_deadline: bool,
}

/// Callback fired exactly once per successful transition into `Ready`
pub type ReadySignal = Box<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct AttemptTasks {
    deadline: Option<JoinHandle<()>>,
    failsafe: Option<JoinHandle<()>>,
    runner: Option<JoinHandle<()>>,
}

impl AttemptTasks {
    fn abort_timers(&mut self) {
        if let Some(handle) = self.deadline.take() {
            handle.abort();
        }
        if let Some(handle) = self.failsafe.take() {
            handle.abort();
        }
    }

    fn abort_runner(&mut self) {
        if let Some(handle) = self.runner.take() {
            handle.abort();
        }
    }

    fn abort_all(&mut self) {
        self.abort_timers();
        self.abort_runner();
    }
}

pub(crate) struct OrchestratorInner {
    pub(crate) config: BootConfig,
    pub(crate) session: SessionStore,
    pub(crate) checks: BackgroundChecks,
    client: reqwest::Client,
    state_tx: watch::Sender<BootState>,
    attempt: AtomicU64,
    started: AtomicBool,
    ready_signal: Option<ReadySignal>,
    tasks: Mutex<AttemptTasks>,
}

impl OrchestratorInner {
    pub(crate) fn state(&self) -> BootState {
        *self.state_tx.borrow()
    }

    pub(crate) fn attempt(&self) -> u64 {
        self.attempt.load(Ordering::SeqCst)
    }

    fn lock_tasks(&self) -> MutexGuard<'_, AttemptTasks> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a state transition for the given boot attempt
    ///
    /// Returns `false` without side effects when the attempt is stale, the
    /// transition is not in the allowed set, or another cause already won
    /// this attempt. On leaving `Booting` both timers are canceled; the
    /// background runner is canceled only when the attempt failed into
    /// `Recovery` — after a normal `Ready` it may finish settling for
    /// telemetry.
    fn transition(&self, attempt: u64, to: BootState, cause: &'static str) -> bool {
        let from;
        {
            let mut tasks = self.lock_tasks();
            if self.attempt.load(Ordering::SeqCst) != attempt {
                return false;
            }
            from = *self.state_tx.borrow();
            let allowed = matches!(
                (from, to),
                (BootState::Booting, BootState::Ready)
                    | (BootState::Booting, BootState::Recovery)
                    | (BootState::Recovery, BootState::Ready)
            );
            if !allowed {
                return false;
            }
            if from == BootState::Booting {
                tasks.abort_timers();
                if to == BootState::Recovery {
                    tasks.abort_runner();
                }
            }
            self.state_tx.send_replace(to);
        }

        info!(
            boot.attempt = attempt,
            transition.cause = cause,
            transition.from = %from,
            transition.to = %to,
            "Boot state transition"
        );

        if to == BootState::Ready {
            if let Some(signal) = &self.ready_signal {
                signal();
            }
        }
        true
    }

    /// Arm one boot attempt: reset status, launch the runner and timers
    fn arm(self: &Arc<Self>, faults: BootFaults) {
        let attempt = self.attempt.load(Ordering::SeqCst);
        let epoch = self.checks.begin_attempt();
        let boot_id = Uuid::new_v4();

        info!(
            boot.attempt = attempt,
            boot.id = %boot_id,
            deadline_ms = self.config.deadline.as_millis() as u64,
            failsafe_ms = self.config.failsafe.as_millis() as u64,
            backend_configured = self.config.has_backend(),
            "Boot attempt started"
        );

        let runner = {
            let inner = Arc::clone(self);
            tokio::spawn(async move {
                let token = inner.session.stored_token();
                inner
                    .checks
                    .run(&inner.client, &inner.config, token.as_deref(), epoch)
                    .await;
            })
        };

        let deadline = if faults.drop_deadline {
            warn!(
                boot.attempt = attempt,
                "Deadline timer dropped by fault injection"
            );
            None
        } else {
            let inner = Arc::clone(self);
            Some(tokio::spawn(async move {
                tokio::time::sleep(inner.config.deadline).await;
                if inner.transition(attempt, BootState::Ready, "deadline") {
                    let status = inner.checks.snapshot();
                    info!(
                        boot.attempt = attempt,
                        health.checked = status.health_checked,
                        health.ok = status.health_ok,
                        token.restored = status.token_restored,
                        token.valid = status.token_valid,
                        "Deadline elapsed, app shell released"
                    );
                }
            }))
        };

        let failsafe = {
            let inner = Arc::clone(self);
            tokio::spawn(async move {
                tokio::time::sleep(inner.config.failsafe).await;
                if inner.transition(attempt, BootState::Recovery, "failsafe") {
                    error!(
                        boot.attempt = attempt,
                        failsafe_ms = inner.config.failsafe.as_millis() as u64,
                        "Emergency failsafe fired, boot stalled in loading state"
                    );
                }
            })
        };

        let mut tasks = self.lock_tasks();
        tasks.deadline = deadline;
        tasks.failsafe = Some(failsafe);
        tasks.runner = Some(runner);
    }

    /// User-initiated retry from the recovery screen
    ///
    /// Fully resets per-attempt state before re-entering `Booting`:
    /// lingering tasks are aborted, the status record is re-initialized by
    /// `arm`, and both timers are re-armed fresh.
    pub(crate) fn retry(self: &Arc<Self>) -> bool {
        {
            let mut tasks = self.lock_tasks();
            if *self.state_tx.borrow() != BootState::Recovery {
                return false;
            }
            tasks.abort_all();
            self.attempt.fetch_add(1, Ordering::SeqCst);
            self.state_tx.send_replace(BootState::Booting);
        }
        info!(boot.attempt = self.attempt(), "Retrying boot from recovery");
        self.arm(BootFaults::default());
        true
    }

    /// User-initiated guest continue
    ///
    /// Transitions straight to `Ready` without re-running checks and
    /// durably records guest mode. A failed flag write is logged and
    /// swallowed: it only costs a future boot one redundant credential
    /// probe, never current correctness.
    pub(crate) fn continue_as_guest(self: &Arc<Self>) -> bool {
        let attempt = self.attempt.load(Ordering::SeqCst);
        if !self.transition(attempt, BootState::Ready, "guest-continue") {
            return false;
        }
        if let Err(e) = self.session.set_guest() {
            warn!(
                boot.attempt = attempt,
                "Failed to persist guest mode: {e}"
            );
        }
        true
    }
}

/// Boot orchestrator owning the lifecycle state machine
///
/// Construct once at app start, register the ready signal, call
/// [`BootOrchestrator::start`], and render the loading screen until the
/// state leaves [`BootState::Booting`]. The deadline timer bounds
/// time-to-interactive regardless of backend conditions; see the module
/// docs for the transition rules.
pub struct BootOrchestrator {
    inner: Arc<OrchestratorInner>,
}

impl BootOrchestrator {
    /// Create an orchestrator with no ready signal
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation or the
    /// shared HTTP client cannot be built.
    pub fn new(config: BootConfig) -> BootResult<Self> {
        Self::build(config, None)
    }

    /// Create an orchestrator that fires `signal` once per transition
    /// into [`BootState::Ready`]
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation or the
    /// shared HTTP client cannot be built.
    pub fn with_ready_signal(config: BootConfig, signal: ReadySignal) -> BootResult<Self> {
        Self::build(config, Some(signal))
    }

    fn build(config: BootConfig, ready_signal: Option<ReadySignal>) -> BootResult<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.probe_timeout)
            .connect_timeout(Duration::from_secs(defaults::CONNECT_TIMEOUT_SECS))
            .build()?;

        let session = SessionStore::new(config.session_path.clone());
        let (state_tx, _rx) = watch::channel(BootState::Booting);

        Ok(Self {
            inner: Arc::new(OrchestratorInner {
                config,
                session,
                checks: BackgroundChecks::new(),
                client,
                state_tx,
                attempt: AtomicU64::new(0),
                started: AtomicBool::new(false),
                ready_signal,
                tasks: Mutex::new(AttemptTasks::default()),
            }),
        })
    }

    /// Begin the first boot attempt
    ///
    /// Must be called from within a tokio runtime. Subsequent calls are
    /// ignored; restarting the sequence is the recovery flow's job.
    pub fn start(&self) {
        self.start_with_faults(BootFaults::default());
    }

    /// Begin the first boot attempt with fault injection applied
    ///
    /// Equivalent to [`BootOrchestrator::start`] when `faults` is the
    /// default. See [`BootFaults`] for the intended uses.
    pub fn start_with_faults(&self, faults: BootFaults) {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            warn!("Boot orchestrator already started, ignoring");
            return;
        }
        self.inner.attempt.store(1, Ordering::SeqCst);
        self.inner.arm(faults);
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> BootState {
        self.inner.state()
    }

    /// Subscribe to lifecycle state changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<BootState> {
        self.inner.state_tx.subscribe()
    }

    /// Advisory snapshot of the background checks for the current attempt
    #[must_use]
    pub fn background_status(&self) -> BackgroundStatus {
        self.inner.checks.snapshot()
    }

    /// Subscribe to background check updates
    #[must_use]
    pub fn subscribe_background(&self) -> watch::Receiver<BackgroundStatus> {
        self.inner.checks.subscribe()
    }

    /// Current boot attempt number, starting at 1 after `start`
    #[must_use]
    pub fn attempt(&self) -> u64 {
        self.inner.attempt()
    }

    /// Whether a previous boot durably chose guest mode
    #[must_use]
    pub fn guest_mode(&self) -> bool {
        self.inner.session.is_guest()
    }

    /// Handle exposing the user-facing recovery actions
    #[must_use]
    pub fn recovery(&self) -> RecoveryFlow {
        RecoveryFlow::new(Arc::clone(&self.inner))
    }
}

impl Drop for BootOrchestrator {
    /// Teardown cancels everything still pending so a stale timer or
    /// probe cannot fire after the owning shell is gone
    fn drop(&mut self) {
        self.inner.lock_tasks().abort_all();
    }
}
