// ── Test orchestrator ──
//
// Finite-state sequencing of a measurement run. One background task per
// sequence runs probe cycles, classifies them, captures positions, and
// hands each sample to the registered sink. State is published through a
// `watch` channel for presentation layers.

use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use strum::Display;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::geo::{self, Geolocator, NoGeolocation};
use crate::model::{Metrics, Sample, TestConfiguration, TestMode};
use crate::probes::ProbeSuite;
use crate::quality::{classify, color_of};
use crate::sink::{RunSummary, SampleSink};
use crate::wake::{NoWakeLock, WakeHold, WakeLock};

/// Runs in one static sequence.
pub const STATIC_RUN_COUNT: u32 = 5;
/// Pause between static runs. None follows the last run.
pub const STATIC_PAUSE: Duration = Duration::from_secs(1);
/// Pause between drive runs.
pub const DRIVE_PAUSE: Duration = Duration::from_secs(3);
/// Time spent in `Stopping` before `Saved`.
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

// ── RunState ─────────────────────────────────────────────────────

/// Lifecycle of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Ready,
    Recording,
    Stopping,
    Saved,
}

/// Read-only snapshot of the orchestrator.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RunState {
    pub status: RunStatus,
    /// 1-based number of the run in progress, or of the last run.
    pub loop_count: u32,
    pub current_metrics: Option<Metrics>,
    pub is_running: bool,
}

// ── Orchestrator ─────────────────────────────────────────────────

/// Drives static and drive test sequences.
///
/// Cheaply cloneable via `Arc<OrchestratorInner>`. At most one sequence
/// runs at a time.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<OrchestratorInner>,
}

struct OrchestratorInner {
    probes: Arc<Mutex<ProbeSuite>>,
    geolocator: Arc<dyn Geolocator>,
    wake_lock: Arc<dyn WakeLock>,
    shared: Arc<Shared>,
    /// The current (or last) sequence. Also serializes start/stop.
    sequence: Mutex<Option<Sequence>>,
}

/// State shared with the loop task.
struct Shared {
    state: watch::Sender<RunState>,
    wake_hold: StdMutex<Option<WakeHold>>,
}

struct Sequence {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Shared {
    fn set_wake_hold(&self, hold: WakeHold) {
        let previous = self
            .wake_hold
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(hold);
        drop(previous);
    }

    fn release_wake_hold(&self) {
        let hold = self
            .wake_hold
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(hold) = hold {
            hold.release();
            debug!("wake hold released");
        }
    }
}

impl Orchestrator {
    /// Orchestrator without positioning or wake facilities.
    pub fn new(probes: ProbeSuite) -> Self {
        Self::with_environment(probes, Arc::new(NoGeolocation), Arc::new(NoWakeLock))
    }

    pub fn with_environment(
        probes: ProbeSuite,
        geolocator: Arc<dyn Geolocator>,
        wake_lock: Arc<dyn WakeLock>,
    ) -> Self {
        let (state, _) = watch::channel(RunState::default());
        Self {
            inner: Arc::new(OrchestratorInner {
                probes: Arc::new(Mutex::new(probes)),
                geolocator,
                wake_lock,
                shared: Arc::new(Shared {
                    state,
                    wake_hold: StdMutex::new(None),
                }),
                sequence: Mutex::new(None),
            }),
        }
    }

    // ── Observation ──────────────────────────────────────────────

    /// Current state snapshot.
    pub fn state(&self) -> RunState {
        self.inner.shared.state.borrow().clone()
    }

    pub fn status(&self) -> RunStatus {
        self.inner.shared.state.borrow().status
    }

    pub fn is_running(&self) -> bool {
        self.inner.shared.state.borrow().is_running
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.inner.shared.state.subscribe()
    }

    /// State changes as a `Stream`, starting with the current value.
    pub fn state_stream(&self) -> WatchStream<RunState> {
        WatchStream::new(self.subscribe())
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Start a sequence.
    ///
    /// Returns `Ok(false)` without touching anything when a sequence is
    /// already running. The configuration is validated first; a rejected
    /// configuration leaves the state unchanged. Drive mode takes a wake
    /// hold on a best-effort basis.
    pub async fn start(
        &self,
        config: Arc<TestConfiguration>,
        sink: Arc<dyn SampleSink>,
    ) -> Result<bool, CoreError> {
        config.validate()?;

        let mut sequence = self.inner.sequence.lock().await;
        if self.is_running() {
            debug!("start ignored: sequence already running");
            return Ok(false);
        }

        let shared = &self.inner.shared;
        shared.state.send_modify(|s| {
            s.status = RunStatus::Recording;
            s.loop_count = 0;
            s.is_running = true;
        });
        info!(
            mode = %config.test_mode,
            operator = %config.operator_label,
            "sequence started"
        );

        if config.test_mode == TestMode::Drive {
            match self.inner.wake_lock.acquire().await {
                Ok(hold) => {
                    shared.set_wake_hold(hold);
                    debug!("wake hold acquired");
                }
                Err(e) => warn!(error = %e, "continuing without wake hold"),
            }
        }

        let cancel = CancellationToken::new();
        let ctx = LoopContext {
            probes: Arc::clone(&self.inner.probes),
            geolocator: Arc::clone(&self.inner.geolocator),
            shared: Arc::clone(shared),
        };
        let task = tokio::spawn(run_sequence(ctx, config, sink, cancel.clone()));
        *sequence = Some(Sequence { cancel, task });
        Ok(true)
    }

    /// Stop the running sequence and wait for it to settle in `Saved`.
    ///
    /// The probe cycle in flight finishes and its sample is delivered
    /// before the loop exits. No-op unless a sequence is recording.
    pub async fn stop(&self) {
        let mut slot = self.inner.sequence.lock().await;
        let state = self.state();
        if !state.is_running || state.status != RunStatus::Recording {
            debug!(status = %state.status, "stop ignored");
            return;
        }
        let Some(sequence) = slot.take() else {
            return;
        };

        info!(loop_count = state.loop_count, "stopping sequence");
        sequence.cancel.cancel();
        let shared = &self.inner.shared;
        shared.state.send_modify(|s| s.status = RunStatus::Stopping);
        shared.release_wake_hold();

        if let Err(e) = sequence.task.await {
            warn!(error = %e, "sequence task ended abnormally");
            shared.state.send_modify(|s| {
                s.status = RunStatus::Ready;
                s.is_running = false;
            });
        }
    }

    /// Return to `Ready`, clearing the run counter and last metrics.
    ///
    /// Only effective once a sequence has ended; emits no callbacks.
    pub fn reset(&self) -> bool {
        self.inner.shared.state.send_if_modified(|s| {
            if s.is_running || s.status == RunStatus::Ready {
                return false;
            }
            *s = RunState::default();
            true
        })
    }

    /// Wait until no sequence is running.
    pub async fn wait(&self) {
        let mut rx = self.subscribe();
        let _ = rx.wait_for(|s| !s.is_running).await;
    }

    /// Tear down immediately: cancel and abort the loop and release the
    /// wake hold. No completion is delivered.
    pub async fn shutdown(&self) {
        let mut slot = self.inner.sequence.lock().await;
        if let Some(sequence) = slot.take() {
            sequence.cancel.cancel();
            sequence.task.abort();
            let _ = sequence.task.await;
        }
        let shared = &self.inner.shared;
        shared.release_wake_hold();
        shared.state.send_if_modified(|s| {
            if !s.is_running {
                return false;
            }
            s.is_running = false;
            if matches!(s.status, RunStatus::Recording | RunStatus::Stopping) {
                s.status = RunStatus::Ready;
            }
            true
        });
        debug!("orchestrator shut down");
    }
}

impl Drop for OrchestratorInner {
    fn drop(&mut self) {
        if let Some(sequence) = self.sequence.get_mut().take() {
            sequence.cancel.cancel();
            sequence.task.abort();
        }
        self.shared.release_wake_hold();
    }
}

// ── Sequence loop ────────────────────────────────────────────────

struct LoopContext {
    probes: Arc<Mutex<ProbeSuite>>,
    geolocator: Arc<dyn Geolocator>,
    shared: Arc<Shared>,
}

async fn run_sequence(
    ctx: LoopContext,
    config: Arc<TestConfiguration>,
    sink: Arc<dyn SampleSink>,
    cancel: CancellationToken,
) {
    let mode = config.test_mode;
    let limit = match mode {
        TestMode::Static => Some(STATIC_RUN_COUNT),
        TestMode::Drive => None,
    };

    let mut runs = 0u32;
    {
        let mut probes = ctx.probes.lock().await;

        loop {
            if cancel.is_cancelled() {
                debug!(runs, "cancellation observed");
                break;
            }
            if limit.is_some_and(|limit| runs >= limit) {
                break;
            }

            let run = runs + 1;
            ctx.shared.state.send_modify(|s| s.loop_count = run);

            let metrics = probes.run_cycle().await;
            let color = color_of(classify(&metrics));
            ctx.shared
                .state
                .send_modify(|s| s.current_metrics = Some(metrics));

            let position = if mode == TestMode::Drive || run == 1 {
                geo::locate(ctx.geolocator.as_ref()).await
            } else {
                None
            };

            let sample = Sample {
                run,
                metrics,
                color,
                position,
                recorded_at: Utc::now(),
            };
            debug!(run, %color, has_position = position.is_some(), "run complete");
            sink.on_sample(sample).await;
            runs = run;

            let pause = match mode {
                TestMode::Static if run < STATIC_RUN_COUNT => Some(STATIC_PAUSE),
                TestMode::Static => None,
                TestMode::Drive => Some(DRIVE_PAUSE),
            };
            if let Some(pause) = pause {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => {}
                    () = tokio::time::sleep(pause) => {}
                }
            }
        }
    }

    ctx.shared
        .state
        .send_modify(|s| s.status = RunStatus::Stopping);
    ctx.shared.release_wake_hold();

    tokio::time::sleep(SETTLE_DELAY).await;

    ctx.shared.state.send_modify(|s| s.status = RunStatus::Saved);
    let summary = RunSummary {
        mode,
        runs,
        cancelled: cancel.is_cancelled(),
    };
    info!(runs, cancelled = summary.cancelled, "sequence saved");
    sink.on_complete(summary).await;

    ctx.shared.state.send_modify(|s| s.is_running = false);
}
