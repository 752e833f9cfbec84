//! Lifecycle controller for the notification worker.
//!
//! [`NotificationWorker`] exposes the three entry points the host process
//! drives:
//!
//! - [`start`](NotificationWorker::start) - apply network defaults, start the
//!   health endpoint, spawn the heartbeat task, log the safe config subset
//! - [`run`](NotificationWorker::run) - block until the heartbeat task exits
//! - [`stop`](NotificationWorker::stop) - cancel, close the endpoint and wait
//!   for the heartbeat task
//!
//! # State Machine
//!
//! ```text
//! NotStarted --start--> Running --stop--> StopRequested --(loop exit + endpoint closed)--> Stopped
//! NotStarted --stop--> Stopped
//! ```
//!
//! `Stopped` is terminal. Transitions are compare-and-swap on an atomic, so
//! concurrent callers of `start`/`stop` cannot both win.
//!
//! # Completion Signal
//!
//! The spawned heartbeat task owns a drop guard on the completion token. The
//! guard fires when the loop returns or unwinds, so `stop()` waits for the
//! loop itself, not for whichever `run()` future happened to be awaiting it.
//! Dropping a `run()` future early does not release `stop()`.
//!
//! Every `stop()` call returns only once the worker is `Stopped`; callers that
//! lose the race wait on a second token released by the winning call.

use crate::config::Config;
use crate::errors::NsError;
use crate::observability::health::{HealthEndpointState, HealthServer};
use crate::observability::metrics::record_lifecycle_transition;
use crate::observability::recorder::HealthRecorder;
use crate::tasks::heartbeat::{run_heartbeat_loop, HeartbeatSink, TracingHeartbeatSink};
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn, Instrument};

/// Lifecycle state of a [`NotificationWorker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    NotStarted = 0,
    Running = 1,
    StopRequested = 2,
    Stopped = 3,
}

impl LifecycleState {
    /// Returns the state as a string for log fields and metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::NotStarted => "NotStarted",
            LifecycleState::Running => "Running",
            LifecycleState::StopRequested => "StopRequested",
            LifecycleState::Stopped => "Stopped",
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => LifecycleState::NotStarted,
            1 => LifecycleState::Running,
            2 => LifecycleState::StopRequested,
            _ => LifecycleState::Stopped,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Background worker with heartbeat loop and health endpoint.
pub struct NotificationWorker {
    config: Config,
    sink: Arc<dyn HeartbeatSink>,
    recorder: Arc<HealthRecorder>,
    state: AtomicU8,
    /// Shared stop signal observed by every task.
    cancel_token: CancellationToken,
    /// Released when the heartbeat task exits, by return or unwind.
    run_complete: CancellationToken,
    /// Released when the worker reaches `Stopped`.
    stopped: CancellationToken,
    /// Held for the whole of `start()`; `stop()` waits on it so it never
    /// observes a half-started worker.
    startup: Mutex<()>,
    heartbeat_task: Mutex<Option<JoinHandle<()>>>,
    health_server: Mutex<Option<HealthServer>>,
    health_addr: OnceLock<SocketAddr>,
}

impl fmt::Debug for NotificationWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationWorker")
            .field("service_name", &self.config.service_name)
            .field("state", &self.state())
            .field("health_addr", &self.health_addr())
            .finish_non_exhaustive()
    }
}

impl NotificationWorker {
    /// Create a worker that logs heartbeats through `tracing`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_sink(config, Arc::new(TracingHeartbeatSink))
    }

    /// Create a worker delivering heartbeats to `sink`.
    #[must_use]
    pub fn with_sink(config: Config, sink: Arc<dyn HeartbeatSink>) -> Self {
        let recorder = Arc::new(HealthRecorder::new(config.service_name.clone()));
        Self {
            config,
            sink,
            recorder,
            state: AtomicU8::new(LifecycleState::NotStarted as u8),
            cancel_token: CancellationToken::new(),
            run_complete: CancellationToken::new(),
            stopped: CancellationToken::new(),
            startup: Mutex::new(()),
            heartbeat_task: Mutex::new(None),
            health_server: Mutex::new(None),
            health_addr: OnceLock::new(),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Address the health endpoint bound at startup. `None` before `start`
    /// or when binding failed.
    #[must_use]
    pub fn health_addr(&self) -> Option<SocketAddr> {
        self.health_addr.get().copied()
    }

    /// Child of the worker's stop signal, for tasks owned by the host.
    #[must_use]
    pub fn child_token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn transition(&self, from: LifecycleState, to: LifecycleState) -> bool {
        let moved = self
            .state
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if moved {
            record_lifecycle_transition(to.as_str());
        }
        moved
    }

    /// Start the worker.
    ///
    /// Returns `true` when the worker moved to `Running`. Every startup step
    /// is best-effort: failures are logged and startup continues. Returns
    /// `false` only when the worker was not in `NotStarted`.
    #[instrument(skip_all, name = "ns.lifecycle.start", fields(service = %self.config.service_name))]
    pub async fn start(&self) -> bool {
        let _startup = self.startup.lock().await;

        if !self.transition(LifecycleState::NotStarted, LifecycleState::Running) {
            warn!(
                target: "ns.lifecycle",
                state = %self.state(),
                "Start ignored: worker already started"
            );
            return false;
        }

        // (a) Process-wide network defaults, logged only
        match self.config.network.apply() {
            Ok(applied) => info!(
                target: "ns.lifecycle",
                min_tls_version = %applied.defaults.min_tls_version,
                max_outbound_connections = applied.defaults.max_outbound_connections,
                "Network defaults applied"
            ),
            Err(e) => warn!(
                target: "ns.lifecycle",
                error = %e,
                "Failed to apply network defaults"
            ),
        }

        // (b) Health endpoint, best-effort
        self.start_health_endpoint().await;

        // (c) Heartbeat task
        let complete = self.run_complete.clone().drop_guard();
        let heartbeat_loop = run_heartbeat_loop(
            Arc::clone(&self.recorder),
            Arc::clone(&self.sink),
            self.config.heartbeat_interval,
            self.cancel_token.clone(),
        );
        let heartbeat = tokio::spawn(
            async move {
                let _complete = complete;
                heartbeat_loop.await;
            }
            .instrument(tracing::info_span!("ns.task.heartbeat")),
        );
        *self.heartbeat_task.lock().await = Some(heartbeat);
        info!(
            target: "ns.lifecycle",
            interval_ms = u64::try_from(self.config.heartbeat_interval.as_millis()).unwrap_or(u64::MAX),
            "Heartbeat task started"
        );

        // (d) Safe configuration subset
        self.log_configuration();

        info!(target: "ns.lifecycle", "Notification Service has been started");
        true
    }

    async fn start_health_endpoint(&self) {
        let addr = self.config.health_bind_address();
        let state = Arc::new(HealthEndpointState {
            health_path: self.config.health_path.clone(),
            recorder: Arc::clone(&self.recorder),
        });

        match HealthServer::start(addr, state, &self.cancel_token).await {
            Ok(server) => {
                if self.health_addr.set(server.local_addr()).is_err() {
                    debug!(target: "ns.lifecycle", "Health endpoint address already recorded");
                }
                info!(
                    target: "ns.lifecycle",
                    addr = %server.local_addr(),
                    path = %self.config.health_path,
                    allocated = self.config.health_endpoint.is_some(),
                    "Health endpoint started"
                );
                *self.health_server.lock().await = Some(server);
            }
            Err(e) => {
                warn!(
                    target: "ns.lifecycle",
                    error = %e,
                    "Failed to start health endpoint, continuing without it"
                );
            }
        }
    }

    fn log_configuration(&self) {
        match self.config.notifications_queue_name.as_deref() {
            Some(queue) => info!(
                target: "ns.lifecycle",
                notifications_queue_name = queue,
                "Config: notifications queue"
            ),
            None => info!(
                target: "ns.lifecycle",
                "Config: notifications queue not configured"
            ),
        }
    }

    /// Block until the heartbeat task exits.
    ///
    /// Returns `Ok(())` after a cooperative shutdown. Dropping the returned
    /// future detaches the heartbeat task without stopping it. A panic inside the
    /// heartbeat loop is returned as [`NsError::HeartbeatFailed`]. Calling
    /// `run` before `start`, or while another `run` owns the heartbeat task,
    /// returns [`NsError::NotRunning`].
    #[instrument(skip_all, name = "ns.lifecycle.run", fields(service = %self.config.service_name))]
    pub async fn run(&self) -> Result<(), NsError> {
        let Some(heartbeat) = self.heartbeat_task.lock().await.take() else {
            if self.cancel_token.is_cancelled() {
                // stop() already reaped the task
                return Ok(());
            }
            return Err(NsError::NotRunning);
        };

        info!(target: "ns.lifecycle", "Notification Service is running");

        heartbeat.await.map_err(|e| {
            error!(target: "ns.lifecycle", error = %e, "Heartbeat task ended abnormally");
            NsError::HeartbeatFailed(e.to_string())
        })
    }

    /// Stop the worker and wait for every component to finish.
    ///
    /// Only the first call does the work. Concurrent calls wait until the
    /// worker is `Stopped`; calls after that return immediately. Safe to call
    /// when `start` never ran or partially failed.
    #[instrument(skip_all, name = "ns.lifecycle.stop", fields(service = %self.config.service_name))]
    pub async fn stop(&self) {
        if self.transition(LifecycleState::NotStarted, LifecycleState::Stopped) {
            self.cancel_token.cancel();
            self.stopped.cancel();
            info!(target: "ns.lifecycle", "Notification Service stopped before it was started");
            return;
        }

        if !self.transition(LifecycleState::Running, LifecycleState::StopRequested) {
            info!(
                target: "ns.lifecycle",
                state = %self.state(),
                "Stop already requested, waiting for shutdown to complete"
            );
            self.stopped.cancelled().await;
            return;
        }

        info!(target: "ns.lifecycle", "Notification Service is stopping");
        self.cancel_token.cancel();

        // Let an in-progress start() finish; its tasks see the cancelled token
        drop(self.startup.lock().await);

        // Release the listening socket
        let server = self.health_server.lock().await.take();
        if let Some(server) = server {
            server.close().await;
        }

        // Reap the heartbeat task if run() never claimed it, then wait for the
        // loop's completion guard either way.
        let unclaimed = self.heartbeat_task.lock().await.take();
        if let Some(heartbeat) = unclaimed {
            if let Err(e) = heartbeat.await {
                warn!(target: "ns.lifecycle", error = %e, "Heartbeat task ended abnormally");
            }
        }
        self.run_complete.cancelled().await;

        self.transition(LifecycleState::StopRequested, LifecycleState::Stopped);
        self.stopped.cancel();
        info!(target: "ns.lifecycle", "Notification Service has stopped");
    }
}
