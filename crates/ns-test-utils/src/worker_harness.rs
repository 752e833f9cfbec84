//! Worker harness for E2E testing
//!
//! Provides `TestWorker` for running a real `NotificationWorker` in tests.

use crate::sinks::RecordingSink;
use ns_service::config::Config;
use ns_service::errors::NsError;
use ns_service::tasks::HeartbeatSink;
use ns_service::NotificationWorker;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Heartbeat interval used by [`test_config`].
pub const TEST_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

/// Configuration for tests: ephemeral loopback port, fast heartbeats.
pub fn test_config() -> Config {
    Config {
        health_endpoint: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
        heartbeat_interval: TEST_HEARTBEAT_INTERVAL,
        ..Config::default()
    }
}

/// HTTP client for probing the health endpoint.
///
/// Idle connections are not pooled, so every request opens a fresh
/// connection and a closed listener shows up as a connect error.
pub fn probe_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .timeout(Duration::from_secs(5))
        .build()
        .expect("Failed to build probe client")
}

/// Test harness driving a `NotificationWorker` the way the binary does:
/// `start()`, then `run()` on a background task, then `stop()`.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health_flow_e2e() -> Result<(), anyhow::Error> {
///     let worker = TestWorker::spawn().await?;
///
///     let response = reqwest::get(worker.health_url()).await?;
///     assert_eq!(response.status(), 200);
///
///     worker.stop().await?;
///     Ok(())
/// }
/// ```
pub struct TestWorker {
    worker: Arc<NotificationWorker>,
    sink: Arc<RecordingSink>,
    run_handle: Option<JoinHandle<Result<(), NsError>>>,
}

impl TestWorker {
    /// Spawn a worker with [`test_config`].
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with(test_config()).await
    }

    /// Spawn a worker with the given configuration and a recording sink.
    pub async fn spawn_with(config: Config) -> Result<Self, anyhow::Error> {
        let sink = Arc::new(RecordingSink::new());
        Self::spawn_with_sink(config, Arc::clone(&sink) as Arc<dyn HeartbeatSink>, sink).await
    }

    /// Spawn a worker delivering heartbeats to `heartbeat_sink`.
    ///
    /// `recording` is exposed through [`TestWorker::sink`]; pass the same
    /// sink for both unless the test supplies its own failing sink.
    pub async fn spawn_with_sink(
        config: Config,
        heartbeat_sink: Arc<dyn HeartbeatSink>,
        recording: Arc<RecordingSink>,
    ) -> Result<Self, anyhow::Error> {
        let worker = Arc::new(NotificationWorker::with_sink(config, heartbeat_sink));

        if !worker.start().await {
            anyhow::bail!("worker refused to start (state {})", worker.state());
        }

        let run_worker = Arc::clone(&worker);
        let run_handle = tokio::spawn(async move { run_worker.run().await });

        Ok(Self {
            worker,
            sink: recording,
            run_handle: Some(run_handle),
        })
    }

    /// The worker under test.
    pub fn worker(&self) -> &Arc<NotificationWorker> {
        &self.worker
    }

    /// Sink receiving the worker's heartbeats.
    pub fn sink(&self) -> &Arc<RecordingSink> {
        &self.sink
    }

    /// Bound health endpoint address, `None` if binding failed.
    pub fn health_addr(&self) -> Option<SocketAddr> {
        self.worker.health_addr()
    }

    /// URL for `path` on the health endpoint.
    ///
    /// # Panics
    ///
    /// Panics if the health endpoint is not bound.
    pub fn url(&self, path: &str) -> String {
        let addr = self
            .health_addr()
            .expect("health endpoint should be bound");
        format!("http://{addr}{path}")
    }

    /// URL of the configured health path.
    pub fn health_url(&self) -> String {
        self.url(&self.worker.config().health_path)
    }

    /// Stop the worker and return what `run()` returned.
    pub async fn stop(mut self) -> Result<Result<(), NsError>, anyhow::Error> {
        self.worker.stop().await;
        let handle = self
            .run_handle
            .take()
            .ok_or_else(|| anyhow::anyhow!("run task already taken"))?;
        Ok(handle.await?)
    }

    /// Take the background `run()` task, e.g. to observe it finishing.
    pub fn take_run_handle(&mut self) -> Option<JoinHandle<Result<(), NsError>>> {
        self.run_handle.take()
    }
}

impl Drop for TestWorker {
    fn drop(&mut self) {
        // Abort the run task if the test did not stop the worker explicitly.
        if let Some(handle) = self.run_handle.take() {
            handle.abort();
        }
    }
}
