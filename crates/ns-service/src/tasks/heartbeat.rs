//! Heartbeat background task.
//!
//! Emits one `Healthy` record per interval to a [`HeartbeatSink`] until the
//! cancellation token fires. The first heartbeat is emitted immediately.
//!
//! # Graceful Shutdown
//!
//! The wait between heartbeats races against the cancellation token, and the
//! token is polled first, so no heartbeat starts once cancellation has been
//! observed. A heartbeat already being emitted completes.

use crate::observability::metrics::record_heartbeat;
use crate::observability::recorder::HealthRecorder;
use common::types::{HealthCheckRecord, HealthStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Receiver of heartbeat records.
pub trait HeartbeatSink: Send + Sync {
    /// Deliver one heartbeat record.
    fn emit(&self, record: &HealthCheckRecord);
}

/// Sink that writes heartbeats to the tracing pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHeartbeatSink;

impl HeartbeatSink for TracingHeartbeatSink {
    fn emit(&self, record: &HealthCheckRecord) {
        info!(
            target: "ns.heartbeat",
            id = %record.id(),
            timestamp = %record.timestamp(),
            status = %record.status(),
            service = record.service_name(),
            "Heartbeat"
        );
    }
}

/// Run the heartbeat loop until `cancel_token` is cancelled.
///
/// Callers should chain `.instrument(tracing::info_span!(...))` on the returned
/// future to name the task's span.
///
/// # Arguments
///
/// * `recorder` - Record factory shared with the health endpoint
/// * `sink` - Destination of each heartbeat
/// * `interval` - Time between heartbeats
/// * `cancel_token` - Token for graceful shutdown
pub async fn run_heartbeat_loop(
    recorder: Arc<HealthRecorder>,
    sink: Arc<dyn HeartbeatSink>,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut emitted: u64 = 0;

    loop {
        tokio::select! {
            biased;

            () = cancel_token.cancelled() => {
                info!(
                    target: "ns.heartbeat",
                    heartbeats = emitted,
                    "Heartbeat task received shutdown signal, exiting"
                );
                break;
            }
            _ = ticker.tick() => {
                let record = recorder.record(HealthStatus::Healthy);
                sink.emit(&record);
                record_heartbeat(record.status().as_str());
                emitted += 1;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct CountingSink {
        count: AtomicU32,
    }

    impl HeartbeatSink for CountingSink {
        fn emit(&self, record: &HealthCheckRecord) {
            assert_eq!(record.status(), HealthStatus::Healthy);
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_tracing_sink_accepts_records() {
        let recorder = HealthRecorder::new("ns");
        TracingHeartbeatSink.emit(&recorder.record(HealthStatus::Healthy));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_heartbeat_is_immediate() {
        let token = CancellationToken::new();
        let sink = Arc::new(CountingSink::default());

        let handle = tokio::spawn(run_heartbeat_loop(
            Arc::new(HealthRecorder::new("ns")),
            Arc::clone(&sink) as Arc<dyn HeartbeatSink>,
            Duration::from_secs(5),
            token.clone(),
        ));

        tokio::time::advance(Duration::from_millis(10)).await;
        tokio::task::yield_now().await;
        assert_eq!(sink.count.load(Ordering::SeqCst), 1);

        token.cancel();
        handle.await.expect("heartbeat task should exit cleanly");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_start_emits_nothing() {
        let token = CancellationToken::new();
        token.cancel();
        let sink = Arc::new(CountingSink::default());

        run_heartbeat_loop(
            Arc::new(HealthRecorder::new("ns")),
            Arc::clone(&sink) as Arc<dyn HeartbeatSink>,
            Duration::from_secs(5),
            token,
        )
        .await;

        assert_eq!(sink.count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_wait() {
        let token = CancellationToken::new();
        let sink = Arc::new(CountingSink::default());

        let handle = tokio::spawn(run_heartbeat_loop(
            Arc::new(HealthRecorder::new("ns")),
            Arc::clone(&sink) as Arc<dyn HeartbeatSink>,
            Duration::from_secs(3600),
            token.clone(),
        ));

        tokio::time::advance(Duration::from_millis(10)).await;
        tokio::task::yield_now().await;

        token.cancel();

        // Exits well before the hour-long interval elapses
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loop should exit promptly on cancellation")
            .expect("heartbeat task should not panic");
        assert_eq!(sink.count.load(Ordering::SeqCst), 1);
    }
}
