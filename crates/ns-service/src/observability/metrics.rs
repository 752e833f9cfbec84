//! Metrics definitions for the Notification Service
//!
//! All metrics follow Prometheus naming conventions:
//! - `ns_` prefix for Notification Service
//! - `_total` suffix for counters
//!
//! The crate only records through the `metrics` facade. Installing a recorder
//! (and exporting it) is left to the host process; without one every call here
//! is a no-op.
//!
//! # Cardinality
//!
//! - `status` on heartbeats: bounded by `HealthStatus` (3 values)
//! - `status` on health requests: 200 or 404
//! - `state` on lifecycle transitions: bounded by `LifecycleState` (4 values)

use metrics::counter;

/// Record one heartbeat emission.
///
/// Metric: `ns_heartbeats_total`
/// Labels: `status`
pub fn record_heartbeat(status: &'static str) {
    counter!("ns_heartbeats_total", "status" => status).increment(1);
}

/// Record one request answered by the health endpoint.
///
/// Metric: `ns_health_requests_total`
/// Labels: `status` (HTTP status code)
pub fn record_health_request(status_code: u16) {
    counter!("ns_health_requests_total", "status" => status_code.to_string()).increment(1);
}

/// Record a lifecycle state transition.
///
/// Metric: `ns_lifecycle_transitions_total`
/// Labels: `state` (state entered)
pub fn record_lifecycle_transition(state: &'static str) {
    counter!("ns_lifecycle_transitions_total", "state" => state).increment(1);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};

    fn counter_total(snapshotter: &Snapshotter, name: &str) -> u64 {
        snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .filter(|(key, _, _, _)| key.key().name() == name)
            .map(|(_, _, _, value)| match value {
                DebugValue::Counter(v) => v,
                _ => 0,
            })
            .sum()
    }

    #[test]
    fn test_heartbeat_counter_increments() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_heartbeat("Healthy");
            record_heartbeat("Healthy");
        });

        assert_eq!(counter_total(&snapshotter, "ns_heartbeats_total"), 2);
    }

    #[test]
    fn test_health_request_counter_labels_by_status() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_health_request(200);
            record_health_request(404);
            record_health_request(404);
        });

        let mut by_status: Vec<(String, u64)> = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .filter(|(key, _, _, _)| key.key().name() == "ns_health_requests_total")
            .filter_map(|(key, _, _, value)| {
                let status = key.key().labels().next()?.value().to_string();
                match value {
                    DebugValue::Counter(v) => Some((status, v)),
                    _ => None,
                }
            })
            .collect();
        by_status.sort();

        assert_eq!(
            by_status,
            vec![("200".to_string(), 1), ("404".to_string(), 2)]
        );
    }

    #[test]
    fn test_lifecycle_transition_counter() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_lifecycle_transition("Running");
            record_lifecycle_transition("Stopped");
        });

        assert_eq!(
            counter_total(&snapshotter, "ns_lifecycle_transitions_total"),
            2
        );
    }
}
