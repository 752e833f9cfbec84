//! Factory for `HealthCheckRecord`s.
//!
//! One `HealthRecorder` is shared by the heartbeat loop and the health
//! endpoint. It guarantees that successive records carry non-decreasing
//! timestamps even if the wall clock steps backwards.

use chrono::{DateTime, Utc};
use common::types::{HealthCheckRecord, HealthStatus};
use std::sync::atomic::{AtomicI64, Ordering};

/// Produces health check records for one service.
#[derive(Debug)]
pub struct HealthRecorder {
    service_name: String,
    /// Timestamp of the latest record, in microseconds since the epoch.
    last_timestamp_micros: AtomicI64,
}

impl HealthRecorder {
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            last_timestamp_micros: AtomicI64::new(i64::MIN),
        }
    }

    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Create a record stamped with the current time.
    #[must_use]
    pub fn record(&self, status: HealthStatus) -> HealthCheckRecord {
        self.record_at(status, Utc::now())
    }

    /// Create a record for `now`, truncated to microseconds and clamped so it
    /// is never earlier than the previous record from this recorder.
    #[must_use]
    pub fn record_at(&self, status: HealthStatus, now: DateTime<Utc>) -> HealthCheckRecord {
        let now_micros = now.timestamp_micros();
        let previous = self
            .last_timestamp_micros
            .fetch_max(now_micros, Ordering::SeqCst);

        let timestamp = DateTime::from_timestamp_micros(previous.max(now_micros)).unwrap_or(now);

        HealthCheckRecord::new(self.service_name.clone(), status, timestamp)
    }
}
