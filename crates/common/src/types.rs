//! Common data types for the notification worker components.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a single health check emission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HealthCheckId(pub Uuid);

impl HealthCheckId {
    /// Create a new random health check ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HealthCheckId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HealthCheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Reported health of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Service is operating normally.
    Healthy,
    /// Service is running with reduced capability.
    Degraded,
    /// Service cannot do its work.
    Unhealthy,
}

impl HealthStatus {
    /// Returns the status as a string for log fields and metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "Healthy",
            HealthStatus::Degraded => "Degraded",
            HealthStatus::Unhealthy => "Unhealthy",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single liveness report emitted by a service.
///
/// Records are immutable once constructed. Fields are only readable through
/// accessors so a record can be passed around by reference without risk of
/// being altered after emission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckRecord {
    id: HealthCheckId,
    timestamp: DateTime<Utc>,
    status: HealthStatus,
    service_name: String,
}

impl HealthCheckRecord {
    /// Create a record with a fresh identifier.
    #[must_use]
    pub fn new(
        service_name: impl Into<String>,
        status: HealthStatus,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: HealthCheckId::new(),
            timestamp,
            status,
            service_name: service_name.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> HealthCheckId {
        self.id
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub fn status(&self) -> HealthStatus {
        self.status
    }

    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_health_check_ids_are_unique() {
        let a = HealthCheckId::new();
        let b = HealthCheckId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_record_accessors() {
        let now = Utc::now();
        let record = HealthCheckRecord::new("NotificationService", HealthStatus::Healthy, now);

        assert_eq!(record.service_name(), "NotificationService");
        assert_eq!(record.status(), HealthStatus::Healthy);
        assert_eq!(record.timestamp(), now);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(HealthStatus::Healthy.to_string(), "Healthy");
        assert_eq!(HealthStatus::Degraded.to_string(), "Degraded");
        assert_eq!(HealthStatus::Unhealthy.to_string(), "Unhealthy");
    }

    #[test]
    fn test_record_serializes_with_camel_case_fields() {
        let record =
            HealthCheckRecord::new("NotificationService", HealthStatus::Degraded, Utc::now());

        let value = serde_json::to_value(&record).expect("record should serialize");

        assert_eq!(value["serviceName"], "NotificationService");
        assert_eq!(value["status"], "Degraded");
        assert_eq!(value["id"], record.id().to_string());
        assert!(value.get("timestamp").is_some());
    }

    #[test]
    fn test_record_deserializes_from_wire_shape() {
        let json = r#"{
            "id": "8f1c2a7e-3b2d-4c55-9a0e-1d2f3a4b5c6d",
            "timestamp": "2024-03-01T12:00:00Z",
            "status": "Unhealthy",
            "serviceName": "NotificationService"
        }"#;

        let record: HealthCheckRecord = serde_json::from_str(json).expect("should deserialize");

        assert_eq!(record.status(), HealthStatus::Unhealthy);
        assert_eq!(
            record.id().to_string(),
            "8f1c2a7e-3b2d-4c55-9a0e-1d2f3a4b5c6d"
        );
    }
}
