//! Observability module for the Notification Service
//!
//! - [`health`] - HTTP health monitoring endpoint
//! - [`recorder`] - `HealthCheckRecord` factory with monotonic timestamps
//! - [`metrics`] - Counters recorded through the `metrics` facade
//!
//! # Privacy by Default
//!
//! Log fields are limited to identifiers, timestamps, status and service name.
//! Configuration is logged through an explicit safe subset at startup.

pub mod health;
pub mod metrics;
pub mod recorder;

// Re-exports for convenience
pub use health::{health_router, HealthEndpointState, HealthServer};
pub use metrics::{record_health_request, record_heartbeat, record_lifecycle_transition};
pub use recorder::HealthRecorder;
