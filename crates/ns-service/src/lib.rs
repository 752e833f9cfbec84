//! Notification Service (NS) Library
//!
//! Background worker for the movie discussion platform. The worker itself
//! does no business processing yet; it keeps the process alive, reports
//! liveness and shuts down cooperatively:
//!
//! - Heartbeat loop emitting a `HealthCheckRecord` on a fixed interval
//! - HTTP health monitoring endpoint for external probes
//! - Lifecycle controller sequencing startup and deterministic shutdown
//!
//! # Architecture
//!
//! ```text
//! NotificationWorker (lifecycle controller)
//! ├── CancellationToken (shared, set once by stop())
//! ├── HealthServer task (owns the listening socket)
//! └── heartbeat task (HeartbeatSink collaborator)
//! ```
//!
//! Queue consumption is not part of the worker yet. When added it runs as its
//! own task under the same cancellation token.
//!
//! # Modules
//!
//! - [`config`] - Service configuration from environment
//! - [`errors`] - Error types
//! - [`lifecycle`] - `NotificationWorker` start/run/stop
//! - [`network`] - Process-wide outbound network defaults
//! - [`observability`] - Health endpoint, record factory and metrics
//! - [`tasks`] - Background tasks (heartbeat loop)

#![warn(clippy::pedantic)]

pub mod config;
pub mod errors;
pub mod lifecycle;
pub mod network;
pub mod observability;
pub mod tasks;

pub use lifecycle::{LifecycleState, NotificationWorker};
