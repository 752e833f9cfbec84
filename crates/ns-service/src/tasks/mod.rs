//! Background tasks for the Notification Service.
//!
//! Tasks run alongside the health endpoint and support graceful shutdown via
//! a shared cancellation token.
//!
//! Queue processing, once implemented, belongs here as a separate task under
//! the same token rather than inside the heartbeat timing.

pub mod heartbeat;

pub use heartbeat::{run_heartbeat_loop, HeartbeatSink, TracingHeartbeatSink};
