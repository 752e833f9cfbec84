//! Notification Service error types.
//!
//! None of these reach a client: the health endpoint only ever answers 200 or
//! 404. They exist so startup and shutdown failures can be logged with a
//! precise cause and so `run()` can report an abnormal heartbeat exit.

use crate::config::ConfigError;
use crate::network::NetworkDefaultsError;
use std::net::SocketAddr;
use thiserror::Error;

/// Notification Service error type.
#[derive(Debug, Error)]
pub enum NsError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Process network defaults could not be applied.
    #[error("Network defaults error: {0}")]
    Network(#[from] NetworkDefaultsError),

    /// Health endpoint could not bind its listening socket.
    #[error("Failed to bind health endpoint to {addr}: {reason}")]
    HealthBind { addr: SocketAddr, reason: String },

    /// Heartbeat task ended abnormally (panic or abort).
    #[error("Heartbeat loop failed: {0}")]
    HeartbeatFailed(String),

    /// `run()` was called while the worker had no heartbeat task to drive.
    #[error("Worker is not running")]
    NotRunning,
}
