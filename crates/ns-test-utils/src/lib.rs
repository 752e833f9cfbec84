//! # NS Test Utilities
//!
//! Shared test utilities for the Notification Service (NS) worker.
//!
//! This crate provides:
//! - Worker test harness (`TestWorker` for E2E tests)
//! - Heartbeat sinks for asserting on emitted records (`RecordingSink`,
//!   `PanickingSink`, `SlowSink`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ns_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let worker = TestWorker::spawn().await?;
//!
//!     let response = reqwest::get(worker.health_url()).await?;
//!     assert_eq!(response.status(), 200);
//!
//!     worker.stop().await?;
//!     Ok(())
//! }
//! ```

pub mod sinks;
pub mod worker_harness;

// Re-export commonly used items
pub use sinks::*;
pub use worker_harness::*;
