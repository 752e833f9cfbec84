//! Contract types shared across the notification worker components.

#![warn(clippy::pedantic)]

/// Module for common data types
pub mod types;
