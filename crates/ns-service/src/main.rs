//! Notification Service
//!
//! Background worker for the movie discussion platform. Keeps the process
//! alive with a heartbeat loop and answers liveness probes on a dedicated
//! HTTP endpoint.
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment (falls back to defaults on error)
//! 2. Initialize tracing
//! 3. `NotificationWorker::start` (network defaults, health endpoint, heartbeat)
//! 4. Drive `NotificationWorker::run` on its own task
//! 5. Wait for Ctrl+C / SIGTERM, or for the run task to end on its own
//! 6. `NotificationWorker::stop` and report how `run` ended

#![warn(clippy::pedantic)]

use std::sync::Arc;

use ns_service::config::{Config, LogFormat};
use ns_service::NotificationWorker;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configuration is read before tracing so the log format can be honored;
    // the error is reported once the subscriber exists.
    let (config, config_error) = match Config::from_env() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    init_tracing(config.log_format);

    info!("Starting Notification Service");

    if let Some(e) = config_error {
        warn!(error = %e, "Failed reading configuration at startup, using defaults");
    }

    info!(
        service_name = %config.service_name,
        health_bind_address = %config.health_bind_address(),
        health_path = %config.health_path,
        heartbeat_interval_secs = config.heartbeat_interval.as_secs(),
        "Configuration loaded"
    );

    let worker = Arc::new(NotificationWorker::new(config));

    if !worker.start().await {
        error!("Notification Service failed to start");
        return Err("Notification Service failed to start".into());
    }

    let run_worker = Arc::clone(&worker);
    let mut run_task = tokio::spawn(async move { run_worker.run().await });

    info!("Notification Service running - press Ctrl+C to shutdown");

    let run_result = tokio::select! {
        () = shutdown_signal() => {
            info!("Shutdown signal received, initiating graceful shutdown...");
            worker.stop().await;
            run_task.await
        }
        result = &mut run_task => {
            warn!("Run loop ended without a shutdown signal");
            worker.stop().await;
            result
        }
    };

    match run_result {
        Ok(Ok(())) => {
            info!("Notification Service shutdown complete");
            Ok(())
        }
        Ok(Err(e)) => {
            error!(error = %e, "Notification Service run loop failed");
            Err(e.into())
        }
        Err(e) => {
            error!(error = %e, "Notification Service run task failed");
            Err(e.into())
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ns_service=info,ns=info,tower_http=info".into());

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed. This is acceptable because
/// without signal handlers, we cannot gracefully shut down the service.
async fn shutdown_signal() {
    let ctrl_c = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
