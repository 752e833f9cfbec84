//! Health monitoring endpoint for the Notification Service.
//!
//! Serves exactly one route for external liveness monitors:
//! - `GET <health_path>` - 200, `text/plain`, body `OK`
//!
//! The path comparison is case-insensitive. Every other method or path gets a
//! 404 with an empty body.
//!
//! # Lifecycle
//!
//! [`HealthServer::start`] binds the listening socket and spawns the server
//! task, which owns the socket. The server stops accepting as soon as its
//! cancellation token fires; the socket is dropped at that point, so later
//! connection attempts are refused rather than answered. [`HealthServer::close`]
//! waits for the task to finish.

use crate::errors::NsError;
use crate::observability::metrics::record_health_request;
use crate::observability::recorder::HealthRecorder;
use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use common::types::HealthStatus;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Shared state for the health handler.
#[derive(Debug)]
pub struct HealthEndpointState {
    /// Path answered with 200 (compared case-insensitively).
    pub health_path: String,
    /// Record factory shared with the heartbeat loop.
    pub recorder: Arc<HealthRecorder>,
}

/// Create the health router.
///
/// The router has no explicit routes: every request lands in the fallback
/// handler, which decides between 200 and 404. This keeps the path match
/// case-insensitive and makes wrong methods on the health path return 404
/// instead of 405.
pub fn health_router(state: Arc<HealthEndpointState>) -> Router {
    Router::new()
        .fallback(health_handler)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Health probe handler.
async fn health_handler(
    State(state): State<Arc<HealthEndpointState>>,
    method: Method,
    uri: Uri,
) -> Response {
    if method == Method::GET && uri.path().eq_ignore_ascii_case(&state.health_path) {
        let record = state.recorder.record(HealthStatus::Healthy);
        debug!(
            target: "ns.health",
            id = %record.id(),
            timestamp = %record.timestamp(),
            service = record.service_name(),
            "Health probe answered"
        );
        record_health_request(StatusCode::OK.as_u16());
        ([(header::CONTENT_TYPE, "text/plain")], "OK").into_response()
    } else {
        record_health_request(StatusCode::NOT_FOUND.as_u16());
        StatusCode::NOT_FOUND.into_response()
    }
}

/// Running health endpoint.
#[derive(Debug)]
pub struct HealthServer {
    local_addr: SocketAddr,
    shutdown_token: CancellationToken,
    task: JoinHandle<()>,
}

impl HealthServer {
    /// Bind `addr` and start serving the health router.
    ///
    /// The server stops when `cancel_token` (or [`HealthServer::close`])
    /// fires. Binding happens before the task is spawned so a bind failure is
    /// reported to the caller.
    pub async fn start(
        addr: SocketAddr,
        state: Arc<HealthEndpointState>,
        cancel_token: &CancellationToken,
    ) -> Result<Self, NsError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| NsError::HealthBind {
                addr,
                reason: e.to_string(),
            })?;
        let local_addr = listener.local_addr().map_err(|e| NsError::HealthBind {
            addr,
            reason: e.to_string(),
        })?;

        let app = health_router(state);
        let shutdown_token = cancel_token.child_token();
        let server_token = shutdown_token.clone();

        let task = tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                server_token.cancelled().await;
                info!(target: "ns.health", addr = %local_addr, "Health endpoint closing listener");
            });
            if let Err(e) = server.await {
                warn!(target: "ns.health", error = %e, "Health endpoint server error");
            }
            info!(target: "ns.health", addr = %local_addr, "Health endpoint stopped");
        });

        info!(target: "ns.health", addr = %local_addr, "Health endpoint listening");

        Ok(Self {
            local_addr,
            shutdown_token,
            task,
        })
    }

    /// Address the listener is actually bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Close the listener and wait for the server task to finish.
    ///
    /// A server that already stopped is treated as closed.
    pub async fn close(self) {
        self.shutdown_token.cancel();
        match self.task.await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => {
                debug!(target: "ns.health", "Health endpoint task was already cancelled");
            }
            Err(e) => {
                warn!(target: "ns.health", error = %e, "Health endpoint task ended abnormally");
            }
        }
    }
}
