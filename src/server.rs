//! HTTP host
//!
//! Exposes the refresh trigger over HTTP and runs the startup refresh as a
//! supervised background task.
//!
//! Routes:
//! - `POST /api/data/refresh` runs one refresh and answers when it finishes
//! - `GET /health` checks store connectivity

use crate::config::ServerConfig;
use crate::core::{RefreshCoordinator, Trigger};
use crate::db;
use crate::types::{IngestError, RefreshSummary};
use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<RefreshCoordinator>,
    /// Cancelled when the host shuts down; in-flight refreshes roll back
    pub shutdown: CancellationToken,
}

/// Successful refresh response body
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub summary: RefreshSummary,
}

/// A failed refresh, rendered as a JSON error
#[derive(Debug)]
pub struct ApiError(pub IngestError);

impl From<IngestError> for ApiError {
    fn from(error: IngestError) -> Self {
        ApiError(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.0.to_string(),
            "kind": self.0.kind(),
        }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/data/refresh", post(refresh_data))
        .route("/health", get(health_check))
        .with_state(state)
}

/// On-demand refresh handler
async fn refresh_data(State(state): State<AppState>) -> Result<Json<RefreshResponse>, ApiError> {
    let summary = state
        .coordinator
        .refresh(Trigger::OnDemand, &state.shutdown)
        .await?;

    Ok(Json(RefreshResponse {
        status: "success",
        summary,
    }))
}

/// Health check handler
async fn health_check(State(state): State<AppState>) -> Result<Response, StatusCode> {
    match db::ping(state.coordinator.pool()).await {
        Ok(()) => Ok((
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "database": "connected"
            })),
        )
            .into_response()),
        Err(e) => {
            error!(error = %e, "Database health check failed");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// Run the HTTP host until a shutdown signal arrives
///
/// When `config.refresh_on_startup` is set, a refresh is launched in the
/// background before the listener starts. On shutdown the task is
/// cancelled and awaited, and its outcome is reported.
pub async fn serve(config: &ServerConfig, coordinator: Arc<RefreshCoordinator>) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();

    let startup_task = if config.refresh_on_startup {
        info!(source = %coordinator.source().display(), "Launching startup refresh");
        Some(Arc::clone(&coordinator).spawn_background(shutdown.child_token()))
    } else {
        None
    };

    let state = AppState {
        coordinator,
        shutdown: shutdown.clone(),
    };
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on {}", addr);

    let signal_token = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            signal_token.cancel();
        })
        .await
        .context("Server error")?;

    shutdown.cancel();
    if let Some(task) = startup_task {
        // The outcome was already reported by the coordinator; only a
        // panicked or aborted task is left to log here.
        if let Err(e) = task.await {
            error!(error = %e, "Startup refresh task did not complete");
        }
    }

    info!("Server shut down gracefully");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
