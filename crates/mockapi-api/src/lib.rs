//! # mockapi-api — HTTP Surface of the Mock Server
//!
//! Serves every operation of a loaded OpenAPI description. Each request is
//! matched to an operation, run through the validation pipeline, and, when
//! it passes, answered by the mock CRUD generator against the resource
//! store.
//!
//! ## Request flow
//!
//! ```text
//! TraceLayer → body limit → dispatch
//!   → route match (404 / 405)
//!   → security (401) → body (415 / 400) → required parameters (400)
//!   → mock CRUD on the resource store
//! ```
//!
//! ## Modules
//!
//! | Module            | Concern                                        |
//! |-------------------|------------------------------------------------|
//! | [`request`]       | Location-aware view of an inbound request      |
//! | [`security`]      | Security requirement evaluation                |
//! | [`validation`]    | The ordered validation pipeline                |
//! | [`mock`]          | CRUD responses from the resource store         |
//! | [`dispatch`]      | The fallback handler tying it together         |
//! | [`error`]         | `AppError` and its JSON error bodies           |
//! | [`state`]         | `AppState` and `ServerConfig`                  |
//!
//! Health probes (`/health/*`) answer before any document path is matched.

pub mod dispatch;
pub mod error;
pub mod mock;
pub mod request;
pub mod security;
pub mod state;
pub mod validation;

use std::time::Duration;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use mockapi_core::ApiDocument;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Largest accepted request body.
pub const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// How long readiness waits for the store lock before reporting busy.
pub const READINESS_WAIT: Duration = Duration::from_secs(1);

/// Assemble the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .fallback(dispatch::dispatch)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(BODY_LIMIT)),
        )
        .with_state(state)
}

/// Log every `METHOD /path` the document serves.
pub fn log_endpoints(document: &ApiDocument) {
    let endpoints = document.endpoints();
    if endpoints.is_empty() {
        tracing::warn!("API description declares no operations");
        return;
    }
    tracing::info!(count = endpoints.len(), "Available endpoints:");
    for endpoint in endpoints {
        tracing::info!("  {endpoint}");
    }
}

/// Bind `state.config`'s address and serve until Ctrl-C.
///
/// # Errors
///
/// Returns the I/O error if the listener cannot bind or the server fails.
pub async fn serve(state: AppState) -> std::io::Result<()> {
    let addr = state.config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(component = "HTTP SERVER", "mock server listening on http://{}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — 503 when the store lock stays held for
/// [`READINESS_WAIT`].
async fn readiness(State(state): State<AppState>) -> Response {
    let store = state.store.clone();
    let available = tokio::task::spawn_blocking(move || store.is_available(READINESS_WAIT))
        .await
        .unwrap_or(false);
    if available {
        "ready".into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "store busy").into_response()
    }
}
