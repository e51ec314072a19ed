//! HTTP server setup and routing
//!
//! Sets up the axum router for control endpoints and SSE.

use crate::error::{Error, Result};
use crate::library::MediaLibrary;
use crate::playback::runtime::EngineHandle;
use crate::state::SharedState;
use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub state: Arc<SharedState>,
    pub engine: EngineHandle,
    pub library: Arc<dyn MediaLibrary>,
}

/// Build the router with every route attached
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(super::handlers::health))

        // Triggers
        .route("/api/trigger/uuid/:uuid", get(super::handlers::trigger_uuid))
        .route("/api/trigger/index/:index", get(super::handlers::trigger_index))
        .route("/api/trigger/cart/:slot", get(super::handlers::trigger_cart))

        // Stopping
        .route("/api/stop/uuid/:uuid", get(super::handlers::stop_uuid))
        .route("/api/stop-all", post(super::handlers::stop_all))
        .route("/api/panic", post(super::handlers::panic))

        // Pause / resume
        .route("/api/pause/uuid/:uuid", post(super::handlers::pause_uuid))
        .route("/api/resume/uuid/:uuid", post(super::handlers::resume_uuid))

        // Read-only views
        .route("/api/project/info", get(super::handlers::project_info))
        .route("/api/state", get(super::handlers::engine_state))

        // SSE event stream
        .route("/events", get(super::sse::event_stream))

        // Attach application context
        .with_state(ctx)

        // Enable CORS for controllers on other origins
        .layer(CorsLayer::permissive())
}

/// Run the HTTP API server until `shutdown` resolves
pub async fn run<F>(port: u16, ctx: AppContext, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}
