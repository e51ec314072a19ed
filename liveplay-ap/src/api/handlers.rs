//! HTTP request handlers
//!
//! Every control endpoint answers `{ success, message, started? }`.
//! Malformed UUIDs, index paths and cart slots are rejected with 400
//! before the engine is involved.

use crate::api::server::AppContext;
use crate::error::Error;
use crate::playback::engine::TriggerTarget;
use crate::playback::types::EngineSnapshot;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use liveplay_common::model::{Project, CART_SLOTS};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    started: Option<bool>,
}

impl ActionResponse {
    fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            started: None,
        })
    }

    fn started(message: impl Into<String>, started: bool) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            started: Some(started),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectInfoResponse {
    success: bool,
    project: Project,
}

type HandlerError = (StatusCode, Json<ActionResponse>);
type HandlerResult<T> = Result<Json<T>, HandlerError>;

fn failure(status: StatusCode, message: impl Into<String>) -> HandlerError {
    (
        status,
        Json(ActionResponse {
            success: false,
            message: message.into(),
            started: None,
        }),
    )
}

fn engine_failure(e: Error) -> HandlerError {
    error!("Engine request failed: {}", e);
    failure(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
}

fn parse_uuid(raw: &str) -> Result<Uuid, HandlerError> {
    Uuid::parse_str(raw)
        .map_err(|_| failure(StatusCode::BAD_REQUEST, format!("Invalid UUID '{}'", raw)))
}

/// Parse a comma separated index path such as `2,0,1`
fn parse_index(raw: &str) -> Result<Vec<usize>, HandlerError> {
    let invalid = || failure(StatusCode::BAD_REQUEST, format!("Invalid index '{}'", raw));
    if raw.trim().is_empty() {
        return Err(invalid());
    }
    raw.split(',')
        .map(|segment| segment.trim().parse::<usize>().map_err(|_| invalid()))
        .collect()
}

fn parse_slot(raw: &str) -> Result<u8, HandlerError> {
    match raw.parse::<u8>() {
        Ok(slot) if slot < CART_SLOTS => Ok(slot),
        _ => Err(failure(
            StatusCode::BAD_REQUEST,
            format!("Invalid cart slot '{}' (0-{})", raw, CART_SLOTS - 1),
        )),
    }
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "liveplay-ap".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Trigger Endpoints
// ============================================================================

/// GET /api/trigger/uuid/:uuid
pub async fn trigger_uuid(
    State(ctx): State<AppContext>,
    Path(raw): Path<String>,
) -> HandlerResult<ActionResponse> {
    let uuid = parse_uuid(&raw)?;
    info!("HTTP trigger of item {}", uuid);
    let started = ctx
        .engine
        .trigger(TriggerTarget::Uuid { uuid })
        .await
        .map_err(engine_failure)?;
    Ok(ActionResponse::started(format!("Triggered item {}", uuid), started))
}

/// GET /api/trigger/index/:index
pub async fn trigger_index(
    State(ctx): State<AppContext>,
    Path(raw): Path<String>,
) -> HandlerResult<ActionResponse> {
    let index = parse_index(&raw)?;
    info!("HTTP trigger of index {:?}", index);
    let started = ctx
        .engine
        .trigger(TriggerTarget::Index { index })
        .await
        .map_err(engine_failure)?;
    Ok(ActionResponse::started(
        format!("Triggered item at index {}", raw),
        started,
    ))
}

/// GET /api/trigger/cart/:slot
pub async fn trigger_cart(
    State(ctx): State<AppContext>,
    Path(raw): Path<String>,
) -> HandlerResult<ActionResponse> {
    let slot = parse_slot(&raw)?;
    let started = ctx
        .engine
        .trigger(TriggerTarget::Cart { slot })
        .await
        .map_err(engine_failure)?;
    Ok(ActionResponse::started(
        format!("Triggered cart slot {}", slot),
        started,
    ))
}

// ============================================================================
// Stop / Panic Endpoints
// ============================================================================

/// GET /api/stop/uuid/:uuid
pub async fn stop_uuid(
    State(ctx): State<AppContext>,
    Path(raw): Path<String>,
) -> HandlerResult<ActionResponse> {
    let uuid = parse_uuid(&raw)?;
    let was_active = ctx.engine.stop(uuid).await.map_err(engine_failure)?;
    let message = if was_active {
        format!("Stopped item {}", uuid)
    } else {
        format!("Item {} was not playing", uuid)
    };
    Ok(ActionResponse::ok(message))
}

/// POST /api/stop-all
pub async fn stop_all(State(ctx): State<AppContext>) -> HandlerResult<ActionResponse> {
    ctx.engine.stop_all().await.map_err(engine_failure)?;
    Ok(ActionResponse::ok("Stopped all cues"))
}

/// POST /api/panic
pub async fn panic(State(ctx): State<AppContext>) -> HandlerResult<ActionResponse> {
    ctx.engine.panic().await.map_err(engine_failure)?;
    Ok(ActionResponse::ok("Panic stop started"))
}

// ============================================================================
// Pause / Resume Endpoints
// ============================================================================

/// POST /api/pause/uuid/:uuid
pub async fn pause_uuid(
    State(ctx): State<AppContext>,
    Path(raw): Path<String>,
) -> HandlerResult<ActionResponse> {
    let uuid = parse_uuid(&raw)?;
    if ctx.engine.pause(uuid).await.map_err(engine_failure)? {
        Ok(ActionResponse::ok(format!("Paused item {}", uuid)))
    } else {
        Err(failure(
            StatusCode::NOT_FOUND,
            format!("Item {} is not playing", uuid),
        ))
    }
}

/// POST /api/resume/uuid/:uuid
pub async fn resume_uuid(
    State(ctx): State<AppContext>,
    Path(raw): Path<String>,
) -> HandlerResult<ActionResponse> {
    let uuid = parse_uuid(&raw)?;
    if ctx.engine.resume(uuid).await.map_err(engine_failure)? {
        Ok(ActionResponse::ok(format!("Resumed item {}", uuid)))
    } else {
        Err(failure(
            StatusCode::NOT_FOUND,
            format!("Item {} is not paused", uuid),
        ))
    }
}

// ============================================================================
// Read-only Endpoints
// ============================================================================

/// GET /api/project/info
pub async fn project_info(State(ctx): State<AppContext>) -> HandlerResult<ProjectInfoResponse> {
    match ctx.library.project() {
        Some(project) => Ok(Json(ProjectInfoResponse {
            success: true,
            project: (*project).clone(),
        })),
        None => Err(failure(StatusCode::NOT_FOUND, "No project loaded")),
    }
}

/// GET /api/state - last snapshot published by the engine task
pub async fn engine_state(State(ctx): State<AppContext>) -> Json<EngineSnapshot> {
    Json(ctx.state.get_snapshot().await)
}
