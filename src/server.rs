//! HTTP transport for a single [`ClusterSession`].
//!
//! Routes mirror the session operations one to one:
//!
//! | Route | Body | Reply |
//! |---|---|---|
//! | `POST /api/init` | [`InitRequest`] | [`InitResponse`] |
//! | `POST /api/step` | none | [`StepResponse`] |
//! | `POST /api/converge` | none | [`ConvergeResponse`] |
//! | `POST /api/reset` | none | [`ResetResponse`] |
//! | `GET /health` | none | `{"status": "ok"}` |
//!
//! Engine errors come back as `400` with an [`ErrorResponse`] body.

use crate::api::{
    ConvergeResponse, ErrorResponse, InitRequest, InitResponse, ResetResponse, StepResponse,
};
use crate::config::SessionConfig;
use crate::error::KMeansError;
use crate::session::ClusterSession;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Shared router state: the one session every request operates on.
///
/// The mutex serializes requests, so each operation runs to completion
/// before the next one sees the session.
#[derive(Clone)]
pub struct AppState {
    session: Arc<Mutex<ClusterSession>>,
}

impl AppState {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            session: Arc::new(Mutex::new(ClusterSession::with_config(config))),
        }
    }
}

/// Engine error wrapped for an HTTP reply
pub struct ApiError(KMeansError);

impl From<KMeansError> for ApiError {
    fn from(err: KMeansError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        debug!(kind = self.0.kind(), "request rejected: {}", self.0);
        (StatusCode::BAD_REQUEST, Json(ErrorResponse::from(&self.0))).into_response()
    }
}

/// Build the router over a fresh session.
pub fn create_router(config: SessionConfig) -> Router {
    create_router_with_state(AppState::new(config))
}

/// Build the router over existing state.
pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        .route("/api/init", post(init_handler))
        .route("/api/step", post(step_handler))
        .route("/api/converge", post(converge_handler))
        .route("/api/reset", post(reset_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn init_handler(
    State(state): State<AppState>,
    Json(request): Json<InitRequest>,
) -> Result<Json<InitResponse>, ApiError> {
    let mut session = state.session.lock().await;
    Ok(Json(session.handle_init(&request)?))
}

async fn step_handler(State(state): State<AppState>) -> Result<Json<StepResponse>, ApiError> {
    let mut session = state.session.lock().await;
    Ok(Json(session.handle_step()?))
}

async fn converge_handler(
    State(state): State<AppState>,
) -> Result<Json<ConvergeResponse>, ApiError> {
    let mut session = state.session.lock().await;
    Ok(Json(session.handle_converge()?))
}

async fn reset_handler(State(state): State<AppState>) -> Json<ResetResponse> {
    let mut session = state.session.lock().await;
    Json(session.handle_reset())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
