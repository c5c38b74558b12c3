//! REST endpoints for inspecting and steering flows by hand.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::error::FlowError;

use super::controller::FlowController;
use super::prompts;

/// Shared state for flow routes.
#[derive(Clone)]
pub struct FlowRouteState {
    pub flow: FlowController,
}

fn error_response(err: FlowError) -> Response {
    let status = match err {
        FlowError::SessionNotFound { .. } => StatusCode::NOT_FOUND,
        FlowError::InvalidTransition { .. } => StatusCode::CONFLICT,
        FlowError::UnknownField { .. } | FlowError::DuplicateField { .. } | FlowError::EmptyModel => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(serde_json::json!({"error": err.to_string()}))).into_response()
}

/// GET /api/flow/{session_id}
///
/// Returns the session snapshot, or 404 if the session is unknown.
async fn get_flow(
    State(state): State<FlowRouteState>,
    Path(session_id): Path<String>,
) -> Response {
    match state.flow.summarize(&session_id).await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/flow/{session_id}/start-form
async fn start_form(
    State(state): State<FlowRouteState>,
    Path(session_id): Path<String>,
) -> Response {
    match state.flow.start_form(&session_id).await {
        Ok(summary) => {
            let prompt = summary
                .current_field
                .as_deref()
                .map(|field| prompts::prompt_for(state.flow.model(), field));
            Json(serde_json::json!({"status": "form_started", "prompt": prompt})).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST /api/flow/{session_id}/reset
async fn reset_flow(
    State(state): State<FlowRouteState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let existed = state.flow.reset_flow(&session_id).await;
    Json(serde_json::json!({"status": "flow_reset", "existed": existed}))
}

/// Build the flow REST routes.
pub fn flow_routes(state: FlowRouteState) -> Router {
    Router::new()
        .route("/api/flow/{session_id}", get(get_flow))
        .route("/api/flow/{session_id}/start-form", post(start_form))
        .route("/api/flow/{session_id}/reset", post(reset_flow))
        .with_state(state)
}
