//! Routes for firing trigger sources.

use axum::extract::{Path, State};
use axum::{Json, Router, routing::post};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::stage::Fired;
use crate::state::AppState;

/// Request body for POST /{name}.
#[derive(Debug, Default, Deserialize)]
pub struct FireTriggerRequest {
    /// Tag of the object that set the trigger off.
    #[serde(default)]
    pub tag: Option<String>,
}

/// Response body for a fired trigger.
#[derive(Debug, Serialize)]
pub struct FireTriggerResponse {
    /// Whether the trigger produced a command.
    pub handled: bool,
    /// Why nothing happened, when nothing did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    /// IDs of the stage events produced.
    pub event_ids: Vec<Uuid>,
}

/// POST /{name}
#[instrument(skip(state, request))]
async fn fire_trigger(
    State(state): State<AppState>,
    Path(name): Path<String>,
    request: Option<Json<FireTriggerRequest>>,
) -> Result<Json<FireTriggerResponse>, ApiError> {
    let Json(request) = request.unwrap_or_default();
    let correlation_id = Uuid::new_v4();

    info!(%correlation_id, "handling fire_trigger request");

    let response = match state
        .stage
        .fire_trigger(name, request.tag, correlation_id)
        .await?
    {
        Fired::Handled(events) => FireTriggerResponse {
            handled: true,
            reason: None,
            event_ids: events.iter().map(|e| e.metadata.event_id).collect(),
        },
        Fired::Ignored(reason) => FireTriggerResponse {
            handled: false,
            reason: Some(reason),
            event_ids: Vec::new(),
        },
    };

    Ok(Json(response))
}

/// Returns the router for trigger sources.
pub fn router() -> Router<AppState> {
    Router::new().route("/{name}", post(fire_trigger))
}
