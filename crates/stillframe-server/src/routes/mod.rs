//! HTTP routes.

pub mod health;
pub mod stage;
pub mod triggers;

use axum::Router;
use serde::Serialize;
use stillframe_sequencer::domain::events::StageEvent;
use uuid::Uuid;

use crate::state::AppState;

/// Response body returned after a command is successfully handled.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// IDs of the stage events produced.
    pub event_ids: Vec<Uuid>,
    /// Types of the same events, in order.
    pub event_types: Vec<&'static str>,
}

impl From<Vec<StageEvent>> for CommandResponse {
    fn from(events: Vec<StageEvent>) -> Self {
        Self {
            event_ids: events.iter().map(|e| e.metadata.event_id).collect(),
            event_types: events.iter().map(|e| e.kind.event_type()).collect(),
        }
    }
}

/// The full router, as served by the binary.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest("/api/v1/stage", stage::router())
        .nest("/api/v1/triggers", triggers::router())
        .with_state(state)
}
