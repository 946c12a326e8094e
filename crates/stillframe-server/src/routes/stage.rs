//! Routes that drive and inspect the stage.

use std::time::Duration;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use stillframe_core::effects::{NodePath, Position};
use stillframe_sequencer::domain::commands::{
    NotifyGrabbed, RequestDispossession, RequestFrameTransition, RequestNextScene,
    RequestPointOfInterest, RequestPossession, RequestSceneTransition, StageCommand,
};
use stillframe_sequencer::domain::orchestrator::StageSnapshot;
use tracing::{info, instrument};
use uuid::Uuid;

use super::CommandResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /frames/transition.
#[derive(Debug, Deserialize)]
pub struct FrameTransitionRequest {
    /// Target frame name.
    pub frame: String,
    /// Fade in seconds; the standard frame fade when absent.
    #[serde(default, with = "stillframe_core::seconds::option")]
    pub fade_secs: Option<Duration>,
}

/// Request body for POST /scenes/transition.
#[derive(Debug, Deserialize)]
pub struct SceneTransitionRequest {
    /// Target scene name.
    pub scene: String,
    /// Fade in seconds; the configured scene fade when absent.
    #[serde(default, with = "stillframe_core::seconds::option")]
    pub fade_secs: Option<Duration>,
}

/// Request body for POST /point-of-interest.
#[derive(Debug, Deserialize)]
pub struct PointOfInterestRequest {
    /// Where the sound plays.
    pub position: Position,
    /// Clip key override.
    #[serde(default)]
    pub sound: Option<String>,
}

/// Request body for POST /possession.
#[derive(Debug, Deserialize)]
pub struct PossessionRequest {
    /// Render node of the rig to possess.
    pub rig: NodePath,
    /// Nodes to hide while possessed.
    #[serde(default)]
    pub hide: Vec<NodePath>,
}

async fn execute(state: &AppState, command: StageCommand) -> Result<Json<CommandResponse>, ApiError> {
    let events = state.stage.execute(command).await?;
    Ok(Json(CommandResponse::from(events)))
}

/// GET /
async fn snapshot(State(state): State<AppState>) -> Result<Json<StageSnapshot>, ApiError> {
    Ok(Json(state.stage.snapshot().await?))
}

/// POST /frames/transition
#[instrument(skip(state, request), fields(frame = %request.frame))]
async fn frame_transition(
    State(state): State<AppState>,
    Json(request): Json<FrameTransitionRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = RequestFrameTransition {
        correlation_id: Uuid::new_v4(),
        frame: request.frame,
        fade: request.fade_secs,
    };

    info!(correlation_id = %command.correlation_id, "handling request_frame_transition command");

    execute(&state, StageCommand::FrameTransition(command)).await
}

/// POST /scenes/transition
#[instrument(skip(state, request), fields(scene = %request.scene))]
async fn scene_transition(
    State(state): State<AppState>,
    Json(request): Json<SceneTransitionRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = RequestSceneTransition {
        correlation_id: Uuid::new_v4(),
        scene: request.scene,
        fade: request.fade_secs,
    };

    info!(correlation_id = %command.correlation_id, "handling request_scene_transition command");

    execute(&state, StageCommand::SceneTransition(command)).await
}

/// POST /scenes/next
#[instrument(skip(state))]
async fn next_scene(State(state): State<AppState>) -> Result<Json<CommandResponse>, ApiError> {
    let command = RequestNextScene {
        correlation_id: Uuid::new_v4(),
    };

    info!(correlation_id = %command.correlation_id, "handling request_next_scene command");

    execute(&state, StageCommand::NextScene(command)).await
}

/// POST /point-of-interest
#[instrument(skip(state, request))]
async fn point_of_interest(
    State(state): State<AppState>,
    Json(request): Json<PointOfInterestRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = RequestPointOfInterest {
        correlation_id: Uuid::new_v4(),
        position: request.position,
        sound: request.sound,
    };

    info!(correlation_id = %command.correlation_id, "handling request_point_of_interest command");

    execute(&state, StageCommand::PointOfInterest(command)).await
}

/// POST /grab
#[instrument(skip(state))]
async fn grab(State(state): State<AppState>) -> Result<Json<CommandResponse>, ApiError> {
    let command = NotifyGrabbed {
        correlation_id: Uuid::new_v4(),
    };

    info!(correlation_id = %command.correlation_id, "handling notify_grabbed command");

    execute(&state, StageCommand::Grabbed(command)).await
}

/// POST /possession
#[instrument(skip(state, request), fields(rig = %request.rig))]
async fn possess(
    State(state): State<AppState>,
    Json(request): Json<PossessionRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = RequestPossession {
        correlation_id: Uuid::new_v4(),
        rig: request.rig,
        hide: request.hide,
    };

    info!(correlation_id = %command.correlation_id, "handling request_possession command");

    execute(&state, StageCommand::Possession(command)).await
}

/// DELETE /possession
#[instrument(skip(state))]
async fn dispossess(State(state): State<AppState>) -> Result<Json<CommandResponse>, ApiError> {
    let command = RequestDispossession {
        correlation_id: Uuid::new_v4(),
    };

    info!(correlation_id = %command.correlation_id, "handling request_dispossession command");

    execute(&state, StageCommand::Dispossession(command)).await
}

/// Returns the router for the stage.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(snapshot))
        .route("/frames/transition", post(frame_transition))
        .route("/scenes/transition", post(scene_transition))
        .route("/scenes/next", post(next_scene))
        .route("/point-of-interest", post(point_of_interest))
        .route("/grab", post(grab))
        .route("/possession", post(possess).delete(dispossess))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::stage::tests::spawn_stage;

    fn test_app() -> Router {
        router().with_state(AppState::new(spawn_stage(), "test"))
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_snapshot_returns_200_with_current_frame() {
        // Act
        let (status, json) = send(test_app(), "GET", "/", None).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["scene"], "parlour");
        assert_eq!(json["frame"], "hall");
        assert_eq!(json["possessed"], false);
    }

    #[tokio::test]
    async fn test_frame_transition_returns_200_with_event_ids() {
        // Arrange
        let body = serde_json::json!({ "frame": "table", "fade_secs": 1.5 });

        // Act
        let (status, json) = send(test_app(), "POST", "/frames/transition", Some(body)).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert!(!json["event_ids"].as_array().unwrap().is_empty());
        assert!(json["event_types"]
            .as_array()
            .unwrap()
            .contains(&Value::from("stage.frame_started")));
    }

    #[tokio::test]
    async fn test_frame_transition_to_unknown_frame_returns_404() {
        let body = serde_json::json!({ "frame": "attic" });

        let (status, json) = send(test_app(), "POST", "/frames/transition", Some(body)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "not_found");
    }

    #[tokio::test]
    async fn test_frame_transition_across_scenes_returns_422() {
        let body = serde_json::json!({ "frame": "bench" });

        let (status, json) = send(test_app(), "POST", "/frames/transition", Some(body)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"], "frame_outside_scene");
    }

    #[tokio::test]
    async fn test_negative_fade_is_rejected() {
        let body = serde_json::json!({ "frame": "table", "fade_secs": -1.0 });

        let (status, _) = send(test_app(), "POST", "/frames/transition", Some(body)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_second_scene_transition_returns_409() {
        // Arrange
        let app = test_app();
        let body = serde_json::json!({ "scene": "garden", "fade_secs": 2.0 });
        let (first, _) = send(app.clone(), "POST", "/scenes/transition", Some(body.clone())).await;

        // Act
        let (second, json) = send(app, "POST", "/scenes/next", None).await;

        // Assert
        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::CONFLICT);
        assert_eq!(json["error"], "transition_in_flight");
    }

    #[tokio::test]
    async fn test_dispossession_without_possession_returns_400() {
        let (status, json) = send(test_app(), "DELETE", "/possession", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_possession_then_second_request_returns_409() {
        // Arrange
        let app = test_app();
        let body = serde_json::json!({ "rig": "parlour/cat", "hide": ["parlour/hall"] });

        // Act
        let (first, _) = send(app.clone(), "POST", "/possession", Some(body.clone())).await;
        let (second, json) = send(app, "POST", "/possession", Some(body)).await;

        // Assert
        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::CONFLICT);
        assert_eq!(json["error"], "possession_in_flight");
    }

    #[tokio::test]
    async fn test_point_of_interest_and_grab_return_200() {
        let app = test_app();
        let body = serde_json::json!({ "position": { "x": 1.0, "y": 0.0, "z": 2.0 } });

        let (poi, poi_json) = send(app.clone(), "POST", "/point-of-interest", Some(body)).await;
        let (grab, grab_json) = send(app, "POST", "/grab", None).await;

        assert_eq!(poi, StatusCode::OK);
        assert_eq!(poi_json["event_types"][0], "stage.point_of_interest");
        assert_eq!(grab, StatusCode::OK);
        assert_eq!(grab_json["event_types"][0], "stage.haptic_loop_stopped");
    }
}
