//! Shared test helpers for server integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use stillframe_content::application::command_handlers::handle_ingest_story;
use stillframe_content::domain::commands::IngestStory;
use stillframe_core::effects::Collaborators;
use stillframe_sequencer::domain::orchestrator::Orchestrator;
use stillframe_test_support::{FixedClock, RecordingEffects};
use tower::ServiceExt;
use uuid::Uuid;

use stillframe_server::routes;
use stillframe_server::stage::{StageActor, StageHandle};
use stillframe_server::state::AppState;

/// A two-scene story with one trigger of each kind.
pub const STORY: &str = r"
stage:
  startup_fade: 0.5
  scene_fade: 0.2
  scene_settle_delay: 0.1
  standard_frame_fade: 0.2
  exit_audio_delay: 0.1
story:
  initial_scene: parlour
  scenes:
    - name: parlour
      start_frame: hall
      next_scene: garden
      frames:
        - name: hall
        - name: table
        - name: teapot
    - name: garden
      start_frame: bench
      music: birds
      frames:
        - name: bench
triggers:
  saucer:
    kind: snap_zone
    target: table
    disable_on_snap: true
  doorway:
    kind: touch_volume
    tag: hand
    target: teapot
  cup:
    kind: grab
audio:
  - key: exhale
    file: audio/exhale.ogg
  - key: birds
    file: audio/birds.ogg
    looping: true
";

/// Stage and router built from [`STORY`], recording every effect.
pub struct TestApp {
    /// The full router.
    pub router: Router,
    /// Handle to the stage actor behind it.
    pub stage: StageHandle,
    /// Fingerprint of the ingested story.
    pub fingerprint: String,
    /// Recorded collaborator calls.
    pub effects: Arc<RecordingEffects>,
}

/// Build the full app router with recording effects and a fixed clock. Uses
/// the same route structure as `main.rs`.
pub fn build_test_app() -> TestApp {
    let clock = Arc::new(FixedClock::standard());
    let ingested = handle_ingest_story(
        &IngestStory {
            correlation_id: Uuid::new_v4(),
            origin: "tests/common".to_owned(),
            source: STORY.to_owned(),
        },
        clock.as_ref(),
    )
    .unwrap();
    let story = ingested.story;
    let effects = Arc::new(RecordingEffects::new());
    let orchestrator = Orchestrator::launch(
        story.graph,
        story.stage,
        Collaborators::uniform(&effects),
        clock,
    );
    let (stage, _task) =
        StageActor::spawn(orchestrator, story.triggers, Duration::from_millis(10));

    TestApp {
        router: routes::app(AppState::new(stage.clone(), ingested.fingerprint.clone())),
        stage,
        fingerprint: ingested.fingerprint,
        effects,
    }
}

/// Send a request with an optional JSON body and return the response.
pub async fn send(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<&serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null);

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, Some(body)).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, "GET", uri, None).await
}

/// Poll the stage snapshot until `done` holds, failing after two seconds.
pub async fn wait_for_snapshot(app: &Router, done: impl Fn(&serde_json::Value) -> bool) -> serde_json::Value {
    for _ in 0..200 {
        let (_, json) = get_json(app.clone(), "/api/v1/stage").await;
        if done(&json) {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("stage never reached the expected state");
}
