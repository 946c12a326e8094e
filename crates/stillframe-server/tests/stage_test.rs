//! Integration tests for the stage and trigger endpoints.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;
use stillframe_core::effects::NodePath;
use stillframe_test_support::Effect;

#[tokio::test]
async fn test_stage_starts_in_initial_scene() {
    let app = common::build_test_app();

    let (status, json) = common::get_json(app.router, "/api/v1/stage").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["scene"], "parlour");
    assert_eq!(json["frame"], "hall");
    assert_eq!(json["haptic_loop_active"], true);
    assert!(json["scene_in_flight"].is_null());
}

#[tokio::test]
async fn test_touch_trigger_moves_to_its_frame() {
    // Arrange
    let app = common::build_test_app();

    // Act
    let (wrong_status, wrong_tag) =
        common::post_json(app.router.clone(), "/api/v1/triggers/doorway", &json!({ "tag": "foot" }))
            .await;
    let (status, fired) =
        common::post_json(app.router.clone(), "/api/v1/triggers/doorway", &json!({ "tag": "hand" }))
            .await;

    // Assert
    assert_eq!(wrong_status, StatusCode::OK);
    assert_eq!(wrong_tag["handled"], false);
    assert_eq!(wrong_tag["reason"], "tag does not match");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fired["handled"], true);
    let (_, snapshot) = common::get_json(app.router, "/api/v1/stage").await;
    assert_eq!(snapshot["frame"], "teapot");
}

#[tokio::test]
async fn test_next_scene_switches_to_successor() {
    // Arrange
    let app = common::build_test_app();

    // Act
    let (status, json) =
        common::send(app.router.clone(), "POST", "/api/v1/stage/scenes/next", None).await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert!(json["event_types"]
        .as_array()
        .unwrap()
        .contains(&json!("stage.scene_switch_triggered")));
    let snapshot = common::wait_for_snapshot(&app.router, |snapshot| {
        snapshot["scene"] == "garden" && snapshot["phase"] == "running"
    })
    .await;
    assert_eq!(snapshot["frame"], "bench");
    assert!(app
        .effects
        .effects()
        .contains(&Effect::MusicSwap(Some("birds".to_owned()), Duration::from_millis(200))));
    assert_eq!(
        app.effects.last_active(&NodePath::new("parlour")),
        Some(false)
    );
}

#[tokio::test]
async fn test_session_ends_after_last_scene() {
    // Arrange
    let app = common::build_test_app();
    let mut events = app.stage.subscribe();
    common::send(app.router.clone(), "POST", "/api/v1/stage/scenes/next", None).await;
    common::wait_for_snapshot(&app.router, |snapshot| snapshot["phase"] == "running").await;

    // Act
    let (status, json) =
        common::send(app.router.clone(), "POST", "/api/v1/stage/scenes/next", None).await;
    let (rejected, rejection) = common::post_json(
        app.router.clone(),
        "/api/v1/stage/point-of-interest",
        &json!({ "position": { "x": 0.0, "y": 0.0, "z": 0.0 } }),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["event_types"][0], "stage.session_ending");
    assert_eq!(rejected, StatusCode::CONFLICT);
    assert_eq!(rejection["error"], "session_ending");
    loop {
        let event = tokio::time::timeout(Duration::from_secs(3), events.recv())
            .await
            .unwrap()
            .unwrap();
        if event.metadata.event_type == "stage.session_terminated" {
            break;
        }
    }
    assert_eq!(app.effects.count(|effect| *effect == Effect::Terminate), 1);
}
