//! Command handlers for the stage.
//!
//! Each handler resolves names against the story, tags the orchestrator
//! with the command's correlation ID, runs the request and returns the
//! events it produced. Events recorded by earlier ticks and not yet drained
//! are returned too.

use stillframe_core::command::Command;
use stillframe_core::error::StageError;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::commands::{
    NotifyGrabbed, RequestDispossession, RequestFrameTransition, RequestNextScene,
    RequestPointOfInterest, RequestPossession, RequestSceneTransition, StageCommand,
};
use crate::domain::events::StageEvent;
use crate::domain::orchestrator::Orchestrator;

fn correlated(
    orchestrator: &mut Orchestrator,
    command: &dyn Command,
    run: impl FnOnce(&mut Orchestrator) -> Result<(), StageError>,
) -> Result<Vec<StageEvent>, StageError> {
    orchestrator.set_correlation(command.correlation_id());
    let result = run(orchestrator);
    orchestrator.set_correlation(Uuid::nil());
    match result {
        Ok(()) => {
            info!(
                command = command.command_type(),
                correlation_id = %command.correlation_id(),
                "command handled"
            );
            Ok(orchestrator.drain_events())
        }
        Err(error) => {
            warn!(
                command = command.command_type(),
                correlation_id = %command.correlation_id(),
                %error,
                "command rejected"
            );
            Err(error)
        }
    }
}

/// Handles `RequestFrameTransition`.
///
/// # Errors
///
/// Returns `StageError::NotFound` for an unknown frame, or whatever the
/// orchestrator rejects the transition with.
pub fn handle_frame_transition(
    command: &RequestFrameTransition,
    orchestrator: &mut Orchestrator,
) -> Result<Vec<StageEvent>, StageError> {
    let frame = orchestrator
        .graph()
        .frame_id(&command.frame)
        .ok_or_else(|| StageError::NotFound {
            kind: "frame",
            name: command.frame.clone(),
        })?;
    correlated(orchestrator, command, |stage| {
        stage.request_frame_transition(frame, command.fade)
    })
}

/// Handles `RequestSceneTransition`.
///
/// # Errors
///
/// Returns `StageError::NotFound` for an unknown scene, or whatever the
/// orchestrator rejects the transition with.
pub fn handle_scene_transition(
    command: &RequestSceneTransition,
    orchestrator: &mut Orchestrator,
) -> Result<Vec<StageEvent>, StageError> {
    let scene = orchestrator
        .graph()
        .scene_id(&command.scene)
        .ok_or_else(|| StageError::NotFound {
            kind: "scene",
            name: command.scene.clone(),
        })?;
    let fade = command
        .fade
        .unwrap_or(orchestrator.config().scene_fade);
    correlated(orchestrator, command, |stage| {
        stage.request_scene_transition(scene, fade)
    })
}

/// Handles `RequestNextScene`.
///
/// # Errors
///
/// Returns whatever the orchestrator rejects the request with.
pub fn handle_next_scene(
    command: &RequestNextScene,
    orchestrator: &mut Orchestrator,
) -> Result<Vec<StageEvent>, StageError> {
    correlated(orchestrator, command, Orchestrator::request_next_scene)
}

/// Handles `RequestPointOfInterest`.
///
/// # Errors
///
/// Returns `StageError::SessionEnding` once the exit sequence began.
pub fn handle_point_of_interest(
    command: &RequestPointOfInterest,
    orchestrator: &mut Orchestrator,
) -> Result<Vec<StageEvent>, StageError> {
    correlated(orchestrator, command, |stage| {
        stage.request_point_of_interest(command.position, command.sound.as_deref())
    })
}

/// Handles `NotifyGrabbed`.
///
/// # Errors
///
/// Never fails; the signature matches the other handlers.
pub fn handle_grabbed(
    command: &NotifyGrabbed,
    orchestrator: &mut Orchestrator,
) -> Result<Vec<StageEvent>, StageError> {
    correlated(orchestrator, command, |stage| {
        stage.notify_grabbed();
        Ok(())
    })
}

/// Handles `RequestPossession`.
///
/// # Errors
///
/// Returns whatever the orchestrator rejects the request with.
pub fn handle_possession(
    command: &RequestPossession,
    orchestrator: &mut Orchestrator,
) -> Result<Vec<StageEvent>, StageError> {
    correlated(orchestrator, command, |stage| {
        stage.request_possession(command.rig.clone(), command.hide.clone())
    })
}

/// Handles `RequestDispossession`.
///
/// # Errors
///
/// Returns whatever the orchestrator rejects the request with.
pub fn handle_dispossession(
    command: &RequestDispossession,
    orchestrator: &mut Orchestrator,
) -> Result<Vec<StageEvent>, StageError> {
    correlated(orchestrator, command, Orchestrator::request_dispossession)
}

/// Dispatches any stage command to its handler.
///
/// # Errors
///
/// Returns the error of the handler the command was routed to.
pub fn handle(
    command: &StageCommand,
    orchestrator: &mut Orchestrator,
) -> Result<Vec<StageEvent>, StageError> {
    match command {
        StageCommand::FrameTransition(command) => handle_frame_transition(command, orchestrator),
        StageCommand::SceneTransition(command) => handle_scene_transition(command, orchestrator),
        StageCommand::NextScene(command) => handle_next_scene(command, orchestrator),
        StageCommand::PointOfInterest(command) => handle_point_of_interest(command, orchestrator),
        StageCommand::Grabbed(command) => handle_grabbed(command, orchestrator),
        StageCommand::Possession(command) => handle_possession(command, orchestrator),
        StageCommand::Dispossession(command) => handle_dispossession(command, orchestrator),
    }
}
