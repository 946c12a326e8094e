//! Commands accepted by the stage.

use std::time::Duration;

use stillframe_core::command::Command;
use stillframe_core::effects::{NodePath, Position};
use uuid::Uuid;

/// Command to move from the current frame to another frame of the scene.
#[derive(Debug, Clone)]
pub struct RequestFrameTransition {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Target frame name.
    pub frame: String,
    /// Fade for both frames; the standard frame fade when absent.
    pub fade: Option<Duration>,
}

impl Command for RequestFrameTransition {
    fn command_type(&self) -> &'static str {
        "stage.request_frame_transition"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to switch to another scene.
#[derive(Debug, Clone)]
pub struct RequestSceneTransition {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Target scene name.
    pub scene: String,
    /// Screen and music fade; the configured scene fade when absent.
    pub fade: Option<Duration>,
}

impl Command for RequestSceneTransition {
    fn command_type(&self) -> &'static str {
        "stage.request_scene_transition"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to continue with the successor scene, or end the session.
#[derive(Debug, Clone)]
pub struct RequestNextScene {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
}

impl Command for RequestNextScene {
    fn command_type(&self) -> &'static str {
        "stage.request_next_scene"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to play a point-of-interest sound.
#[derive(Debug, Clone)]
pub struct RequestPointOfInterest {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Where the sound plays.
    pub position: Position,
    /// Clip key; the configured default when absent.
    pub sound: Option<String>,
}

impl Command for RequestPointOfInterest {
    fn command_type(&self) -> &'static str {
        "stage.request_point_of_interest"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// The viewer grabbed an interactable.
#[derive(Debug, Clone)]
pub struct NotifyGrabbed {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
}

impl Command for NotifyGrabbed {
    fn command_type(&self) -> &'static str {
        "stage.notify_grabbed"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to possess an alternate rig.
#[derive(Debug, Clone)]
pub struct RequestPossession {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Render node of the rig.
    pub rig: NodePath,
    /// Nodes hidden while possessed.
    pub hide: Vec<NodePath>,
}

impl Command for RequestPossession {
    fn command_type(&self) -> &'static str {
        "stage.request_possession"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to leave the possessed rig.
#[derive(Debug, Clone)]
pub struct RequestDispossession {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
}

impl Command for RequestDispossession {
    fn command_type(&self) -> &'static str {
        "stage.request_dispossession"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Any stage command.
#[derive(Debug, Clone)]
pub enum StageCommand {
    /// See [`RequestFrameTransition`].
    FrameTransition(RequestFrameTransition),
    /// See [`RequestSceneTransition`].
    SceneTransition(RequestSceneTransition),
    /// See [`RequestNextScene`].
    NextScene(RequestNextScene),
    /// See [`RequestPointOfInterest`].
    PointOfInterest(RequestPointOfInterest),
    /// See [`NotifyGrabbed`].
    Grabbed(NotifyGrabbed),
    /// See [`RequestPossession`].
    Possession(RequestPossession),
    /// See [`RequestDispossession`].
    Dispossession(RequestDispossession),
}

impl StageCommand {
    fn inner(&self) -> &dyn Command {
        match self {
            Self::FrameTransition(command) => command,
            Self::SceneTransition(command) => command,
            Self::NextScene(command) => command,
            Self::PointOfInterest(command) => command,
            Self::Grabbed(command) => command,
            Self::Possession(command) => command,
            Self::Dispossession(command) => command,
        }
    }
}

impl Command for StageCommand {
    fn command_type(&self) -> &'static str {
        self.inner().command_type()
    }

    fn correlation_id(&self) -> Uuid {
        self.inner().correlation_id()
    }
}
