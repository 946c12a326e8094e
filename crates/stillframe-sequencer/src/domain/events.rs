//! Stage events recorded by the orchestrator.

use serde::{Deserialize, Serialize};
use stillframe_core::effects::Position;
use stillframe_core::event::{DomainEvent, EventMetadata};

use super::fader::FadeDirection;

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StageEventKind {
    /// A frame began its fade-in (or was entered as a scene's start frame).
    FrameStarted {
        /// Frame name.
        frame: String,
    },
    /// A frame began its fade-out.
    FrameEnded {
        /// Frame name.
        frame: String,
    },
    /// A frame that waits for the viewer started.
    InteractiveFrameStarted {
        /// Frame name.
        frame: String,
    },
    /// A frame fade reached its bound.
    FadeCompleted {
        /// Frame name.
        frame: String,
        /// Which fade finished.
        direction: FadeDirection,
    },
    /// A fade was requested while another was running and was dropped.
    FadeRejected {
        /// Frame name.
        frame: String,
        /// The fade that was asked for.
        requested: FadeDirection,
    },
    /// The point-of-interest emitter was moved and asked to play.
    PointOfInterest {
        /// Emitter position.
        position: Position,
        /// Clip key.
        sound: String,
    },
    /// A scene switch away from `scene` began.
    SceneSwitchTriggered {
        /// Outgoing scene.
        scene: String,
    },
    /// A scene was enabled and became current.
    SceneEntered {
        /// Incoming scene.
        scene: String,
        /// Its start frame.
        frame: String,
    },
    /// A scene switch fully finished.
    SceneSwitchFinished {
        /// Incoming scene.
        scene: String,
    },
    /// The haptic cue loop was (re)started for an interactive frame.
    HapticLoopStarted {
        /// Frame name.
        frame: String,
    },
    /// One haptic cue was delivered.
    HapticCue {
        /// Clip played by the frame's cue sources.
        clip: Option<String>,
    },
    /// The haptic cue loop stopped.
    HapticLoopStopped {
        /// Why it stopped.
        reason: HapticStopReason,
    },
    /// Possession was entered or left.
    PossessionChanged {
        /// New state.
        possessed: bool,
    },
    /// The exit sequence began.
    SessionEnding,
    /// Termination of the session was requested.
    SessionTerminated,
}

/// Why the haptic cue loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HapticStopReason {
    /// The viewer grabbed an object.
    Grabbed,
    /// The frame changed.
    FrameChanged,
}

impl StageEventKind {
    /// Routing name of the event.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::FrameStarted { .. } => "stage.frame_started",
            Self::FrameEnded { .. } => "stage.frame_ended",
            Self::InteractiveFrameStarted { .. } => "stage.interactive_frame_started",
            Self::FadeCompleted { .. } => "stage.fade_completed",
            Self::FadeRejected { .. } => "stage.fade_rejected",
            Self::PointOfInterest { .. } => "stage.point_of_interest",
            Self::SceneSwitchTriggered { .. } => "stage.scene_switch_triggered",
            Self::SceneEntered { .. } => "stage.scene_entered",
            Self::SceneSwitchFinished { .. } => "stage.scene_switch_finished",
            Self::HapticLoopStarted { .. } => "stage.haptic_loop_started",
            Self::HapticCue { .. } => "stage.haptic_cue",
            Self::HapticLoopStopped { .. } => "stage.haptic_loop_stopped",
            Self::PossessionChanged { .. } => "stage.possession_changed",
            Self::SessionEnding => "stage.session_ending",
            Self::SessionTerminated => "stage.session_terminated",
        }
    }
}

/// Stage event envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: StageEventKind,
}

impl DomainEvent for StageEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("StageEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
