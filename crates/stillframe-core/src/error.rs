//! Stage error types.

use thiserror::Error;

/// Top-level error type for the sequencer.
///
/// None of these are fatal. A rejected request leaves the stage untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StageError {
    /// A fade was requested on a frame that is already fading.
    #[error("fade already in progress on frame {0}")]
    FadeInProgress(String),

    /// A named frame, scene or trigger does not exist.
    #[error("{kind} not found: {name}")]
    NotFound {
        /// What was looked up ("frame", "scene", "trigger").
        kind: &'static str,
        /// The name that failed to resolve.
        name: String,
    },

    /// A frame transition targeted a frame of another scene.
    #[error("frame {frame} does not belong to scene {scene}")]
    FrameOutsideScene {
        /// The requested frame.
        frame: String,
        /// The scene that is currently enabled.
        scene: String,
    },

    /// A scene transition is already running.
    #[error("scene transition to {0} already in flight")]
    TransitionInFlight(String),

    /// A possession sequence is already running or the rig is already possessed.
    #[error("possession already in progress")]
    PossessionInFlight,

    /// The exit sequence has started; no further requests are accepted.
    #[error("session is ending")]
    SessionEnding,

    /// Invalid configuration or request input.
    #[error("validation error: {0}")]
    Validation(String),

    /// The stage executor is unavailable.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
