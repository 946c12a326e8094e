//! Authoring-side description of a story: scenes, their frames and the
//! behaviors attached to them. Names are resolved into a
//! [`StoryGraph`](super::graph::StoryGraph) by the graph builder.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use stillframe_core::effects::{AudioSource, NodePath, Position};

fn default_auto_progress_delay() -> Duration {
    Duration::from_secs(15)
}

/// A whole story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoryDefinition {
    /// Scene enabled at startup.
    pub initial_scene: String,
    /// Every scene of the story.
    pub scenes: Vec<SceneDefinition>,
}

/// One scene and its frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneDefinition {
    /// Unique scene name; also the root of its render nodes.
    pub name: String,
    /// Frame shown when the scene is entered.
    pub start_frame: String,
    /// Successor used by `RequestNextScene`; the story ends after a scene
    /// without one.
    #[serde(default)]
    pub next_scene: Option<String>,
    /// Music track swapped in when the scene is entered.
    #[serde(default)]
    pub music: Option<String>,
    /// Frames belonging to this scene.
    pub frames: Vec<FrameDefinition>,
}

/// One freeze frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameDefinition {
    /// Unique frame name.
    pub name: String,
    /// Frame that follows automatically after `auto_progress_delay`.
    #[serde(default)]
    pub auto_progress_to: Option<String>,
    /// Delay before auto-progression or, for end frames, the scene exit.
    #[serde(
        default = "default_auto_progress_delay",
        with = "stillframe_core::seconds"
    )]
    pub auto_progress_delay: Duration,
    /// Fade used for this frame's auto-progression instead of the standard.
    #[serde(default, with = "stillframe_core::seconds::option")]
    pub own_fade: Option<Duration>,
    /// Completing this frame's fade-in leaves the scene.
    #[serde(default)]
    pub end_frame: bool,
    /// Audio cue emitted when the frame starts.
    #[serde(default)]
    pub point_of_interest: Option<PointOfInterest>,
    /// Delay before the first haptic pulse when this frame is interactive.
    #[serde(default, with = "stillframe_core::seconds::option")]
    pub cue_delay: Option<Duration>,
    /// Strategies attached to the frame's lifecycle.
    #[serde(default)]
    pub behaviors: Vec<BehaviorDefinition>,
}

impl FrameDefinition {
    /// A frame with default settings.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            auto_progress_to: None,
            auto_progress_delay: default_auto_progress_delay(),
            own_fade: None,
            end_frame: false,
            point_of_interest: None,
            cue_delay: None,
            behaviors: Vec::new(),
        }
    }

    /// Sets the auto-progression target and delay.
    #[must_use]
    pub fn auto_progress(mut self, target: impl Into<String>, delay: Duration) -> Self {
        self.auto_progress_to = Some(target.into());
        self.auto_progress_delay = delay;
        self
    }

    /// Marks the frame as the last of its scene, leaving after `delay`.
    #[must_use]
    pub fn end_after(mut self, delay: Duration) -> Self {
        self.end_frame = true;
        self.auto_progress_delay = delay;
        self
    }

    /// Overrides the auto-progression fade.
    #[must_use]
    pub fn own_fade(mut self, fade: Duration) -> Self {
        self.own_fade = Some(fade);
        self
    }

    /// Adds a point-of-interest cue.
    #[must_use]
    pub fn point_of_interest(mut self, position: Position, sound: Option<&str>) -> Self {
        self.point_of_interest = Some(PointOfInterest {
            position,
            sound: sound.map(str::to_owned),
        });
        self
    }

    /// Overrides the haptic cue delay.
    #[must_use]
    pub fn cue_delay(mut self, delay: Duration) -> Self {
        self.cue_delay = Some(delay);
        self
    }

    /// Attaches a behavior.
    #[must_use]
    pub fn behavior(mut self, behavior: BehaviorDefinition) -> Self {
        self.behaviors.push(behavior);
        self
    }
}

/// World-space audio cue of a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PointOfInterest {
    /// Where the sound plays.
    pub position: Position,
    /// Clip key; the configured default is used when absent.
    #[serde(default)]
    pub sound: Option<String>,
}

/// Behaviors that can be attached to a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BehaviorDefinition {
    /// Plays the haptic cue clip through `source` while the frame is active.
    CueSound {
        /// The interactable's own emitter.
        source: AudioSource,
    },
    /// Puts a prop back to its origin pose whenever the frame starts.
    PositionReset {
        /// The prop's render node.
        node: NodePath,
    },
}

impl SceneDefinition {
    /// A scene whose start frame is its first frame.
    ///
    /// # Panics
    ///
    /// Panics if `frames` is empty.
    #[must_use]
    pub fn new(name: impl Into<String>, frames: Vec<FrameDefinition>) -> Self {
        let start_frame = frames[0].name.clone();
        Self {
            name: name.into(),
            start_frame,
            next_scene: None,
            music: None,
            frames,
        }
    }

    /// Sets the successor scene.
    #[must_use]
    pub fn then(mut self, next: impl Into<String>) -> Self {
        self.next_scene = Some(next.into());
        self
    }

    /// Sets the scene music.
    #[must_use]
    pub fn music(mut self, clip: impl Into<String>) -> Self {
        self.music = Some(clip.into());
        self
    }
}
