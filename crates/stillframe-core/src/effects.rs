//! Capability interfaces for the collaborators the sequencer drives.
//!
//! Every call is a one-way request. The sequencer never depends on a return
//! value for correctness, so implementations are free to queue, drop or log.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Path of a node in the render hierarchy, e.g. `kitchen/pour_tea/no_fade`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(String);

impl NodePath {
    /// Creates a node path from its string form.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Returns the path of a direct child.
    #[must_use]
    pub fn child(&self, segment: &str) -> Self {
        Self(format!("{}/{segment}", self.0))
    }

    /// The string form of the path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `self` is `other` or lies underneath it.
    #[must_use]
    pub fn is_within(&self, other: &NodePath) -> bool {
        self.0 == other.0
            || self
                .0
                .strip_prefix(other.0.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Linear RGBA color used for screen fades.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red channel.
    pub r: f32,
    /// Green channel.
    pub g: f32,
    /// Blue channel.
    pub b: f32,
    /// Alpha channel.
    pub a: f32,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);
    /// Fully transparent.
    pub const CLEAR: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    /// Builds a color from its channels.
    #[must_use]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// World-space position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
    /// Z coordinate.
    pub z: f32,
}

impl Position {
    /// Builds a position.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Material blend mode of a render node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Alpha-blended, used while a fade runs.
    Transparent,
    /// Solid, used at rest.
    Opaque,
}

/// Named audio emitter in the world (the point-of-interest source, an
/// interactable's own source, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioSource(pub String);

impl fmt::Display for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tracked hand controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControllerHandle(pub u32);

/// Parameters of one haptic pulse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HapticPulse {
    /// Strength in `[0, 1]`.
    pub amplitude: f32,
    /// Vibration frequency.
    pub frequency: f32,
    /// Length of the pulse.
    #[serde(with = "crate::seconds")]
    pub duration: Duration,
}

impl Default for HapticPulse {
    fn default() -> Self {
        Self {
            amplitude: 0.8,
            frequency: 1.0,
            duration: Duration::from_millis(10),
        }
    }
}

/// Full-screen color fade over the viewer's eyes.
pub trait ScreenFade: Send + Sync {
    /// Fades the screen toward `color` over `duration`.
    fn fade_to(&self, color: Color, duration: Duration);
}

/// Music and one-shot clip playback.
pub trait AudioEffects: Send + Sync {
    /// Plays the clip registered under `key` through `source`. Unknown keys
    /// are logged and ignored.
    fn request_clip(&self, key: &str, source: &AudioSource);

    /// Moves an audio emitter.
    fn place_source(&self, source: &AudioSource, position: Position);

    /// Fades the music bus in.
    fn fade_music_in(&self, duration: Duration);

    /// Fades the music bus out.
    fn fade_music_out(&self, duration: Duration);

    /// Swaps the music track (or keeps the current one when `clip` is
    /// `None`) and fades it in.
    fn swap_and_fade_music(&self, clip: Option<&str>, duration: Duration);
}

/// Controller vibration.
pub trait HapticEffects: Send + Sync {
    /// Controllers currently tracked.
    fn controllers(&self) -> Vec<ControllerHandle>;

    /// Triggers one pulse on `controller`.
    fn pulse(&self, controller: ControllerHandle, pulse: HapticPulse);
}

/// Coarse control over free movement.
pub trait Locomotion: Send + Sync {
    /// Stops free movement.
    fn suspend(&self);

    /// Restores free movement.
    fn resume(&self);
}

/// Per-node visibility of the render hierarchy.
pub trait RenderVisibility: Send + Sync {
    /// Activates or deactivates a node and its subtree.
    fn set_active(&self, node: &NodePath, active: bool);

    /// Writes the opacity of every material under `node`.
    fn set_opacity(&self, node: &NodePath, opacity: f32);

    /// Switches the blend mode of every material under `node`.
    fn set_blend_mode(&self, node: &NodePath, mode: BlendMode);
}

/// The viewer's own body representation.
pub trait Avatar: Send + Sync {
    /// Shows or hides the hand models.
    fn set_hands_visible(&self, visible: bool);
}

/// Placement of movable scene props.
pub trait Scenery: Send + Sync {
    /// Releases the prop from any snap zone and restores its origin pose.
    fn reset_pose(&self, node: &NodePath);
}

/// Process-level session control.
pub trait SessionControl: Send + Sync {
    /// Ends the experience.
    fn terminate(&self);
}

/// The full set of collaborators handed to the sequencer at startup.
#[derive(Clone)]
pub struct Collaborators {
    /// Screen fades.
    pub screen: Arc<dyn ScreenFade>,
    /// Music and clips.
    pub audio: Arc<dyn AudioEffects>,
    /// Controller vibration.
    pub haptics: Arc<dyn HapticEffects>,
    /// Free movement.
    pub locomotion: Arc<dyn Locomotion>,
    /// Render node visibility.
    pub render: Arc<dyn RenderVisibility>,
    /// Hand models.
    pub avatar: Arc<dyn Avatar>,
    /// Prop placement.
    pub scenery: Arc<dyn Scenery>,
    /// Session termination.
    pub session: Arc<dyn SessionControl>,
}

impl Collaborators {
    /// Uses one object for every capability.
    pub fn uniform<T>(effects: &Arc<T>) -> Self
    where
        T: ScreenFade
            + AudioEffects
            + HapticEffects
            + Locomotion
            + RenderVisibility
            + Avatar
            + Scenery
            + SessionControl
            + 'static,
    {
        Self {
            screen: effects.clone(),
            audio: effects.clone(),
            haptics: effects.clone(),
            locomotion: effects.clone(),
            render: effects.clone(),
            avatar: effects.clone(),
            scenery: effects.clone(),
            session: effects.clone(),
        }
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
