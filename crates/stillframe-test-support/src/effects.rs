//! Recording collaborators — every capability call is appended to one
//! ordered log so tests can assert on exact effect sequences.

use std::sync::Mutex;
use std::time::Duration;

use stillframe_core::effects::{
    AudioEffects, AudioSource, Avatar, BlendMode, Color, ControllerHandle, HapticEffects,
    HapticPulse, Locomotion, NodePath, Position, RenderVisibility, Scenery, ScreenFade,
    SessionControl,
};

/// One recorded collaborator call.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// `ScreenFade::fade_to`.
    ScreenFade(Color, Duration),
    /// `AudioEffects::request_clip`.
    Clip(String, AudioSource),
    /// `AudioEffects::place_source`.
    PlaceSource(AudioSource, Position),
    /// `AudioEffects::fade_music_in`.
    MusicIn(Duration),
    /// `AudioEffects::fade_music_out`.
    MusicOut(Duration),
    /// `AudioEffects::swap_and_fade_music`.
    MusicSwap(Option<String>, Duration),
    /// `HapticEffects::pulse`.
    Pulse(ControllerHandle, HapticPulse),
    /// `Locomotion::suspend`.
    LocomotionSuspended,
    /// `Locomotion::resume`.
    LocomotionResumed,
    /// `RenderVisibility::set_active`.
    Active(NodePath, bool),
    /// `RenderVisibility::set_opacity`.
    Opacity(NodePath, f32),
    /// `RenderVisibility::set_blend_mode`.
    Blend(NodePath, BlendMode),
    /// `Avatar::set_hands_visible`.
    Hands(bool),
    /// `Scenery::reset_pose`.
    ResetPose(NodePath),
    /// `SessionControl::terminate`.
    Terminate,
}

/// Implements every capability trait by recording the call.
#[derive(Debug)]
pub struct RecordingEffects {
    controllers: Vec<ControllerHandle>,
    log: Mutex<Vec<Effect>>,
}

impl Default for RecordingEffects {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingEffects {
    /// Creates a recorder with two tracked controllers.
    #[must_use]
    pub fn new() -> Self {
        Self::with_controllers(vec![ControllerHandle(0), ControllerHandle(1)])
    }

    /// Creates a recorder reporting the given controllers.
    #[must_use]
    pub fn with_controllers(controllers: Vec<ControllerHandle>) -> Self {
        Self {
            controllers,
            log: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of every recorded call.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn effects(&self) -> Vec<Effect> {
        self.log.lock().unwrap().clone()
    }

    /// Forgets everything recorded so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }

    /// Number of recorded calls matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&Effect) -> bool) -> usize {
        self.effects().iter().filter(|effect| predicate(effect)).count()
    }

    /// Activation toggles on nodes at or under `root`, in call order.
    pub fn activations_under(&self, root: &NodePath) -> Vec<(NodePath, bool)> {
        self.effects()
            .into_iter()
            .filter_map(|effect| match effect {
                Effect::Active(node, active) if node.is_within(root) => Some((node, active)),
                _ => None,
            })
            .collect()
    }

    /// Opacity writes to exactly `node`, in call order.
    pub fn opacities_of(&self, node: &NodePath) -> Vec<f32> {
        self.effects()
            .into_iter()
            .filter_map(|effect| match effect {
                Effect::Opacity(target, opacity) if &target == node => Some(opacity),
                _ => None,
            })
            .collect()
    }

    /// The last activation written to `node`, if any.
    pub fn last_active(&self, node: &NodePath) -> Option<bool> {
        self.effects().into_iter().rev().find_map(|effect| match effect {
            Effect::Active(target, active) if &target == node => Some(active),
            _ => None,
        })
    }

    fn record(&self, effect: Effect) {
        self.log.lock().unwrap().push(effect);
    }
}

impl ScreenFade for RecordingEffects {
    fn fade_to(&self, color: Color, duration: Duration) {
        self.record(Effect::ScreenFade(color, duration));
    }
}

impl AudioEffects for RecordingEffects {
    fn request_clip(&self, key: &str, source: &AudioSource) {
        self.record(Effect::Clip(key.to_owned(), source.clone()));
    }

    fn place_source(&self, source: &AudioSource, position: Position) {
        self.record(Effect::PlaceSource(source.clone(), position));
    }

    fn fade_music_in(&self, duration: Duration) {
        self.record(Effect::MusicIn(duration));
    }

    fn fade_music_out(&self, duration: Duration) {
        self.record(Effect::MusicOut(duration));
    }

    fn swap_and_fade_music(&self, clip: Option<&str>, duration: Duration) {
        self.record(Effect::MusicSwap(clip.map(str::to_owned), duration));
    }
}

impl HapticEffects for RecordingEffects {
    fn controllers(&self) -> Vec<ControllerHandle> {
        self.controllers.clone()
    }

    fn pulse(&self, controller: ControllerHandle, pulse: HapticPulse) {
        self.record(Effect::Pulse(controller, pulse));
    }
}

impl Locomotion for RecordingEffects {
    fn suspend(&self) {
        self.record(Effect::LocomotionSuspended);
    }

    fn resume(&self) {
        self.record(Effect::LocomotionResumed);
    }
}

impl RenderVisibility for RecordingEffects {
    fn set_active(&self, node: &NodePath, active: bool) {
        self.record(Effect::Active(node.clone(), active));
    }

    fn set_opacity(&self, node: &NodePath, opacity: f32) {
        self.record(Effect::Opacity(node.clone(), opacity));
    }

    fn set_blend_mode(&self, node: &NodePath, mode: BlendMode) {
        self.record(Effect::Blend(node.clone(), mode));
    }
}

impl Avatar for RecordingEffects {
    fn set_hands_visible(&self, visible: bool) {
        self.record(Effect::Hands(visible));
    }
}

impl Scenery for RecordingEffects {
    fn reset_pose(&self, node: &NodePath) {
        self.record(Effect::ResetPose(node.clone()));
    }
}

impl SessionControl for RecordingEffects {
    fn terminate(&self) {
        self.record(Effect::Terminate);
    }
}
