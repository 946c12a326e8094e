//! Headless collaborators: every effect the stage asks for is written to
//! the trace instead of a renderer, mixer or controller.

use std::time::Duration;

use stillframe_content::domain::audio::{AudioCatalog, ClipDefinition};
use stillframe_core::effects::{
    AudioEffects, AudioSource, Avatar, BlendMode, Color, ControllerHandle, HapticEffects,
    HapticPulse, Locomotion, NodePath, Position, RenderVisibility, ScreenFade, Scenery,
    SessionControl,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Keyed clip lookup that reports unregistered keys.
#[derive(Debug, Clone, Default)]
pub struct ClipLibrary {
    catalog: AudioCatalog,
}

impl ClipLibrary {
    /// Wraps a compiled catalog.
    #[must_use]
    pub fn new(catalog: AudioCatalog) -> Self {
        Self { catalog }
    }

    /// Looks up `key`, logging at `warn` when it is not registered.
    #[must_use]
    pub fn resolve(&self, key: &str) -> Option<&ClipDefinition> {
        let clip = self.catalog.get(key);
        if clip.is_none() {
            warn!(clip = key, "audio clip not registered");
        }
        clip
    }
}

/// Tracing-backed implementation of every collaborator trait.
#[derive(Debug)]
pub struct HeadlessEffects {
    clips: ClipLibrary,
    controllers: Vec<ControllerHandle>,
    terminated: watch::Sender<bool>,
}

impl HeadlessEffects {
    /// Creates the collaborators with a left and a right controller.
    #[must_use]
    pub fn new(clips: ClipLibrary) -> Self {
        let (terminated, _) = watch::channel(false);
        Self {
            clips,
            controllers: vec![ControllerHandle(0), ControllerHandle(1)],
            terminated,
        }
    }

    /// Resolves once the session asked to terminate.
    #[must_use]
    pub fn termination(&self) -> watch::Receiver<bool> {
        self.terminated.subscribe()
    }

    fn play(&self, key: &str, source: &AudioSource) {
        if let Some(clip) = self.clips.resolve(key) {
            info!(
                clip = key,
                file = %clip.file,
                volume_db = clip.volume_db(),
                looping = clip.looping,
                %source,
                "clip played"
            );
        }
    }
}

impl ScreenFade for HeadlessEffects {
    fn fade_to(&self, color: Color, duration: Duration) {
        debug!(alpha = color.a, secs = duration.as_secs_f64(), "screen fade");
    }
}

impl AudioEffects for HeadlessEffects {
    fn request_clip(&self, key: &str, source: &AudioSource) {
        self.play(key, source);
    }

    fn place_source(&self, source: &AudioSource, position: Position) {
        debug!(%source, x = position.x, y = position.y, z = position.z, "audio source placed");
    }

    fn fade_music_in(&self, duration: Duration) {
        debug!(secs = duration.as_secs_f64(), "music fade in");
    }

    fn fade_music_out(&self, duration: Duration) {
        debug!(secs = duration.as_secs_f64(), "music fade out");
    }

    fn swap_and_fade_music(&self, clip: Option<&str>, duration: Duration) {
        let file = clip
            .and_then(|key| self.clips.resolve(key))
            .map(|clip| clip.file.as_str());
        info!(clip, file, secs = duration.as_secs_f64(), "music swapped");
    }
}

impl HapticEffects for HeadlessEffects {
    fn controllers(&self) -> Vec<ControllerHandle> {
        self.controllers.clone()
    }

    fn pulse(&self, controller: ControllerHandle, pulse: HapticPulse) {
        debug!(
            controller = controller.0,
            amplitude = pulse.amplitude,
            frequency = pulse.frequency,
            "haptic pulse"
        );
    }
}

impl Locomotion for HeadlessEffects {
    fn suspend(&self) {
        debug!("locomotion suspended");
    }

    fn resume(&self) {
        debug!("locomotion resumed");
    }
}

impl RenderVisibility for HeadlessEffects {
    fn set_active(&self, node: &NodePath, active: bool) {
        debug!(%node, active, "node activation");
    }

    fn set_opacity(&self, node: &NodePath, opacity: f32) {
        debug!(%node, opacity, "node opacity");
    }

    fn set_blend_mode(&self, node: &NodePath, mode: BlendMode) {
        debug!(%node, ?mode, "node blend mode");
    }
}

impl Avatar for HeadlessEffects {
    fn set_hands_visible(&self, visible: bool) {
        debug!(visible, "hands visibility");
    }
}

impl Scenery for HeadlessEffects {
    fn reset_pose(&self, node: &NodePath) {
        debug!(%node, "pose reset");
    }
}

impl SessionControl for HeadlessEffects {
    fn terminate(&self) {
        info!("session termination requested");
        self.terminated.send_replace(true);
    }
}
