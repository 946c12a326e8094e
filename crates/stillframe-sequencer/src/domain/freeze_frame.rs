//! A single narrative beat and its fade lifecycle.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use stillframe_core::effects::{BlendMode, NodePath};
use stillframe_core::error::StageError;
use tracing::{debug, warn};

use super::behavior::FrameBehavior;
use super::context::{StageContext, StageTask};
use super::definition::PointOfInterest;
use super::events::StageEventKind;
use super::fader::{FadeDirection, Fader};
use super::ids::{FrameId, SceneId};

/// The render nodes a frame owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameLayers {
    /// The whole frame subtree.
    pub root: NodePath,
    /// Content that fades both in and out.
    pub fade: NodePath,
    /// Content that fades in but disappears instantly on exit.
    pub start_fade_only: NodePath,
    /// Content that appears instantly but fades out.
    pub end_fade_only: NodePath,
    /// Content that never fades; hidden instantly on exit.
    pub no_fade: NodePath,
}

impl FrameLayers {
    /// The conventional layer nodes under `root`.
    #[must_use]
    pub fn under(root: NodePath) -> Self {
        Self {
            fade: root.child("fade"),
            start_fade_only: root.child("start_fade_only"),
            end_fade_only: root.child("end_fade_only"),
            no_fade: root.child("no_fade"),
            root,
        }
    }
}

/// Fade progress of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeState {
    /// No fade running.
    Idle,
    /// Fading in.
    FadingIn,
    /// Fading out.
    FadingOut,
}

/// Everything the graph builder resolves for a frame.
#[derive(Debug)]
pub(crate) struct FrameSettings {
    pub(crate) name: String,
    pub(crate) scene: SceneId,
    pub(crate) layers: FrameLayers,
    pub(crate) is_start_frame: bool,
    pub(crate) is_end_frame: bool,
    pub(crate) auto_progress_target: Option<FrameId>,
    pub(crate) auto_progress_delay: Duration,
    pub(crate) own_fade_duration: Option<Duration>,
    pub(crate) point_of_interest: Option<PointOfInterest>,
    pub(crate) cue_delay: Option<Duration>,
    pub(crate) behaviors: Vec<Box<dyn FrameBehavior>>,
}

/// A freeze frame.
#[derive(Debug)]
pub struct FreezeFrame {
    id: FrameId,
    settings: FrameSettings,
    fader: Fader,
    fade_generation: u64,
    active: bool,
}

impl FreezeFrame {
    pub(crate) fn new(id: FrameId, settings: FrameSettings) -> Self {
        Self {
            id,
            active: settings.is_start_frame,
            settings,
            fader: Fader::default(),
            fade_generation: 0,
        }
    }

    /// Index of the frame.
    #[must_use]
    pub fn id(&self) -> FrameId {
        self.id
    }

    /// Unique frame name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.settings.name
    }

    /// Scene the frame belongs to.
    #[must_use]
    pub fn scene(&self) -> SceneId {
        self.settings.scene
    }

    /// Render nodes of the frame.
    #[must_use]
    pub fn layers(&self) -> &FrameLayers {
        &self.settings.layers
    }

    /// Whether this is its scene's start frame.
    #[must_use]
    pub fn is_start_frame(&self) -> bool {
        self.settings.is_start_frame
    }

    /// Whether completing this frame leaves the scene.
    #[must_use]
    pub fn is_end_frame(&self) -> bool {
        self.settings.is_end_frame
    }

    /// A frame waits for the viewer when nothing moves it on automatically.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        self.settings.auto_progress_target.is_none() && !self.settings.is_end_frame
    }

    /// Frame that follows automatically.
    #[must_use]
    pub fn auto_progress_target(&self) -> Option<FrameId> {
        self.settings.auto_progress_target
    }

    /// Delay before auto-progression or scene exit.
    #[must_use]
    pub fn auto_progress_delay(&self) -> Duration {
        self.settings.auto_progress_delay
    }

    /// Fade used for this frame's auto-progression.
    #[must_use]
    pub fn own_fade_duration(&self) -> Option<Duration> {
        self.settings.own_fade_duration
    }

    /// Haptic cue delay override.
    #[must_use]
    pub fn cue_delay(&self) -> Option<Duration> {
        self.settings.cue_delay
    }

    /// Current fade state.
    #[must_use]
    pub fn fade_state(&self) -> FadeState {
        match self.fader.running() {
            None => FadeState::Idle,
            Some(FadeDirection::In) => FadeState::FadingIn,
            Some(FadeDirection::Out) => FadeState::FadingOut,
        }
    }

    /// Whether the frame's render subtree is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Load-time setup: every frame but the scene's start frame is hidden
    /// and made transparent so it can fade in later.
    pub(crate) fn prepare(&mut self, ctx: &StageContext) {
        if self.settings.is_start_frame {
            return;
        }
        self.set_transparent(ctx);
        self.write_opacity(0.0, FadeDirection::In, ctx);
        self.set_root_active(false, ctx);
    }

    /// Activates the frame and fades it in. The point-of-interest cue and the
    /// start notifications go out immediately, not when the fade finishes.
    pub(crate) fn start_frame(&mut self, duration: Duration, ctx: &mut StageContext) {
        self.set_root_active(true, ctx);
        self.show_instant_layers(ctx);
        self.begin_fade(FadeDirection::In, duration, ctx);

        if let Some(poi) = &self.settings.point_of_interest {
            ctx.point_of_interest(poi.position, poi.sound.as_deref());
        }
        if self.is_interactive() {
            ctx.emit(StageEventKind::InteractiveFrameStarted {
                frame: self.settings.name.clone(),
            });
        }
        ctx.emit(StageEventKind::FrameStarted {
            frame: self.settings.name.clone(),
        });
        for behavior in &self.settings.behaviors {
            behavior.on_frame_started(&self.settings.name, ctx.effects());
        }
    }

    /// Hides the instant layers at once and fades the rest out.
    pub(crate) fn end_frame(&mut self, duration: Duration, ctx: &mut StageContext) {
        let render = &ctx.effects().render;
        // Hidden before the fade so they never stack with the next frame.
        render.set_active(&self.settings.layers.no_fade, false);
        render.set_active(&self.settings.layers.start_fade_only, false);
        self.begin_fade(FadeDirection::Out, duration, ctx);

        ctx.emit(StageEventKind::FrameEnded {
            frame: self.settings.name.clone(),
        });
    }

    /// Scene-entry hook for a start frame: the frame is shown as it is,
    /// without a fade, and its progression policy kicks in right away.
    pub(crate) fn begin_progression(&mut self, ctx: &mut StageContext) {
        self.interrupt_fade();
        self.set_root_active(true, ctx);
        self.show_instant_layers(ctx);
        self.write_opacity(1.0, FadeDirection::In, ctx);
        self.write_opacity(1.0, FadeDirection::Out, ctx);
        self.set_opaque(ctx);

        if self.is_interactive() {
            ctx.emit(StageEventKind::InteractiveFrameStarted {
                frame: self.settings.name.clone(),
            });
        }
        ctx.emit(StageEventKind::FrameStarted {
            frame: self.settings.name.clone(),
        });
        for behavior in &self.settings.behaviors {
            behavior.on_frame_started(&self.settings.name, ctx.effects());
        }
        self.schedule_follow_up(ctx);
    }

    /// Scene-exit hook: drops any running fade and hides every frame but
    /// the start frame, leaving the frame as it was after load.
    pub(crate) fn put_away(&mut self, ctx: &StageContext) {
        self.interrupt_fade();
        self.prepare(ctx);
    }

    /// Completion of the fade started under `generation`. Stale completions
    /// (the fade was interrupted by a scene entry) are ignored.
    pub(crate) fn complete_fade(&mut self, generation: u64, ctx: &mut StageContext) {
        if generation != self.fade_generation {
            return;
        }
        let Some(direction) = self.fader.finish() else {
            return;
        };
        self.write_opacity(direction.target_opacity(), direction, ctx);
        match direction {
            FadeDirection::In => {
                self.set_opaque(ctx);
                self.schedule_follow_up(ctx);
            }
            FadeDirection::Out => self.set_root_active(false, ctx),
        }
        debug!(frame = %self.settings.name, ?direction, "fade completed");
        ctx.emit(StageEventKind::FadeCompleted {
            frame: self.settings.name.clone(),
            direction,
        });
    }

    /// Per-tick opacity write for a running fade.
    pub(crate) fn sample_fade(&self, ctx: &StageContext) {
        if let (Some(direction), Some(opacity)) =
            (self.fader.running(), self.fader.sample(ctx.now()))
        {
            self.write_opacity(opacity, direction, ctx);
        }
    }

    /// Forwards a haptic cue to the attached behaviors.
    pub(crate) fn haptic_cue(&self, clip: Option<&str>, ctx: &StageContext) {
        for behavior in &self.settings.behaviors {
            behavior.on_haptic_cue(clip, ctx.effects());
        }
    }

    fn interrupt_fade(&mut self) {
        self.fade_generation += 1;
        if let Some(direction) = self.fader.finish() {
            debug!(frame = %self.settings.name, ?direction, "fade interrupted");
        }
    }

    fn begin_fade(&mut self, direction: FadeDirection, duration: Duration, ctx: &mut StageContext) {
        match self.fader.begin(direction, duration, ctx.now()) {
            Ok(opacity) => {
                self.fade_generation += 1;
                self.set_transparent(ctx);
                self.write_opacity(opacity, direction, ctx);
                ctx.schedule(
                    duration,
                    StageTask::FadeCompleted {
                        frame: self.id,
                        generation: self.fade_generation,
                    },
                );
                debug!(
                    frame = %self.settings.name,
                    ?direction,
                    duration_secs = duration.as_secs_f64(),
                    "fade started"
                );
            }
            Err(busy) => {
                let error = StageError::FadeInProgress(self.settings.name.clone());
                warn!(
                    %error,
                    requested = ?direction,
                    running = ?busy.running,
                    "fade request dropped"
                );
                ctx.emit(StageEventKind::FadeRejected {
                    frame: self.settings.name.clone(),
                    requested: direction,
                });
            }
        }
    }

    fn schedule_follow_up(&self, ctx: &mut StageContext) {
        let delay = self.settings.auto_progress_delay;
        if self.settings.is_end_frame {
            ctx.schedule(delay, StageTask::LeaveScene { from: self.id });
        } else if let Some(to) = self.settings.auto_progress_target {
            ctx.schedule(
                delay,
                StageTask::AutoProgress {
                    from: self.id,
                    to,
                    fade: self.settings.own_fade_duration,
                },
            );
        }
    }

    fn show_instant_layers(&self, ctx: &StageContext) {
        let render = &ctx.effects().render;
        render.set_active(&self.settings.layers.no_fade, true);
        render.set_active(&self.settings.layers.start_fade_only, true);
    }

    fn set_root_active(&mut self, active: bool, ctx: &StageContext) {
        ctx.effects()
            .render
            .set_active(&self.settings.layers.root, active);
        self.active = active;
    }

    fn write_opacity(&self, opacity: f32, direction: FadeDirection, ctx: &StageContext) {
        let render = &ctx.effects().render;
        let layers = &self.settings.layers;
        render.set_opacity(&layers.fade, opacity);
        match direction {
            FadeDirection::In => render.set_opacity(&layers.start_fade_only, opacity),
            FadeDirection::Out => render.set_opacity(&layers.end_fade_only, opacity),
        }
    }

    fn set_transparent(&self, ctx: &StageContext) {
        let render = &ctx.effects().render;
        let layers = &self.settings.layers;
        render.set_blend_mode(&layers.fade, BlendMode::Transparent);
        render.set_blend_mode(&layers.start_fade_only, BlendMode::Transparent);
    }

    fn set_opaque(&self, ctx: &StageContext) {
        let render = &ctx.effects().render;
        let layers = &self.settings.layers;
        render.set_blend_mode(&layers.fade, BlendMode::Opaque);
        render.set_blend_mode(&layers.end_fade_only, BlendMode::Opaque);
        render.set_blend_mode(&layers.start_fade_only, BlendMode::Opaque);
    }
}
