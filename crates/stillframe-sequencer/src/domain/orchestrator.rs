//! The orchestrator owns the stage: which scene is enabled, which frame is
//! current, and every timed sequence that moves between them.
//!
//! All mutation happens on the caller's thread through `&mut self`. Timed
//! continuations (fade completions, auto-progression, scene switch phases,
//! the haptic loop) sit on one [`Timeline`](stillframe_core::timeline::Timeline)
//! and only run from [`Orchestrator::advance`], so two of them can never
//! interleave.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stillframe_core::clock::Clock;
use stillframe_core::effects::{Collaborators, Color, ControllerHandle, NodePath, Position};
use stillframe_core::error::StageError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::config::StageConfig;
use super::context::{ExitStep, PossessionStep, StageContext, StageTask, SwitchStep};
use super::events::{HapticStopReason, StageEvent, StageEventKind};
use super::freeze_frame::FadeState;
use super::graph::StoryGraph;
use super::ids::{FrameId, SceneId};

/// Coarse lifecycle of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagePhase {
    /// The startup fade is running; locomotion is suspended.
    Starting,
    /// Normal play.
    Running,
    /// A scene switch is in flight.
    SwitchingScene,
    /// The exit sequence is running.
    Ending,
    /// Termination was requested.
    Terminated,
}

/// Read model of the stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSnapshot {
    /// Enabled scene.
    pub scene: String,
    /// Current frame.
    pub frame: String,
    /// Fade state of the current frame.
    pub frame_fade: FadeState,
    /// Session lifecycle.
    pub phase: StagePhase,
    /// Whether the haptic cue loop is running.
    pub haptic_loop_active: bool,
    /// Whether the viewer is possessing a rig.
    pub possessed: bool,
    /// Target of the scene switch in flight.
    pub scene_in_flight: Option<String>,
    /// Virtual time.
    #[serde(with = "stillframe_core::seconds")]
    pub at: Duration,
}

#[derive(Debug, Clone)]
struct Possession {
    rig: NodePath,
    hidden: Vec<NodePath>,
}

/// The stage orchestrator.
#[derive(Debug)]
pub struct Orchestrator {
    graph: StoryGraph,
    ctx: StageContext,
    current_scene: SceneId,
    current_frame: FrameId,
    phase: StagePhase,
    scene_in_flight: Option<SceneId>,
    haptic_generation: u64,
    haptic_loop_active: bool,
    possession: Option<Possession>,
    possession_in_flight: bool,
    terminated: bool,
}

impl Orchestrator {
    /// Prepares every frame and scene, enables the initial scene and starts
    /// the startup fade.
    #[must_use]
    pub fn launch(
        mut graph: StoryGraph,
        config: StageConfig,
        effects: Collaborators,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut ctx = StageContext::new(effects, config, clock);
        for frame in graph.frames_mut() {
            frame.prepare(&ctx);
        }
        for scene in graph.scenes_mut() {
            scene.disable(&ctx);
        }

        let initial = graph.initial_scene();
        let (scene, start) = graph.scene_and_start_frame(initial);
        scene.enable(start, &mut ctx);
        let start_frame = start.id();

        let startup = ctx.config().startup_fade;
        let effects = ctx.effects();
        effects.screen.fade_to(Color::BLACK, Duration::ZERO);
        effects.screen.fade_to(Color::CLEAR, startup);
        effects.audio.fade_music_in(startup);
        effects.locomotion.suspend();
        ctx.schedule(startup, StageTask::StartupFinished);

        let mut orchestrator = Self {
            graph,
            ctx,
            current_scene: initial,
            current_frame: start_frame,
            phase: StagePhase::Starting,
            scene_in_flight: None,
            haptic_generation: 0,
            haptic_loop_active: false,
            possession: None,
            possession_in_flight: false,
            terminated: false,
        };
        orchestrator.after_frame_started(start_frame);
        info!(
            scene = orchestrator.graph.scene(initial).name(),
            startup_secs = startup.as_secs_f64(),
            "stage launched"
        );
        orchestrator
    }

    /// The story being played.
    #[must_use]
    pub fn graph(&self) -> &StoryGraph {
        &self.graph
    }

    /// Stage configuration.
    #[must_use]
    pub fn config(&self) -> &StageConfig {
        self.ctx.config()
    }

    /// Enabled scene.
    #[must_use]
    pub fn current_scene(&self) -> SceneId {
        self.current_scene
    }

    /// Current frame; always a frame of [`Orchestrator::current_scene`].
    #[must_use]
    pub fn current_frame(&self) -> FrameId {
        self.current_frame
    }

    /// Session lifecycle.
    #[must_use]
    pub fn phase(&self) -> StagePhase {
        self.phase
    }

    /// Whether the haptic cue loop is running.
    #[must_use]
    pub fn haptic_loop_active(&self) -> bool {
        self.haptic_loop_active
    }

    /// Whether the viewer is possessing a rig.
    #[must_use]
    pub fn is_possessed(&self) -> bool {
        self.possession.is_some()
    }

    /// Target of the scene switch in flight.
    #[must_use]
    pub fn scene_in_flight(&self) -> Option<SceneId> {
        self.scene_in_flight
    }

    /// Virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.ctx.now()
    }

    /// Number of timed continuations waiting to run.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.ctx.pending_tasks()
    }

    /// Events recorded since the last drain.
    #[must_use]
    pub fn pending_events(&self) -> &[StageEvent] {
        self.ctx.events()
    }

    /// Takes the recorded events.
    pub fn drain_events(&mut self) -> Vec<StageEvent> {
        self.ctx.take_events()
    }

    /// Tags events emitted from now on, and the tasks they schedule.
    pub fn set_correlation(&mut self, correlation_id: Uuid) {
        self.ctx.set_correlation(correlation_id);
    }

    /// Read model of the stage.
    #[must_use]
    pub fn snapshot(&self) -> StageSnapshot {
        let frame = self.graph.frame(self.current_frame);
        StageSnapshot {
            scene: self.graph.scene(self.current_scene).name().to_owned(),
            frame: frame.name().to_owned(),
            frame_fade: frame.fade_state(),
            phase: self.phase,
            haptic_loop_active: self.haptic_loop_active,
            possessed: self.is_possessed(),
            scene_in_flight: self
                .scene_in_flight
                .map(|scene| self.graph.scene(scene).name().to_owned()),
            at: self.now(),
        }
    }

    /// Moves virtual time forward by `dt`: runs every continuation due in
    /// the window in deadline order, then samples the running fades.
    pub fn advance(&mut self, dt: Duration) {
        let until = self.ctx.now().saturating_add(dt);
        while let Some(task) = self.ctx.pop_due(until) {
            self.run(task);
        }
        self.ctx.settle(until);
        for frame in self.graph.frames() {
            frame.sample_fade(&self.ctx);
        }
    }

    /// Ends the current frame and starts `target`; both fades run at once.
    /// `fade` defaults to the standard frame fade.
    ///
    /// # Errors
    ///
    /// Returns `StageError::SessionEnding` once the exit sequence began,
    /// `StageError::FrameOutsideScene` when `target` is not in the enabled
    /// scene, and `StageError::Validation` when `target` is already current.
    pub fn request_frame_transition(
        &mut self,
        target: FrameId,
        fade: Option<Duration>,
    ) -> Result<(), StageError> {
        self.ensure_live()?;
        let scene = self.graph.scene(self.current_scene);
        if !scene.contains(target) {
            return Err(StageError::FrameOutsideScene {
                frame: self.graph.frame(target).name().to_owned(),
                scene: scene.name().to_owned(),
            });
        }
        if target == self.current_frame {
            return Err(StageError::Validation(format!(
                "frame {} is already current",
                self.graph.frame(target).name()
            )));
        }

        let duration = fade.unwrap_or(self.ctx.config().standard_frame_fade);
        let from = self.current_frame;
        info!(
            from = self.graph.frame(from).name(),
            to = self.graph.frame(target).name(),
            fade_secs = duration.as_secs_f64(),
            "frame transition"
        );
        self.stop_haptic_loop(HapticStopReason::FrameChanged);
        self.graph.frame_mut(from).end_frame(duration, &mut self.ctx);
        self.graph.frame_mut(target).start_frame(duration, &mut self.ctx);
        self.current_frame = target;
        self.after_frame_started(target);
        Ok(())
    }

    /// Starts the fade-out, settle, swap and reveal of a scene switch.
    ///
    /// # Errors
    ///
    /// Returns `StageError::SessionEnding` once the exit sequence began and
    /// `StageError::TransitionInFlight` while another switch runs.
    pub fn request_scene_transition(
        &mut self,
        target: SceneId,
        fade: Duration,
    ) -> Result<(), StageError> {
        self.ensure_live()?;
        self.ensure_no_switch()?;

        let from = self.graph.scene(self.current_scene);
        info!(
            from = from.name(),
            to = self.graph.scene(target).name(),
            fade_secs = fade.as_secs_f64(),
            "scene transition"
        );
        from.on_switch_triggered(&mut self.ctx);
        self.scene_in_flight = Some(target);
        self.phase = StagePhase::SwitchingScene;

        let effects = self.ctx.effects();
        effects.locomotion.suspend();
        effects.screen.fade_to(Color::BLACK, fade);
        effects.audio.fade_music_out(fade);
        self.ctx.schedule(
            fade,
            StageTask::SceneSwitch {
                to: target,
                fade,
                step: SwitchStep::FadedOut,
            },
        );
        Ok(())
    }

    /// Switches to the current scene's successor, or ends the session when
    /// there is none.
    ///
    /// # Errors
    ///
    /// Returns `StageError::SessionEnding` once the exit sequence began and
    /// `StageError::TransitionInFlight` while a scene switch runs.
    pub fn request_next_scene(&mut self) -> Result<(), StageError> {
        self.ensure_live()?;
        self.ensure_no_switch()?;
        match self.graph.scene(self.current_scene).next_scene() {
            Some(next) => self.request_scene_transition(next, self.ctx.config().scene_fade),
            None => {
                self.begin_exit();
                Ok(())
            }
        }
    }

    /// Moves the point-of-interest emitter to `position` and plays `sound`
    /// (or the configured default) through it.
    ///
    /// # Errors
    ///
    /// Returns `StageError::SessionEnding` once the exit sequence began.
    pub fn request_point_of_interest(
        &mut self,
        position: Position,
        sound: Option<&str>,
    ) -> Result<(), StageError> {
        self.ensure_live()?;
        self.ctx.point_of_interest(position, sound);
        Ok(())
    }

    /// The viewer grabbed an object. Stops the haptic cue loop.
    pub fn notify_grabbed(&mut self) {
        if self.stop_haptic_loop(HapticStopReason::Grabbed) {
            info!("haptic cue loop cancelled by grab");
        }
    }

    /// Sends a single configured pulse to `controller`.
    pub fn one_shot_haptic_pulse(&self, controller: ControllerHandle) {
        self.ctx
            .effects()
            .haptics
            .pulse(controller, self.ctx.config().haptic.pulse);
    }

    /// Fades out, swaps the avatar for `rig` while hiding `hide`, then tints
    /// the screen and plays the possession track.
    ///
    /// # Errors
    ///
    /// Returns `StageError::SessionEnding` once the exit sequence began and
    /// `StageError::PossessionInFlight` while possessed or possessing.
    pub fn request_possession(
        &mut self,
        rig: NodePath,
        hide: Vec<NodePath>,
    ) -> Result<(), StageError> {
        self.ensure_live()?;
        if self.possession_in_flight || self.possession.is_some() {
            return Err(StageError::PossessionInFlight);
        }
        info!(%rig, hidden = hide.len(), "possession requested");
        self.possession_in_flight = true;

        let fade = self.ctx.config().possession.fade;
        let effects = self.ctx.effects();
        effects.locomotion.suspend();
        effects.screen.fade_to(Color::BLACK, fade);
        effects.audio.fade_music_out(fade);
        let scene = self.current_scene;
        self.ctx.schedule(
            fade,
            StageTask::Possession(PossessionStep::Swap { scene, rig, hide }),
        );
        Ok(())
    }

    /// Restores the avatar, clears the tint and resumes locomotion.
    ///
    /// # Errors
    ///
    /// Returns `StageError::SessionEnding` once the exit sequence began and
    /// `StageError::Validation` when nothing is possessed.
    pub fn request_dispossession(&mut self) -> Result<(), StageError> {
        self.ensure_live()?;
        if self.possession.is_none() {
            return Err(StageError::Validation("nothing is possessed".to_owned()));
        }
        let fade = self.ctx.config().possession.fade;
        self.ctx.effects().screen.fade_to(Color::CLEAR, fade);
        self.dispossess(true);
        Ok(())
    }

    fn ensure_live(&self) -> Result<(), StageError> {
        match self.phase {
            StagePhase::Ending | StagePhase::Terminated => Err(StageError::SessionEnding),
            _ => Ok(()),
        }
    }

    fn ensure_no_switch(&self) -> Result<(), StageError> {
        match self.scene_in_flight {
            Some(scene) => Err(StageError::TransitionInFlight(
                self.graph.scene(scene).name().to_owned(),
            )),
            None => Ok(()),
        }
    }

    fn run(&mut self, task: StageTask) {
        match task {
            StageTask::FadeCompleted { frame, generation } => {
                self.graph
                    .frame_mut(frame)
                    .complete_fade(generation, &mut self.ctx);
            }
            StageTask::AutoProgress { from, to, fade } => {
                if let Err(error) = self.request_frame_transition(to, fade) {
                    warn!(
                        %error,
                        from = self.graph.frame(from).name(),
                        "auto-progression dropped"
                    );
                }
            }
            StageTask::LeaveScene { from } => self.leave_scene(from),
            StageTask::SceneSwitch { to, fade, step } => self.switch_step(to, fade, step),
            StageTask::StartupFinished => {
                if self.phase == StagePhase::Starting {
                    self.ctx.effects().locomotion.resume();
                    self.phase = StagePhase::Running;
                    info!("startup finished");
                }
            }
            StageTask::Exit(step) => self.exit_step(step),
            StageTask::Possession(step) => self.possession_step(step),
            StageTask::HapticPulse { generation } => self.haptic_pulse(generation),
        }
    }

    fn leave_scene(&mut self, from: FrameId) {
        if self.graph.frame(from).scene() != self.current_scene {
            debug!(
                frame = self.graph.frame(from).name(),
                "scene exit of a scene that is no longer enabled skipped"
            );
            return;
        }
        if let Err(error) = self.request_next_scene() {
            warn!(
                %error,
                frame = self.graph.frame(from).name(),
                "end-frame scene exit dropped"
            );
        }
    }

    fn switch_step(&mut self, to: SceneId, fade: Duration, step: SwitchStep) {
        match step {
            SwitchStep::FadedOut => {
                let settle = self.ctx.config().scene_settle_delay;
                self.ctx.schedule(
                    settle,
                    StageTask::SceneSwitch {
                        to,
                        fade,
                        step: SwitchStep::Settled,
                    },
                );
            }
            SwitchStep::Settled => self.swap_scenes(to, fade),
            SwitchStep::Revealed => {
                self.ctx.effects().locomotion.resume();
                self.graph.scene(to).on_switch_finished(&mut self.ctx);
                self.scene_in_flight = None;
                if self.phase == StagePhase::SwitchingScene {
                    self.phase = StagePhase::Running;
                }
                info!(scene = self.graph.scene(to).name(), "scene switch finished");
            }
        }
    }

    fn swap_scenes(&mut self, to: SceneId, fade: Duration) {
        if self.possession.is_some() {
            self.dispossess(false);
        }
        self.stop_haptic_loop(HapticStopReason::FrameChanged);

        let from = self.current_scene;
        let leaving = self.graph.scene(from).frames().to_vec();
        for frame in leaving {
            self.graph.frame_mut(frame).put_away(&self.ctx);
        }
        self.graph.scene_mut(from).disable(&self.ctx);

        let (scene, start) = self.graph.scene_and_start_frame(to);
        scene.enable(start, &mut self.ctx);
        let start_frame = start.id();
        let music = scene.music().map(str::to_owned);
        self.current_scene = to;
        self.current_frame = start_frame;
        self.after_frame_started(start_frame);

        let effects = self.ctx.effects();
        effects.screen.fade_to(Color::CLEAR, fade);
        effects.audio.swap_and_fade_music(music.as_deref(), fade);
        self.ctx.schedule(
            fade,
            StageTask::SceneSwitch {
                to,
                fade,
                step: SwitchStep::Revealed,
            },
        );
    }

    fn begin_exit(&mut self) {
        info!(
            scene = self.graph.scene(self.current_scene).name(),
            "no successor scene; ending session"
        );
        self.phase = StagePhase::Ending;
        // Cancelled without a stop event; the session is over.
        self.haptic_generation += 1;
        self.haptic_loop_active = false;
        self.ctx.emit(StageEventKind::SessionEnding);

        let config = self.ctx.config();
        let (fade, delay) = (config.startup_fade, config.exit_audio_delay);
        let effects = self.ctx.effects();
        effects.locomotion.suspend();
        effects.screen.fade_to(Color::BLACK, fade);
        self.ctx
            .schedule(delay, StageTask::Exit(ExitStep::FadeMusic));
    }

    fn exit_step(&mut self, step: ExitStep) {
        match step {
            ExitStep::FadeMusic => {
                let fade = self.ctx.config().startup_fade;
                self.ctx.effects().audio.fade_music_out(fade);
                self.ctx
                    .schedule(fade, StageTask::Exit(ExitStep::Terminate));
            }
            ExitStep::Terminate => {
                if self.terminated {
                    return;
                }
                self.terminated = true;
                self.phase = StagePhase::Terminated;
                self.ctx.effects().session.terminate();
                self.ctx.emit(StageEventKind::SessionTerminated);
                info!("session termination requested");
            }
        }
    }

    fn possession_step(&mut self, step: PossessionStep) {
        let config = &self.ctx.config().possession;
        let (fade, hold, tint) = (config.fade, config.hold, config.tint);
        match step {
            PossessionStep::Swap { scene, rig, hide } => {
                if scene != self.current_scene || self.scene_in_flight.is_some() {
                    self.possession_in_flight = false;
                    debug!(%rig, "possession dropped by a scene switch");
                    return;
                }
                let effects = self.ctx.effects();
                effects.avatar.set_hands_visible(false);
                effects.render.set_active(&rig, true);
                for node in &hide {
                    effects.render.set_active(node, false);
                }
                self.possession = Some(Possession { rig, hidden: hide });
                self.ctx
                    .emit(StageEventKind::PossessionChanged { possessed: true });
                self.ctx
                    .schedule(hold, StageTask::Possession(PossessionStep::Tint));
            }
            PossessionStep::Tint => {
                // A scene switch may have dispossessed in the meantime.
                if self.possession.is_none() {
                    self.possession_in_flight = false;
                    return;
                }
                let music = self.ctx.config().possession.music.clone();
                let effects = self.ctx.effects();
                effects.screen.fade_to(tint, fade);
                effects.audio.swap_and_fade_music(music.as_deref(), fade);
                self.ctx
                    .schedule(fade, StageTask::Possession(PossessionStep::Settled));
            }
            PossessionStep::Settled => {
                self.possession_in_flight = false;
                debug!("possession settled");
            }
        }
    }

    fn dispossess(&mut self, resume_locomotion: bool) {
        let Some(possession) = self.possession.take() else {
            return;
        };
        let effects = self.ctx.effects();
        effects.render.set_active(&possession.rig, false);
        for node in &possession.hidden {
            effects.render.set_active(node, true);
        }
        effects.avatar.set_hands_visible(true);
        if resume_locomotion {
            effects.locomotion.resume();
        }
        self.ctx
            .emit(StageEventKind::PossessionChanged { possessed: false });
        info!(rig = %possession.rig, "dispossessed");
    }

    fn after_frame_started(&mut self, frame: FrameId) {
        if self.graph.frame(frame).is_interactive() {
            self.start_haptic_loop(frame);
        }
    }

    fn start_haptic_loop(&mut self, frame: FrameId) {
        let frame = self.graph.frame(frame);
        let delay = frame
            .cue_delay()
            .unwrap_or(self.ctx.config().haptic.initial_delay);
        self.haptic_generation += 1;
        self.haptic_loop_active = true;
        debug!(
            frame = frame.name(),
            generation = self.haptic_generation,
            delay_secs = delay.as_secs_f64(),
            "haptic cue loop started"
        );
        self.ctx.emit(StageEventKind::HapticLoopStarted {
            frame: frame.name().to_owned(),
        });
        self.ctx.schedule(
            delay,
            StageTask::HapticPulse {
                generation: self.haptic_generation,
            },
        );
    }

    /// Returns whether a running loop was stopped.
    fn stop_haptic_loop(&mut self, reason: HapticStopReason) -> bool {
        if !self.haptic_loop_active {
            return false;
        }
        self.haptic_loop_active = false;
        self.haptic_generation += 1;
        self.ctx.emit(StageEventKind::HapticLoopStopped { reason });
        true
    }

    fn haptic_pulse(&mut self, generation: u64) {
        if !self.haptic_loop_active || generation != self.haptic_generation {
            return;
        }
        let haptic = &self.ctx.config().haptic;
        let (pulse, interval, clip) = (haptic.pulse, haptic.interval, haptic.cue_clip.clone());
        let effects = self.ctx.effects();
        for controller in effects.haptics.controllers() {
            effects.haptics.pulse(controller, pulse);
        }
        self.graph
            .frame(self.current_frame)
            .haptic_cue(clip.as_deref(), &self.ctx);
        self.ctx.emit(StageEventKind::HapticCue { clip });
        self.ctx
            .schedule(interval, StageTask::HapticPulse { generation });
    }
}

#[cfg(test)]
mod tests {
    use stillframe_core::effects::{AudioSource, HapticPulse};
    use stillframe_test_support::{Effect, FixedClock, RecordingEffects};

    use super::*;
    use crate::domain::definition::{
        BehaviorDefinition, FrameDefinition, SceneDefinition, StoryDefinition,
    };
    use crate::domain::fader::FadeDirection;

    fn secs(value: u64) -> Duration {
        Duration::from_secs(value)
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    /// Parlour: an interactive hall, an arrival that moves on by itself, two
    /// interactive props and an end frame. Garden follows.
    fn story() -> StoryDefinition {
        StoryDefinition {
            initial_scene: "parlour".to_owned(),
            scenes: vec![
                SceneDefinition::new(
                    "parlour",
                    vec![
                        FrameDefinition::new("hall"),
                        FrameDefinition::new("arrival")
                            .auto_progress("table", secs(15))
                            .own_fade(Duration::ZERO),
                        FrameDefinition::new("table")
                            .point_of_interest(Position::new(1.0, 0.0, 2.0), None),
                        FrameDefinition::new("teapot")
                            .cue_delay(secs(2))
                            .behavior(BehaviorDefinition::CueSound {
                                source: AudioSource("teapot".to_owned()),
                            })
                            .behavior(BehaviorDefinition::PositionReset {
                                node: NodePath::new("parlour/teapot/prop"),
                            }),
                        FrameDefinition::new("farewell").end_after(secs(5)),
                    ],
                )
                .then("garden"),
                SceneDefinition::new(
                    "garden",
                    vec![
                        FrameDefinition::new("bench"),
                        FrameDefinition::new("gate").end_after(secs(3)),
                    ],
                )
                .music("birds"),
            ],
        }
    }

    fn launch_with(
        definition: &StoryDefinition,
        config: StageConfig,
    ) -> (Orchestrator, Arc<RecordingEffects>) {
        let recorder = Arc::new(RecordingEffects::new());
        let graph = StoryGraph::build(definition).unwrap();
        let orchestrator = Orchestrator::launch(
            graph,
            config,
            Collaborators::uniform(&recorder),
            Arc::new(FixedClock::standard()),
        );
        (orchestrator, recorder)
    }

    /// Launched and past the startup fade, with effects and events cleared.
    fn running(config: StageConfig) -> (Orchestrator, Arc<RecordingEffects>) {
        let (mut orchestrator, recorder) = launch_with(&story(), config);
        orchestrator.advance(secs(10));
        orchestrator.drain_events();
        recorder.clear();
        (orchestrator, recorder)
    }

    fn frame(orchestrator: &Orchestrator, name: &str) -> FrameId {
        orchestrator.graph().frame_id(name).unwrap()
    }

    fn scene(orchestrator: &Orchestrator, name: &str) -> SceneId {
        orchestrator.graph().scene_id(name).unwrap()
    }

    fn kinds(orchestrator: &mut Orchestrator) -> Vec<StageEventKind> {
        orchestrator
            .drain_events()
            .into_iter()
            .map(|event| event.kind)
            .collect()
    }

    fn enabled_scenes(orchestrator: &Orchestrator) -> Vec<&str> {
        orchestrator
            .graph()
            .scenes()
            .iter()
            .filter(|scene| scene.is_enabled())
            .map(|scene| scene.name())
            .collect()
    }

    fn pulses(recorder: &RecordingEffects) -> usize {
        recorder.count(|effect| matches!(effect, Effect::Pulse(..)))
    }

    #[test]
    fn test_launch_enables_initial_scene_behind_startup_fade() {
        // Arrange & Act
        let (mut orchestrator, recorder) = launch_with(&story(), StageConfig::default());

        // Assert
        assert_eq!(enabled_scenes(&orchestrator), vec!["parlour"]);
        assert_eq!(orchestrator.current_frame(), frame(&orchestrator, "hall"));
        assert_eq!(orchestrator.phase(), StagePhase::Starting);
        let table = orchestrator.graph().frame(frame(&orchestrator, "table"));
        assert_eq!(recorder.last_active(&table.layers().root), Some(false));
        assert_eq!(recorder.last_active(&NodePath::new("garden")), Some(false));

        let effects = recorder.effects();
        for expected in [
            Effect::ScreenFade(Color::BLACK, Duration::ZERO),
            Effect::ScreenFade(Color::CLEAR, secs(10)),
            Effect::MusicIn(secs(10)),
            Effect::LocomotionSuspended,
        ] {
            assert!(effects.contains(&expected), "missing {expected:?}");
        }
        assert!(!effects.contains(&Effect::LocomotionResumed));

        let events = kinds(&mut orchestrator);
        assert_eq!(
            events[..3],
            [
                StageEventKind::SceneEntered {
                    scene: "parlour".to_owned(),
                    frame: "hall".to_owned(),
                },
                StageEventKind::InteractiveFrameStarted {
                    frame: "hall".to_owned(),
                },
                StageEventKind::FrameStarted {
                    frame: "hall".to_owned(),
                },
            ]
        );
        assert!(orchestrator.haptic_loop_active());
    }

    #[test]
    fn test_startup_fade_releases_locomotion() {
        let (mut orchestrator, recorder) = launch_with(&story(), StageConfig::default());
        recorder.clear();

        orchestrator.advance(secs(10));

        assert_eq!(orchestrator.phase(), StagePhase::Running);
        assert_eq!(recorder.count(|e| *e == Effect::LocomotionResumed), 1);
    }

    #[test]
    fn test_second_fade_on_a_fading_frame_is_dropped() {
        // Arrange
        let (mut orchestrator, recorder) = running(StageConfig::default());
        let table = frame(&orchestrator, "table");
        let teapot = frame(&orchestrator, "teapot");
        orchestrator
            .request_frame_transition(table, Some(secs(4)))
            .unwrap();
        orchestrator.advance(secs(1));
        orchestrator.drain_events();
        recorder.clear();

        // Act
        orchestrator
            .request_frame_transition(teapot, Some(secs(4)))
            .unwrap();

        // Assert
        assert_eq!(
            orchestrator.graph().frame(table).fade_state(),
            FadeState::FadingIn
        );
        assert!(kinds(&mut orchestrator).contains(&StageEventKind::FadeRejected {
            frame: "table".to_owned(),
            requested: FadeDirection::Out,
        }));
        let fade_layer = orchestrator.graph().frame(table).layers().fade.clone();
        assert!(recorder.opacities_of(&fade_layer).is_empty());

        orchestrator.advance(ms(1500));
        orchestrator.advance(ms(1500));
        assert_eq!(recorder.opacities_of(&fade_layer), vec![0.625, 1.0]);
        assert_eq!(
            orchestrator.graph().frame(table).fade_state(),
            FadeState::Idle
        );
    }

    #[test]
    fn test_frame_fades_are_linear_in_both_directions() {
        // Arrange
        let (mut orchestrator, recorder) = running(StageConfig::default());
        let hall = orchestrator.graph().frame(frame(&orchestrator, "hall")).layers().clone();
        let table_id = frame(&orchestrator, "table");
        let table = orchestrator.graph().frame(table_id).layers().clone();

        // Act
        orchestrator
            .request_frame_transition(table_id, Some(secs(4)))
            .unwrap();
        for _ in 0..4 {
            orchestrator.advance(secs(1));
        }

        // Assert
        assert_eq!(
            recorder.opacities_of(&table.start_fade_only),
            vec![0.0, 0.25, 0.5, 0.75, 1.0]
        );
        assert_eq!(
            recorder.opacities_of(&hall.end_fade_only),
            vec![1.0, 0.75, 0.5, 0.25, 0.0]
        );
        assert_eq!(recorder.last_active(&hall.root), Some(false));
        assert_eq!(recorder.last_active(&hall.no_fade), Some(false));
        assert_eq!(orchestrator.current_frame(), table_id);
    }

    #[test]
    fn test_frame_start_emits_cues_before_fade_completes() {
        let (mut orchestrator, recorder) = running(StageConfig::default());
        let table = frame(&orchestrator, "table");

        orchestrator
            .request_frame_transition(table, Some(secs(4)))
            .unwrap();

        let events = kinds(&mut orchestrator);
        let started = events
            .iter()
            .position(|kind| matches!(kind, StageEventKind::FrameStarted { frame } if frame == "table"))
            .unwrap();
        let poi = events
            .iter()
            .position(|kind| matches!(kind, StageEventKind::PointOfInterest { .. }))
            .unwrap();
        let interactive = events
            .iter()
            .position(|kind| {
                matches!(kind, StageEventKind::InteractiveFrameStarted { frame } if frame == "table")
            })
            .unwrap();
        assert!(poi < interactive && interactive < started);
        assert!(events.contains(&StageEventKind::FrameEnded {
            frame: "hall".to_owned()
        }));

        let poi_source = AudioSource("poi".to_owned());
        let effects = recorder.effects();
        assert!(effects.contains(&Effect::PlaceSource(
            poi_source.clone(),
            Position::new(1.0, 0.0, 2.0)
        )));
        assert!(effects.contains(&Effect::Clip("exhale".to_owned(), poi_source)));
    }

    #[test]
    fn test_auto_progression_chains_to_target() {
        // Arrange
        let (mut orchestrator, recorder) = running(StageConfig::default());
        let arrival = frame(&orchestrator, "arrival");
        let table = frame(&orchestrator, "table");
        orchestrator
            .request_frame_transition(arrival, Some(secs(4)))
            .unwrap();

        // Act
        orchestrator.advance(secs(15) + secs(4) + ms(1));

        // Assert
        assert_eq!(orchestrator.current_frame(), table);
        let arrival_frame = orchestrator.graph().frame(arrival);
        assert!(!arrival_frame.is_active());
        assert_eq!(
            recorder.last_active(&arrival_frame.layers().root),
            Some(false)
        );
        assert_eq!(
            orchestrator.graph().frame(table).fade_state(),
            FadeState::Idle
        );
    }

    #[test]
    fn test_auto_progression_waits_for_fade_in() {
        let (mut orchestrator, _recorder) = running(StageConfig::default());
        let arrival = frame(&orchestrator, "arrival");
        orchestrator
            .request_frame_transition(arrival, Some(secs(4)))
            .unwrap();

        orchestrator.advance(ms(18900));

        assert_eq!(orchestrator.current_frame(), arrival);
    }

    #[test]
    fn test_scene_switch_keeps_exactly_one_scene_enabled() {
        // Arrange
        let (mut orchestrator, recorder) = running(StageConfig::default());
        let garden = scene(&orchestrator, "garden");

        // Act
        orchestrator.request_next_scene().unwrap();

        // Assert: fading out
        assert_eq!(orchestrator.scene_in_flight(), Some(garden));
        assert_eq!(orchestrator.phase(), StagePhase::SwitchingScene);
        assert_eq!(
            recorder.effects()[..3],
            [
                Effect::LocomotionSuspended,
                Effect::ScreenFade(Color::BLACK, secs(10)),
                Effect::MusicOut(secs(10)),
            ]
        );
        assert_eq!(
            kinds(&mut orchestrator),
            vec![StageEventKind::SceneSwitchTriggered {
                scene: "parlour".to_owned()
            }]
        );

        orchestrator.advance(secs(10));
        assert_eq!(enabled_scenes(&orchestrator), vec!["parlour"]);

        // Assert: settled and swapped
        orchestrator.advance(secs(5));
        assert_eq!(enabled_scenes(&orchestrator), vec!["garden"]);
        assert_eq!(orchestrator.current_scene(), garden);
        assert_eq!(
            orchestrator.current_frame(),
            orchestrator.graph().scene(garden).start_frame()
        );
        let effects = recorder.effects();
        assert!(effects.contains(&Effect::ScreenFade(Color::CLEAR, secs(10))));
        assert!(effects.contains(&Effect::MusicSwap(Some("birds".to_owned()), secs(10))));
        assert!(!effects.contains(&Effect::LocomotionResumed));

        // Assert: revealed
        orchestrator.advance(secs(10));
        assert_eq!(orchestrator.scene_in_flight(), None);
        assert_eq!(orchestrator.phase(), StagePhase::Running);
        assert_eq!(recorder.count(|e| *e == Effect::LocomotionResumed), 1);
        assert!(kinds(&mut orchestrator).contains(&StageEventKind::SceneSwitchFinished {
            scene: "garden".to_owned()
        }));
    }

    #[test]
    fn test_overlapping_scene_transition_is_rejected() {
        let (mut orchestrator, _recorder) = running(StageConfig::default());
        let garden = scene(&orchestrator, "garden");
        let parlour = scene(&orchestrator, "parlour");
        orchestrator
            .request_scene_transition(garden, secs(2))
            .unwrap();

        let result = orchestrator.request_scene_transition(parlour, secs(2));

        assert_eq!(
            result,
            Err(StageError::TransitionInFlight("garden".to_owned()))
        );
        assert_eq!(
            orchestrator.request_next_scene(),
            Err(StageError::TransitionInFlight("garden".to_owned()))
        );
    }

    #[test]
    fn test_leaving_a_scene_hides_its_frames() {
        // Arrange
        let (mut orchestrator, recorder) = running(StageConfig::default());
        let table = frame(&orchestrator, "table");
        orchestrator
            .request_frame_transition(table, Some(secs(1)))
            .unwrap();
        orchestrator.advance(secs(2));
        let garden = scene(&orchestrator, "garden");

        // Act
        orchestrator
            .request_scene_transition(garden, secs(1))
            .unwrap();
        orchestrator.advance(secs(10));

        // Assert
        let table_frame = orchestrator.graph().frame(table);
        assert!(!table_frame.is_active());
        assert_eq!(recorder.last_active(&table_frame.layers().root), Some(false));
        assert_eq!(recorder.last_active(&NodePath::new("parlour")), Some(false));
        assert_eq!(recorder.last_active(&NodePath::new("garden")), Some(true));
    }

    #[test]
    fn test_frame_outside_current_scene_is_rejected() {
        let (mut orchestrator, recorder) = running(StageConfig::default());
        let bench = frame(&orchestrator, "bench");
        let hall = frame(&orchestrator, "hall");

        let result = orchestrator.request_frame_transition(bench, None);

        assert_eq!(
            result,
            Err(StageError::FrameOutsideScene {
                frame: "bench".to_owned(),
                scene: "parlour".to_owned(),
            })
        );
        assert_eq!(orchestrator.current_frame(), hall);
        assert!(recorder.effects().is_empty());
        assert!(orchestrator.pending_events().is_empty());
    }

    #[test]
    fn test_transition_to_current_frame_is_rejected() {
        let (mut orchestrator, _recorder) = running(StageConfig::default());
        let hall = frame(&orchestrator, "hall");

        let result = orchestrator.request_frame_transition(hall, None);

        assert!(matches!(result, Err(StageError::Validation(_))));
    }

    #[test]
    fn test_missing_fade_uses_standard_duration() {
        let config = StageConfig {
            standard_frame_fade: secs(2),
            ..StageConfig::default()
        };
        let (mut orchestrator, _recorder) = running(config);
        let table = frame(&orchestrator, "table");

        orchestrator.request_frame_transition(table, None).unwrap();
        orchestrator.advance(ms(1900));
        assert_eq!(
            orchestrator.graph().frame(table).fade_state(),
            FadeState::FadingIn
        );
        orchestrator.advance(ms(100));

        assert_eq!(
            orchestrator.graph().frame(table).fade_state(),
            FadeState::Idle
        );
    }

    #[test]
    fn test_end_frame_without_successor_terminates_once() {
        // Arrange
        let definition = StoryDefinition {
            initial_scene: "finale".to_owned(),
            scenes: vec![SceneDefinition::new(
                "finale",
                vec![FrameDefinition::new("last").end_after(secs(3))],
            )],
        };
        let (mut orchestrator, recorder) = launch_with(&definition, StageConfig::default());

        // Act
        orchestrator.advance(secs(60));

        // Assert
        assert_eq!(recorder.count(|e| *e == Effect::Terminate), 1);
        assert_eq!(orchestrator.phase(), StagePhase::Terminated);
        let events = kinds(&mut orchestrator);
        assert!(events.contains(&StageEventKind::SessionEnding));
        assert!(events.contains(&StageEventKind::SessionTerminated));
        assert_eq!(
            orchestrator.request_next_scene(),
            Err(StageError::SessionEnding)
        );

        orchestrator.advance(secs(60));
        assert_eq!(recorder.count(|e| *e == Effect::Terminate), 1);
    }

    #[test]
    fn test_exit_sequence_fades_screen_then_music() {
        let definition = StoryDefinition {
            initial_scene: "finale".to_owned(),
            scenes: vec![SceneDefinition::new(
                "finale",
                vec![FrameDefinition::new("last")],
            )],
        };
        let (mut orchestrator, recorder) = launch_with(&definition, StageConfig::default());
        orchestrator.advance(secs(10));
        recorder.clear();

        orchestrator.request_next_scene().unwrap();
        assert_eq!(
            recorder.effects(),
            vec![
                Effect::LocomotionSuspended,
                Effect::ScreenFade(Color::BLACK, secs(10)),
            ]
        );
        orchestrator.advance(secs(5));
        assert_eq!(recorder.effects().last(), Some(&Effect::MusicOut(secs(10))));
        orchestrator.advance(ms(9900));
        assert_eq!(recorder.count(|e| *e == Effect::Terminate), 0);
        orchestrator.advance(ms(100));

        assert_eq!(recorder.count(|e| *e == Effect::Terminate), 1);
        assert_eq!(
            orchestrator.request_frame_transition(frame(&orchestrator, "last"), None),
            Err(StageError::SessionEnding)
        );
    }

    #[test]
    fn test_end_frame_with_successor_switches_scene() {
        let (mut orchestrator, _recorder) = running(StageConfig::default());
        let farewell = frame(&orchestrator, "farewell");
        orchestrator
            .request_frame_transition(farewell, Some(secs(1)))
            .unwrap();

        orchestrator.advance(secs(6));

        assert_eq!(
            orchestrator.scene_in_flight(),
            Some(scene(&orchestrator, "garden"))
        );
    }

    #[test]
    fn test_grab_before_first_interval_prevents_every_pulse() {
        // Arrange
        let (mut orchestrator, recorder) = launch_with(&story(), StageConfig::default());
        assert!(orchestrator.haptic_loop_active());

        // Act
        orchestrator.advance(secs(5));
        orchestrator.notify_grabbed();
        orchestrator.advance(secs(100));

        // Assert
        assert_eq!(pulses(&recorder), 0);
        assert!(!orchestrator.haptic_loop_active());
        assert!(kinds(&mut orchestrator).contains(&StageEventKind::HapticLoopStopped {
            reason: HapticStopReason::Grabbed
        }));
    }

    #[test]
    fn test_haptic_loop_pulses_every_controller_on_interval() {
        let (mut orchestrator, recorder) = launch_with(&story(), StageConfig::default());

        orchestrator.advance(secs(10));
        assert_eq!(pulses(&recorder), 2);
        orchestrator.advance(ms(14900));
        assert_eq!(pulses(&recorder), 2);
        orchestrator.advance(ms(100));

        assert_eq!(pulses(&recorder), 4);
        assert!(recorder.effects().contains(&Effect::Pulse(
            ControllerHandle(1),
            HapticPulse::default()
        )));
    }

    #[test]
    fn test_frame_change_supersedes_haptic_loop() {
        // Arrange
        let (mut orchestrator, recorder) = launch_with(&story(), StageConfig::default());
        orchestrator.advance(secs(5));
        let table = frame(&orchestrator, "table");

        // Act
        orchestrator
            .request_frame_transition(table, Some(secs(1)))
            .unwrap();
        orchestrator.advance(ms(9900));

        // Assert: the hall's pulse at 10s never fires
        assert_eq!(pulses(&recorder), 0);
        orchestrator.advance(ms(100));
        assert_eq!(pulses(&recorder), 2);
        let events = kinds(&mut orchestrator);
        assert!(events.contains(&StageEventKind::HapticLoopStopped {
            reason: HapticStopReason::FrameChanged
        }));
        assert!(events.contains(&StageEventKind::HapticLoopStarted {
            frame: "table".to_owned()
        }));
    }

    #[test]
    fn test_haptic_cue_reaches_current_frame_behaviors() {
        // Arrange
        let mut config = StageConfig::default();
        config.haptic.cue_clip = Some("chime".to_owned());
        let (mut orchestrator, recorder) = running(config);
        let teapot = frame(&orchestrator, "teapot");

        // Act
        orchestrator
            .request_frame_transition(teapot, Some(secs(1)))
            .unwrap();
        orchestrator.advance(secs(2));

        // Assert
        let effects = recorder.effects();
        assert!(effects.contains(&Effect::ResetPose(NodePath::new("parlour/teapot/prop"))));
        assert!(effects.contains(&Effect::Clip(
            "chime".to_owned(),
            AudioSource("teapot".to_owned())
        )));
        assert!(kinds(&mut orchestrator).contains(&StageEventKind::HapticCue {
            clip: Some("chime".to_owned())
        }));
    }

    #[test]
    fn test_reentering_a_frame_repeats_its_activations() {
        // Arrange
        let (mut orchestrator, recorder) = running(StageConfig::default());
        let table = frame(&orchestrator, "table");
        let teapot = frame(&orchestrator, "teapot");
        let layers = orchestrator.graph().frame(table).layers().clone();

        // Act
        orchestrator
            .request_frame_transition(table, Some(secs(1)))
            .unwrap();
        let first = recorder.activations_under(&layers.root);
        orchestrator.advance(secs(2));
        orchestrator
            .request_frame_transition(teapot, Some(secs(1)))
            .unwrap();
        orchestrator.advance(secs(2));
        assert!(!orchestrator.graph().frame(table).is_active());
        recorder.clear();
        orchestrator
            .request_frame_transition(table, Some(secs(1)))
            .unwrap();
        let second = recorder.activations_under(&layers.root);

        // Assert
        assert_eq!(
            first,
            vec![
                (layers.root.clone(), true),
                (layers.no_fade.clone(), true),
                (layers.start_fade_only.clone(), true),
            ]
        );
        assert_eq!(first, second);
    }

    #[test]
    fn test_point_of_interest_request_uses_given_sound() {
        let (mut orchestrator, recorder) = running(StageConfig::default());

        orchestrator
            .request_point_of_interest(Position::new(0.0, 1.0, 0.0), Some("gasp"))
            .unwrap();

        let source = AudioSource("poi".to_owned());
        assert_eq!(
            recorder.effects(),
            vec![
                Effect::PlaceSource(source.clone(), Position::new(0.0, 1.0, 0.0)),
                Effect::Clip("gasp".to_owned(), source),
            ]
        );
        assert_eq!(
            kinds(&mut orchestrator),
            vec![StageEventKind::PointOfInterest {
                position: Position::new(0.0, 1.0, 0.0),
                sound: "gasp".to_owned(),
            }]
        );
    }

    #[test]
    fn test_possession_swaps_avatar_then_tints() {
        // Arrange
        let (mut orchestrator, recorder) = running(StageConfig::default());
        let rig = NodePath::new("parlour/ghost");
        let props = NodePath::new("parlour/props");

        // Act
        orchestrator
            .request_possession(rig.clone(), vec![props.clone()])
            .unwrap();

        // Assert
        assert_eq!(
            orchestrator.request_possession(rig.clone(), Vec::new()),
            Err(StageError::PossessionInFlight)
        );
        assert_eq!(
            recorder.effects(),
            vec![
                Effect::LocomotionSuspended,
                Effect::ScreenFade(Color::BLACK, secs(4)),
                Effect::MusicOut(secs(4)),
            ]
        );
        recorder.clear();
        orchestrator.advance(secs(4));
        assert!(orchestrator.is_possessed());
        assert_eq!(
            recorder.effects()[..3],
            [
                Effect::Hands(false),
                Effect::Active(rig.clone(), true),
                Effect::Active(props.clone(), false),
            ]
        );
        orchestrator.advance(ms(1500));
        let tint = orchestrator.config().possession.tint;
        assert!(recorder.effects().contains(&Effect::ScreenFade(tint, secs(4))));
        assert!(recorder.effects().contains(&Effect::MusicSwap(None, secs(4))));
        orchestrator.advance(secs(4));

        recorder.clear();
        orchestrator.request_dispossession().unwrap();
        assert!(!orchestrator.is_possessed());
        assert_eq!(
            recorder.effects(),
            vec![
                Effect::ScreenFade(Color::CLEAR, secs(4)),
                Effect::Active(rig, false),
                Effect::Active(props, true),
                Effect::Hands(true),
                Effect::LocomotionResumed,
            ]
        );
    }

    #[test]
    fn test_dispossession_without_possession_is_rejected() {
        let (mut orchestrator, _recorder) = running(StageConfig::default());

        assert!(matches!(
            orchestrator.request_dispossession(),
            Err(StageError::Validation(_))
        ));
    }

    #[test]
    fn test_scene_switch_dispossesses() {
        let (mut orchestrator, _recorder) = running(StageConfig::default());
        orchestrator
            .request_possession(NodePath::new("parlour/ghost"), Vec::new())
            .unwrap();
        orchestrator.advance(secs(4));
        assert!(orchestrator.is_possessed());

        orchestrator.request_next_scene().unwrap();
        orchestrator.advance(secs(15));

        assert!(!orchestrator.is_possessed());
        assert!(kinds(&mut orchestrator).contains(&StageEventKind::PossessionChanged {
            possessed: false
        }));
    }

    #[test]
    fn test_possession_landing_after_scene_switch_is_dropped() {
        // Arrange
        let config = StageConfig {
            scene_settle_delay: Duration::ZERO,
            ..StageConfig::default()
        };
        let (mut orchestrator, recorder) = running(config);
        let rig = NodePath::new("parlour/ghost");
        let garden = scene(&orchestrator, "garden");

        // Act
        orchestrator.request_possession(rig.clone(), Vec::new()).unwrap();
        orchestrator
            .request_scene_transition(garden, secs(1))
            .unwrap();
        orchestrator.advance(secs(5));

        // Assert
        assert_eq!(orchestrator.snapshot().scene, "garden");
        assert!(!orchestrator.is_possessed());
        assert!(!kinds(&mut orchestrator).contains(&StageEventKind::PossessionChanged {
            possessed: true
        }));
        assert!(!recorder.effects().contains(&Effect::Active(rig.clone(), true)));
        assert_eq!(orchestrator.request_possession(rig, Vec::new()), Ok(()));
    }

    #[test]
    fn test_possession_landing_during_scene_switch_is_dropped() {
        let (mut orchestrator, _recorder) = running(StageConfig::default());
        orchestrator
            .request_possession(NodePath::new("parlour/ghost"), Vec::new())
            .unwrap();
        orchestrator.request_next_scene().unwrap();

        orchestrator.advance(secs(4));
        let during = orchestrator.is_possessed();
        orchestrator.advance(secs(30));

        assert!(!during);
        assert!(!orchestrator.is_possessed());
        assert_eq!(orchestrator.snapshot().scene, "garden");
    }

    #[test]
    fn test_huge_fade_late_in_session_does_not_overflow() {
        // Arrange
        let (mut orchestrator, _recorder) = running(StageConfig::default());
        orchestrator.advance(secs(3000));
        let table = frame(&orchestrator, "table");

        // Act
        orchestrator
            .request_frame_transition(table, Some(Duration::MAX))
            .unwrap();
        orchestrator.advance(secs(10));

        // Assert
        let snapshot = orchestrator.snapshot();
        assert_eq!(snapshot.frame, "table");
        assert_eq!(snapshot.frame_fade, FadeState::FadingIn);
        assert_eq!(snapshot.at, secs(3020));
    }

    #[test]
    fn test_one_shot_pulse_uses_configured_pulse() {
        let (orchestrator, recorder) = running(StageConfig::default());

        orchestrator.one_shot_haptic_pulse(ControllerHandle(1));

        assert_eq!(
            recorder.effects(),
            vec![Effect::Pulse(ControllerHandle(1), HapticPulse::default())]
        );
    }

    #[test]
    fn test_snapshot_reflects_stage() {
        let (mut orchestrator, _recorder) = running(StageConfig::default());
        let table = frame(&orchestrator, "table");
        orchestrator
            .request_frame_transition(table, Some(secs(4)))
            .unwrap();

        let snapshot = orchestrator.snapshot();

        assert_eq!(snapshot.scene, "parlour");
        assert_eq!(snapshot.frame, "table");
        assert_eq!(snapshot.frame_fade, FadeState::FadingIn);
        assert_eq!(snapshot.phase, StagePhase::Running);
        assert!(snapshot.haptic_loop_active);
        assert_eq!(snapshot.at, secs(10));
    }

    #[test]
    fn test_events_carry_correlation_through_scheduled_tasks() {
        let (mut orchestrator, _recorder) = running(StageConfig::default());
        let correlation_id = Uuid::new_v4();
        orchestrator.set_correlation(correlation_id);
        orchestrator
            .request_frame_transition(frame(&orchestrator, "table"), Some(secs(1)))
            .unwrap();
        orchestrator.set_correlation(Uuid::nil());

        orchestrator.advance(secs(1));

        let events = orchestrator.drain_events();
        let completed = events
            .iter()
            .find(|event| matches!(event.kind, StageEventKind::FadeCompleted { .. }))
            .unwrap();
        assert_eq!(completed.metadata.correlation_id, correlation_id);
        assert!(events
            .windows(2)
            .all(|pair| pair[0].metadata.sequence_number < pair[1].metadata.sequence_number));
    }
}
