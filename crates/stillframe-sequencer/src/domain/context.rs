//! Shared execution context: the timeline, the collaborators and the event
//! outbox that frames, scenes and the orchestrator all write through.

use std::sync::Arc;
use std::time::Duration;

use stillframe_core::clock::Clock;
use stillframe_core::effects::{Collaborators, NodePath, Position};
use stillframe_core::event::EventMetadata;
use stillframe_core::timeline::Timeline;
use tracing::debug;
use uuid::Uuid;

use super::config::StageConfig;
use super::events::{StageEvent, StageEventKind};
use super::ids::{FrameId, SceneId};

/// Continuations scheduled on the timeline.
#[derive(Debug, Clone)]
pub(crate) enum StageTask {
    /// A frame's fade has run its full duration.
    FadeCompleted { frame: FrameId, generation: u64 },
    /// Auto-progression delay of `from` elapsed.
    AutoProgress {
        from: FrameId,
        to: FrameId,
        fade: Option<Duration>,
    },
    /// End-frame delay of `from` elapsed.
    LeaveScene { from: FrameId },
    /// Next phase of a scene switch.
    SceneSwitch {
        to: SceneId,
        fade: Duration,
        step: SwitchStep,
    },
    /// The startup fade finished.
    StartupFinished,
    /// Next phase of the exit sequence.
    Exit(ExitStep),
    /// Next phase of the possession sequence.
    Possession(PossessionStep),
    /// One iteration of the haptic cue loop.
    HapticPulse { generation: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SwitchStep {
    /// Screen is black; wait for the settle delay.
    FadedOut,
    /// Swap the scenes and reveal.
    Settled,
    /// Reveal finished.
    Revealed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExitStep {
    FadeMusic,
    Terminate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PossessionStep {
    Swap {
        scene: SceneId,
        rig: NodePath,
        hide: Vec<NodePath>,
    },
    Tint,
    Settled,
}

#[derive(Debug)]
pub(crate) struct PendingTask {
    correlation_id: Uuid,
    task: StageTask,
}

/// Everything a frame or scene may touch besides its own state.
pub struct StageContext {
    timeline: Timeline<PendingTask>,
    effects: Collaborators,
    config: StageConfig,
    clock: Arc<dyn Clock>,
    outbox: Vec<StageEvent>,
    correlation_id: Uuid,
    next_sequence: i64,
}

impl std::fmt::Debug for StageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageContext")
            .field("now", &self.timeline.now())
            .field("pending", &self.timeline.pending())
            .field("outbox", &self.outbox.len())
            .finish_non_exhaustive()
    }
}

impl StageContext {
    pub(crate) fn new(effects: Collaborators, config: StageConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            timeline: Timeline::new(),
            effects,
            config,
            clock,
            outbox: Vec::new(),
            correlation_id: Uuid::nil(),
            next_sequence: 1,
        }
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.timeline.now()
    }

    /// The collaborators effects are sent to.
    #[must_use]
    pub fn effects(&self) -> &Collaborators {
        &self.effects
    }

    /// Stage configuration.
    #[must_use]
    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// Number of tasks waiting on the timeline.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.timeline.pending()
    }

    pub(crate) fn set_correlation(&mut self, correlation_id: Uuid) {
        self.correlation_id = correlation_id;
    }

    /// Schedules `task` under the current correlation ID.
    pub(crate) fn schedule(&mut self, delay: Duration, task: StageTask) {
        debug!(?task, delay_secs = delay.as_secs_f64(), "task scheduled");
        self.timeline.schedule_in(
            delay,
            PendingTask {
                correlation_id: self.correlation_id,
                task,
            },
        );
    }

    /// Pops the next task due by `until`, restoring the correlation ID it
    /// was scheduled under.
    pub(crate) fn pop_due(&mut self, until: Duration) -> Option<StageTask> {
        let pending = self.timeline.pop_due(until)?;
        self.correlation_id = pending.correlation_id;
        Some(pending.task)
    }

    pub(crate) fn settle(&mut self, until: Duration) {
        self.timeline.settle(until);
    }

    /// Records an event in the outbox.
    pub(crate) fn emit(&mut self, kind: StageEventKind) {
        let event = StageEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: kind.event_type().to_owned(),
                sequence_number: self.next_sequence,
                correlation_id: self.correlation_id,
                at: self.timeline.now(),
                occurred_at: self.clock.now(),
            },
            kind,
        };
        self.next_sequence += 1;
        self.outbox.push(event);
    }

    pub(crate) fn events(&self) -> &[StageEvent] {
        &self.outbox
    }

    pub(crate) fn take_events(&mut self) -> Vec<StageEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Moves the shared point-of-interest emitter and plays `sound`, or the
    /// configured default.
    pub(crate) fn point_of_interest(&mut self, position: Position, sound: Option<&str>) {
        let poi = &self.config.point_of_interest;
        let sound = sound.unwrap_or(poi.default_sound.as_str()).to_owned();
        self.effects.audio.place_source(&poi.source, position);
        self.effects.audio.request_clip(&sound, &poi.source);
        self.emit(StageEventKind::PointOfInterest { position, sound });
    }
}
