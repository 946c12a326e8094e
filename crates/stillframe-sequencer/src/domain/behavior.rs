//! Strategies attached to a frame's lifecycle.
//!
//! Interactable props react to the frame they live in: some answer the
//! haptic cue with a sound of their own, some snap back to where they
//! started whenever the frame is (re)entered.

use std::fmt::Debug;

use stillframe_core::effects::{AudioSource, Collaborators, NodePath};
use tracing::debug;

use super::definition::BehaviorDefinition;

/// Hooks a frame invokes on its attached behaviors. Every hook defaults to
/// doing nothing.
pub trait FrameBehavior: Send + Sync + Debug {
    /// The frame started (fade-in began or scene entry).
    fn on_frame_started(&self, _frame: &str, _effects: &Collaborators) {}

    /// A haptic cue fired while the frame was current.
    fn on_haptic_cue(&self, _clip: Option<&str>, _effects: &Collaborators) {}
}

/// Plays the cue clip through an interactable's own emitter.
#[derive(Debug, Clone)]
pub struct CueSound {
    source: AudioSource,
}

impl CueSound {
    /// Creates the behavior for `source`.
    #[must_use]
    pub fn new(source: AudioSource) -> Self {
        Self { source }
    }
}

impl FrameBehavior for CueSound {
    fn on_haptic_cue(&self, clip: Option<&str>, effects: &Collaborators) {
        if let Some(clip) = clip {
            debug!(source = %self.source, clip, "interactable answering haptic cue");
            effects.audio.request_clip(clip, &self.source);
        }
    }
}

/// Restores a prop to its origin pose when the frame starts.
#[derive(Debug, Clone)]
pub struct PositionReset {
    node: NodePath,
}

impl PositionReset {
    /// Creates the behavior for `node`.
    #[must_use]
    pub fn new(node: NodePath) -> Self {
        Self { node }
    }
}

impl FrameBehavior for PositionReset {
    fn on_frame_started(&self, _frame: &str, effects: &Collaborators) {
        effects.scenery.reset_pose(&self.node);
    }
}

/// Instantiates the behavior an authoring definition describes.
#[must_use]
pub fn build_behavior(definition: &BehaviorDefinition) -> Box<dyn FrameBehavior> {
    match definition {
        BehaviorDefinition::CueSound { source } => Box::new(CueSound::new(source.clone())),
        BehaviorDefinition::PositionReset { node } => Box::new(PositionReset::new(node.clone())),
    }
}
