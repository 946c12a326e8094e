//! Trigger sources: the interaction detectors that turn viewer actions into
//! stage commands.
//!
//! Detection itself (collisions, snapping, grabbing) happens elsewhere;
//! a board only receives "this trigger fired" and decides whether that
//! produces a command.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stillframe_core::error::StageError;
use tracing::debug;
use uuid::Uuid;

use crate::domain::commands::{NotifyGrabbed, RequestFrameTransition, StageCommand};
use crate::domain::graph::StoryGraph;

fn default_latch() -> String {
    "touch".to_owned()
}

/// How a trigger is configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerDefinition {
    /// An object was snapped into place.
    SnapZone {
        /// Frame to transition to.
        target: String,
        /// Transition fade; the standard frame fade when absent.
        #[serde(default, with = "stillframe_core::seconds::option")]
        fade: Option<Duration>,
        /// Stop reacting after the first snap.
        #[serde(default)]
        disable_on_snap: bool,
    },
    /// Something entered a volume.
    TouchVolume {
        /// Tag the entering object must carry.
        tag: String,
        /// Frame to transition to.
        target: String,
        /// Transition fade; the standard frame fade when absent.
        #[serde(default, with = "stillframe_core::seconds::option")]
        fade: Option<Duration>,
        /// Volumes sharing a latch fire once between them.
        #[serde(default = "default_latch")]
        latch: String,
    },
    /// Pieces were added to an assembly.
    Assembly {
        /// Pieces needed to complete it.
        pieces: u32,
        /// Frame to transition to once complete.
        target: String,
        /// Transition fade; the standard frame fade when absent.
        #[serde(default, with = "stillframe_core::seconds::option")]
        fade: Option<Duration>,
    },
    /// An interactable was grabbed.
    Grab,
}

impl TriggerDefinition {
    fn target(&self) -> Option<&str> {
        match self {
            Self::SnapZone { target, .. }
            | Self::TouchVolume { target, .. }
            | Self::Assembly { target, .. } => Some(target),
            Self::Grab => None,
        }
    }
}

/// What firing a trigger did.
#[derive(Debug, Clone)]
pub enum TriggerOutcome {
    /// The trigger produced a command.
    Command(StageCommand),
    /// The trigger fired but produced nothing.
    Ignored(&'static str),
}

#[derive(Debug)]
struct Trigger {
    definition: TriggerDefinition,
    count: u32,
    spent: bool,
}

/// Every trigger of a story, with its firing state.
#[derive(Debug)]
pub struct TriggerBoard {
    triggers: HashMap<String, Trigger>,
    tripped_latches: HashSet<String>,
}

impl TriggerBoard {
    /// Builds the board, checking that every target frame exists.
    ///
    /// # Errors
    ///
    /// Returns `StageError::Validation` for a trigger that targets an
    /// unknown frame or an assembly of zero pieces.
    pub fn build(
        definitions: &BTreeMap<String, TriggerDefinition>,
        graph: &StoryGraph,
    ) -> Result<Self, StageError> {
        let mut triggers = HashMap::with_capacity(definitions.len());
        for (name, definition) in definitions {
            if let Some(target) = definition.target() {
                if graph.frame_id(target).is_none() {
                    return Err(StageError::Validation(format!(
                        "trigger {name} targets unknown frame {target}"
                    )));
                }
            }
            if let TriggerDefinition::Assembly { pieces: 0, .. } = definition {
                return Err(StageError::Validation(format!(
                    "assembly trigger {name} needs at least one piece"
                )));
            }
            triggers.insert(
                name.clone(),
                Trigger {
                    definition: definition.clone(),
                    count: 0,
                    spent: false,
                },
            );
        }
        Ok(Self {
            triggers,
            tripped_latches: HashSet::new(),
        })
    }

    /// Trigger names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.triggers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Fires trigger `name`; `tag` is the tag of the object involved, if any.
    ///
    /// A produced command does not spend the trigger or trip its latch until
    /// [`TriggerBoard::confirm`] is called, so a command the stage rejects
    /// leaves the trigger live.
    ///
    /// # Errors
    ///
    /// Returns `StageError::NotFound` for an unknown trigger.
    pub fn fire(
        &mut self,
        name: &str,
        tag: Option<&str>,
        correlation_id: Uuid,
    ) -> Result<TriggerOutcome, StageError> {
        let trigger = self
            .triggers
            .get_mut(name)
            .ok_or_else(|| StageError::NotFound {
                kind: "trigger",
                name: name.to_owned(),
            })?;
        if trigger.spent {
            debug!(trigger = name, "spent trigger fired");
            return Ok(TriggerOutcome::Ignored("trigger already fired"));
        }

        let transition = |target: &str, fade: Option<Duration>| {
            TriggerOutcome::Command(StageCommand::FrameTransition(RequestFrameTransition {
                correlation_id,
                frame: target.to_owned(),
                fade,
            }))
        };

        let outcome = match &trigger.definition {
            TriggerDefinition::SnapZone { target, fade, .. } => transition(target, *fade),
            TriggerDefinition::TouchVolume {
                tag: wanted,
                target,
                fade,
                latch,
            } => {
                if tag != Some(wanted.as_str()) {
                    return Ok(TriggerOutcome::Ignored("tag does not match"));
                }
                if self.tripped_latches.contains(latch) {
                    return Ok(TriggerOutcome::Ignored("latch already tripped"));
                }
                transition(target, *fade)
            }
            TriggerDefinition::Assembly {
                pieces,
                target,
                fade,
            } => {
                trigger.count += 1;
                if trigger.count < *pieces {
                    debug!(trigger = name, count = trigger.count, pieces, "assembly piece added");
                    return Ok(TriggerOutcome::Ignored("assembly incomplete"));
                }
                transition(target, *fade)
            }
            TriggerDefinition::Grab => {
                TriggerOutcome::Command(StageCommand::Grabbed(NotifyGrabbed { correlation_id }))
            }
        };
        debug!(trigger = name, "trigger produced a command");
        Ok(outcome)
    }

    /// Records that the command produced by firing `name` was carried out:
    /// one-shot triggers are spent and touch latches trip.
    pub fn confirm(&mut self, name: &str) {
        let Some(trigger) = self.triggers.get_mut(name) else {
            return;
        };
        match &trigger.definition {
            TriggerDefinition::SnapZone {
                disable_on_snap, ..
            } => trigger.spent |= *disable_on_snap,
            TriggerDefinition::TouchVolume { latch, .. } => {
                trigger.spent = true;
                self.tripped_latches.insert(latch.clone());
            }
            TriggerDefinition::Assembly { .. } => trigger.spent = true,
            TriggerDefinition::Grab => {}
        }
    }
}
