//! Domain events for story content.

use serde::{Deserialize, Serialize};
use stillframe_core::event::{DomainEvent, EventMetadata};

/// Event type of [`StoryIngested`].
pub const STORY_INGESTED_EVENT_TYPE: &str = "content.story_ingested";

/// Emitted when a manifest was parsed, validated and compiled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryIngested {
    /// Where the manifest was read from.
    pub origin: String,
    /// SHA-256 of the manifest source.
    pub fingerprint: String,
    /// Number of scenes.
    pub scenes: usize,
    /// Number of frames.
    pub frames: usize,
    /// Number of triggers.
    pub triggers: usize,
    /// Number of audio clips.
    pub clips: usize,
}

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentEventKind {
    /// A story was ingested.
    StoryIngested(StoryIngested),
}

/// Content event envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: ContentEventKind,
}

impl DomainEvent for ContentEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            ContentEventKind::StoryIngested(_) => STORY_INGESTED_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("ContentEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
