//! Command handlers for story content.
//!
//! Ingestion is a pure function of the manifest text: parse, validate,
//! compile and fingerprint. Reading the file is left to the caller.

use std::time::Duration;

use stillframe_core::clock::Clock;
use stillframe_core::command::Command;
use stillframe_core::event::EventMetadata;
use tracing::info;
use uuid::Uuid;

use crate::domain::commands::IngestStory;
use crate::domain::error::ContentError;
use crate::domain::events::{
    ContentEvent, ContentEventKind, STORY_INGESTED_EVENT_TYPE, StoryIngested,
};
use crate::domain::manifest::{CompiledStory, StoryManifest, fingerprint};

/// Result of a successful ingestion.
#[derive(Debug)]
pub struct IngestedStory {
    /// The playable story.
    pub story: CompiledStory,
    /// SHA-256 of the manifest source.
    pub fingerprint: String,
    /// The event describing the ingestion.
    pub event: ContentEvent,
}

/// Handles the `IngestStory` command.
///
/// # Errors
///
/// Returns `ContentError::Parse` for malformed YAML and
/// `ContentError::Invalid` for a story that fails validation.
pub fn handle_ingest_story(
    command: &IngestStory,
    clock: &dyn Clock,
) -> Result<IngestedStory, ContentError> {
    let manifest = StoryManifest::parse(&command.source)?;
    let story = manifest.compile()?;
    let fingerprint = fingerprint(&command.source);

    let payload = StoryIngested {
        origin: command.origin.clone(),
        fingerprint: fingerprint.clone(),
        scenes: story.graph.scenes().len(),
        frames: story.graph.frames().len(),
        triggers: story.triggers.names().len(),
        clips: story.audio.len(),
    };
    info!(
        origin = %payload.origin,
        fingerprint = %payload.fingerprint,
        scenes = payload.scenes,
        frames = payload.frames,
        "story ingested"
    );

    let event = ContentEvent {
        metadata: EventMetadata {
            event_id: Uuid::new_v4(),
            event_type: STORY_INGESTED_EVENT_TYPE.to_owned(),
            sequence_number: 1,
            correlation_id: command.correlation_id(),
            at: Duration::ZERO,
            occurred_at: clock.now(),
        },
        kind: ContentEventKind::StoryIngested(payload),
    };

    Ok(IngestedStory {
        story,
        fingerprint,
        event,
    })
}
