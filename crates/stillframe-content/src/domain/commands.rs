//! Commands for story content.

use stillframe_core::command::Command;
use uuid::Uuid;

/// Command to ingest a story manifest.
#[derive(Debug, Clone)]
pub struct IngestStory {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Where the manifest was read from, for logging.
    pub origin: String,
    /// The manifest YAML.
    pub source: String,
}

impl Command for IngestStory {
    fn command_type(&self) -> &'static str {
        "content.ingest_story"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
