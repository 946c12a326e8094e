//! Stage event abstractions.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata attached to every stage event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Type name for routing (`stage.frame_started`, ...).
    pub event_type: String,
    /// Monotonically increasing position within the session.
    pub sequence_number: i64,
    /// Correlation ID of the command (or timer) that caused this event.
    pub correlation_id: Uuid,
    /// Virtual time on the stage timeline when the event was recorded.
    #[serde(with = "crate::seconds")]
    pub at: Duration,
    /// Wall-clock timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

/// Trait that all stage events implement.
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Returns the event type name.
    fn event_type(&self) -> &'static str;

    /// Serializes the event payload to JSON.
    fn to_payload(&self) -> serde_json::Value;

    /// Returns the metadata for this event.
    fn metadata(&self) -> &EventMetadata;
}
