//! Structured log line for every published domain event.

use stillframe_core::event::DomainEvent;
use tracing::debug;

/// Logs `event` with its type, position and payload.
pub fn record(event: &impl DomainEvent) {
    let metadata = event.metadata();
    debug!(
        event_type = event.event_type(),
        event_id = %metadata.event_id,
        sequence = metadata.sequence_number,
        correlation_id = %metadata.correlation_id,
        payload = %event.to_payload(),
        "event published"
    );
}
