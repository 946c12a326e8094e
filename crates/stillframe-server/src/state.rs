//! Shared application state.

use std::sync::Arc;

use crate::stage::StageHandle;

/// Application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Handle to the stage actor.
    pub stage: StageHandle,
    /// SHA-256 of the story being played.
    pub story_fingerprint: Arc<str>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(stage: StageHandle, story_fingerprint: impl Into<Arc<str>>) -> Self {
        Self {
            stage,
            story_fingerprint: story_fingerprint.into(),
        }
    }
}
