//! Content error types.

use stillframe_core::error::StageError;
use thiserror::Error;

/// Why a story manifest could not be ingested.
#[derive(Debug, Error)]
pub enum ContentError {
    /// The YAML is malformed or does not match the manifest shape.
    #[error("manifest parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The manifest parsed but describes an unplayable story.
    #[error("invalid story: {0}")]
    Invalid(#[from] StageError),
}
