//! Keyed audio clips and level conversions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stillframe_core::error::StageError;

/// Levels below this linear gain are treated as silence.
pub const SILENCE_THRESHOLD: f32 = 0.0001;

/// Level reported for silence.
pub const SILENCE_DB: f32 = -80.0;

/// Converts a linear gain to decibels, flooring silence at [`SILENCE_DB`].
#[must_use]
pub fn linear_to_decibels(linear: f32) -> f32 {
    if linear < SILENCE_THRESHOLD {
        SILENCE_DB
    } else {
        20.0 * linear.log10()
    }
}

/// Converts decibels to a linear gain.
#[must_use]
pub fn decibels_to_linear(decibels: f32) -> f32 {
    10.0_f32.powf(decibels / 20.0)
}

fn full_volume() -> f32 {
    1.0
}

/// One registered clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClipDefinition {
    /// Lookup key.
    pub key: String,
    /// Asset reference handed to the audio backend.
    pub file: String,
    /// Linear playback gain in `[0, 1]`.
    #[serde(default = "full_volume")]
    pub volume: f32,
    /// Whether the clip loops.
    #[serde(default)]
    pub looping: bool,
}

impl ClipDefinition {
    /// Playback gain in decibels.
    #[must_use]
    pub fn volume_db(&self) -> f32 {
        linear_to_decibels(self.volume)
    }
}

/// Every clip of a story, by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioCatalog {
    clips: BTreeMap<String, ClipDefinition>,
}

impl AudioCatalog {
    /// Builds the catalog.
    ///
    /// # Errors
    ///
    /// Returns `StageError::Validation` for a duplicate or empty key, or a
    /// volume outside `[0, 1]`.
    pub fn build(clips: &[ClipDefinition]) -> Result<Self, StageError> {
        let mut catalog = BTreeMap::new();
        for clip in clips {
            if clip.key.trim().is_empty() {
                return Err(StageError::Validation(
                    "audio clip key must not be empty".to_owned(),
                ));
            }
            if !(0.0..=1.0).contains(&clip.volume) {
                return Err(StageError::Validation(format!(
                    "audio clip {} has volume {} outside [0, 1]",
                    clip.key, clip.volume
                )));
            }
            if catalog.insert(clip.key.clone(), clip.clone()).is_some() {
                return Err(StageError::Validation(format!(
                    "duplicate audio clip key {}",
                    clip.key
                )));
            }
        }
        Ok(Self { clips: catalog })
    }

    /// Looks a clip up by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ClipDefinition> {
        self.clips.get(key)
    }

    /// Number of clips.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// Whether the catalog has no clips.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}
