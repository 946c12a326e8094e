//! Stage timing and effect configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use stillframe_core::effects::{AudioSource, Color, HapticPulse};
use stillframe_core::error::StageError;

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

/// Timing and effect parameters of the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StageConfig {
    /// Screen and music fade-in at session start.
    #[serde(with = "stillframe_core::seconds")]
    pub startup_fade: Duration,
    /// Screen and music fade used by `RequestNextScene`.
    #[serde(with = "stillframe_core::seconds")]
    pub scene_fade: Duration,
    /// Frame fade used when a transition names no duration.
    #[serde(with = "stillframe_core::seconds")]
    pub standard_frame_fade: Duration,
    /// Pause on a black screen between tearing down one scene and enabling
    /// the next.
    #[serde(with = "stillframe_core::seconds")]
    pub scene_settle_delay: Duration,
    /// Pause between the exit screen fade and the exit music fade.
    #[serde(with = "stillframe_core::seconds")]
    pub exit_audio_delay: Duration,
    /// Haptic cue loop.
    pub haptic: HapticCueConfig,
    /// Point-of-interest audio.
    pub point_of_interest: PointOfInterestConfig,
    /// Possession side-mode.
    pub possession: PossessionConfig,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            startup_fade: secs(10),
            scene_fade: secs(10),
            standard_frame_fade: secs(4),
            scene_settle_delay: secs(5),
            exit_audio_delay: secs(5),
            haptic: HapticCueConfig::default(),
            point_of_interest: PointOfInterestConfig::default(),
            possession: PossessionConfig::default(),
        }
    }
}

impl StageConfig {
    /// Checks the values serde cannot.
    ///
    /// # Errors
    ///
    /// Returns `StageError::Validation` for a zero haptic interval, which
    /// would reschedule the cue loop at the same instant forever.
    pub fn validate(&self) -> Result<(), StageError> {
        if self.haptic.interval.is_zero() {
            return Err(StageError::Validation(
                "haptic.interval must be greater than zero".to_owned(),
            ));
        }
        Ok(())
    }
}

/// The loop that pulses the controllers while an interactive frame waits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HapticCueConfig {
    /// Wait before the first pulse, unless the frame sets its own `cue_delay`.
    #[serde(with = "stillframe_core::seconds")]
    pub initial_delay: Duration,
    /// Wait between pulses.
    #[serde(with = "stillframe_core::seconds")]
    pub interval: Duration,
    /// Pulse sent to every controller.
    pub pulse: HapticPulse,
    /// Clip played alongside each pulse by the frame's cue sources.
    pub cue_clip: Option<String>,
}

impl Default for HapticCueConfig {
    fn default() -> Self {
        Self {
            initial_delay: secs(10),
            interval: secs(15),
            pulse: HapticPulse::default(),
            cue_clip: None,
        }
    }
}

/// The shared emitter used for point-of-interest sounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PointOfInterestConfig {
    /// Emitter that is moved to each point of interest.
    pub source: AudioSource,
    /// Clip key used when a frame names none.
    pub default_sound: String,
}

impl Default for PointOfInterestConfig {
    fn default() -> Self {
        Self {
            source: AudioSource("poi".to_owned()),
            default_sound: "exhale".to_owned(),
        }
    }
}

/// Possession side-mode timings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PossessionConfig {
    /// Screen and music fade on either side of the swap.
    #[serde(with = "stillframe_core::seconds")]
    pub fade: Duration,
    /// Time spent on a black screen after the swap.
    #[serde(with = "stillframe_core::seconds")]
    pub hold: Duration,
    /// Screen tint while possessed.
    pub tint: Color,
    /// Music track while possessed.
    pub music: Option<String>,
}

impl Default for PossessionConfig {
    fn default() -> Self {
        Self {
            fade: secs(4),
            hold: Duration::from_millis(1500),
            tint: Color::rgba(0.2, 0.0, 0.0, 0.2),
            music: None,
        }
    }
}
