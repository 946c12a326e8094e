//! Time-driven opacity interpolation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which way a fade goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeDirection {
    /// Hidden to visible.
    In,
    /// Visible to hidden.
    Out,
}

impl FadeDirection {
    /// Opacity once the fade has finished.
    #[must_use]
    pub fn target_opacity(self) -> f32 {
        match self {
            Self::In => 1.0,
            Self::Out => 0.0,
        }
    }
}

/// Returned when a fade is requested while another one runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeBusy {
    /// The fade that keeps running.
    pub running: FadeDirection,
}

#[derive(Debug, Clone, Copy)]
struct RunningFade {
    direction: FadeDirection,
    started_at: Duration,
    duration: Duration,
}

/// Linear opacity fade, at most one at a time.
///
/// The fader knows nothing about frames or timers: the owner asks for
/// samples at tick times and calls [`Fader::finish`] once `duration` has
/// elapsed.
#[derive(Debug, Default)]
pub struct Fader {
    running: Option<RunningFade>,
}

impl Fader {
    /// Opacity `elapsed` into a fade of `duration`, clamped to `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn opacity(direction: FadeDirection, elapsed: Duration, duration: Duration) -> f32 {
        let progress = if duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0)
        };
        let opacity = match direction {
            FadeDirection::In => progress,
            FadeDirection::Out => 1.0 - progress,
        };
        opacity as f32
    }

    /// Direction of the running fade, if any.
    #[must_use]
    pub fn running(&self) -> Option<FadeDirection> {
        self.running.map(|fade| fade.direction)
    }

    /// Starts a fade at `now` and returns the opacity at its first instant.
    ///
    /// # Errors
    ///
    /// Returns [`FadeBusy`] without touching the running fade when one is
    /// already in progress.
    pub fn begin(
        &mut self,
        direction: FadeDirection,
        duration: Duration,
        now: Duration,
    ) -> Result<f32, FadeBusy> {
        if let Some(fade) = self.running {
            return Err(FadeBusy {
                running: fade.direction,
            });
        }
        self.running = Some(RunningFade {
            direction,
            started_at: now,
            duration,
        });
        Ok(Self::opacity(direction, Duration::ZERO, duration))
    }

    /// Opacity of the running fade at `now`.
    #[must_use]
    pub fn sample(&self, now: Duration) -> Option<f32> {
        self.running.map(|fade| {
            Self::opacity(
                fade.direction,
                now.saturating_sub(fade.started_at),
                fade.duration,
            )
        })
    }

    /// Ends the running fade, returning its direction. Returns `None` when
    /// nothing was running, so completion is reported at most once.
    pub fn finish(&mut self) -> Option<FadeDirection> {
        self.running.take().map(|fade| fade.direction)
    }
}
