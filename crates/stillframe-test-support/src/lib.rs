//! Shared test doubles for the Stillframe narrative sequencer.

mod clock;
mod effects;

pub use clock::FixedClock;
pub use effects::{Effect, RecordingEffects};
