//! Stillframe — freeze-frame and scene orchestration engine.
//!
//! Responsible for the freeze-frame lifecycle (fade in, active, fade out),
//! scene switching, auto-progression and the haptic cue loop that nudges the
//! viewer toward interactive beats.

pub mod application;
pub mod domain;
