//! Stillframe Core — shared abstractions for the narrative sequencer.
//!
//! This crate defines the timeline the sequencer runs on, the capability
//! traits for every external collaborator (screen, audio, haptics,
//! locomotion, rendering) and the error and event types the other crates
//! share. It contains no infrastructure code.

pub mod clock;
pub mod command;
pub mod effects;
pub mod error;
pub mod event;
pub mod seconds;
pub mod timeline;
