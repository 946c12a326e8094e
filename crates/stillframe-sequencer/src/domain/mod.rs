//! Domain model of the sequencer.

pub mod behavior;
pub mod commands;
pub mod config;
pub mod context;
pub mod definition;
pub mod events;
pub mod fader;
pub mod freeze_frame;
pub mod graph;
pub mod ids;
pub mod orchestrator;
pub mod scene;
