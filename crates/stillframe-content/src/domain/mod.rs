//! Domain model of story content.

pub mod audio;
pub mod commands;
pub mod error;
pub mod events;
pub mod manifest;
