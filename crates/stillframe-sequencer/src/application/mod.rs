//! Application layer: command handling and trigger sources.

pub mod command_handlers;
pub mod triggers;
