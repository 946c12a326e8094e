//! Application layer: ingestion of story manifests.

pub mod command_handlers;
