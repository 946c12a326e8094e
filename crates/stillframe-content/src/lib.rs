//! Stillframe story content.
//!
//! Responsible for YAML story manifest ingestion, validation, compilation
//! into a playable story graph, and fingerprinting of the source.

pub mod application;
pub mod domain;
