//! Stillframe server — runs a story on a stage actor and exposes it over HTTP.
//!
//! The library half holds everything the binary wires together so the
//! integration tests can build the same router.

pub mod config;
pub mod effects;
pub mod error;
pub mod journal;
pub mod routes;
pub mod stage;
pub mod state;
