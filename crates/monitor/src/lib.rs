//! Energy monitor daemon
//!
//! Streams readings from a source into the telemetry engine and serves
//! health, metrics and snapshots over HTTP.

pub mod api;
pub mod config;
