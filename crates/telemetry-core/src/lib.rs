//! Telemetry core for electrical load monitoring
//!
//! This crate provides the core functionality for:
//! - Rolling windows of load readings
//! - Threshold classification of current, temperature and CO2
//! - Idle elimination and heat recovery savings estimation
//! - Snapshot publication for presentation layers
//! - Reading sources, health checks and observability

pub mod analysis;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod report;
pub mod savings;
pub mod source;
pub mod window;

pub use classify::{classify, is_alertable};
pub use config::{BandConfig, EngineConfig};
pub use engine::{EngineState, SnapshotReader, TelemetryEngine, TelemetrySnapshot};
pub use error::TelemetryError;
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{MonitorMetrics, StructuredLogger};
pub use window::ReadingWindow;
