//! Reading sources and the ingest loop
//!
//! A [`ReadingSource`] produces one reading per tick. The engine does not care
//! where readings come from; the simulated source here stands in for a
//! hardware or MQTT adapter.

mod r#loop;
mod simulator;

pub use r#loop::{IngestConfig, IngestLoop, IngestOutcome, OutOfOrderPolicy};
pub use simulator::{LoadModel, SimulatedSource, SimulatorConfig};

use crate::models::Reading;
use anyhow::Result;

pub use async_trait::async_trait;

/// Trait for producers of load readings
#[async_trait]
pub trait ReadingSource: Send {
    /// Produce the next reading
    async fn next_reading(&mut self) -> Result<Reading>;

    /// Human-readable source name for logs
    fn name(&self) -> &str;
}
