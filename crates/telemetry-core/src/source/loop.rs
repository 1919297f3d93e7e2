//! Ingest loop
//!
//! Pulls a reading from the source on a fixed cadence and feeds it to the
//! engine. This loop is the single writer of the engine; readers use the
//! snapshot handle returned by [`IngestLoop::reader`].

use super::ReadingSource;
use crate::engine::{SnapshotReader, TelemetryEngine};
use crate::error::TelemetryError;
use crate::health::{components, HealthRegistry};
use crate::models::{Reading, Recommendation};
use crate::observability::{MonitorMetrics, StructuredLogger};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// What to do when the source delivers an out-of-order reading
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutOfOrderPolicy {
    /// Drop the reading and keep the current session
    #[default]
    Drop,
    /// Start a new session with the reading as its first sample
    Reset,
}

/// Configuration for the ingest loop
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Time between readings (default: 2 seconds)
    pub interval: Duration,
    pub out_of_order_policy: OutOfOrderPolicy,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            out_of_order_policy: OutOfOrderPolicy::Drop,
        }
    }
}

/// Result of a single tick
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Accepted,
    /// The reading was refused and the engine is unchanged
    Dropped(TelemetryError),
    /// The reading was out of order and started a new session
    SessionReset,
    /// The source failed to produce a reading
    SourceFailed(String),
}

impl IngestOutcome {
    /// The error a reading was finally refused with, if it was refused
    pub fn rejection(&self) -> Option<&TelemetryError> {
        match self {
            IngestOutcome::Dropped(err) => Some(err),
            _ => None,
        }
    }
}

/// Periodically moves readings from a source into the engine
pub struct IngestLoop {
    source: Box<dyn ReadingSource>,
    engine: TelemetryEngine,
    config: IngestConfig,
    metrics: MonitorMetrics,
    logger: StructuredLogger,
    health: HealthRegistry,
    last_recommendations: Vec<Recommendation>,
}

impl IngestLoop {
    pub fn new(
        source: Box<dyn ReadingSource>,
        engine: TelemetryEngine,
        config: IngestConfig,
        metrics: MonitorMetrics,
        logger: StructuredLogger,
        health: HealthRegistry,
    ) -> Self {
        Self {
            source,
            engine,
            config,
            metrics,
            logger,
            health,
            last_recommendations: Vec::new(),
        }
    }

    /// Snapshot handle for readers; stays valid after the loop starts
    pub fn reader(&self) -> SnapshotReader {
        self.engine.subscribe()
    }

    pub fn engine(&self) -> &TelemetryEngine {
        &self.engine
    }

    /// Seed the engine with warm-up history
    pub async fn seed(&mut self, readings: Vec<Reading>) -> Result<()> {
        let count = readings.len();
        self.engine.seed(readings)?;

        let snapshot = self.engine.current_snapshot();
        self.metrics.record_snapshot(&snapshot);
        if count > 0 {
            self.health.set_ready(true).await;
        }
        info!(readings = count, source = %self.source.name(), "Engine warmed up");
        Ok(())
    }

    /// Run until a shutdown signal arrives
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval_ms = self.config.interval.as_millis() as u64,
            source = %self.source.name(),
            "Starting ingest loop"
        );

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = 0u64;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let outcome = self.step().await;
                    ticks += 1;

                    if ticks % 30 == 0 {
                        let snapshot = self.engine.current_snapshot();
                        self.logger.log_savings(&snapshot.savings);
                    }
                    debug!(tick = ticks, outcome = ?outcome, "Ingest tick complete");
                }
                _ = shutdown.recv() => {
                    info!("Shutting down ingest loop");
                    break;
                }
            }
        }
    }

    /// Pull one reading from the source and apply it
    pub async fn step(&mut self) -> IngestOutcome {
        let reading = match self.source.next_reading().await {
            Ok(reading) => reading,
            Err(e) => {
                self.metrics.inc_source_errors();
                self.logger.log_source_error(self.source.name(), &e.to_string());
                self.health
                    .set_degraded(components::SOURCE, format!("Source failed: {}", e))
                    .await;
                return IngestOutcome::SourceFailed(e.to_string());
            }
        };

        let start = Instant::now();
        let outcome = match self.engine.ingest(reading) {
            Ok(()) => IngestOutcome::Accepted,
            Err(err) => self.handle_rejection(err, reading),
        };
        self.metrics
            .observe_ingest_latency(start.elapsed().as_secs_f64());

        // Each reading is counted once, as ingested or as rejected
        match outcome.rejection() {
            Some(err) => {
                self.metrics.inc_readings_rejected(err.kind());
                self.logger.log_reading_rejected(err, &reading);
            }
            None => {
                self.metrics.inc_readings_ingested();
                self.after_accept(&reading).await;
            }
        }

        outcome
    }

    fn handle_rejection(&mut self, err: TelemetryError, reading: Reading) -> IngestOutcome {
        if !err.is_out_of_order() || self.config.out_of_order_policy != OutOfOrderPolicy::Reset {
            return IngestOutcome::Dropped(err);
        }

        self.engine.reset_session();
        self.metrics.inc_session_resets();
        self.logger.log_session_reset(&err.to_string());

        match self.engine.ingest(reading) {
            Ok(()) => IngestOutcome::SessionReset,
            Err(retry_err) => IngestOutcome::Dropped(retry_err),
        }
    }

    async fn after_accept(&mut self, reading: &Reading) {
        let snapshot = self.engine.current_snapshot();
        self.metrics.record_snapshot(&snapshot);

        let recommendations = snapshot.recommendations();
        if recommendations != self.last_recommendations {
            self.logger.log_recommendations(&recommendations, reading);
            self.last_recommendations = recommendations;
        }

        self.health.set_healthy(components::SOURCE).await;
        self.health.set_healthy(components::ENGINE).await;
        self.health.set_ready(true).await;
    }
}
