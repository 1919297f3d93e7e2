//! Telemetry engine
//!
//! Owns the rolling window and the session baseline, validates each incoming
//! reading and publishes a fully built [`TelemetrySnapshot`] after every
//! accepted update. Snapshots are immutable once published; readers hold an
//! `Arc` to the version that was current when they looked.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::analysis::WindowAnalysis;
use crate::classify::{classify_reading, recommendations};
use crate::config::EngineConfig;
use crate::error::TelemetryError;
use crate::models::{Classifications, Reading, Recommendation, SavingsSummary};
use crate::savings::{SavingsConfig, SavingsEstimator};
use crate::window::ReadingWindow;

/// Lifecycle of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// No reading accepted yet
    Uninitialized,
    /// At least one reading accepted in the current session
    Streaming,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineState::Uninitialized => write!(f, "uninitialized"),
            EngineState::Streaming => write!(f, "streaming"),
        }
    }
}

/// Consistent view of the engine after an update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub state: EngineState,
    pub latest: Option<Reading>,
    pub classifications: Option<Classifications>,
    /// Window contents, most recent last
    pub window: Vec<Reading>,
    pub savings: SavingsSummary,
    pub analysis: WindowAnalysis,
    /// Readings accepted since the session started
    pub accepted: u64,
    pub session_started_at: Option<DateTime<Utc>>,
}

impl TelemetrySnapshot {
    fn empty() -> Self {
        Self {
            state: EngineState::Uninitialized,
            latest: None,
            classifications: None,
            window: Vec::new(),
            savings: SavingsSummary::default(),
            analysis: WindowAnalysis::default(),
            accepted: 0,
            session_started_at: None,
        }
    }

    /// Live recommendations for the latest reading
    pub fn recommendations(&self) -> Vec<Recommendation> {
        self.classifications
            .as_ref()
            .map(recommendations)
            .unwrap_or_default()
    }
}

/// Read-only handle to the most recently published snapshot
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    rx: watch::Receiver<Arc<TelemetrySnapshot>>,
}

impl SnapshotReader {
    /// The latest published snapshot
    pub fn current(&self) -> Arc<TelemetrySnapshot> {
        self.rx.borrow().clone()
    }

    /// Wait until a newer snapshot is published
    ///
    /// Fails once the engine has been dropped.
    pub async fn changed(&mut self) -> Result<Arc<TelemetrySnapshot>> {
        self.rx.changed().await?;
        Ok(self.rx.borrow_and_update().clone())
    }
}

/// Session bookkeeping: baseline energy and the last accepted reading
#[derive(Debug, Clone, Copy)]
struct Session {
    started_at: DateTime<Utc>,
    baseline_start_kwh: f64,
    last: Reading,
}

/// Aggregates readings into rolling state and savings estimates
pub struct TelemetryEngine {
    config: EngineConfig,
    window: ReadingWindow,
    estimator: SavingsEstimator,
    session: Option<Session>,
    accepted: u64,
    tx: watch::Sender<Arc<TelemetrySnapshot>>,
}

impl TelemetryEngine {
    /// Create an engine with the given configuration
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let (tx, _rx) = watch::channel(Arc::new(TelemetrySnapshot::empty()));

        Ok(Self {
            window: ReadingWindow::new(config.window_capacity),
            estimator: SavingsEstimator::new(SavingsConfig::from(&config)),
            config,
            session: None,
            accepted: 0,
            tx,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        if self.session.is_some() {
            EngineState::Streaming
        } else {
            EngineState::Uninitialized
        }
    }

    /// Handle for readers of published snapshots
    pub fn subscribe(&self) -> SnapshotReader {
        SnapshotReader {
            rx: self.tx.subscribe(),
        }
    }

    /// The most recently published snapshot
    pub fn current_snapshot(&self) -> Arc<TelemetrySnapshot> {
        self.tx.borrow().clone()
    }

    /// Energy consumed since the session started (kWh)
    pub fn session_energy_kwh(&self) -> f64 {
        self.session
            .map(|s| s.last.energy_cumulative - s.baseline_start_kwh)
            .unwrap_or(0.0)
    }

    /// Bulk-load warm-up history
    ///
    /// The whole batch is validated before anything is applied; on error the
    /// engine is unchanged. Only the most recent `window_capacity` readings are
    /// retained in the window.
    pub fn seed<I>(&mut self, readings: I) -> Result<(), TelemetryError>
    where
        I: IntoIterator<Item = Reading>,
    {
        let readings: Vec<Reading> = readings.into_iter().collect();
        let (first, last) = match (readings.first(), readings.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Ok(()),
        };

        let mut previous = self.session.map(|s| s.last);
        for reading in &readings {
            self.validate(reading)?;
            if let Some(prev) = previous {
                check_order(&prev, reading)?;
            }
            previous = Some(*reading);
        }

        self.begin_session_if_needed(&first);
        if let Some(session) = self.session.as_mut() {
            session.last = last;
        }
        self.accepted += readings.len() as u64;
        self.window.extend(readings);
        self.publish();

        info!(
            retained = self.window.len(),
            accepted = self.accepted,
            "Seeded telemetry window"
        );
        Ok(())
    }

    /// Accept one reading
    ///
    /// On error the window, baseline and published snapshot are unchanged.
    pub fn ingest(&mut self, reading: Reading) -> Result<(), TelemetryError> {
        self.validate(&reading)?;
        if let Some(session) = &self.session {
            check_order(&session.last, &reading)?;
        }

        self.begin_session_if_needed(&reading);
        if let Some(session) = self.session.as_mut() {
            session.last = reading;
        }
        self.accepted += 1;
        self.window.append(reading);
        self.publish();

        debug!(
            current = reading.current,
            power = reading.power,
            window = self.window.len(),
            "Reading ingested"
        );
        Ok(())
    }

    /// Drop the window and baseline and start a new session
    pub fn reset_session(&mut self) {
        info!(
            discarded = self.window.len(),
            accepted = self.accepted,
            "Resetting telemetry session"
        );
        self.window.clear();
        self.session = None;
        self.accepted = 0;
        self.tx.send_replace(Arc::new(TelemetrySnapshot::empty()));
    }

    /// Check structural invariants of a reading
    pub fn validate(&self, reading: &Reading) -> Result<(), TelemetryError> {
        let fields = [
            ("current", reading.current),
            ("temperature", reading.temperature),
            ("co2", reading.co2),
            ("power", reading.power),
            ("energy_cumulative", reading.energy_cumulative),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(TelemetryError::invalid(format!("{} is not finite", name)));
            }
        }

        if reading.current < 0.0 {
            return Err(TelemetryError::invalid(format!(
                "negative current {}",
                reading.current
            )));
        }
        if reading.co2 < 0.0 {
            return Err(TelemetryError::invalid(format!(
                "negative co2 {}",
                reading.co2
            )));
        }

        let expected = reading.current * self.config.voltage;
        if (reading.power - expected).abs() > self.config.power_tolerance {
            return Err(TelemetryError::invalid(format!(
                "power {} W does not match {} A at {} V",
                reading.power, reading.current, self.config.voltage
            )));
        }

        Ok(())
    }

    fn begin_session_if_needed(&mut self, first: &Reading) {
        if self.session.is_none() {
            self.session = Some(Session {
                started_at: first.timestamp,
                baseline_start_kwh: first.energy_cumulative,
                last: *first,
            });
            info!(started_at = %first.timestamp, "Telemetry session started");
        }
    }

    /// Build a complete snapshot and swap it in
    fn publish(&self) {
        let window = self.window.snapshot();
        let latest = window.last().copied();
        let baseline = self.session_energy_kwh();

        let snapshot = TelemetrySnapshot {
            state: self.state(),
            latest,
            classifications: latest.map(|r| classify_reading(&r, &self.config.bands)),
            savings: self.estimator.summarize(&window, baseline),
            analysis: WindowAnalysis::compute(&window, &self.config),
            window,
            accepted: self.accepted,
            session_started_at: self.session.map(|s| s.started_at),
        };

        self.tx.send_replace(Arc::new(snapshot));
    }
}

/// Timestamps must strictly increase and energy must not decrease
fn check_order(previous: &Reading, reading: &Reading) -> Result<(), TelemetryError> {
    if reading.timestamp <= previous.timestamp {
        return Err(TelemetryError::OutOfOrderReading {
            reason: "timestamp is not after the previous reading".to_string(),
            previous: previous.timestamp,
            received: reading.timestamp,
        });
    }
    if reading.energy_cumulative < previous.energy_cumulative {
        return Err(TelemetryError::OutOfOrderReading {
            reason: format!(
                "energy counter regressed from {} to {} kWh",
                previous.energy_cumulative, reading.energy_cumulative
            ),
            previous: previous.timestamp,
            received: reading.timestamp,
        });
    }
    Ok(())
}
