//! Offline analysis of recorded readings

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use colored::Colorize;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::path::Path;
use telemetry_core::{
    report, EngineConfig, Reading, TelemetryEngine, TelemetryError, TelemetrySnapshot,
};

use crate::commands::savings::print_savings;
use crate::output::{print_json, print_success, print_warning, OutputFormat};

/// A reading as recorded to disk; power is derived when missing
#[derive(Debug, Clone, Deserialize)]
pub struct RecordedReading {
    pub current: f64,
    pub temperature: f64,
    pub co2: f64,
    #[serde(default)]
    pub power: Option<f64>,
    pub energy_cumulative: f64,
    pub timestamp: DateTime<Utc>,
}

impl RecordedReading {
    fn into_reading(self, voltage: f64) -> Reading {
        let mut reading = Reading::new(
            self.current,
            self.temperature,
            self.co2,
            self.energy_cumulative,
            self.timestamp,
            voltage,
        );
        if let Some(power) = self.power {
            reading.power = power;
        }
        reading
    }
}

/// A recorded reading the engine refused
#[derive(Debug, Clone, Serialize)]
pub struct Rejection {
    /// Position in the input file
    pub index: usize,
    pub reason: String,
    pub details: String,
}

/// Result of replaying a recording through the engine
#[derive(Debug, Serialize)]
pub struct AnalysisOutcome {
    pub snapshot: TelemetrySnapshot,
    pub rejected: Vec<Rejection>,
}

/// Replay readings through a fresh engine, skipping the ones it refuses
pub fn replay(readings: Vec<RecordedReading>, config: EngineConfig) -> Result<AnalysisOutcome> {
    let voltage = config.voltage;
    let mut engine = TelemetryEngine::new(config)?;
    let mut rejected = Vec::new();

    for (index, recorded) in readings.into_iter().enumerate() {
        let reading = recorded.into_reading(voltage);
        if let Err(err) = engine.ingest(reading) {
            rejected.push(rejection(index, &err));
        }
    }

    Ok(AnalysisOutcome {
        snapshot: engine.current_snapshot().as_ref().clone(),
        rejected,
    })
}

fn rejection(index: usize, err: &TelemetryError) -> Rejection {
    Rejection {
        index,
        reason: err.kind().to_string(),
        details: err.to_string(),
    }
}

/// A row of a CSV recording; `timestamp` is in milliseconds since the epoch
#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: f64,
    #[serde(rename = "current_A")]
    current: f64,
    #[serde(rename = "temp_C")]
    temperature: f64,
    #[serde(rename = "co2_ppm")]
    co2: f64,
    #[serde(rename = "power_W", default)]
    power: Option<f64>,
}

/// Seconds credited to the first row of a CSV recording
const FIRST_ROW_SECS: f64 = 0.1;

fn load_readings(path: &Path, voltage: f64) -> Result<Vec<RecordedReading>> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => load_json(path),
        Some("csv") => load_csv(path, voltage),
        _ => anyhow::bail!(
            "unsupported recording format: {} (expected .json or .csv)",
            path.display()
        ),
    }
}

fn load_json(path: &Path) -> Result<Vec<RecordedReading>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse readings from {}", path.display()))
}

/// Read a CSV recording, integrating cumulative energy from power over time
fn load_csv(path: &Path, voltage: f64) -> Result<Vec<RecordedReading>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

    let mut readings = Vec::new();
    let mut energy_kwh = 0.0;
    let mut previous: Option<DateTime<Utc>> = None;

    for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row = row.with_context(|| format!("Invalid reading row in {}", path.display()))?;
        let timestamp = Utc
            .timestamp_millis_opt(row.timestamp.round() as i64)
            .single()
            .with_context(|| format!("Row {} has an invalid timestamp {}", index, row.timestamp))?;

        let secs = match previous {
            Some(prev) => (timestamp - prev).num_milliseconds().max(0) as f64 / 1000.0,
            None => FIRST_ROW_SECS,
        };
        let power = row.power.unwrap_or(row.current * voltage);
        energy_kwh += power.max(0.0) * secs / 3600.0 / 1000.0;
        previous = Some(timestamp);

        readings.push(RecordedReading {
            current: row.current,
            temperature: row.temperature,
            co2: row.co2,
            power: row.power,
            energy_cumulative: energy_kwh,
            timestamp,
        });
    }

    Ok(readings)
}

/// Engine settings for an offline run
#[derive(Debug, Clone)]
struct AnalysisConfig {
    engine: EngineConfig,
    /// The config file set `window_capacity` itself
    window_pinned: bool,
}

fn load_engine_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    let Some(path) = path else {
        return Ok(AnalysisConfig {
            engine: EngineConfig::default(),
            window_pinned: false,
        });
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse engine config from {}", path.display()))?;
    let window_pinned = value.get("window_capacity").is_some();
    let engine: EngineConfig = serde_json::from_value(value)
        .with_context(|| format!("Failed to parse engine config from {}", path.display()))?;
    engine.validate()?;

    Ok(AnalysisConfig {
        engine,
        window_pinned,
    })
}

/// Load a recording and the engine config it is replayed with
///
/// Unless the config file pins `window_capacity`, the window holds the whole
/// recording so the estimates cover the same span as the session baseline.
fn prepare(
    input: &Path,
    config_path: Option<&Path>,
) -> Result<(Vec<RecordedReading>, EngineConfig)> {
    let AnalysisConfig {
        mut engine,
        window_pinned,
    } = load_engine_config(config_path)?;
    let readings = load_readings(input, engine.voltage)?;
    if !window_pinned {
        engine.window_capacity = readings.len().max(1);
    }
    Ok((readings, engine))
}

/// Run the engine over a recording (JSON array or CSV) and print the report
pub fn run_analysis(
    input: &Path,
    config_path: Option<&Path>,
    currency: &str,
    format: OutputFormat,
) -> Result<()> {
    let (readings, config) = prepare(input, config_path)?;
    let total = readings.len();

    let outcome = replay(readings, config.clone())?;

    if format == OutputFormat::Json {
        return print_json(&outcome);
    }

    let accepted = total - outcome.rejected.len();
    print_success(&format!("Replayed {} of {} readings", accepted, total));
    for rejection in &outcome.rejected {
        print_warning(&format!(
            "Reading #{} skipped: {}",
            rejection.index, rejection.details
        ));
    }
    println!();

    print!("{}", report::render(&outcome.snapshot, &config));
    println!();
    print_savings(&outcome.snapshot.savings, currency);

    if outcome.snapshot.window.len() < accepted {
        println!();
        println!(
            "{}",
            format!(
                "Estimates cover the last {} readings (window_capacity)",
                outcome.snapshot.window.len()
            )
            .dimmed()
        );
    }

    Ok(())
}
