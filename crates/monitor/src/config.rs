//! Monitor configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use telemetry_core::source::{IngestConfig, OutOfOrderPolicy, SimulatorConfig};
use telemetry_core::EngineConfig;

/// Environment variable naming an optional configuration file
pub const CONFIG_PATH_ENV: &str = "MONITOR_CONFIG";

/// Engine key that otherwise follows `ingest_interval_ms`
const SAMPLE_INTERVAL_KEY: &str = "engine.sample_interval_secs";

/// Monitor daemon configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Name attached to every log record
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// API server port for health, metrics and snapshots
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Time between readings in milliseconds
    #[serde(default = "default_ingest_interval")]
    pub ingest_interval_ms: u64,

    /// Readings generated before streaming starts
    #[serde(default = "default_warmup_readings")]
    pub warmup_readings: usize,

    #[serde(default)]
    pub out_of_order_policy: OutOfOrderPolicy,

    /// Fixed seed for the simulated source
    #[serde(default)]
    pub simulator_seed: Option<u64>,

    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "energy-monitor".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_ingest_interval() -> u64 {
    2000
}

fn default_warmup_readings() -> usize {
    20
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            instance_name: default_instance_name(),
            api_port: default_api_port(),
            ingest_interval_ms: default_ingest_interval(),
            warmup_readings: default_warmup_readings(),
            out_of_order_policy: OutOfOrderPolicy::default(),
            simulator_seed: None,
            engine: EngineConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from the `MONITOR_CONFIG` file and environment
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).ok();
        Self::load_from(path.as_deref().map(Path::new))
    }

    /// Load configuration from an optional file, then `MONITOR_*` variables
    ///
    /// Nested keys use a double underscore, e.g. `MONITOR_ENGINE__TARIFF_RATE`.
    /// `engine.sample_interval_secs` follows `ingest_interval_ms` unless set.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let raw = builder
            .add_source(
                config::Environment::with_prefix("MONITOR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read monitor configuration")?;

        let sample_interval_set = raw.get::<f64>(SAMPLE_INTERVAL_KEY).is_ok();

        let mut config: MonitorConfig = raw
            .try_deserialize()
            .context("Invalid monitor configuration")?;
        if !sample_interval_set {
            config.engine.sample_interval_secs = config.ingest_interval().as_secs_f64();
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ingest_interval_ms == 0 {
            anyhow::bail!("ingest_interval_ms must be greater than zero");
        }
        self.engine.validate()
    }

    pub fn ingest_interval(&self) -> Duration {
        Duration::from_millis(self.ingest_interval_ms)
    }

    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            interval: self.ingest_interval(),
            out_of_order_policy: self.out_of_order_policy,
        }
    }

    /// Simulator whose warm-up history ends at the current time
    pub fn simulator_config(&self) -> SimulatorConfig {
        let interval = self.ingest_interval();
        let lead = chrono::Duration::milliseconds(
            (self.ingest_interval_ms as i64).saturating_mul(self.warmup_readings as i64),
        );

        SimulatorConfig {
            voltage: self.engine.voltage,
            interval,
            start: chrono::Utc::now() - lead,
            seed: self.simulator_seed,
            ..SimulatorConfig::default()
        }
    }
}
