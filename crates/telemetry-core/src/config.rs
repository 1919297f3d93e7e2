//! Engine configuration
//!
//! Every field has a default matching the reference deployment, so an empty
//! config source deserializes into a usable engine configuration.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::models::ThresholdBand;

/// Default number of readings kept for charting
pub const DEFAULT_WINDOW_CAPACITY: usize = 50;

/// Default line voltage (230V AC)
pub const DEFAULT_VOLTAGE: f64 = 230.0;

/// Default grid emission factor in kgCO2 per kWh
pub const DEFAULT_EMISSION_FACTOR: f64 = 0.82;

/// Configuration for the telemetry engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of readings in the rolling window
    #[serde(default = "default_window_capacity")]
    pub window_capacity: usize,

    /// Line voltage used to derive power from current
    #[serde(default = "default_voltage")]
    pub voltage: f64,

    /// Grid emission factor (kgCO2/kWh)
    #[serde(default = "default_emission_factor")]
    pub emission_factor: f64,

    /// Electricity tariff (currency per kWh)
    #[serde(default = "default_tariff_rate")]
    pub tariff_rate: f64,

    /// Current below which the load is considered idle (A)
    #[serde(default = "default_idle_threshold")]
    pub idle_threshold: f64,

    /// Standby draw credited to idle readings that report no power (W)
    #[serde(default = "default_idle_power_draw")]
    pub idle_power_draw: f64,

    /// Temperature above which heat recovery applies (°C)
    #[serde(default = "default_heat_recovery_threshold")]
    pub heat_recovery_threshold: f64,

    /// Recoverable energy per high-temperature hour (kWh/h)
    #[serde(default = "default_recovery_rate")]
    pub recovery_rate: f64,

    /// Allowed deviation between reported and derived power (W)
    #[serde(default = "default_power_tolerance")]
    pub power_tolerance: f64,

    /// Nominal sampling interval, credited to the oldest reading in the window
    #[serde(default = "default_sample_interval_secs")]
    pub sample_interval_secs: f64,

    #[serde(default)]
    pub bands: BandConfig,
}

/// Threshold bands per classified metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandConfig {
    #[serde(default = "default_current_band")]
    pub current: ThresholdBand,
    #[serde(default = "default_temperature_band")]
    pub temperature: ThresholdBand,
    #[serde(default = "default_co2_band")]
    pub co2: ThresholdBand,
}

fn default_window_capacity() -> usize {
    DEFAULT_WINDOW_CAPACITY
}

fn default_voltage() -> f64 {
    DEFAULT_VOLTAGE
}

fn default_emission_factor() -> f64 {
    DEFAULT_EMISSION_FACTOR
}

fn default_tariff_rate() -> f64 {
    6.0
}

fn default_idle_threshold() -> f64 {
    2.0
}

fn default_idle_power_draw() -> f64 {
    115.0
}

fn default_heat_recovery_threshold() -> f64 {
    55.0
}

fn default_recovery_rate() -> f64 {
    0.3
}

fn default_power_tolerance() -> f64 {
    0.5
}

fn default_sample_interval_secs() -> f64 {
    2.0
}

fn default_current_band() -> ThresholdBand {
    ThresholdBand::new(2.0, 15.0)
}

fn default_temperature_band() -> ThresholdBand {
    ThresholdBand::new(20.0, 60.0)
}

fn default_co2_band() -> ThresholdBand {
    ThresholdBand::new(400.0, 600.0)
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            current: default_current_band(),
            temperature: default_temperature_band(),
            co2: default_co2_band(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_capacity: default_window_capacity(),
            voltage: default_voltage(),
            emission_factor: default_emission_factor(),
            tariff_rate: default_tariff_rate(),
            idle_threshold: default_idle_threshold(),
            idle_power_draw: default_idle_power_draw(),
            heat_recovery_threshold: default_heat_recovery_threshold(),
            recovery_rate: default_recovery_rate(),
            power_tolerance: default_power_tolerance(),
            sample_interval_secs: default_sample_interval_secs(),
            bands: BandConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.window_capacity == 0 {
            bail!("window_capacity must be greater than zero");
        }
        if !(self.voltage.is_finite() && self.voltage > 0.0) {
            bail!("voltage must be a positive number, got {}", self.voltage);
        }

        let non_negative = [
            ("emission_factor", self.emission_factor),
            ("tariff_rate", self.tariff_rate),
            ("idle_threshold", self.idle_threshold),
            ("idle_power_draw", self.idle_power_draw),
            ("recovery_rate", self.recovery_rate),
            ("power_tolerance", self.power_tolerance),
            ("sample_interval_secs", self.sample_interval_secs),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                bail!("{} must be a non-negative number, got {}", name, value);
            }
        }

        for (name, band) in [
            ("current", self.bands.current),
            ("temperature", self.bands.temperature),
            ("co2", self.bands.co2),
        ] {
            if !(band.low.is_finite() && band.high.is_finite()) || band.low > band.high {
                bail!(
                    "band for {} must satisfy low <= high, got [{}, {}]",
                    name,
                    band.low,
                    band.high
                );
            }
        }

        Ok(())
    }
}
