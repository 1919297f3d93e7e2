//! Short-window consumption analytics
//!
//! Summary statistics over the rolling window, per-reading operational state
//! and moving-average smoothing for power charts.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::models::{OperationalState, Reading};
use crate::window::with_elapsed_hours;

/// Default moving-average width for chart smoothing
pub const DEFAULT_SMOOTHING_WINDOW: usize = 5;

/// Consumption statistics over a slice of readings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowAnalysis {
    pub samples: usize,
    pub avg_power_w: f64,
    pub max_power_w: f64,
    pub avg_temperature_c: f64,
    pub max_temperature_c: f64,
    pub avg_co2_ppm: f64,
    /// Hours covered by the readings
    pub monitored_hours: f64,
    pub idle_hours: f64,
    /// Idle hours as a percentage of monitored hours
    pub idle_share_percent: f64,
    /// Energy counter delta between the first and last reading (kWh)
    pub energy_delta_kwh: f64,
}

impl WindowAnalysis {
    /// Compute statistics for the readings
    pub fn compute(readings: &[Reading], config: &EngineConfig) -> Self {
        let (first, last) = match (readings.first(), readings.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Self::default(),
        };

        let count = readings.len() as f64;
        let mean = |f: fn(&Reading) -> f64| readings.iter().map(f).sum::<f64>() / count;
        let max = |f: fn(&Reading) -> f64| readings.iter().map(f).fold(f64::MIN, f64::max);

        let mut monitored_hours = 0.0;
        let mut idle_hours = 0.0;
        for (reading, hours) in with_elapsed_hours(readings, config.sample_interval_secs) {
            monitored_hours += hours;
            if reading.current < config.idle_threshold {
                idle_hours += hours;
            }
        }

        let idle_share_percent = if monitored_hours > 0.0 {
            idle_hours / monitored_hours * 100.0
        } else {
            0.0
        };

        Self {
            samples: readings.len(),
            avg_power_w: mean(|r| r.power),
            max_power_w: max(|r| r.power),
            avg_temperature_c: mean(|r| r.temperature),
            max_temperature_c: max(|r| r.temperature),
            avg_co2_ppm: mean(|r| r.co2),
            monitored_hours,
            idle_hours,
            idle_share_percent,
            energy_delta_kwh: (last.energy_cumulative - first.energy_cumulative).max(0.0),
        }
    }
}

/// Load state of a reading: idle below the idle threshold, high load above
/// the upper current band
pub fn operational_state(reading: &Reading, config: &EngineConfig) -> OperationalState {
    if reading.current < config.idle_threshold {
        OperationalState::Idle
    } else if reading.current > config.bands.current.high {
        OperationalState::HighLoad
    } else {
        OperationalState::Normal
    }
}

/// Trailing moving average
///
/// Positions with fewer than `width` predecessors average what is available,
/// so the output has the same length as the input.
pub fn moving_average(values: &[f64], width: usize) -> Vec<f64> {
    let width = width.max(1);
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;

    for (i, value) in values.iter().enumerate() {
        sum += value;
        if i >= width {
            sum -= values[i - width];
        }
        let n = (i + 1).min(width) as f64;
        out.push(sum / n);
    }

    out
}

/// Power series of the readings smoothed for charting
pub fn smoothed_power(readings: &[Reading], width: usize) -> Vec<f64> {
    let power: Vec<f64> = readings.iter().map(|r| r.power).collect();
    moving_average(&power, width)
}
