//! Simulated load source
//!
//! Generates an industrial load profile: a slow sinusoidal base load with
//! uniform noise and occasional spikes. Temperature and CO2 follow the current
//! linearly, and the energy counter integrates power over the simulated clock.

use super::{async_trait, ReadingSource};
use crate::config::DEFAULT_VOLTAGE;
use crate::models::Reading;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Linear relation between current and the derived sensor values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadModel {
    /// Mean base load (A)
    pub base_current: f64,
    /// Amplitude of the sinusoidal load cycle (A)
    pub cycle_amplitude: f64,
    /// Period scale of the load cycle in milliseconds
    pub cycle_period_ms: f64,
    /// Peak-to-peak uniform noise on current (A)
    pub current_noise: f64,
    pub spike_probability: f64,
    /// Current added during a spike (A)
    pub spike_current: f64,
    pub ambient_temperature: f64,
    /// Temperature rise per ampere (°C/A)
    pub temperature_per_amp: f64,
    pub temperature_noise: f64,
    pub ambient_co2: f64,
    /// CO2 rise per ampere (ppm/A)
    pub co2_per_amp: f64,
    pub co2_noise: f64,
}

impl Default for LoadModel {
    fn default() -> Self {
        Self {
            base_current: 8.0,
            cycle_amplitude: 3.0,
            cycle_period_ms: 300_000.0,
            current_noise: 2.0,
            spike_probability: 0.05,
            spike_current: 8.0,
            ambient_temperature: 25.0,
            temperature_per_amp: 2.5,
            temperature_noise: 3.0,
            ambient_co2: 420.0,
            co2_per_amp: 20.0,
            co2_noise: 50.0,
        }
    }
}

/// Configuration for the simulated source
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub voltage: f64,
    /// Simulated time between readings
    pub interval: std::time::Duration,
    /// Timestamp of the first generated reading
    pub start: DateTime<Utc>,
    /// Energy counter at the start (kWh)
    pub initial_energy_kwh: f64,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
    pub model: LoadModel,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            voltage: DEFAULT_VOLTAGE,
            interval: std::time::Duration::from_secs(2),
            start: Utc::now(),
            initial_energy_kwh: 20.0,
            seed: None,
            model: LoadModel::default(),
        }
    }
}

/// Reading source backed by a random load model
pub struct SimulatedSource {
    config: SimulatorConfig,
    rng: StdRng,
    next_timestamp: DateTime<Utc>,
    energy_kwh: f64,
}

impl SimulatedSource {
    pub fn new(config: SimulatorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            next_timestamp: config.start,
            energy_kwh: config.initial_energy_kwh,
            rng,
            config,
        }
    }

    /// Generate `count` readings for warming up an engine
    pub fn warmup(&mut self, count: usize) -> Vec<Reading> {
        (0..count).map(|_| self.generate()).collect()
    }

    /// Generate the next reading and advance the simulated clock
    pub fn generate(&mut self) -> Reading {
        let model = self.config.model;
        let timestamp = self.next_timestamp;

        let phase = timestamp.timestamp_millis() as f64 / model.cycle_period_ms;
        let base = model.base_current + model.cycle_amplitude * phase.sin();
        let spike = if self.rng.gen_bool(model.spike_probability.clamp(0.0, 1.0)) {
            model.spike_current
        } else {
            0.0
        };
        let current = (base + self.noise(model.current_noise) + spike).max(0.0);

        let temperature = model.ambient_temperature
            + current * model.temperature_per_amp
            + self.noise(model.temperature_noise);
        let co2 = (model.ambient_co2 + current * model.co2_per_amp + self.noise(model.co2_noise))
            .max(0.0);

        let interval_hours = self.config.interval.as_secs_f64() / 3600.0;
        let power = current * self.config.voltage;
        self.energy_kwh += power / 1000.0 * interval_hours;

        self.next_timestamp = timestamp
            + Duration::from_std(self.config.interval).unwrap_or_else(|_| Duration::seconds(2));

        Reading::new(
            current,
            temperature,
            co2,
            self.energy_kwh,
            timestamp,
            self.config.voltage,
        )
    }

    /// Uniform noise in `[-span/2, span/2)`
    fn noise(&mut self, span: f64) -> f64 {
        if span <= 0.0 {
            return 0.0;
        }
        (self.rng.gen::<f64>() - 0.5) * span
    }
}

#[async_trait]
impl ReadingSource for SimulatedSource {
    async fn next_reading(&mut self) -> Result<Reading> {
        Ok(self.generate())
    }

    fn name(&self) -> &str {
        "simulator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::TelemetryEngine;
    use chrono::TimeZone;

    fn seeded(seed: u64) -> SimulatedSource {
        SimulatedSource::new(SimulatorConfig {
            start: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            seed: Some(seed),
            ..Default::default()
        })
    }

    #[test]
    fn test_readings_satisfy_engine_invariants() {
        let mut source = seeded(7);
        let mut engine = TelemetryEngine::new(EngineConfig::default()).unwrap();

        for reading in source.warmup(200) {
            assert!(reading.current >= 0.0);
            assert!(reading.co2 >= 0.0);
            engine.ingest(reading).unwrap();
        }
    }

    #[test]
    fn test_clock_advances_by_interval() {
        let mut source = seeded(1);
        let readings = source.warmup(3);
        assert_eq!(
            readings[1].timestamp - readings[0].timestamp,
            Duration::seconds(2)
        );
        assert_eq!(
            readings[2].timestamp - readings[1].timestamp,
            Duration::seconds(2)
        );
    }

    #[test]
    fn test_energy_integrates_power() {
        let mut source = seeded(3);
        let reading = source.generate();
        let expected = 20.0 + reading.power / 1000.0 * (2.0 / 3600.0);
        assert!((reading.energy_cumulative - expected).abs() < 1e-12);
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let a = seeded(42).warmup(10);
        let b = seeded(42).warmup(10);
        assert_eq!(a, b);
    }

    #[test]
    fn test_noise_free_model_is_linear() {
        let mut source = SimulatedSource::new(SimulatorConfig {
            start: Utc.timestamp_opt(0, 0).unwrap(),
            seed: Some(0),
            model: LoadModel {
                cycle_amplitude: 0.0,
                current_noise: 0.0,
                spike_probability: 0.0,
                temperature_noise: 0.0,
                co2_noise: 0.0,
                ..LoadModel::default()
            },
            ..Default::default()
        });

        let reading = source.generate();
        assert_eq!(reading.current, 8.0);
        assert_eq!(reading.temperature, 45.0);
        assert_eq!(reading.co2, 580.0);
        assert_eq!(reading.power, 1840.0);
    }

    #[tokio::test]
    async fn test_trait_produces_readings() {
        let mut source = seeded(9);
        let first = source.next_reading().await.unwrap();
        let second = source.next_reading().await.unwrap();
        assert!(second.timestamp > first.timestamp);
        assert_eq!(source.name(), "simulator");
    }
}
