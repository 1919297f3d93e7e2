//! Savings estimation
//!
//! Computes the idle elimination and heat recovery opportunities over a slice
//! of readings and aggregates them into a [`SavingsSummary`].

use crate::config::EngineConfig;
use crate::models::{OpportunityKind, Reading, SavingsOpportunity, SavingsSummary};
use crate::window::with_elapsed_hours;

/// Hours in a (non-leap) year, for annualized projections
pub const HOURS_PER_YEAR: f64 = 365.0 * 24.0;

/// Parameters used by the estimator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavingsConfig {
    /// Current below which a reading counts as idle (A)
    pub idle_threshold: f64,
    /// Standby draw for idle readings that report zero power (W)
    pub idle_power_draw: f64,
    /// Temperature above which heat recovery applies (°C)
    pub heat_recovery_threshold: f64,
    /// Recoverable energy per high-temperature hour (kWh/h)
    pub recovery_rate: f64,
    /// kgCO2 per kWh
    pub emission_factor: f64,
    /// Currency per kWh
    pub tariff_rate: f64,
    /// Seconds credited to the oldest reading of a slice
    pub sample_interval_secs: f64,
}

impl From<&EngineConfig> for SavingsConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            idle_threshold: config.idle_threshold,
            idle_power_draw: config.idle_power_draw,
            heat_recovery_threshold: config.heat_recovery_threshold,
            recovery_rate: config.recovery_rate,
            emission_factor: config.emission_factor,
            tariff_rate: config.tariff_rate,
            sample_interval_secs: config.sample_interval_secs,
        }
    }
}

impl Default for SavingsConfig {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

/// Estimates savings opportunities from reading history
#[derive(Debug, Clone)]
pub struct SavingsEstimator {
    config: SavingsConfig,
}

impl SavingsEstimator {
    pub fn new(config: SavingsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SavingsConfig {
        &self.config
    }

    /// Energy that could be saved by switching off during idle readings
    ///
    /// Each idle reading contributes its elapsed hours times its observed
    /// power, so the result equals idle hours times the time-weighted average
    /// idle draw.
    pub fn idle_elimination(&self, readings: &[Reading]) -> SavingsOpportunity {
        let mut idle_hours = 0.0;
        let mut watt_hours = 0.0;

        for (reading, hours) in with_elapsed_hours(readings, self.config.sample_interval_secs) {
            if reading.current < self.config.idle_threshold {
                let draw = if reading.power > 0.0 {
                    reading.power
                } else {
                    self.config.idle_power_draw
                };
                idle_hours += hours;
                watt_hours += hours * draw;
            }
        }

        self.opportunity(OpportunityKind::IdleElimination, idle_hours, watt_hours / 1000.0)
    }

    /// Energy recoverable as heat during high-temperature readings
    pub fn heat_recovery(&self, readings: &[Reading]) -> SavingsOpportunity {
        let high_temp_hours: f64 = with_elapsed_hours(readings, self.config.sample_interval_secs)
            .filter(|(reading, _)| reading.temperature > self.config.heat_recovery_threshold)
            .map(|(_, hours)| hours)
            .sum();

        self.opportunity(
            OpportunityKind::HeatRecovery,
            high_temp_hours,
            high_temp_hours * self.config.recovery_rate,
        )
    }

    /// Aggregate both opportunities against the session baseline
    ///
    /// A zero baseline yields a percentage of zero.
    pub fn summarize(&self, readings: &[Reading], baseline_energy_kwh: f64) -> SavingsSummary {
        if readings.is_empty() {
            return SavingsSummary {
                baseline_energy_kwh,
                ..SavingsSummary::default()
            };
        }

        let idle_elimination = self.idle_elimination(readings);
        let heat_recovery = self.heat_recovery(readings);

        let total_energy_kwh = idle_elimination.energy_kwh + heat_recovery.energy_kwh;
        let total_co2_kg = idle_elimination.co2_kg + heat_recovery.co2_kg;
        let total_cost = idle_elimination.cost_saved + heat_recovery.cost_saved;

        let percentage = if baseline_energy_kwh > 0.0 {
            total_energy_kwh / baseline_energy_kwh * 100.0
        } else {
            0.0
        };

        let monitored_hours: f64 = with_elapsed_hours(readings, self.config.sample_interval_secs)
            .map(|(_, hours)| hours)
            .sum();
        let annualized_cost = if monitored_hours > 0.0 {
            total_cost * HOURS_PER_YEAR / monitored_hours
        } else {
            0.0
        };

        SavingsSummary {
            idle_elimination,
            heat_recovery,
            total_energy_kwh,
            total_co2_kg,
            total_cost,
            percentage,
            baseline_energy_kwh,
            annualized_cost,
        }
    }

    fn opportunity(&self, kind: OpportunityKind, hours: f64, energy_kwh: f64) -> SavingsOpportunity {
        SavingsOpportunity {
            kind,
            qualifying_hours: hours,
            energy_kwh,
            co2_kg: energy_kwh * self.config.emission_factor,
            cost_saved: energy_kwh * self.config.tariff_rate,
        }
    }
}

impl Default for SavingsEstimator {
    fn default() -> Self {
        Self::new(SavingsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    /// One reading per hour so durations are easy to reason about
    fn hourly(index: i64, current: f64, temperature: f64) -> Reading {
        let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::hours(index);
        Reading::new(current, temperature, 450.0, index as f64, ts, 230.0)
    }

    fn estimator() -> SavingsEstimator {
        SavingsEstimator::new(SavingsConfig {
            sample_interval_secs: 3600.0,
            ..SavingsConfig::default()
        })
    }

    #[test]
    fn test_empty_window_is_zero() {
        let summary = estimator().summarize(&[], 10.0);
        assert_eq!(summary.total_energy_kwh, 0.0);
        assert_eq!(summary.total_co2_kg, 0.0);
        assert_eq!(summary.total_cost, 0.0);
        assert_eq!(summary.percentage, 0.0);
        assert_eq!(summary.annualized_cost, 0.0);
    }

    #[test]
    fn test_idle_elimination_uses_observed_power() {
        // Two idle hours at 1A (230W), one loaded hour
        let readings = vec![hourly(0, 1.0, 30.0), hourly(1, 1.0, 30.0), hourly(2, 8.0, 30.0)];
        let idle = estimator().idle_elimination(&readings);

        assert!((idle.qualifying_hours - 2.0).abs() < EPS);
        assert!((idle.energy_kwh - 0.46).abs() < EPS);
        assert!((idle.co2_kg - 0.46 * 0.82).abs() < EPS);
        assert!((idle.cost_saved - 0.46 * 6.0).abs() < EPS);
    }

    #[test]
    fn test_idle_zero_power_uses_standby_draw() {
        let readings = vec![hourly(0, 0.0, 30.0)];
        let idle = estimator().idle_elimination(&readings);
        assert!((idle.energy_kwh - 0.115).abs() < EPS);
    }

    #[test]
    fn test_idle_threshold_is_exclusive() {
        let readings = vec![hourly(0, 2.0, 30.0)];
        let idle = estimator().idle_elimination(&readings);
        assert_eq!(idle.energy_kwh, 0.0);
    }

    #[test]
    fn test_heat_recovery() {
        let readings = vec![hourly(0, 8.0, 56.0), hourly(1, 8.0, 55.0), hourly(2, 8.0, 70.0)];
        let heat = estimator().heat_recovery(&readings);

        assert!((heat.qualifying_hours - 2.0).abs() < EPS);
        assert!((heat.energy_kwh - 0.6).abs() < EPS);
        assert!((heat.co2_kg - 0.6 * 0.82).abs() < EPS);
    }

    #[test]
    fn test_summary_totals_and_percentage() {
        let readings = vec![hourly(0, 1.0, 60.0), hourly(1, 8.0, 60.0)];
        let summary = estimator().summarize(&readings, 5.0);

        let expected_energy = 0.23 + 0.6;
        assert!((summary.total_energy_kwh - expected_energy).abs() < EPS);
        assert!(
            (summary.total_co2_kg
                - summary.idle_elimination.co2_kg
                - summary.heat_recovery.co2_kg)
                .abs()
                < EPS
        );
        assert!((summary.percentage - expected_energy / 5.0 * 100.0).abs() < EPS);
        assert!((summary.annualized_cost - summary.total_cost * HOURS_PER_YEAR / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_baseline_reports_zero_percentage() {
        let readings = vec![hourly(0, 1.0, 60.0)];
        let summary = estimator().summarize(&readings, 0.0);
        assert!(summary.total_energy_kwh > 0.0);
        assert_eq!(summary.percentage, 0.0);
    }

    proptest! {
        #[test]
        fn prop_idle_savings_monotonic(
            loaded in proptest::collection::vec(2.0f64..20.0, 0..20),
            idle in proptest::collection::vec(0.0f64..2.0, 1..20),
        ) {
            let estimator = estimator();
            let mut readings: Vec<Reading> = loaded
                .iter()
                .enumerate()
                .map(|(i, c)| hourly(i as i64, *c, 30.0))
                .collect();

            let mut previous = estimator.idle_elimination(&readings).energy_kwh;
            for current in idle {
                let next = readings.len() as i64;
                readings.push(hourly(next, current, 30.0));
                let energy = estimator.idle_elimination(&readings).energy_kwh;
                prop_assert!(energy >= previous);
                previous = energy;
            }
        }
    }
}
