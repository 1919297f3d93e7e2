//! Core data models for the telemetry engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One sample from the load sensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Line current in amperes
    pub current: f64,
    /// Temperature in degrees Celsius
    pub temperature: f64,
    /// CO2 concentration in ppm
    pub co2: f64,
    /// Power in watts, always `current * voltage`
    pub power: f64,
    /// Running energy counter for the session in kWh
    pub energy_cumulative: f64,
    pub timestamp: DateTime<Utc>,
}

impl Reading {
    /// Build a reading, deriving power from the line voltage
    pub fn new(
        current: f64,
        temperature: f64,
        co2: f64,
        energy_cumulative: f64,
        timestamp: DateTime<Utc>,
        voltage: f64,
    ) -> Self {
        Self {
            current,
            temperature,
            co2,
            power: current * voltage,
            energy_cumulative,
            timestamp,
        }
    }
}

/// Status tier of a metric against its band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Low,
    Nominal,
    High,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Low => write!(f, "low"),
            Tier::Nominal => write!(f, "nominal"),
            Tier::High => write!(f, "high"),
        }
    }
}

/// Inclusive `[low, high]` band for a metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBand {
    pub low: f64,
    pub high: f64,
}

impl ThresholdBand {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }
}

/// Tiers of the latest reading for each classified metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classifications {
    pub current: Tier,
    pub temperature: Tier,
    pub co2: Tier,
}

/// Optimization scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityKind {
    IdleElimination,
    HeatRecovery,
}

impl OpportunityKind {
    /// Stable snake_case identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            OpportunityKind::IdleElimination => "idle_elimination",
            OpportunityKind::HeatRecovery => "heat_recovery",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            OpportunityKind::IdleElimination => "Switch off equipment during idle periods",
            OpportunityKind::HeatRecovery => {
                "Recover waste heat during high-temperature operation"
            }
        }
    }
}

impl std::fmt::Display for OpportunityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpportunityKind::IdleElimination => write!(f, "Idle Elimination"),
            OpportunityKind::HeatRecovery => write!(f, "Heat Recovery"),
        }
    }
}

/// Estimated reduction for one scenario
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavingsOpportunity {
    pub kind: OpportunityKind,
    /// Hours of the window that qualified for the scenario
    pub qualifying_hours: f64,
    pub energy_kwh: f64,
    pub co2_kg: f64,
    pub cost_saved: f64,
}

impl SavingsOpportunity {
    pub fn zero(kind: OpportunityKind) -> Self {
        Self {
            kind,
            qualifying_hours: 0.0,
            energy_kwh: 0.0,
            co2_kg: 0.0,
            cost_saved: 0.0,
        }
    }
}

/// Aggregate of all savings opportunities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsSummary {
    pub idle_elimination: SavingsOpportunity,
    pub heat_recovery: SavingsOpportunity,
    pub total_energy_kwh: f64,
    pub total_co2_kg: f64,
    pub total_cost: f64,
    /// Share of the baseline consumption that could be saved, in percent
    pub percentage: f64,
    /// Energy consumed during the session in kWh
    pub baseline_energy_kwh: f64,
    /// Total cost scaled from the monitored duration to one year
    pub annualized_cost: f64,
}

impl SavingsSummary {
    pub fn opportunities(&self) -> [&SavingsOpportunity; 2] {
        [&self.idle_elimination, &self.heat_recovery]
    }
}

impl Default for SavingsSummary {
    fn default() -> Self {
        Self {
            idle_elimination: SavingsOpportunity::zero(OpportunityKind::IdleElimination),
            heat_recovery: SavingsOpportunity::zero(OpportunityKind::HeatRecovery),
            total_energy_kwh: 0.0,
            total_co2_kg: 0.0,
            total_cost: 0.0,
            percentage: 0.0,
            baseline_energy_kwh: 0.0,
            annualized_cost: 0.0,
        }
    }
}

/// Live recommendation derived from the latest classifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    IdleDetected,
    HeatRecoveryAvailable,
    OptimalOperation,
}

impl Recommendation {
    pub fn message(&self) -> &'static str {
        match self {
            Recommendation::IdleDetected => {
                "Idle period detected - consider switching off non-essential loads"
            }
            Recommendation::HeatRecoveryAvailable => {
                "High temperature detected - heat recovery opportunity available"
            }
            Recommendation::OptimalOperation => "Operating within optimal parameters",
        }
    }

    pub fn is_alert(&self) -> bool {
        !matches!(self, Recommendation::OptimalOperation)
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recommendation::IdleDetected => write!(f, "idle_detected"),
            Recommendation::HeatRecoveryAvailable => write!(f, "heat_recovery_available"),
            Recommendation::OptimalOperation => write!(f, "optimal_operation"),
        }
    }
}

/// Operating state of a single reading, by load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationalState {
    Idle,
    Normal,
    HighLoad,
}
