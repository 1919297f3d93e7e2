//! Observability infrastructure for the energy monitor
//!
//! Provides:
//! - Prometheus metrics (ingest latency, accepted/rejected readings, window
//!   size, latest power, savings totals)
//! - Structured JSON logging with tracing

use prometheus::{
    register_gauge, register_gauge_vec, register_histogram, register_int_counter,
    register_int_counter_vec, register_int_gauge, Gauge, GaugeVec, Histogram, IntCounter,
    IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::engine::TelemetrySnapshot;
use crate::error::TelemetryError;
use crate::models::{Reading, Recommendation, SavingsSummary};

/// Histogram buckets for ingest latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.05,
];

static GLOBAL_METRICS: OnceLock<MonitorMetricsInner> = OnceLock::new();

struct MonitorMetricsInner {
    ingest_latency_seconds: Histogram,
    readings_ingested: IntCounter,
    readings_rejected: IntCounterVec,
    source_errors: IntCounter,
    session_resets: IntCounter,
    window_readings: IntGauge,
    latest_power_watts: Gauge,
    savings_energy_kwh: GaugeVec,
    savings_percentage: Gauge,
}

impl MonitorMetricsInner {
    fn new() -> Self {
        Self {
            ingest_latency_seconds: register_histogram!(
                "energy_monitor_ingest_latency_seconds",
                "Time spent validating a reading and rebuilding the snapshot",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register ingest_latency_seconds"),

            readings_ingested: register_int_counter!(
                "energy_monitor_readings_ingested_total",
                "Total number of readings accepted by the engine"
            )
            .expect("Failed to register readings_ingested"),

            readings_rejected: register_int_counter_vec!(
                "energy_monitor_readings_rejected_total",
                "Total number of readings refused by the engine",
                &["reason"]
            )
            .expect("Failed to register readings_rejected"),

            source_errors: register_int_counter!(
                "energy_monitor_source_errors_total",
                "Total number of failures reading from the source"
            )
            .expect("Failed to register source_errors"),

            session_resets: register_int_counter!(
                "energy_monitor_session_resets_total",
                "Total number of sessions restarted after out-of-order readings"
            )
            .expect("Failed to register session_resets"),

            window_readings: register_int_gauge!(
                "energy_monitor_window_readings",
                "Number of readings in the rolling window"
            )
            .expect("Failed to register window_readings"),

            latest_power_watts: register_gauge!(
                "energy_monitor_latest_power_watts",
                "Power of the most recent reading"
            )
            .expect("Failed to register latest_power_watts"),

            savings_energy_kwh: register_gauge_vec!(
                "energy_monitor_savings_energy_kwh",
                "Estimated energy savings per opportunity over the window",
                &["opportunity"]
            )
            .expect("Failed to register savings_energy_kwh"),

            savings_percentage: register_gauge!(
                "energy_monitor_savings_percentage",
                "Estimated savings as a percentage of session consumption"
            )
            .expect("Failed to register savings_percentage"),
        }
    }
}

/// Handle to the process-wide Prometheus metrics
///
/// Clones share the same underlying collectors.
#[derive(Clone)]
pub struct MonitorMetrics {
    _private: (),
}

impl Default for MonitorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorMetrics {
    /// Create a handle, registering the collectors on first use
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(MonitorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &MonitorMetricsInner {
        GLOBAL_METRICS.get_or_init(MonitorMetricsInner::new)
    }

    pub fn observe_ingest_latency(&self, duration_secs: f64) {
        self.inner().ingest_latency_seconds.observe(duration_secs);
    }

    pub fn inc_readings_ingested(&self) {
        self.inner().readings_ingested.inc();
    }

    pub fn inc_readings_rejected(&self, reason: &str) {
        self.inner()
            .readings_rejected
            .with_label_values(&[reason])
            .inc();
    }

    pub fn inc_source_errors(&self) {
        self.inner().source_errors.inc();
    }

    pub fn inc_session_resets(&self) {
        self.inner().session_resets.inc();
    }

    /// Update gauges from a freshly published snapshot
    pub fn record_snapshot(&self, snapshot: &TelemetrySnapshot) {
        let inner = self.inner();
        inner.window_readings.set(snapshot.window.len() as i64);
        if let Some(latest) = &snapshot.latest {
            inner.latest_power_watts.set(latest.power);
        }
        for opportunity in snapshot.savings.opportunities() {
            inner
                .savings_energy_kwh
                .with_label_values(&[opportunity.kind.as_str()])
                .set(opportunity.energy_kwh);
        }
        inner.savings_percentage.set(snapshot.savings.percentage);
    }
}

/// Structured logger for monitor events
///
/// Emits event-tagged records for rejected readings, session resets,
/// recommendation changes and lifecycle events.
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_startup(&self, version: &str, window_capacity: usize, voltage: f64) {
        info!(
            event = "monitor_started",
            instance = %self.instance,
            version = %version,
            window_capacity = window_capacity,
            voltage = voltage,
            "Energy monitor started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "monitor_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Energy monitor shutting down"
        );
    }

    pub fn log_reading_rejected(&self, error: &TelemetryError, reading: &Reading) {
        warn!(
            event = "reading_rejected",
            instance = %self.instance,
            reason = error.kind(),
            details = %error,
            timestamp = %reading.timestamp,
            current = reading.current,
            energy_cumulative = reading.energy_cumulative,
            "Reading rejected"
        );
    }

    pub fn log_session_reset(&self, reason: &str) {
        warn!(
            event = "session_reset",
            instance = %self.instance,
            reason = %reason,
            "Starting a new telemetry session"
        );
    }

    pub fn log_source_error(&self, source: &str, error: &str) {
        warn!(
            event = "source_error",
            instance = %self.instance,
            source = %source,
            error = %error,
            "Reading source failed"
        );
    }

    /// Log the recommendation set after it changed
    pub fn log_recommendations(&self, recommendations: &[Recommendation], reading: &Reading) {
        let names: Vec<String> = recommendations.iter().map(|r| r.to_string()).collect();
        let alert = recommendations.iter().any(|r| r.is_alert());

        if alert {
            warn!(
                event = "recommendations_changed",
                instance = %self.instance,
                recommendations = ?names,
                current = reading.current,
                temperature = reading.temperature,
                "Operational alert"
            );
        } else {
            info!(
                event = "recommendations_changed",
                instance = %self.instance,
                recommendations = ?names,
                current = reading.current,
                temperature = reading.temperature,
                "Operating status changed"
            );
        }
    }

    pub fn log_savings(&self, savings: &SavingsSummary) {
        info!(
            event = "savings_estimate",
            instance = %self.instance,
            idle_energy_kwh = savings.idle_elimination.energy_kwh,
            heat_recovery_kwh = savings.heat_recovery.energy_kwh,
            total_energy_kwh = savings.total_energy_kwh,
            total_co2_kg = savings.total_co2_kg,
            total_cost = savings.total_cost,
            percentage = savings.percentage,
            "Savings estimate updated"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::TelemetryEngine;

    #[test]
    fn test_monitor_metrics_record() {
        let metrics = MonitorMetrics::new();
        metrics.observe_ingest_latency(0.0001);
        metrics.inc_readings_ingested();
        metrics.inc_readings_rejected("invalid_reading");
        metrics.inc_source_errors();
        metrics.inc_session_resets();

        let mut engine = TelemetryEngine::new(EngineConfig::default()).unwrap();
        engine
            .ingest(Reading::new(1.0, 30.0, 450.0, 0.0, chrono::Utc::now(), 230.0))
            .unwrap();
        metrics.record_snapshot(&engine.current_snapshot());

        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "energy_monitor_window_readings"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("line-3");
        assert_eq!(logger.instance, "line-3");
        logger.log_savings(&SavingsSummary::default());
    }
}
