//! Plain-text analysis report
//!
//! Renders a snapshot as the operator report: system overview, operational
//! analysis, savings opportunities, total impact and the assumptions the
//! estimates rest on.

use std::fmt::Write;

use crate::config::EngineConfig;
use crate::engine::TelemetrySnapshot;

const RULE: &str = "==================================================";

/// Render the report for a snapshot
pub fn render(snapshot: &TelemetrySnapshot, config: &EngineConfig) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = write_report(&mut out, snapshot, config);
    out
}

fn write_report(
    out: &mut String,
    snapshot: &TelemetrySnapshot,
    config: &EngineConfig,
) -> std::fmt::Result {
    let analysis = &snapshot.analysis;
    let savings = &snapshot.savings;

    writeln!(out, "ENERGY & EMISSIONS MONITOR - ANALYSIS REPORT")?;
    writeln!(out, "{}", RULE)?;
    writeln!(out)?;

    writeln!(out, "SYSTEM OVERVIEW:")?;
    writeln!(
        out,
        "- Monitoring Period: {} samples over {:.2} hours",
        analysis.samples, analysis.monitored_hours
    )?;
    writeln!(
        out,
        "- Session Energy Consumed: {:.3} kWh",
        savings.baseline_energy_kwh
    )?;
    writeln!(out, "- Average Power: {:.1} W", analysis.avg_power_w)?;
    writeln!(out, "- Peak Power: {:.1} W", analysis.max_power_w)?;
    writeln!(
        out,
        "- Average Temperature: {:.1}°C (max {:.1}°C)",
        analysis.avg_temperature_c, analysis.max_temperature_c
    )?;
    writeln!(out, "- Average CO2: {:.0} ppm", analysis.avg_co2_ppm)?;
    writeln!(out)?;

    writeln!(out, "OPERATIONAL ANALYSIS:")?;
    writeln!(
        out,
        "- Idle Time: {:.3} hours ({:.1}% of monitored time)",
        analysis.idle_hours, analysis.idle_share_percent
    )?;
    writeln!(out, "- Idle Threshold: <{:.1} A", config.idle_threshold)?;
    writeln!(
        out,
        "- High Load Threshold: >{:.1} A",
        config.bands.current.high
    )?;
    if let (Some(latest), Some(c)) = (&snapshot.latest, &snapshot.classifications) {
        writeln!(
            out,
            "- Latest: {:.1} A ({}), {:.1}°C ({}), {:.0} ppm ({})",
            latest.current, c.current, latest.temperature, c.temperature, latest.co2, c.co2
        )?;
    }
    writeln!(out)?;

    writeln!(out, "SAVINGS OPPORTUNITIES:")?;
    for opportunity in savings.opportunities() {
        writeln!(out)?;
        writeln!(out, "{}:", opportunity.kind.to_string().to_uppercase())?;
        writeln!(
            out,
            "- {} ({:.3} qualifying hours)",
            opportunity.kind.description(),
            opportunity.qualifying_hours
        )?;
        writeln!(out, "- Energy Savings: {:.3} kWh", opportunity.energy_kwh)?;
        writeln!(out, "- Cost Savings: {:.2}", opportunity.cost_saved)?;
        writeln!(out, "- CO2 Reduction: {:.3} kg", opportunity.co2_kg)?;
    }
    writeln!(out)?;

    writeln!(out, "TOTAL IMPACT:")?;
    writeln!(
        out,
        "- Total Energy Savings: {:.3} kWh ({:.1}%)",
        savings.total_energy_kwh, savings.percentage
    )?;
    writeln!(out, "- Total Cost Savings: {:.2}", savings.total_cost)?;
    writeln!(out, "- Total CO2 Reduction: {:.3} kg", savings.total_co2_kg)?;
    writeln!(
        out,
        "- Scaled Annually: {:.0} cost savings",
        savings.annualized_cost
    )?;
    writeln!(out)?;

    writeln!(out, "ASSUMPTIONS:")?;
    writeln!(out, "- Nominal voltage: {:.0}V AC", config.voltage)?;
    writeln!(out, "- Electricity rate: {:.2} per kWh", config.tariff_rate)?;
    writeln!(
        out,
        "- Heat recovery: {:.2} kWh per hour above {:.1}°C",
        config.recovery_rate, config.heat_recovery_threshold
    )?;
    writeln!(
        out,
        "- Grid emission factor: {} kgCO2/kWh",
        config.emission_factor
    )?;

    let recommendations = snapshot.recommendations();
    if !recommendations.is_empty() {
        writeln!(out)?;
        writeln!(out, "LIVE RECOMMENDATIONS:")?;
        for recommendation in recommendations {
            writeln!(out, "- {}", recommendation.message())?;
        }
    }

    Ok(())
}
