//! Live telemetry commands: snapshot, window and recommendations

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;
use telemetry_core::TelemetrySnapshot;

use crate::client::{ApiClient, RecommendationsResponse, WindowResponse};
use crate::output::{
    color_state, color_status, color_tier, format_currency, format_energy, format_power,
    format_timestamp, print_info, print_json, print_warning, OutputFormat,
};

/// Row for the window table
#[derive(Tabled)]
struct WindowRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Power")]
    power: String,
    #[tabled(rename = "Smoothed")]
    smoothed: String,
    #[tabled(rename = "Temp")]
    temperature: String,
    #[tabled(rename = "CO2")]
    co2: String,
    #[tabled(rename = "State")]
    state: String,
}

/// Show the latest reading, its tiers and the savings headline
pub async fn show_snapshot(client: &ApiClient, currency: &str, format: OutputFormat) -> Result<()> {
    let snapshot: TelemetrySnapshot = client.get("api/v1/snapshot").await?;

    if format == OutputFormat::Json {
        return print_json(&snapshot);
    }

    println!("{}", "Telemetry Snapshot".bold());
    println!("{}", "=".repeat(50));
    println!("State:                  {}", color_status(&snapshot.state.to_string()));
    println!(
        "Window:                 {} readings ({} accepted this session)",
        snapshot.window.len(),
        snapshot.accepted
    );
    if let Some(started) = &snapshot.session_started_at {
        println!("Session started:        {}", format_timestamp(started).dimmed());
    }

    let (Some(latest), Some(tiers)) = (&snapshot.latest, &snapshot.classifications) else {
        println!();
        print_info("No readings received yet");
        return Ok(());
    };

    println!();
    println!("{}", "Latest Reading".bold());
    println!("{}", "-".repeat(50));
    println!("Time:                   {}", format_timestamp(&latest.timestamp));
    println!(
        "Current:                {:.2} A ({})",
        latest.current,
        color_tier(tiers.current)
    );
    println!("Power:                  {}", format_power(latest.power));
    println!(
        "Temperature:            {:.1}°C ({})",
        latest.temperature,
        color_tier(tiers.temperature)
    );
    println!(
        "CO2:                    {:.0} ppm ({})",
        latest.co2,
        color_tier(tiers.co2)
    );
    println!(
        "Energy counter:         {}",
        format_energy(latest.energy_cumulative)
    );

    println!();
    println!(
        "{} {} ({:.1}% of {})",
        "Potential Savings:".bold(),
        format_currency(snapshot.savings.total_cost, currency).green().bold(),
        snapshot.savings.percentage,
        format_energy(snapshot.savings.baseline_energy_kwh)
    );

    for recommendation in snapshot.recommendations() {
        if recommendation.is_alert() {
            print_warning(recommendation.message());
        } else {
            print_info(recommendation.message());
        }
    }

    Ok(())
}

/// Show the rolling window with smoothed power and operating state
pub async fn show_window(
    client: &ApiClient,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let path = match limit {
        Some(limit) => format!("api/v1/window?limit={}", limit),
        None => "api/v1/window".to_string(),
    };
    let window: WindowResponse = client.get(&path).await?;

    if format == OutputFormat::Json {
        return print_json(&window);
    }

    println!(
        "{} ({}/{} readings)",
        "Rolling Window".bold(),
        window.len,
        window.capacity
    );

    if window.readings.is_empty() {
        println!("{}", "No readings found".yellow());
        return Ok(());
    }

    let rows: Vec<WindowRow> = window
        .readings
        .iter()
        .map(|point| WindowRow {
            time: point.reading.timestamp.format("%H:%M:%S").to_string(),
            current: format!("{:.2} A", point.reading.current),
            power: format_power(point.reading.power),
            smoothed: format_power(point.smoothed_power),
            temperature: format!("{:.1}°C", point.reading.temperature),
            co2: format!("{:.0} ppm", point.reading.co2),
            state: color_state(point.state),
        })
        .collect();

    let table = tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string();
    println!("{}", table);

    Ok(())
}

/// Show the live recommendations for the latest reading
pub async fn show_recommendations(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result: RecommendationsResponse = client.get("api/v1/recommendations").await?;

    if format == OutputFormat::Json {
        return print_json(&result);
    }

    println!("{}", "Recommendations".bold());
    println!("{}", "=".repeat(50));

    if result.recommendations.is_empty() {
        print_info("No readings received yet");
        return Ok(());
    }

    if let Some(latest) = &result.latest {
        println!(
            "Latest: {:.2} A, {:.1}°C, {:.0} ppm at {}",
            latest.current,
            latest.temperature,
            latest.co2,
            format_timestamp(&latest.timestamp).dimmed()
        );
        println!();
    }

    for entry in &result.recommendations {
        if entry.alert {
            print_warning(&entry.message);
        } else {
            print_info(&entry.message);
        }
    }

    Ok(())
}
