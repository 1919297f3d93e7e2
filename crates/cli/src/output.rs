//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use telemetry_core::{OperationalState, Tier};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Parse a format name from the config file, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true).ok()
    }
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format watts as W or kW
pub fn format_power(watts: f64) -> String {
    if watts.abs() >= 1000.0 {
        format!("{:.2} kW", watts / 1000.0)
    } else {
        format!("{:.0} W", watts)
    }
}

pub fn format_energy(kwh: f64) -> String {
    format!("{:.3} kWh", kwh)
}

/// Format currency
pub fn format_currency(amount: f64, symbol: &str) -> String {
    format!("{}{:.2}", symbol, amount)
}

pub fn format_timestamp(ts: &chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Color a tier: nominal green, low yellow, high red
pub fn color_tier(tier: Tier) -> String {
    let label = tier.to_string();
    match tier {
        Tier::Nominal => label.green().to_string(),
        Tier::Low => label.yellow().to_string(),
        Tier::High => label.red().to_string(),
    }
}

pub fn color_state(state: OperationalState) -> String {
    match state {
        OperationalState::Idle => "idle".yellow().to_string(),
        OperationalState::Normal => "normal".green().to_string(),
        OperationalState::HighLoad => "high_load".red().to_string(),
    }
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "streaming" | "healthy" => status.green().to_string(),
        "uninitialized" | "degraded" => status.yellow().to_string(),
        "unhealthy" => status.red().to_string(),
        _ => status.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_power() {
        assert_eq!(format_power(850.0), "850 W");
        assert_eq!(format_power(1955.0), "1.96 kW");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(12.345, "₹"), "₹12.35");
        assert_eq!(format_currency(0.0, "$"), "$0.00");
    }

    #[test]
    fn test_format_from_name() {
        assert_eq!(OutputFormat::from_name("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_name("table"), Some(OutputFormat::Table));
        assert_eq!(OutputFormat::from_name("yaml"), None);
    }
}
