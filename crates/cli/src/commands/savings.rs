//! Savings and report commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;
use telemetry_core::SavingsSummary;

use crate::client::ApiClient;
use crate::output::{format_currency, format_energy, print_json, OutputFormat};

/// Row for the opportunities table
#[derive(Tabled)]
struct OpportunityRow {
    #[tabled(rename = "Opportunity")]
    name: String,
    #[tabled(rename = "Hours")]
    hours: String,
    #[tabled(rename = "Energy")]
    energy: String,
    #[tabled(rename = "CO2")]
    co2: String,
    #[tabled(rename = "Cost Saved")]
    cost: String,
}

/// Print a savings summary as a table
pub fn print_savings(summary: &SavingsSummary, currency: &str) {
    println!("{}", "Savings Estimate".bold());
    println!("{}", "=".repeat(50));
    println!(
        "Session consumption:    {}",
        format_energy(summary.baseline_energy_kwh)
    );
    println!();

    let rows: Vec<OpportunityRow> = summary
        .opportunities()
        .iter()
        .map(|o| OpportunityRow {
            name: o.kind.to_string(),
            hours: format!("{:.3}", o.qualifying_hours),
            energy: format_energy(o.energy_kwh),
            co2: format!("{:.3} kg", o.co2_kg),
            cost: format_currency(o.cost_saved, currency),
        })
        .collect();

    let table = tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string();
    println!("{}", table);
    println!();

    println!(
        "{} {} ({:.1}%)",
        "Total Savings:".bold(),
        format_energy(summary.total_energy_kwh).green().bold(),
        summary.percentage
    );
    println!(
        "Cost:                   {}",
        format_currency(summary.total_cost, currency)
    );
    println!("CO2 avoided:            {:.3} kg", summary.total_co2_kg);
    println!(
        "Scaled annually:        {}",
        format_currency(summary.annualized_cost, currency).green()
    );
}

/// Show the savings estimate for the current window
pub async fn show_savings(client: &ApiClient, currency: &str, format: OutputFormat) -> Result<()> {
    let summary: SavingsSummary = client.get("api/v1/savings").await?;

    match format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Table => print_savings(&summary, currency),
    }

    Ok(())
}

/// Print the daemon's plain-text analysis report
pub async fn show_report(client: &ApiClient) -> Result<()> {
    let report = client.get_text("api/v1/report").await?;
    print!("{}", report);
    Ok(())
}
