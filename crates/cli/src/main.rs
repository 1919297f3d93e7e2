//! Energy & Emissions Monitor CLI
//!
//! Queries a running monitor for live snapshots and savings estimates, and
//! analyzes recorded readings offline.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{analyze, savings, snapshot};
use std::path::PathBuf;

/// Energy & Emissions Monitor CLI
#[derive(Parser)]
#[command(name = "emon")]
#[command(author, version, about = "CLI for the Energy & Emissions Monitor", long_about = None)]
pub struct Cli {
    /// Monitor API URL (can also be set via EMON_API_URL env var)
    #[arg(long, env = "EMON_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the latest reading, its classification and the savings headline
    Snapshot,

    /// Show the rolling window of readings
    Window {
        /// Only show the most recent readings
        #[arg(long, short)]
        limit: Option<usize>,
    },

    /// Show the savings estimate for the current window
    Savings,

    /// Show live recommendations for the latest reading
    Recommendations,

    /// Print the monitor's plain-text analysis report
    Report,

    /// Analyze recorded readings offline
    Analyze {
        /// Path to the recorded readings (.json array or .csv)
        #[arg(long, short)]
        input: PathBuf,

        /// Engine configuration file (JSON)
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = config::Config::load()?;

    let format = cli
        .format
        .or_else(|| {
            settings
                .default_format
                .as_deref()
                .and_then(output::OutputFormat::from_name)
        })
        .unwrap_or_default();
    let currency = settings.currency_symbol();

    let api_url = cli.api_url.as_deref().unwrap_or_else(|| settings.api_url());
    let connect = || client::ApiClient::new(api_url);

    match cli.command {
        Commands::Snapshot => snapshot::show_snapshot(&connect()?, currency, format).await?,
        Commands::Window { limit } => snapshot::show_window(&connect()?, limit, format).await?,
        Commands::Savings => savings::show_savings(&connect()?, currency, format).await?,
        Commands::Recommendations => snapshot::show_recommendations(&connect()?, format).await?,
        Commands::Report => savings::show_report(&connect()?).await?,
        Commands::Analyze { input, config } => {
            analyze::run_analysis(&input, config.as_deref(), currency, format)?
        }
    }

    Ok(())
}
