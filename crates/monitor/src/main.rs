//! Energy Monitor - live energy and emissions telemetry daemon
//!
//! Streams readings from the load sensor into the telemetry engine and
//! serves snapshots, savings estimates and health over HTTP.

use anyhow::{Context, Result};
use energy_monitor::{api, config::MonitorConfig};
use std::sync::Arc;
use telemetry_core::{
    health::{components, HealthRegistry},
    observability::{MonitorMetrics, StructuredLogger},
    source::{IngestLoop, SimulatedSource},
    TelemetryEngine,
};
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const MONITOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting energy-monitor");

    let config = MonitorConfig::load()?;
    info!(
        instance = %config.instance_name,
        interval_ms = config.ingest_interval_ms,
        policy = ?config.out_of_order_policy,
        "Monitor configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::SOURCE).await;
    health_registry.register(components::ENGINE).await;

    let metrics = MonitorMetrics::new();

    let logger = StructuredLogger::new(&config.instance_name);
    logger.log_startup(
        MONITOR_VERSION,
        config.engine.window_capacity,
        config.engine.voltage,
    );

    let engine =
        TelemetryEngine::new(config.engine.clone()).context("Failed to create telemetry engine")?;

    let mut source = SimulatedSource::new(config.simulator_config());
    let warmup = source.warmup(config.warmup_readings);

    let mut ingest = IngestLoop::new(
        Box::new(source),
        engine,
        config.ingest_config(),
        metrics.clone(),
        logger.clone(),
        health_registry.clone(),
    );
    ingest
        .seed(warmup)
        .await
        .context("Failed to seed engine with warm-up readings")?;

    let app_state = Arc::new(api::AppState::new(
        health_registry.clone(),
        metrics.clone(),
        ingest.reader(),
        config.engine.clone(),
    ));

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let ingest_handle = tokio::spawn(ingest.run(shutdown_tx.subscribe()));

    let api_port = config.api_port;
    let api_handle = tokio::spawn(async move {
        if let Err(e) = api::serve(api_port, app_state).await {
            error!(error = %e, "API server failed");
        }
    });

    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");

    let _ = shutdown_tx.send(());
    if let Err(e) = ingest_handle.await {
        error!(error = %e, "Ingest loop terminated abnormally");
    }
    api_handle.abort();

    info!("Shutdown complete");
    Ok(())
}
