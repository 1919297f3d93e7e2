//! HTTP API for health checks, Prometheus metrics and telemetry snapshots

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use telemetry_core::{
    analysis::{operational_state, smoothed_power, DEFAULT_SMOOTHING_WINDOW},
    health::{ComponentStatus, HealthRegistry},
    observability::MonitorMetrics,
    report, Classifications, EngineConfig, OperationalState, Reading, Recommendation,
    SnapshotReader,
};
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub metrics: MonitorMetrics,
    pub reader: SnapshotReader,
    pub engine_config: EngineConfig,
}

impl AppState {
    pub fn new(
        health_registry: HealthRegistry,
        metrics: MonitorMetrics,
        reader: SnapshotReader,
        engine_config: EngineConfig,
    ) -> Self {
        Self {
            health_registry,
            metrics,
            reader,
            engine_config,
        }
    }
}

/// Query parameters for the window endpoint
#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    /// Only return the most recent readings
    pub limit: Option<usize>,
}

/// One reading of the window with its derived chart data
#[derive(Debug, Serialize, Deserialize)]
pub struct WindowPoint {
    #[serde(flatten)]
    pub reading: Reading,
    pub smoothed_power: f64,
    pub state: OperationalState,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WindowResponse {
    pub capacity: usize,
    pub len: usize,
    pub readings: Vec<WindowPoint>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationEntry {
    pub kind: Recommendation,
    pub message: String,
    pub alert: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub latest: Option<Reading>,
    pub classifications: Option<Classifications>,
    pub recommendations: Vec<RecommendationEntry>,
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still serving the last snapshot
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Full snapshot as last published by the engine
async fn snapshot(State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.reader.current();
    Json(&*snapshot).into_response()
}

async fn window(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WindowQuery>,
) -> Json<WindowResponse> {
    let snapshot = state.reader.current();
    let smoothed = smoothed_power(&snapshot.window, DEFAULT_SMOOTHING_WINDOW);

    let points: Vec<WindowPoint> = snapshot
        .window
        .iter()
        .zip(smoothed)
        .map(|(reading, smoothed_power)| WindowPoint {
            reading: *reading,
            smoothed_power,
            state: operational_state(reading, &state.engine_config),
        })
        .collect();

    let skip = query
        .limit
        .map(|limit| points.len().saturating_sub(limit))
        .unwrap_or(0);

    Json(WindowResponse {
        capacity: state.engine_config.window_capacity,
        len: snapshot.window.len(),
        readings: points.into_iter().skip(skip).collect(),
    })
}

async fn savings(State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.reader.current();
    Json(&snapshot.savings).into_response()
}

async fn recommendations(State(state): State<Arc<AppState>>) -> Json<RecommendationsResponse> {
    let snapshot = state.reader.current();

    let recommendations = snapshot
        .recommendations()
        .into_iter()
        .map(|kind| RecommendationEntry {
            kind,
            message: kind.message().to_string(),
            alert: kind.is_alert(),
        })
        .collect();

    Json(RecommendationsResponse {
        latest: snapshot.latest,
        classifications: snapshot.classifications,
        recommendations,
    })
}

/// Plain-text analysis report
async fn report_text(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.reader.current();
    let body = report::render(&snapshot, &state.engine_config);

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        body,
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/snapshot", get(snapshot))
        .route("/api/v1/window", get(window))
        .route("/api/v1/savings", get(savings))
        .route("/api/v1/recommendations", get(recommendations))
        .route("/api/v1/report", get(report_text))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
