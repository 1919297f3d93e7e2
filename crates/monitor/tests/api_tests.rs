//! Integration tests for the monitor API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, TimeZone, Utc};
use energy_monitor::api::{create_router, AppState};
use std::sync::Arc;
use telemetry_core::{
    health::{components, HealthRegistry},
    observability::MonitorMetrics,
    EngineConfig, Reading, TelemetryEngine,
};
use tower::ServiceExt;

fn reading(index: i64, current: f64, temperature: f64) -> Reading {
    let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(index * 2);
    Reading::new(current, temperature, 480.0, 20.0 + index as f64 * 0.001, ts, 230.0)
}

async fn setup_test_app() -> (Router, Arc<AppState>, TelemetryEngine) {
    let health_registry = HealthRegistry::new();
    health_registry.register(components::SOURCE).await;
    health_registry.register(components::ENGINE).await;

    let config = EngineConfig::default();
    let engine = TelemetryEngine::new(config.clone()).unwrap();

    let metrics = MonitorMetrics::new();
    let state = Arc::new(AppState::new(
        health_registry,
        metrics,
        engine.subscribe(),
        config,
    ));
    let router = create_router(state.clone());

    (router, state, engine)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let (status, body) = get(app, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_healthz_returns_ok_when_healthy() {
    let (app, _state, _engine) = setup_test_app().await;

    let (status, health) = get_json(app, "/healthz").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["components"]["source"]["status"], "healthy");
}

#[tokio::test]
async fn test_healthz_returns_ok_when_degraded() {
    let (app, state, _engine) = setup_test_app().await;

    state
        .health_registry
        .set_degraded(components::SOURCE, "Sensor timeout")
        .await;

    let (status, health) = get_json(app, "/healthz").await;

    // Degraded still returns 200 (last snapshot is served)
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["components"]["source"]["message"], "Sensor timeout");
}

#[tokio::test]
async fn test_healthz_returns_503_when_unhealthy() {
    let (app, state, _engine) = setup_test_app().await;

    state
        .health_registry
        .set_unhealthy(components::ENGINE, "Engine stopped")
        .await;

    let (status, health) = get_json(app, "/healthz").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(health["status"], "unhealthy");
}

#[tokio::test]
async fn test_readyz_returns_503_before_first_reading() {
    let (app, _state, _engine) = setup_test_app().await;

    let (status, readiness) = get_json(app, "/readyz").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(readiness["ready"], false);
    assert_eq!(readiness["reason"], "No readings received yet");
}

#[tokio::test]
async fn test_readyz_returns_ok_when_ready() {
    let (app, state, _engine) = setup_test_app().await;

    state.health_registry.set_ready(true).await;

    let (status, readiness) = get_json(app, "/readyz").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(readiness["ready"], true);
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, state, _engine) = setup_test_app().await;

    state.metrics.observe_ingest_latency(0.0002);
    state.metrics.inc_readings_ingested();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("energy_monitor_ingest_latency_seconds_bucket"));
    assert!(metrics_text.contains("energy_monitor_readings_ingested_total"));
    assert!(metrics_text.contains("energy_monitor_window_readings"));
}

#[tokio::test]
async fn test_snapshot_uninitialized() {
    let (app, _state, _engine) = setup_test_app().await;

    let (status, snapshot) = get_json(app, "/api/v1/snapshot").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["state"], "uninitialized");
    assert!(snapshot["latest"].is_null());
    assert_eq!(snapshot["window"].as_array().unwrap().len(), 0);
    assert_eq!(snapshot["savings"]["total_energy_kwh"], 0.0);
}

#[tokio::test]
async fn test_snapshot_reflects_ingested_readings() {
    let (app, _state, mut engine) = setup_test_app().await;

    engine
        .seed((0..5).map(|i| reading(i, 6.0, 40.0)))
        .unwrap();

    let (status, snapshot) = get_json(app, "/api/v1/snapshot").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["state"], "streaming");
    assert_eq!(snapshot["window"].as_array().unwrap().len(), 5);
    assert_eq!(snapshot["latest"]["current"], 6.0);
    assert_eq!(snapshot["classifications"]["current"], "nominal");
}

#[tokio::test]
async fn test_window_limit_returns_most_recent() {
    let (app, _state, mut engine) = setup_test_app().await;

    engine
        .seed((0..8).map(|i| reading(i, 1.0 + i as f64, 40.0)))
        .unwrap();

    let (status, window) = get_json(app, "/api/v1/window?limit=3").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(window["capacity"], 50);
    assert_eq!(window["len"], 8);

    let readings = window["readings"].as_array().unwrap();
    assert_eq!(readings.len(), 3);
    assert_eq!(readings[0]["current"], 6.0);
    assert_eq!(readings[2]["current"], 8.0);
    assert_eq!(readings[2]["state"], "normal");
    assert!(readings[2]["smoothed_power"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_window_marks_idle_readings() {
    let (app, _state, mut engine) = setup_test_app().await;

    engine.ingest(reading(0, 1.0, 30.0)).unwrap();

    let (_, window) = get_json(app, "/api/v1/window").await;

    assert_eq!(window["readings"][0]["state"], "idle");
}

#[tokio::test]
async fn test_savings_endpoint() {
    let (app, _state, mut engine) = setup_test_app().await;

    engine
        .seed((0..10).map(|i| reading(i, 1.0, 58.0)))
        .unwrap();

    let (status, savings) = get_json(app, "/api/v1/savings").await;

    assert_eq!(status, StatusCode::OK);
    assert!(savings["idle_elimination"]["energy_kwh"].as_f64().unwrap() > 0.0);
    assert!(savings["heat_recovery"]["energy_kwh"].as_f64().unwrap() > 0.0);
    assert_eq!(savings["heat_recovery"]["kind"], "heat_recovery");
}

#[tokio::test]
async fn test_recommendations_for_idle_hot_reading() {
    let (app, _state, mut engine) = setup_test_app().await;

    engine.ingest(reading(0, 1.0, 65.0)).unwrap();

    let (status, body) = get_json(app, "/api/v1/recommendations").await;

    assert_eq!(status, StatusCode::OK);
    let kinds: Vec<&str> = body["recommendations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["idle_detected", "heat_recovery_available"]);
    assert_eq!(body["recommendations"][0]["alert"], true);
}

#[tokio::test]
async fn test_recommendations_empty_before_data() {
    let (app, _state, _engine) = setup_test_app().await;

    let (_, body) = get_json(app, "/api/v1/recommendations").await;

    assert!(body["recommendations"].as_array().unwrap().is_empty());
    assert!(body["latest"].is_null());
}

#[tokio::test]
async fn test_report_is_plain_text() {
    let (app, _state, mut engine) = setup_test_app().await;

    engine
        .seed((0..4).map(|i| reading(i, 8.0, 45.0)))
        .unwrap();

    let (status, body) = get(app, "/api/v1/report").await;
    let text = String::from_utf8(body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert!(text.contains("SYSTEM OVERVIEW:"));
    assert!(text.contains("- Monitoring Period: 4 samples"));
    assert!(text.contains("TOTAL IMPACT:"));
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let (app, _state, _engine) = setup_test_app().await;

    let (status, _) = get(app, "/api/v1/unknown").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
