//! API client for communicating with the monitor daemon

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use telemetry_core::{Classifications, OperationalState, Reading, Recommendation};
use url::Url;

/// API client for the monitor daemon
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request and decode the JSON body
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(path).await?;
        response.json().await.context("Failed to parse response")
    }

    /// Make a GET request and return the body as text
    pub async fn get_text(&self, path: &str) -> Result<String> {
        let response = self.send(path).await?;
        response.text().await.context("Failed to read response")
    }

    async fn send(&self, path: &str) -> Result<Response> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        Ok(response)
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowPoint {
    #[serde(flatten)]
    pub reading: Reading,
    pub smoothed_power: f64,
    pub state: OperationalState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowResponse {
    pub capacity: usize,
    pub len: usize,
    pub readings: Vec<WindowPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationEntry {
    pub kind: Recommendation,
    pub message: String,
    pub alert: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub latest: Option<Reading>,
    pub classifications: Option<Classifications>,
    pub recommendations: Vec<RecommendationEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use telemetry_core::SavingsSummary;

    #[tokio::test]
    async fn test_get_decodes_json() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::to_string(&SavingsSummary::default()).unwrap();
        let mock = server
            .mock("GET", "/api/v1/savings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let savings: SavingsSummary = client.get("api/v1/savings").await.unwrap();

        assert_eq!(savings.total_energy_kwh, 0.0);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/report")
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client.get_text("api/v1/report").await.unwrap_err();

        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("unavailable"));
    }

    #[tokio::test]
    async fn test_window_response_decodes_flattened_reading() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/window")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"capacity":50,"len":1,"readings":[{"current":1.0,"temperature":30.0,
                "co2":450.0,"power":230.0,"energy_cumulative":20.0,
                "timestamp":"2024-01-01T00:00:00Z","smoothed_power":230.0,"state":"idle"}]}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let window: WindowResponse = client.get("api/v1/window").await.unwrap();

        assert_eq!(window.readings.len(), 1);
        assert_eq!(window.readings[0].reading.power, 230.0);
        assert_eq!(window.readings[0].state, OperationalState::Idle);
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
