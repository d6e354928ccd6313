//! API client for communicating with the predictive maintenance server

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

/// API client for the predictive maintenance server
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    async fn send(&self, path: &str, query: &[(&str, String)]) -> Result<Response> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            anyhow::bail!("API error ({}): {}", status, message);
        }

        Ok(response)
    }

    /// Make a GET request and decode a JSON body
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        self.send(path, query)
            .await?
            .json()
            .await
            .context("Failed to parse response")
    }

    /// Store a reading; only the supplied fields are sent
    pub async fn ingest(&self, reading: &ReadingInput) -> Result<String> {
        let query = reading.query_pairs();
        self.send("sensor", &query)
            .await?
            .text()
            .await
            .context("Failed to read response")
    }

    pub async fn history(&self, limit: Option<usize>) -> Result<Vec<SensorReading>> {
        let query: Vec<(&str, String)> = limit.map(|l| ("limit", l.to_string())).into_iter().collect();
        self.get("history", &query).await
    }

    pub async fn series(&self) -> Result<Vec<SensorReading>> {
        self.get("series", &[]).await
    }

    pub async fn predict(&self) -> Result<Prediction> {
        self.get("predict", &[]).await
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        // 503 still carries a health document
        let url = self.base_url.join("healthz").context("Invalid path")?;
        self.client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?
            .json()
            .await
            .context("Failed to parse response")
    }
}

// API request/response types

/// Values for a new reading; `None` fields are left to the server default
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadingInput {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub vibration: Option<f64>,
    pub current: Option<f64>,
    pub voltage: Option<f64>,
}

impl ReadingInput {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        [
            ("temperature", self.temperature),
            ("humidity", self.humidity),
            ("vibration", self.vibration),
            ("current", self.current),
            ("voltage", self.voltage),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v.to_string())))
        .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorReading {
    pub id: i64,
    pub temperature: f64,
    pub humidity: f64,
    pub vibration: f64,
    pub current: f64,
    pub voltage: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub anomaly: u8,
    pub time_to_failure: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub components: std::collections::BTreeMap<String, ComponentHealth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_invalid_base_url() {
        assert!(ApiClient::new("not a url").is_err());
    }

    #[test]
    fn test_ingest_sends_only_given_fields() {
        let input = ReadingInput {
            temperature: Some(21.5),
            vibration: Some(0.6),
            ..Default::default()
        };
        assert_eq!(
            input.query_pairs(),
            vec![("temperature", "21.5".to_string()), ("vibration", "0.6".to_string())]
        );
    }

    #[tokio::test]
    async fn test_predict_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/predict")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"anomaly":1,"time_to_failure":94.0}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let prediction = client.predict().await.unwrap();

        mock.assert_async().await;
        assert_eq!(prediction.anomaly, 1);
        assert_eq!(prediction.time_to_failure, 94.0);
    }

    #[tokio::test]
    async fn test_predict_not_found_surfaces_server_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/predict")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"No data found","code":"no_data"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client.predict().await.unwrap_err().to_string();
        assert!(err.contains("404"), "{err}");
        assert!(err.contains("No data found"), "{err}");
    }

    #[tokio::test]
    async fn test_history_passes_limit() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/history")
            .match_query(Matcher::UrlEncoded("limit".into(), "2".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"id":2,"temperature":22.0,"humidity":41.0,"vibration":0.1,"current":1.0,"voltage":12.0,"timestamp":"2026-10-16T10:00:01.000000Z"},
                    {"id":1,"temperature":21.0,"humidity":40.0,"vibration":0.1,"current":1.0,"voltage":12.0,"timestamp":"2026-10-16T10:00:00.000000Z"}
                ]"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let rows = client.history(Some(2)).await.unwrap();

        mock.assert_async().await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, 2);
    }

    #[tokio::test]
    async fn test_ingest_returns_server_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/sensor")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("temperature".into(), "21.5".into()),
                Matcher::UrlEncoded("humidity".into(), "40".into()),
            ]))
            .with_status(200)
            .with_body("Sensor values stored successfully")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let body = client
            .ingest(&ReadingInput {
                temperature: Some(21.5),
                humidity: Some(40.0),
                ..Default::default()
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(body, "Sensor values stored successfully");
    }

    #[tokio::test]
    async fn test_health_reads_unhealthy_document() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/healthz")
            .with_status(503)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"status":"unhealthy","components":{
                    "store":{"status":"healthy","updated_at":1},
                    "predictor":{"status":"unhealthy","message":"clf.onnx missing","updated_at":1}
                }}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let health = client.health().await.unwrap();
        assert_eq!(health.status, "unhealthy");
        assert_eq!(
            health.components["predictor"].message.as_deref(),
            Some("clf.onnx missing")
        );
    }
}
