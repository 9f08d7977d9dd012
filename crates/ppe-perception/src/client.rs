//! Perception service HTTP client.

use std::collections::BTreeSet;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use ppe_models::{EquipmentCategory, PerceptionResponse};

use crate::error::{PerceptionError, PerceptionResult};
use crate::types::{DetectRequest, HealthResponse};

/// Configuration for the perception client.
#[derive(Debug, Clone)]
pub struct PerceptionClientConfig {
    /// Base URL of the perception service
    pub base_url: String,
    /// HTTP request timeout
    pub timeout: Duration,
    /// TCP connect timeout
    pub connect_timeout: Duration,
}

impl Default for PerceptionClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl PerceptionClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("PERCEPTION_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8001".to_string()),
            timeout: Duration::from_secs(
                std::env::var("PERCEPTION_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            connect_timeout: Duration::from_secs(
                std::env::var("PERCEPTION_SERVICE_CONNECT_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
        }
    }
}

/// Client for the perception service.
pub struct PerceptionClient {
    http: Client,
    config: PerceptionClientConfig,
}

impl PerceptionClient {
    /// Create a new perception client.
    pub fn new(config: PerceptionClientConfig) -> PerceptionResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(2)
            .user_agent(concat!("ppe-perception/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(PerceptionError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> PerceptionResult<Self> {
        Self::new(PerceptionClientConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Check if the perception service is healthy.
    pub async fn health_check(&self) -> PerceptionResult<bool> {
        let url = format!("{}/health", self.config.base_url);

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let health: HealthResponse = response.json().await?;
                Ok(health.status == "healthy" || health.status == "ok")
            }
            Ok(response) => {
                warn!("Perception service health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Perception service health check error: {}", e);
                Ok(false)
            }
        }
    }

    /// Detect protective equipment on one JPEG frame.
    pub async fn detect(
        &self,
        jpeg: &[u8],
        min_confidence: f64,
        required: &BTreeSet<EquipmentCategory>,
    ) -> PerceptionResult<PerceptionResponse> {
        let url = format!("{}/detect-ppe", self.config.base_url);
        let request = DetectRequest::new(jpeg, min_confidence, required);

        debug!("Sending {} byte frame to {}", jpeg.len(), url);

        let response = self.http.post(&url).json(&request).send().await?;

        let status = response.status();
        if status == StatusCode::SERVICE_UNAVAILABLE || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(PerceptionError::ServiceUnavailable(status.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PerceptionError::RequestFailed(format!(
                "Perception service returned {}: {}",
                status, body
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| PerceptionError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> PerceptionClient {
        PerceptionClient::new(PerceptionClientConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    fn required() -> BTreeSet<EquipmentCategory> {
        EquipmentCategory::ALL.iter().copied().collect()
    }

    #[test]
    fn test_config_defaults() {
        let config = PerceptionClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8001");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert!(PerceptionClient::new(config).is_ok());
    }

    #[tokio::test]
    async fn test_detect_decodes_persons() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/detect-ppe"))
            .and(body_partial_json(serde_json::json!({ "min_confidence": 80.0 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Persons": [{
                    "BoundingBox": {"Left": 0.1, "Top": 0.1, "Width": 0.4, "Height": 0.8},
                    "BodyParts": [{"Name": "LEFT_HAND", "EquipmentDetections": [
                        {"Type": "HAND_COVER", "Confidence": 91.0}
                    ]}]
                }]
            })))
            .mount(&server)
            .await;

        let response = client_for(&server)
            .detect(b"frame", 80.0, &required())
            .await
            .unwrap();

        assert_eq!(response.persons.len(), 1);
        assert_eq!(response.detection_count(), 1);
    }

    #[tokio::test]
    async fn test_detect_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/detect-ppe"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .detect(b"frame", 80.0, &required())
            .await
            .unwrap_err();

        assert!(err.is_malformed());
    }

    #[tokio::test]
    async fn test_detect_service_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/detect-ppe"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .detect(b"frame", 80.0, &required())
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert!(!err.is_malformed());
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "ok" })),
            )
            .mount(&server)
            .await;

        assert!(client_for(&server).health_check().await.unwrap());
    }
}
