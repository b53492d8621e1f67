//! HTTP client for the weather endpoint.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::instrument;
use wardrobe_core::ReqwestErrorExt;

use crate::error::WeatherError;
use crate::types::WeatherSnapshot;

const USER_AGENT: &str = concat!("wardrobe/", env!("CARGO_PKG_VERSION"));
const WEATHER_PATH: &str = "/api/weather";

#[derive(Debug, Serialize)]
struct WeatherRequest<'a> {
    location: &'a str,
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    base_url: String,
}

impl WeatherProvider {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| WeatherError::Network(e.into_network_error()))?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the current weather for a location name or `"lat,long"` string.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch(&self, location: &str) -> Result<WeatherSnapshot, WeatherError> {
        let url = format!("{}{}", self.base_url, WEATHER_PATH);

        let response = self
            .client
            .post(&url)
            .json(&WeatherRequest { location })
            .send()
            .await
            .map_err(|e| WeatherError::Network(e.into_network_error()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Weather API returned status {}", status);
            return Err(WeatherError::Http {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| WeatherError::Network(e.into_network_error()))?;

        let mut snapshot: WeatherSnapshot =
            serde_json::from_str(&body).map_err(|e| WeatherError::Parse(e.to_string()))?;
        // A live response is never fallback data, whatever the server says
        snapshot.is_fallback = false;

        tracing::info!(
            "Fetched weather for {}: {} {}",
            snapshot.location,
            snapshot.temperature,
            snapshot.condition
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::types::WeatherCondition;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> WeatherProvider {
        WeatherProvider::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let provider =
            WeatherProvider::new("http://localhost:3000/", Duration::from_secs(1)).unwrap();
        assert_eq!(provider.base_url(), "http://localhost:3000");
    }

    #[tokio::test]
    async fn test_fetch_posts_location() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/weather"))
            .and(body_json(serde_json::json!({ "location": "Paris" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "temperature": 18,
                "condition": "Cloudy",
                "humidity": 70,
                "windSpeed": 12,
                "location": "Paris",
                "precipitation": 0
            })))
            .expect(1)
            .mount(&server)
            .await;

        let snapshot = provider(&server).fetch("Paris").await.unwrap();
        assert_eq!(snapshot.temperature, 18.0);
        assert_eq!(snapshot.condition, WeatherCondition::Cloudy);
        assert!(!snapshot.is_fallback);
    }

    #[tokio::test]
    async fn test_fetch_clears_server_fallback_flag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "temperature": 3,
                "condition": "Snow",
                "humidity": 80,
                "windSpeed": 4,
                "location": "Oslo",
                "precipitation": 1.2,
                "isFallback": true
            })))
            .mount(&server)
            .await;

        let snapshot = provider(&server).fetch("Oslo").await.unwrap();
        assert!(!snapshot.is_fallback);
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/weather"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = provider(&server).fetch("Paris").await.unwrap_err();
        assert!(matches!(err, WeatherError::Http { status: 502 }));
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = provider(&server).fetch("Paris").await.unwrap_err();
        assert!(matches!(err, WeatherError::Parse(_)));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Nothing listens on port 9 locally
        let provider =
            WeatherProvider::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = provider.fetch("Paris").await.unwrap_err();
        assert!(matches!(err, WeatherError::Network(_)));
    }
}
