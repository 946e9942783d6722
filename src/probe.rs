//! HTTP transport capability used by the per-target checkers
//!
//! The checkers depend only on the [`ProbeTransport`] trait, so the concrete
//! client is injected at startup: production uses [`ReqwestTransport`], tests
//! substitute their own implementation.

use crate::errors::{CheckFailure, MonitorError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Minimal view of an HTTP response needed by the checkers
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResponse {
    pub status: u16,
    pub body: String,
}

impl ProbeResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP transport seam for health probes
#[async_trait]
pub trait ProbeTransport: Send + Sync {
    /// Perform a GET with a bounded timeout
    async fn get(
        &self,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<ProbeResponse, CheckFailure>;

    /// Perform a POST with a JSON body and a bounded timeout
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        timeout: Duration,
    ) -> std::result::Result<ProbeResponse, CheckFailure>;
}

/// Production transport backed by a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("ivor_monitor/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(MonitorError::Http)?;

        Ok(Self { client })
    }

    /// Map a reqwest error onto the check failure taxonomy
    fn classify(err: reqwest::Error, timeout: Duration) -> CheckFailure {
        if err.is_timeout() {
            CheckFailure::Timeout(timeout)
        } else {
            // Connect, DNS, and mid-stream errors all mean the target did
            // not answer in a usable way.
            CheckFailure::Connection(err.to_string())
        }
    }

    async fn read_response(
        response: reqwest::Response,
        timeout: Duration,
    ) -> std::result::Result<ProbeResponse, CheckFailure> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Self::classify(e, timeout))?;

        Ok(ProbeResponse { status, body })
    }
}

#[async_trait]
impl ProbeTransport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<ProbeResponse, CheckFailure> {
        debug!("GET {} (timeout {}s)", url, timeout.as_secs());

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Self::classify(e, timeout))?;

        Self::read_response(response, timeout).await
    }

    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        timeout: Duration,
    ) -> std::result::Result<ProbeResponse, CheckFailure> {
        debug!("POST {} (timeout {}s)", url, timeout.as_secs());

        let response = self
            .client
            .post(url)
            .json(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Self::classify(e, timeout))?;

        Self::read_response(response, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_returns_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"healthy"}"#))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let response = transport
            .get(&format!("{}/health", server.uri()), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert!(response.is_success());
        assert_eq!(response.body, r#"{"status":"healthy"}"#);
    }

    #[tokio::test]
    async fn test_post_json_sends_body() {
        let server = MockServer::start().await;
        let payload = serde_json::json!({"message": "ping", "context": "monitoring"});

        Mock::given(method("POST"))
            .and(path("/chat/message"))
            .and(body_json(&payload))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"success"}"#))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let response = transport
            .post_json(
                &format!("{}/chat/message", server.uri()),
                &payload,
                Duration::from_secs(10),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_unreachable_target_classified_as_connection_failure() {
        // Port 1 is virtually never listening
        let transport = ReqwestTransport::new().unwrap();
        let result = transport
            .get("http://127.0.0.1:1/health", Duration::from_secs(5))
            .await;

        match result {
            Err(CheckFailure::Connection(detail)) => {
                assert!(!detail.is_empty());
            }
            other => panic!("expected connection failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_slow_response_classified_as_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let result = transport
            .get(&format!("{}/health", server.uri()), Duration::from_millis(50))
            .await;

        assert_eq!(result, Err(CheckFailure::Timeout(Duration::from_millis(50))));
    }
}
