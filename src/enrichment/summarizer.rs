//! Best-effort prose summaries for spike aggregates.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest_middleware::ClientWithMiddleware;
use thiserror::Error;
use url::Url;

use crate::{config::SummarizerConfig, models::SpikeSummary};

/// Errors from the summary generator. All of them degrade the spike
/// notification to its raw aggregate fields; none block delivery.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// The request did not complete within its time bound.
    #[error("summary request timed out after {0:?}")]
    TimedOut(Duration),

    /// The generator was unreachable.
    #[error("summary request failed: {0}")]
    Request(String),

    /// The generator answered with a non-success status.
    #[error("summary generator answered {0}")]
    Status(reqwest::StatusCode),

    /// The generator's response could not be interpreted.
    #[error("malformed summary response: {0}")]
    Malformed(String),
}

/// Turns a spike aggregate into a short prose description.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    /// Produces prose for `summary`.
    async fn summarize(&self, summary: &SpikeSummary) -> Result<String, SummaryError>;
}

/// Summary generator backed by an HTTP text-generation endpoint.
///
/// POSTs the aggregate as JSON and expects `{"summary": "..."}` back.
pub struct HttpSummaryGenerator {
    client: Arc<ClientWithMiddleware>,
    url: Url,
    timeout: Duration,
}

impl HttpSummaryGenerator {
    /// Creates a generator from its configuration and a pooled HTTP client.
    pub fn new(config: &SummarizerConfig, client: Arc<ClientWithMiddleware>) -> Self {
        Self { client, url: config.url.clone(), timeout: config.timeout_secs }
    }

    async fn request(&self, summary: &SpikeSummary) -> Result<String, SummaryError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(summary)
            .send()
            .await
            .map_err(|e| SummaryError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SummaryError::Status(status));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SummaryError::Malformed(e.to_string()))?;

        body.get("summary")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| SummaryError::Malformed("missing `summary` field".to_string()))
    }
}

#[async_trait]
impl SummaryGenerator for HttpSummaryGenerator {
    async fn summarize(&self, summary: &SpikeSummary) -> Result<String, SummaryError> {
        match tokio::time::timeout(self.timeout, self.request(summary)).await {
            Ok(result) => result,
            Err(_) => Err(SummaryError::TimedOut(self.timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Utc;

    use super::*;
    use crate::models::{EventType, Severity};

    fn create_generator(url: &str) -> HttpSummaryGenerator {
        let config = SummarizerConfig {
            url: Url::parse(url).unwrap(),
            timeout_secs: Duration::from_secs(5),
            retry_policy: Default::default(),
        };
        let client = Arc::new(
            reqwest_middleware::ClientBuilder::new(reqwest::Client::new()).build(),
        );
        HttpSummaryGenerator::new(&config, client)
    }

    fn sample_summary() -> SpikeSummary {
        SpikeSummary {
            count: 6,
            severities: BTreeSet::from([Severity::Low]),
            event_types: BTreeSet::from([EventType::Modified]),
            client_ids: BTreeSet::from(["agent-1".to_string()]),
            window_start: Utc::now(),
            window_end: Utc::now(),
        }
    }

    #[tokio::test]
    async fn summarize_returns_prose() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/summarize")
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_body(r#"{"summary": "Burst of low-severity modifications."}"#)
            .create_async()
            .await;

        let generator = create_generator(&format!("{}/summarize", server.url()));
        let prose = generator.summarize(&sample_summary()).await.unwrap();

        assert_eq!(prose, "Burst of low-severity modifications.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn summarize_rejects_missing_field() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/summarize")
            .with_status(200)
            .with_body(r#"{"text": "wrong shape"}"#)
            .create_async()
            .await;

        let generator = create_generator(&format!("{}/summarize", server.url()));
        let result = generator.summarize(&sample_summary()).await;
        assert!(matches!(result, Err(SummaryError::Malformed(_))));
    }

    #[tokio::test]
    async fn summarize_surfaces_status_errors() {
        let mut server = mockito::Server::new_async().await;
        server.mock("POST", "/summarize").with_status(500).create_async().await;

        let generator = create_generator(&format!("{}/summarize", server.url()));
        let result = generator.summarize(&sample_summary()).await;
        assert!(matches!(result, Err(SummaryError::Status(_))));
    }
}
