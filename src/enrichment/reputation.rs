//! Content-hash reputation lookups.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest_middleware::ClientWithMiddleware;
use url::Url;

use crate::{
    config::EnrichmentConfig,
    models::{ReputationOutcome, ReputationReport},
};

/// Looks up the reputation of a content hash with an external provider.
///
/// Implementations never fail the pipeline: timeouts and transport errors
/// are folded into the returned [`ReputationOutcome`].
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ReputationProvider: Send + Sync {
    /// Performs one lookup for `hash`.
    async fn lookup(&self, hash: &str) -> ReputationOutcome;
}

/// Reputation provider backed by an HTTP hash-lookup API.
///
/// Queries `GET {base_url}files/{hash}` with an optional `x-apikey` header.
/// A 404 is the provider's definitive "not found"; any other non-success
/// status is a hard failure.
pub struct HttpReputationProvider {
    client: Arc<ClientWithMiddleware>,
    base_url: Url,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpReputationProvider {
    /// Creates a provider from its configuration and a pooled HTTP client.
    pub fn new(config: &EnrichmentConfig, client: Arc<ClientWithMiddleware>) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            timeout: config.timeout_secs,
        }
    }

    async fn fetch(&self, hash: &str) -> ReputationOutcome {
        let url = match self.base_url.join(&format!("files/{hash}")) {
            Ok(url) => url,
            Err(e) => return ReputationOutcome::Failed(format!("invalid lookup URL: {e}")),
        };

        let mut request = self.client.get(url);
        if let Some(key) = &self.api_key {
            request = request.header("x-apikey", key);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return ReputationOutcome::Failed(e.to_string()),
        };

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return ReputationOutcome::NotFound;
        }
        if !status.is_success() {
            return ReputationOutcome::Failed(format!("reputation provider answered {status}"));
        }

        match response.json::<serde_json::Value>().await {
            Ok(report) => {
                ReputationOutcome::Found(ReputationReport { hash: hash.to_string(), report })
            }
            Err(e) => ReputationOutcome::Failed(format!("malformed reputation response: {e}")),
        }
    }
}

#[async_trait]
impl ReputationProvider for HttpReputationProvider {
    async fn lookup(&self, hash: &str) -> ReputationOutcome {
        match tokio::time::timeout(self.timeout, self.fetch(hash)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(hash, timeout = ?self.timeout, "Reputation lookup timed out.");
                ReputationOutcome::TimedOut
            }
        }
    }
}
