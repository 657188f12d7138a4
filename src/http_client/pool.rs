//! A reusable, thread-safe pool for outbound HTTP clients.
//!
//! Each outbound collaborator (reputation provider, summarizer, webhook
//! sink) may carry its own retry policy; the pool hands out one shared
//! client per policy so connection pools are reused rather than rebuilt per
//! call.

use std::{collections::HashMap, sync::Arc};

use reqwest::Client as ReqwestClient;
use reqwest_middleware::ClientWithMiddleware;
use thiserror::Error;
use tokio::sync::RwLock;

use super::client::create_retryable_http_client;
use crate::config::{BaseHttpClientConfig, HttpRetryConfig};

/// Errors that can occur within the `HttpClientPool`.
#[derive(Debug, Error)]
pub enum HttpClientPoolError {
    /// An error occurred while building the underlying `reqwest::Client`.
    #[error("Failed to create HTTP client: {0}")]
    HttpClientBuildError(String),
}

/// A pool of outbound HTTP clients keyed by retry policy.
pub struct HttpClientPool {
    base_config: BaseHttpClientConfig,
    clients: Arc<RwLock<HashMap<String, Arc<ClientWithMiddleware>>>>,
}

impl HttpClientPool {
    /// Creates a new, empty pool whose clients share `base_config`.
    pub fn new(base_config: BaseHttpClientConfig) -> Self {
        Self { base_config, clients: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Gets an existing HTTP client from the pool or creates a new one if
    /// none exists for the given retry policy.
    ///
    /// Uses a double-checked locking pattern so concurrent callers with the
    /// same policy end up sharing one client.
    pub async fn get_or_create(
        &self,
        retry_policy: &HttpRetryConfig,
    ) -> Result<Arc<ClientWithMiddleware>, HttpClientPoolError> {
        let key = format!("{retry_policy:?}");

        if let Some(client) = self.clients.read().await.get(&key) {
            return Ok(client.clone());
        }

        let mut clients = self.clients.write().await;
        // Another task might have created the client while we were waiting
        // for the write lock.
        if let Some(client) = clients.get(&key) {
            return Ok(client.clone());
        }

        let base_client = ReqwestClient::builder()
            .pool_max_idle_per_host(self.base_config.max_idle_per_host)
            .pool_idle_timeout(Some(self.base_config.idle_timeout))
            .connect_timeout(self.base_config.connect_timeout)
            .build()
            .map_err(|e| HttpClientPoolError::HttpClientBuildError(e.to_string()))?;

        let new_client = Arc::new(create_retryable_http_client(retry_policy, base_client));
        clients.insert(key, new_client.clone());

        Ok(new_client)
    }

    /// Returns the number of active HTTP clients in the pool.
    #[cfg(test)]
    pub async fn get_active_client_count(&self) -> usize {
        self.clients.read().await.len()
    }
}

impl Default for HttpClientPool {
    fn default() -> Self {
        Self::new(BaseHttpClientConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pool_init_empty() {
        let pool = HttpClientPool::default();
        assert_eq!(pool.get_active_client_count().await, 0);
    }

    #[tokio::test]
    async fn test_pool_returns_same_client_for_same_policy() {
        let pool = HttpClientPool::default();
        let retry_config = HttpRetryConfig::default();
        let client1 = pool.get_or_create(&retry_config).await.unwrap();
        let client2 = pool.get_or_create(&retry_config).await.unwrap();

        assert!(Arc::ptr_eq(&client1, &client2));
        assert_eq!(pool.get_active_client_count().await, 1);
    }

    #[tokio::test]
    async fn test_pool_returns_different_clients_for_different_policies() {
        let pool = HttpClientPool::default();
        let config_a = HttpRetryConfig::default();
        let config_b = HttpRetryConfig { max_retries: 5, ..Default::default() };

        let client_a = pool.get_or_create(&config_a).await.unwrap();
        let client_b = pool.get_or_create(&config_b).await.unwrap();

        assert!(!Arc::ptr_eq(&client_a, &client_b));
        assert_eq!(pool.get_active_client_count().await, 2);
    }

    #[tokio::test]
    async fn test_pool_concurrent_access() {
        let pool = Arc::new(HttpClientPool::default());
        let retry_config = HttpRetryConfig::default();

        let mut tasks = Vec::new();
        for _ in 0..10 {
            let pool = Arc::clone(&pool);
            let retry_config = retry_config.clone();
            tasks.push(tokio::spawn(async move {
                pool.get_or_create(&retry_config).await.unwrap();
            }));
        }

        for result in futures::future::join_all(tasks).await {
            assert!(result.is_ok());
        }
        assert_eq!(pool.get_active_client_count().await, 1);
    }
}
