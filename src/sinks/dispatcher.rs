//! Construction and bookkeeping around the configured notification sink.

use std::sync::Arc;

use dashmap::DashMap;

use super::{
    NotificationSink, error::SinkError, payload::NotificationPayload, stdout::StdoutSink,
    template::TemplateService, webhook::WebhookSink,
};
use crate::{config::SinkConfig, http_client::HttpClientPool};

/// Owns the configured sink and counts deliveries by payload kind.
///
/// Delivery failures are returned to the caller; the dispatcher never
/// retries on its own.
pub struct SinkDispatcher {
    sink: Box<dyn NotificationSink>,
    dispatched: DashMap<&'static str, usize>,
}

impl SinkDispatcher {
    /// Builds the sink described by `config`, drawing HTTP clients from the
    /// shared pool.
    pub async fn from_config(
        config: &SinkConfig,
        client_pool: &HttpClientPool,
    ) -> Result<Self, SinkError> {
        let templates = Arc::new(TemplateService::new());
        let sink: Box<dyn NotificationSink> = match config {
            SinkConfig::Webhook(webhook_config) => {
                let client = client_pool.get_or_create(&webhook_config.retry_policy).await?;
                Box::new(WebhookSink::new(webhook_config.clone(), client, templates)?)
            }
            SinkConfig::Stdout(stdout_config) => {
                Box::new(StdoutSink::new(stdout_config.clone(), templates))
            }
        };
        Ok(Self::new(sink))
    }

    /// Wraps an already-constructed sink.
    pub fn new(sink: Box<dyn NotificationSink>) -> Self {
        Self { sink, dispatched: DashMap::new() }
    }

    /// Delivers a payload, counting successful deliveries per kind.
    pub async fn deliver(&self, payload: &NotificationPayload) -> Result<(), SinkError> {
        tracing::debug!(kind = payload.kind(), "Delivering notification.");
        match self.sink.deliver(payload).await {
            Ok(()) => {
                *self.dispatched.entry(payload.kind()).or_insert(0) += 1;
                Ok(())
            }
            Err(e) => {
                tracing::error!(kind = payload.kind(), error = %e, "Notification delivery failed.");
                Err(e)
            }
        }
    }

    /// Number of successful deliveries for a payload kind.
    pub fn dispatched_count(&self, kind: &str) -> usize {
        self.dispatched.get(kind).map(|entry| *entry.value()).unwrap_or(0)
    }
}
