//! Webhook notification sink.
//!
//! Delivers notifications as JSON to a configured endpoint, typically the
//! admin system's receive endpoint. Payloads can be signed with a shared
//! secret so the receiver can authenticate the sender.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{
    Method,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use reqwest_middleware::ClientWithMiddleware;
use sha2::Sha256;

use super::{
    NotificationSink, error::SinkError, payload::NotificationPayload, template::TemplateService,
};
use crate::{config::WebhookSinkConfig, models::NotificationMessage};

/// HMAC SHA256 type alias
type HmacSha256 = Hmac<Sha256>;

/// Notification sink delivering JSON payloads over HTTP.
pub struct WebhookSink {
    url: url::Url,
    method: Method,
    secret: Option<String>,
    headers: HashMap<String, String>,
    alert_message: NotificationMessage,
    spike_message: NotificationMessage,
    client: Arc<ClientWithMiddleware>,
    templates: Arc<TemplateService>,
}

impl WebhookSink {
    /// Creates a new webhook sink from its configuration, a pooled HTTP
    /// client and the shared template service.
    pub fn new(
        config: WebhookSinkConfig,
        client: Arc<ClientWithMiddleware>,
        templates: Arc<TemplateService>,
    ) -> Result<Self, SinkError> {
        let method = match &config.method {
            Some(m) => Method::from_bytes(m.as_bytes())
                .map_err(|_| SinkError::ConfigError(format!("Invalid HTTP method: {m}")))?,
            None => Method::POST,
        };
        if let Some(secret) = &config.secret {
            // `HmacSha256::new_from_slice` accepts empty keys, so reject
            // them here where the operator can see the misconfiguration.
            if secret.is_empty() {
                return Err(SinkError::ConfigError(
                    "Webhook secret cannot be empty".to_string(),
                ));
            }
        }
        Ok(Self {
            url: config.url,
            method,
            secret: config.secret,
            headers: config.headers.unwrap_or_default(),
            alert_message: config.alert_message,
            spike_message: config.spike_message,
            client,
            templates,
        })
    }

    /// Signs a serialized payload with the shared secret, returning the
    /// signature and the millisecond timestamp that was mixed into it.
    fn sign_payload(
        &self,
        secret: &str,
        payload: &serde_json::Value,
    ) -> Result<(String, String), SinkError> {
        let timestamp = Utc::now().timestamp_millis();

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| SinkError::ConfigError(format!("Invalid secret: {e}")))?;

        let serialized = serde_json::to_string(payload)?;
        mac.update(format!("{serialized}{timestamp}").as_bytes());

        let signature = hex::encode(mac.finalize().into_bytes());
        Ok((signature, timestamp.to_string()))
    }

    fn build_headers(&self, payload: &serde_json::Value) -> Result<HeaderMap, SinkError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("content-type"),
            HeaderValue::from_static("application/json"),
        );

        if let Some(secret) = &self.secret {
            let (signature, timestamp) = self.sign_payload(secret, payload)?;
            headers.insert(
                HeaderName::from_static("x-signature"),
                HeaderValue::from_str(&signature)
                    .map_err(|e| SinkError::Internal(format!("Invalid signature value: {e}")))?,
            );
            headers.insert(
                HeaderName::from_static("x-timestamp"),
                HeaderValue::from_str(&timestamp)
                    .map_err(|e| SinkError::Internal(format!("Invalid timestamp value: {e}")))?,
            );
        }

        for (key, value) in &self.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| SinkError::ConfigError(format!("Invalid header name {key}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| SinkError::ConfigError(format!("Invalid header value for {key}: {e}")))?;
            headers.insert(name, value);
        }

        Ok(headers)
    }

    fn message_for(&self, payload: &NotificationPayload) -> &NotificationMessage {
        match payload {
            NotificationPayload::Alert(_) => &self.alert_message,
            NotificationPayload::Spike(_) => &self.spike_message,
        }
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn deliver(&self, payload: &NotificationPayload) -> Result<(), SinkError> {
        let context = payload.context()?;
        let message = self.message_for(payload);
        let title = self.templates.render(&message.title, context.clone())?;
        let body = self.templates.render(&message.body, context.clone())?;

        // The delivered document is the payload context with the rendered
        // title and body folded in, so receivers get both the prose and the
        // structured fields.
        let mut document = context;
        document["title"] = serde_json::Value::String(title);
        document["body"] = serde_json::Value::String(body);

        let headers = self.build_headers(&document)?;
        let response = self
            .client
            .request(self.method.clone(), self.url.clone())
            .headers(headers)
            .json(&document)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Rejected(status));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use serde_json::json;

    use super::*;
    use crate::{config::outbound::default_alert_message, test_helpers::AlertBuilder};
    use crate::models::EnrichedAlert;

    fn create_sink(url: &str, secret: Option<&str>) -> WebhookSink {
        let config = WebhookSinkConfig {
            url: url::Url::parse(url).unwrap(),
            method: None,
            secret: secret.map(str::to_string),
            headers: Some(HashMap::from([(
                "x-vigil-node".to_string(),
                "test".to_string(),
            )])),
            alert_message: default_alert_message(),
            spike_message: crate::config::outbound::default_spike_message(),
            retry_policy: Default::default(),
        };
        let client =
            Arc::new(reqwest_middleware::ClientBuilder::new(reqwest::Client::new()).build());
        WebhookSink::new(config, client, Arc::new(TemplateService::new())).unwrap()
    }

    fn alert_payload() -> NotificationPayload {
        NotificationPayload::Alert(EnrichedAlert {
            alert: AlertBuilder::new().client_id("agent-9").build(),
            reputation: None,
        })
    }

    #[tokio::test]
    async fn delivers_rendered_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/receive-alert")
            .match_header("content-type", "application/json")
            .match_header("x-vigil-node", "test")
            .match_body(Matcher::PartialJson(json!({
                "alert": { "client_id": "agent-9" }
            })))
            .with_status(200)
            .create_async()
            .await;

        let sink = create_sink(&format!("{}/receive-alert", server.url()), None);
        sink.deliver(&alert_payload()).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn signs_payload_when_secret_configured() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/receive-alert")
            .match_header("x-signature", Matcher::Regex("^[0-9a-f]{64}$".to_string()))
            .match_header("x-timestamp", Matcher::Regex("^\\d+$".to_string()))
            .with_status(200)
            .create_async()
            .await;

        let sink = create_sink(&format!("{}/receive-alert", server.url()), Some("hush"));
        sink.deliver(&alert_payload()).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        server.mock("POST", "/receive-alert").with_status(502).create_async().await;

        let sink = create_sink(&format!("{}/receive-alert", server.url()), None);
        let result = sink.deliver(&alert_payload()).await;
        assert!(matches!(result, Err(SinkError::Rejected(status)) if status.as_u16() == 502));
    }

    #[test]
    fn empty_secret_is_rejected_at_construction() {
        let config = WebhookSinkConfig {
            url: url::Url::parse("http://example.com/hook").unwrap(),
            method: None,
            secret: Some(String::new()),
            headers: None,
            alert_message: default_alert_message(),
            spike_message: crate::config::outbound::default_spike_message(),
            retry_policy: Default::default(),
        };
        let client =
            Arc::new(reqwest_middleware::ClientBuilder::new(reqwest::Client::new()).build());
        let result = WebhookSink::new(config, client, Arc::new(TemplateService::new()));
        assert!(matches!(result, Err(SinkError::ConfigError(_))));
    }
}
