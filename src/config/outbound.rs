//! Configuration for the outbound collaborators: reputation provider,
//! summary generator and notification sink.

use std::{collections::HashMap, time::Duration};

use serde::Deserialize;
use url::Url;

use super::{helpers::deserialize_duration_from_seconds, http_retry::HttpRetryConfig};
use crate::models::NotificationMessage;

fn default_lookup_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Reputation provider settings. When the section is absent from the
/// configuration, alerts are forwarded unenriched.
#[derive(Debug, Deserialize, Clone)]
pub struct EnrichmentConfig {
    /// Base URL of the reputation API; the content hash is appended as
    /// `files/{hash}`.
    pub base_url: Url,

    /// API key sent in the `x-apikey` header.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Upper bound on a single lookup, including middleware retries.
    #[serde(
        default = "default_lookup_timeout",
        deserialize_with = "deserialize_duration_from_seconds"
    )]
    pub timeout_secs: Duration,

    /// Retry policy for the lookup client.
    #[serde(default)]
    pub retry_policy: HttpRetryConfig,
}

/// Summary generator settings. Absent section means spike notifications
/// always carry the raw aggregate fields only.
#[derive(Debug, Deserialize, Clone)]
pub struct SummarizerConfig {
    /// Endpoint accepting a spike aggregate and returning prose.
    pub url: Url,

    /// Upper bound on a single summary request.
    #[serde(
        default = "default_lookup_timeout",
        deserialize_with = "deserialize_duration_from_seconds"
    )]
    pub timeout_secs: Duration,

    /// Retry policy for the summarizer client.
    #[serde(default)]
    pub retry_policy: HttpRetryConfig,
}

/// The configured notification sink.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkConfig {
    /// Generic JSON webhook, typically the admin system's receive endpoint.
    Webhook(WebhookSinkConfig),
    /// Print notifications to standard output; useful for local runs.
    Stdout(StdoutSinkConfig),
}

/// Settings for the webhook notification sink.
#[derive(Debug, Deserialize, Clone)]
pub struct WebhookSinkConfig {
    /// Delivery endpoint.
    pub url: Url,

    /// HTTP method; defaults to POST.
    #[serde(default)]
    pub method: Option<String>,

    /// Shared secret for HMAC-SHA256 payload signing. When set, deliveries
    /// carry `x-signature` and `x-timestamp` headers.
    #[serde(default)]
    pub secret: Option<String>,

    /// Extra headers added to every delivery.
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,

    /// Title/body templates for single-alert notifications.
    #[serde(default = "default_alert_message")]
    pub alert_message: NotificationMessage,

    /// Title/body templates for aggregated spike notifications.
    #[serde(default = "default_spike_message")]
    pub spike_message: NotificationMessage,

    /// Retry policy for the delivery client.
    #[serde(default)]
    pub retry_policy: HttpRetryConfig,
}

/// Settings for the stdout notification sink.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct StdoutSinkConfig {
    /// Optional title/body templates; without them the raw payload context
    /// is printed.
    #[serde(default)]
    pub message: Option<NotificationMessage>,
}

pub(crate) fn default_alert_message() -> NotificationMessage {
    NotificationMessage {
        title: "File integrity alert: {{ alert.event_type }} {{ alert.filename }}".to_string(),
        body: "Agent {{ alert.client_id }} reported {{ alert.event_type }} on \
               {{ alert.filename }} (severity {{ alert.severity }})."
            .to_string(),
    }
}

pub(crate) fn default_spike_message() -> NotificationMessage {
    NotificationMessage {
        title: "Alert spike: {{ spike.count }} events".to_string(),
        body: "{{ spike.count }} alerts from {{ spike.client_ids | length }} agents between \
               {{ spike.window_start }} and {{ spike.window_end }}."
            .to_string(),
    }
}
