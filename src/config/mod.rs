//! Configuration module for Vigil.

mod app_config;
mod correlator;
mod helpers;
mod http_retry;
pub(crate) mod outbound;
mod server;

pub use app_config::{AppConfig, StorageConfig};
pub use correlator::CorrelatorConfig;
pub use helpers::{
    deserialize_duration_from_ms, deserialize_duration_from_seconds, serialize_duration_to_ms,
    serialize_duration_to_seconds,
};
pub use http_retry::{BaseHttpClientConfig, HttpRetryConfig, JitterSetting};
pub use outbound::{
    EnrichmentConfig, SinkConfig, StdoutSinkConfig, SummarizerConfig, WebhookSinkConfig,
};
pub use server::ServerConfig;
