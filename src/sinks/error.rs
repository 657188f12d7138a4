//! Error types for notification delivery.

use thiserror::Error;

use super::template::TemplateServiceError;
use crate::http_client::HttpClientPoolError;

/// Defines the possible errors that can occur while delivering a
/// notification to a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// An error related to invalid or missing sink configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The payload could not be serialized for delivery.
    #[error("Failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The sink rejected the delivery with a non-success status.
    #[error("Delivery rejected with status: {0}")]
    Rejected(reqwest::StatusCode),

    /// An error from the underlying `reqwest` or `reqwest_middleware`
    /// libraries.
    #[error("Request error: {0}")]
    Request(#[from] reqwest_middleware::Error),

    /// An error originating from the HTTP client pool.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] HttpClientPoolError),

    /// An error related to the template rendering process.
    #[error("Template rendering error: {0}")]
    Template(#[from] TemplateServiceError),

    /// An internal error that should not occur under normal circumstances.
    #[error("Internal error: {0}")]
    Internal(String),
}
