//! Alert intake: validation and normalization of raw agent submissions.
//!
//! Exactly one alert enters per call; a rejected record never reaches the
//! correlator's window. The transport layer surfaces rejections back to the
//! reporting agent.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use thiserror::Error;

use crate::{
    correlator::{Observation, SpikeCorrelator},
    models::{Alert, CONTENT_HASH_LEN, EventType, RawAlert, Severity},
};

/// Reasons a raw alert is rejected before entering correlation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The event type label is not one of the known values.
    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    /// The severity label is not one of the known values.
    #[error("unknown severity: {0}")]
    UnknownSeverity(String),

    /// The content hash is present but not a well-formed digest.
    #[error("malformed content hash: {0}")]
    MalformedHash(String),

    /// A created/modified event arrived without a content hash.
    #[error("missing content hash for {0} event")]
    MissingHash(EventType),
}

/// Accepts one alert per invocation and hands the normalized record to the
/// correlator.
pub struct Ingestor {
    correlator: Arc<SpikeCorrelator>,
}

impl Ingestor {
    /// Creates an ingestor feeding the given correlator.
    pub fn new(correlator: Arc<SpikeCorrelator>) -> Self {
        Self { correlator }
    }

    /// Validates and normalizes `raw`, then observes it synchronously.
    pub async fn ingest(&self, raw: RawAlert) -> Result<Observation, ValidationError> {
        let alert = normalize(raw)?;
        tracing::debug!(
            client_id = %alert.client_id,
            event_type = %alert.event_type,
            filename = %alert.filename,
            "Alert accepted."
        );
        Ok(self.correlator.observe(alert).await)
    }
}

/// Validates a raw submission into a canonical [`Alert`].
///
/// `client_id`, `filename` and `event_type` are required. A missing or
/// unparsable timestamp is replaced with the current time rather than
/// rejected; everything else malformed is an error.
pub fn normalize(raw: RawAlert) -> Result<Alert, ValidationError> {
    let client_id = required(raw.client_id, "client_id")?;
    let filename = required(raw.filename, "filename")?;
    let event_label = required(raw.event_type, "event_type")?;
    let event_type = EventType::parse(&event_label)
        .ok_or_else(|| ValidationError::UnknownEventType(event_label.clone()))?;

    let severity = match raw.severity.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => Severity::default(),
        Some(label) => Severity::parse(label)
            .ok_or_else(|| ValidationError::UnknownSeverity(label.to_string()))?,
    };

    let hash = normalize_hash(raw.hash)?;
    if hash.is_none() && event_type != EventType::Deleted {
        return Err(ValidationError::MissingHash(event_type));
    }

    let timestamp = raw
        .timestamp
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or_else(Utc::now)
        .trunc_subsecs(0);

    Ok(Alert {
        client_id,
        ip_address: clean_optional(raw.ip_address),
        hostname: clean_optional(raw.hostname),
        filename,
        hash,
        event_type,
        severity,
        timestamp,
    })
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(v) => Ok(v),
        None => Err(ValidationError::MissingField(field)),
    }
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// A present hash must be a full hex digest; casing is normalized away.
fn normalize_hash(hash: Option<String>) -> Result<Option<String>, ValidationError> {
    let hash = match hash.map(|h| h.trim().to_string()).filter(|h| !h.is_empty()) {
        Some(h) => h,
        None => return Ok(None),
    };
    if hash.len() != CONTENT_HASH_LEN || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::MalformedHash(hash));
    }
    Ok(Some(hash.to_ascii_lowercase()))
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.with_timezone(&Utc))
}
