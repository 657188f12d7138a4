use chrono::{SubsecRound, Utc};
use sha2::{Digest, Sha256};

use crate::models::{Alert, EventType, RawAlert, Severity};

/// Hex SHA-256 digest of arbitrary content, for building realistic alerts.
pub fn content_hash(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// A builder for creating normalized [`Alert`] instances for testing.
pub struct AlertBuilder {
    alert: Alert,
}

impl Default for AlertBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertBuilder {
    /// Creates a builder with a valid low-severity modification alert.
    pub fn new() -> Self {
        Self {
            alert: Alert {
                client_id: "agent-1".to_string(),
                ip_address: Some("10.0.0.5".to_string()),
                hostname: Some("web-01".to_string()),
                filename: "/etc/passwd".to_string(),
                hash: Some(content_hash(b"default content")),
                event_type: EventType::Modified,
                severity: Severity::Low,
                timestamp: Utc::now().trunc_subsecs(0),
            },
        }
    }

    /// Sets the reporting agent identifier.
    pub fn client_id(mut self, client_id: &str) -> Self {
        self.alert.client_id = client_id.to_string();
        self
    }

    /// Sets the reported path.
    pub fn filename(mut self, filename: &str) -> Self {
        self.alert.filename = filename.to_string();
        self
    }

    /// Sets the event type.
    pub fn event_type(mut self, event_type: EventType) -> Self {
        self.alert.event_type = event_type;
        self
    }

    /// Sets the severity.
    pub fn severity(mut self, severity: Severity) -> Self {
        self.alert.severity = severity;
        self
    }

    /// Sets the content hash.
    pub fn hash(mut self, hash: &str) -> Self {
        self.alert.hash = Some(hash.to_string());
        self
    }

    /// Marks the alert as a deletion, which carries no content hash.
    pub fn deleted(mut self) -> Self {
        self.alert.event_type = EventType::Deleted;
        self.alert.hash = None;
        self
    }

    /// Finishes the builder.
    pub fn build(self) -> Alert {
        self.alert
    }
}

/// A builder for wire-level [`RawAlert`] submissions. Starts fully populated
/// and valid; the `no_*` methods drop fields to exercise validation.
pub struct RawAlertBuilder {
    raw: RawAlert,
}

impl Default for RawAlertBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RawAlertBuilder {
    /// Creates a builder with every field set to a valid value.
    pub fn new() -> Self {
        Self {
            raw: RawAlert {
                client_id: Some("agent-1".to_string()),
                ip_address: Some("10.0.0.5".to_string()),
                hostname: Some("web-01".to_string()),
                filename: Some("/etc/passwd".to_string()),
                hash: Some(content_hash(b"default content")),
                event_type: Some("modified".to_string()),
                severity: Some("low".to_string()),
                timestamp: Some("2026-08-06T12:00:00Z".to_string()),
            },
        }
    }

    /// Sets the reporting agent identifier.
    pub fn client_id(mut self, client_id: &str) -> Self {
        self.raw.client_id = Some(client_id.to_string());
        self
    }

    /// Drops the agent identifier.
    pub fn no_client_id(mut self) -> Self {
        self.raw.client_id = None;
        self
    }

    /// Sets the reported path.
    pub fn filename(mut self, filename: &str) -> Self {
        self.raw.filename = Some(filename.to_string());
        self
    }

    /// Sets the event type label.
    pub fn event_type(mut self, event_type: &str) -> Self {
        self.raw.event_type = Some(event_type.to_string());
        self
    }

    /// Sets the severity label.
    pub fn severity(mut self, severity: &str) -> Self {
        self.raw.severity = Some(severity.to_string());
        self
    }

    /// Drops the severity label.
    pub fn no_severity(mut self) -> Self {
        self.raw.severity = None;
        self
    }

    /// Sets the content hash.
    pub fn hash(mut self, hash: &str) -> Self {
        self.raw.hash = Some(hash.to_string());
        self
    }

    /// Drops the content hash.
    pub fn no_hash(mut self) -> Self {
        self.raw.hash = None;
        self
    }

    /// Sets the timestamp string.
    pub fn timestamp(mut self, timestamp: &str) -> Self {
        self.raw.timestamp = Some(timestamp.to_string());
        self
    }

    /// Drops the timestamp string.
    pub fn no_timestamp(mut self) -> Self {
        self.raw.timestamp = None;
        self
    }

    /// Finishes the builder.
    pub fn build(self) -> RawAlert {
        self.raw
    }
}
