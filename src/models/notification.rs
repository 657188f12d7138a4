//! Data models for notifications.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::alert::{Alert, EventType, Severity};

/// A message to be sent in a notification, with a title and body.
///
/// Both fields are minijinja templates rendered against the payload context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NotificationMessage {
    /// The title of the notification message.
    pub title: String,
    /// The body content of the notification message.
    pub body: String,
}

/// An alert together with the reputation report attached during enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedAlert {
    /// The normalized alert as produced by the ingestor.
    #[serde(flatten)]
    pub alert: Alert,

    /// Reputation report body, present only when the lookup found the hash.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reputation: Option<serde_json::Value>,
}

/// Aggregate description of one spike episode, computed over the window at
/// the moment the spike was detected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpikeSummary {
    /// Number of alerts inside the window.
    pub count: usize,
    /// Distinct severities observed.
    pub severities: BTreeSet<Severity>,
    /// Distinct event types observed.
    pub event_types: BTreeSet<EventType>,
    /// Distinct reporting agents observed.
    pub client_ids: BTreeSet<String>,
    /// Arrival time of the oldest alert in the window.
    pub window_start: DateTime<Utc>,
    /// Arrival time of the newest alert in the window.
    pub window_end: DateTime<Utc>,
}

/// One aggregated spike notification: the raw aggregate plus, when the
/// summary generator was reachable, a generated prose description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpikeNotification {
    /// The aggregate fields. Always present; the notification never depends
    /// on the summary generator.
    pub summary: SpikeSummary,

    /// Generated prose description, best-effort.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enriched_alert_flattens_alert_fields() {
        let alert = Alert {
            client_id: "agent-1".to_string(),
            ip_address: Some("10.0.0.5".to_string()),
            hostname: Some("web-01".to_string()),
            filename: "/usr/bin/ls".to_string(),
            hash: Some("cd".repeat(32)),
            event_type: EventType::Created,
            severity: Severity::Low,
            timestamp: Utc::now(),
        };
        let enriched = EnrichedAlert {
            alert,
            reputation: Some(serde_json::json!({ "positives": 3 })),
        };
        let value = serde_json::to_value(&enriched).unwrap();
        assert_eq!(value["client_id"], "agent-1");
        assert_eq!(value["reputation"]["positives"], 3);
    }

    #[test]
    fn unenriched_alert_omits_reputation_key() {
        let alert = Alert {
            client_id: "agent-1".to_string(),
            ip_address: None,
            hostname: None,
            filename: "/tmp/x".to_string(),
            hash: None,
            event_type: EventType::Deleted,
            severity: Severity::Low,
            timestamp: Utc::now(),
        };
        let value = serde_json::to_value(&EnrichedAlert { alert, reputation: None }).unwrap();
        assert!(value.get("reputation").is_none());
    }
}
