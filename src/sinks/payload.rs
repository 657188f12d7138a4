use serde::Serialize;

use super::error::SinkError;
use crate::models::{EnrichedAlert, SpikeNotification};

/// The two kinds of notifications a sink can be asked to deliver.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum NotificationPayload {
    /// A single, possibly enriched, alert forwarded individually.
    Alert(EnrichedAlert),
    /// One aggregated notification for a detected spike episode.
    Spike(SpikeNotification),
}

impl NotificationPayload {
    /// Serializes the payload into the template/rendering context.
    ///
    /// Alert payloads render under an `alert` key, spike payloads under
    /// `spike` plus a top-level `narrative`.
    pub fn context(&self) -> Result<serde_json::Value, SinkError> {
        match self {
            NotificationPayload::Alert(enriched) => {
                Ok(serde_json::json!({ "alert": serde_json::to_value(enriched)? }))
            }
            NotificationPayload::Spike(notification) => Ok(serde_json::json!({
                "spike": serde_json::to_value(&notification.summary)?,
                "narrative": notification.narrative,
            })),
        }
    }

    /// Short label for logging and dispatch counters.
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationPayload::Alert(_) => "alert",
            NotificationPayload::Spike(_) => "spike",
        }
    }
}
