//! # Notification sinks
//!
//! Delivery of pipeline output: individually forwarded alerts and
//! aggregated spike notifications. The [`NotificationSink`] trait is the
//! seam; the webhook sink posts JSON to the admin system, the stdout sink
//! prints for local runs. [`SinkDispatcher`] owns whichever sink the
//! configuration selected and keeps per-kind delivery counters.

mod dispatcher;
mod error;
mod payload;
mod stdout;
mod template;
mod webhook;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

pub use dispatcher::SinkDispatcher;
pub use error::SinkError;
pub use payload::NotificationPayload;
pub use stdout::StdoutSink;
pub use template::{TemplateService, TemplateServiceError};
pub use webhook::WebhookSink;

/// A delivery channel for notifications.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers one payload. A returned error means the notification did
    /// not reach the sink; callers decide what to do with that.
    async fn deliver(&self, payload: &NotificationPayload) -> Result<(), SinkError>;
}
