//! Data models shared across the pipeline.

pub mod alert;
pub mod notification;
pub mod reputation;

pub use alert::{Alert, EventType, RawAlert, Severity, CONTENT_HASH_LEN};
pub use notification::{EnrichedAlert, NotificationMessage, SpikeNotification, SpikeSummary};
pub use reputation::{ReputationOutcome, ReputationReport};
