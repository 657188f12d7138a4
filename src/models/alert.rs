//! Alert data model: the wire-level record agents submit and the normalized
//! form that flows through the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Length in hex characters of a SHA-256 content digest.
pub const CONTENT_HASH_LEN: usize = 64;

/// The kind of filesystem change an agent observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// A new file appeared under a watched path.
    Created,
    /// An existing file's content changed.
    Modified,
    /// A file was removed. Deleted events usually carry no content hash.
    Deleted,
}

impl EventType {
    /// Parses the wire-level label used by agents.
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "created" => Some(Self::Created),
            "modified" => Some(Self::Modified),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }

    /// Returns the wire-level label for this event type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Agent-supplied severity of an alert.
///
/// No severity classification happens server-side; the value is carried
/// through as reported, defaulting to `Low` when the agent omits it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Routine change, informational.
    #[default]
    Low,
    /// Worth a look.
    Medium,
    /// Suspicious change.
    High,
    /// Confirmed-bad or protected-path change.
    Critical,
}

impl Severity {
    /// Parses the wire-level label used by agents.
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    /// Returns the wire-level label for this severity.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An alert exactly as submitted by an agent, before validation.
///
/// Every field is optional at this stage; [`crate::ingest`] decides what is
/// required and rejects the rest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAlert {
    /// Opaque stable identifier of the reporting agent.
    pub client_id: Option<String>,
    /// Reporter network address, informational only.
    pub ip_address: Option<String>,
    /// Reporter hostname, informational only.
    pub hostname: Option<String>,
    /// Path the agent reported, trusted as given.
    pub filename: Option<String>,
    /// Hex-encoded SHA-256 digest of the file content.
    pub hash: Option<String>,
    /// One of `created`, `modified`, `deleted`.
    pub event_type: Option<String>,
    /// One of `low`, `medium`, `high`, `critical`.
    pub severity: Option<String>,
    /// Event time as an RFC 3339 string.
    pub timestamp: Option<String>,
}

/// One normalized file-system event report. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Opaque stable identifier of the reporting agent.
    pub client_id: String,

    /// Reporter network address. No uniqueness constraint.
    pub ip_address: Option<String>,

    /// Reporter hostname. No uniqueness constraint.
    pub hostname: Option<String>,

    /// Path reported by the agent; not validated against any root.
    pub filename: String,

    /// Lowercase hex SHA-256 content digest. Absent for deleted files.
    pub hash: Option<String>,

    /// The kind of change observed.
    pub event_type: EventType,

    /// Agent-supplied severity.
    pub severity: Severity,

    /// Event time, UTC, second precision. Assigned by the ingestor when the
    /// agent omits it or supplies an unparsable value.
    pub timestamp: DateTime<Utc>,
}
