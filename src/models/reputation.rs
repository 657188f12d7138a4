//! Reputation lookup results.

use serde::{Deserialize, Serialize};

/// A reputation report returned by the provider for a content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationReport {
    /// The content hash the report describes.
    pub hash: String,
    /// Provider-specific report body, carried through opaquely.
    pub report: serde_json::Value,
}

/// Outcome of a single reputation lookup.
///
/// Every failure mode of the external provider is folded into this type so
/// the correlator can decide on forwarding without handling transport errors
/// itself.
#[derive(Debug, Clone)]
pub enum ReputationOutcome {
    /// The provider knows the hash and returned a report.
    Found(ReputationReport),
    /// The provider definitively does not know the hash.
    NotFound,
    /// The lookup did not complete within its time bound.
    TimedOut,
    /// The provider was unreachable or answered with a protocol error.
    Failed(String),
}
