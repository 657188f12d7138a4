use std::time::Duration;

use serde::Deserialize;

use super::helpers::deserialize_duration_from_seconds;

fn default_threshold() -> usize {
    5
}

fn default_window_secs() -> Duration {
    Duration::from_secs(300)
}

fn default_max_window_entries() -> usize {
    10_000
}

/// Tuning for the spike correlator.
///
/// A spike is declared when strictly more than `threshold` alerts arrive
/// within `window_secs`.
#[derive(Debug, Deserialize, Clone)]
pub struct CorrelatorConfig {
    /// Alert count above which the window is considered a spike.
    #[serde(default = "default_threshold")]
    pub threshold: usize,

    /// Width of the sliding window.
    #[serde(
        default = "default_window_secs",
        deserialize_with = "deserialize_duration_from_seconds"
    )]
    pub window_secs: Duration,

    /// Hard cap on buffered window entries; a memory guard against burst
    /// rates that outrun eviction, set well above any realistic threshold.
    #[serde(default = "default_max_window_entries")]
    pub max_window_entries: usize,
}

impl Default for CorrelatorConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            window_secs: default_window_secs(),
            max_window_entries: default_max_window_entries(),
        }
    }
}
