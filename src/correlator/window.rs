//! Sliding time window over recently observed alerts.

use std::collections::VecDeque;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};

use crate::models::{Alert, SpikeSummary};

/// One buffered observation: the alert and the instant the correlator saw
/// it. Arrival time, not the agent-reported event time, drives eviction.
#[derive(Debug, Clone)]
pub(crate) struct WindowEntry {
    pub alert: Alert,
    pub arrival: DateTime<Utc>,
}

/// The trailing window of alerts used for spike detection.
///
/// Entries are ordered by arrival ascending; arrivals are monotonic because
/// a single writer owns the window. Two invariants hold at every read:
/// every entry's arrival is within the window duration of the eviction
/// instant, and the buffer never exceeds `max_entries`.
#[derive(Debug)]
pub struct AlertWindow {
    entries: VecDeque<WindowEntry>,
    duration: Duration,
    max_entries: usize,
}

impl AlertWindow {
    /// Creates an empty window of the given width.
    ///
    /// `max_entries` caps memory under pathological burst rates; when the
    /// cap is hit the oldest entry is dropped to admit the newest.
    pub fn new(duration: StdDuration, max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            duration: Duration::from_std(duration).unwrap_or(Duration::MAX),
            max_entries: max_entries.max(1),
        }
    }

    /// Removes every entry whose arrival is older than the window relative
    /// to `now`. Calling this twice with the same `now` is a no-op the
    /// second time.
    pub fn evict(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.duration;
        while let Some(front) = self.entries.front() {
            if front.arrival < cutoff {
                self.entries.pop_front();
            } else {
                break;
            }
        }
    }

    /// Appends an alert observed at `arrival`, enforcing the entry cap.
    pub fn push(&mut self, alert: Alert, arrival: DateTime<Utc>) {
        while self.entries.len() >= self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(WindowEntry { alert, arrival });
    }

    /// Number of alerts currently buffered.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the window holds no alerts.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds the aggregate description of the current window contents.
    /// Returns `None` when the window is empty.
    pub fn summarize(&self) -> Option<SpikeSummary> {
        let first = self.entries.front()?;
        let last = self.entries.back()?;
        Some(SpikeSummary {
            count: self.entries.len(),
            severities: self.entries.iter().map(|e| e.alert.severity).collect(),
            event_types: self.entries.iter().map(|e| e.alert.event_type).collect(),
            client_ids: self.entries.iter().map(|e| e.alert.client_id.clone()).collect(),
            window_start: first.arrival,
            window_end: last.arrival,
        })
    }
}
