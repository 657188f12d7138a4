//! Spike correlation.
//!
//! The correlator owns the only nontrivial state in the pipeline: a sliding
//! window of recent alerts and a two-state machine deciding, for every
//! incoming alert, between individual forwarding and spike suppression.
//!
//! The window mutation (evict, append, compare, transition) runs inside a
//! single-writer critical section; reputation lookups, summary generation
//! and sink delivery all happen after the lock is released, so a slow or
//! hung collaborator never stalls ingestion of the next alert.

mod window;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::{
    config::CorrelatorConfig,
    enrichment::{ReputationProvider, SummaryGenerator},
    models::{Alert, EnrichedAlert, ReputationOutcome, SpikeNotification, SpikeSummary},
    sinks::{NotificationPayload, SinkDispatcher, SinkError},
};

pub use window::AlertWindow;

/// Classification of one observed alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Below threshold: the alert is forwarded individually.
    Forward,
    /// Part of a spike: individual forwarding is suppressed.
    Suppressed,
}

/// Correlator state across alerts. One instance per process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpikeState {
    Normal,
    SpikeActive,
}

/// What happened downstream of the window decision.
#[derive(Debug)]
pub enum DispatchStatus {
    /// The alert, or the spike notification, reached the sink.
    Delivered,
    /// The reputation lookup failed hard; forwarding was withheld.
    Withheld(String),
    /// The sink rejected the delivery or was unreachable.
    Failed(SinkError),
    /// Nothing was sent: the alert joined an already-announced spike.
    Skipped,
}

impl DispatchStatus {
    /// Short label for API responses and logs.
    pub fn label(&self) -> &'static str {
        match self {
            DispatchStatus::Delivered => "delivered",
            DispatchStatus::Withheld(_) => "withheld",
            DispatchStatus::Failed(_) => "delivery_failed",
            DispatchStatus::Skipped => "skipped",
        }
    }
}

/// Per-alert result of [`SpikeCorrelator::observe`].
///
/// The alert was accepted and counted either way; `dispatch` distinguishes
/// "processed and delivered" from the partial successes.
#[derive(Debug)]
pub struct Observation {
    /// Forward or suppress.
    pub decision: Decision,
    /// Outcome of the downstream enrichment/delivery step.
    pub dispatch: DispatchStatus,
    /// Whether a reputation report was attached before forwarding.
    pub enriched: bool,
}

/// Outcome of the window critical section, computed before any outbound
/// call is made.
enum Verdict {
    Forward,
    SpikeStarted(SpikeSummary),
    SpikeOngoing,
}

struct CorrelatorState {
    window: AlertWindow,
    state: SpikeState,
}

impl CorrelatorState {
    /// Runs the evict-append-compare sequence for one arrival.
    ///
    /// A single `now` is used for both eviction passes and the comparison,
    /// so the boundary cannot flap between two instants taken within the
    /// same call.
    fn assess(&mut self, alert: Alert, now: DateTime<Utc>, threshold: usize) -> Verdict {
        self.window.evict(now);
        self.window.push(alert, now);
        self.window.evict(now);

        let count = self.window.len();
        if count > threshold {
            let episode_started = self.state == SpikeState::Normal;
            self.state = SpikeState::SpikeActive;
            match self.window.summarize() {
                Some(summary) if episode_started => Verdict::SpikeStarted(summary),
                _ => Verdict::SpikeOngoing,
            }
        } else {
            // Exact equality at the boundary is not a spike; the same `>`
            // governs entry and exit so there is no off-by-one flapping.
            self.state = SpikeState::Normal;
            Verdict::Forward
        }
    }
}

/// The stateful forward-vs-suppress decision maker.
pub struct SpikeCorrelator {
    state: Mutex<CorrelatorState>,
    threshold: usize,
    reputation: Option<Arc<dyn ReputationProvider>>,
    summarizer: Option<Arc<dyn SummaryGenerator>>,
    sink: Arc<SinkDispatcher>,
}

impl SpikeCorrelator {
    /// Creates a correlator with an empty window.
    ///
    /// `reputation` and `summarizer` are optional collaborators; without
    /// them alerts forward unenriched and spike notifications carry raw
    /// aggregates.
    pub fn new(
        config: &CorrelatorConfig,
        reputation: Option<Arc<dyn ReputationProvider>>,
        summarizer: Option<Arc<dyn SummaryGenerator>>,
        sink: Arc<SinkDispatcher>,
    ) -> Self {
        Self {
            state: Mutex::new(CorrelatorState {
                window: AlertWindow::new(config.window_secs, config.max_window_entries),
                state: SpikeState::Normal,
            }),
            threshold: config.threshold,
            reputation,
            summarizer,
            sink,
        }
    }

    /// Observes one alert: updates the window, then performs whatever
    /// enrichment and delivery the decision calls for.
    ///
    /// Enrichment and delivery failures are reported in the returned
    /// [`Observation`]; they never roll back the window.
    pub async fn observe(&self, alert: Alert) -> Observation {
        let now = Utc::now();
        let verdict = {
            let mut guard = self.state.lock().await;
            guard.assess(alert.clone(), now, self.threshold)
        };

        match verdict {
            Verdict::Forward => self.forward(alert).await,
            Verdict::SpikeStarted(summary) => {
                tracing::info!(
                    count = summary.count,
                    clients = summary.client_ids.len(),
                    "Alert spike detected; suppressing individual forwarding."
                );
                self.announce_spike(summary).await
            }
            Verdict::SpikeOngoing => Observation {
                decision: Decision::Suppressed,
                dispatch: DispatchStatus::Skipped,
                enriched: false,
            },
        }
    }

    /// Number of alerts currently inside the window.
    pub async fn window_len(&self) -> usize {
        self.state.lock().await.window.len()
    }

    async fn forward(&self, alert: Alert) -> Observation {
        let outcome = match (&self.reputation, alert.hash.as_deref()) {
            (Some(provider), Some(hash)) => Some(provider.lookup(hash).await),
            _ => None,
        };

        let reputation = match outcome {
            None | Some(ReputationOutcome::NotFound) => None,
            Some(ReputationOutcome::Found(report)) => Some(report.report),
            Some(ReputationOutcome::TimedOut) => {
                tracing::warn!(
                    client_id = %alert.client_id,
                    "Reputation lookup timed out; forwarding unenriched."
                );
                None
            }
            Some(ReputationOutcome::Failed(reason)) => {
                tracing::warn!(
                    client_id = %alert.client_id,
                    reason = %reason,
                    "Reputation lookup failed; withholding alert from forwarding."
                );
                return Observation {
                    decision: Decision::Forward,
                    dispatch: DispatchStatus::Withheld(reason),
                    enriched: false,
                };
            }
        };

        let enriched = reputation.is_some();
        let payload = NotificationPayload::Alert(EnrichedAlert { alert, reputation });
        match self.sink.deliver(&payload).await {
            Ok(()) => Observation {
                decision: Decision::Forward,
                dispatch: DispatchStatus::Delivered,
                enriched,
            },
            Err(e) => Observation {
                decision: Decision::Forward,
                dispatch: DispatchStatus::Failed(e),
                enriched,
            },
        }
    }

    async fn announce_spike(&self, summary: SpikeSummary) -> Observation {
        let narrative = match &self.summarizer {
            None => None,
            Some(generator) => match generator.summarize(&summary).await {
                Ok(prose) => Some(prose),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Spike summary generation failed; sending raw aggregate."
                    );
                    None
                }
            },
        };

        let payload = NotificationPayload::Spike(SpikeNotification { summary, narrative });
        match self.sink.deliver(&payload).await {
            Ok(()) => Observation {
                decision: Decision::Suppressed,
                dispatch: DispatchStatus::Delivered,
                enriched: false,
            },
            Err(e) => Observation {
                decision: Decision::Suppressed,
                dispatch: DispatchStatus::Failed(e),
                enriched: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use super::*;
    use crate::{
        enrichment::{MockReputationProvider, MockSummaryGenerator, SummaryError},
        models::ReputationReport,
        sinks::MockNotificationSink,
        test_helpers::AlertBuilder,
    };

    fn config(threshold: usize, window: StdDuration) -> CorrelatorConfig {
        CorrelatorConfig {
            threshold,
            window_secs: window,
            max_window_entries: 10_000,
        }
    }

    fn correlator_with_sink(
        threshold: usize,
        window: StdDuration,
        sink: MockNotificationSink,
    ) -> SpikeCorrelator {
        SpikeCorrelator::new(
            &config(threshold, window),
            None,
            None,
            Arc::new(SinkDispatcher::new(Box::new(sink))),
        )
    }

    #[tokio::test]
    async fn alerts_below_threshold_forward() {
        let mut sink = MockNotificationSink::new();
        sink.expect_deliver()
            .times(3)
            .withf(|p| matches!(p, NotificationPayload::Alert(_)))
            .returning(|_| Ok(()));

        let correlator = correlator_with_sink(3, StdDuration::from_secs(300), sink);
        for _ in 0..3 {
            let observation = correlator.observe(AlertBuilder::new().build()).await;
            assert_eq!(observation.decision, Decision::Forward);
            assert!(matches!(observation.dispatch, DispatchStatus::Delivered));
        }
        assert_eq!(correlator.window_len().await, 3);
    }

    #[tokio::test]
    async fn fourth_alert_over_threshold_is_suppressed_with_one_spike_notification() {
        let mut sink = MockNotificationSink::new();
        sink.expect_deliver()
            .times(3)
            .withf(|p| matches!(p, NotificationPayload::Alert(_)))
            .returning(|_| Ok(()));
        sink.expect_deliver()
            .times(1)
            .withf(|p| match p {
                NotificationPayload::Spike(notification) => notification.summary.count == 4,
                _ => false,
            })
            .returning(|_| Ok(()));

        let correlator = correlator_with_sink(3, StdDuration::from_secs(300), sink);
        for _ in 0..3 {
            let observation = correlator.observe(AlertBuilder::new().build()).await;
            assert_eq!(observation.decision, Decision::Forward);
        }
        let fourth = correlator.observe(AlertBuilder::new().build()).await;
        assert_eq!(fourth.decision, Decision::Suppressed);
        assert!(matches!(fourth.dispatch, DispatchStatus::Delivered));

        // A fifth alert joins the ongoing spike without another notification.
        let fifth = correlator.observe(AlertBuilder::new().build()).await;
        assert_eq!(fifth.decision, Decision::Suppressed);
        assert!(matches!(fifth.dispatch, DispatchStatus::Skipped));
    }

    #[tokio::test]
    async fn recovery_after_window_expiry_resumes_forwarding() {
        let mut sink = MockNotificationSink::new();
        sink.expect_deliver()
            .withf(|p| matches!(p, NotificationPayload::Alert(_)))
            .times(2)
            .returning(|_| Ok(()));
        sink.expect_deliver()
            .withf(|p| matches!(p, NotificationPayload::Spike(_)))
            .times(1)
            .returning(|_| Ok(()));

        let correlator = correlator_with_sink(1, StdDuration::from_millis(100), sink);

        let first = correlator.observe(AlertBuilder::new().build()).await;
        assert_eq!(first.decision, Decision::Forward);

        let second = correlator.observe(AlertBuilder::new().build()).await;
        assert_eq!(second.decision, Decision::Suppressed);

        tokio::time::sleep(StdDuration::from_millis(150)).await;

        let third = correlator.observe(AlertBuilder::new().build()).await;
        assert_eq!(third.decision, Decision::Forward);
        assert_eq!(correlator.window_len().await, 1);
    }

    #[tokio::test]
    async fn a_new_episode_after_recovery_notifies_again() {
        let mut sink = MockNotificationSink::new();
        sink.expect_deliver()
            .withf(|p| matches!(p, NotificationPayload::Spike(_)))
            .times(2)
            .returning(|_| Ok(()));
        sink.expect_deliver()
            .withf(|p| matches!(p, NotificationPayload::Alert(_)))
            .returning(|_| Ok(()));

        let correlator = correlator_with_sink(1, StdDuration::from_millis(100), sink);

        correlator.observe(AlertBuilder::new().build()).await;
        let spike1 = correlator.observe(AlertBuilder::new().build()).await;
        assert_eq!(spike1.decision, Decision::Suppressed);

        tokio::time::sleep(StdDuration::from_millis(150)).await;

        correlator.observe(AlertBuilder::new().build()).await;
        let spike2 = correlator.observe(AlertBuilder::new().build()).await;
        assert_eq!(spike2.decision, Decision::Suppressed);
        assert!(matches!(spike2.dispatch, DispatchStatus::Delivered));
    }

    #[tokio::test]
    async fn found_reputation_enriches_forwarded_alert() {
        let mut provider = MockReputationProvider::new();
        provider.expect_lookup().times(1).returning(|hash| {
            ReputationOutcome::Found(ReputationReport {
                hash: hash.to_string(),
                report: serde_json::json!({ "positives": 5 }),
            })
        });

        let mut sink = MockNotificationSink::new();
        sink.expect_deliver()
            .times(1)
            .withf(|p| match p {
                NotificationPayload::Alert(enriched) => enriched.reputation.is_some(),
                _ => false,
            })
            .returning(|_| Ok(()));

        let correlator = SpikeCorrelator::new(
            &config(3, StdDuration::from_secs(300)),
            Some(Arc::new(provider)),
            None,
            Arc::new(SinkDispatcher::new(Box::new(sink))),
        );

        let observation = correlator.observe(AlertBuilder::new().build()).await;
        assert_eq!(observation.decision, Decision::Forward);
        assert!(observation.enriched);
    }

    #[tokio::test]
    async fn lookup_timeout_still_forwards_unenriched() {
        let mut provider = MockReputationProvider::new();
        provider.expect_lookup().times(1).returning(|_| ReputationOutcome::TimedOut);

        let mut sink = MockNotificationSink::new();
        sink.expect_deliver()
            .times(1)
            .withf(|p| match p {
                NotificationPayload::Alert(enriched) => enriched.reputation.is_none(),
                _ => false,
            })
            .returning(|_| Ok(()));

        let correlator = SpikeCorrelator::new(
            &config(3, StdDuration::from_secs(300)),
            Some(Arc::new(provider)),
            None,
            Arc::new(SinkDispatcher::new(Box::new(sink))),
        );

        let observation = correlator.observe(AlertBuilder::new().build()).await;
        assert_eq!(observation.decision, Decision::Forward);
        assert!(matches!(observation.dispatch, DispatchStatus::Delivered));
        assert!(!observation.enriched);
    }

    #[tokio::test]
    async fn hard_lookup_failure_withholds_forwarding() {
        let mut provider = MockReputationProvider::new();
        provider
            .expect_lookup()
            .times(1)
            .returning(|_| ReputationOutcome::Failed("connection refused".to_string()));

        let mut sink = MockNotificationSink::new();
        sink.expect_deliver().times(0);

        let correlator = SpikeCorrelator::new(
            &config(3, StdDuration::from_secs(300)),
            Some(Arc::new(provider)),
            None,
            Arc::new(SinkDispatcher::new(Box::new(sink))),
        );

        let observation = correlator.observe(AlertBuilder::new().build()).await;
        assert_eq!(observation.decision, Decision::Forward);
        assert!(matches!(observation.dispatch, DispatchStatus::Withheld(_)));
        // The withheld alert still entered the window.
        assert_eq!(correlator.window_len().await, 1);
    }

    #[tokio::test]
    async fn deleted_alert_without_hash_skips_lookup() {
        let mut provider = MockReputationProvider::new();
        provider.expect_lookup().times(0);

        let mut sink = MockNotificationSink::new();
        sink.expect_deliver().times(1).returning(|_| Ok(()));

        let correlator = SpikeCorrelator::new(
            &config(3, StdDuration::from_secs(300)),
            Some(Arc::new(provider)),
            None,
            Arc::new(SinkDispatcher::new(Box::new(sink))),
        );

        let alert = AlertBuilder::new().deleted().build();
        let observation = correlator.observe(alert).await;
        assert_eq!(observation.decision, Decision::Forward);
        assert!(matches!(observation.dispatch, DispatchStatus::Delivered));
    }

    #[tokio::test]
    async fn spike_notification_carries_generated_narrative() {
        let mut summarizer = MockSummaryGenerator::new();
        summarizer
            .expect_summarize()
            .times(1)
            .returning(|_| Ok("A burst of changes.".to_string()));

        let mut sink = MockNotificationSink::new();
        sink.expect_deliver()
            .withf(|p| matches!(p, NotificationPayload::Alert(_)))
            .returning(|_| Ok(()));
        sink.expect_deliver()
            .times(1)
            .withf(|p| match p {
                NotificationPayload::Spike(notification) => {
                    notification.narrative.as_deref() == Some("A burst of changes.")
                }
                _ => false,
            })
            .returning(|_| Ok(()));

        let correlator = SpikeCorrelator::new(
            &config(1, StdDuration::from_secs(300)),
            None,
            Some(Arc::new(summarizer)),
            Arc::new(SinkDispatcher::new(Box::new(sink))),
        );

        correlator.observe(AlertBuilder::new().build()).await;
        let spike = correlator.observe(AlertBuilder::new().build()).await;
        assert_eq!(spike.decision, Decision::Suppressed);
    }

    #[tokio::test]
    async fn failed_summary_degrades_to_raw_aggregate() {
        let mut summarizer = MockSummaryGenerator::new();
        summarizer
            .expect_summarize()
            .times(1)
            .returning(|_| Err(SummaryError::Request("unreachable".to_string())));

        let mut sink = MockNotificationSink::new();
        sink.expect_deliver()
            .withf(|p| matches!(p, NotificationPayload::Alert(_)))
            .returning(|_| Ok(()));
        sink.expect_deliver()
            .times(1)
            .withf(|p| match p {
                NotificationPayload::Spike(notification) => notification.narrative.is_none(),
                _ => false,
            })
            .returning(|_| Ok(()));

        let correlator = SpikeCorrelator::new(
            &config(1, StdDuration::from_secs(300)),
            None,
            Some(Arc::new(summarizer)),
            Arc::new(SinkDispatcher::new(Box::new(sink))),
        );

        correlator.observe(AlertBuilder::new().build()).await;
        let spike = correlator.observe(AlertBuilder::new().build()).await;
        assert!(matches!(spike.dispatch, DispatchStatus::Delivered));
    }

    #[tokio::test]
    async fn sink_failure_is_reported_without_corrupting_the_window() {
        let mut sink = MockNotificationSink::new();
        sink.expect_deliver()
            .times(2)
            .returning(|_| Err(SinkError::Internal("sink down".to_string())));

        let correlator = correlator_with_sink(3, StdDuration::from_secs(300), sink);

        let first = correlator.observe(AlertBuilder::new().build()).await;
        assert_eq!(first.decision, Decision::Forward);
        assert!(matches!(first.dispatch, DispatchStatus::Failed(_)));

        let second = correlator.observe(AlertBuilder::new().build()).await;
        assert_eq!(second.decision, Decision::Forward);
        assert_eq!(correlator.window_len().await, 2);
    }
}
