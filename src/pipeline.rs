//! Wires the pipeline together and supervises its lifetime.
//!
//! Construction order follows the data flow: HTTP client pool, enrichment
//! collaborators, sink dispatcher, correlator, ingestor, intake server. The
//! pipeline owns a cancellation token; SIGINT/SIGTERM trigger a graceful
//! shutdown of the intake server.

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::{
    artifact::FsArtifactStore,
    config::AppConfig,
    correlator::SpikeCorrelator,
    enrichment::{
        HttpReputationProvider, HttpSummaryGenerator, ReputationProvider, SummaryGenerator,
    },
    http_client::{HttpClientPool, HttpClientPoolError},
    http_server::{ApiState, ServerError, run_server},
    ingest::Ingestor,
    sinks::{SinkDispatcher, SinkError},
};

/// Errors raised while building or running the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The notification sink could not be constructed.
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    /// An outbound HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] HttpClientPoolError),

    /// The intake server failed to start or crashed.
    #[error("server error: {0}")]
    Server(#[from] ServerError),
}

/// The assembled service.
pub struct Pipeline {
    config: Arc<AppConfig>,
    ingestor: Arc<Ingestor>,
    artifacts: Arc<FsArtifactStore>,
    cancellation_token: CancellationToken,
}

impl Pipeline {
    /// Builds the full pipeline from configuration.
    pub async fn from_config(config: AppConfig) -> Result<Self, PipelineError> {
        let client_pool = HttpClientPool::new(config.http_base.clone());

        let reputation: Option<Arc<dyn ReputationProvider>> = match &config.enrichment {
            Some(enrichment_config) => {
                let client = client_pool.get_or_create(&enrichment_config.retry_policy).await?;
                tracing::info!(base_url = %enrichment_config.base_url, "Reputation lookups enabled.");
                Some(Arc::new(HttpReputationProvider::new(enrichment_config, client)))
            }
            None => {
                tracing::info!("No reputation provider configured; alerts forward unenriched.");
                None
            }
        };

        let summarizer: Option<Arc<dyn SummaryGenerator>> = match &config.summarizer {
            Some(summarizer_config) => {
                let client = client_pool.get_or_create(&summarizer_config.retry_policy).await?;
                Some(Arc::new(HttpSummaryGenerator::new(summarizer_config, client)))
            }
            None => None,
        };

        let sink = Arc::new(SinkDispatcher::from_config(&config.sink, &client_pool).await?);
        let correlator =
            Arc::new(SpikeCorrelator::new(&config.correlator, reputation, summarizer, sink));
        let ingestor = Arc::new(Ingestor::new(correlator));
        let artifacts = Arc::new(FsArtifactStore::new(&config.storage.backup_dir));

        Ok(Self {
            config: Arc::new(config),
            ingestor,
            artifacts,
            cancellation_token: CancellationToken::new(),
        })
    }

    /// A token observers can use to stop the pipeline.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Runs the intake server until a shutdown signal arrives.
    ///
    /// On shutdown, open connections get `shutdown_timeout` to drain before
    /// the server is abandoned.
    pub async fn run(self) -> Result<(), PipelineError> {
        let token = self.cancellation_token.clone();
        tokio::spawn(async move {
            wait_for_shutdown_signal().await;
            tracing::info!("Shutdown signal received; stopping intake server.");
            token.cancel();
        });

        let state = ApiState {
            ingestor: self.ingestor.clone(),
            artifacts: self.artifacts.clone(),
        };
        let serve = run_server(&self.config.server, state, self.cancellation_token.clone());
        tokio::pin!(serve);

        let deadline = async {
            self.cancellation_token.cancelled().await;
            tokio::time::sleep(self.config.shutdown_timeout).await;
        };

        tokio::select! {
            result = &mut serve => result?,
            _ = deadline => {
                tracing::warn!(
                    timeout = ?self.config.shutdown_timeout,
                    "Graceful shutdown timed out; abandoning open connections."
                );
            }
        }

        tracing::info!("Pipeline stopped.");
        Ok(())
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler.");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = sigterm.recv() => {},
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
