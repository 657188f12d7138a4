//! HTTP intake surface.
//!
//! Agents talk to three endpoints: `POST /alert` for file-change events,
//! `POST /backup` for archive uploads, `GET /health` for liveness. Any
//! number of concurrent handlers funnel into the single-writer correlator
//! behind the ingestor.

mod alerts;
mod backups;
mod error;

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub use error::ApiError;

use crate::{artifact::ArtifactStore, config::ServerConfig, ingest::Ingestor};

/// Errors that prevent the HTTP server from starting.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured listen address could not be parsed.
    #[error("invalid listen address '{0}': {1}")]
    InvalidListenAddress(String, std::net::AddrParseError),

    /// Binding or serving failed.
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct ApiState {
    /// The alert intake pipeline entry point.
    pub ingestor: Arc<Ingestor>,
    /// Backup artifact storage.
    pub artifacts: Arc<dyn ArtifactStore>,
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Builds the application router.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/alert", post(alerts::submit_alert))
        .route("/backup", post(backups::submit_backup))
        .with_state(state)
}

/// Runs the HTTP server until the cancellation token fires.
pub async fn run_server(
    config: &ServerConfig,
    state: ApiState,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    let addr: SocketAddr = config
        .listen_address
        .parse()
        .map_err(|e| ServerError::InvalidListenAddress(config.listen_address.clone(), e))?;

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Alert intake server listening.");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    Ok(())
}
