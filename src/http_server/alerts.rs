//! Handler for the alert intake endpoint.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use super::{ApiError, ApiState};
use crate::models::RawAlert;

/// Receives one alert per call from file-monitoring agents.
///
/// Validation failures come back as 422; an accepted alert answers with the
/// correlator's decision and the downstream dispatch outcome, so agents can
/// distinguish "processed and delivered" from partial successes.
pub async fn submit_alert(
    State(state): State<ApiState>,
    Json(raw): Json<RawAlert>,
) -> Result<impl IntoResponse, ApiError> {
    let observation = state.ingestor.ingest(raw).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Alert received",
            "decision": observation.decision,
            "dispatch": observation.dispatch.label(),
            "enriched": observation.enriched,
        })),
    ))
}
