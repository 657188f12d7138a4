//! Handler for the backup intake endpoint.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use super::{ApiError, ApiState};

/// Receives and stores one backup archive as multipart form data.
///
/// Expected fields: `client_id` (required), `file` (required), `timestamp`
/// and `filename` (optional, defaulted). Distinct names never require prior
/// registration.
pub async fn submit_backup(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut client_id = None;
    let mut timestamp = None;
    let mut filename = None;
    let mut bytes = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::UnprocessableEntity(format!("malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("client_id") => client_id = Some(read_text(field).await?),
            Some("timestamp") => timestamp = Some(read_text(field).await?),
            Some("filename") => filename = Some(read_text(field).await?),
            Some("file") => {
                if filename.is_none() {
                    filename = field.file_name().map(str::to_string);
                }
                bytes = Some(field.bytes().await.map_err(|e| {
                    ApiError::UnprocessableEntity(format!("failed to read file field: {e}"))
                })?);
            }
            _ => {}
        }
    }

    let client_id = client_id
        .ok_or_else(|| ApiError::UnprocessableEntity("No client ID provided".to_string()))?;
    let bytes =
        bytes.ok_or_else(|| ApiError::UnprocessableEntity("No file provided".to_string()))?;
    let timestamp = timestamp.unwrap_or_else(|| "unknown".to_string());
    let filename = filename.unwrap_or_else(|| "backup.zip".to_string());

    let stored = state.artifacts.store(&client_id, &timestamp, &filename, &bytes).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "message": format!("Backup stored as {}", stored.stored_name),
            "artifact": stored,
        })),
    ))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::UnprocessableEntity(format!("malformed field: {e}")))
}
