//! Defines the custom `ApiError` type for the HTTP server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::{artifact::ArtifactError, ingest::ValidationError};

/// A custom error type for the API that can be converted into an HTTP
/// response.
pub enum ApiError {
    /// The submitted record failed validation.
    UnprocessableEntity(String),

    /// A generic internal server error.
    InternalServerError(String),
}

/// Converts a `ValidationError` into an `ApiError` so handlers can use the
/// `?` operator on the ingest path.
impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::UnprocessableEntity(err.to_string())
    }
}

impl From<ArtifactError> for ApiError {
    fn from(err: ArtifactError) -> Self {
        match err {
            ArtifactError::InvalidName(_) => ApiError::UnprocessableEntity(err.to_string()),
            ArtifactError::Io(_) => ApiError::InternalServerError(err.to_string()),
        }
    }
}

/// Maps internal application errors to user-facing HTTP responses.
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ApiError::UnprocessableEntity(message) => {
                (StatusCode::UNPROCESSABLE_ENTITY, json!({ "error": message }))
            }
            ApiError::InternalServerError(err) => {
                tracing::error!("Internal server error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "An internal server error occurred" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
