use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gitpulse_core::CoreError;
use gitpulse_events::ingest::IngestError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps domain and ingest errors and implements [`IntoResponse`] to
/// produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `gitpulse_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A webhook ingest failure.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            AppError::Ingest(ingest) => match ingest {
                IngestError::InvalidSignature => (
                    StatusCode::BAD_REQUEST,
                    "INVALID_SIGNATURE",
                    "Webhook signature verification failed".to_string(),
                ),
                IngestError::InvalidPayload => (
                    StatusCode::BAD_REQUEST,
                    "INVALID_PAYLOAD",
                    "Webhook payload is not valid JSON".to_string(),
                ),
                IngestError::Database(e) => {
                    tracing::error!(error = %e, "Storage failure during ingest");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "Failed to process webhook delivery".to_string(),
                    )
                }
            },

            AppError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
