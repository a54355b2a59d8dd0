use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use reelgen_core::error::CoreError;
use reelgen_pipeline::GenerateError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`GenerateError`] for
/// workflow failures, and adds HTTP-specific variants. Implements
/// [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `reelgen-core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A workflow failure from `reelgen-pipeline`.
    #[error(transparent)]
    Generate(#[from] GenerateError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- Workflow errors ---
            AppError::Generate(err) => classify_generate_error(err),

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a workflow failure into an HTTP status, error code, and
/// caller-facing message.
///
/// Precondition failures map to 4xx with a clear message and no credit
/// spent. Everything after the credit spend has already been refunded
/// by the workflow; provider detail stays in the logs and the caller
/// sees only the generic kind.
fn classify_generate_error(err: &GenerateError) -> (StatusCode, &'static str, String) {
    match err {
        GenerateError::InsufficientCredits => (
            StatusCode::PAYMENT_REQUIRED,
            "INSUFFICIENT_CREDITS",
            "Not enough credits to start a generation".to_string(),
        ),
        GenerateError::UserNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "No credit account exists for this user".to_string(),
        ),
        GenerateError::GenerationFailed(detail) => {
            tracing::warn!(detail = %detail, "Generation failed");
            (
                StatusCode::BAD_GATEWAY,
                "GENERATION_FAILED",
                "Video generation failed. Your credit has been refunded".to_string(),
            )
        }
        GenerateError::GenerationTimeout(wait) => {
            tracing::warn!(waited_secs = wait.as_secs(), "Generation timed out");
            (
                StatusCode::GATEWAY_TIMEOUT,
                "GENERATION_TIMEOUT",
                "Video generation timed out. Your credit has been refunded".to_string(),
            )
        }
        GenerateError::Cancelled => (
            StatusCode::SERVICE_UNAVAILABLE,
            "CANCELLED",
            "Generation was cancelled. Your credit has been refunded".to_string(),
        ),
        GenerateError::DownloadFailed(detail)
        | GenerateError::UploadFailed(detail)
        | GenerateError::PersistenceError(detail)
        | GenerateError::LedgerUnavailable(detail) => {
            tracing::error!(error = %err, detail = %detail, "Workflow infrastructure error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}
