use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::checker::decoder::DecodeError;
use crate::checker::delegate::DelegateError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every body carries an `error` key; `details` is added where there is
/// something more specific to report.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("No resume file uploaded")]
    MissingFile,

    #[error("File upload failed: {0}")]
    Upload(String),

    #[error("Scoring script failed (exit code {exit_code:?})")]
    ScriptFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Scoring script timed out after {0}s")]
    ScriptTimedOut(u64),

    #[error("Invalid scoring output: {0}")]
    InvalidOutput(String),

    /// The scorer ran fine but reported a problem with the input.
    /// The payload is forwarded to the caller as-is.
    #[error("Scoring script rejected the resume")]
    Rejected(Value),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<DelegateError> for AppError {
    fn from(err: DelegateError) -> Self {
        match err {
            DelegateError::Failed { exit_code, stderr } => {
                AppError::ScriptFailed { exit_code, stderr }
            }
            DelegateError::TimedOut(limit) => AppError::ScriptTimedOut(limit.as_secs()),
            other => AppError::Internal(other.into()),
        }
    }
}

impl From<DecodeError> for AppError {
    fn from(err: DecodeError) -> Self {
        AppError::InvalidOutput(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                json!({ "error": "Method not allowed" }),
            ),
            AppError::MissingFile => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "No resume file uploaded" }),
            ),
            AppError::Rejected(payload) => (StatusCode::BAD_REQUEST, payload),
            AppError::Upload(details) => {
                tracing::error!("Upload error: {details}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "File upload failed", "details": details }),
                )
            }
            AppError::ScriptFailed { exit_code, stderr } => {
                tracing::error!("Scoring script exited with {exit_code:?}");
                let details = if stderr.trim().is_empty() {
                    "Unknown error".to_string()
                } else {
                    stderr
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "Scoring script failed",
                        "details": details,
                        "exitCode": exit_code
                    }),
                )
            }
            AppError::ScriptTimedOut(secs) => {
                tracing::error!("Scoring script timed out after {secs}s");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "Scoring script timed out",
                        "details": format!("no result within {secs} seconds")
                    }),
                )
            }
            AppError::InvalidOutput(details) => {
                tracing::error!("Invalid scoring output: {details}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Invalid scoring output", "details": details }),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Database error", "details": "A database error occurred" }),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Server error", "details": e.to_string() }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
