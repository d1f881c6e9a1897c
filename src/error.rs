//! Error types for the book index server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Postgres SQLSTATE for unique constraint violations
const UNIQUE_VIOLATION: &str = "23505";
/// Postgres SQLSTATE for values the column type cannot parse
const INVALID_TEXT_REPRESENTATION: &str = "22P02";

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Secret unavailable: {0}")]
    SecretUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Infrastructure failure reported with an operation-specific message
    #[error("{message}")]
    Failed {
        message: String,
        detail: Option<String>,
    },

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Index request failed: {0}")]
    IndexRequest(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AppError {
    /// Classify a failed insert by SQLSTATE.
    pub fn from_insert(err: sqlx::Error) -> Self {
        let code = match &err {
            sqlx::Error::Database(db_err) => db_err.code().map(|c| c.into_owned()),
            _ => None,
        };

        match code.as_deref() {
            Some(UNIQUE_VIOLATION) => {
                AppError::Conflict("A book with this ID already exists".to_string())
            }
            Some(INVALID_TEXT_REPRESENTATION) => {
                AppError::BadRequest("Invalid data format provided".to_string())
            }
            _ => AppError::Database(err),
        }
    }

    /// Replace infrastructure errors with a generic message for the caller.
    ///
    /// Client-correctable errors pass through untouched. The underlying error
    /// text is attached only when `expose_detail` is set.
    pub fn or_failed(self, message: &str, expose_detail: bool) -> Self {
        match self {
            AppError::Database(_) | AppError::SecretUnavailable(_) | AppError::Internal(_) => {
                tracing::error!("{}: {}", message, self);
                AppError::Failed {
                    message: message.to_string(),
                    detail: expose_detail.then(|| self.to_string()),
                }
            }
            other => other,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, error) = match self {
            AppError::Validation(msg) | AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, msg, None)
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            AppError::SecretUnavailable(msg) => {
                tracing::error!("Secret unavailable: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                    None,
                )
            }
            AppError::Failed { message, detail } => {
                (StatusCode::INTERNAL_SERVER_ERROR, message, detail)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::IndexRequest(msg) => (StatusCode::BAD_GATEWAY, msg, None),
        };

        (status, Json(ErrorResponse { message, error })).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
