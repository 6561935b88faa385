//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::DomainError;
use crate::repository::{RepositoryError, SequenceError};

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Validation failed")]
    Validation(Vec<String>),

    #[error("Customer not found: {0}")]
    CustomerNotFound(Uuid),

    #[error("Concurrency conflict: customer {0} was modified by someone else")]
    ConcurrencyConflict(Uuid),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Infrastructure errors
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Sequence(#[from] SequenceError),

    // Server errors (5xx)
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl AppError {
    /// Build a validation error from `validator` output, one message per line
    pub fn from_validation(errors: &validator::ValidationErrors) -> Self {
        AppError::Validation(validation_messages(errors))
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        self.parts().0
    }

    fn parts(&self) -> (StatusCode, &'static str, Option<String>, Option<Vec<String>>) {
        match self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()), None)
            }
            AppError::Validation(messages) => {
                (StatusCode::BAD_REQUEST, "validation_failed", None, Some(messages.clone()))
            }

            // 404 Not Found
            AppError::CustomerNotFound(id) => {
                (StatusCode::NOT_FOUND, "customer_not_found", Some(id.to_string()), None)
            }

            // 409 Conflict
            AppError::ConcurrencyConflict(id) => {
                (StatusCode::CONFLICT, "concurrency_conflict", Some(id.to_string()), None)
            }

            // Domain errors - map to appropriate HTTP status
            AppError::Domain(domain_err) => match domain_err {
                DomainError::Validation(messages) => {
                    (StatusCode::BAD_REQUEST, "validation_failed", None, Some(messages.clone()))
                }
                DomainError::AddressNotFound(id) => {
                    (StatusCode::BAD_REQUEST, "address_not_found", Some(id.to_string()), None)
                }
                DomainError::BusinessRuleViolation(msg) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "business_rule_violation",
                    Some(msg.clone()),
                    None,
                ),
            },

            AppError::Repository(repo_err) => match repo_err {
                RepositoryError::NotFound(id) => {
                    (StatusCode::NOT_FOUND, "customer_not_found", Some(id.to_string()), None)
                }
                RepositoryError::ConcurrencyConflict { id, .. } => {
                    (StatusCode::CONFLICT, "concurrency_conflict", Some(id.to_string()), None)
                }
                RepositoryError::Duplicate(constraint) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "business_rule_violation",
                    Some(format!("Duplicate value violates {}", constraint)),
                    None,
                ),
                RepositoryError::InvalidData(_)
                | RepositoryError::Database(_)
                | RepositoryError::Serialization(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", None, None)
                }
            },

            // 500 Internal Server Error
            AppError::Sequence(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "sequence_error", None, None)
            }
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None, None),
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None, None),
        }
    }
}

/// Flatten `validator` output into one message per line
pub(crate) fn validation_messages(errors: &validator::ValidationErrors) -> Vec<String> {
    errors
        .to_string()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<String>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details, messages) = self.parts();

        let error = if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error,
            error_code: error_code.to_string(),
            details,
            messages,
        };

        (status, Json(body)).into_response()
    }
}
