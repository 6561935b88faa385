//! Repository Errors
//!
//! Error types for customer persistence.

use uuid::Uuid;

/// Errors that can occur in a customer repository
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Aggregate not found
    #[error("Customer not found: {0}")]
    NotFound(Uuid),

    /// Optimistic concurrency conflict
    #[error("Concurrency conflict for customer {id}: token {expected} is stale")]
    ConcurrencyConflict { id: Uuid, expected: Uuid },

    /// Unique constraint violated (id, email or number)
    #[error("Duplicate customer: {0}")]
    Duplicate(String),

    /// Stored data could not be turned back into an aggregate
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RepositoryError {
    /// Check if this error is a missing aggregate
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound(_))
    }

    /// Check if this error is a concurrency conflict
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, RepositoryError::ConcurrencyConflict { .. })
    }

    /// Map a unique-constraint violation to `Duplicate`, keep anything else
    pub(crate) fn from_write(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::Duplicate(db.constraint().unwrap_or("unique").to_string())
            }
            _ => RepositoryError::Database(err),
        }
    }
}
