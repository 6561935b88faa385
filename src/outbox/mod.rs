//! Outbox module
//!
//! Domain events are stored as outbox messages in the same transaction as
//! the aggregate change and later dispatched by the `OutboxProcessor`.

mod memory;
mod postgres;
mod processor;

pub use memory::InMemoryOutbox;
pub use postgres::PgOutboxStore;
pub use processor::{CustomerEventLogHandler, DomainEventHandler, OutboxProcessor, ProcessReport};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::DomainEvent;

/// Delivery state of an outbox message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutboxStatus {
    Pending,
    Processed,
    Failed,
}

impl OutboxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxStatus::Pending => "pending",
            OutboxStatus::Processed => "processed",
            OutboxStatus::Failed => "failed",
        }
    }
}

impl FromStr for OutboxStatus {
    type Err = OutboxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OutboxStatus::Pending),
            "processed" => Ok(OutboxStatus::Processed),
            "failed" => Ok(OutboxStatus::Failed),
            other => Err(OutboxError::InvalidStatus(other.to_string())),
        }
    }
}

/// A stored domain event awaiting dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxMessage {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: Uuid,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub status: OutboxStatus,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl OutboxMessage {
    /// Build a pending message from a domain event (the event id becomes the message id)
    pub fn pending<E: DomainEvent>(aggregate_type: &str, event: &E) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: event.event_id(),
            aggregate_type: aggregate_type.to_string(),
            aggregate_id: event.aggregate_id(),
            event_type: event.event_type().to_string(),
            payload: serde_json::to_value(event)?,
            status: OutboxStatus::Pending,
            attempts: 0,
            last_error: None,
            created_at: event.occurred_at(),
            processed_at: None,
        })
    }

    /// Decode the payload back into a domain event
    pub fn decode<E: DomainEvent>(&self) -> Result<E, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }

    /// Apply a failed attempt; the message fails for good after `max_attempts`
    fn record_failure(&mut self, error: &str, max_attempts: i32) {
        self.attempts += 1;
        self.last_error = Some(error.to_string());
        if self.attempts >= max_attempts {
            self.status = OutboxStatus::Failed;
        }
    }
}

/// Storage of outbox messages
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Oldest pending messages first
    async fn fetch_pending(&self, limit: u32) -> Result<Vec<OutboxMessage>, OutboxError>;

    async fn mark_processed(&self, id: Uuid) -> Result<(), OutboxError>;

    /// Record a failed attempt and return the resulting status
    async fn mark_attempt_failed(
        &self,
        id: Uuid,
        error: &str,
        max_attempts: i32,
    ) -> Result<OutboxStatus, OutboxError>;

    /// Delete processed messages older than the cutoff
    async fn purge_processed(&self, older_than: DateTime<Utc>) -> Result<u64, OutboxError>;

    async fn pending_count(&self) -> Result<u64, OutboxError>;
}

/// Outbox errors
#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    #[error("Outbox message not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid outbox status: {0}")]
    InvalidStatus(String),

    #[error("Handler {handler} failed: {message}")]
    Handler { handler: &'static str, message: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
