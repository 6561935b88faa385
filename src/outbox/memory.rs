//! In-memory outbox, shared with the in-memory customer repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{OutboxError, OutboxMessage, OutboxStatus, OutboxStore};

#[derive(Debug, Clone, Default)]
pub struct InMemoryOutbox {
    messages: Arc<RwLock<Vec<OutboxMessage>>>,
}

impl InMemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append messages (called by the repository while it holds its own lock)
    pub async fn enqueue(&self, messages: Vec<OutboxMessage>) {
        self.messages.write().await.extend(messages);
    }

    /// Snapshot of every stored message
    pub async fn messages(&self) -> Vec<OutboxMessage> {
        self.messages.read().await.clone()
    }
}

#[async_trait]
impl OutboxStore for InMemoryOutbox {
    async fn fetch_pending(&self, limit: u32) -> Result<Vec<OutboxMessage>, OutboxError> {
        let messages = self.messages.read().await;
        let mut pending: Vec<_> = messages
            .iter()
            .filter(|m| m.status == OutboxStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|m| m.created_at);
        pending.truncate(limit as usize);
        Ok(pending)
    }

    async fn mark_processed(&self, id: Uuid) -> Result<(), OutboxError> {
        let mut messages = self.messages.write().await;
        let message = messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(OutboxError::NotFound(id))?;

        message.status = OutboxStatus::Processed;
        message.processed_at = Some(Utc::now());
        Ok(())
    }

    async fn mark_attempt_failed(
        &self,
        id: Uuid,
        error: &str,
        max_attempts: i32,
    ) -> Result<OutboxStatus, OutboxError> {
        let mut messages = self.messages.write().await;
        let message = messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(OutboxError::NotFound(id))?;

        message.record_failure(error, max_attempts);
        Ok(message.status)
    }

    async fn purge_processed(&self, older_than: DateTime<Utc>) -> Result<u64, OutboxError> {
        let mut messages = self.messages.write().await;
        let before = messages.len();
        messages.retain(|m| {
            !(m.status == OutboxStatus::Processed
                && m.processed_at.is_some_and(|at| at < older_than))
        });
        Ok((before - messages.len()) as u64)
    }

    async fn pending_count(&self) -> Result<u64, OutboxError> {
        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .filter(|m| m.status == OutboxStatus::Pending)
            .count() as u64)
    }
}
