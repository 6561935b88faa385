//! Outbox Processor
//!
//! Dispatches pending outbox messages to the registered in-process event
//! handlers and records the outcome on each message.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{CustomerEvent, DomainEvent};

use super::{OutboxError, OutboxMessage, OutboxStatus, OutboxStore};

/// Receives decoded customer events from the outbox
#[async_trait]
pub trait DomainEventHandler: Send + Sync {
    /// Name used in logs and failure messages
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &CustomerEvent) -> Result<(), OutboxError>;
}

/// Writes one structured log line per customer event
#[derive(Debug, Clone, Default)]
pub struct CustomerEventLogHandler;

#[async_trait]
impl DomainEventHandler for CustomerEventLogHandler {
    fn name(&self) -> &'static str {
        "customer_event_log"
    }

    async fn handle(&self, event: &CustomerEvent) -> Result<(), OutboxError> {
        match event {
            CustomerEvent::CustomerCreated { customer_id, number, email, .. } => {
                tracing::info!(
                    customer_id = %customer_id,
                    number = %number,
                    email = %email,
                    "Customer created"
                );
            }
            CustomerEvent::CustomerUpdated { customer_id, status, .. } => {
                tracing::info!(customer_id = %customer_id, status = %status, "Customer updated");
            }
            CustomerEvent::CustomerDeleted { customer_id, .. } => {
                tracing::info!(customer_id = %customer_id, "Customer deleted");
            }
        }
        Ok(())
    }
}

/// Outcome of one processing run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessReport {
    pub fetched: usize,
    pub processed: usize,
    /// Attempts that failed but will be retried
    pub retried: usize,
    /// Messages that reached the attempt limit
    pub failed: usize,
}

/// Dispatches pending outbox messages
pub struct OutboxProcessor {
    store: Arc<dyn OutboxStore>,
    handlers: Vec<Arc<dyn DomainEventHandler>>,
    batch_size: u32,
    max_attempts: i32,
}

impl OutboxProcessor {
    pub fn new(store: Arc<dyn OutboxStore>, batch_size: u32, max_attempts: i32) -> Self {
        Self {
            store,
            handlers: Vec::new(),
            batch_size,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn with_handler(mut self, handler: Arc<dyn DomainEventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn store(&self) -> &Arc<dyn OutboxStore> {
        &self.store
    }

    /// Process one batch of pending messages
    pub async fn process_pending(&self) -> Result<ProcessReport, OutboxError> {
        let messages = self.store.fetch_pending(self.batch_size).await?;
        let mut report = ProcessReport {
            fetched: messages.len(),
            ..ProcessReport::default()
        };

        for message in messages {
            match self.dispatch(&message).await {
                Ok(()) => {
                    self.store.mark_processed(message.id).await?;
                    report.processed += 1;
                }
                Err(e) => {
                    // An undecodable payload never succeeds on retry
                    let max_attempts = match &e {
                        OutboxError::Serialization(_) => 1,
                        _ => self.max_attempts,
                    };
                    let status = self
                        .store
                        .mark_attempt_failed(message.id, &e.to_string(), max_attempts)
                        .await?;

                    tracing::warn!(
                        message_id = %message.id,
                        event_type = %message.event_type,
                        attempts = message.attempts + 1,
                        error = %e,
                        "Outbox message dispatch failed"
                    );

                    if status == OutboxStatus::Failed {
                        report.failed += 1;
                    } else {
                        report.retried += 1;
                    }
                }
            }
        }

        if report.fetched > 0 {
            tracing::debug!(
                fetched = report.fetched,
                processed = report.processed,
                retried = report.retried,
                failed = report.failed,
                "Outbox batch processed"
            );
        }

        Ok(report)
    }

    async fn dispatch(&self, message: &OutboxMessage) -> Result<(), OutboxError> {
        let event: CustomerEvent = message.decode()?;

        for handler in &self.handlers {
            handler.handle(&event).await.map_err(|e| match e {
                OutboxError::Handler { .. } => e,
                other => OutboxError::Handler {
                    handler: handler.name(),
                    message: other.to_string(),
                },
            })?;
        }

        tracing::trace!(event_id = %event.event_id(), "Outbox message dispatched");
        Ok(())
    }
}
