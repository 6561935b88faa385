//! Application state
//!
//! Wires repositories, the sequence generator and the outbox store for the
//! configured storage, and hands out command/query handlers.

use sqlx::PgPool;
use std::sync::Arc;

use crate::handlers::{
    CreateCustomerHandler, DeleteCustomerHandler, FindAllCustomersHandler, FindOneCustomerHandler,
    UpdateCustomerHandler,
};
use crate::outbox::{
    CustomerEventLogHandler, InMemoryOutbox, OutboxProcessor, OutboxStore, PgOutboxStore,
};
use crate::repository::{
    AuditStateRepository, CustomerRepository, InMemoryCustomerRepository,
    InMemorySequenceGenerator, LoggingRepository, PgCustomerRepository, PgSequenceGenerator,
    SequenceGenerator,
};

/// Shared state for the router and background jobs
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn CustomerRepository>,
    pub sequences: Arc<dyn SequenceGenerator>,
    pub outbox: Arc<dyn OutboxStore>,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn CustomerRepository>,
        sequences: Arc<dyn SequenceGenerator>,
        outbox: Arc<dyn OutboxStore>,
    ) -> Self {
        Self {
            repository,
            sequences,
            outbox,
        }
    }

    /// PostgreSQL-backed state
    pub fn postgres(pool: PgPool, audit_actor: &str) -> Self {
        let repository = LoggingRepository::new(AuditStateRepository::new(
            PgCustomerRepository::new(pool.clone()),
            audit_actor,
        ));

        Self::new(
            Arc::new(repository),
            Arc::new(PgSequenceGenerator::new(pool.clone())),
            Arc::new(PgOutboxStore::new(pool)),
        )
    }

    /// Process-local state; nothing survives a restart
    pub fn in_memory(audit_actor: &str) -> Self {
        let outbox = InMemoryOutbox::new();
        let repository = LoggingRepository::new(AuditStateRepository::new(
            InMemoryCustomerRepository::new(outbox.clone()),
            audit_actor,
        ));

        Self::new(
            Arc::new(repository),
            Arc::new(InMemorySequenceGenerator::new()),
            Arc::new(outbox),
        )
    }

    // =========================================================================
    // Handlers
    // =========================================================================

    pub fn create_handler(&self) -> CreateCustomerHandler {
        CreateCustomerHandler::new(self.repository.clone(), self.sequences.clone())
    }

    pub fn update_handler(&self) -> UpdateCustomerHandler {
        UpdateCustomerHandler::new(self.repository.clone())
    }

    pub fn delete_handler(&self) -> DeleteCustomerHandler {
        DeleteCustomerHandler::new(self.repository.clone())
    }

    pub fn find_one_handler(&self) -> FindOneCustomerHandler {
        FindOneCustomerHandler::new(self.repository.clone())
    }

    pub fn find_all_handler(&self) -> FindAllCustomersHandler {
        FindAllCustomersHandler::new(self.repository.clone())
    }

    /// Outbox processor with the built-in event handlers
    pub fn outbox_processor(&self, batch_size: u32, max_attempts: i32) -> OutboxProcessor {
        OutboxProcessor::new(self.outbox.clone(), batch_size, max_attempts)
            .with_handler(Arc::new(CustomerEventLogHandler))
    }
}
