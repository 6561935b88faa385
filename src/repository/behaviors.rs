//! Repository behaviors
//!
//! Decorators that wrap a `CustomerRepository` and add a cross-cutting
//! concern. They compose: `LoggingRepository<AuditStateRepository<PgCustomerRepository>>`.

use async_trait::async_trait;
use chrono::Utc;
use std::future::Future;
use std::time::Instant;
use tracing::Instrument;

use crate::aggregate::{AggregateRoot, Customer, CustomerId};
use crate::domain::EmailAddress;

use super::{CustomerFilter, CustomerRepository, Page, RepositoryError};

// =========================================================================
// LoggingRepository
// =========================================================================

/// Logs every repository call with its duration and outcome
#[derive(Debug, Clone)]
pub struct LoggingRepository<R> {
    inner: R,
}

impl<R: CustomerRepository> LoggingRepository<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

async fn logged<T, F>(operation: &'static str, subject: String, call: F) -> Result<T, RepositoryError>
where
    F: Future<Output = Result<T, RepositoryError>>,
{
    let span = tracing::info_span!(
        "repository",
        operation,
        subject = %subject,
        duration_ms = tracing::field::Empty,
    );

    let started = Instant::now();
    let result = call.instrument(span.clone()).await;
    let duration_ms = started.elapsed().as_millis() as u64;
    span.record("duration_ms", duration_ms);

    let _entered = span.enter();
    match &result {
        Ok(_) => tracing::debug!(duration_ms, "Repository call succeeded"),
        Err(e) if e.is_not_found() || e.is_concurrency_conflict() => {
            tracing::info!(duration_ms, error = %e, "Repository call rejected")
        }
        Err(e) => tracing::error!(duration_ms, error = %e, "Repository call failed"),
    }

    result
}

#[async_trait]
impl<R: CustomerRepository> CustomerRepository for LoggingRepository<R> {
    async fn find_one(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        logged("find_one", id.to_string(), self.inner.find_one(id)).await
    }

    async fn find_all(&self, filter: &CustomerFilter) -> Result<Page<Customer>, RepositoryError> {
        let target = format!("page={} page_size={}", filter.page, filter.page_size);
        let page = logged("find_all", target, self.inner.find_all(filter)).await?;
        tracing::trace!(count = page.items.len(), total = page.total, "Customers loaded");
        Ok(page)
    }

    async fn exists_by_email(
        &self,
        email: &EmailAddress,
        excluding: Option<CustomerId>,
    ) -> Result<bool, RepositoryError> {
        logged(
            "exists_by_email",
            email.domain().to_string(),
            self.inner.exists_by_email(email, excluding),
        )
        .await
    }

    async fn insert(&self, customer: &mut Customer) -> Result<(), RepositoryError> {
        let target = customer.id().to_string();
        let events = customer.domain_events().len();
        tracing::trace!(customer_id = %target, events, "Inserting customer");
        logged("insert", target, self.inner.insert(customer)).await
    }

    async fn update(&self, customer: &mut Customer) -> Result<(), RepositoryError> {
        let target = customer.id().to_string();
        let events = customer.domain_events().len();
        tracing::trace!(customer_id = %target, events, "Updating customer");
        logged("update", target, self.inner.update(customer)).await
    }

    async fn delete(&self, customer: &mut Customer) -> Result<(), RepositoryError> {
        let target = customer.id().to_string();
        logged("delete", target, self.inner.delete(customer)).await
    }
}

// =========================================================================
// AuditStateRepository
// =========================================================================

/// Stamps the audit state of a customer for the write; a failed write
/// leaves the previous audit state in place
#[derive(Debug, Clone)]
pub struct AuditStateRepository<R> {
    inner: R,
    actor: String,
}

impl<R: CustomerRepository> AuditStateRepository<R> {
    pub fn new(inner: R, actor: impl Into<String>) -> Self {
        Self {
            inner,
            actor: actor.into(),
        }
    }
}

#[async_trait]
impl<R: CustomerRepository> CustomerRepository for AuditStateRepository<R> {
    async fn find_one(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        self.inner.find_one(id).await
    }

    async fn find_all(&self, filter: &CustomerFilter) -> Result<Page<Customer>, RepositoryError> {
        self.inner.find_all(filter).await
    }

    async fn exists_by_email(
        &self,
        email: &EmailAddress,
        excluding: Option<CustomerId>,
    ) -> Result<bool, RepositoryError> {
        self.inner.exists_by_email(email, excluding).await
    }

    async fn insert(&self, customer: &mut Customer) -> Result<(), RepositoryError> {
        let previous = customer.audit().clone();
        customer.audit_mut().set_created(&self.actor, Utc::now());

        let result = self.inner.insert(customer).await;
        if result.is_err() {
            *customer.audit_mut() = previous;
        }
        result
    }

    async fn update(&self, customer: &mut Customer) -> Result<(), RepositoryError> {
        let previous = customer.audit().clone();
        customer.audit_mut().set_updated(&self.actor, Utc::now());

        let result = self.inner.update(customer).await;
        if result.is_err() {
            *customer.audit_mut() = previous;
        }
        result
    }

    async fn delete(&self, customer: &mut Customer) -> Result<(), RepositoryError> {
        self.inner.delete(customer).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AuditState, CustomerNumber, CustomerStatus};
    use crate::repository::InMemoryCustomerRepository;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    /// Records the fields of every `repository` span
    #[derive(Clone, Default)]
    struct SpanFields(Arc<Mutex<Vec<(String, String)>>>);

    impl tracing::field::Visit for SpanFields {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            self.0
                .lock()
                .unwrap()
                .push((field.name().to_string(), format!("{:?}", value)));
        }
    }

    impl<S: tracing::Subscriber> Layer<S> for SpanFields {
        fn on_new_span(
            &self,
            attrs: &tracing::span::Attributes<'_>,
            _id: &tracing::span::Id,
            _ctx: Context<'_, S>,
        ) {
            if attrs.metadata().name() == "repository" {
                attrs.record(&mut self.clone());
            }
        }
    }

    fn customer() -> Customer {
        Customer::create(
            "John",
            "Doe",
            "john@example.com",
            CustomerNumber::create(2024, 100_000).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_audit_state_is_stamped() {
        let repo = AuditStateRepository::new(InMemoryCustomerRepository::default(), "alice");
        let mut john = customer();

        repo.insert(&mut john).await.unwrap();
        assert_eq!(john.audit().created_by.as_deref(), Some("alice"));
        assert!(john.audit().updated_at.is_none());

        john.change_status(Some(CustomerStatus::Active)).unwrap();
        repo.update(&mut john).await.unwrap();

        let stored = repo.find_one(john.id()).await.unwrap().unwrap();
        assert_eq!(stored.audit().updated_by.as_deref(), Some("alice"));
        assert!(stored.audit().created_at.is_some());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_audit_state() {
        let repo = AuditStateRepository::new(InMemoryCustomerRepository::default(), "alice");

        let mut ghost = customer();
        ghost.change_status(Some(CustomerStatus::Active)).unwrap();
        assert!(repo.update(&mut ghost).await.is_err());
        assert_eq!(ghost.audit(), &AuditState::default());

        let mut john = customer();
        repo.insert(&mut john).await.unwrap();
        let stored_audit = john.audit().clone();

        let mut copy = john.clone();
        assert!(repo.insert(&mut copy).await.is_err());
        assert_eq!(copy.audit(), &stored_audit);
    }

    #[tokio::test]
    async fn test_behaviors_compose() {
        let inner = InMemoryCustomerRepository::default();
        let repo = LoggingRepository::new(AuditStateRepository::new(inner.clone(), "system"));
        let mut john = customer();

        repo.insert(&mut john).await.unwrap();
        assert!(repo.exists_by_email(john.email(), None).await.unwrap());
        assert_eq!(inner.len().await, 1);

        john.delete();
        repo.delete(&mut john).await.unwrap();
        assert!(repo.find_one(john.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logging_opens_repository_span() {
        let fields = SpanFields::default();
        let subscriber = tracing_subscriber::registry().with(fields.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let repo = LoggingRepository::new(InMemoryCustomerRepository::default());
        let mut john = customer();
        repo.insert(&mut john).await.unwrap();

        let recorded = fields.0.lock().unwrap().clone();
        assert!(recorded.contains(&("operation".to_string(), "\"insert\"".to_string())));
        assert!(recorded.contains(&("subject".to_string(), john.id().to_string())));
    }

    #[tokio::test]
    async fn test_logging_passes_errors_through() {
        let repo = LoggingRepository::new(InMemoryCustomerRepository::default());
        let mut ghost = customer();

        let err = repo.update(&mut ghost).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
