//! In-memory customer repository
//!
//! Used by tests and by the `STORAGE=memory` mode. State changes and outbox
//! writes happen under one write lock, which mirrors the database transaction.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::aggregate::{AggregateRoot, Customer, CustomerId};
use crate::domain::EmailAddress;
use crate::outbox::InMemoryOutbox;

use super::{pending_messages, CustomerFilter, CustomerRepository, Page, RepositoryError};

#[derive(Debug, Clone, Default)]
pub struct InMemoryCustomerRepository {
    customers: Arc<RwLock<HashMap<CustomerId, Customer>>>,
    outbox: InMemoryOutbox,
}

impl InMemoryCustomerRepository {
    pub fn new(outbox: InMemoryOutbox) -> Self {
        Self {
            customers: Arc::default(),
            outbox,
        }
    }

    pub fn outbox(&self) -> &InMemoryOutbox {
        &self.outbox
    }

    pub async fn len(&self) -> usize {
        self.customers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.customers.read().await.is_empty()
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn find_one(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        Ok(self.customers.read().await.get(&id).cloned())
    }

    async fn find_all(&self, filter: &CustomerFilter) -> Result<Page<Customer>, RepositoryError> {
        let filter = filter.normalized();
        let customers = self.customers.read().await;

        let mut matching: Vec<&Customer> = customers.values().filter(|c| filter.matches(c)).collect();
        // Same order as the LOWER(...) sort in PostgreSQL
        matching.sort_by_cached_key(|c| {
            (c.last_name().to_lowercase(), c.first_name().to_lowercase(), c.id())
        });

        let items = matching
            .iter()
            .skip(filter.offset() as usize)
            .take(filter.page_size as usize)
            .map(|c| (*c).clone())
            .collect();

        Ok(Page {
            items,
            total: matching.len() as u64,
            page: filter.page,
            page_size: filter.page_size,
        })
    }

    async fn exists_by_email(
        &self,
        email: &EmailAddress,
        excluding: Option<CustomerId>,
    ) -> Result<bool, RepositoryError> {
        let customers = self.customers.read().await;
        Ok(customers
            .values()
            .any(|c| c.email() == email && Some(c.id()) != excluding))
    }

    async fn insert(&self, customer: &mut Customer) -> Result<(), RepositoryError> {
        let mut customers = self.customers.write().await;

        if customers.contains_key(&customer.id()) {
            return Err(RepositoryError::Duplicate("customers_pkey".to_string()));
        }
        if customers.values().any(|c| c.email() == customer.email()) {
            return Err(RepositoryError::Duplicate("customers_email_key".to_string()));
        }
        if customers.values().any(|c| c.number() == customer.number()) {
            return Err(RepositoryError::Duplicate("customers_number_key".to_string()));
        }

        let messages = pending_messages(customer)?;
        self.outbox.enqueue(messages).await;
        customer.take_domain_events();
        customers.insert(customer.id(), customer.clone());

        Ok(())
    }

    async fn update(&self, customer: &mut Customer) -> Result<(), RepositoryError> {
        let mut customers = self.customers.write().await;

        let stored = customers
            .get(&customer.id())
            .ok_or(RepositoryError::NotFound(customer.aggregate_id()))?;

        if stored.concurrency_version() != customer.concurrency_version() {
            return Err(RepositoryError::ConcurrencyConflict {
                id: customer.aggregate_id(),
                expected: customer.concurrency_version(),
            });
        }

        if customers
            .values()
            .any(|c| c.id() != customer.id() && c.email() == customer.email())
        {
            return Err(RepositoryError::Duplicate("customers_email_key".to_string()));
        }

        let messages = pending_messages(customer)?;
        self.outbox.enqueue(messages).await;
        customer.take_domain_events();
        customer.set_concurrency_version(Uuid::new_v4());
        customers.insert(customer.id(), customer.clone());

        Ok(())
    }

    async fn delete(&self, customer: &mut Customer) -> Result<(), RepositoryError> {
        let mut customers = self.customers.write().await;

        if customers.remove(&customer.id()).is_none() {
            return Err(RepositoryError::NotFound(customer.aggregate_id()));
        }

        let messages = pending_messages(customer)?;
        self.outbox.enqueue(messages).await;
        customer.take_domain_events();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CustomerNumber, CustomerStatus};
    use crate::outbox::OutboxStore;

    fn customer(n: i64, first: &str, last: &str) -> Customer {
        Customer::create(
            first,
            last,
            &format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
            CustomerNumber::create(2024, n).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_writes_outbox_and_clears_events() {
        let repo = InMemoryCustomerRepository::default();
        let mut john = customer(100_000, "John", "Doe");

        repo.insert(&mut john).await.unwrap();

        assert!(john.domain_events().is_empty());
        assert_eq!(repo.outbox().pending_count().await.unwrap(), 1);
        let loaded = repo.find_one(john.id()).await.unwrap().unwrap();
        assert!(loaded.domain_events().is_empty());
        assert_eq!(loaded.email(), john.email());
    }

    #[tokio::test]
    async fn test_insert_duplicate_email() {
        let repo = InMemoryCustomerRepository::default();
        let mut first = customer(100_000, "John", "Doe");
        let mut second = customer(100_001, "John", "Doe");

        repo.insert(&mut first).await.unwrap();
        let result = repo.insert(&mut second).await;
        assert!(matches!(result, Err(RepositoryError::Duplicate(_))));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_assigns_new_token_and_detects_stale() {
        let repo = InMemoryCustomerRepository::default();
        let mut john = customer(100_000, "John", "Doe");
        repo.insert(&mut john).await.unwrap();

        let mut stale = repo.find_one(john.id()).await.unwrap().unwrap();
        let token = john.concurrency_version();

        john.change_status(Some(CustomerStatus::Active)).unwrap();
        repo.update(&mut john).await.unwrap();
        assert_ne!(john.concurrency_version(), token);

        stale.change_status(Some(CustomerStatus::Retired)).unwrap();
        let result = repo.update(&mut stale).await;
        assert!(result.unwrap_err().is_concurrency_conflict());
        assert_eq!(stale.domain_events().len(), 1);

        let stored = repo.find_one(john.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), CustomerStatus::Active);
        assert_eq!(repo.outbox().pending_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let repo = InMemoryCustomerRepository::default();
        let mut ghost = customer(100_000, "Ghost", "Writer");

        assert!(repo.update(&mut ghost).await.unwrap_err().is_not_found());
        assert!(repo.delete(&mut ghost).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = InMemoryCustomerRepository::default();
        let mut john = customer(100_000, "John", "Doe");
        repo.insert(&mut john).await.unwrap();

        john.delete();
        repo.delete(&mut john).await.unwrap();

        assert!(repo.find_one(john.id()).await.unwrap().is_none());
        let types: Vec<_> = repo
            .outbox()
            .messages()
            .await
            .into_iter()
            .map(|m| m.event_type)
            .collect();
        assert_eq!(types, vec!["CustomerCreated", "CustomerDeleted"]);
    }

    #[tokio::test]
    async fn test_find_all_orders_filters_and_pages() {
        let repo = InMemoryCustomerRepository::default();
        for (n, first, last) in [
            (100_000, "Zoe", "Adams"),
            (100_001, "Anna", "Smith"),
            (100_002, "Bob", "Adams"),
        ] {
            repo.insert(&mut customer(n, first, last)).await.unwrap();
        }

        let page = repo.find_all(&CustomerFilter::default()).await.unwrap();
        let names: Vec<_> = page.items.iter().map(|c| c.full_name()).collect();
        assert_eq!(names, vec!["Bob Adams", "Zoe Adams", "Anna Smith"]);
        assert_eq!(page.total, 3);

        let page = repo
            .find_all(&CustomerFilter::default().with_page(2, 2))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total, 3);

        let page = repo
            .find_all(&CustomerFilter::default().with_search("adams"))
            .await
            .unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn test_find_all_orders_case_insensitively() {
        let repo = InMemoryCustomerRepository::default();
        repo.insert(&mut customer(100_000, "Carl", "Baker")).await.unwrap();
        repo.insert(&mut customer(100_001, "bea", "adams")).await.unwrap();
        repo.insert(&mut customer(100_002, "Al", "adams")).await.unwrap();

        let page = repo.find_all(&CustomerFilter::default()).await.unwrap();
        let names: Vec<_> = page.items.iter().map(|c| c.full_name()).collect();
        assert_eq!(names, vec!["Al adams", "bea adams", "Carl Baker"]);
    }

    #[tokio::test]
    async fn test_exists_by_email_excluding() {
        let repo = InMemoryCustomerRepository::default();
        let mut john = customer(100_000, "John", "Doe");
        repo.insert(&mut john).await.unwrap();

        assert!(repo.exists_by_email(john.email(), None).await.unwrap());
        assert!(!repo.exists_by_email(john.email(), Some(john.id())).await.unwrap());
    }
}
