//! Repository module
//!
//! Persistence of the Customer aggregate. Every implementation writes the
//! aggregate's pending domain events to the outbox in the same unit of work
//! as the state change.

mod behaviors;
mod error;
mod memory;
mod postgres;
mod sequence;

pub use behaviors::{AuditStateRepository, LoggingRepository};
pub use error::RepositoryError;
pub use memory::InMemoryCustomerRepository;
pub use postgres::PgCustomerRepository;
pub use sequence::{
    InMemorySequenceGenerator, PgSequenceGenerator, SequenceError, SequenceGenerator,
    CUSTOMER_NUMBER_SEQUENCE,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::aggregate::{AggregateRoot, Customer, CustomerId};
use crate::domain::{CustomerStatus, EmailAddress};
use crate::outbox::OutboxMessage;

/// Default number of items per page
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Upper bound for the page size
pub const MAX_PAGE_SIZE: u32 = 500;

/// Storage abstraction for the Customer aggregate
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Load a customer by id
    async fn find_one(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError>;

    /// Load a filtered, ordered page of customers
    async fn find_all(&self, filter: &CustomerFilter) -> Result<Page<Customer>, RepositoryError>;

    /// Whether another customer already uses the email address
    async fn exists_by_email(
        &self,
        email: &EmailAddress,
        excluding: Option<CustomerId>,
    ) -> Result<bool, RepositoryError>;

    /// Store a new customer and drain its events into the outbox
    async fn insert(&self, customer: &mut Customer) -> Result<(), RepositoryError>;

    /// Store changes if the concurrency token still matches; assigns a new token
    async fn update(&self, customer: &mut Customer) -> Result<(), RepositoryError>;

    /// Remove a customer and drain its events into the outbox
    async fn delete(&self, customer: &mut Customer) -> Result<(), RepositoryError>;
}

/// Filter and paging for `find_all`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerFilter {
    pub status: Option<CustomerStatus>,
    /// Case-insensitive match on first name, last name or email
    pub search: Option<String>,
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
}

impl Default for CustomerFilter {
    fn default() -> Self {
        Self {
            status: None,
            search: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl CustomerFilter {
    pub fn with_status(mut self, status: CustomerStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_page(mut self, page: u32, page_size: u32) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    /// Clamp paging values into range and drop a blank search term
    pub fn normalized(&self) -> Self {
        Self {
            status: self.status,
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_lowercase),
            page: self.page.max(1),
            page_size: match self.page_size {
                0 => DEFAULT_PAGE_SIZE,
                size => size.min(MAX_PAGE_SIZE),
            },
        }
    }

    /// Number of rows to skip (uses the normalized values)
    pub fn offset(&self) -> u64 {
        let filter = self.normalized();
        u64::from(filter.page - 1) * u64::from(filter.page_size)
    }

    /// Whether a customer passes the status and search criteria
    pub fn matches(&self, customer: &Customer) -> bool {
        if self.status.is_some_and(|status| status != customer.status()) {
            return false;
        }

        match self.normalized().search {
            None => true,
            Some(term) => [
                customer.first_name(),
                customer.last_name(),
                customer.email().as_str(),
            ]
            .iter()
            .any(|value| value.to_lowercase().contains(&term)),
        }
    }
}

/// One page of results plus the unpaged total
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Outbox messages for the aggregate's pending events (events stay pending)
pub(crate) fn pending_messages(customer: &Customer) -> Result<Vec<OutboxMessage>, RepositoryError> {
    customer
        .domain_events()
        .iter()
        .map(|event| OutboxMessage::pending(Customer::aggregate_type(), event))
        .collect::<Result<_, _>>()
        .map_err(RepositoryError::from)
}
