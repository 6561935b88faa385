//! Customer Query Handlers
//!
//! Read side: single customer by id and filtered pages.

use std::sync::Arc;

use crate::aggregate::CustomerId;
use crate::error::AppError;
use crate::repository::{CustomerRepository, Page};

use super::{CustomerModel, FindAllCustomersQuery, FindOneCustomerQuery};

/// Handler for loading one customer
pub struct FindOneCustomerHandler {
    repository: Arc<dyn CustomerRepository>,
}

impl FindOneCustomerHandler {
    pub fn new(repository: Arc<dyn CustomerRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, query: FindOneCustomerQuery) -> Result<CustomerModel, AppError> {
        let customer = self
            .repository
            .find_one(CustomerId::from_uuid(query.id))
            .await?
            .ok_or(AppError::CustomerNotFound(query.id))?;

        Ok(CustomerModel::from(&customer))
    }
}

/// Handler for listing customers
pub struct FindAllCustomersHandler {
    repository: Arc<dyn CustomerRepository>,
}

impl FindAllCustomersHandler {
    pub fn new(repository: Arc<dyn CustomerRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, query: FindAllCustomersQuery) -> Result<Page<CustomerModel>, AppError> {
        let page = self.repository.find_all(&query.filter).await?;
        Ok(page.map(|customer| CustomerModel::from(&customer)))
    }
}
