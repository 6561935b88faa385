//! Customer Update Handler
//!
//! Applies a full customer model to the stored aggregate under optimistic
//! concurrency control.

use std::sync::Arc;

use crate::aggregate::{AggregateRoot, CustomerId};
use crate::domain::{DomainError, OperationContext};
use crate::error::AppError;
use crate::repository::CustomerRepository;

use super::models::sync_addresses;
use super::{CustomerModel, UpdateCustomerCommand};

/// Handler for customer updates
pub struct UpdateCustomerHandler {
    repository: Arc<dyn CustomerRepository>,
}

impl UpdateCustomerHandler {
    pub fn new(repository: Arc<dyn CustomerRepository>) -> Self {
        Self { repository }
    }

    /// Execute the update customer command
    pub async fn execute(
        &self,
        command: UpdateCustomerCommand,
        context: &OperationContext,
    ) -> Result<CustomerModel, AppError> {
        let UpdateCustomerCommand { id, model } = command;

        if model.id.is_some_and(|body_id| body_id != id) {
            return Err(AppError::InvalidRequest(
                "Customer id in the body does not match the route".to_string(),
            ));
        }
        let email = model.check()?;
        let Some(expected_version) = model.concurrency_version else {
            return Err(AppError::Validation(vec![
                "concurrency_version: Concurrency version is required".to_string(),
            ]));
        };

        let mut customer = self
            .repository
            .find_one(CustomerId::from_uuid(id))
            .await?
            .ok_or(AppError::CustomerNotFound(id))?;

        if customer.concurrency_version() != expected_version {
            return Err(AppError::ConcurrencyConflict(id));
        }

        if &email != customer.email()
            && self
                .repository
                .exists_by_email(&email, Some(customer.id()))
                .await?
        {
            return Err(DomainError::business_rule(format!(
                "Email address {} is already in use",
                email
            ))
            .into());
        }

        customer
            .change_name(&model.first_name, &model.last_name)?
            .change_email(email.as_str())?
            .change_birth_date(model.date_of_birth)?
            .change_status(model.status)?;
        sync_addresses(&mut customer, &model.addresses)?;

        if customer.domain_events().is_empty() {
            tracing::debug!(customer_id = %id, "Customer unchanged, nothing to store");
            return Ok(CustomerModel::from(&customer));
        }

        self.repository.update(&mut customer).await?;

        tracing::info!(
            customer_id = %id,
            correlation_id = ?context.correlation_id,
            "Customer updated"
        );

        Ok(CustomerModel::from(&customer))
    }
}
