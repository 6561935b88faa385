//! Customer Creation Handler
//!
//! Validates the model, enforces unique email addresses, then draws the
//! next customer number and stores the new aggregate.

use chrono::{Datelike, Utc};
use std::sync::Arc;

use crate::aggregate::Customer;
use crate::domain::{CustomerNumber, DomainError, OperationContext};
use crate::error::AppError;
use crate::repository::{CustomerRepository, SequenceGenerator, CUSTOMER_NUMBER_SEQUENCE};

use super::models::{check_new_addresses, sync_addresses};
use super::{CreateCustomerCommand, CustomerModel};

/// Handler for customer creation
pub struct CreateCustomerHandler {
    repository: Arc<dyn CustomerRepository>,
    sequences: Arc<dyn SequenceGenerator>,
}

impl CreateCustomerHandler {
    pub fn new(
        repository: Arc<dyn CustomerRepository>,
        sequences: Arc<dyn SequenceGenerator>,
    ) -> Self {
        Self {
            repository,
            sequences,
        }
    }

    /// Execute the create customer command
    pub async fn execute(
        &self,
        command: CreateCustomerCommand,
        context: &OperationContext,
    ) -> Result<CustomerModel, AppError> {
        let model = command.model;
        let email = model.check()?;

        // All input checks run before a number is drawn
        if let Some(date) = model.date_of_birth {
            Customer::check_birth_date(date, Utc::now().date_naive())?;
        }
        check_new_addresses(&model.addresses)?;

        // Business rule: email addresses are unique
        if self.repository.exists_by_email(&email, None).await? {
            return Err(DomainError::business_rule(format!(
                "Email address {} is already in use",
                email
            ))
            .into());
        }

        let sequence = self.sequences.next(CUSTOMER_NUMBER_SEQUENCE).await?;
        let number = CustomerNumber::create(Utc::now().year(), sequence)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let mut customer =
            Customer::create(&model.first_name, &model.last_name, email.as_str(), number)?;
        customer
            .change_birth_date(model.date_of_birth)?
            .change_status(model.status)?;
        sync_addresses(&mut customer, &model.addresses)?;

        self.repository.insert(&mut customer).await?;

        tracing::info!(
            customer_id = %customer.id(),
            number = %customer.number(),
            correlation_id = ?context.correlation_id,
            "Customer created"
        );

        Ok(CustomerModel::from(&customer))
    }
}
