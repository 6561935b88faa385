//! Customer Deletion Handler

use std::sync::Arc;

use crate::aggregate::CustomerId;
use crate::domain::OperationContext;
use crate::error::AppError;
use crate::repository::CustomerRepository;

use super::DeleteCustomerCommand;

/// Handler for customer deletion
pub struct DeleteCustomerHandler {
    repository: Arc<dyn CustomerRepository>,
}

impl DeleteCustomerHandler {
    pub fn new(repository: Arc<dyn CustomerRepository>) -> Self {
        Self { repository }
    }

    /// Execute the delete customer command
    pub async fn execute(
        &self,
        command: DeleteCustomerCommand,
        context: &OperationContext,
    ) -> Result<(), AppError> {
        let mut customer = self
            .repository
            .find_one(CustomerId::from_uuid(command.id))
            .await?
            .ok_or(AppError::CustomerNotFound(command.id))?;

        customer.delete();
        self.repository.delete(&mut customer).await?;

        tracing::info!(
            customer_id = %command.id,
            correlation_id = ?context.correlation_id,
            "Customer deleted"
        );

        Ok(())
    }
}
