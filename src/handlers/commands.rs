//! Command and query definitions
//!
//! Commands represent intentions to change the system state; queries read it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repository::CustomerFilter;

use super::CustomerModel;

/// Command to create a new customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomerCommand {
    pub model: CustomerModel,
}

impl CreateCustomerCommand {
    pub fn new(model: CustomerModel) -> Self {
        Self { model }
    }
}

/// Command to replace the state of an existing customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCustomerCommand {
    pub id: Uuid,
    pub model: CustomerModel,
}

impl UpdateCustomerCommand {
    pub fn new(id: Uuid, model: CustomerModel) -> Self {
        Self { id, model }
    }
}

/// Command to delete a customer
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeleteCustomerCommand {
    pub id: Uuid,
}

impl DeleteCustomerCommand {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

/// Query for a single customer
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FindOneCustomerQuery {
    pub id: Uuid,
}

impl FindOneCustomerQuery {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

/// Query for a filtered page of customers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindAllCustomersQuery {
    pub filter: CustomerFilter,
}

impl FindAllCustomersQuery {
    pub fn new(filter: CustomerFilter) -> Self {
        Self { filter }
    }
}
