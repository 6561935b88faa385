//! Customer models
//!
//! Data transfer shapes for the API and export, with input validation and
//! mapping from the aggregate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;
use validator::Validate;

use crate::aggregate::{Address, AddressDetails, AddressId, AggregateRoot, Customer};
use crate::domain::{CustomerStatus, DomainError, EmailAddress};
use crate::error::{validation_messages, AppError};

/// Customer as read and written by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CustomerModel {
    /// Assigned by the server; when sent on update it must match the route id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,

    #[validate(length(min = 1, max = 128, message = "First name must be between 1 and 128 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 128, message = "Last name must be between 1 and 128 characters"))]
    pub last_name: String,

    /// Checked and normalized by `EmailAddress`
    pub email: String,

    /// Assigned by the server, ignored on input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,

    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,

    #[serde(default)]
    pub status: Option<CustomerStatus>,

    #[serde(default)]
    #[validate(nested)]
    pub addresses: Vec<AddressModel>,

    /// Token from the last read; required on update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency_version: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AddressModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,

    #[serde(default)]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 256, message = "Address line 1 must be between 1 and 256 characters"))]
    pub line1: String,

    #[serde(default)]
    pub line2: Option<String>,

    #[validate(length(min = 1, max = 256, message = "Postal code must be between 1 and 256 characters"))]
    pub postal_code: String,

    #[validate(length(min = 1, max = 256, message = "City must be between 1 and 256 characters"))]
    pub city: String,

    #[validate(length(min = 1, max = 256, message = "Country must be between 1 and 256 characters"))]
    pub country: String,

    #[serde(default)]
    pub is_primary: bool,
}

impl CustomerModel {
    pub fn new(first_name: &str, last_name: &str, email: &str) -> Self {
        Self {
            id: None,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            number: None,
            date_of_birth: None,
            status: None,
            addresses: Vec::new(),
            concurrency_version: None,
        }
    }

    pub fn with_status(mut self, status: CustomerStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_date_of_birth(mut self, date: NaiveDate) -> Self {
        self.date_of_birth = Some(date);
        self
    }

    pub fn with_address(mut self, address: AddressModel) -> Self {
        self.addresses.push(address);
        self
    }

    /// Validate the input the way the aggregate will see it: text fields
    /// trimmed, the email through `EmailAddress`. Every failure is reported.
    pub(crate) fn check(&self) -> Result<EmailAddress, AppError> {
        let mut messages = match self.trimmed().validate() {
            Ok(()) => Vec::new(),
            Err(errors) => validation_messages(&errors),
        };

        let email = EmailAddress::create(&self.email)
            .map_err(|e| messages.push(format!("email: {}", e)))
            .ok();

        match email {
            Some(email) if messages.is_empty() => Ok(email),
            _ => Err(AppError::Validation(messages)),
        }
    }

    fn trimmed(&self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            addresses: self.addresses.iter().map(AddressModel::trimmed).collect(),
            ..self.clone()
        }
    }
}

impl AddressModel {
    pub fn new(line1: &str, postal_code: &str, city: &str, country: &str) -> Self {
        Self {
            id: None,
            name: None,
            line1: line1.to_string(),
            line2: None,
            postal_code: postal_code.to_string(),
            city: city.to_string(),
            country: country.to_string(),
            is_primary: false,
        }
    }

    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    fn trimmed(&self) -> Self {
        Self {
            line1: self.line1.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            city: self.city.trim().to_string(),
            country: self.country.trim().to_string(),
            ..self.clone()
        }
    }

    pub fn details(&self) -> AddressDetails {
        AddressDetails {
            name: self.name.clone(),
            line1: self.line1.clone(),
            line2: self.line2.clone(),
            postal_code: self.postal_code.clone(),
            city: self.city.clone(),
            country: self.country.clone(),
            is_primary: self.is_primary,
        }
    }
}

// =========================================================================
// Mapping
// =========================================================================

impl From<&Address> for AddressModel {
    fn from(address: &Address) -> Self {
        Self {
            id: Some(address.id().as_uuid()),
            name: address.name().map(str::to_string),
            line1: address.line1().to_string(),
            line2: address.line2().map(str::to_string),
            postal_code: address.postal_code().to_string(),
            city: address.city().to_string(),
            country: address.country().to_string(),
            is_primary: address.is_primary(),
        }
    }
}

impl From<&Customer> for CustomerModel {
    fn from(customer: &Customer) -> Self {
        Self {
            id: Some(customer.id().as_uuid()),
            first_name: customer.first_name().to_string(),
            last_name: customer.last_name().to_string(),
            email: customer.email().to_string(),
            number: Some(customer.number().to_string()),
            date_of_birth: customer.date_of_birth(),
            status: Some(customer.status()),
            addresses: customer.addresses().iter().map(AddressModel::from).collect(),
            concurrency_version: Some(customer.concurrency_version()),
        }
    }
}

/// Check addresses for a customer that does not exist yet: none may carry
/// an id, and each must be a valid address.
pub(crate) fn check_new_addresses(models: &[AddressModel]) -> Result<(), DomainError> {
    for model in models {
        if let Some(id) = model.id {
            return Err(DomainError::AddressNotFound(id));
        }
        Address::create(model.details())?;
    }

    Ok(())
}

/// Bring the customer's addresses in line with the models: a known id is
/// changed, a missing id is added, and stored addresses not listed are removed.
pub(crate) fn sync_addresses(
    customer: &mut Customer,
    models: &[AddressModel],
) -> Result<(), DomainError> {
    let listed: HashSet<Uuid> = models.iter().filter_map(|m| m.id).collect();
    let removed: Vec<AddressId> = customer
        .addresses()
        .iter()
        .map(Address::id)
        .filter(|id| !listed.contains(&id.as_uuid()))
        .collect();

    for id in removed {
        customer.remove_address(id)?;
    }

    for model in models {
        match model.id {
            Some(id) => {
                customer.change_address(AddressId::from_uuid(id), model.details())?;
            }
            None => {
                customer.add_address(model.details())?;
            }
        }
    }

    Ok(())
}
