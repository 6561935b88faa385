//! Address entity
//!
//! Owned by the Customer aggregate; never loaded or stored on its own.

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

use super::AddressId;

const MAX_FIELD_LENGTH: usize = 256;

/// Input values for creating or changing an address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDetails {
    pub name: Option<String>,
    pub line1: String,
    pub line2: Option<String>,
    pub postal_code: String,
    pub city: String,
    pub country: String,
    pub is_primary: bool,
}

/// A postal address of a customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    id: AddressId,
    name: Option<String>,
    line1: String,
    line2: Option<String>,
    postal_code: String,
    city: String,
    country: String,
    is_primary: bool,
}

impl Address {
    /// Create a new address, validating required fields
    pub fn create(details: AddressDetails) -> Result<Self, DomainError> {
        let details = normalize(details)?;
        Ok(Self::restore(AddressId::new(), details))
    }

    /// Rebuild an address from stored values (no validation)
    pub fn restore(id: AddressId, details: AddressDetails) -> Self {
        Self {
            id,
            name: details.name,
            line1: details.line1,
            line2: details.line2,
            postal_code: details.postal_code,
            city: details.city,
            country: details.country,
            is_primary: details.is_primary,
        }
    }

    /// Change all values. Returns `true` if anything actually changed.
    pub fn change(&mut self, details: AddressDetails) -> Result<bool, DomainError> {
        let details = normalize(details)?;
        if details == self.details() {
            return Ok(false);
        }

        *self = Self::restore(self.id, details);
        Ok(true)
    }

    /// Current values as details
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

    pub(crate) fn set_primary(&mut self, is_primary: bool) {
        self.is_primary = is_primary;
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn id(&self) -> AddressId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn line1(&self) -> &str {
        &self.line1
    }

    pub fn line2(&self) -> Option<&str> {
        self.line2.as_deref()
    }

    pub fn postal_code(&self) -> &str {
        &self.postal_code
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }
}

/// Trim all values, drop blank optionals and collect every failed rule
fn normalize(details: AddressDetails) -> Result<AddressDetails, DomainError> {
    let mut messages = Vec::new();

    let mut required = |label: &str, value: String| -> String {
        let value = value.trim().to_string();
        if value.is_empty() {
            messages.push(format!("{label} is required"));
        } else if value.chars().count() > MAX_FIELD_LENGTH {
            messages.push(format!("{label} must not exceed {MAX_FIELD_LENGTH} characters"));
        }
        value
    };

    let line1 = required("Address line 1", details.line1);
    let postal_code = required("Postal code", details.postal_code);
    let city = required("City", details.city);
    let country = required("Country", details.country);

    let name = optional(details.name);
    let line2 = optional(details.line2);
    for (label, value) in [("Address name", &name), ("Address line 2", &line2)] {
        if value.as_ref().is_some_and(|v| v.chars().count() > MAX_FIELD_LENGTH) {
            messages.push(format!("{label} must not exceed {MAX_FIELD_LENGTH} characters"));
        }
    }

    if !messages.is_empty() {
        return Err(DomainError::Validation(messages));
    }

    Ok(AddressDetails {
        name,
        line1,
        line2,
        postal_code,
        city,
        country,
        is_primary: details.is_primary,
    })
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> AddressDetails {
        AddressDetails {
            name: Some(" Home ".to_string()),
            line1: "1 Main Street".to_string(),
            line2: Some("   ".to_string()),
            postal_code: "1000".to_string(),
            city: "Brussels".to_string(),
            country: "BE".to_string(),
            is_primary: true,
        }
    }

    #[test]
    fn test_create_normalizes() {
        let address = Address::create(details()).unwrap();
        assert_eq!(address.name(), Some("Home"));
        assert_eq!(address.line2(), None);
        assert!(address.is_primary());
    }

    #[test]
    fn test_create_requires_fields() {
        let result = Address::create(AddressDetails::default());
        let Err(DomainError::Validation(messages)) = result else {
            panic!("expected validation error");
        };
        assert_eq!(messages.len(), 4);
        assert!(messages.contains(&"City is required".to_string()));
    }

    #[test]
    fn test_change_reports_whether_changed() {
        let mut address = Address::create(details()).unwrap();
        let id = address.id();

        assert!(!address.change(details()).unwrap());

        let mut moved = details();
        moved.city = "Ghent".to_string();
        assert!(address.change(moved).unwrap());
        assert_eq!(address.city(), "Ghent");
        assert_eq!(address.id(), id);
    }

    #[test]
    fn test_change_rejects_invalid_and_keeps_state() {
        let mut address = Address::create(details()).unwrap();
        let mut broken = details();
        broken.country = String::new();

        assert!(address.change(broken).is_err());
        assert_eq!(address.country(), "BE");
    }
}
