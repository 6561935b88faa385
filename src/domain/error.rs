//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;
use uuid::Uuid;

use super::{CustomerNumberError, CustomerStatusError, EmailError};

/// Domain-specific errors
///
/// These represent expected failures of domain operations: invalid input for
/// a value object or aggregate change, and violated business rules. They are
/// returned, never panicked, and are independent of the web layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// One or more validation rules failed
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Business rule violation (e.g. email already in use)
    #[error("Business rule violation: {0}")]
    BusinessRuleViolation(String),

    /// Address does not belong to the customer
    #[error("Address not found: {0}")]
    AddressNotFound(Uuid),
}

impl DomainError {
    /// Create a validation error with a single message
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }

    /// Create a business rule violation
    pub fn business_rule(message: impl Into<String>) -> Self {
        Self::BusinessRuleViolation(message.into())
    }

    /// Validation messages carried by this error (empty for other kinds)
    pub fn messages(&self) -> &[String] {
        match self {
            Self::Validation(messages) => messages,
            _ => &[],
        }
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<EmailError> for DomainError {
    fn from(err: EmailError) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<CustomerNumberError> for DomainError {
    fn from(err: CustomerNumberError) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<CustomerStatusError> for DomainError {
    fn from(err: CustomerStatusError) -> Self {
        Self::validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_joins_messages() {
        let err = DomainError::Validation(vec![
            "First name is required".to_string(),
            "Last name is required".to_string(),
        ]);

        assert!(err.is_validation());
        assert_eq!(err.messages().len(), 2);
        assert_eq!(
            err.to_string(),
            "Validation failed: First name is required; Last name is required"
        );
    }

    #[test]
    fn test_business_rule_has_no_messages() {
        let err = DomainError::business_rule("Email already in use");

        assert!(!err.is_validation());
        assert!(err.messages().is_empty());
        assert!(err.to_string().contains("Email already in use"));
    }

    #[test]
    fn test_from_email_error() {
        let err: DomainError = EmailError::Empty.into();
        assert!(err.is_validation());
        assert_eq!(err.messages(), &["Email address must not be empty".to_string()]);
    }
}
