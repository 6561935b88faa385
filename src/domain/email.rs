//! EmailAddress type
//!
//! Domain primitive for customer email addresses. Values are normalized
//! (trimmed, lower-cased) and validated at construction time, so an invalid
//! address cannot exist in the system.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::ValidateEmail;

/// Maximum length of an email address (RFC 5321 path limit)
const MAX_LENGTH: usize = 254;

/// EmailAddress represents a validated, normalized email address.
///
/// # Invariants
/// - No surrounding whitespace
/// - Lower-case
/// - Well-formed `local@domain`, at most 254 characters
///
/// # Example
/// ```
/// use getting_started::domain::EmailAddress;
///
/// let email = EmailAddress::create("  John.Doe@Example.COM ").unwrap();
/// assert_eq!(email.as_str(), "john.doe@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

/// Errors that can occur when creating an EmailAddress
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmailError {
    #[error("Email address must not be empty")]
    Empty,

    #[error("Email address exceeds {MAX_LENGTH} characters")]
    TooLong,

    #[error("Invalid email address: {0}")]
    InvalidFormat(String),
}

impl EmailAddress {
    /// Create a new EmailAddress with normalization and validation.
    ///
    /// # Errors
    /// - `EmailError::Empty` if the value is blank
    /// - `EmailError::TooLong` if longer than 254 characters
    /// - `EmailError::InvalidFormat` if not a well-formed address
    pub fn create(value: &str) -> Result<Self, EmailError> {
        let normalized = value.trim().to_lowercase();

        if normalized.is_empty() {
            return Err(EmailError::Empty);
        }

        if normalized.chars().count() > MAX_LENGTH {
            return Err(EmailError::TooLong);
        }

        if !normalized.validate_email() {
            return Err(EmailError::InvalidFormat(normalized));
        }

        Ok(Self(normalized))
    }

    /// Get the normalized address
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Domain part of the address (after the `@`)
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map(|(_, domain)| domain).unwrap_or_default()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for EmailAddress {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmailAddress::create(s)
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        EmailAddress::create(&value)
    }
}

impl TryFrom<&str> for EmailAddress {
    type Error = EmailError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        EmailAddress::create(value)
    }
}

impl From<EmailAddress> for String {
    fn from(email: EmailAddress) -> Self {
        email.0
    }
}
