//! CustomerNumber type
//!
//! Domain primitive for the human-readable customer number
//! `CUS-YYYY-NNNNNN`, where `YYYY` is the registration year and `NNNNNN`
//! a six-digit sequence value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed number prefix
pub const PREFIX: &str = "CUS";

/// Allowed registration years
const MIN_YEAR: i32 = 2000;
const MAX_YEAR: i32 = 9999;

/// Allowed sequence values (always six digits)
pub const MIN_SEQUENCE: i64 = 100_000;
pub const MAX_SEQUENCE: i64 = 999_999;

/// A validated customer number.
///
/// # Invariants
/// - Textual form is exactly `CUS-YYYY-NNNNNN`
/// - Year within 2000..=9999
/// - Sequence within 100000..=999999
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CustomerNumber {
    year: i32,
    sequence: i64,
}

/// Errors that can occur when creating a CustomerNumber
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CustomerNumberError {
    #[error("Customer number must match {PREFIX}-YYYY-NNNNNN (got '{0}')")]
    InvalidFormat(String),

    #[error("Customer number year must be between {MIN_YEAR} and {MAX_YEAR} (got {0})")]
    YearOutOfRange(i32),

    #[error("Customer number sequence must be between {MIN_SEQUENCE} and {MAX_SEQUENCE} (got {0})")]
    SequenceOutOfRange(i64),
}

impl CustomerNumber {
    /// Create a number from its year and sequence parts.
    pub fn create(year: i32, sequence: i64) -> Result<Self, CustomerNumberError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(CustomerNumberError::YearOutOfRange(year));
        }

        if !(MIN_SEQUENCE..=MAX_SEQUENCE).contains(&sequence) {
            return Err(CustomerNumberError::SequenceOutOfRange(sequence));
        }

        Ok(Self { year, sequence })
    }

    /// Parse the textual `CUS-YYYY-NNNNNN` form.
    pub fn parse(value: &str) -> Result<Self, CustomerNumberError> {
        let invalid = || CustomerNumberError::InvalidFormat(value.to_string());

        let mut parts = value.split('-');
        let (Some(prefix), Some(year), Some(sequence), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        if prefix != PREFIX || !is_digits(year, 4) || !is_digits(sequence, 6) {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let sequence: i64 = sequence.parse().map_err(|_| invalid())?;

        Self::create(year, sequence)
    }

    /// Registration year part
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Sequence part
    pub fn sequence(&self) -> i64 {
        self.sequence
    }
}

fn is_digits(part: &str, len: usize) -> bool {
    part.len() == len && part.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for CustomerNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:04}-{:06}", PREFIX, self.year, self.sequence)
    }
}

impl FromStr for CustomerNumber {
    type Err = CustomerNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CustomerNumber::parse(s)
    }
}

impl TryFrom<String> for CustomerNumber {
    type Error = CustomerNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CustomerNumber::parse(&value)
    }
}

impl From<CustomerNumber> for String {
    fn from(number: CustomerNumber) -> Self {
        number.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_formats_number() {
        let number = CustomerNumber::create(2024, 100_001).unwrap();
        assert_eq!(number.to_string(), "CUS-2024-100001");
        assert_eq!(number.year(), 2024);
        assert_eq!(number.sequence(), 100_001);
    }

    #[test]
    fn test_parse_valid_number() {
        let number: CustomerNumber = "CUS-2031-999999".parse().unwrap();
        assert_eq!(number.year(), 2031);
        assert_eq!(number.sequence(), 999_999);
        assert_eq!(number.to_string(), "CUS-2031-999999");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for raw in [
            "",
            "CUS",
            "CUS-2024",
            "cus-2024-100000",
            "ABC-2024-100000",
            "CUS-24-100000",
            "CUS-2024-10000",
            "CUS-2024-1000000",
            "CUS-2024-10000a",
            "CUS-2024-100000-1",
            " CUS-2024-100000",
            "CUS-+024-100000",
        ] {
            assert!(
                matches!(CustomerNumber::parse(raw), Err(CustomerNumberError::InvalidFormat(_))),
                "'{raw}' should be rejected as malformed"
            );
        }
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        assert_eq!(
            CustomerNumber::parse("CUS-1999-100000"),
            Err(CustomerNumberError::YearOutOfRange(1999))
        );
        assert_eq!(
            CustomerNumber::parse("CUS-2024-099999"),
            Err(CustomerNumberError::SequenceOutOfRange(99_999))
        );
    }

    #[test]
    fn test_create_rejects_out_of_range() {
        assert!(CustomerNumber::create(2024, MIN_SEQUENCE - 1).is_err());
        assert!(CustomerNumber::create(2024, MAX_SEQUENCE + 1).is_err());
        assert!(CustomerNumber::create(10_000, MIN_SEQUENCE).is_err());
        assert!(CustomerNumber::create(MIN_YEAR, MIN_SEQUENCE).is_ok());
    }

    #[test]
    fn test_serde_uses_text_form() {
        let number = CustomerNumber::create(2025, 123_456).unwrap();
        let json = serde_json::to_string(&number).unwrap();
        assert_eq!(json, r#""CUS-2025-123456""#);

        let back: CustomerNumber = serde_json::from_str(&json).unwrap();
        assert_eq!(back, number);
    }
}
