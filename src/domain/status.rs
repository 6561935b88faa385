//! Customer status enumeration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CustomerStatus {
    /// Prospect, not yet buying (initial status)
    #[default]
    Lead,
    /// Active customer
    Active,
    /// No longer active
    Retired,
}

/// Unknown status name or id
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid customer status: {0}")]
pub struct CustomerStatusError(pub String);

impl CustomerStatus {
    /// All statuses in id order
    pub const ALL: [CustomerStatus; 3] = [Self::Lead, Self::Active, Self::Retired];

    /// Numeric id of the status
    pub fn id(&self) -> i32 {
        match self {
            Self::Lead => 1,
            Self::Active => 2,
            Self::Retired => 3,
        }
    }

    /// Look up a status by numeric id
    pub fn from_id(id: i32) -> Result<Self, CustomerStatusError> {
        Self::ALL
            .into_iter()
            .find(|status| status.id() == id)
            .ok_or_else(|| CustomerStatusError(id.to_string()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lead => "Lead",
            Self::Active => "Active",
            Self::Retired => "Retired",
        }
    }
}

impl fmt::Display for CustomerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CustomerStatus {
    type Err = CustomerStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| CustomerStatusError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_lead() {
        assert_eq!(CustomerStatus::default(), CustomerStatus::Lead);
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("active".parse::<CustomerStatus>().unwrap(), CustomerStatus::Active);
        assert_eq!(" RETIRED ".parse::<CustomerStatus>().unwrap(), CustomerStatus::Retired);
        assert!("Deleted".parse::<CustomerStatus>().is_err());
    }

    #[test]
    fn test_id_round_trip() {
        for status in CustomerStatus::ALL {
            assert_eq!(CustomerStatus::from_id(status.id()).unwrap(), status);
        }
        assert!(CustomerStatus::from_id(0).is_err());
    }

    #[test]
    fn test_serde_uses_name() {
        let json = serde_json::to_string(&CustomerStatus::Active).unwrap();
        assert_eq!(json, r#""Active""#);
    }
}
