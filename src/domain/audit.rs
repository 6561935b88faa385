//! Audit state of an entity (who created/updated it and when)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditState {
    pub created_at: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

impl AuditState {
    /// Stamp creation
    pub fn set_created(&mut self, by: &str, at: DateTime<Utc>) {
        self.created_at = Some(at);
        self.created_by = Some(by.to_string());
    }

    /// Stamp the latest update
    pub fn set_updated(&mut self, by: &str, at: DateTime<Utc>) {
        self.updated_at = Some(at);
        self.updated_by = Some(by.to_string());
    }

    /// Last time the entity was touched
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.updated_at.or(self.created_at)
    }
}
