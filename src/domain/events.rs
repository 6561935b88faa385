//! Domain Events
//!
//! Events are immutable facts registered by the Customer aggregate. They are
//! persisted to the outbox together with the state change and dispatched
//! later by the outbox processor.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use super::CustomerStatus;

/// Common capabilities of a domain event payload
pub trait DomainEvent: Clone + Serialize + DeserializeOwned + Send + Sync {
    /// Unique event id
    fn event_id(&self) -> Uuid;

    /// Event type name (used as the outbox discriminator)
    fn event_type(&self) -> &'static str;

    /// Id of the aggregate that raised the event
    fn aggregate_id(&self) -> Uuid;

    /// When the event was raised
    fn occurred_at(&self) -> DateTime<Utc>;
}

/// Customer-related events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CustomerEvent {
    /// Customer was created
    CustomerCreated {
        event_id: Uuid,
        customer_id: Uuid,
        first_name: String,
        last_name: String,
        email: String,
        number: String,
        occurred_at: DateTime<Utc>,
    },

    /// Customer state changed (carries the state after the change)
    CustomerUpdated {
        event_id: Uuid,
        customer_id: Uuid,
        first_name: String,
        last_name: String,
        email: String,
        status: CustomerStatus,
        occurred_at: DateTime<Utc>,
    },

    /// Customer was deleted
    CustomerDeleted {
        event_id: Uuid,
        customer_id: Uuid,
        email: String,
        occurred_at: DateTime<Utc>,
    },
}

impl CustomerEvent {
    /// Check if this is an update event
    pub fn is_update(&self) -> bool {
        matches!(self, CustomerEvent::CustomerUpdated { .. })
    }
}

impl DomainEvent for CustomerEvent {
    fn event_id(&self) -> Uuid {
        match self {
            CustomerEvent::CustomerCreated { event_id, .. } => *event_id,
            CustomerEvent::CustomerUpdated { event_id, .. } => *event_id,
            CustomerEvent::CustomerDeleted { event_id, .. } => *event_id,
        }
    }

    fn event_type(&self) -> &'static str {
        match self {
            CustomerEvent::CustomerCreated { .. } => "CustomerCreated",
            CustomerEvent::CustomerUpdated { .. } => "CustomerUpdated",
            CustomerEvent::CustomerDeleted { .. } => "CustomerDeleted",
        }
    }

    fn aggregate_id(&self) -> Uuid {
        match self {
            CustomerEvent::CustomerCreated { customer_id, .. } => *customer_id,
            CustomerEvent::CustomerUpdated { customer_id, .. } => *customer_id,
            CustomerEvent::CustomerDeleted { customer_id, .. } => *customer_id,
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CustomerEvent::CustomerCreated { occurred_at, .. } => *occurred_at,
            CustomerEvent::CustomerUpdated { occurred_at, .. } => *occurred_at,
            CustomerEvent::CustomerDeleted { occurred_at, .. } => *occurred_at,
        }
    }
}
