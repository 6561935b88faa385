//! Aggregate module
//!
//! Aggregate roots, their owned entities and typed identifiers.

pub mod address;
pub mod customer;

pub use address::{Address, AddressDetails};
pub use customer::{Customer, CustomerSnapshot};

use uuid::Uuid;

use crate::domain::DomainEvent;

/// Aggregate trait that all aggregate roots implement
///
/// Aggregates record domain events while they change; the repository drains
/// them with `take_domain_events` and stores them in the outbox within the
/// same transaction as the state change.
pub trait AggregateRoot {
    /// The type of events this aggregate registers
    type Event: DomainEvent;

    /// Get the aggregate type name (for storage)
    fn aggregate_type() -> &'static str;

    /// Get the aggregate ID
    fn aggregate_id(&self) -> Uuid;

    /// Optimistic concurrency token
    fn concurrency_version(&self) -> Uuid;

    /// Events registered since the aggregate was loaded
    fn domain_events(&self) -> &[Self::Event];

    /// Remove and return the registered events
    fn take_domain_events(&mut self) -> Vec<Self::Event>;
}

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new random id
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

typed_id!(
    /// Identity of a Customer aggregate
    CustomerId
);

typed_id!(
    /// Identity of an Address inside a Customer
    AddressId
);
