//! Domain module
//!
//! Core domain types and business rules for the Customer aggregate.

pub mod audit;
pub mod context;
pub mod customer_number;
pub mod email;
pub mod error;
pub mod events;
pub mod status;

pub use audit::AuditState;
pub use context::OperationContext;
pub use customer_number::{CustomerNumber, CustomerNumberError};
pub use email::{EmailAddress, EmailError};
pub use error::DomainError;
pub use events::{CustomerEvent, DomainEvent};
pub use status::{CustomerStatus, CustomerStatusError};
