//! GettingStarted Library
//!
//! Customer management service: domain model, command handlers, storage,
//! outbox and HTTP API. Re-exports modules for the binaries and for
//! integration testing.

pub mod aggregate;
pub mod api;
pub mod domain;
pub mod handlers;
pub mod jobs;
pub mod outbox;
pub mod repository;
pub mod state;

pub mod config;
pub mod db;
mod error;

pub use config::{Config, Storage};
pub use error::{AppError, AppResult, ErrorResponse};
pub use domain::{CustomerNumber, CustomerStatus, DomainError, EmailAddress, OperationContext};
pub use domain::CustomerEvent;
pub use state::AppState;
