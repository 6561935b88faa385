//! Command Handlers module
//!
//! Command and query handlers that orchestrate customer operations.
//! Each handler validates input, coordinates the aggregate and the
//! repository, and maps the result to a `CustomerModel`.

mod commands;
mod create_customer_handler;
mod delete_customer_handler;
mod find_customers_handler;
mod models;
mod update_customer_handler;

#[cfg(test)]
mod tests;

pub use commands::*;
pub use create_customer_handler::CreateCustomerHandler;
pub use delete_customer_handler::DeleteCustomerHandler;
pub use find_customers_handler::{FindAllCustomersHandler, FindOneCustomerHandler};
pub use models::{AddressModel, CustomerModel};
pub use update_customer_handler::UpdateCustomerHandler;
