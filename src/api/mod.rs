//! API module
//!
//! HTTP API endpoints and middleware.

pub mod middleware;
pub mod routes;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub use routes::{customer_routes, CUSTOMERS_PATH};

/// Build the application router
pub fn app(state: AppState) -> Router {
    // Layers run outside-in: trace -> context -> logging -> handler
    Router::new()
        .route("/health", get(health_check))
        .nest(CUSTOMERS_PATH, customer_routes())
        .layer(axum::middleware::from_fn(middleware::logging_middleware))
        .layer(axum::middleware::from_fn(middleware::context_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
