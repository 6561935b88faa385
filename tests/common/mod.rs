//! Common test utilities

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use getting_started::{api, AppState};

/// Router over fresh in-memory storage
pub fn memory_app() -> (Router, AppState) {
    let state = AppState::in_memory("test");
    (api::app(state.clone()), state)
}

/// Build a request with an optional JSON body
pub fn json_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");

    match body {
        Some(json) => builder.body(Body::from(json.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Collect a response body as JSON
pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Collect a response body as text
pub async fn read_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Customer request body
pub fn customer_body(first: &str, last: &str, email: &str) -> Value {
    serde_json::json!({
        "first_name": first,
        "last_name": last,
        "email": email,
    })
}

/// Connect to DATABASE_URL and run migrations
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    getting_started::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}
