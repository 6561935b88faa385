//! Sequence Generator
//!
//! Source of the running number inside a `CustomerNumber`.

use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::domain::customer_number::{MAX_SEQUENCE, MIN_SEQUENCE};

/// Name of the sequence that feeds customer numbers
pub const CUSTOMER_NUMBER_SEQUENCE: &str = "customer_numbers";

/// Hands out increasing values per named sequence
#[async_trait]
pub trait SequenceGenerator: Send + Sync {
    async fn next(&self, name: &str) -> Result<i64, SequenceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SequenceError {
    #[error("Unknown sequence: {0}")]
    Unknown(String),

    #[error("Sequence exhausted: {0}")]
    Exhausted(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// PostgreSQL sequences, named `<name>_seq`
#[derive(Debug, Clone)]
pub struct PgSequenceGenerator {
    pool: PgPool,
}

impl PgSequenceGenerator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SequenceGenerator for PgSequenceGenerator {
    async fn next(&self, name: &str) -> Result<i64, SequenceError> {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_lowercase() || c == '_') {
            return Err(SequenceError::Unknown(name.to_string()));
        }

        let value: i64 = sqlx::query_scalar("SELECT nextval($1::regclass)")
            .bind(format!("{}_seq", name))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match &e {
                // 2200H: sequence_generator_limit_exceeded
                sqlx::Error::Database(db) if db.code().as_deref() == Some("2200H") => {
                    SequenceError::Exhausted(name.to_string())
                }
                // 42P01: undefined_table
                sqlx::Error::Database(db) if db.code().as_deref() == Some("42P01") => {
                    SequenceError::Unknown(name.to_string())
                }
                _ => SequenceError::Database(e),
            })?;

        Ok(value)
    }
}

/// Process-local sequences starting at the customer number minimum
#[derive(Debug, Default)]
pub struct InMemorySequenceGenerator {
    values: Mutex<HashMap<String, i64>>,
}

impl InMemorySequenceGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SequenceGenerator for InMemorySequenceGenerator {
    async fn next(&self, name: &str) -> Result<i64, SequenceError> {
        let mut values = self.values.lock().await;
        let value = values.entry(name.to_string()).or_insert(MIN_SEQUENCE - 1);

        if *value >= MAX_SEQUENCE {
            return Err(SequenceError::Exhausted(name.to_string()));
        }

        *value += 1;
        Ok(*value)
    }
}
