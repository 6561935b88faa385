//! Database module
//!
//! Database connection and migration utilities.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::Config;

/// Tables the service cannot run without
const REQUIRED_TABLES: &[&str] = &["customers", "customer_addresses", "outbox_messages"];

/// Sequences the service cannot run without
const REQUIRED_SEQUENCES: &[&str] = &["customer_numbers_seq"];

/// Open a connection pool for the configured database
pub async fn connect(config: &Config) -> Result<PgPool, sqlx::Error> {
    let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| sqlx::Error::Configuration("DATABASE_URL is not set".into()))?;

    PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(url)
        .await
}

/// Apply the embedded migrations in `migrations/`
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Simple connectivity check
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Check if required tables and sequences exist
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    for table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables 
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(*table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    for sequence in REQUIRED_SEQUENCES {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.sequences
                WHERE sequence_schema = 'public' AND sequence_name = $1
            )
            "#,
        )
        .bind(*sequence)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required sequence '{}' does not exist", sequence);
            return Ok(false);
        }
    }

    tracing::info!("Database schema verified");
    Ok(true)
}
