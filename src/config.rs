//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Backing store for customers and the outbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    Postgres,
    Memory,
}

impl FromStr for Storage {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Storage::Postgres),
            "memory" | "in-memory" => Ok(Storage::Memory),
            _ => Err(ConfigError::InvalidValue("STORAGE")),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage backend
    pub storage: Storage,

    /// Database connection URL (required for postgres storage)
    pub database_url: Option<String>,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Emit JSON log lines instead of human-readable ones
    pub log_json: bool,

    /// Name written to created_by/updated_by
    pub audit_actor: String,

    pub outbox_interval: Duration,
    pub outbox_batch_size: u32,
    pub outbox_max_attempts: i32,
    pub outbox_retention_hours: i64,

    /// Directory for customer exports; export job is disabled when unset
    pub export_dir: Option<PathBuf>,
    pub export_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through a lookup function (used by tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let storage: Storage = var("STORAGE", "postgres").parse()?;

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        if storage == Storage::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingEnv("DATABASE_URL"));
        }

        let database_max_connections = var("DATABASE_MAX_CONNECTIONS", "10")
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let host = var("HOST", "127.0.0.1");

        let port = var("PORT", "3000")
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let environment = var("ENVIRONMENT", "development");

        let log_json = match var("LOG_FORMAT", "text").to_ascii_lowercase().as_str() {
            "json" => true,
            "text" | "pretty" => false,
            _ => return Err(ConfigError::InvalidValue("LOG_FORMAT")),
        };

        let audit_actor = var("AUDIT_ACTOR", "system");

        let outbox_interval = var("OUTBOX_INTERVAL_SECS", "5")
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or(ConfigError::InvalidValue("OUTBOX_INTERVAL_SECS"))?;

        let outbox_batch_size = var("OUTBOX_BATCH_SIZE", "100")
            .parse()
            .map_err(|_| ConfigError::InvalidValue("OUTBOX_BATCH_SIZE"))?;

        let outbox_max_attempts = var("OUTBOX_MAX_ATTEMPTS", "5")
            .parse::<i32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or(ConfigError::InvalidValue("OUTBOX_MAX_ATTEMPTS"))?;

        let outbox_retention_hours = var("OUTBOX_RETENTION_HOURS", "24")
            .parse::<i64>()
            .ok()
            .filter(|h| *h >= 0)
            .ok_or(ConfigError::InvalidValue("OUTBOX_RETENTION_HOURS"))?;

        let export_dir = lookup("EXPORT_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        let export_interval = var("EXPORT_INTERVAL_SECS", "3600")
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or(ConfigError::InvalidValue("EXPORT_INTERVAL_SECS"))?;

        Ok(Self {
            storage,
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            log_json,
            audit_actor,
            outbox_interval,
            outbox_batch_size,
            outbox_max_attempts,
            outbox_retention_hours,
            export_dir,
            export_interval,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
