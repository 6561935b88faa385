//! GettingStarted - Customer Management Backend API
//!
//! Serves the customer REST API and runs the background jobs (outbox
//! delivery, outbox purge, customer export).

use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use getting_started::jobs::{JobScheduler, JobSchedulerConfig};
use getting_started::{api, db, AppState, Config, Storage};

/// Initialize tracing/logging
fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "getting_started=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;
    init_tracing(config.log_json);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!(
        storage = ?config.storage,
        environment = %config.environment,
        "Starting GettingStarted server"
    );

    let (state, pool) = match config.storage {
        Storage::Postgres => {
            tracing::info!("Connecting to database...");
            let pool = db::connect(&config).await?;
            db::verify_connection(&pool).await?;
            db::run_migrations(&pool).await?;

            // Verify database schema
            if !db::check_schema(&pool).await? {
                tracing::error!("Database schema is not complete. Please run migrations.");
                return Err(anyhow::anyhow!("Database schema incomplete"));
            }

            tracing::info!("Database connected successfully");
            (AppState::postgres(pool.clone(), &config.audit_actor), Some(pool))
        }
        Storage::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on shutdown");
            (AppState::in_memory(&config.audit_actor), None)
        }
    };

    // Background jobs
    let scheduler = JobScheduler::new(
        state.outbox_processor(config.outbox_batch_size, config.outbox_max_attempts),
        state.repository.clone(),
        JobSchedulerConfig::from_config(&config),
    );
    let jobs = scheduler.start();

    let app = api::app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Cleanup
    tracing::info!("Server shutting down...");
    jobs.abort();
    if let Some(pool) = pool {
        pool.close().await;
        tracing::info!("Database connections closed");
    }
    tracing::info!("Goodbye!");

    Ok(())
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
