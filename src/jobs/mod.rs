//! Scheduled Jobs
//!
//! Background jobs for outbox delivery, outbox cleanup and customer export.
//! The scheduler runs them on fixed intervals in one `select!` loop.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use crate::config::Config;
use crate::handlers::CustomerModel;
use crate::outbox::{OutboxError, OutboxProcessor, OutboxStore, ProcessReport};
use crate::repository::{CustomerFilter, CustomerRepository, RepositoryError, MAX_PAGE_SIZE};

// =========================================================================
// Outbox Processing Job
// =========================================================================

/// Dispatch one batch of pending outbox messages
pub async fn process_outbox(processor: &OutboxProcessor) -> Result<ProcessReport, JobError> {
    Ok(processor.process_pending().await?)
}

// =========================================================================
// Outbox Purge Job
// =========================================================================

/// Delete processed outbox messages older than the retention window
pub async fn purge_processed_outbox(
    store: &dyn OutboxStore,
    retention_hours: i64,
) -> Result<u64, JobError> {
    let cutoff = Utc::now() - chrono::Duration::hours(retention_hours);
    let rows_deleted = store.purge_processed(cutoff).await?;

    if rows_deleted > 0 {
        tracing::info!(
            rows_deleted = rows_deleted,
            "Purged processed outbox messages"
        );
    }

    Ok(rows_deleted)
}

// =========================================================================
// Customer Export Job
// =========================================================================

/// Result of a customer export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    pub path: PathBuf,
    pub count: usize,
}

/// Write every customer as a JSON array to `customers-<timestamp>.json`
pub async fn export_customers(
    repository: &dyn CustomerRepository,
    dir: &Path,
) -> Result<ExportResult, JobError> {
    let mut models: Vec<CustomerModel> = Vec::new();
    let mut page = 1;

    loop {
        let filter = CustomerFilter::default().with_page(page, MAX_PAGE_SIZE);
        let result = repository.find_all(&filter).await?;
        let fetched = result.items.len();
        models.extend(result.items.iter().map(CustomerModel::from));

        if fetched < MAX_PAGE_SIZE as usize || models.len() as u64 >= result.total {
            break;
        }
        page += 1;
    }

    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!(
        "customers-{}.json",
        Utc::now().format("%Y%m%dT%H%M%S%3fZ")
    ));
    tokio::fs::write(&path, serde_json::to_vec_pretty(&models)?).await?;

    tracing::info!(path = %path.display(), count = models.len(), "Exported customers");

    Ok(ExportResult {
        path,
        count: models.len(),
    })
}

// =========================================================================
// Job Scheduler
// =========================================================================

/// Configuration for job scheduler
#[derive(Debug, Clone)]
pub struct JobSchedulerConfig {
    /// Interval for outbox processing (default: 5 seconds)
    pub outbox_interval: Duration,
    /// Interval for the outbox purge (default: 1 hour)
    pub purge_interval: Duration,
    /// Age after which processed messages are purged (default: 24 hours)
    pub outbox_retention_hours: i64,
    /// Interval for the customer export (default: 1 hour)
    pub export_interval: Duration,
    /// Export target; no export runs when unset
    pub export_dir: Option<PathBuf>,
}

impl Default for JobSchedulerConfig {
    fn default() -> Self {
        Self {
            outbox_interval: Duration::from_secs(5),
            purge_interval: Duration::from_secs(3600),
            outbox_retention_hours: 24,
            export_interval: Duration::from_secs(3600),
            export_dir: None,
        }
    }
}

impl JobSchedulerConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            outbox_interval: config.outbox_interval,
            outbox_retention_hours: config.outbox_retention_hours,
            export_interval: config.export_interval,
            export_dir: config.export_dir.clone(),
            ..Self::default()
        }
    }
}

/// Job Scheduler - runs periodic background tasks
pub struct JobScheduler {
    processor: OutboxProcessor,
    repository: Arc<dyn CustomerRepository>,
    config: JobSchedulerConfig,
}

impl JobScheduler {
    /// Create a new job scheduler
    pub fn new(
        processor: OutboxProcessor,
        repository: Arc<dyn CustomerRepository>,
        config: JobSchedulerConfig,
    ) -> Self {
        Self {
            processor,
            repository,
            config,
        }
    }

    /// Start the job scheduler in the background
    /// Returns a handle that can be used to abort the scheduler
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Run the scheduler loop
    async fn run(&self) {
        tracing::info!(
            export_enabled = self.config.export_dir.is_some(),
            "Job scheduler started"
        );

        let mut outbox_interval = interval(self.config.outbox_interval);
        let mut purge_interval = interval(self.config.purge_interval);
        let mut export_interval = interval(self.config.export_interval);

        loop {
            tokio::select! {
                _ = outbox_interval.tick() => {
                    if let Err(e) = process_outbox(&self.processor).await {
                        tracing::error!(error = %e, "Outbox processing failed");
                    }
                }
                _ = purge_interval.tick() => {
                    if let Err(e) = purge_processed_outbox(
                        self.processor.store().as_ref(),
                        self.config.outbox_retention_hours,
                    ).await {
                        tracing::error!(error = %e, "Outbox purge failed");
                    }
                }
                _ = export_interval.tick(), if self.config.export_dir.is_some() => {
                    if let Some(dir) = &self.config.export_dir {
                        if let Err(e) = export_customers(self.repository.as_ref(), dir).await {
                            tracing::error!(error = %e, "Customer export failed");
                        }
                    }
                }
            }
        }
    }

    /// Run all jobs once (for manual trigger or testing)
    pub async fn run_all_once(&self) -> MaintenanceReport {
        let mut report = MaintenanceReport::default();

        match process_outbox(&self.processor).await {
            Ok(result) => report.outbox = result,
            Err(e) => report.errors.push(format!("Outbox processing: {}", e)),
        }

        match purge_processed_outbox(
            self.processor.store().as_ref(),
            self.config.outbox_retention_hours,
        )
        .await
        {
            Ok(count) => report.outbox_messages_purged = count,
            Err(e) => report.errors.push(format!("Outbox purge: {}", e)),
        }

        if let Some(dir) = &self.config.export_dir {
            match export_customers(self.repository.as_ref(), dir).await {
                Ok(result) => report.export = Some(result),
                Err(e) => report.errors.push(format!("Customer export: {}", e)),
            }
        }

        report.completed_at = Utc::now();
        report
    }
}

/// Report from running all jobs once
#[derive(Debug, Clone, Default)]
pub struct MaintenanceReport {
    pub outbox: ProcessReport,
    pub outbox_messages_purged: u64,
    pub export: Option<ExportResult>,
    pub errors: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

/// Job execution errors
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Outbox error: {0}")]
    Outbox(#[from] OutboxError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// =========================================================================
// Tests
// =========================================================================
