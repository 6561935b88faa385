//! Background Job Integration Tests

use std::sync::Arc;

use getting_started::domain::OperationContext;
use getting_started::handlers::{CreateCustomerCommand, CustomerModel, DeleteCustomerCommand};
use getting_started::jobs::{
    export_customers, process_outbox, purge_processed_outbox, JobScheduler, JobSchedulerConfig,
};
use getting_started::outbox::OutboxStore;
use getting_started::AppState;

async fn seed(state: &AppState, count: usize) -> Vec<CustomerModel> {
    let handler = state.create_handler();
    let context = OperationContext::new();
    let mut created = Vec::new();

    for i in 0..count {
        let model = CustomerModel::new("Test", &format!("Customer{:03}", i), &format!("customer{}@example.com", i));
        created.push(
            handler
                .execute(CreateCustomerCommand::new(model), &context)
                .await
                .unwrap(),
        );
    }

    created
}

#[tokio::test]
async fn test_export_writes_all_customers() {
    let state = AppState::in_memory("test");
    seed(&state, 3).await;
    let dir = tempfile::tempdir().unwrap();

    let result = export_customers(state.repository.as_ref(), dir.path()).await.unwrap();
    assert_eq!(result.count, 3);
    assert!(result.path.starts_with(dir.path()));

    let file_name = result.path.file_name().unwrap().to_str().unwrap();
    assert!(file_name.starts_with("customers-"));
    assert!(file_name.ends_with(".json"));

    let content = tokio::fs::read(&result.path).await.unwrap();
    let exported: Vec<CustomerModel> = serde_json::from_slice(&content).unwrap();
    let last_names: Vec<_> = exported.iter().map(|c| c.last_name.as_str()).collect();
    assert_eq!(last_names, vec!["Customer000", "Customer001", "Customer002"]);
}

#[tokio::test]
async fn test_export_empty_repository() {
    let state = AppState::in_memory("test");
    let dir = tempfile::tempdir().unwrap();

    let result = export_customers(state.repository.as_ref(), &dir.path().join("nested")).await.unwrap();
    assert_eq!(result.count, 0);
    assert!(result.path.exists());
}

#[tokio::test]
async fn test_outbox_processing_drains_pending_messages() {
    let state = AppState::in_memory("test");
    let created = seed(&state, 2).await;

    state
        .delete_handler()
        .execute(
            DeleteCustomerCommand::new(created[0].id.unwrap()),
            &OperationContext::new(),
        )
        .await
        .unwrap();
    assert_eq!(state.outbox.pending_count().await.unwrap(), 3);

    let processor = state.outbox_processor(10, 3);
    let report = process_outbox(&processor).await.unwrap();
    assert_eq!(report.fetched, 3);
    assert_eq!(report.processed, 3);
    assert_eq!(report.failed, 0);
    assert_eq!(state.outbox.pending_count().await.unwrap(), 0);

    let report = process_outbox(&processor).await.unwrap();
    assert_eq!(report.fetched, 0);
}

#[tokio::test]
async fn test_purge_respects_retention() {
    let state = AppState::in_memory("test");
    seed(&state, 1).await;
    process_outbox(&state.outbox_processor(10, 3)).await.unwrap();

    // Freshly processed messages are inside a 24 hour window
    assert_eq!(purge_processed_outbox(state.outbox.as_ref(), 24).await.unwrap(), 0);
    // A zero-hour window purges everything processed so far
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    assert_eq!(purge_processed_outbox(state.outbox.as_ref(), 0).await.unwrap(), 1);
    assert_eq!(state.outbox.pending_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_run_all_once() {
    let state = AppState::in_memory("test");
    seed(&state, 2).await;
    let dir = tempfile::tempdir().unwrap();

    let scheduler = JobScheduler::new(
        state.outbox_processor(10, 3),
        Arc::clone(&state.repository),
        JobSchedulerConfig {
            export_dir: Some(dir.path().to_path_buf()),
            ..JobSchedulerConfig::default()
        },
    );

    let report = scheduler.run_all_once().await;
    assert!(report.errors.is_empty(), "errors: {:?}", report.errors);
    assert_eq!(report.outbox.processed, 2);
    assert_eq!(report.export.map(|e| e.count), Some(2));

    assert!(state.outbox.fetch_pending(10).await.unwrap().is_empty());
}
