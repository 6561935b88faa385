//! Handler tests
//!
//! Run against the in-memory repository and sequence generator, so no
//! database is required.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use tokio_test::{assert_err, assert_ok};
    use uuid::Uuid;

    use crate::domain::{CustomerStatus, OperationContext};
    use crate::error::AppError;
    use crate::handlers::{
        AddressModel, CreateCustomerCommand, CreateCustomerHandler, CustomerModel,
        DeleteCustomerCommand, DeleteCustomerHandler, FindAllCustomersHandler,
        FindAllCustomersQuery, FindOneCustomerHandler, FindOneCustomerQuery,
        UpdateCustomerCommand, UpdateCustomerHandler,
    };
    use crate::outbox::OutboxStore;
    use crate::repository::{
        CustomerFilter, CustomerRepository, InMemoryCustomerRepository, InMemorySequenceGenerator,
    };

    struct Fixture {
        store: InMemoryCustomerRepository,
        create: CreateCustomerHandler,
        update: UpdateCustomerHandler,
        delete: DeleteCustomerHandler,
        find_one: FindOneCustomerHandler,
        find_all: FindAllCustomersHandler,
        context: OperationContext,
    }

    fn fixture() -> Fixture {
        let store = InMemoryCustomerRepository::default();
        let repository: Arc<dyn CustomerRepository> = Arc::new(store.clone());
        let sequences = Arc::new(InMemorySequenceGenerator::new());

        Fixture {
            create: CreateCustomerHandler::new(repository.clone(), sequences),
            update: UpdateCustomerHandler::new(repository.clone()),
            delete: DeleteCustomerHandler::new(repository.clone()),
            find_one: FindOneCustomerHandler::new(repository.clone()),
            find_all: FindAllCustomersHandler::new(repository),
            store,
            context: OperationContext::new().with_correlation_id(Uuid::new_v4()),
        }
    }

    async fn create(fx: &Fixture, first: &str, last: &str, email: &str) -> CustomerModel {
        fx.create
            .execute(
                CreateCustomerCommand::new(CustomerModel::new(first, last, email)),
                &fx.context,
            )
            .await
            .unwrap()
    }

    // =========================================================================
    // Create
    // =========================================================================

    #[tokio::test]
    async fn test_create_customer() {
        let fx = fixture();
        let model = CustomerModel::new("John", "Doe", " John.Doe@Example.com ")
            .with_status(CustomerStatus::Active)
            .with_date_of_birth(NaiveDate::from_ymd_opt(1990, 2, 3).unwrap())
            .with_address(AddressModel::new("1 Main Street", "1000", "Brussels", "BE").primary());

        let created = assert_ok!(
            fx.create
                .execute(CreateCustomerCommand::new(model), &fx.context)
                .await
        );

        assert!(created.id.is_some());
        assert_eq!(created.email, "john.doe@example.com");
        assert_eq!(created.status, Some(CustomerStatus::Active));
        assert_eq!(created.addresses.len(), 1);
        assert!(created.concurrency_version.is_some());

        let number = created.number.unwrap();
        assert!(number.starts_with("CUS-"));
        assert!(number.ends_with("-100000"));

        // Changes applied after creation fold into one update event
        let messages = fx.store.outbox().messages().await;
        let types: Vec<_> = messages.iter().map(|m| m.event_type.as_str()).collect();
        assert_eq!(types, vec!["CustomerCreated", "CustomerUpdated"]);
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_numbers() {
        let fx = fixture();
        let first = create(&fx, "John", "Doe", "john@example.com").await;
        let second = create(&fx, "Jane", "Doe", "jane@example.com").await;

        assert!(first.number.unwrap().ends_with("-100000"));
        assert!(second.number.unwrap().ends_with("-100001"));
    }

    #[tokio::test]
    async fn test_create_invalid_model_is_validation_error() {
        let fx = fixture();
        let result = fx
            .create
            .execute(
                CreateCustomerCommand::new(CustomerModel::new("", "Doe", "not-an-email")),
                &fx.context,
            )
            .await;

        match assert_err!(result) {
            AppError::Validation(messages) => assert_eq!(messages.len(), 2),
            other => panic!("Expected Validation, got: {:?}", other),
        }
        assert!(fx.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_duplicate_email_is_business_rule_violation() {
        let fx = fixture();
        create(&fx, "John", "Doe", "john@example.com").await;

        let result = fx
            .create
            .execute(
                CreateCustomerCommand::new(CustomerModel::new("Johnny", "Doe", "JOHN@example.com")),
                &fx.context,
            )
            .await;

        let err = assert_err!(result);
        assert_eq!(err.status_code(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(fx.store.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_future_birth_date_rejected() {
        let fx = fixture();
        let model = CustomerModel::new("John", "Doe", "john@example.com")
            .with_date_of_birth(NaiveDate::from_ymd_opt(2999, 1, 1).unwrap());

        let result = fx
            .create
            .execute(CreateCustomerCommand::new(model), &fx.context)
            .await;

        assert!(matches!(result, Err(AppError::Domain(_))));
        assert!(fx.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_normalizes_padded_email() {
        let fx = fixture();
        let created = assert_ok!(
            fx.create
                .execute(
                    CreateCustomerCommand::new(CustomerModel::new(" John ", "Doe", "  John@Example.com ")),
                    &fx.context,
                )
                .await
        );

        assert_eq!(created.email, "john@example.com");
        assert_eq!(created.first_name, "John");
    }

    #[tokio::test]
    async fn test_rejected_create_does_not_use_a_number() {
        let fx = fixture();

        let future_birth = CustomerModel::new("John", "Doe", "john@example.com")
            .with_date_of_birth(NaiveDate::from_ymd_opt(2999, 1, 1).unwrap());
        assert_err!(
            fx.create
                .execute(CreateCustomerCommand::new(future_birth), &fx.context)
                .await
        );

        let bad_address = CustomerModel::new("John", "Doe", "john@example.com")
            .with_address(AddressModel::new("1 Main Street", "1000", "   ", "BE"));
        assert_err!(
            fx.create
                .execute(CreateCustomerCommand::new(bad_address), &fx.context)
                .await
        );

        let mut unknown_address = AddressModel::new("1 Main Street", "1000", "Brussels", "BE");
        unknown_address.id = Some(Uuid::new_v4());
        let with_id = CustomerModel::new("John", "Doe", "john@example.com").with_address(unknown_address);
        assert_err!(
            fx.create
                .execute(CreateCustomerCommand::new(with_id), &fx.context)
                .await
        );

        let created = create(&fx, "John", "Doe", "john@example.com").await;
        assert!(created.number.unwrap().ends_with("-100000"));
    }

    // =========================================================================
    // Update
    // =========================================================================

    #[tokio::test]
    async fn test_update_customer() {
        let fx = fixture();
        let created = create(&fx, "John", "Doe", "john@example.com").await;
        let id = created.id.unwrap();

        let mut model = created.clone();
        model.first_name = "Jonathan".to_string();
        model.status = Some(CustomerStatus::Retired);

        let updated = assert_ok!(
            fx.update
                .execute(UpdateCustomerCommand::new(id, model), &fx.context)
                .await
        );

        assert_eq!(updated.first_name, "Jonathan");
        assert_eq!(updated.status, Some(CustomerStatus::Retired));
        assert_eq!(updated.number, created.number);
        assert_ne!(updated.concurrency_version, created.concurrency_version);
    }

    #[tokio::test]
    async fn test_update_with_stale_token_is_conflict() {
        let fx = fixture();
        let created = create(&fx, "John", "Doe", "john@example.com").await;
        let id = created.id.unwrap();

        let mut first = created.clone();
        first.last_name = "Smith".to_string();
        assert_ok!(
            fx.update
                .execute(UpdateCustomerCommand::new(id, first), &fx.context)
                .await
        );

        let mut stale = created;
        stale.last_name = "Jones".to_string();
        let result = fx
            .update
            .execute(UpdateCustomerCommand::new(id, stale), &fx.context)
            .await;

        assert!(matches!(result, Err(AppError::ConcurrencyConflict(conflict)) if conflict == id));
    }

    #[tokio::test]
    async fn test_update_missing_customer_is_not_found() {
        let fx = fixture();
        let id = Uuid::new_v4();
        let mut model = CustomerModel::new("John", "Doe", "john@example.com");
        model.concurrency_version = Some(Uuid::new_v4());

        let result = fx
            .update
            .execute(UpdateCustomerCommand::new(id, model), &fx.context)
            .await;

        assert!(matches!(result, Err(AppError::CustomerNotFound(missing)) if missing == id));
    }

    #[tokio::test]
    async fn test_update_requires_token_and_matching_id() {
        let fx = fixture();
        let created = create(&fx, "John", "Doe", "john@example.com").await;
        let id = created.id.unwrap();

        let mut no_token = created.clone();
        no_token.concurrency_version = None;
        let result = fx
            .update
            .execute(UpdateCustomerCommand::new(id, no_token), &fx.context)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = fx
            .update
            .execute(UpdateCustomerCommand::new(Uuid::new_v4(), created), &fx.context)
            .await;
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_update_to_taken_email_is_business_rule_violation() {
        let fx = fixture();
        create(&fx, "Jane", "Doe", "jane@example.com").await;
        let john = create(&fx, "John", "Doe", "john@example.com").await;

        let mut model = john.clone();
        model.email = "jane@example.com".to_string();
        let result = fx
            .update
            .execute(UpdateCustomerCommand::new(john.id.unwrap(), model), &fx.context)
            .await;

        assert!(matches!(result, Err(AppError::Domain(ref e)) if !e.is_validation()));
    }

    #[tokio::test]
    async fn test_update_without_changes_keeps_token() {
        let fx = fixture();
        let created = create(&fx, "John", "Doe", "john@example.com").await;

        let unchanged = assert_ok!(
            fx.update
                .execute(
                    UpdateCustomerCommand::new(created.id.unwrap(), created.clone()),
                    &fx.context
                )
                .await
        );

        assert_eq!(unchanged.concurrency_version, created.concurrency_version);
        assert_eq!(fx.store.outbox().pending_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_syncs_addresses() {
        let fx = fixture();
        let model = CustomerModel::new("John", "Doe", "john@example.com")
            .with_address(AddressModel::new("1 Main Street", "1000", "Brussels", "BE"))
            .with_address(AddressModel::new("2 Office Park", "2000", "Antwerp", "BE"));
        let created = fx
            .create
            .execute(CreateCustomerCommand::new(model), &fx.context)
            .await
            .unwrap();

        let mut model = created.clone();
        model.addresses.remove(1);
        model.addresses[0].is_primary = true;

        let updated = fx
            .update
            .execute(UpdateCustomerCommand::new(created.id.unwrap(), model), &fx.context)
            .await
            .unwrap();

        assert_eq!(updated.addresses.len(), 1);
        assert_eq!(updated.addresses[0].id, created.addresses[0].id);
        assert!(updated.addresses[0].is_primary);
    }

    // =========================================================================
    // Delete & queries
    // =========================================================================

    #[tokio::test]
    async fn test_delete_customer() {
        let fx = fixture();
        let created = create(&fx, "John", "Doe", "john@example.com").await;
        let id = created.id.unwrap();

        assert_ok!(
            fx.delete
                .execute(DeleteCustomerCommand::new(id), &fx.context)
                .await
        );

        let result = fx.find_one.execute(FindOneCustomerQuery::new(id)).await;
        assert!(matches!(result, Err(AppError::CustomerNotFound(_))));

        let result = fx
            .delete
            .execute(DeleteCustomerCommand::new(id), &fx.context)
            .await;
        assert!(matches!(result, Err(AppError::CustomerNotFound(_))));
    }

    #[tokio::test]
    async fn test_find_one_customer() {
        let fx = fixture();
        let created = create(&fx, "John", "Doe", "john@example.com").await;

        let found = assert_ok!(
            fx.find_one
                .execute(FindOneCustomerQuery::new(created.id.unwrap()))
                .await
        );
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn test_find_all_customers() {
        let fx = fixture();
        create(&fx, "Zoe", "Adams", "zoe@example.com").await;
        create(&fx, "Anna", "Smith", "anna@example.com").await;
        let bob = create(&fx, "Bob", "Adams", "bob@example.com").await;

        let mut active = bob.clone();
        active.status = Some(CustomerStatus::Active);
        fx.update
            .execute(UpdateCustomerCommand::new(bob.id.unwrap(), active), &fx.context)
            .await
            .unwrap();

        let page = fx
            .find_all
            .execute(FindAllCustomersQuery::default())
            .await
            .unwrap();
        let names: Vec<_> = page.items.iter().map(|m| m.first_name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Zoe", "Anna"]);
        assert_eq!(page.total, 3);

        let page = fx
            .find_all
            .execute(FindAllCustomersQuery::new(
                CustomerFilter::default().with_status(CustomerStatus::Active),
            ))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].first_name, "Bob");
    }
}
