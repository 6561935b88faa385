//! API Routes
//!
//! HTTP endpoint definitions for the customer resource.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{CustomerStatus, DomainError, OperationContext};
use crate::error::AppError;
use crate::handlers::{
    CreateCustomerCommand, CustomerModel, DeleteCustomerCommand, FindAllCustomersQuery,
    FindOneCustomerQuery, UpdateCustomerCommand,
};
use crate::repository::{CustomerFilter, DEFAULT_PAGE_SIZE};
use crate::state::AppState;

/// Base path of the customer resource
pub const CUSTOMERS_PATH: &str = "/api/coremodule/customers";

/// Header with the unpaged number of matching customers
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

// =========================================================================
// Request types
// =========================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ListCustomersParams {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl ListCustomersParams {
    fn into_filter(self) -> Result<CustomerFilter, AppError> {
        let status = self
            .status
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.parse::<CustomerStatus>())
            .transpose()
            .map_err(DomainError::from)?;

        Ok(CustomerFilter {
            status,
            search: self.search,
            page: self.page.unwrap_or(1),
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        })
    }
}

// =========================================================================
// Router
// =========================================================================

/// Customer routes, nested under `CUSTOMERS_PATH`
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route(
            "/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
}

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidRequest(format!("Invalid customer id: {}", raw)))
}

fn json_body(payload: Result<Json<CustomerModel>, JsonRejection>) -> Result<CustomerModel, AppError> {
    payload
        .map(|Json(model)| model)
        .map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))
}

// =========================================================================
// Handlers
// =========================================================================

/// GET /api/coremodule/customers
async fn list_customers(
    State(state): State<AppState>,
    params: Result<Query<ListCustomersParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(params) = params.map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))?;
    let filter = params.into_filter()?;

    let page = state
        .find_all_handler()
        .execute(FindAllCustomersQuery::new(filter))
        .await?;

    Ok((
        [(TOTAL_COUNT_HEADER, page.total.to_string())],
        Json(page.items),
    )
        .into_response())
}

/// GET /api/coremodule/customers/:id
async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CustomerModel>, AppError> {
    let id = parse_id(&id)?;
    let model = state
        .find_one_handler()
        .execute(FindOneCustomerQuery::new(id))
        .await?;

    Ok(Json(model))
}

/// POST /api/coremodule/customers
async fn create_customer(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    payload: Result<Json<CustomerModel>, JsonRejection>,
) -> Result<Response, AppError> {
    let model = json_body(payload)?;

    let created = state
        .create_handler()
        .execute(CreateCustomerCommand::new(model), &context)
        .await?;

    let location = created
        .id
        .map(|id| format!("{}/{}", CUSTOMERS_PATH, id))
        .ok_or_else(|| AppError::Internal("Created customer has no id".to_string()))?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(created),
    )
        .into_response())
}

/// PUT /api/coremodule/customers/:id
async fn update_customer(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(id): Path<String>,
    payload: Result<Json<CustomerModel>, JsonRejection>,
) -> Result<Json<CustomerModel>, AppError> {
    let id = parse_id(&id)?;
    let model = json_body(payload)?;

    let updated = state
        .update_handler()
        .execute(UpdateCustomerCommand::new(id, model), &context)
        .await?;

    Ok(Json(updated))
}

/// DELETE /api/coremodule/customers/:id
async fn delete_customer(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;

    state
        .delete_handler()
        .execute(DeleteCustomerCommand::new(id), &context)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_into_filter() {
        let params = ListCustomersParams {
            status: Some("active".to_string()),
            search: Some("doe".to_string()),
            page: Some(2),
            page_size: None,
        };

        let filter = params.into_filter().unwrap();
        assert_eq!(filter.status, Some(CustomerStatus::Active));
        assert_eq!(filter.page, 2);
        assert_eq!(filter.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_params_invalid_status() {
        let params = ListCustomersParams {
            status: Some("sleeping".to_string()),
            ..ListCustomersParams::default()
        };

        let err = params.into_filter().unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
        assert!(matches!(parse_id("42"), Err(AppError::InvalidRequest(_))));
    }
}
