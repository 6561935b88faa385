//! PostgreSQL customer repository
//!
//! The customer row, its addresses and the outbox messages for its pending
//! events are written in a single transaction.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use crate::aggregate::{
    Address, AddressDetails, AddressId, AggregateRoot, Customer, CustomerId, CustomerSnapshot,
};
use crate::domain::{AuditState, CustomerNumber, CustomerStatus, EmailAddress};
use crate::outbox::PgOutboxStore;

use super::{pending_messages, CustomerFilter, CustomerRepository, Page, RepositoryError};

const CUSTOMER_COLUMNS: &str = r#"
    id, first_name, last_name, email, number, date_of_birth, status,
    concurrency_version, created_at, created_by, updated_at, updated_by
"#;

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    number: String,
    date_of_birth: Option<NaiveDate>,
    status: String,
    concurrency_version: Uuid,
    created_at: DateTime<Utc>,
    created_by: Option<String>,
    updated_at: Option<DateTime<Utc>>,
    updated_by: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: Uuid,
    customer_id: Uuid,
    name: Option<String>,
    line1: String,
    line2: Option<String>,
    postal_code: String,
    city: String,
    country: String,
    is_primary: bool,
}

impl CustomerRow {
    fn into_customer(self, addresses: Vec<AddressRow>) -> Result<Customer, RepositoryError> {
        let invalid = |field: &str, e: &dyn std::fmt::Display| {
            RepositoryError::InvalidData(format!("customer {} {}: {}", self.id, field, e))
        };

        let email: EmailAddress = self.email.parse().map_err(|e| invalid("email", &e))?;
        let number: CustomerNumber = self.number.parse().map_err(|e| invalid("number", &e))?;
        let status: CustomerStatus = self.status.parse().map_err(|e| invalid("status", &e))?;

        let addresses = addresses
            .into_iter()
            .map(|row| {
                Address::restore(
                    AddressId::from_uuid(row.id),
                    AddressDetails {
                        name: row.name,
                        line1: row.line1,
                        line2: row.line2,
                        postal_code: row.postal_code,
                        city: row.city,
                        country: row.country,
                        is_primary: row.is_primary,
                    },
                )
            })
            .collect();

        Ok(Customer::restore(CustomerSnapshot {
            id: CustomerId::from_uuid(self.id),
            first_name: self.first_name,
            last_name: self.last_name,
            email,
            number,
            date_of_birth: self.date_of_birth,
            status,
            addresses,
            concurrency_version: self.concurrency_version,
            audit: AuditState {
                created_at: Some(self.created_at),
                created_by: self.created_by,
                updated_at: self.updated_at,
                updated_by: self.updated_by,
            },
        }))
    }
}

#[derive(Debug, Clone)]
pub struct PgCustomerRepository {
    pool: PgPool,
}

impl PgCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load addresses for a set of customers, grouped by customer id
    async fn load_addresses(
        &self,
        customer_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<AddressRow>>, RepositoryError> {
        let rows: Vec<AddressRow> = sqlx::query_as(
            r#"
            SELECT id, customer_id, name, line1, line2, postal_code, city, country, is_primary
            FROM customer_addresses
            WHERE customer_id = ANY($1)
            ORDER BY customer_id, position
            "#,
        )
        .bind(customer_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<AddressRow>> = HashMap::new();
        for row in rows {
            grouped.entry(row.customer_id).or_default().push(row);
        }
        Ok(grouped)
    }

    /// Replace the stored addresses with the aggregate's collection
    async fn write_addresses(
        tx: &mut Transaction<'_, Postgres>,
        customer: &Customer,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM customer_addresses WHERE customer_id = $1")
            .bind(customer.aggregate_id())
            .execute(&mut **tx)
            .await?;

        for (position, address) in customer.addresses().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO customer_addresses (
                    id, customer_id, position, name, line1, line2,
                    postal_code, city, country, is_primary
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(address.id().as_uuid())
            .bind(customer.aggregate_id())
            .bind(position as i32)
            .bind(address.name())
            .bind(address.line1())
            .bind(address.line2())
            .bind(address.postal_code())
            .bind(address.city())
            .bind(address.country())
            .bind(address.is_primary())
            .execute(&mut **tx)
            .await
            .map_err(RepositoryError::from_write)?;
        }

        Ok(())
    }
}

/// `ILIKE` pattern for a search term, with wildcards escaped
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl CustomerRepository for PgCustomerRepository {
    async fn find_one(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row: Option<CustomerRow> =
            sqlx::query_as(&format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let addresses = self
            .load_addresses(&[row.id])
            .await?
            .remove(&row.id)
            .unwrap_or_default();

        row.into_customer(addresses).map(Some)
    }

    async fn find_all(&self, filter: &CustomerFilter) -> Result<Page<Customer>, RepositoryError> {
        let filter = filter.normalized();
        let status = filter.status.map(|s| s.as_str());
        let pattern = filter.search.as_deref().map(like_pattern);

        const WHERE: &str = r#"
            WHERE ($1::VARCHAR IS NULL OR status = $1)
              AND ($2::VARCHAR IS NULL
                   OR first_name ILIKE $2 OR last_name ILIKE $2 OR email ILIKE $2)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM customers {WHERE}"))
            .bind(status)
            .bind(pattern.as_deref())
            .fetch_one(&self.pool)
            .await?;

        let rows: Vec<CustomerRow> = sqlx::query_as(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers {WHERE} \
             ORDER BY LOWER(last_name), LOWER(first_name), id LIMIT $3 OFFSET $4"
        ))
        .bind(status)
        .bind(pattern.as_deref())
        .bind(i64::from(filter.page_size))
        .bind(filter.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut addresses = self.load_addresses(&ids).await?;

        let items = rows
            .into_iter()
            .map(|row| {
                let owned = addresses.remove(&row.id).unwrap_or_default();
                row.into_customer(owned)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            total: total.max(0) as u64,
            page: filter.page,
            page_size: filter.page_size,
        })
    }

    async fn exists_by_email(
        &self,
        email: &EmailAddress,
        excluding: Option<CustomerId>,
    ) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM customers
                WHERE email = $1 AND ($2::UUID IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(email.as_str())
        .bind(excluding.map(|id| id.as_uuid()))
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert(&self, customer: &mut Customer) -> Result<(), RepositoryError> {
        let messages = pending_messages(customer)?;
        let audit = customer.audit().clone();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, first_name, last_name, email, number, date_of_birth, status,
                concurrency_version, created_at, created_by, updated_at, updated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, NOW()), $10, $11, $12)
            "#,
        )
        .bind(customer.aggregate_id())
        .bind(customer.first_name())
        .bind(customer.last_name())
        .bind(customer.email().as_str())
        .bind(customer.number().to_string())
        .bind(customer.date_of_birth())
        .bind(customer.status().as_str())
        .bind(customer.concurrency_version())
        .bind(audit.created_at)
        .bind(audit.created_by)
        .bind(audit.updated_at)
        .bind(audit.updated_by)
        .execute(&mut *tx)
        .await
        .map_err(RepositoryError::from_write)?;

        Self::write_addresses(&mut tx, customer).await?;
        PgOutboxStore::enqueue(&mut tx, &messages).await?;

        tx.commit().await?;

        customer.take_domain_events();
        Ok(())
    }

    async fn update(&self, customer: &mut Customer) -> Result<(), RepositoryError> {
        let messages = pending_messages(customer)?;
        let audit = customer.audit().clone();
        let expected = customer.concurrency_version();
        let next_version = Uuid::new_v4();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE customers
            SET first_name = $3, last_name = $4, email = $5, date_of_birth = $6,
                status = $7, concurrency_version = $8, updated_at = $9, updated_by = $10
            WHERE id = $1 AND concurrency_version = $2
            "#,
        )
        .bind(customer.aggregate_id())
        .bind(expected)
        .bind(customer.first_name())
        .bind(customer.last_name())
        .bind(customer.email().as_str())
        .bind(customer.date_of_birth())
        .bind(customer.status().as_str())
        .bind(next_version)
        .bind(audit.updated_at)
        .bind(audit.updated_by)
        .execute(&mut *tx)
        .await
        .map_err(RepositoryError::from_write)?;

        if result.rows_affected() == 0 {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM customers WHERE id = $1)")
                    .bind(customer.aggregate_id())
                    .fetch_one(&mut *tx)
                    .await?;

            return Err(if exists {
                RepositoryError::ConcurrencyConflict {
                    id: customer.aggregate_id(),
                    expected,
                }
            } else {
                RepositoryError::NotFound(customer.aggregate_id())
            });
        }

        Self::write_addresses(&mut tx, customer).await?;
        PgOutboxStore::enqueue(&mut tx, &messages).await?;

        tx.commit().await?;

        customer.take_domain_events();
        customer.set_concurrency_version(next_version);
        Ok(())
    }

    async fn delete(&self, customer: &mut Customer) -> Result<(), RepositoryError> {
        let messages = pending_messages(customer)?;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(customer.aggregate_id())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(customer.aggregate_id()));
        }

        PgOutboxStore::enqueue(&mut tx, &messages).await?;
        tx.commit().await?;

        customer.take_domain_events();
        Ok(())
    }
}
