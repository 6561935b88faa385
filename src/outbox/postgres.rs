//! PostgreSQL outbox store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{OutboxError, OutboxMessage, OutboxStatus, OutboxStore};

type OutboxRow = (
    Uuid,
    String,
    Uuid,
    String,
    serde_json::Value,
    String,
    i32,
    Option<String>,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
);

#[derive(Debug, Clone)]
pub struct PgOutboxStore {
    pool: PgPool,
}

impl PgOutboxStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert messages inside the caller's transaction
    pub async fn enqueue(
        tx: &mut Transaction<'_, Postgres>,
        messages: &[OutboxMessage],
    ) -> Result<(), sqlx::Error> {
        for message in messages {
            sqlx::query(
                r#"
                INSERT INTO outbox_messages (
                    id, aggregate_type, aggregate_id, event_type,
                    payload, status, attempts, created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, 0, $7)
                "#,
            )
            .bind(message.id)
            .bind(&message.aggregate_type)
            .bind(message.aggregate_id)
            .bind(&message.event_type)
            .bind(&message.payload)
            .bind(message.status.as_str())
            .bind(message.created_at)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}

fn into_message(row: OutboxRow) -> Result<OutboxMessage, OutboxError> {
    let (id, aggregate_type, aggregate_id, event_type, payload, status, attempts, last_error, created_at, processed_at) = row;

    Ok(OutboxMessage {
        id,
        aggregate_type,
        aggregate_id,
        event_type,
        payload,
        status: status.parse()?,
        attempts,
        last_error,
        created_at,
        processed_at,
    })
}

#[async_trait]
impl OutboxStore for PgOutboxStore {
    async fn fetch_pending(&self, limit: u32) -> Result<Vec<OutboxMessage>, OutboxError> {
        let rows: Vec<OutboxRow> = sqlx::query_as(
            r#"
            SELECT id, aggregate_type, aggregate_id, event_type, payload,
                   status, attempts, last_error, created_at, processed_at
            FROM outbox_messages
            WHERE status = 'pending'
            ORDER BY created_at
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(into_message).collect()
    }

    async fn mark_processed(&self, id: Uuid) -> Result<(), OutboxError> {
        let result = sqlx::query(
            r#"
            UPDATE outbox_messages
            SET status = 'processed', processed_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(OutboxError::NotFound(id));
        }

        Ok(())
    }

    async fn mark_attempt_failed(
        &self,
        id: Uuid,
        error: &str,
        max_attempts: i32,
    ) -> Result<OutboxStatus, OutboxError> {
        let status: Option<String> = sqlx::query_scalar(
            r#"
            UPDATE outbox_messages
            SET attempts = attempts + 1,
                last_error = $2,
                status = CASE WHEN attempts + 1 >= $3 THEN 'failed' ELSE 'pending' END
            WHERE id = $1
            RETURNING status
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(max_attempts)
        .fetch_optional(&self.pool)
        .await?;

        status.ok_or(OutboxError::NotFound(id))?.parse()
    }

    async fn purge_processed(&self, older_than: DateTime<Utc>) -> Result<u64, OutboxError> {
        let result = sqlx::query(
            r#"
            DELETE FROM outbox_messages
            WHERE status = 'processed' AND processed_at < $1
            "#,
        )
        .bind(older_than)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn pending_count(&self) -> Result<u64, OutboxError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM outbox_messages WHERE status = 'pending'")
                .fetch_one(&self.pool)
                .await?;

        Ok(count.max(0) as u64)
    }
}
