//! PostgreSQL implementation of DeferredTaskRepository.
//!
//! `claim_due` leases rows by pushing `next_attempt_at` forward inside the
//! same statement that selects them, with `SKIP LOCKED` so concurrent
//! workers never claim the same task.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

use super::corrupt;
use crate::domain::entitlement::{DeferredTask, TaskKind, TaskState};
use crate::domain::foundation::{DomainError, PaymentIntentId, Timestamp};
use crate::ports::{DeferredTaskRepository, SaveResult};

const COLUMNS: &str =
    "payment_intent_id, kind, state, attempts, last_error, next_attempt_at, created_at, updated_at";

pub struct PostgresDeferredTaskRepository {
    pool: PgPool,
}

impl PostgresDeferredTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DeferredTaskRow {
    payment_intent_id: Uuid,
    kind: String,
    state: String,
    attempts: i32,
    last_error: String,
    next_attempt_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DeferredTaskRow> for DeferredTask {
    type Error = DomainError;

    fn try_from(row: DeferredTaskRow) -> Result<Self, Self::Error> {
        Ok(DeferredTask {
            payment_intent_id: PaymentIntentId::from_uuid(row.payment_intent_id),
            kind: row.kind.parse::<TaskKind>().map_err(|e| corrupt("kind", e))?,
            state: row.state.parse::<TaskState>().map_err(|e| corrupt("state", e))?,
            attempts: u32::try_from(row.attempts).map_err(|e| corrupt("attempts", e))?,
            last_error: row.last_error,
            next_attempt_at: Timestamp::from_datetime(row.next_attempt_at),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn attempts_column(attempts: u32) -> i32 {
    i32::try_from(attempts).unwrap_or(i32::MAX)
}

#[async_trait]
impl DeferredTaskRepository for PostgresDeferredTaskRepository {
    async fn schedule(&self, task: &DeferredTask) -> Result<SaveResult, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO deferred_tasks (
                payment_intent_id, kind, state, attempts, last_error,
                next_attempt_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (payment_intent_id, kind) DO NOTHING
            "#,
        )
        .bind(task.payment_intent_id.as_uuid())
        .bind(task.kind.as_str())
        .bind(task.state.as_str())
        .bind(attempts_column(task.attempts))
        .bind(&task.last_error)
        .bind(task.next_attempt_at.as_datetime())
        .bind(task.created_at.as_datetime())
        .bind(task.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to schedule deferred task", e))?;

        if result.rows_affected() == 1 {
            Ok(SaveResult::Inserted)
        } else {
            Ok(SaveResult::AlreadyExists)
        }
    }

    async fn claim_due(
        &self,
        now: Timestamp,
        lease: Duration,
        limit: u32,
    ) -> Result<Vec<DeferredTask>, DomainError> {
        let leased_until = now.plus(lease);

        // RETURNING reports the leased next_attempt_at; callers only read
        // the identity and attempt count of a claimed task.
        let rows: Vec<DeferredTaskRow> = sqlx::query_as(&format!(
            r#"
            UPDATE deferred_tasks
               SET next_attempt_at = $2
             WHERE (payment_intent_id, kind) IN (
                    SELECT payment_intent_id, kind
                      FROM deferred_tasks
                     WHERE state = 'scheduled' AND next_attempt_at <= $1
                     ORDER BY next_attempt_at
                     LIMIT $3
                     FOR UPDATE SKIP LOCKED
                   )
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(now.as_datetime())
        .bind(leased_until.as_datetime())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to claim deferred tasks", e))?;

        rows.into_iter().map(DeferredTask::try_from).collect()
    }

    async fn update(&self, task: &DeferredTask) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE deferred_tasks
               SET state = $3, attempts = $4, last_error = $5,
                   next_attempt_at = $6, updated_at = $7
             WHERE payment_intent_id = $1 AND kind = $2
            "#,
        )
        .bind(task.payment_intent_id.as_uuid())
        .bind(task.kind.as_str())
        .bind(task.state.as_str())
        .bind(attempts_column(task.attempts))
        .bind(&task.last_error)
        .bind(task.next_attempt_at.as_datetime())
        .bind(task.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to update deferred task", e))?;

        if result.rows_affected() == 0 {
            tracing::debug!(
                payment_id = %task.payment_intent_id,
                kind = %task.kind,
                "Deferred task completed elsewhere before update"
            );
        }
        Ok(())
    }

    async fn complete(&self, payment_intent_id: &PaymentIntentId, kind: TaskKind) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM deferred_tasks WHERE payment_intent_id = $1 AND kind = $2")
            .bind(payment_intent_id.as_uuid())
            .bind(kind.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to complete deferred task", e))?;

        Ok(())
    }

    async fn find(
        &self,
        payment_intent_id: &PaymentIntentId,
        kind: TaskKind,
    ) -> Result<Option<DeferredTask>, DomainError> {
        let row: Option<DeferredTaskRow> = sqlx::query_as(&format!(
            "SELECT {} FROM deferred_tasks WHERE payment_intent_id = $1 AND kind = $2",
            COLUMNS
        ))
        .bind(payment_intent_id.as_uuid())
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to find deferred task", e))?;

        row.map(DeferredTask::try_from).transpose()
    }
}
