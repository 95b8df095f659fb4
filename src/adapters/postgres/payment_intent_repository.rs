//! PostgreSQL implementation of PaymentIntentRepository.
//!
//! `transition_terminal` is the serialization point for the whole engine:
//! one `UPDATE ... WHERE status = 'pending' RETURNING` decides which of any
//! number of concurrent callbacks wins, across every running instance.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{corrupt, is_unique_violation, user_id};
use crate::domain::foundation::{
    DomainError, ErrorCode, PaymentIntentId, StateMachine, Timestamp, UserId,
};
use crate::domain::payment::{EntitlementSpec, ExternalRef, PaymentIntent, PaymentPurpose, PaymentStatus};
use crate::ports::{PaymentIntentRepository, TransitionOutcome};

const COLUMNS: &str = "id, owner_id, purpose, amount_cents, status, external_ref, description, \
                       metadata, created_at, completed_at, entitlement_granted_at";

pub struct PostgresPaymentIntentRepository {
    pool: PgPool,
}

impl PostgresPaymentIntentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: &PaymentIntentId) -> Result<Option<PaymentIntent>, DomainError> {
        let row: Option<PaymentIntentRow> =
            sqlx::query_as(&format!("SELECT {} FROM payment_intents WHERE id = $1", COLUMNS))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database("Failed to load payment intent", e))?;

        row.map(PaymentIntent::try_from).transpose()
    }
}

/// Database row representation of a payment intent.
#[derive(Debug, sqlx::FromRow)]
struct PaymentIntentRow {
    id: Uuid,
    owner_id: String,
    purpose: Json<PaymentPurpose>,
    amount_cents: i64,
    status: String,
    external_ref: Option<String>,
    description: String,
    metadata: Json<EntitlementSpec>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    entitlement_granted_at: Option<DateTime<Utc>>,
}

impl TryFrom<PaymentIntentRow> for PaymentIntent {
    type Error = DomainError;

    fn try_from(row: PaymentIntentRow) -> Result<Self, Self::Error> {
        Ok(PaymentIntent {
            id: PaymentIntentId::from_uuid(row.id),
            owner_id: user_id("owner_id", row.owner_id)?,
            purpose: row.purpose.0,
            amount_cents: row.amount_cents,
            status: row
                .status
                .parse::<PaymentStatus>()
                .map_err(|e| corrupt("status", e))?,
            external_ref: row
                .external_ref
                .map(ExternalRef::new)
                .transpose()
                .map_err(|e| corrupt("external_ref", e))?,
            description: row.description,
            metadata: row.metadata.0,
            created_at: Timestamp::from_datetime(row.created_at),
            completed_at: row.completed_at.map(Timestamp::from_datetime),
            entitlement_granted_at: row.entitlement_granted_at.map(Timestamp::from_datetime),
        })
    }
}

fn not_found(id: &PaymentIntentId) -> DomainError {
    DomainError::new(ErrorCode::PaymentNotFound, "Payment intent not found")
        .with_detail("payment_id", id.to_string())
}

#[async_trait]
impl PaymentIntentRepository for PostgresPaymentIntentRepository {
    async fn create(&self, intent: &PaymentIntent) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO payment_intents (
                id, owner_id, purpose, purpose_kind, amount_cents, status, external_ref,
                description, metadata, created_at, completed_at, entitlement_granted_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(intent.id.as_uuid())
        .bind(intent.owner_id.as_str())
        .bind(Json(&intent.purpose))
        .bind(intent.purpose.kind())
        .bind(intent.amount_cents)
        .bind(intent.status.as_str())
        .bind(intent.external_ref.as_ref().map(ExternalRef::as_str))
        .bind(&intent.description)
        .bind(Json(&intent.metadata))
        .bind(intent.created_at.as_datetime())
        .bind(intent.completed_at.map(|t| *t.as_datetime()))
        .bind(intent.entitlement_granted_at.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "payment_intents_pkey") {
                return DomainError::new(ErrorCode::Conflict, "Payment intent already exists")
                    .with_detail("payment_id", intent.id.to_string());
            }
            DomainError::database("Failed to save payment intent", e)
        })?;

        Ok(())
    }

    async fn attach_external_ref(
        &self,
        id: &PaymentIntentId,
        reference: &ExternalRef,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE payment_intents SET external_ref = $2 WHERE id = $1 AND external_ref IS NULL",
        )
        .bind(id.as_uuid())
        .bind(reference.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "payment_intents_external_ref_key") {
                return DomainError::new(ErrorCode::Conflict, "External reference already in use")
                    .with_detail("external_ref", reference.as_str());
            }
            DomainError::database("Failed to attach external reference", e)
        })?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        match self.fetch(id).await? {
            Some(_) => Err(DomainError::new(
                ErrorCode::AlreadyAttached,
                "Payment intent already has an external reference",
            )
            .with_detail("payment_id", id.to_string())),
            None => Err(not_found(id)),
        }
    }

    async fn find_by_id(&self, id: &PaymentIntentId) -> Result<Option<PaymentIntent>, DomainError> {
        self.fetch(id).await
    }

    async fn find_by_external_ref(
        &self,
        reference: &ExternalRef,
    ) -> Result<Option<PaymentIntent>, DomainError> {
        let row: Option<PaymentIntentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payment_intents WHERE external_ref = $1",
            COLUMNS
        ))
        .bind(reference.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to find payment intent by reference", e))?;

        row.map(PaymentIntent::try_from).transpose()
    }

    async fn transition_terminal(
        &self,
        id: &PaymentIntentId,
        status: PaymentStatus,
        at: Timestamp,
    ) -> Result<TransitionOutcome, DomainError> {
        if !PaymentStatus::Pending.can_transition_to(&status) {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("{} is not a terminal payment status", status),
            ));
        }

        let swapped: Option<PaymentIntentRow> = sqlx::query_as(&format!(
            r#"
            UPDATE payment_intents
               SET status = $2, completed_at = $3
             WHERE id = $1 AND status = 'pending'
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(id.as_uuid())
        .bind(status.as_str())
        .bind(at.as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to transition payment intent", e))?;

        if let Some(row) = swapped {
            return Ok(TransitionOutcome {
                applied: true,
                intent: PaymentIntent::try_from(row)?,
            });
        }

        let current = self.fetch(id).await?.ok_or_else(|| not_found(id))?;
        Ok(TransitionOutcome {
            applied: false,
            intent: current,
        })
    }

    async fn mark_entitlement_granted(&self, id: &PaymentIntentId, at: Timestamp) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE payment_intents
               SET entitlement_granted_at = COALESCE(entitlement_granted_at, $2)
             WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to mark entitlement granted", e))?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn find_unactivated(
        &self,
        completed_before: Timestamp,
        limit: u32,
    ) -> Result<Vec<PaymentIntent>, DomainError> {
        let rows: Vec<PaymentIntentRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
              FROM payment_intents
             WHERE status = 'completed'
               AND entitlement_granted_at IS NULL
               AND metadata->>'grant' <> 'none'
               AND completed_at < $1
             ORDER BY completed_at, id
             LIMIT $2
            "#,
            COLUMNS
        ))
        .bind(completed_before.as_datetime())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to list unactivated payments", e))?;

        rows.into_iter().map(PaymentIntent::try_from).collect()
    }

    async fn first_completed_for_owner(&self, owner_id: &UserId) -> Result<Option<PaymentIntentId>, DomainError> {
        let id: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id
              FROM payment_intents
             WHERE owner_id = $1 AND status = 'completed'
             ORDER BY completed_at, id
             LIMIT 1
            "#,
        )
        .bind(owner_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to find first completed payment", e))?;

        Ok(id.map(PaymentIntentId::from_uuid))
    }

    async fn find_stale_pending(
        &self,
        created_before: Timestamp,
        limit: u32,
    ) -> Result<Vec<PaymentIntentId>, DomainError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id
              FROM payment_intents
             WHERE status = 'pending' AND created_at < $1
             ORDER BY created_at
             LIMIT $2
            "#,
        )
        .bind(created_before.as_datetime())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to list stale pending payments", e))?;

        Ok(ids.into_iter().map(PaymentIntentId::from_uuid).collect())
    }
}
