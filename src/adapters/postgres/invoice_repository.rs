//! PostgreSQL implementation of InvoiceRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{is_unique_violation, user_id};
use crate::domain::entitlement::Invoice;
use crate::domain::foundation::{DomainError, InvoiceId, PaymentIntentId, Timestamp};
use crate::ports::{InvoiceRepository, SaveResult};

pub struct PostgresInvoiceRepository {
    pool: PgPool,
}

impl PostgresInvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: Uuid,
    number: String,
    payment_intent_id: Uuid,
    owner_id: String,
    amount_cents: i64,
    description: String,
    issued_at: DateTime<Utc>,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = DomainError;

    fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
        Ok(Invoice {
            id: InvoiceId::from_uuid(row.id),
            number: row.number,
            payment_intent_id: PaymentIntentId::from_uuid(row.payment_intent_id),
            owner_id: user_id("owner_id", row.owner_id)?,
            amount_cents: row.amount_cents,
            description: row.description,
            issued_at: Timestamp::from_datetime(row.issued_at),
        })
    }
}

#[async_trait]
impl InvoiceRepository for PostgresInvoiceRepository {
    async fn insert(&self, invoice: &Invoice) -> Result<SaveResult, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO invoices (
                id, number, payment_intent_id, owner_id, amount_cents, description, issued_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(invoice.id.as_uuid())
        .bind(&invoice.number)
        .bind(invoice.payment_intent_id.as_uuid())
        .bind(invoice.owner_id.as_str())
        .bind(invoice.amount_cents)
        .bind(&invoice.description)
        .bind(invoice.issued_at.as_datetime())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(SaveResult::Inserted),
            Err(e) if is_unique_violation(&e, "invoices_payment_intent_id_key") => {
                Ok(SaveResult::AlreadyExists)
            }
            Err(e) => Err(DomainError::database("Failed to insert invoice", e)),
        }
    }

    async fn find_by_payment_intent(
        &self,
        payment_intent_id: &PaymentIntentId,
    ) -> Result<Option<Invoice>, DomainError> {
        let row: Option<InvoiceRow> = sqlx::query_as(
            r#"
            SELECT id, number, payment_intent_id, owner_id, amount_cents, description, issued_at
              FROM invoices
             WHERE payment_intent_id = $1
            "#,
        )
        .bind(payment_intent_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to find invoice", e))?;

        row.map(Invoice::try_from).transpose()
    }
}
