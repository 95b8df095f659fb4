//! PostgreSQL implementation of ListingCreditRepository.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::entitlement::ListingCredit;
use crate::domain::foundation::{DomainError, UserId};
use crate::ports::{ListingCreditRepository, SaveResult};

pub struct PostgresListingCreditRepository {
    pool: PgPool,
}

impl PostgresListingCreditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListingCreditRepository for PostgresListingCreditRepository {
    async fn grant(&self, credit: &ListingCredit) -> Result<SaveResult, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO listing_credits (payment_intent_id, owner_id, tier, slots, granted_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (payment_intent_id) DO NOTHING
            "#,
        )
        .bind(credit.payment_intent_id.as_uuid())
        .bind(credit.owner_id.as_str())
        .bind(&credit.tier)
        .bind(credit.slots)
        .bind(credit.granted_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to grant listing credit", e))?;

        if result.rows_affected() == 1 {
            Ok(SaveResult::Inserted)
        } else {
            Ok(SaveResult::AlreadyExists)
        }
    }

    async fn purchased_slots(&self, owner_id: &UserId) -> Result<i64, DomainError> {
        // SUM over INTEGER yields BIGINT in Postgres.
        let total: Option<i64> =
            sqlx::query_scalar("SELECT SUM(slots) FROM listing_credits WHERE owner_id = $1")
                .bind(owner_id.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| DomainError::database("Failed to sum listing credits", e))?;

        Ok(total.unwrap_or(0))
    }
}
