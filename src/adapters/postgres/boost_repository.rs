//! PostgreSQL implementation of BoostRepository.
//!
//! The `properties` table belongs to the listings service. Only the
//! featured columns are touched here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{corrupt, user_id};
use crate::domain::entitlement::ListingBoost;
use crate::domain::foundation::{DomainError, PaymentIntentId, PropertyId, Timestamp};
use crate::ports::{BoostRepository, SaveResult};

pub struct PostgresBoostRepository {
    pool: PgPool,
}

impl PostgresBoostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BoostRow {
    property_id: i64,
    payment_intent_id: Uuid,
    owner_id: String,
    boost_type: String,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
}

impl TryFrom<BoostRow> for ListingBoost {
    type Error = DomainError;

    fn try_from(row: BoostRow) -> Result<Self, Self::Error> {
        Ok(ListingBoost {
            property_id: PropertyId::new(row.property_id).map_err(|e| corrupt("property_id", e))?,
            payment_intent_id: PaymentIntentId::from_uuid(row.payment_intent_id),
            owner_id: user_id("owner_id", row.owner_id)?,
            boost_type: row.boost_type,
            starts_at: Timestamp::from_datetime(row.starts_at),
            ends_at: Timestamp::from_datetime(row.ends_at),
        })
    }
}

#[async_trait]
impl BoostRepository for PostgresBoostRepository {
    async fn insert(&self, boost: &ListingBoost) -> Result<SaveResult, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO listing_boosts (
                property_id, payment_intent_id, owner_id, boost_type, starts_at, ends_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(boost.property_id.value())
        .bind(boost.payment_intent_id.as_uuid())
        .bind(boost.owner_id.as_str())
        .bind(&boost.boost_type)
        .bind(boost.starts_at.as_datetime())
        .bind(boost.ends_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to insert listing boost", e))?;

        if result.rows_affected() == 1 {
            Ok(SaveResult::Inserted)
        } else {
            Ok(SaveResult::AlreadyExists)
        }
    }

    async fn find_by_payment(
        &self,
        payment_intent_id: &PaymentIntentId,
    ) -> Result<Option<ListingBoost>, DomainError> {
        let row: Option<BoostRow> = sqlx::query_as(
            r#"
            SELECT property_id, payment_intent_id, owner_id, boost_type, starts_at, ends_at
              FROM listing_boosts
             WHERE payment_intent_id = $1
            "#,
        )
        .bind(payment_intent_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to find listing boost", e))?;

        row.map(ListingBoost::try_from).transpose()
    }

    async fn find_by_property(&self, property_id: &PropertyId) -> Result<Vec<ListingBoost>, DomainError> {
        let rows: Vec<BoostRow> = sqlx::query_as(
            r#"
            SELECT property_id, payment_intent_id, owner_id, boost_type, starts_at, ends_at
              FROM listing_boosts
             WHERE property_id = $1
             ORDER BY starts_at
            "#,
        )
        .bind(property_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to list listing boosts", e))?;

        rows.into_iter().map(ListingBoost::try_from).collect()
    }

    async fn feature_property(&self, property_id: &PropertyId, until: Timestamp) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE properties
               SET is_featured = TRUE,
                   featured_until = GREATEST(COALESCE(featured_until, $2), $2)
             WHERE id = $1
            "#,
        )
        .bind(property_id.value())
        .bind(until.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to feature property", e))?;

        if result.rows_affected() == 0 {
            tracing::warn!(property_id = %property_id, "Boosted property not found; featured flag not set");
        }
        Ok(())
    }

    async fn featured_until(&self, property_id: &PropertyId) -> Result<Option<Timestamp>, DomainError> {
        let until: Option<Option<DateTime<Utc>>> =
            sqlx::query_scalar("SELECT featured_until FROM properties WHERE id = $1 AND is_featured")
                .bind(property_id.value())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database("Failed to read featured flag", e))?;

        Ok(until.flatten().map(Timestamp::from_datetime))
    }
}
