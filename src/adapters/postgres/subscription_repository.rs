//! PostgreSQL implementation of SubscriptionRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{corrupt, user_id};
use crate::domain::entitlement::{Subscription, SubscriptionStatus};
use crate::domain::foundation::{DomainError, PaymentIntentId, Timestamp, UserId};
use crate::ports::{SaveResult, SubscriptionRepository};

pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    owner_id: String,
    plan: String,
    price_monthly: i64,
    status: String,
    is_trial: bool,
    expires_at: DateTime<Utc>,
    last_payment_intent_id: Uuid,
    last_paid_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            owner_id: user_id("owner_id", row.owner_id)?,
            plan: row.plan,
            price_monthly: row.price_monthly,
            status: row
                .status
                .parse::<SubscriptionStatus>()
                .map_err(|e| corrupt("status", e))?,
            is_trial: row.is_trial,
            expires_at: Timestamp::from_datetime(row.expires_at),
            last_payment_intent_id: PaymentIntentId::from_uuid(row.last_payment_intent_id),
            last_paid_at: Timestamp::from_datetime(row.last_paid_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn upsert_paid_period(&self, subscription: &Subscription) -> Result<SaveResult, DomainError> {
        // Only a grant funded by a later payment replaces the row. A replay
        // of the same payment, or a late retry of an older one, is filtered
        // out by the WHERE.
        let result = sqlx::query(
            r#"
            INSERT INTO subscriptions (
                owner_id, plan, price_monthly, status, is_trial,
                expires_at, last_payment_intent_id, last_paid_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (owner_id) DO UPDATE SET
                plan = EXCLUDED.plan,
                price_monthly = EXCLUDED.price_monthly,
                status = EXCLUDED.status,
                is_trial = EXCLUDED.is_trial,
                expires_at = EXCLUDED.expires_at,
                last_payment_intent_id = EXCLUDED.last_payment_intent_id,
                last_paid_at = EXCLUDED.last_paid_at,
                updated_at = EXCLUDED.updated_at
            WHERE (subscriptions.last_paid_at, subscriptions.last_payment_intent_id)
                < (EXCLUDED.last_paid_at, EXCLUDED.last_payment_intent_id)
            "#,
        )
        .bind(subscription.owner_id.as_str())
        .bind(&subscription.plan)
        .bind(subscription.price_monthly)
        .bind(subscription.status.as_str())
        .bind(subscription.is_trial)
        .bind(subscription.expires_at.as_datetime())
        .bind(subscription.last_payment_intent_id.as_uuid())
        .bind(subscription.last_paid_at.as_datetime())
        .bind(subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to upsert subscription", e))?;

        if result.rows_affected() == 1 {
            Ok(SaveResult::Inserted)
        } else {
            Ok(SaveResult::AlreadyExists)
        }
    }

    async fn find_by_owner(&self, owner_id: &UserId) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT owner_id, plan, price_monthly, status, is_trial,
                   expires_at, last_payment_intent_id, last_paid_at, updated_at
              FROM subscriptions
             WHERE owner_id = $1
            "#,
        )
        .bind(owner_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to find subscription", e))?;

        row.map(Subscription::try_from).transpose()
    }
}
