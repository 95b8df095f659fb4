//! PostgreSQL implementation of ReferralRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{corrupt, user_id};
use crate::domain::entitlement::{Referral, ReferralStatus};
use crate::domain::foundation::{DomainError, PaymentIntentId, Timestamp, UserId};
use crate::ports::{ReferralRepository, SaveResult};

pub struct PostgresReferralRepository {
    pool: PgPool,
}

impl PostgresReferralRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReferralRow {
    referrer_id: String,
    referred_id: String,
    status: String,
    reward_cents: Option<i64>,
    credited_payment_intent_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    credited_at: Option<DateTime<Utc>>,
}

impl TryFrom<ReferralRow> for Referral {
    type Error = DomainError;

    fn try_from(row: ReferralRow) -> Result<Self, Self::Error> {
        Ok(Referral {
            referrer_id: user_id("referrer_id", row.referrer_id)?,
            referred_id: user_id("referred_id", row.referred_id)?,
            status: row
                .status
                .parse::<ReferralStatus>()
                .map_err(|e| corrupt("status", e))?,
            reward_cents: row.reward_cents,
            credited_payment_intent_id: row.credited_payment_intent_id.map(PaymentIntentId::from_uuid),
            created_at: Timestamp::from_datetime(row.created_at),
            credited_at: row.credited_at.map(Timestamp::from_datetime),
        })
    }
}

#[async_trait]
impl ReferralRepository for PostgresReferralRepository {
    async fn create(&self, referral: &Referral) -> Result<SaveResult, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO referrals (
                referred_id, referrer_id, status, reward_cents,
                credited_payment_intent_id, created_at, credited_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (referred_id) DO NOTHING
            "#,
        )
        .bind(referral.referred_id.as_str())
        .bind(referral.referrer_id.as_str())
        .bind(referral.status.as_str())
        .bind(referral.reward_cents)
        .bind(referral.credited_payment_intent_id.map(|id| *id.as_uuid()))
        .bind(referral.created_at.as_datetime())
        .bind(referral.credited_at.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to create referral", e))?;

        if result.rows_affected() == 1 {
            Ok(SaveResult::Inserted)
        } else {
            Ok(SaveResult::AlreadyExists)
        }
    }

    async fn find_by_referred(&self, referred_id: &UserId) -> Result<Option<Referral>, DomainError> {
        let row: Option<ReferralRow> = sqlx::query_as(
            r#"
            SELECT referrer_id, referred_id, status, reward_cents,
                   credited_payment_intent_id, created_at, credited_at
              FROM referrals
             WHERE referred_id = $1
            "#,
        )
        .bind(referred_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to find referral", e))?;

        row.map(Referral::try_from).transpose()
    }

    async fn credit(
        &self,
        referred_id: &UserId,
        reward_cents: i64,
        payment_intent_id: &PaymentIntentId,
        at: Timestamp,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE referrals
               SET status = 'credited',
                   reward_cents = $2,
                   credited_payment_intent_id = $3,
                   credited_at = $4
             WHERE referred_id = $1 AND status = 'pending'
            "#,
        )
        .bind(referred_id.as_str())
        .bind(reward_cents)
        .bind(payment_intent_id.as_uuid())
        .bind(at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to credit referral", e))?;

        Ok(result.rows_affected() == 1)
    }
}
