//! Referral store port.

use async_trait::async_trait;

use super::SaveResult;
use crate::domain::entitlement::Referral;
use crate::domain::foundation::{DomainError, PaymentIntentId, Timestamp, UserId};

#[async_trait]
pub trait ReferralRepository: Send + Sync {
    /// Register a referral. A user can be referred only once.
    async fn create(&self, referral: &Referral) -> Result<SaveResult, DomainError>;

    async fn find_by_referred(&self, referred_id: &UserId) -> Result<Option<Referral>, DomainError>;

    /// Compare-and-swap `pending -> credited`.
    ///
    /// Returns true only for the single call that performed the flip.
    async fn credit(
        &self,
        referred_id: &UserId,
        reward_cents: i64,
        payment_intent_id: &PaymentIntentId,
        at: Timestamp,
    ) -> Result<bool, DomainError>;
}
