//! In-memory ReferralRepository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::lock;
use crate::domain::entitlement::{Referral, ReferralStatus};
use crate::domain::foundation::{DomainError, PaymentIntentId, Timestamp, UserId};
use crate::ports::{ReferralRepository, SaveResult};

#[derive(Default)]
pub struct InMemoryReferralRepository {
    referrals: Mutex<HashMap<UserId, Referral>>,
}

impl InMemoryReferralRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReferralRepository for InMemoryReferralRepository {
    async fn create(&self, referral: &Referral) -> Result<SaveResult, DomainError> {
        let mut referrals = lock(&self.referrals);
        if referrals.contains_key(&referral.referred_id) {
            return Ok(SaveResult::AlreadyExists);
        }
        referrals.insert(referral.referred_id.clone(), referral.clone());
        Ok(SaveResult::Inserted)
    }

    async fn find_by_referred(&self, referred_id: &UserId) -> Result<Option<Referral>, DomainError> {
        Ok(lock(&self.referrals).get(referred_id).cloned())
    }

    async fn credit(
        &self,
        referred_id: &UserId,
        reward_cents: i64,
        payment_intent_id: &PaymentIntentId,
        at: Timestamp,
    ) -> Result<bool, DomainError> {
        let mut referrals = lock(&self.referrals);
        match referrals.get_mut(referred_id) {
            Some(referral) if referral.status == ReferralStatus::Pending => {
                referral.credit(reward_cents, *payment_intent_id, at)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
