//! Referral rewarder.

use std::sync::Arc;

use super::publishing::publish_best_effort;
use crate::domain::entitlement::{ReferralCredited, ReferralPolicy, ReferralStatus};
use crate::domain::foundation::{DomainError, EventId, Timestamp, UserId};
use crate::domain::payment::PaymentIntent;
use crate::ports::{EventPublisher, PaymentIntentRepository, ReferralRepository};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewardOutcome {
    Credited { referrer_id: UserId, reward_cents: i64 },
    NotReferred,
    AlreadyCredited,
    /// The owner has an earlier completed payment.
    NotFirstPayment,
}

/// Credits the referrer on the referred user's first completed payment.
pub struct ReferralRewarder {
    referrals: Arc<dyn ReferralRepository>,
    intents: Arc<dyn PaymentIntentRepository>,
    policy: ReferralPolicy,
    publisher: Arc<dyn EventPublisher>,
}

impl ReferralRewarder {
    pub fn new(
        referrals: Arc<dyn ReferralRepository>,
        intents: Arc<dyn PaymentIntentRepository>,
        policy: ReferralPolicy,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            referrals,
            intents,
            policy,
            publisher,
        }
    }

    /// Credit the owner's referrer if `intent` is their first completed payment.
    ///
    /// "First" is judged from stored payment history, and the credit itself
    /// is a compare-and-swap, so racing payments credit at most once.
    pub async fn reward_if_eligible(&self, intent: &PaymentIntent) -> Result<RewardOutcome, DomainError> {
        let owner = &intent.owner_id;

        let Some(referral) = self.referrals.find_by_referred(owner).await? else {
            return Ok(RewardOutcome::NotReferred);
        };
        if referral.status == ReferralStatus::Credited {
            return Ok(RewardOutcome::AlreadyCredited);
        }

        let first = self.intents.first_completed_for_owner(owner).await?;
        if first != Some(intent.id) {
            tracing::debug!(
                payment_intent_id = %intent.id,
                owner_id = %owner,
                "Not the owner's first completed payment, no referral reward"
            );
            return Ok(RewardOutcome::NotFirstPayment);
        }

        let reward_cents = self.policy.reward_for(intent.amount_cents);
        let now = Timestamp::now();
        if !self.referrals.credit(owner, reward_cents, &intent.id, now).await? {
            return Ok(RewardOutcome::AlreadyCredited);
        }

        tracing::info!(
            payment_intent_id = %intent.id,
            referrer_id = %referral.referrer_id,
            referred_id = %owner,
            reward_cents,
            "Referral credited"
        );

        let event = ReferralCredited {
            event_id: EventId::new(),
            payment_intent_id: intent.id,
            referrer_id: referral.referrer_id.clone(),
            referred_id: owner.clone(),
            reward_cents,
            credited_at: now,
        };
        publish_best_effort(self.publisher.as_ref(), &event, referral.referrer_id.as_str()).await;

        Ok(RewardOutcome::Credited {
            referrer_id: referral.referrer_id,
            reward_cents,
        })
    }
}
