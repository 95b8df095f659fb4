//! Referral relationship and reward policy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{
    PaymentIntentId, Percentage, StateMachine, Timestamp, UserId, ValidationError,
};

/// Referral lifecycle. Credited at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferralStatus {
    Pending,
    Credited,
}

impl ReferralStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferralStatus::Pending => "pending",
            ReferralStatus::Credited => "credited",
        }
    }
}

impl StateMachine for ReferralStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!((self, target), (ReferralStatus::Pending, ReferralStatus::Credited))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            ReferralStatus::Pending => vec![ReferralStatus::Credited],
            ReferralStatus::Credited => vec![],
        }
    }
}

impl fmt::Display for ReferralStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferralStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReferralStatus::Pending),
            "credited" => Ok(ReferralStatus::Credited),
            other => Err(ValidationError::invalid_format(
                "referral_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

/// `referrer_id` brought in `referred_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Referral {
    pub referrer_id: UserId,
    pub referred_id: UserId,
    pub status: ReferralStatus,
    pub reward_cents: Option<i64>,
    pub credited_payment_intent_id: Option<PaymentIntentId>,
    pub created_at: Timestamp,
    pub credited_at: Option<Timestamp>,
}

impl Referral {
    pub fn pending(referrer_id: UserId, referred_id: UserId) -> Self {
        Self {
            referrer_id,
            referred_id,
            status: ReferralStatus::Pending,
            reward_cents: None,
            credited_payment_intent_id: None,
            created_at: Timestamp::now(),
            credited_at: None,
        }
    }

    /// Flips to credited. Fails if already credited.
    pub fn credit(
        &mut self,
        reward_cents: i64,
        payment_intent_id: PaymentIntentId,
        at: Timestamp,
    ) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(ReferralStatus::Credited)?;
        self.reward_cents = Some(reward_cents);
        self.credited_payment_intent_id = Some(payment_intent_id);
        self.credited_at = Some(at);
        Ok(())
    }
}

/// How much the referrer earns from the referred user's first payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferralPolicy {
    /// Same reward whatever the payment size.
    Fixed { cents: i64 },
    /// Share of the payment, optionally capped.
    Percentage {
        rate: Percentage,
        cap_cents: Option<i64>,
    },
}

impl ReferralPolicy {
    pub fn reward_for(&self, payment_cents: i64) -> i64 {
        match self {
            ReferralPolicy::Fixed { cents } => *cents,
            ReferralPolicy::Percentage { rate, cap_cents } => {
                let reward = rate.of_cents(payment_cents);
                cap_cents.map_or(reward, |cap| reward.min(cap))
            }
        }
    }
}

impl Default for ReferralPolicy {
    fn default() -> Self {
        ReferralPolicy::Percentage {
            rate: Percentage::try_new(10).unwrap_or_default(),
            cap_cents: Some(5_000),
        }
    }
}
