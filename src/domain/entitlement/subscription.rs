//! Subscription entitlement, one row per owner.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{PaymentIntentId, Timestamp, UserId, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "cancelled" => Ok(SubscriptionStatus::Cancelled),
            other => Err(ValidationError::invalid_format(
                "subscription_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

/// An owner's subscription. Upserted by owner on every paid period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub owner_id: UserId,
    pub plan: String,
    pub price_monthly: i64,
    pub status: SubscriptionStatus,
    pub is_trial: bool,
    pub expires_at: Timestamp,
    /// Payment that funded the current period; replays of it are no-ops.
    pub last_payment_intent_id: PaymentIntentId,
    /// When that payment completed. Grants from earlier payments never
    /// replace the stored period.
    pub last_paid_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Subscription {
    /// Paid period starting now, not from the previous due date.
    pub fn paid_period(
        owner_id: UserId,
        plan: impl Into<String>,
        price_monthly: i64,
        period_days: i64,
        payment_intent_id: PaymentIntentId,
        paid_at: Timestamp,
        now: Timestamp,
    ) -> Self {
        Self {
            owner_id,
            plan: plan.into(),
            price_monthly,
            status: SubscriptionStatus::Active,
            is_trial: false,
            expires_at: now.add_days(period_days),
            last_payment_intent_id: payment_intent_id,
            last_paid_at: paid_at,
            updated_at: now,
        }
    }

    pub fn is_active_at(&self, at: &Timestamp) -> bool {
        self.status == SubscriptionStatus::Active && at.is_before(&self.expires_at)
    }

    /// Ordering key of the funding payment. Ties on the completion time
    /// fall back to the intent id so two payments never compare equal.
    pub fn funding_key(&self) -> (Timestamp, PaymentIntentId) {
        (self.last_paid_at, self.last_payment_intent_id)
    }

    /// Whether `candidate` was funded by a later payment than `self`.
    pub fn is_superseded_by(&self, candidate: &Subscription) -> bool {
        self.funding_key() < candidate.funding_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paid_period_runs_from_now_and_clears_trial() {
        let now = Timestamp::now();
        let sub = Subscription::paid_period(
            UserId::new("owner").unwrap(),
            "premium",
            9_900,
            30,
            PaymentIntentId::new(),
            now,
            now,
        );
        assert_eq!(sub.expires_at, now.add_days(30));
        assert!(!sub.is_trial);
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert!(sub.is_active_at(&now));
        assert!(!sub.is_active_at(&now.add_days(31)));
    }

    #[test]
    fn only_a_later_payment_supersedes() {
        let now = Timestamp::now();
        let owner = UserId::new("owner").unwrap();
        let earlier = Subscription::paid_period(
            owner.clone(),
            "agency",
            24_900,
            30,
            PaymentIntentId::new(),
            now.minus(std::time::Duration::from_secs(60)),
            now,
        );
        let later = Subscription::paid_period(owner, "basic", 4_900, 30, PaymentIntentId::new(), now, now);

        assert!(earlier.is_superseded_by(&later));
        assert!(!later.is_superseded_by(&earlier));
        assert!(!later.is_superseded_by(&later.clone()));
    }

    #[test]
    fn status_parses() {
        assert_eq!("active".parse::<SubscriptionStatus>().unwrap(), SubscriptionStatus::Active);
        assert!("paused".parse::<SubscriptionStatus>().is_err());
    }
}
