//! Subscription activator.

use async_trait::async_trait;
use std::sync::Arc;

use super::{mismatched_grant, EntitlementActivator};
use crate::domain::entitlement::Subscription;
use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::payment::{EntitlementSpec, PaymentIntent};
use crate::ports::{SaveResult, SubscriptionRepository};

/// Upserts the owner's subscription for one paid period starting now.
pub struct SubscriptionActivator {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl SubscriptionActivator {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }
}

#[async_trait]
impl EntitlementActivator for SubscriptionActivator {
    fn name(&self) -> &'static str {
        "subscription"
    }

    fn handles(&self, spec: &EntitlementSpec) -> bool {
        matches!(spec, EntitlementSpec::Subscription { .. })
    }

    async fn apply(&self, intent: &PaymentIntent) -> Result<SaveResult, DomainError> {
        let EntitlementSpec::Subscription {
            plan,
            price_monthly,
            period_days,
        } = &intent.metadata
        else {
            return Err(mismatched_grant(self.name(), intent));
        };

        let now = Timestamp::now();
        let subscription = Subscription::paid_period(
            intent.owner_id.clone(),
            plan.clone(),
            *price_monthly,
            *period_days,
            intent.id,
            intent.completed_at.unwrap_or(now),
            now,
        );

        let result = self.subscriptions.upsert_paid_period(&subscription).await?;

        tracing::info!(
            payment_intent_id = %intent.id,
            owner_id = %intent.owner_id,
            plan = %plan,
            expires_at = %subscription.expires_at.as_datetime(),
            already_applied = !result.was_inserted(),
            "Subscription period granted"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySubscriptionRepository;
    use crate::domain::entitlement::SubscriptionStatus;
    use crate::domain::foundation::UserId;
    use crate::domain::payment::{Catalog, PaymentPurpose, PaymentStatus};

    fn completed(plan: &str) -> PaymentIntent {
        let mut intent = PaymentIntent::create(
            UserId::new("owner-1").unwrap(),
            PaymentPurpose::Subscription { plan: plan.into() },
            &Catalog::standard(),
        )
        .unwrap();
        intent.settle(PaymentStatus::Completed, Timestamp::now()).unwrap();
        intent
    }

    #[tokio::test]
    async fn grants_thirty_days_from_now() {
        let repo = Arc::new(InMemorySubscriptionRepository::new());
        let activator = SubscriptionActivator::new(repo.clone());
        let intent = completed("premium");

        let before = Timestamp::now();
        activator.apply(&intent).await.unwrap();

        let sub = repo.find_by_owner(&intent.owner_id).await.unwrap().unwrap();
        assert_eq!(sub.plan, "premium");
        assert_eq!(sub.price_monthly, 9_900);
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert!(!sub.is_trial);
        assert!(sub.expires_at.duration_since(&before).num_days() >= 29);
    }

    #[tokio::test]
    async fn replay_does_not_extend_period() {
        let repo = Arc::new(InMemorySubscriptionRepository::new());
        let activator = SubscriptionActivator::new(repo.clone());
        let intent = completed("basic");

        assert_eq!(activator.apply(&intent).await.unwrap(), SaveResult::Inserted);
        let first = repo.find_by_owner(&intent.owner_id).await.unwrap().unwrap();

        assert_eq!(activator.apply(&intent).await.unwrap(), SaveResult::AlreadyExists);
        let second = repo.find_by_owner(&intent.owner_id).await.unwrap().unwrap();
        assert_eq!(first.expires_at, second.expires_at);
    }

    #[tokio::test]
    async fn later_payment_replaces_plan() {
        let repo = Arc::new(InMemorySubscriptionRepository::new());
        let activator = SubscriptionActivator::new(repo.clone());

        activator.apply(&completed("basic")).await.unwrap();
        activator.apply(&completed("agency")).await.unwrap();

        let owner = UserId::new("owner-1").unwrap();
        let sub = repo.find_by_owner(&owner).await.unwrap().unwrap();
        assert_eq!(sub.plan, "agency");
    }

    #[tokio::test]
    async fn late_grant_of_older_payment_keeps_newer_plan() {
        let repo = Arc::new(InMemorySubscriptionRepository::new());
        let activator = SubscriptionActivator::new(repo.clone());
        let mut older = completed("basic");
        older.completed_at = Some(Timestamp::now().minus(std::time::Duration::from_secs(60)));
        let newer = completed("agency");

        activator.apply(&newer).await.unwrap();
        let granted = repo.find_by_owner(&newer.owner_id).await.unwrap().unwrap();

        assert_eq!(activator.apply(&older).await.unwrap(), SaveResult::AlreadyExists);
        let sub = repo.find_by_owner(&newer.owner_id).await.unwrap().unwrap();
        assert_eq!(sub, granted);
        assert_eq!(sub.last_payment_intent_id, newer.id);
    }
}
