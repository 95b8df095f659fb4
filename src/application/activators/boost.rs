//! Listing boost activator.

use async_trait::async_trait;
use std::sync::Arc;

use super::{mismatched_grant, EntitlementActivator};
use crate::domain::entitlement::ListingBoost;
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::domain::payment::{EntitlementSpec, PaymentIntent};
use crate::ports::{BoostRepository, SaveResult};

/// Appends one boost row per payment and flags the property as featured.
pub struct BoostActivator {
    boosts: Arc<dyn BoostRepository>,
}

impl BoostActivator {
    pub fn new(boosts: Arc<dyn BoostRepository>) -> Self {
        Self { boosts }
    }
}

#[async_trait]
impl EntitlementActivator for BoostActivator {
    fn name(&self) -> &'static str {
        "boost"
    }

    fn handles(&self, spec: &EntitlementSpec) -> bool {
        matches!(spec, EntitlementSpec::Boost { .. })
    }

    async fn apply(&self, intent: &PaymentIntent) -> Result<SaveResult, DomainError> {
        let EntitlementSpec::Boost {
            boost_type,
            property_id,
            duration_days,
            featured,
        } = &intent.metadata
        else {
            return Err(mismatched_grant(self.name(), intent));
        };

        let boost = ListingBoost::starting_now(
            *property_id,
            intent.id,
            intent.owner_id.clone(),
            boost_type.clone(),
            *duration_days,
            Timestamp::now(),
        );

        let result = self.boosts.insert(&boost).await?;

        // A replay keeps the original window; finish any flagging a crashed
        // earlier attempt left undone.
        let ends_at = match result {
            SaveResult::Inserted => boost.ends_at,
            SaveResult::AlreadyExists => {
                self.boosts
                    .find_by_payment(&intent.id)
                    .await?
                    .ok_or_else(|| {
                        DomainError::new(
                            ErrorCode::Conflict,
                            format!("Boost for payment {} reported present but not found", intent.id),
                        )
                    })?
                    .ends_at
            }
        };

        if *featured {
            self.boosts.feature_property(property_id, ends_at).await?;
        }

        tracing::info!(
            payment_intent_id = %intent.id,
            property_id = %property_id,
            boost_type = %boost_type,
            ends_at = %ends_at.as_datetime(),
            already_applied = !result.was_inserted(),
            "Listing boost granted"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryBoostRepository;
    use crate::domain::foundation::{PropertyId, UserId};
    use crate::domain::payment::{Catalog, PaymentPurpose, PaymentStatus};

    fn completed(boost_type: &str, property: i64) -> PaymentIntent {
        let mut intent = PaymentIntent::create(
            UserId::new("owner-1").unwrap(),
            PaymentPurpose::Boost {
                boost_type: boost_type.into(),
                property_id: PropertyId::new(property).unwrap(),
            },
            &Catalog::standard(),
        )
        .unwrap();
        intent.settle(PaymentStatus::Completed, Timestamp::now()).unwrap();
        intent
    }

    #[tokio::test]
    async fn spotlight_boost_features_property_for_fourteen_days() {
        let repo = Arc::new(InMemoryBoostRepository::new());
        let activator = BoostActivator::new(repo.clone());
        let intent = completed("spotlight", 42);
        let property = PropertyId::new(42).unwrap();

        activator.apply(&intent).await.unwrap();

        let boosts = repo.find_by_property(&property).await.unwrap();
        assert_eq!(boosts.len(), 1);
        assert_eq!(boosts[0].ends_at.duration_since(&boosts[0].starts_at).num_days(), 14);
        assert_eq!(repo.featured_until(&property).await.unwrap(), Some(boosts[0].ends_at));
    }

    #[tokio::test]
    async fn replay_keeps_single_row() {
        let repo = Arc::new(InMemoryBoostRepository::new());
        let activator = BoostActivator::new(repo.clone());
        let intent = completed("featured", 7);

        assert_eq!(activator.apply(&intent).await.unwrap(), SaveResult::Inserted);
        assert_eq!(activator.apply(&intent).await.unwrap(), SaveResult::AlreadyExists);

        let boosts = repo
            .find_by_property(&PropertyId::new(7).unwrap())
            .await
            .unwrap();
        assert_eq!(boosts.len(), 1);
    }

    #[tokio::test]
    async fn non_featured_boost_leaves_flag_alone() {
        let repo = Arc::new(InMemoryBoostRepository::new());
        let activator = BoostActivator::new(repo.clone());

        activator.apply(&completed("top_of_search", 9)).await.unwrap();

        let property = PropertyId::new(9).unwrap();
        assert_eq!(repo.find_by_property(&property).await.unwrap().len(), 1);
        assert_eq!(repo.featured_until(&property).await.unwrap(), None);
    }
}
