//! Listing-fee activator.

use async_trait::async_trait;
use std::sync::Arc;

use super::{mismatched_grant, EntitlementActivator};
use crate::domain::entitlement::ListingCredit;
use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::payment::{EntitlementSpec, PaymentIntent};
use crate::ports::{ListingCreditRepository, SaveResult};

/// Unlocks the listing slots bought with a listing fee.
pub struct ListingFeeActivator {
    credits: Arc<dyn ListingCreditRepository>,
}

impl ListingFeeActivator {
    pub fn new(credits: Arc<dyn ListingCreditRepository>) -> Self {
        Self { credits }
    }
}

#[async_trait]
impl EntitlementActivator for ListingFeeActivator {
    fn name(&self) -> &'static str {
        "listing_fee"
    }

    fn handles(&self, spec: &EntitlementSpec) -> bool {
        matches!(spec, EntitlementSpec::ListingQuota { .. })
    }

    async fn apply(&self, intent: &PaymentIntent) -> Result<SaveResult, DomainError> {
        let EntitlementSpec::ListingQuota { tier, slots } = &intent.metadata else {
            return Err(mismatched_grant(self.name(), intent));
        };

        let credit = ListingCredit {
            payment_intent_id: intent.id,
            owner_id: intent.owner_id.clone(),
            tier: tier.clone(),
            slots: *slots,
            granted_at: Timestamp::now(),
        };

        let result = self.credits.grant(&credit).await?;
        tracing::info!(
            payment_intent_id = %intent.id,
            owner_id = %intent.owner_id,
            slots = *slots,
            already_applied = !result.was_inserted(),
            "Listing slots granted"
        );
        Ok(result)
    }
}
