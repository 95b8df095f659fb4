//! Listing boost entitlement.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PaymentIntentId, PropertyId, Timestamp, UserId};

/// One funded boost. Keyed by `(property_id, payment_intent_id)` and never
/// updated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingBoost {
    pub property_id: PropertyId,
    pub payment_intent_id: PaymentIntentId,
    pub owner_id: UserId,
    pub boost_type: String,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
}

impl ListingBoost {
    pub fn starting_now(
        property_id: PropertyId,
        payment_intent_id: PaymentIntentId,
        owner_id: UserId,
        boost_type: impl Into<String>,
        duration_days: i64,
        now: Timestamp,
    ) -> Self {
        Self {
            property_id,
            payment_intent_id,
            owner_id,
            boost_type: boost_type.into(),
            starts_at: now,
            ends_at: now.add_days(duration_days),
        }
    }
}
