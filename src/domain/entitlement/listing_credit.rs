//! Listing-creation quota unlocked by a listing fee.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PaymentIntentId, Timestamp, UserId};

/// Listing slots granted by one payment. One row per payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingCredit {
    pub payment_intent_id: PaymentIntentId,
    pub owner_id: UserId,
    pub tier: String,
    pub slots: i32,
    pub granted_at: Timestamp,
}
