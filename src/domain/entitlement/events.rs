//! Entitlement domain events.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{domain_event, EventId, InvoiceId, PaymentIntentId, Timestamp, UserId};

/// The paid-for entitlement was granted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitlementGranted {
    pub event_id: EventId,
    pub payment_intent_id: PaymentIntentId,
    pub owner_id: UserId,
    /// Activator that granted it, e.g. "subscription".
    pub activator: String,
    pub granted_at: Timestamp,
}

domain_event!(
    EntitlementGranted,
    event_type = "entitlement.granted.v1",
    aggregate_id = payment_intent_id,
    aggregate_type = "PaymentIntent",
    occurred_at = granted_at,
    event_id = event_id
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceIssued {
    pub event_id: EventId,
    pub payment_intent_id: PaymentIntentId,
    pub invoice_id: InvoiceId,
    pub number: String,
    pub owner_id: UserId,
    pub amount_cents: i64,
    pub issued_at: Timestamp,
}

domain_event!(
    InvoiceIssued,
    event_type = "invoice.issued.v1",
    aggregate_id = payment_intent_id,
    aggregate_type = "PaymentIntent",
    occurred_at = issued_at,
    event_id = event_id
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralCredited {
    pub event_id: EventId,
    pub payment_intent_id: PaymentIntentId,
    pub referrer_id: UserId,
    pub referred_id: UserId,
    pub reward_cents: i64,
    pub credited_at: Timestamp,
}

domain_event!(
    ReferralCredited,
    event_type = "referral.credited.v1",
    aggregate_id = payment_intent_id,
    aggregate_type = "PaymentIntent",
    occurred_at = credited_at,
    event_id = event_id
);
