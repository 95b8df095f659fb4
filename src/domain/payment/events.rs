//! Payment domain events.

use serde::{Deserialize, Serialize};

use super::PaymentStatus;
use crate::domain::foundation::{domain_event, EventId, PaymentIntentId, Timestamp, UserId};

pub const PAYMENT_AGGREGATE: &str = "PaymentIntent";

/// Published once when an intent reaches its terminal status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSettled {
    pub event_id: EventId,
    pub payment_intent_id: PaymentIntentId,
    pub owner_id: UserId,
    pub status: PaymentStatus,
    pub amount_cents: i64,
    pub settled_at: Timestamp,
}

domain_event!(
    PaymentSettled,
    event_type = "payment.settled.v1",
    aggregate_id = payment_intent_id,
    aggregate_type = "PaymentIntent",
    occurred_at = settled_at,
    event_id = event_id
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{DomainEvent, EventEnvelope};

    #[test]
    fn settled_event_routes_by_intent() {
        let event = PaymentSettled {
            event_id: EventId::new(),
            payment_intent_id: PaymentIntentId::new(),
            owner_id: UserId::new("owner-1").unwrap(),
            status: PaymentStatus::Completed,
            amount_cents: 9_900,
            settled_at: Timestamp::now(),
        };

        let envelope = EventEnvelope::from_event(&event);
        assert_eq!(envelope.event_type, "payment.settled.v1");
        assert_eq!(envelope.aggregate_type, PAYMENT_AGGREGATE);
        assert_eq!(envelope.aggregate_id, event.aggregate_id());
        assert_eq!(envelope.payload["status"], "completed");
    }
}
