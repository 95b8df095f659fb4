//! Best-effort domain event publishing.

use serde::Serialize;

use crate::domain::foundation::{DomainEvent, EventEnvelope, EventId, Timestamp};
use crate::domain::payment::{PaymentIntent, PaymentSettled};
use crate::ports::EventPublisher;

/// Publishes an event, logging instead of failing.
///
/// Payment state is already durable by the time events go out; a broken
/// downstream consumer must not turn a settled payment into an error.
pub(crate) async fn publish_best_effort<E>(publisher: &dyn EventPublisher, event: &E, user_id: &str)
where
    E: DomainEvent + Serialize,
{
    let envelope = EventEnvelope::from_event(event).with_user_id(user_id);
    let event_type = envelope.event_type.clone();
    if let Err(e) = publisher.publish(envelope).await {
        tracing::warn!(
            event_type = %event_type,
            aggregate_id = %event.aggregate_id(),
            error = %e,
            "Failed to publish domain event"
        );
    }
}

pub(crate) fn settled_event(intent: &PaymentIntent, at: Timestamp) -> PaymentSettled {
    PaymentSettled {
        event_id: EventId::new(),
        payment_intent_id: intent.id,
        owner_id: intent.owner_id.clone(),
        status: intent.status,
        amount_cents: intent.amount_cents,
        settled_at: intent.completed_at.unwrap_or(at),
    }
}
