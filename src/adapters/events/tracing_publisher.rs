//! TracingEventPublisher - Emits domain events as structured log records.
//!
//! Used when no broker is configured. Downstream consumers tail the
//! `payment_events` log target.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::ports::EventPublisher;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventPublisher;

impl TracingEventPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        tracing::info!(
            target: "payment_events",
            event_id = %event.event_id,
            event_type = %event.event_type,
            aggregate_type = %event.aggregate_type,
            aggregate_id = %event.aggregate_id,
            user_id = event.user_id.as_deref().unwrap_or(""),
            payload = %event.payload,
            "Domain event"
        );
        Ok(())
    }
}
