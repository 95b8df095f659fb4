//! ExpireStalePaymentsHandler - Cancels intents the payer abandoned.

use std::sync::Arc;
use std::time::Duration;

use crate::application::publishing::{publish_best_effort, settled_event};
use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::payment::PaymentStatus;
use crate::ports::{EventPublisher, PaymentIntentRepository};

/// Moves `Pending` intents older than `max_age` to `Cancelled`.
///
/// Uses the same compare-and-swap as callbacks, so a success that races
/// the expiry still wins if it lands first, and vice versa.
pub struct ExpireStalePaymentsHandler {
    intents: Arc<dyn PaymentIntentRepository>,
    publisher: Arc<dyn EventPublisher>,
    max_age: Duration,
    batch_size: u32,
}

impl ExpireStalePaymentsHandler {
    pub fn new(
        intents: Arc<dyn PaymentIntentRepository>,
        publisher: Arc<dyn EventPublisher>,
        max_age: Duration,
        batch_size: u32,
    ) -> Self {
        Self {
            intents,
            publisher,
            max_age,
            batch_size,
        }
    }

    /// Returns the number of intents cancelled.
    pub async fn handle(&self) -> Result<usize, DomainError> {
        let now = Timestamp::now();
        let stale = self
            .intents
            .find_stale_pending(now.minus(self.max_age), self.batch_size)
            .await?;

        let mut expired = 0;
        for id in stale {
            let outcome = self
                .intents
                .transition_terminal(&id, PaymentStatus::Cancelled, now)
                .await?;
            if !outcome.applied {
                continue;
            }
            expired += 1;
            tracing::info!(payment_intent_id = %id, "Stale pending payment cancelled");
            publish_best_effort(
                self.publisher.as_ref(),
                &settled_event(&outcome.intent, now),
                outcome.intent.owner_id.as_str(),
            )
            .await;
        }

        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{basic_plan, callback, Harness};
    use crate::application::ReconcileOutcome;
    use crate::domain::foundation::UserId;
    use crate::domain::payment::{Catalog, ExternalRef, GatewayStatus, PaymentIntent};

    const DAY: Duration = Duration::from_secs(86_400);

    fn expirer(h: &Harness) -> ExpireStalePaymentsHandler {
        ExpireStalePaymentsHandler::new(h.intents.clone(), h.events.clone(), DAY, 10)
    }

    fn created_days_ago(days: u64) -> PaymentIntent {
        let mut intent =
            PaymentIntent::create(UserId::new("owner-1").unwrap(), basic_plan(), &Catalog::standard())
                .unwrap();
        intent.created_at = Timestamp::now().minus(DAY * days as u32);
        intent
    }

    #[tokio::test]
    async fn old_pending_intents_are_cancelled() {
        let h = Harness::new();
        let stale = created_days_ago(3);
        h.intents.put(stale.clone());
        let fresh = h.pending_intent("owner-1", basic_plan()).await;

        let expired = expirer(&h).handle().await.unwrap();

        assert_eq!(expired, 1);
        assert_eq!(h.stored(&stale).await.status, PaymentStatus::Cancelled);
        assert_eq!(h.stored(&fresh).await.status, PaymentStatus::Pending);
        assert!(h.events.has_event("payment.settled.v1"));
    }

    #[tokio::test]
    async fn late_callback_after_expiry_is_a_duplicate() {
        let h = Harness::new();
        let mut stale = created_days_ago(3);
        stale.external_ref = Some(ExternalRef::generate());
        h.intents.put(stale.clone());

        expirer(&h).handle().await.unwrap();
        let outcome = h
            .reconciler
            .reconcile(&callback(&stale, GatewayStatus::Completed))
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            ReconcileOutcome::Duplicate {
                status: PaymentStatus::Cancelled,
                ..
            }
        ));
        assert_eq!(h.subscriptions.count(), 0);
    }
}
