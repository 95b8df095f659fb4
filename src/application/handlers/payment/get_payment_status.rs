//! GetPaymentStatusHandler - Query handler for a payment's status.

use serde::Serialize;
use std::sync::Arc;

use crate::domain::foundation::{PaymentIntentId, Timestamp, UserId};
use crate::domain::payment::{PaymentError, PaymentPurpose, PaymentStatus};
use crate::ports::PaymentIntentRepository;

#[derive(Debug, Clone)]
pub struct GetPaymentStatusQuery {
    pub payment_id: PaymentIntentId,
    /// Only the owner may see their payment.
    pub requester: UserId,
}

/// What the paying user sees about a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentStatusView {
    pub payment_id: PaymentIntentId,
    pub status: PaymentStatus,
    pub amount_cents: i64,
    pub purpose: PaymentPurpose,
    pub description: String,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

pub struct GetPaymentStatusHandler {
    intents: Arc<dyn PaymentIntentRepository>,
}

impl GetPaymentStatusHandler {
    pub fn new(intents: Arc<dyn PaymentIntentRepository>) -> Self {
        Self { intents }
    }

    pub async fn handle(&self, query: GetPaymentStatusQuery) -> Result<PaymentStatusView, PaymentError> {
        let intent = self
            .intents
            .find_by_id(&query.payment_id)
            .await?
            .filter(|intent| intent.owner_id == query.requester)
            .ok_or(PaymentError::NotFound(query.payment_id))?;

        Ok(PaymentStatusView {
            payment_id: intent.id,
            status: intent.status,
            amount_cents: intent.amount_cents,
            purpose: intent.purpose,
            description: intent.description,
            created_at: intent.created_at,
            completed_at: intent.completed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPaymentIntentRepository;
    use crate::domain::payment::{Catalog, PaymentIntent};

    async fn stored_intent(repo: &InMemoryPaymentIntentRepository) -> PaymentIntent {
        let intent = PaymentIntent::create(
            UserId::new("owner-1").unwrap(),
            PaymentPurpose::Subscription {
                plan: "basic".into(),
            },
            &Catalog::standard(),
        )
        .unwrap();
        repo.create(&intent).await.unwrap();
        intent
    }

    #[tokio::test]
    async fn owner_sees_pending_status() {
        let repo = Arc::new(InMemoryPaymentIntentRepository::new());
        let intent = stored_intent(&repo).await;
        let handler = GetPaymentStatusHandler::new(repo);

        let view = handler
            .handle(GetPaymentStatusQuery {
                payment_id: intent.id,
                requester: intent.owner_id.clone(),
            })
            .await
            .unwrap();

        assert_eq!(view.status, PaymentStatus::Pending);
        assert_eq!(view.amount_cents, 4_900);
        assert!(view.completed_at.is_none());
    }

    #[tokio::test]
    async fn other_users_get_not_found() {
        let repo = Arc::new(InMemoryPaymentIntentRepository::new());
        let intent = stored_intent(&repo).await;
        let handler = GetPaymentStatusHandler::new(repo);

        let result = handler
            .handle(GetPaymentStatusQuery {
                payment_id: intent.id,
                requester: UserId::new("intruder").unwrap(),
            })
            .await;

        assert_eq!(result, Err(PaymentError::NotFound(intent.id)));
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let handler = GetPaymentStatusHandler::new(Arc::new(InMemoryPaymentIntentRepository::new()));
        let id = PaymentIntentId::new();
        let result = handler
            .handle(GetPaymentStatusQuery {
                payment_id: id,
                requester: UserId::new("owner-1").unwrap(),
            })
            .await;
        assert_eq!(result, Err(PaymentError::NotFound(id)));
    }
}
