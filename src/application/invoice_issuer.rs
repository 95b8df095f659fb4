//! Invoice issuer.

use std::sync::Arc;

use super::publishing::publish_best_effort;
use crate::domain::entitlement::{Invoice, InvoiceIssued};
use crate::domain::foundation::{DomainError, ErrorCode, EventId, Timestamp};
use crate::domain::payment::{PaymentIntent, PaymentStatus};
use crate::ports::{EventPublisher, InvoiceRepository, SaveResult};

/// Issues the single invoice belonging to a completed payment.
pub struct InvoiceIssuer {
    invoices: Arc<dyn InvoiceRepository>,
    publisher: Arc<dyn EventPublisher>,
}

impl InvoiceIssuer {
    pub fn new(invoices: Arc<dyn InvoiceRepository>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            invoices,
            publisher,
        }
    }

    /// Issue the invoice, or return the one already issued for this intent.
    pub async fn issue(&self, intent: &PaymentIntent) -> Result<Invoice, DomainError> {
        if intent.status != PaymentStatus::Completed {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot invoice payment {} in status {}", intent.id, intent.status),
            ));
        }

        let invoice = Invoice::for_payment(intent, Timestamp::now());
        match self.invoices.insert(&invoice).await? {
            SaveResult::Inserted => {
                tracing::info!(
                    payment_intent_id = %intent.id,
                    invoice_number = %invoice.number,
                    amount_cents = invoice.amount_cents,
                    "Invoice issued"
                );
                let event = InvoiceIssued {
                    event_id: EventId::new(),
                    payment_intent_id: intent.id,
                    invoice_id: invoice.id,
                    number: invoice.number.clone(),
                    owner_id: intent.owner_id.clone(),
                    amount_cents: invoice.amount_cents,
                    issued_at: invoice.issued_at,
                };
                publish_best_effort(self.publisher.as_ref(), &event, intent.owner_id.as_str()).await;
                Ok(invoice)
            }
            SaveResult::AlreadyExists => {
                tracing::debug!(payment_intent_id = %intent.id, "Invoice already issued");
                self.invoices
                    .find_by_payment_intent(&intent.id)
                    .await?
                    .ok_or_else(|| {
                        DomainError::new(
                            ErrorCode::Conflict,
                            format!("Invoice for payment {} reported present but not found", intent.id),
                        )
                    })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::InMemoryEventBus;
    use crate::adapters::memory::InMemoryInvoiceRepository;
    use crate::domain::foundation::UserId;
    use crate::domain::payment::{Catalog, PaymentPurpose};

    fn intent(status: PaymentStatus) -> PaymentIntent {
        let mut intent = PaymentIntent::create(
            UserId::new("owner-1").unwrap(),
            PaymentPurpose::Subscription {
                plan: "premium".into(),
            },
            &Catalog::standard(),
        )
        .unwrap();
        if status != PaymentStatus::Pending {
            intent.settle(status, Timestamp::now()).unwrap();
        }
        intent
    }

    #[tokio::test]
    async fn issuing_twice_returns_the_first_invoice() {
        let repo = Arc::new(InMemoryInvoiceRepository::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let issuer = InvoiceIssuer::new(repo.clone(), bus.clone());
        let intent = intent(PaymentStatus::Completed);

        let first = issuer.issue(&intent).await.unwrap();
        let second = issuer.issue(&intent).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.amount_cents, 9_900);
        assert_eq!(repo.count(), 1);
        assert_eq!(bus.events_of_type("invoice.issued.v1").len(), 1);
    }

    #[tokio::test]
    async fn refuses_to_invoice_unsettled_payment() {
        let issuer = InvoiceIssuer::new(
            Arc::new(InMemoryInvoiceRepository::new()),
            Arc::new(InMemoryEventBus::new()),
        );
        let err = issuer.issue(&intent(PaymentStatus::Pending)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }

    #[tokio::test]
    async fn publisher_failure_does_not_fail_issue() {
        let bus = Arc::new(InMemoryEventBus::new());
        bus.fail_publishes(true);
        let issuer = InvoiceIssuer::new(Arc::new(InMemoryInvoiceRepository::new()), bus.clone());

        assert!(issuer.issue(&intent(PaymentStatus::Completed)).await.is_ok());
        assert_eq!(bus.event_count(), 0);
    }
}
