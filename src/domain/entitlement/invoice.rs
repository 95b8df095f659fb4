//! Billing record for a completed payment.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{InvoiceId, PaymentIntentId, Timestamp, UserId};
use crate::domain::payment::PaymentIntent;

/// Immutable invoice. At most one per payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub number: String,
    pub payment_intent_id: PaymentIntentId,
    pub owner_id: UserId,
    pub amount_cents: i64,
    pub description: String,
    pub issued_at: Timestamp,
}

impl Invoice {
    /// Builds the invoice for a completed intent.
    ///
    /// The number is derived from the intent, so two attempts to issue for
    /// the same payment produce the same number.
    pub fn for_payment(intent: &PaymentIntent, issued_at: Timestamp) -> Self {
        Self {
            id: InvoiceId::new(),
            number: Self::number_for(intent),
            payment_intent_id: intent.id,
            owner_id: intent.owner_id.clone(),
            amount_cents: intent.amount_cents,
            description: intent.description.clone(),
            issued_at,
        }
    }

    fn number_for(intent: &PaymentIntent) -> String {
        let day = intent.completed_at.unwrap_or(intent.created_at).compact_date();
        let suffix = intent.id.as_uuid().simple().to_string().to_uppercase();
        format!("INV-{}-{}", day, &suffix[..10])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::PropertyId;
    use crate::domain::payment::{Catalog, PaymentPurpose, PaymentStatus};

    #[test]
    fn invoice_copies_amount_and_has_stable_number() {
        let mut intent = PaymentIntent::create(
            UserId::new("owner").unwrap(),
            PaymentPurpose::Boost {
                boost_type: "spotlight".into(),
                property_id: PropertyId::new(42).unwrap(),
            },
            &Catalog::standard(),
        )
        .unwrap();
        intent.settle(PaymentStatus::Completed, Timestamp::now()).unwrap();

        let first = Invoice::for_payment(&intent, Timestamp::now());
        let second = Invoice::for_payment(&intent, Timestamp::now());

        assert_eq!(first.amount_cents, 9_900);
        assert_eq!(first.payment_intent_id, intent.id);
        assert_eq!(first.number, second.number);
        assert!(first.number.starts_with("INV-"));
        assert_ne!(first.id, second.id);
    }
}
