//! PaymentIntent aggregate.

use serde::{Deserialize, Serialize};

use super::{BankReference, Catalog, EntitlementSpec, ExternalRef, PaymentError, PaymentPurpose, PaymentStatus};
use crate::domain::foundation::{PaymentIntentId, StateMachine, Timestamp, UserId, ValidationError};

/// Durable record of one purchase attempt.
///
/// The amount is fixed from the catalog at creation and never changes.
/// Status leaves `Pending` at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: PaymentIntentId,
    pub owner_id: UserId,
    pub purpose: PaymentPurpose,
    pub amount_cents: i64,
    pub status: PaymentStatus,
    pub external_ref: Option<ExternalRef>,
    pub description: String,
    pub metadata: EntitlementSpec,
    pub created_at: Timestamp,
    /// When the terminal status was recorded.
    pub completed_at: Option<Timestamp>,
    /// When the matching entitlement was observed as granted.
    pub entitlement_granted_at: Option<Timestamp>,
}

impl PaymentIntent {
    /// Prices the purpose from the catalog and builds a new `Pending` intent.
    ///
    /// # Errors
    ///
    /// - `InvalidPurpose` if the purpose fields do not fit together
    /// - `UnknownPurpose` if a symbolic key is not in the catalog
    pub fn create(
        owner_id: UserId,
        purpose: PaymentPurpose,
        catalog: &Catalog,
    ) -> Result<Self, PaymentError> {
        purpose.validate()?;

        let amount_cents = catalog.price_of(&purpose)?;
        if amount_cents <= 0 {
            return Err(PaymentError::invalid_purpose("amount must be positive"));
        }
        let metadata = catalog.entitlement_of(&purpose)?;
        let description = catalog.description_of(&purpose)?;

        Ok(Self {
            id: PaymentIntentId::new(),
            owner_id,
            purpose,
            amount_cents,
            status: PaymentStatus::Pending,
            external_ref: None,
            description,
            metadata,
            created_at: Timestamp::now(),
            completed_at: None,
            entitlement_granted_at: None,
        })
    }

    /// Records the gateway reference. Only ever allowed once.
    pub fn attach_external_ref(&mut self, reference: ExternalRef) -> Result<(), PaymentError> {
        if self.external_ref.is_some() {
            return Err(PaymentError::AlreadyAttached(self.id));
        }
        self.external_ref = Some(reference);
        Ok(())
    }

    /// Moves a pending intent to a terminal status.
    pub fn settle(&mut self, status: PaymentStatus, at: Timestamp) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(status)?;
        self.completed_at = Some(at);
        Ok(())
    }

    pub fn is_pending(&self) -> bool {
        self.status == PaymentStatus::Pending
    }

    /// True when settling this intent should unlock something.
    pub fn grants_entitlement(&self) -> bool {
        self.metadata != EntitlementSpec::None
    }

    pub fn bank_reference(&self) -> BankReference {
        BankReference::from_description(&self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::PropertyId;

    fn owner() -> UserId {
        UserId::new("owner-1").unwrap()
    }

    fn spotlight_intent() -> PaymentIntent {
        PaymentIntent::create(
            owner(),
            PaymentPurpose::Boost {
                boost_type: "spotlight".into(),
                property_id: PropertyId::new(42).unwrap(),
            },
            &Catalog::standard(),
        )
        .unwrap()
    }

    #[test]
    fn create_prices_from_catalog() {
        let intent = spotlight_intent();
        assert_eq!(intent.amount_cents, 9_900);
        assert_eq!(intent.status, PaymentStatus::Pending);
        assert!(intent.external_ref.is_none());
        assert!(intent.completed_at.is_none());
        assert!(intent.grants_entitlement());
    }

    #[test]
    fn create_rejects_unknown_plan() {
        let result = PaymentIntent::create(
            owner(),
            PaymentPurpose::Subscription {
                plan: "platinum".into(),
            },
            &Catalog::standard(),
        );
        assert!(matches!(result, Err(PaymentError::UnknownPurpose(_))));
    }

    #[test]
    fn create_rejects_inconsistent_adhoc() {
        let result = PaymentIntent::create(
            owner(),
            PaymentPurpose::Adhoc {
                amount_cents: -5,
                description: "refund?".into(),
            },
            &Catalog::standard(),
        );
        assert!(matches!(result, Err(PaymentError::InvalidPurpose(_))));
    }

    #[test]
    fn external_ref_attaches_once() {
        let mut intent = spotlight_intent();
        intent.attach_external_ref(ExternalRef::generate()).unwrap();
        let second = intent.attach_external_ref(ExternalRef::generate());
        assert_eq!(second, Err(PaymentError::AlreadyAttached(intent.id)));
    }

    #[test]
    fn settle_is_forward_only() {
        let mut intent = spotlight_intent();
        let at = Timestamp::now();
        intent.settle(PaymentStatus::Completed, at).unwrap();
        assert_eq!(intent.completed_at, Some(at));

        assert!(intent.settle(PaymentStatus::Cancelled, Timestamp::now()).is_err());
        assert_eq!(intent.status, PaymentStatus::Completed);
        assert_eq!(intent.completed_at, Some(at));
    }

    #[test]
    fn bank_reference_is_derived_from_description() {
        let intent = spotlight_intent();
        assert_eq!(intent.bank_reference().as_str(), "Spotlight boost prop");
    }
}
