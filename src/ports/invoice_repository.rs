//! Invoice store port.

use async_trait::async_trait;

use super::SaveResult;
use crate::domain::entitlement::Invoice;
use crate::domain::foundation::{DomainError, PaymentIntentId};

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// Insert guarded by the unique `payment_intent_id` constraint.
    ///
    /// A violation of that constraint is reported as `AlreadyExists`.
    async fn insert(&self, invoice: &Invoice) -> Result<SaveResult, DomainError>;

    async fn find_by_payment_intent(
        &self,
        payment_intent_id: &PaymentIntentId,
    ) -> Result<Option<Invoice>, DomainError>;
}
