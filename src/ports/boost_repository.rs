//! Listing boost store port.

use async_trait::async_trait;

use super::SaveResult;
use crate::domain::entitlement::ListingBoost;
use crate::domain::foundation::{DomainError, PaymentIntentId, PropertyId, Timestamp};

#[async_trait]
pub trait BoostRepository: Send + Sync {
    /// Append a boost. `AlreadyExists` if this payment already funded one.
    async fn insert(&self, boost: &ListingBoost) -> Result<SaveResult, DomainError>;

    async fn find_by_payment(
        &self,
        payment_intent_id: &PaymentIntentId,
    ) -> Result<Option<ListingBoost>, DomainError>;

    async fn find_by_property(&self, property_id: &PropertyId) -> Result<Vec<ListingBoost>, DomainError>;

    /// Flag the property as featured until at least `until`.
    ///
    /// Never shortens an existing featured window.
    async fn feature_property(&self, property_id: &PropertyId, until: Timestamp) -> Result<(), DomainError>;

    /// End of the property's featured window, if it has one.
    async fn featured_until(&self, property_id: &PropertyId) -> Result<Option<Timestamp>, DomainError>;
}
