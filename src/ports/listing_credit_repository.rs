//! Listing quota store port.

use async_trait::async_trait;

use super::SaveResult;
use crate::domain::entitlement::ListingCredit;
use crate::domain::foundation::{DomainError, UserId};

#[async_trait]
pub trait ListingCreditRepository: Send + Sync {
    /// Record the slots bought by one payment. One row per payment intent.
    async fn grant(&self, credit: &ListingCredit) -> Result<SaveResult, DomainError>;

    /// Total listing slots ever purchased by the owner.
    async fn purchased_slots(&self, owner_id: &UserId) -> Result<i64, DomainError>;
}
