//! Subscription store port.

use async_trait::async_trait;

use super::SaveResult;
use crate::domain::entitlement::Subscription;
use crate::domain::foundation::{DomainError, UserId};

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Upsert the owner's single subscription row in one statement.
    ///
    /// Returns `AlreadyExists`, leaving the row untouched, unless the stored
    /// period was funded by an earlier payment than `subscription`'s
    /// (`Subscription::is_superseded_by`).
    async fn upsert_paid_period(&self, subscription: &Subscription) -> Result<SaveResult, DomainError>;

    async fn find_by_owner(&self, owner_id: &UserId) -> Result<Option<Subscription>, DomainError>;
}
