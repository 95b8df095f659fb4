//! Payment intent store port.
//!
//! The intent row is the single serialization point of the engine. Every
//! status change goes through `transition_terminal`, which implementations
//! must make an atomic compare-and-swap at the storage layer, never a
//! read followed by a write.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, PaymentIntentId, Timestamp, UserId};
use crate::domain::payment::{ExternalRef, PaymentIntent, PaymentStatus};

/// Result of a compare-and-swap out of `Pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    /// True only for the single call that moved the intent out of `Pending`.
    pub applied: bool,
    /// The intent as stored after the attempt.
    pub intent: PaymentIntent,
}

#[async_trait]
pub trait PaymentIntentRepository: Send + Sync {
    /// Persist a new `Pending` intent.
    async fn create(&self, intent: &PaymentIntent) -> Result<(), DomainError>;

    /// Attach the gateway reference.
    ///
    /// # Errors
    ///
    /// - `AlreadyAttached` if the intent already has a reference
    /// - `Conflict` if another intent already uses this reference
    /// - `PaymentNotFound` if the intent does not exist
    async fn attach_external_ref(
        &self,
        id: &PaymentIntentId,
        reference: &ExternalRef,
    ) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &PaymentIntentId) -> Result<Option<PaymentIntent>, DomainError>;

    /// Locate the intent a callback refers to. `None` for unknown references.
    async fn find_by_external_ref(
        &self,
        reference: &ExternalRef,
    ) -> Result<Option<PaymentIntent>, DomainError>;

    /// Atomically move a `Pending` intent to `status`.
    ///
    /// Returns `applied = false` (not an error) when the intent was already
    /// terminal. Concurrent calls for the same intent see exactly one
    /// `applied = true`.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if `status` is not terminal
    /// - `PaymentNotFound` if the intent does not exist
    async fn transition_terminal(
        &self,
        id: &PaymentIntentId,
        status: PaymentStatus,
        at: Timestamp,
    ) -> Result<TransitionOutcome, DomainError>;

    /// Record that the paid entitlement has been granted.
    async fn mark_entitlement_granted(
        &self,
        id: &PaymentIntentId,
        at: Timestamp,
    ) -> Result<(), DomainError>;

    /// Completed intents that grant something but were never marked granted,
    /// settled before `completed_before`. Oldest first.
    async fn find_unactivated(
        &self,
        completed_before: Timestamp,
        limit: u32,
    ) -> Result<Vec<PaymentIntent>, DomainError>;

    /// The owner's earliest completed intent, ordered by `(completed_at, id)`.
    async fn first_completed_for_owner(
        &self,
        owner_id: &UserId,
    ) -> Result<Option<PaymentIntentId>, DomainError>;

    /// Pending intents created before the cutoff. Oldest first.
    async fn find_stale_pending(
        &self,
        created_before: Timestamp,
        limit: u32,
    ) -> Result<Vec<PaymentIntentId>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn _accepts_dyn(_repo: &dyn PaymentIntentRepository) {}
}
