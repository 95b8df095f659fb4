//! Deferred side-effect queue port.

use async_trait::async_trait;
use std::time::Duration;

use super::SaveResult;
use crate::domain::entitlement::{DeferredTask, TaskKind};
use crate::domain::foundation::{DomainError, PaymentIntentId, Timestamp};

#[async_trait]
pub trait DeferredTaskRepository: Send + Sync {
    /// Record a failed step. Keyed by `(payment_intent_id, kind)`; an
    /// existing task for the same key is left as is.
    async fn schedule(&self, task: &DeferredTask) -> Result<SaveResult, DomainError>;

    /// Claim up to `limit` due tasks, pushing their `next_attempt_at` out by
    /// `lease` so no other worker picks them up meanwhile.
    async fn claim_due(
        &self,
        now: Timestamp,
        lease: Duration,
        limit: u32,
    ) -> Result<Vec<DeferredTask>, DomainError>;

    /// Persist attempt count, error and schedule after a failed retry.
    async fn update(&self, task: &DeferredTask) -> Result<(), DomainError>;

    /// Remove a task whose step finally succeeded.
    async fn complete(&self, payment_intent_id: &PaymentIntentId, kind: TaskKind) -> Result<(), DomainError>;

    async fn find(
        &self,
        payment_intent_id: &PaymentIntentId,
        kind: TaskKind,
    ) -> Result<Option<DeferredTask>, DomainError>;
}
