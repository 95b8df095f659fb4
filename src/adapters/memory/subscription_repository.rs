//! In-memory SubscriptionRepository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{injected_failure, lock};
use crate::domain::entitlement::Subscription;
use crate::domain::foundation::{DomainError, UserId};
use crate::ports::{SaveResult, SubscriptionRepository};

#[derive(Default)]
pub struct InMemorySubscriptionRepository {
    rows: Mutex<HashMap<UserId, Subscription>>,
    failing: AtomicBool,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        lock(&self.rows).len()
    }

    /// Make every upsert fail until switched off.
    pub fn fail_upserts(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn upsert_paid_period(&self, subscription: &Subscription) -> Result<SaveResult, DomainError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(injected_failure("subscriptions"));
        }

        let mut rows = lock(&self.rows);
        if let Some(existing) = rows.get(&subscription.owner_id) {
            if !existing.is_superseded_by(subscription) {
                return Ok(SaveResult::AlreadyExists);
            }
        }
        rows.insert(subscription.owner_id.clone(), subscription.clone());
        Ok(SaveResult::Inserted)
    }

    async fn find_by_owner(&self, owner_id: &UserId) -> Result<Option<Subscription>, DomainError> {
        Ok(lock(&self.rows).get(owner_id).cloned())
    }
}
