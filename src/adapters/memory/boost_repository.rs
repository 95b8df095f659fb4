//! In-memory BoostRepository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::lock;
use crate::domain::entitlement::ListingBoost;
use crate::domain::foundation::{DomainError, PaymentIntentId, PropertyId, Timestamp};
use crate::ports::{BoostRepository, SaveResult};

#[derive(Default)]
struct State {
    boosts: Vec<ListingBoost>,
    featured: HashMap<PropertyId, Timestamp>,
}

#[derive(Default)]
pub struct InMemoryBoostRepository {
    state: Mutex<State>,
}

impl InMemoryBoostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        lock(&self.state).boosts.len()
    }
}

#[async_trait]
impl BoostRepository for InMemoryBoostRepository {
    async fn insert(&self, boost: &ListingBoost) -> Result<SaveResult, DomainError> {
        let mut state = lock(&self.state);
        if state
            .boosts
            .iter()
            .any(|existing| existing.payment_intent_id == boost.payment_intent_id)
        {
            return Ok(SaveResult::AlreadyExists);
        }
        state.boosts.push(boost.clone());
        Ok(SaveResult::Inserted)
    }

    async fn find_by_payment(
        &self,
        payment_intent_id: &PaymentIntentId,
    ) -> Result<Option<ListingBoost>, DomainError> {
        Ok(lock(&self.state)
            .boosts
            .iter()
            .find(|boost| &boost.payment_intent_id == payment_intent_id)
            .cloned())
    }

    async fn find_by_property(&self, property_id: &PropertyId) -> Result<Vec<ListingBoost>, DomainError> {
        Ok(lock(&self.state)
            .boosts
            .iter()
            .filter(|boost| &boost.property_id == property_id)
            .cloned()
            .collect())
    }

    async fn feature_property(&self, property_id: &PropertyId, until: Timestamp) -> Result<(), DomainError> {
        let mut state = lock(&self.state);
        let entry = state.featured.entry(*property_id).or_insert(until);
        if entry.is_before(&until) {
            *entry = until;
        }
        Ok(())
    }

    async fn featured_until(&self, property_id: &PropertyId) -> Result<Option<Timestamp>, DomainError> {
        Ok(lock(&self.state).featured.get(property_id).copied())
    }
}
