//! In-memory ListingCreditRepository.

use async_trait::async_trait;
use std::sync::Mutex;

use super::lock;
use crate::domain::entitlement::ListingCredit;
use crate::domain::foundation::{DomainError, UserId};
use crate::ports::{ListingCreditRepository, SaveResult};

#[derive(Default)]
pub struct InMemoryListingCreditRepository {
    credits: Mutex<Vec<ListingCredit>>,
}

impl InMemoryListingCreditRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ListingCreditRepository for InMemoryListingCreditRepository {
    async fn grant(&self, credit: &ListingCredit) -> Result<SaveResult, DomainError> {
        let mut credits = lock(&self.credits);
        if credits
            .iter()
            .any(|existing| existing.payment_intent_id == credit.payment_intent_id)
        {
            return Ok(SaveResult::AlreadyExists);
        }
        credits.push(credit.clone());
        Ok(SaveResult::Inserted)
    }

    async fn purchased_slots(&self, owner_id: &UserId) -> Result<i64, DomainError> {
        Ok(lock(&self.credits)
            .iter()
            .filter(|credit| &credit.owner_id == owner_id)
            .map(|credit| i64::from(credit.slots))
            .sum())
    }
}
