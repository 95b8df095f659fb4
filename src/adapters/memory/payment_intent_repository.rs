//! In-memory PaymentIntentRepository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::lock;
use crate::domain::foundation::{DomainError, ErrorCode, PaymentIntentId, StateMachine, Timestamp, UserId};
use crate::domain::payment::{ExternalRef, PaymentIntent, PaymentStatus};
use crate::ports::{PaymentIntentRepository, TransitionOutcome};

#[derive(Default)]
pub struct InMemoryPaymentIntentRepository {
    intents: Mutex<HashMap<PaymentIntentId, PaymentIntent>>,
}

impl InMemoryPaymentIntentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a stored intent. Test setup only.
    pub fn put(&self, intent: PaymentIntent) {
        lock(&self.intents).insert(intent.id, intent);
    }

    pub fn count(&self) -> usize {
        lock(&self.intents).len()
    }
}

fn not_found(id: &PaymentIntentId) -> DomainError {
    DomainError::new(ErrorCode::PaymentNotFound, "Payment intent not found")
        .with_detail("payment_id", id.to_string())
}

#[async_trait]
impl PaymentIntentRepository for InMemoryPaymentIntentRepository {
    async fn create(&self, intent: &PaymentIntent) -> Result<(), DomainError> {
        let mut intents = lock(&self.intents);
        if intents.contains_key(&intent.id) {
            return Err(DomainError::new(ErrorCode::Conflict, "Payment intent already exists")
                .with_detail("payment_id", intent.id.to_string()));
        }
        intents.insert(intent.id, intent.clone());
        Ok(())
    }

    async fn attach_external_ref(
        &self,
        id: &PaymentIntentId,
        reference: &ExternalRef,
    ) -> Result<(), DomainError> {
        let mut intents = lock(&self.intents);
        if intents
            .values()
            .any(|other| other.id != *id && other.external_ref.as_ref() == Some(reference))
        {
            return Err(DomainError::new(ErrorCode::Conflict, "External reference already in use")
                .with_detail("external_ref", reference.as_str()));
        }
        let intent = intents.get_mut(id).ok_or_else(|| not_found(id))?;
        intent
            .attach_external_ref(reference.clone())
            .map_err(DomainError::from)
    }

    async fn find_by_id(&self, id: &PaymentIntentId) -> Result<Option<PaymentIntent>, DomainError> {
        Ok(lock(&self.intents).get(id).cloned())
    }

    async fn find_by_external_ref(
        &self,
        reference: &ExternalRef,
    ) -> Result<Option<PaymentIntent>, DomainError> {
        Ok(lock(&self.intents)
            .values()
            .find(|intent| intent.external_ref.as_ref() == Some(reference))
            .cloned())
    }

    async fn transition_terminal(
        &self,
        id: &PaymentIntentId,
        status: PaymentStatus,
        at: Timestamp,
    ) -> Result<TransitionOutcome, DomainError> {
        if !PaymentStatus::Pending.can_transition_to(&status) {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("{} is not a terminal payment status", status),
            ));
        }

        let mut intents = lock(&self.intents);
        let intent = intents.get_mut(id).ok_or_else(|| not_found(id))?;

        if !intent.is_pending() {
            return Ok(TransitionOutcome {
                applied: false,
                intent: intent.clone(),
            });
        }

        intent.settle(status, at)?;
        Ok(TransitionOutcome {
            applied: true,
            intent: intent.clone(),
        })
    }

    async fn mark_entitlement_granted(&self, id: &PaymentIntentId, at: Timestamp) -> Result<(), DomainError> {
        let mut intents = lock(&self.intents);
        let intent = intents.get_mut(id).ok_or_else(|| not_found(id))?;
        intent.entitlement_granted_at.get_or_insert(at);
        Ok(())
    }

    async fn find_unactivated(
        &self,
        completed_before: Timestamp,
        limit: u32,
    ) -> Result<Vec<PaymentIntent>, DomainError> {
        let intents = lock(&self.intents);
        let mut found: Vec<PaymentIntent> = intents
            .values()
            .filter(|intent| {
                intent.status == PaymentStatus::Completed
                    && intent.grants_entitlement()
                    && intent.entitlement_granted_at.is_none()
                    && intent
                        .completed_at
                        .is_some_and(|completed| completed.is_before(&completed_before))
            })
            .cloned()
            .collect();
        found.sort_by_key(|intent| (intent.completed_at, intent.id));
        found.truncate(limit as usize);
        Ok(found)
    }

    async fn first_completed_for_owner(&self, owner_id: &UserId) -> Result<Option<PaymentIntentId>, DomainError> {
        let intents = lock(&self.intents);
        Ok(intents
            .values()
            .filter(|intent| &intent.owner_id == owner_id && intent.status == PaymentStatus::Completed)
            .filter_map(|intent| intent.completed_at.map(|at| (at, intent.id)))
            .min()
            .map(|(_, id)| id))
    }

    async fn find_stale_pending(
        &self,
        created_before: Timestamp,
        limit: u32,
    ) -> Result<Vec<PaymentIntentId>, DomainError> {
        let intents = lock(&self.intents);
        let mut found: Vec<(Timestamp, PaymentIntentId)> = intents
            .values()
            .filter(|intent| intent.is_pending() && intent.created_at.is_before(&created_before))
            .map(|intent| (intent.created_at, intent.id))
            .collect();
        found.sort();
        Ok(found
            .into_iter()
            .take(limit as usize)
            .map(|(_, id)| id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::{Catalog, PaymentPurpose};
    use std::sync::Arc;

    fn intent() -> PaymentIntent {
        PaymentIntent::create(
            UserId::new("owner-1").unwrap(),
            PaymentPurpose::ListingFee {
                tier: "standard".into(),
            },
            &Catalog::standard(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn transition_applies_once() {
        let repo = InMemoryPaymentIntentRepository::new();
        let intent = intent();
        repo.create(&intent).await.unwrap();

        let first = repo
            .transition_terminal(&intent.id, PaymentStatus::Completed, Timestamp::now())
            .await
            .unwrap();
        let second = repo
            .transition_terminal(&intent.id, PaymentStatus::Failed, Timestamp::now())
            .await
            .unwrap();

        assert!(first.applied);
        assert!(!second.applied);
        assert_eq!(second.intent.status, PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn concurrent_transitions_have_one_winner() {
        let repo = Arc::new(InMemoryPaymentIntentRepository::new());
        let intent = intent();
        repo.create(&intent).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let repo = repo.clone();
            let id = intent.id;
            handles.push(tokio::spawn(async move {
                repo.transition_terminal(&id, PaymentStatus::Completed, Timestamp::now())
                    .await
                    .unwrap()
                    .applied
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn pending_is_not_a_transition_target() {
        let repo = InMemoryPaymentIntentRepository::new();
        let intent = intent();
        repo.create(&intent).await.unwrap();

        let err = repo
            .transition_terminal(&intent.id, PaymentStatus::Pending, Timestamp::now())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }

    #[tokio::test]
    async fn reference_cannot_be_shared() {
        let repo = InMemoryPaymentIntentRepository::new();
        let a = intent();
        let b = intent();
        repo.create(&a).await.unwrap();
        repo.create(&b).await.unwrap();

        let reference = ExternalRef::generate();
        repo.attach_external_ref(&a.id, &reference).await.unwrap();
        let err = repo.attach_external_ref(&b.id, &reference).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::Conflict);
        let found = repo.find_by_external_ref(&reference).await.unwrap().unwrap();
        assert_eq!(found.id, a.id);
    }
}
