//! In-memory DeferredTaskRepository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::lock;
use crate::domain::entitlement::{DeferredTask, TaskKind};
use crate::domain::foundation::{DomainError, PaymentIntentId, Timestamp};
use crate::ports::{DeferredTaskRepository, SaveResult};

#[derive(Default)]
pub struct InMemoryDeferredTaskRepository {
    tasks: Mutex<HashMap<(PaymentIntentId, TaskKind), DeferredTask>>,
}

impl InMemoryDeferredTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<DeferredTask> {
        lock(&self.tasks).values().cloned().collect()
    }

    /// Make every task due immediately. Test helper.
    pub fn make_all_due(&self) {
        let now = Timestamp::now().minus(Duration::from_secs(1));
        for task in lock(&self.tasks).values_mut() {
            task.next_attempt_at = now;
        }
    }
}

#[async_trait]
impl DeferredTaskRepository for InMemoryDeferredTaskRepository {
    async fn schedule(&self, task: &DeferredTask) -> Result<SaveResult, DomainError> {
        let mut tasks = lock(&self.tasks);
        let key = (task.payment_intent_id, task.kind);
        if tasks.contains_key(&key) {
            return Ok(SaveResult::AlreadyExists);
        }
        tasks.insert(key, task.clone());
        Ok(SaveResult::Inserted)
    }

    async fn claim_due(&self, now: Timestamp, lease: Duration, limit: u32) -> Result<Vec<DeferredTask>, DomainError> {
        let mut tasks = lock(&self.tasks);
        let mut due: Vec<&mut DeferredTask> = tasks.values_mut().filter(|task| task.is_due(&now)).collect();
        due.sort_by_key(|task| (task.next_attempt_at, task.payment_intent_id));

        let leased_until = now.plus(lease);
        Ok(due
            .into_iter()
            .take(limit as usize)
            .map(|task| {
                let claimed = task.clone();
                task.next_attempt_at = leased_until;
                claimed
            })
            .collect())
    }

    async fn update(&self, task: &DeferredTask) -> Result<(), DomainError> {
        lock(&self.tasks).insert((task.payment_intent_id, task.kind), task.clone());
        Ok(())
    }

    async fn complete(&self, payment_intent_id: &PaymentIntentId, kind: TaskKind) -> Result<(), DomainError> {
        lock(&self.tasks).remove(&(*payment_intent_id, kind));
        Ok(())
    }

    async fn find(&self, payment_intent_id: &PaymentIntentId, kind: TaskKind) -> Result<Option<DeferredTask>, DomainError> {
        Ok(lock(&self.tasks).get(&(*payment_intent_id, kind)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entitlement::RetryPolicy;

    #[tokio::test]
    async fn claimed_tasks_are_leased() {
        let repo = InMemoryDeferredTaskRepository::new();
        let task = DeferredTask::first_failure(
            PaymentIntentId::new(),
            TaskKind::Invoice,
            "timeout",
            &RetryPolicy::default(),
            Timestamp::now(),
        );
        repo.schedule(&task).await.unwrap();
        repo.make_all_due();

        let now = Timestamp::now();
        let first = repo.claim_due(now, Duration::from_secs(60), 10).await.unwrap();
        let second = repo.claim_due(now, Duration::from_secs(60), 10).await.unwrap();

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn schedule_keeps_existing_task() {
        let repo = InMemoryDeferredTaskRepository::new();
        let id = PaymentIntentId::new();
        let policy = RetryPolicy::default();
        let first = DeferredTask::first_failure(id, TaskKind::Referral, "first", &policy, Timestamp::now());
        let second = DeferredTask::first_failure(id, TaskKind::Referral, "second", &policy, Timestamp::now());

        assert_eq!(repo.schedule(&first).await.unwrap(), SaveResult::Inserted);
        assert_eq!(repo.schedule(&second).await.unwrap(), SaveResult::AlreadyExists);
        assert_eq!(repo.find(&id, TaskKind::Referral).await.unwrap().unwrap().last_error, "first");
    }
}
