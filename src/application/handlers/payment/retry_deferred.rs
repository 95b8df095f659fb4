//! RetryDeferredTasksHandler - Re-runs post-settlement steps that failed.

use std::sync::Arc;
use std::time::Duration;

use crate::application::reconciler::Reconciler;
use crate::domain::entitlement::{DeferredTask, TaskState};
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::ports::{DeferredTaskRepository, PaymentIntentRepository};

/// Counts from one retry pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetrySummary {
    pub claimed: usize,
    pub succeeded: usize,
    pub rescheduled: usize,
    pub exhausted: usize,
}

pub struct RetryDeferredTasksHandler {
    deferred: Arc<dyn DeferredTaskRepository>,
    intents: Arc<dyn PaymentIntentRepository>,
    reconciler: Arc<Reconciler>,
    batch_size: u32,
    lease: Duration,
}

impl RetryDeferredTasksHandler {
    pub fn new(
        deferred: Arc<dyn DeferredTaskRepository>,
        intents: Arc<dyn PaymentIntentRepository>,
        reconciler: Arc<Reconciler>,
        batch_size: u32,
        lease: Duration,
    ) -> Self {
        Self {
            deferred,
            intents,
            reconciler,
            batch_size,
            lease,
        }
    }

    pub async fn handle(&self) -> Result<RetrySummary, DomainError> {
        let tasks = self
            .deferred
            .claim_due(Timestamp::now(), self.lease, self.batch_size)
            .await?;

        let mut summary = RetrySummary {
            claimed: tasks.len(),
            ..RetrySummary::default()
        };

        for mut task in tasks {
            match self.attempt(&task).await {
                Ok(()) => {
                    self.deferred.complete(&task.payment_intent_id, task.kind).await?;
                    tracing::info!(
                        payment_intent_id = %task.payment_intent_id,
                        step = %task.kind,
                        attempts = task.attempts + 1,
                        "Deferred step succeeded"
                    );
                    summary.succeeded += 1;
                }
                Err(e) => {
                    let policy = self.reconciler.settings().retry_policy;
                    task.record_failure(e.to_string(), &policy, Timestamp::now());
                    self.deferred.update(&task).await?;

                    if task.state == TaskState::Exhausted {
                        tracing::error!(
                            payment_intent_id = %task.payment_intent_id,
                            step = %task.kind,
                            attempts = task.attempts,
                            error = %e,
                            "Deferred step exhausted its retries"
                        );
                        summary.exhausted += 1;
                    } else {
                        tracing::warn!(
                            payment_intent_id = %task.payment_intent_id,
                            step = %task.kind,
                            attempts = task.attempts,
                            error = %e,
                            "Deferred step failed again"
                        );
                        summary.rescheduled += 1;
                    }
                }
            }
        }

        Ok(summary)
    }

    async fn attempt(&self, task: &DeferredTask) -> Result<(), DomainError> {
        let intent = self
            .intents
            .find_by_id(&task.payment_intent_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::PaymentNotFound,
                    "Payment intent for deferred task not found",
                )
                .with_detail("payment_id", task.payment_intent_id.to_string())
            })?;

        self.reconciler.run_side_effect(task.kind, &intent).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::reconciler::ReconcilerSettings;
    use crate::application::testing::{basic_plan, callback, Harness};
    use crate::domain::entitlement::{RetryPolicy, TaskKind};
    use crate::domain::payment::{GatewayStatus, PaymentIntent};

    fn retry_handler(h: &Harness) -> RetryDeferredTasksHandler {
        RetryDeferredTasksHandler::new(
            h.deferred.clone(),
            h.intents.clone(),
            h.reconciler.clone(),
            10,
            Duration::from_secs(300),
        )
    }

    async fn settle_with_failing_invoice(h: &Harness) -> PaymentIntent {
        h.invoices.fail_inserts(true);
        let intent = h.pending_intent("owner-1", basic_plan()).await;
        h.reconciler
            .reconcile(&callback(&intent, GatewayStatus::Completed))
            .await
            .unwrap();
        intent
    }

    #[tokio::test]
    async fn tasks_not_yet_due_are_left_alone() {
        let h = Harness::new();
        settle_with_failing_invoice(&h).await;

        let summary = retry_handler(&h).handle().await.unwrap();

        assert_eq!(summary, RetrySummary::default());
        assert_eq!(h.deferred.all().len(), 1);
    }

    #[tokio::test]
    async fn failing_step_is_rescheduled_then_completed() {
        let h = Harness::new();
        let intent = settle_with_failing_invoice(&h).await;
        let handler = retry_handler(&h);

        h.deferred.make_all_due();
        let first = handler.handle().await.unwrap();
        assert_eq!(first.claimed, 1);
        assert_eq!(first.rescheduled, 1);
        let task = h.deferred.find(&intent.id, TaskKind::Invoice).await.unwrap().unwrap();
        assert_eq!(task.attempts, 2);
        assert_eq!(task.state, TaskState::Scheduled);

        h.invoices.fail_inserts(false);
        h.deferred.make_all_due();
        let second = handler.handle().await.unwrap();
        assert_eq!(second.succeeded, 1);
        assert!(h.deferred.all().is_empty());
        assert_eq!(h.invoices.count(), 1);
    }

    #[tokio::test]
    async fn step_is_exhausted_after_max_attempts() {
        let settings = ReconcilerSettings {
            retry_policy: RetryPolicy {
                max_attempts: 2,
                ..RetryPolicy::default()
            },
            ..ReconcilerSettings::default()
        };
        let h = Harness::with_settings(settings);
        let intent = settle_with_failing_invoice(&h).await;
        let handler = retry_handler(&h);

        h.deferred.make_all_due();
        let summary = handler.handle().await.unwrap();
        assert_eq!(summary.exhausted, 1);

        let task = h.deferred.find(&intent.id, TaskKind::Invoice).await.unwrap().unwrap();
        assert_eq!(task.state, TaskState::Exhausted);

        h.deferred.make_all_due();
        assert_eq!(handler.handle().await.unwrap().claimed, 0);
    }
}
