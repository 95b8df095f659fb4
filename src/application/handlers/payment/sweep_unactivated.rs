//! SweepUnactivatedHandler - Grants entitlements that were paid but never applied.
//!
//! Catches intents whose inline activation failed and whose deferred task
//! could not be queued or was lost.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;

use crate::application::reconciler::{Reconciler, StepOutcome};
use crate::domain::entitlement::TaskKind;
use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::PaymentIntentRepository;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub scanned: usize,
    pub granted: usize,
    pub failed: usize,
}

pub struct SweepUnactivatedHandler {
    intents: Arc<dyn PaymentIntentRepository>,
    reconciler: Arc<Reconciler>,
    /// Intents completed more recently than this are left to the inline path.
    grace: Duration,
    batch_size: u32,
    concurrency: usize,
}

impl SweepUnactivatedHandler {
    pub fn new(
        intents: Arc<dyn PaymentIntentRepository>,
        reconciler: Arc<Reconciler>,
        grace: Duration,
        batch_size: u32,
        concurrency: usize,
    ) -> Self {
        Self {
            intents,
            reconciler,
            grace,
            batch_size,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn handle(&self) -> Result<SweepSummary, DomainError> {
        let cutoff = Timestamp::now().minus(self.grace);
        let pending = self.intents.find_unactivated(cutoff, self.batch_size).await?;

        let mut summary = SweepSummary {
            scanned: pending.len(),
            ..SweepSummary::default()
        };
        if pending.is_empty() {
            return Ok(summary);
        }

        let reconciler = &self.reconciler;
        let results: Vec<_> = stream::iter(pending)
            .map(|intent| async move {
                let result = reconciler.run_side_effect(TaskKind::Entitlement, &intent).await;
                (intent.id, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for (id, result) in results {
            match result {
                Ok(StepOutcome::Done) => {
                    tracing::info!(payment_intent_id = %id, "Swept entitlement granted");
                    summary.granted += 1;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(payment_intent_id = %id, error = %e, "Entitlement sweep failed");
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}
