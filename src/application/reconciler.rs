//! Reconciler - turns a verified gateway callback into settled state.
//!
//! 1. Locate the intent by external reference (unknown references fail).
//! 2. Stop on an unknown gateway status.
//! 3. Compare-and-swap the intent out of `Pending`; a lost swap is a replay.
//! 4. Only for the winning `Completed` swap, run entitlement, invoice and
//!    referral in that order. Each step is bounded by a timeout; failures
//!    are queued for retry and never undo the settlement.

use std::sync::Arc;
use std::time::Duration;

use super::activators::{ActivationOutcome, ActivatorRegistry};
use super::invoice_issuer::InvoiceIssuer;
use super::publishing::{publish_best_effort, settled_event};
use super::referral_rewarder::{ReferralRewarder, RewardOutcome};
use crate::domain::entitlement::{DeferredTask, EntitlementGranted, RetryPolicy, TaskKind};
use crate::domain::foundation::{DomainError, ErrorCode, EventId, PaymentIntentId, Timestamp};
use crate::domain::payment::{CallbackError, GatewayStatus, PaymentIntent, PaymentStatus, VerifiedCallback};
use crate::ports::{DeferredTaskRepository, EventPublisher, PaymentIntentRepository, SaveResult};

/// Timeouts and retry schedule for post-settlement steps.
#[derive(Debug, Clone, Copy)]
pub struct ReconcilerSettings {
    /// Upper bound for granting the entitlement.
    pub activator_timeout: Duration,
    /// Upper bound for invoice and referral steps.
    pub side_effect_timeout: Duration,
    pub retry_policy: RetryPolicy,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            activator_timeout: Duration::from_secs(10),
            side_effect_timeout: Duration::from_secs(5),
            retry_policy: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Done,
    /// Nothing to do for this intent.
    Skipped,
    /// Failed or timed out; queued for retry with this reason.
    Deferred(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideEffectReport {
    pub entitlement: StepOutcome,
    pub invoice: StepOutcome,
    pub referral: StepOutcome,
}

impl SideEffectReport {
    fn skipped() -> Self {
        Self {
            entitlement: StepOutcome::Skipped,
            invoice: StepOutcome::Skipped,
            referral: StepOutcome::Skipped,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Gateway status had no meaning for us; acknowledged, nothing changed.
    Ignored {
        payment_intent_id: PaymentIntentId,
        raw_status: String,
    },
    /// Intent was already terminal; this callback is a replay.
    Duplicate {
        payment_intent_id: PaymentIntentId,
        status: PaymentStatus,
    },
    /// This callback settled the intent.
    Settled {
        payment_intent_id: PaymentIntentId,
        status: PaymentStatus,
        side_effects: SideEffectReport,
    },
}

impl ReconcileOutcome {
    pub fn payment_intent_id(&self) -> PaymentIntentId {
        match self {
            ReconcileOutcome::Ignored { payment_intent_id, .. }
            | ReconcileOutcome::Duplicate { payment_intent_id, .. }
            | ReconcileOutcome::Settled { payment_intent_id, .. } => *payment_intent_id,
        }
    }
}

pub struct Reconciler {
    intents: Arc<dyn PaymentIntentRepository>,
    activators: Arc<ActivatorRegistry>,
    invoices: Arc<InvoiceIssuer>,
    referrals: Arc<ReferralRewarder>,
    deferred: Arc<dyn DeferredTaskRepository>,
    publisher: Arc<dyn EventPublisher>,
    settings: ReconcilerSettings,
}

impl Reconciler {
    pub fn new(
        intents: Arc<dyn PaymentIntentRepository>,
        activators: Arc<ActivatorRegistry>,
        invoices: Arc<InvoiceIssuer>,
        referrals: Arc<ReferralRewarder>,
        deferred: Arc<dyn DeferredTaskRepository>,
        publisher: Arc<dyn EventPublisher>,
        settings: ReconcilerSettings,
    ) -> Self {
        Self {
            intents,
            activators,
            invoices,
            referrals,
            deferred,
            publisher,
            settings,
        }
    }

    pub fn settings(&self) -> &ReconcilerSettings {
        &self.settings
    }

    pub async fn reconcile(&self, callback: &VerifiedCallback) -> Result<ReconcileOutcome, CallbackError> {
        let reference = &callback.transaction_reference;

        let intent = self
            .intents
            .find_by_external_ref(reference)
            .await
            .map_err(|e| CallbackError::Database(e.to_string()))?
            .ok_or_else(|| {
                tracing::error!(
                    external_ref = %reference,
                    transaction_id = %callback.transaction_id,
                    "Callback for unknown payment reference"
                );
                CallbackError::UnknownReference(reference.clone())
            })?;

        let Some(target) = callback.status.terminal_status() else {
            tracing::info!(
                payment_intent_id = %intent.id,
                external_ref = %reference,
                gateway_status = %callback.raw_status,
                "Non-final gateway status acknowledged without transition"
            );
            return Ok(ReconcileOutcome::Ignored {
                payment_intent_id: intent.id,
                raw_status: callback.raw_status.clone(),
            });
        };

        if callback.amount_cents != intent.amount_cents {
            tracing::warn!(
                security_event = true,
                payment_intent_id = %intent.id,
                external_ref = %reference,
                expected = intent.amount_cents,
                actual = callback.amount_cents,
                "Signed callback amount does not match payment intent"
            );
            return Err(CallbackError::AmountMismatch {
                intent_id: intent.id,
                expected: intent.amount_cents,
                actual: callback.amount_cents,
            });
        }

        let now = Timestamp::now();
        let outcome = self
            .intents
            .transition_terminal(&intent.id, target, now)
            .await
            .map_err(|e| CallbackError::Database(e.to_string()))?;

        if !outcome.applied {
            if paid_after_close(target, outcome.intent.status) {
                tracing::warn!(
                    security_event = true,
                    payment_intent_id = %intent.id,
                    owner_id = %intent.owner_id,
                    external_ref = %reference,
                    transaction_id = %callback.transaction_id,
                    amount_cents = callback.amount_cents,
                    current_status = %outcome.intent.status,
                    "Gateway reports payment taken for a closed intent; refund or re-grant needed"
                );
            } else {
                tracing::info!(
                    payment_intent_id = %intent.id,
                    external_ref = %reference,
                    current_status = %outcome.intent.status,
                    callback_status = %target,
                    "Duplicate callback, payment already settled"
                );
            }
            return Ok(ReconcileOutcome::Duplicate {
                payment_intent_id: intent.id,
                status: outcome.intent.status,
            });
        }

        let settled = outcome.intent;
        tracing::info!(
            payment_intent_id = %settled.id,
            external_ref = %reference,
            status = %settled.status,
            synthetic = callback.synthetic,
            "Payment settled"
        );
        publish_best_effort(
            self.publisher.as_ref(),
            &settled_event(&settled, now),
            settled.owner_id.as_str(),
        )
        .await;

        let side_effects = if callback.status == GatewayStatus::Completed {
            self.run_post_completion(&settled).await
        } else {
            SideEffectReport::skipped()
        };

        Ok(ReconcileOutcome::Settled {
            payment_intent_id: settled.id,
            status: settled.status,
            side_effects,
        })
    }

    async fn run_post_completion(&self, intent: &PaymentIntent) -> SideEffectReport {
        let entitlement = self.run_or_defer(TaskKind::Entitlement, intent).await;
        let invoice = self.run_or_defer(TaskKind::Invoice, intent).await;
        let referral = self.run_or_defer(TaskKind::Referral, intent).await;
        SideEffectReport {
            entitlement,
            invoice,
            referral,
        }
    }

    async fn run_or_defer(&self, kind: TaskKind, intent: &PaymentIntent) -> StepOutcome {
        match self.run_side_effect(kind, intent).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    payment_intent_id = %intent.id,
                    step = %kind,
                    error = %e,
                    "Post-settlement step failed, deferring"
                );
                self.defer(kind, intent, &e).await;
                StepOutcome::Deferred(e.to_string())
            }
        }
    }

    async fn defer(&self, kind: TaskKind, intent: &PaymentIntent, error: &DomainError) {
        let task = DeferredTask::first_failure(
            intent.id,
            kind,
            error.to_string(),
            &self.settings.retry_policy,
            Timestamp::now(),
        );
        if let Err(e) = self.deferred.schedule(&task).await {
            // The entitlement sweep still finds ungranted intents.
            tracing::error!(
                payment_intent_id = %intent.id,
                step = %kind,
                error = %e,
                "Failed to queue deferred step"
            );
        }
    }

    /// Run one post-settlement step under its timeout.
    ///
    /// Every step is idempotent; the retry worker and the entitlement sweep
    /// call this again for intents whose first attempt failed.
    pub async fn run_side_effect(
        &self,
        kind: TaskKind,
        intent: &PaymentIntent,
    ) -> Result<StepOutcome, DomainError> {
        if intent.status != PaymentStatus::Completed {
            return Ok(StepOutcome::Skipped);
        }

        let limit = match kind {
            TaskKind::Entitlement => self.settings.activator_timeout,
            TaskKind::Invoice | TaskKind::Referral => self.settings.side_effect_timeout,
        };

        match tokio::time::timeout(limit, self.execute(kind, intent)).await {
            Ok(result) => result,
            Err(_) => Err(DomainError::new(
                ErrorCode::Timeout,
                format!("{} step timed out after {:?}", kind, limit),
            )),
        }
    }

    async fn execute(&self, kind: TaskKind, intent: &PaymentIntent) -> Result<StepOutcome, DomainError> {
        match kind {
            TaskKind::Entitlement => self.grant_entitlement(intent).await,
            TaskKind::Invoice => {
                self.invoices.issue(intent).await?;
                Ok(StepOutcome::Done)
            }
            TaskKind::Referral => match self.referrals.reward_if_eligible(intent).await? {
                RewardOutcome::Credited { .. } => Ok(StepOutcome::Done),
                RewardOutcome::NotReferred
                | RewardOutcome::AlreadyCredited
                | RewardOutcome::NotFirstPayment => Ok(StepOutcome::Skipped),
            },
        }
    }

    async fn grant_entitlement(&self, intent: &PaymentIntent) -> Result<StepOutcome, DomainError> {
        match self.activators.activate(intent).await? {
            ActivationOutcome::NothingToGrant => Ok(StepOutcome::Skipped),
            ActivationOutcome::Granted { activator, result } => {
                let now = Timestamp::now();
                self.intents.mark_entitlement_granted(&intent.id, now).await?;

                if result == SaveResult::Inserted {
                    let event = EntitlementGranted {
                        event_id: EventId::new(),
                        payment_intent_id: intent.id,
                        owner_id: intent.owner_id.clone(),
                        activator: activator.to_string(),
                        granted_at: now,
                    };
                    publish_best_effort(self.publisher.as_ref(), &event, intent.owner_id.as_str())
                        .await;
                }
                Ok(StepOutcome::Done)
            }
        }
    }
}

/// A completion that lost the race to a cancellation or failure: the
/// gateway holds money for an intent that will never be fulfilled.
fn paid_after_close(callback_status: PaymentStatus, current: PaymentStatus) -> bool {
    callback_status == PaymentStatus::Completed && current != PaymentStatus::Completed
}
