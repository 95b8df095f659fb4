//! CreatePaymentHandler - Command handler for starting a purchase.

use std::sync::Arc;

use crate::application::reconciler::{ReconcileOutcome, Reconciler};
use crate::domain::foundation::{PaymentIntentId, UserId};
use crate::domain::payment::{
    Catalog, ExternalRef, PaymentError, PaymentIntent, PaymentPurpose, PaymentStatus, VerifiedCallback,
};
use crate::ports::{PaymentGateway, PaymentIntentRepository, ReturnUrls};

/// Command to create a payment for a purpose.
#[derive(Debug, Clone)]
pub struct CreatePaymentCommand {
    pub owner_id: UserId,
    pub purpose: PaymentPurpose,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePaymentResult {
    pub payment_id: PaymentIntentId,
    pub redirect_url: String,
    pub amount_cents: i64,
    /// `Pending` when the payer must visit the gateway; terminal when the
    /// payment was settled in offline mode.
    pub status: PaymentStatus,
}

/// Handler for creating payment intents.
///
/// Prices the purpose from the catalog, persists a `Pending` intent, builds
/// the gateway redirect and attaches its reference. In offline mode the
/// same request feeds a synthetic success through the reconciler, so the
/// idempotency gate is never bypassed.
pub struct CreatePaymentHandler {
    catalog: Arc<Catalog>,
    intents: Arc<dyn PaymentIntentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    reconciler: Arc<Reconciler>,
    return_urls: ReturnUrls,
    allow_offline: bool,
}

impl CreatePaymentHandler {
    pub fn new(
        catalog: Arc<Catalog>,
        intents: Arc<dyn PaymentIntentRepository>,
        gateway: Arc<dyn PaymentGateway>,
        reconciler: Arc<Reconciler>,
        return_urls: ReturnUrls,
        allow_offline: bool,
    ) -> Self {
        Self {
            catalog,
            intents,
            gateway,
            reconciler,
            return_urls,
            allow_offline,
        }
    }

    pub async fn handle(&self, cmd: CreatePaymentCommand) -> Result<CreatePaymentResult, PaymentError> {
        if !self.gateway.is_live() && !self.allow_offline {
            return Err(PaymentError::GatewayUnavailable(
                "no payment gateway configured and offline payments are disabled".to_string(),
            ));
        }

        let intent = PaymentIntent::create(cmd.owner_id, cmd.purpose, &self.catalog)?;
        self.intents.create(&intent).await?;

        tracing::info!(
            payment_intent_id = %intent.id,
            owner_id = %intent.owner_id,
            purpose = intent.purpose.kind(),
            amount_cents = intent.amount_cents,
            "Payment intent created"
        );

        let reference = ExternalRef::generate();
        let mut settle_offline = !self.gateway.is_live();

        let redirect_url = match self
            .gateway
            .build_redirect(&intent, &reference, &self.return_urls)
            .await
        {
            Ok(url) => url,
            Err(e) if self.allow_offline => {
                tracing::warn!(
                    payment_intent_id = %intent.id,
                    error = %e,
                    "Gateway unavailable, settling payment in offline mode"
                );
                settle_offline = true;
                self.return_urls.success_redirect(&reference)
            }
            Err(e) => {
                tracing::error!(payment_intent_id = %intent.id, error = %e, "Gateway redirect failed");
                return Err(PaymentError::GatewayUnavailable(e.message));
            }
        };

        self.intents.attach_external_ref(&intent.id, &reference).await?;

        let status = if settle_offline {
            self.settle_offline(&intent, reference).await?
        } else {
            PaymentStatus::Pending
        };

        Ok(CreatePaymentResult {
            payment_id: intent.id,
            redirect_url,
            amount_cents: intent.amount_cents,
            status,
        })
    }

    async fn settle_offline(
        &self,
        intent: &PaymentIntent,
        reference: ExternalRef,
    ) -> Result<PaymentStatus, PaymentError> {
        let callback = VerifiedCallback::synthetic_completion(reference, intent.amount_cents);
        let outcome = self
            .reconciler
            .reconcile(&callback)
            .await
            .map_err(|e| PaymentError::Infrastructure(e.to_string()))?;

        Ok(match outcome {
            ReconcileOutcome::Settled { status, .. } | ReconcileOutcome::Duplicate { status, .. } => status,
            ReconcileOutcome::Ignored { .. } => PaymentStatus::Pending,
        })
    }
}
