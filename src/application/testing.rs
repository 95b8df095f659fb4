//! In-memory wiring shared by the application tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::activators::{ActivatorRegistry, EntitlementActivator};
use super::invoice_issuer::InvoiceIssuer;
use super::reconciler::{Reconciler, ReconcilerSettings};
use super::referral_rewarder::ReferralRewarder;
use crate::adapters::events::InMemoryEventBus;
use crate::adapters::memory::{
    InMemoryBoostRepository, InMemoryDeferredTaskRepository, InMemoryInvoiceRepository,
    InMemoryListingCreditRepository, InMemoryPaymentIntentRepository, InMemoryReferralRepository,
    InMemorySubscriptionRepository,
};
use crate::domain::entitlement::ReferralPolicy;
use crate::domain::foundation::{DomainError, UserId};
use crate::domain::payment::{
    Catalog, EntitlementSpec, ExternalRef, GatewayStatus, PaymentIntent, PaymentPurpose,
    VerifiedCallback,
};
use crate::ports::{PaymentIntentRepository, SaveResult};

pub(crate) struct Harness {
    pub intents: Arc<InMemoryPaymentIntentRepository>,
    pub subscriptions: Arc<InMemorySubscriptionRepository>,
    pub boosts: Arc<InMemoryBoostRepository>,
    pub credits: Arc<InMemoryListingCreditRepository>,
    pub invoices: Arc<InMemoryInvoiceRepository>,
    pub referrals: Arc<InMemoryReferralRepository>,
    pub deferred: Arc<InMemoryDeferredTaskRepository>,
    pub events: Arc<InMemoryEventBus>,
    pub reconciler: Arc<Reconciler>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(None, ReconcilerSettings::default())
    }

    pub fn with_settings(settings: ReconcilerSettings) -> Self {
        Self::build(None, settings)
    }

    /// Replaces the standard activators, e.g. with a [`SlowActivator`].
    pub fn with_activators(activators: ActivatorRegistry, settings: ReconcilerSettings) -> Self {
        Self::build(Some(activators), settings)
    }

    fn build(activators: Option<ActivatorRegistry>, settings: ReconcilerSettings) -> Self {
        let intents = Arc::new(InMemoryPaymentIntentRepository::new());
        let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
        let boosts = Arc::new(InMemoryBoostRepository::new());
        let credits = Arc::new(InMemoryListingCreditRepository::new());
        let invoices = Arc::new(InMemoryInvoiceRepository::new());
        let referrals = Arc::new(InMemoryReferralRepository::new());
        let deferred = Arc::new(InMemoryDeferredTaskRepository::new());
        let events = Arc::new(InMemoryEventBus::new());

        let activators = activators.unwrap_or_else(|| {
            ActivatorRegistry::standard(subscriptions.clone(), boosts.clone(), credits.clone())
        });
        let reconciler = Arc::new(Reconciler::new(
            intents.clone(),
            Arc::new(activators),
            Arc::new(InvoiceIssuer::new(invoices.clone(), events.clone())),
            Arc::new(ReferralRewarder::new(
                referrals.clone(),
                intents.clone(),
                ReferralPolicy::Fixed { cents: 1_000 },
                events.clone(),
            )),
            deferred.clone(),
            events.clone(),
            settings,
        ));

        Self {
            intents,
            subscriptions,
            boosts,
            credits,
            invoices,
            referrals,
            deferred,
            events,
            reconciler,
        }
    }

    /// Stores a pending intent with an attached reference.
    pub async fn pending_intent(&self, owner: &str, purpose: PaymentPurpose) -> PaymentIntent {
        let mut intent =
            PaymentIntent::create(UserId::new(owner).unwrap(), purpose, &Catalog::standard()).unwrap();
        self.intents.create(&intent).await.unwrap();
        let reference = ExternalRef::generate();
        self.intents
            .attach_external_ref(&intent.id, &reference)
            .await
            .unwrap();
        intent.external_ref = Some(reference);
        intent
    }

    pub async fn stored(&self, intent: &PaymentIntent) -> PaymentIntent {
        self.intents.find_by_id(&intent.id).await.unwrap().unwrap()
    }
}

pub(crate) fn basic_plan() -> PaymentPurpose {
    PaymentPurpose::Subscription {
        plan: "basic".into(),
    }
}

/// A verified callback matching the intent's reference and amount.
pub(crate) fn callback(intent: &PaymentIntent, status: GatewayStatus) -> VerifiedCallback {
    let raw_status = match status {
        GatewayStatus::Completed => "Complete",
        GatewayStatus::Cancelled => "Cancelled",
        GatewayStatus::Failed => "Error",
        GatewayStatus::Unknown => "PendingInvestigation",
    };
    VerifiedCallback {
        transaction_reference: intent.external_ref.clone().unwrap(),
        transaction_id: format!("T-{}", intent.id),
        raw_status: raw_status.to_string(),
        status,
        amount_cents: intent.amount_cents,
        is_test: false,
        synthetic: false,
    }
}

/// Activator that takes far longer than any test timeout.
pub(crate) struct SlowActivator {
    pub delay: Duration,
}

#[async_trait]
impl EntitlementActivator for SlowActivator {
    fn name(&self) -> &'static str {
        "slow"
    }

    fn handles(&self, spec: &EntitlementSpec) -> bool {
        *spec != EntitlementSpec::None
    }

    async fn apply(&self, _intent: &PaymentIntent) -> Result<SaveResult, DomainError> {
        tokio::time::sleep(self.delay).await;
        Ok(SaveResult::Inserted)
    }
}
