//! Shared wiring for integration tests: the full engine over in-memory adapters.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use payment_reconciler::adapters::events::InMemoryEventBus;
use payment_reconciler::adapters::gateway::{format_amount, HostedGateway, HostedGatewayConfig};
use payment_reconciler::adapters::http::PaymentAppState;
use payment_reconciler::adapters::memory::{
    InMemoryBoostRepository, InMemoryDeferredTaskRepository, InMemoryInvoiceRepository,
    InMemoryListingCreditRepository, InMemoryPaymentIntentRepository, InMemoryReferralRepository,
    InMemorySubscriptionRepository,
};
use payment_reconciler::application::{
    ActivatorRegistry, CreatePaymentCommand, CreatePaymentHandler, GetPaymentStatusHandler,
    HandleGatewayCallbackHandler, InvoiceIssuer, Reconciler, ReconcilerSettings, ReferralRewarder,
};
use payment_reconciler::domain::entitlement::ReferralPolicy;
use payment_reconciler::domain::foundation::UserId;
use payment_reconciler::domain::payment::{Catalog, ExternalRef, PaymentIntent, PaymentPurpose};
use payment_reconciler::ports::{CallbackPayload, PaymentGateway, PaymentIntentRepository, ReturnUrls};

pub const SITE_CODE: &str = "SITE-001";
pub const SECRET: &str = "integration-secret";

pub struct TestApp {
    pub intents: Arc<InMemoryPaymentIntentRepository>,
    pub subscriptions: Arc<InMemorySubscriptionRepository>,
    pub boosts: Arc<InMemoryBoostRepository>,
    pub credits: Arc<InMemoryListingCreditRepository>,
    pub invoices: Arc<InMemoryInvoiceRepository>,
    pub referrals: Arc<InMemoryReferralRepository>,
    pub deferred: Arc<InMemoryDeferredTaskRepository>,
    pub events: Arc<InMemoryEventBus>,
    pub gateway: Arc<HostedGateway>,
    pub reconciler: Arc<Reconciler>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_settings(ReconcilerSettings::default())
    }

    pub fn with_settings(settings: ReconcilerSettings) -> Self {
        let intents = Arc::new(InMemoryPaymentIntentRepository::new());
        let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
        let boosts = Arc::new(InMemoryBoostRepository::new());
        let credits = Arc::new(InMemoryListingCreditRepository::new());
        let invoices = Arc::new(InMemoryInvoiceRepository::new());
        let referrals = Arc::new(InMemoryReferralRepository::new());
        let deferred = Arc::new(InMemoryDeferredTaskRepository::new());
        let events = Arc::new(InMemoryEventBus::new());

        let gateway = Arc::new(
            HostedGateway::new(
                HostedGatewayConfig::new(
                    "https://pay.example.com",
                    SITE_CODE,
                    SecretString::new(SECRET.to_string()),
                )
                .with_timeout(Duration::from_secs(2)),
            )
            .unwrap(),
        );

        let reconciler = Arc::new(Reconciler::new(
            intents.clone(),
            Arc::new(ActivatorRegistry::standard(
                subscriptions.clone(),
                boosts.clone(),
                credits.clone(),
            )),
            Arc::new(InvoiceIssuer::new(invoices.clone(), events.clone())),
            Arc::new(ReferralRewarder::new(
                referrals.clone(),
                intents.clone(),
                ReferralPolicy::default(),
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
            gateway,
            reconciler,
        }
    }

    pub fn return_urls() -> ReturnUrls {
        ReturnUrls {
            success_url: "https://app.example.com/payments/success".into(),
            cancel_url: "https://app.example.com/payments/cancel".into(),
            error_url: "https://app.example.com/payments/error".into(),
            notify_url: "https://api.example.com/api/payments/callback".into(),
        }
    }

    pub fn create_handler(&self, gateway: Arc<dyn PaymentGateway>, allow_offline: bool) -> CreatePaymentHandler {
        CreatePaymentHandler::new(
            Arc::new(Catalog::standard()),
            self.intents.clone(),
            gateway,
            self.reconciler.clone(),
            Self::return_urls(),
            allow_offline,
        )
    }

    pub fn callback_handler(&self) -> HandleGatewayCallbackHandler {
        HandleGatewayCallbackHandler::new(self.gateway.clone(), self.reconciler.clone())
    }

    pub fn app_state(&self) -> PaymentAppState {
        PaymentAppState {
            create_payment: Arc::new(self.create_handler(self.gateway.clone(), false)),
            get_payment_status: Arc::new(GetPaymentStatusHandler::new(self.intents.clone())),
            handle_callback: Arc::new(self.callback_handler()),
            listing_credits: self.credits.clone(),
            gateway: self.gateway.clone(),
        }
    }

    /// A pending intent with a reference attached, as if the payer was
    /// redirected to the gateway.
    pub async fn pending(&self, owner: &str, purpose: PaymentPurpose) -> PaymentIntent {
        let mut intent =
            PaymentIntent::create(user(owner), purpose, &Catalog::standard()).unwrap();
        self.intents.create(&intent).await.unwrap();
        let reference = ExternalRef::generate();
        self.intents
            .attach_external_ref(&intent.id, &reference)
            .await
            .unwrap();
        intent.external_ref = Some(reference);
        intent
    }

    /// Callback fields for `intent`, signed with the shared secret.
    pub fn signed_fields(&self, intent: &PaymentIntent, status: &str) -> Vec<(String, String)> {
        let reference = intent.external_ref.as_ref().unwrap().to_string();
        self.signed_fields_for(&reference, &format_amount(intent.amount_cents), status)
    }

    pub fn signed_fields_for(&self, reference: &str, amount: &str, status: &str) -> Vec<(String, String)> {
        let mut fields: Vec<(String, String)> = vec![
            ("SiteCode".into(), SITE_CODE.into()),
            ("TransactionId".into(), format!("txn-{}", reference)),
            ("TransactionReference".into(), reference.into()),
            ("Amount".into(), amount.into()),
            ("Status".into(), status.into()),
            ("CurrencyCode".into(), "ZAR".into()),
            ("IsTest".into(), "false".into()),
        ];
        let signature = self
            .gateway
            .sign_callback(&CallbackPayload::from_pairs(fields.clone()));
        fields.push(("HashCheck".into(), signature));
        fields
    }

    pub fn signed_payload(&self, intent: &PaymentIntent, status: &str) -> CallbackPayload {
        CallbackPayload::from_pairs(self.signed_fields(intent, status))
    }

    pub async fn stored(&self, intent: &PaymentIntent) -> PaymentIntent {
        self.intents.find_by_id(&intent.id).await.unwrap().unwrap()
    }
}

pub fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

pub fn plan(key: &str) -> PaymentPurpose {
    PaymentPurpose::Subscription { plan: key.into() }
}

pub fn command(owner: &str, purpose: PaymentPurpose) -> CreatePaymentCommand {
    CreatePaymentCommand {
        owner_id: user(owner),
        purpose,
    }
}
