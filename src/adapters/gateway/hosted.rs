//! Hosted payment page gateway.
//!
//! The payer is sent to a page hosted by the gateway. Requests and callbacks
//! carry a `HashCheck` field: hex HMAC-SHA256 over a fixed, ordered list of
//! field values, lowercased and joined with `|`.
//!
//! # Security
//!
//! - Signature recomputed and compared in constant time before any field is read
//! - Callbacks for another merchant site are rejected
//! - Test-mode callbacks are rejected by a live site
//! - Secrets handled via `secrecy::SecretString`

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use std::time::Duration;
use subtle::ConstantTimeEq;

use super::amount::{format_amount, parse_amount};
use super::status_from_vocabulary;
use crate::config::GatewayConfig;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::payment::{CallbackError, ExternalRef, GatewayStatus, PaymentIntent, VerifiedCallback};
use crate::ports::{CallbackPayload, PaymentGateway, ReturnUrls};

type HmacSha256 = Hmac<Sha256>;

/// Name of the signature field in requests and callbacks.
const SIGNATURE_FIELD: &str = "HashCheck";

/// Callback fields covered by the signature, in signing order.
const CALLBACK_FIELDS: [&str; 8] = [
    "SiteCode",
    "TransactionId",
    "TransactionReference",
    "Amount",
    "Status",
    "CurrencyCode",
    "IsTest",
    "StatusMessage",
];

/// Hosted gateway connection settings.
#[derive(Clone)]
pub struct HostedGatewayConfig {
    base_url: String,
    site_code: String,
    secret_key: SecretString,
    country_code: String,
    currency_code: String,
    is_test: bool,
    timeout: Duration,
}

impl HostedGatewayConfig {
    pub fn new(base_url: impl Into<String>, site_code: impl Into<String>, secret_key: SecretString) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            site_code: site_code.into(),
            secret_key,
            country_code: "ZA".to_string(),
            currency_code: "ZAR".to_string(),
            is_test: false,
            timeout: Duration::from_secs(15),
        }
    }

    /// Settings for a configured gateway, `None` when any required value is missing.
    pub fn from_config(config: &GatewayConfig) -> Option<Self> {
        if !config.is_configured() {
            return None;
        }
        let base_url = config.base_url.as_ref()?;
        let secret_key = config.secret_key.clone()?;
        Some(
            Self::new(base_url.clone(), config.site_code.clone(), secret_key)
                .with_currency(config.country_code.clone(), config.currency_code.clone())
                .with_test_mode(config.is_test)
                .with_timeout(Duration::from_secs(config.timeout_secs)),
        )
    }

    pub fn with_currency(mut self, country_code: impl Into<String>, currency_code: impl Into<String>) -> Self {
        self.country_code = country_code.into();
        self.currency_code = currency_code.into();
        self
    }

    pub fn with_test_mode(mut self, is_test: bool) -> Self {
        self.is_test = is_test;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Gateway reply to a payment request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentRequestResponse {
    url: Option<String>,
    error_message: Option<String>,
}

pub struct HostedGateway {
    config: HostedGatewayConfig,
    http_client: reqwest::Client,
}

impl HostedGateway {
    pub fn new(config: HostedGatewayConfig) -> Result<Self, DomainError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                DomainError::new(ErrorCode::InternalError, format!("Failed to build HTTP client: {}", e))
            })?;
        Ok(Self { config, http_client })
    }

    fn mac(&self) -> Result<HmacSha256, hmac::digest::InvalidLength> {
        HmacSha256::new_from_slice(self.config.secret_key.expose_secret().as_bytes())
    }

    fn signature<'a>(
        &self,
        values: impl IntoIterator<Item = &'a str>,
    ) -> Result<Vec<u8>, hmac::digest::InvalidLength> {
        let canonical = values
            .into_iter()
            .map(|value| value.trim().to_lowercase())
            .collect::<Vec<_>>()
            .join("|");
        let mut mac = self.mac()?;
        mac.update(canonical.as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }

    /// Signed form fields for a payment request, in signing order.
    pub(crate) fn request_fields(
        &self,
        intent: &PaymentIntent,
        reference: &ExternalRef,
        urls: &ReturnUrls,
    ) -> Result<Vec<(&'static str, String)>, DomainError> {
        let mut fields = vec![
            ("SiteCode", self.config.site_code.clone()),
            ("CountryCode", self.config.country_code.clone()),
            ("CurrencyCode", self.config.currency_code.clone()),
            ("Amount", format_amount(intent.amount_cents)),
            ("TransactionReference", reference.as_str().to_string()),
            ("BankReference", intent.bank_reference().as_str().to_string()),
            ("CancelUrl", urls.cancel_url.clone()),
            ("ErrorUrl", urls.error_url.clone()),
            ("SuccessUrl", urls.success_url.clone()),
            ("NotifyUrl", urls.notify_url.clone()),
            ("IsTest", self.config.is_test.to_string()),
        ];

        let signature = self
            .signature(fields.iter().map(|(_, value)| value.as_str()))
            .map_err(|e| DomainError::new(ErrorCode::InternalError, format!("Signing failed: {}", e)))?;
        fields.push((SIGNATURE_FIELD, hex::encode(signature)));
        Ok(fields)
    }

    /// Signature the gateway would attach to this callback payload.
    ///
    /// Lets operators replay a notification the gateway failed to deliver.
    pub fn sign_callback(&self, payload: &CallbackPayload) -> String {
        self.signature(CALLBACK_FIELDS.iter().map(|field| payload.get(field).unwrap_or("")))
            .map(hex::encode)
            .unwrap_or_default()
    }

    fn check_signature(&self, payload: &CallbackPayload) -> Result<(), CallbackError> {
        let provided = payload
            .get(SIGNATURE_FIELD)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(CallbackError::MissingSignature)?;

        let provided_bytes =
            hex::decode(provided.to_ascii_lowercase()).map_err(|_| CallbackError::InvalidSignature)?;
        let expected = self
            .signature(CALLBACK_FIELDS.iter().map(|field| payload.get(field).unwrap_or("")))
            .map_err(|_| CallbackError::InvalidSignature)?;

        if expected.as_slice().ct_eq(provided_bytes.as_slice()).unwrap_u8() != 1 {
            return Err(CallbackError::InvalidSignature);
        }
        Ok(())
    }
}

fn parse_flag(raw: Option<&str>) -> Result<bool, CallbackError> {
    match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("false") | Some("0") => Ok(false),
        Some("true") | Some("1") => Ok(true),
        Some(other) => Err(CallbackError::ParseError(format!("invalid IsTest value '{}'", other))),
    }
}

fn gateway_error(message: impl Into<String>) -> DomainError {
    DomainError::new(ErrorCode::GatewayError, message)
}

#[async_trait]
impl PaymentGateway for HostedGateway {
    fn is_live(&self) -> bool {
        true
    }

    async fn build_redirect(
        &self,
        intent: &PaymentIntent,
        reference: &ExternalRef,
        urls: &ReturnUrls,
    ) -> Result<String, DomainError> {
        let fields = self.request_fields(intent, reference, urls)?;
        let endpoint = format!("{}/payment-requests", self.config.base_url);

        let response = self
            .http_client
            .post(&endpoint)
            .form(&fields)
            .send()
            .await
            .map_err(|e| gateway_error(format!("Gateway unreachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(gateway_error(format!("Gateway returned {}: {}", status, body)));
        }

        let reply: PaymentRequestResponse = response
            .json()
            .await
            .map_err(|e| gateway_error(format!("Failed to parse gateway response: {}", e)))?;

        if let Some(message) = reply.error_message.filter(|m| !m.is_empty()) {
            return Err(gateway_error(format!("Gateway rejected payment request: {}", message)));
        }

        let url = reply
            .url
            .ok_or_else(|| gateway_error("Gateway response carried no redirect URL"))?;
        reqwest::Url::parse(&url).map_err(|_| gateway_error("Gateway returned an invalid redirect URL"))?;

        tracing::debug!(
            payment_intent_id = %intent.id,
            external_ref = %reference,
            "Gateway redirect built"
        );
        Ok(url)
    }

    fn verify_callback(&self, payload: &CallbackPayload) -> Result<VerifiedCallback, CallbackError> {
        self.check_signature(payload)?;

        let site_code = payload.require("SiteCode")?;
        if !site_code.trim().eq_ignore_ascii_case(&self.config.site_code) {
            return Err(CallbackError::SiteMismatch);
        }

        let is_test = parse_flag(payload.get("IsTest"))?;
        if is_test && !self.config.is_test {
            return Err(CallbackError::ParseError(
                "test-mode callback sent to a live site".to_string(),
            ));
        }

        let transaction_reference = ExternalRef::new(payload.require("TransactionReference")?)
            .map_err(|e| CallbackError::ParseError(e.to_string()))?;
        let raw_status = payload.require("Status")?.to_string();

        Ok(VerifiedCallback {
            transaction_reference,
            transaction_id: payload.require("TransactionId")?.to_string(),
            status: self.map_status(&raw_status),
            raw_status,
            amount_cents: parse_amount(payload.require("Amount")?)?,
            is_test,
            synthetic: false,
        })
    }

    fn map_status(&self, raw: &str) -> GatewayStatus {
        status_from_vocabulary(raw)
    }
}
