//! Payment gateway port.
//!
//! The gateway itself is a black box reached by redirecting the payer and
//! receiving a signed callback. Adapters own the wire format and signing.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::domain::foundation::DomainError;
use crate::domain::payment::{CallbackError, ExternalRef, GatewayStatus, PaymentIntent, VerifiedCallback};

/// Where the gateway sends the payer and its notifications.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReturnUrls {
    pub success_url: String,
    pub cancel_url: String,
    pub error_url: String,
    pub notify_url: String,
}

impl ReturnUrls {
    /// Success page for a payment settled without visiting a gateway.
    pub fn success_redirect(&self, reference: &ExternalRef) -> String {
        let query = serde_urlencoded::to_string([("reference", reference.as_str())])
            .unwrap_or_default();
        let separator = if self.success_url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.success_url, separator, query)
    }
}

/// Raw callback fields, untrusted until verified.
///
/// Keys are stored lowercased so lookups ignore the gateway's casing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackPayload {
    fields: BTreeMap<String, String>,
}

impl CallbackPayload {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
                .collect(),
        }
    }

    /// Decode an `application/x-www-form-urlencoded` body.
    pub fn from_form(body: &[u8]) -> Result<Self, CallbackError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
            .map_err(|e| CallbackError::ParseError(format!("invalid form body: {}", e)))?;
        Ok(Self::from_pairs(pairs))
    }

    /// Decode a flat JSON object body. Scalars are kept in their text form.
    pub fn from_json(body: &[u8]) -> Result<Self, CallbackError> {
        let object: BTreeMap<String, serde_json::Value> = serde_json::from_slice(body)
            .map_err(|e| CallbackError::ParseError(format!("invalid JSON body: {}", e)))?;

        let pairs = object.into_iter().filter_map(|(k, v)| {
            let text = match v {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                serde_json::Value::Null => return None,
                other => other.to_string(),
            };
            Some((k, text))
        });
        Ok(Self::from_pairs(pairs))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn require(&self, name: &'static str) -> Result<&str, CallbackError> {
        self.get(name)
            .filter(|v| !v.is_empty())
            .ok_or(CallbackError::MissingField(name))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// False for the offline gateway used when nothing live is configured.
    fn is_live(&self) -> bool;

    /// Build the signed URL the payer is redirected to.
    ///
    /// `reference` is the value that will be attached to the intent.
    async fn build_redirect(
        &self,
        intent: &PaymentIntent,
        reference: &ExternalRef,
        urls: &ReturnUrls,
    ) -> Result<String, DomainError>;

    /// Recompute the callback signature and compare in constant time.
    ///
    /// Nothing in the payload is trusted before this returns `Ok`.
    fn verify_callback(&self, payload: &CallbackPayload) -> Result<VerifiedCallback, CallbackError>;

    /// Map the gateway's status vocabulary onto ours.
    fn map_status(&self, raw: &str) -> GatewayStatus;
}
