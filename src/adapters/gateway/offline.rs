//! Offline gateway used when no hosted gateway is configured.
//!
//! Payments are settled by the create-payment handler through a synthetic
//! callback, so this gateway never verifies anything.

use async_trait::async_trait;

use super::status_from_vocabulary;
use crate::domain::foundation::DomainError;
use crate::domain::payment::{CallbackError, ExternalRef, GatewayStatus, PaymentIntent, VerifiedCallback};
use crate::ports::{CallbackPayload, PaymentGateway, ReturnUrls};

#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGateway;

impl OfflineGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PaymentGateway for OfflineGateway {
    fn is_live(&self) -> bool {
        false
    }

    async fn build_redirect(
        &self,
        _intent: &PaymentIntent,
        reference: &ExternalRef,
        urls: &ReturnUrls,
    ) -> Result<String, DomainError> {
        Ok(urls.success_redirect(reference))
    }

    /// Real callbacks cannot be trusted without a shared secret.
    fn verify_callback(&self, _payload: &CallbackPayload) -> Result<VerifiedCallback, CallbackError> {
        Err(CallbackError::OfflineMode)
    }

    fn map_status(&self, raw: &str) -> GatewayStatus {
        status_from_vocabulary(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_gateway_rejects_every_callback() {
        let payload = CallbackPayload::from_pairs([("Status", "Complete"), ("HashCheck", "00")]);
        assert!(matches!(
            OfflineGateway::new().verify_callback(&payload),
            Err(CallbackError::OfflineMode)
        ));
        assert!(!OfflineGateway::new().is_live());
    }
}
