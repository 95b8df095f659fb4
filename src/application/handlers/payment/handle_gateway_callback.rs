//! HandleGatewayCallbackHandler - Command handler for gateway notifications.

use std::sync::Arc;

use crate::application::reconciler::{ReconcileOutcome, Reconciler};
use crate::domain::payment::CallbackError;
use crate::ports::{CallbackPayload, PaymentGateway};

#[derive(Debug, Clone)]
pub struct HandleGatewayCallbackCommand {
    pub payload: CallbackPayload,
}

/// Verifies the callback signature, then hands it to the reconciler.
///
/// Nothing reaches the reconciler unless verification succeeds.
pub struct HandleGatewayCallbackHandler {
    gateway: Arc<dyn PaymentGateway>,
    reconciler: Arc<Reconciler>,
}

impl HandleGatewayCallbackHandler {
    pub fn new(gateway: Arc<dyn PaymentGateway>, reconciler: Arc<Reconciler>) -> Self {
        Self {
            gateway,
            reconciler,
        }
    }

    pub async fn handle(&self, cmd: HandleGatewayCallbackCommand) -> Result<ReconcileOutcome, CallbackError> {
        let callback = match self.gateway.verify_callback(&cmd.payload) {
            Ok(callback) => callback,
            Err(e) => {
                if e.is_security_event() {
                    tracing::warn!(
                        security_event = true,
                        error = %e,
                        transaction_reference = cmd.payload.get("TransactionReference").unwrap_or(""),
                        "Rejected gateway callback"
                    );
                } else {
                    tracing::warn!(error = %e, "Malformed gateway callback");
                }
                return Err(e);
            }
        };

        self.reconciler.reconcile(&callback).await
    }
}
