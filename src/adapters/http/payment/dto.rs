//! HTTP DTOs for payment endpoints.
//!
//! These types define the JSON request/response structure for the payment API.

use serde::{Deserialize, Serialize};

use crate::application::handlers::payment::{CreatePaymentResult, PaymentStatusView};
use crate::application::ReconcileOutcome;
use crate::domain::payment::{PaymentStatus, PurposeRequest};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to start a payment.
///
/// ```json
/// { "purpose": { "kind": "boost", "boost_type": "spotlight", "property_id": 42 } }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentRequest {
    pub purpose: PurposeRequest,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Response after creating a payment.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePaymentResponse {
    pub payment_id: String,
    /// Where the browser goes next.
    pub redirect_url: String,
    pub amount_cents: i64,
    pub status: PaymentStatus,
}

impl From<CreatePaymentResult> for CreatePaymentResponse {
    fn from(result: CreatePaymentResult) -> Self {
        Self {
            payment_id: result.payment_id.to_string(),
            redirect_url: result.redirect_url,
            amount_cents: result.amount_cents,
            status: result.status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentStatusResponse {
    pub payment_id: String,
    pub status: PaymentStatus,
    pub amount_cents: i64,
    pub purpose: String,
    pub description: String,
    /// ISO 8601.
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl From<PaymentStatusView> for PaymentStatusResponse {
    fn from(view: PaymentStatusView) -> Self {
        Self {
            payment_id: view.payment_id.to_string(),
            status: view.status,
            amount_cents: view.amount_cents,
            purpose: view.purpose.kind().to_string(),
            description: view.description,
            created_at: view.created_at.as_datetime().to_rfc3339(),
            completed_at: view.completed_at.map(|t| t.as_datetime().to_rfc3339()),
        }
    }
}

/// Body returned to the gateway for an accepted callback.
#[derive(Debug, Clone, Serialize)]
pub struct CallbackAckResponse {
    pub acknowledged: bool,
    pub outcome: &'static str,
    pub payment_id: String,
}

impl From<&ReconcileOutcome> for CallbackAckResponse {
    fn from(outcome: &ReconcileOutcome) -> Self {
        let label = match outcome {
            ReconcileOutcome::Settled { .. } => "settled",
            ReconcileOutcome::Duplicate { .. } => "duplicate",
            ReconcileOutcome::Ignored { .. } => "ignored",
        };
        Self {
            acknowledged: true,
            outcome: label,
            payment_id: outcome.payment_intent_id().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingQuotaResponse {
    pub owner_id: String,
    /// Total listing slots bought through listing fees.
    pub purchased_slots: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub gateway: &'static str,
}

/// Error response for API errors.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{SideEffectReport, StepOutcome};
    use crate::domain::foundation::PaymentIntentId;

    #[test]
    fn create_request_deserializes_nested_purpose() {
        let json = r#"{"purpose":{"kind":"listing_fee","tier":"premium"}}"#;
        let request: CreatePaymentRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.purpose.kind, "listing_fee");
        assert_eq!(request.purpose.tier.as_deref(), Some("premium"));
        assert!(request.purpose.plan.is_none());
    }

    #[test]
    fn status_serializes_lowercase() {
        let response = CreatePaymentResponse {
            payment_id: "p".to_string(),
            redirect_url: "https://pay.example.com/r/1".to_string(),
            amount_cents: 4_900,
            status: PaymentStatus::Pending,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["amount_cents"], 4_900);
    }

    #[test]
    fn ack_labels_outcome() {
        let id = PaymentIntentId::new();
        let duplicate = ReconcileOutcome::Duplicate {
            payment_intent_id: id,
            status: PaymentStatus::Completed,
        };
        let ack = CallbackAckResponse::from(&duplicate);
        assert!(ack.acknowledged);
        assert_eq!(ack.outcome, "duplicate");
        assert_eq!(ack.payment_id, id.to_string());

        let settled = ReconcileOutcome::Settled {
            payment_intent_id: id,
            status: PaymentStatus::Failed,
            side_effects: SideEffectReport {
                entitlement: StepOutcome::Skipped,
                invoice: StepOutcome::Skipped,
                referral: StepOutcome::Skipped,
            },
        };
        assert_eq!(CallbackAckResponse::from(&settled).outcome, "settled");
    }
}
