//! Gateway callback vocabulary after signature verification.

use serde::{Deserialize, Serialize};

use super::{ExternalRef, PaymentStatus};

/// Gateway outcome mapped onto the engine's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayStatus {
    Completed,
    Cancelled,
    Failed,
    /// Anything the gateway sends that is not a final outcome.
    Unknown,
}

impl GatewayStatus {
    /// Terminal status this outcome settles an intent into, if any.
    pub fn terminal_status(&self) -> Option<PaymentStatus> {
        match self {
            GatewayStatus::Completed => Some(PaymentStatus::Completed),
            GatewayStatus::Cancelled => Some(PaymentStatus::Cancelled),
            GatewayStatus::Failed => Some(PaymentStatus::Failed),
            GatewayStatus::Unknown => None,
        }
    }
}

/// A callback whose signature has been checked.
///
/// Only the gateway adapter (or the offline path) builds these; every field
/// here can be trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedCallback {
    pub transaction_reference: ExternalRef,
    pub transaction_id: String,
    /// Status exactly as the gateway spelled it, for logs.
    pub raw_status: String,
    pub status: GatewayStatus,
    pub amount_cents: i64,
    pub is_test: bool,
    /// True when produced by offline mode rather than a real gateway.
    pub synthetic: bool,
}

impl VerifiedCallback {
    /// Immediate success used when no live gateway is configured.
    pub fn synthetic_completion(reference: ExternalRef, amount_cents: i64) -> Self {
        Self {
            transaction_id: format!("offline-{}", reference),
            transaction_reference: reference,
            raw_status: "offline_complete".to_string(),
            status: GatewayStatus::Completed,
            amount_cents,
            is_test: true,
            synthetic: true,
        }
    }
}
