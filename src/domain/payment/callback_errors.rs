//! Errors raised while accepting a gateway callback.
//!
//! Status codes drive the gateway's retry behavior:
//! - 2xx: acknowledged, no retry
//! - 4xx: rejected, no retry
//! - 5xx: will retry

use axum::http::StatusCode;
use thiserror::Error;

use super::ExternalRef;
use crate::domain::foundation::PaymentIntentId;

#[derive(Debug, Error)]
pub enum CallbackError {
    /// Recomputed signature does not match.
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Missing signature")]
    MissingSignature,

    /// Body could not be decoded.
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Callback was signed for a different merchant site.
    #[error("Site code mismatch")]
    SiteMismatch,

    /// No intent carries this reference. Either a bug or a forgery.
    #[error("Unknown reference: {0}")]
    UnknownReference(ExternalRef),

    /// Signed amount differs from what the intent was created for.
    #[error("Amount mismatch for payment {intent_id}: expected {expected}, got {actual}")]
    AmountMismatch {
        intent_id: PaymentIntentId,
        expected: i64,
        actual: i64,
    },

    /// Offline mode does not accept inbound callbacks.
    #[error("Callbacks are not accepted in offline mode")]
    OfflineMode,

    #[error("Database error: {0}")]
    Database(String),
}

impl CallbackError {
    /// Returns true if the gateway should redeliver.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CallbackError::Database(_))
    }

    /// Whether this failure should be logged as a security event.
    pub fn is_security_event(&self) -> bool {
        matches!(
            self,
            CallbackError::InvalidSignature
                | CallbackError::MissingSignature
                | CallbackError::SiteMismatch
                | CallbackError::AmountMismatch { .. }
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            CallbackError::InvalidSignature
            | CallbackError::MissingSignature
            | CallbackError::SiteMismatch => StatusCode::UNAUTHORIZED,

            CallbackError::ParseError(_) | CallbackError::MissingField(_) => {
                StatusCode::BAD_REQUEST
            }

            CallbackError::UnknownReference(_) => StatusCode::NOT_FOUND,

            CallbackError::AmountMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,

            CallbackError::OfflineMode => StatusCode::FORBIDDEN,

            CallbackError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ══════════════════════════════════════════════════════════════
    // Display
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn missing_field_displays_field_name() {
        let err = CallbackError::MissingField("TransactionReference");
        assert_eq!(format!("{}", err), "Missing field: TransactionReference");
    }

    #[test]
    fn unknown_reference_displays_reference() {
        let err = CallbackError::UnknownReference(ExternalRef::new("PR-404").unwrap());
        assert_eq!(format!("{}", err), "Unknown reference: PR-404");
    }

    // ══════════════════════════════════════════════════════════════
    // Retry semantics
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn only_database_errors_are_retryable() {
        assert!(CallbackError::Database("timeout".into()).is_retryable());
        assert!(!CallbackError::InvalidSignature.is_retryable());
        assert!(!CallbackError::UnknownReference(ExternalRef::new("X").unwrap()).is_retryable());
    }

    #[test]
    fn auth_failures_are_unauthorized() {
        assert_eq!(
            CallbackError::InvalidSignature.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            CallbackError::MissingSignature.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert!(CallbackError::InvalidSignature.is_security_event());
    }

    #[test]
    fn server_errors_trigger_redelivery() {
        let err = CallbackError::Database("pool exhausted".into());
        assert!(err.status_code().is_server_error());
    }

    #[test]
    fn amount_mismatch_is_rejected_not_retried() {
        let err = CallbackError::AmountMismatch {
            intent_id: PaymentIntentId::new(),
            expected: 9_900,
            actual: 1,
        };
        assert!(err.status_code().is_client_error());
        assert!(err.is_security_event());
    }
}
