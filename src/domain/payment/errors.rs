//! Errors raised while creating and querying payment intents.
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | UnknownPurpose | 400 |
//! | InvalidPurpose | 422 |
//! | ValidationFailed | 400 |
//! | NotFound | 404 |
//! | AlreadyAttached | 409 |
//! | GatewayUnavailable | 503 |
//! | Infrastructure | 500 |

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, PaymentIntentId, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// The symbolic plan/boost/tier key is not in the catalog.
    #[error("Unknown purpose: {0}")]
    UnknownPurpose(String),

    /// The purpose fields do not fit together.
    #[error("Invalid purpose: {0}")]
    InvalidPurpose(String),

    #[error("Validation failed on '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    #[error("Payment {0} not found")]
    NotFound(PaymentIntentId),

    /// An external reference was already attached to this intent.
    #[error("Payment {0} already has an external reference")]
    AlreadyAttached(PaymentIntentId),

    /// Live gateway unreachable or not configured and offline mode is off.
    #[error("Payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

impl PaymentError {
    pub fn unknown_purpose(key: impl Into<String>) -> Self {
        PaymentError::UnknownPurpose(key.into())
    }

    pub fn invalid_purpose(reason: impl Into<String>) -> Self {
        PaymentError::InvalidPurpose(reason.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            PaymentError::UnknownPurpose(_) => ErrorCode::UnknownPurpose,
            PaymentError::InvalidPurpose(_) => ErrorCode::InvalidPurpose,
            PaymentError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            PaymentError::NotFound(_) => ErrorCode::PaymentNotFound,
            PaymentError::AlreadyAttached(_) => ErrorCode::AlreadyAttached,
            PaymentError::GatewayUnavailable(_) => ErrorCode::GatewayError,
            PaymentError::Infrastructure(_) => ErrorCode::InternalError,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PaymentError::UnknownPurpose(_) | PaymentError::ValidationFailed { .. } => {
                StatusCode::BAD_REQUEST
            }
            PaymentError::InvalidPurpose(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PaymentError::NotFound(_) => StatusCode::NOT_FOUND,
            PaymentError::AlreadyAttached(_) => StatusCode::CONFLICT,
            PaymentError::GatewayUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            PaymentError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationError> for PaymentError {
    fn from(err: ValidationError) -> Self {
        let field = match &err {
            ValidationError::EmptyField { field }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::InvalidFormat { field, .. } => field.clone(),
        };
        PaymentError::ValidationFailed {
            field,
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for PaymentError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::UnknownPurpose => PaymentError::UnknownPurpose(err.message),
            ErrorCode::InvalidPurpose => PaymentError::InvalidPurpose(err.message),
            ErrorCode::GatewayError => PaymentError::GatewayUnavailable(err.message),
            ErrorCode::ValidationFailed => PaymentError::ValidationFailed {
                field: err.details.get("field").cloned().unwrap_or_default(),
                message: err.message,
            },
            ErrorCode::AlreadyAttached | ErrorCode::PaymentNotFound => {
                match err.details.get("payment_id").and_then(|id| id.parse().ok()) {
                    Some(id) if err.code == ErrorCode::AlreadyAttached => {
                        PaymentError::AlreadyAttached(id)
                    }
                    Some(id) => PaymentError::NotFound(id),
                    None => PaymentError::Infrastructure(err.message),
                }
            }
            _ => PaymentError::Infrastructure(err.to_string()),
        }
    }
}

impl From<PaymentError> for DomainError {
    fn from(err: PaymentError) -> Self {
        let base = DomainError::new(err.code(), err.to_string());
        match err {
            PaymentError::NotFound(id) | PaymentError::AlreadyAttached(id) => {
                base.with_detail("payment_id", id.to_string())
            }
            PaymentError::ValidationFailed { field, .. } => base.with_detail("field", field),
            _ => base,
        }
    }
}
