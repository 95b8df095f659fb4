//! HTTP handlers for payment endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Json, Path, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::application::handlers::payment::{
    CreatePaymentCommand, CreatePaymentHandler, GetPaymentStatusHandler, GetPaymentStatusQuery,
    HandleGatewayCallbackCommand, HandleGatewayCallbackHandler,
};
use crate::domain::foundation::{DomainError, PaymentIntentId, UserId};
use crate::domain::payment::{CallbackError, PaymentError};
use crate::ports::{CallbackPayload, ListingCreditRepository, PaymentGateway};

use super::dto::{
    CallbackAckResponse, CreatePaymentRequest, CreatePaymentResponse, ErrorResponse,
    HealthResponse, ListingQuotaResponse, PaymentStatusResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the payment routes.
///
/// Cloned per request; every field is behind an `Arc`.
#[derive(Clone)]
pub struct PaymentAppState {
    pub create_payment: Arc<CreatePaymentHandler>,
    pub get_payment_status: Arc<GetPaymentStatusHandler>,
    pub handle_callback: Arc<HandleGatewayCallbackHandler>,
    pub listing_credits: Arc<dyn ListingCreditRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
}

// ════════════════════════════════════════════════════════════════════════════════
// User Context
// ════════════════════════════════════════════════════════════════════════════════

/// Caller identity supplied by the upstream auth proxy.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Rejection type for AuthenticatedUser extraction.
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> axum::response::Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("X-User-Id")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| UserId::new(s).ok())
            .ok_or(AuthenticationRequired)?;

        Ok(AuthenticatedUser { user_id })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Payment endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/payments - Create a payment intent and get the redirect URL
pub async fn create_payment(
    State(state): State<PaymentAppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<impl IntoResponse, PaymentApiError> {
    // Adhoc amounts are for trusted internal callers only.
    let purpose = request.purpose.into_purpose(false)?;

    let cmd = CreatePaymentCommand {
        owner_id: user.user_id,
        purpose,
    };
    let result = state.create_payment.handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(CreatePaymentResponse::from(result))))
}

/// GET /api/payments/:id - Get a payment's status
pub async fn get_payment_status(
    State(state): State<PaymentAppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let payment_id: PaymentIntentId = id.parse().map_err(|_| PaymentError::ValidationFailed {
        field: "payment_id".to_string(),
        message: "payment id must be a UUID".to_string(),
    })?;

    let query = GetPaymentStatusQuery {
        payment_id,
        requester: user.user_id,
    };
    let view = state.get_payment_status.handle(query).await?;

    Ok(Json(PaymentStatusResponse::from(view)))
}

/// GET /api/listing-quota - Listing slots bought by the caller
pub async fn get_listing_quota(
    State(state): State<PaymentAppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, PaymentApiError> {
    let purchased_slots = state.listing_credits.purchased_slots(&user.user_id).await?;

    Ok(Json(ListingQuotaResponse {
        owner_id: user.user_id.to_string(),
        purchased_slots,
    }))
}

/// GET /health - Liveness probe
pub async fn health(State(state): State<PaymentAppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        gateway: if state.gateway.is_live() { "live" } else { "offline" },
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// Gateway callback
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/payments/callback - Gateway notification (form or JSON)
///
/// 2xx acknowledges the callback, 4xx tells the gateway not to retry and
/// 5xx asks for redelivery.
pub async fn handle_gateway_callback(
    State(state): State<PaymentAppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, CallbackApiError> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false);

    let payload = if is_json {
        CallbackPayload::from_json(&body)?
    } else {
        CallbackPayload::from_form(&body)?
    };

    let outcome = state
        .handle_callback
        .handle(HandleGatewayCallbackCommand { payload })
        .await?;

    Ok((StatusCode::OK, Json(CallbackAckResponse::from(&outcome))))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts payment errors to HTTP responses.
#[derive(Debug)]
pub struct PaymentApiError(PaymentError);

impl From<PaymentError> for PaymentApiError {
    fn from(err: PaymentError) -> Self {
        Self(err)
    }
}

impl From<DomainError> for PaymentApiError {
    fn from(err: DomainError) -> Self {
        Self(PaymentError::from(err))
    }
}

impl IntoResponse for PaymentApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.0.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Payment request failed");
        }

        // Infrastructure details stay in the logs.
        let message = match &self.0 {
            PaymentError::Infrastructure(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };
        let body = ErrorResponse::new(self.0.code().to_string(), message);
        (status, Json(body)).into_response()
    }
}

/// Callback failures, rendered with gateway retry semantics.
#[derive(Debug)]
pub struct CallbackApiError(CallbackError);

impl From<CallbackError> for CallbackApiError {
    fn from(err: CallbackError) -> Self {
        Self(err)
    }
}

impl IntoResponse for CallbackApiError {
    fn into_response(self) -> axum::response::Response {
        let error_code = match &self.0 {
            CallbackError::InvalidSignature | CallbackError::MissingSignature => "INVALID_SIGNATURE",
            CallbackError::ParseError(_) | CallbackError::MissingField(_) => "MALFORMED_CALLBACK",
            CallbackError::SiteMismatch => "SITE_MISMATCH",
            CallbackError::UnknownReference(_) => "UNKNOWN_REFERENCE",
            CallbackError::AmountMismatch { .. } => "AMOUNT_MISMATCH",
            CallbackError::OfflineMode => "CALLBACKS_DISABLED",
            CallbackError::Database(_) => "RETRY_LATER",
        };

        // Never tell a forger which check failed beyond the code.
        let message = match &self.0 {
            CallbackError::Database(_) => "Temporary failure, please retry".to_string(),
            CallbackError::AmountMismatch { .. } => "Amount does not match the payment".to_string(),
            other => other.to_string(),
        };

        let body = ErrorResponse::new(error_code, message);
        (self.0.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn payment_errors_map_to_status_and_code() {
        let response = PaymentApiError(PaymentError::unknown_purpose("platinum")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error_code"], "UNKNOWN_PURPOSE");

        let response =
            PaymentApiError(PaymentError::GatewayUnavailable("down".into())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn infrastructure_errors_hide_details() {
        let response =
            PaymentApiError(PaymentError::Infrastructure("pool timed out on host db-3".into()))
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert!(!json["message"].as_str().unwrap().contains("db-3"));
    }

    #[tokio::test]
    async fn callback_errors_follow_gateway_retry_semantics() {
        let forged = CallbackApiError(CallbackError::InvalidSignature).into_response();
        assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);

        let transient = CallbackApiError(CallbackError::Database("down".into())).into_response();
        assert_eq!(transient.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(transient).await;
        assert_eq!(json["error_code"], "RETRY_LATER");
    }
}
