//! Axum router configuration for payment endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    create_payment, get_listing_quota, get_payment_status, handle_gateway_callback, health,
    PaymentAppState,
};

/// Create the payment API router.
///
/// # Routes
///
/// ## User Endpoints (X-User-Id required)
/// - `POST /api/payments` - Create a payment and get the redirect URL
/// - `GET /api/payments/:id` - Get payment status
/// - `GET /api/listing-quota` - Listing slots bought
///
/// ## Gateway Endpoints (no auth, signature verified)
/// - `POST /api/payments/callback` - Gateway notification
///
/// `GET /health` is mounted at the root.
pub fn payment_router() -> Router<PaymentAppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/payments", post(create_payment))
        // Registered before the `:id` capture so it is never parsed as an id.
        .route("/api/payments/callback", post(handle_gateway_callback))
        .route("/api/payments/:id", get(get_payment_status))
        .route("/api/listing-quota", get(get_listing_quota))
}
