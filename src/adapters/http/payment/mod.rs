//! HTTP adapter for payment endpoints.
//!
//! - `POST /api/payments` - Create a payment intent
//! - `GET /api/payments/:id` - Get payment status
//! - `POST /api/payments/callback` - Gateway notification
//! - `GET /api/listing-quota` - Listing slots bought
//! - `GET /health` - Liveness

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{AuthenticatedUser, CallbackApiError, PaymentApiError, PaymentAppState};
pub use routes::payment_router;
