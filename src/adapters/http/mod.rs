//! HTTP adapters - REST API implementations.

pub mod payment;
mod router;

pub use payment::{payment_router, PaymentAppState};
pub use router::build_router;
