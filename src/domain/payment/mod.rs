//! Payment domain - intents, purposes, pricing and gateway callbacks.
//!
//! A `PaymentIntent` is created `Pending` with a catalog-derived amount,
//! then settled exactly once by the reconciler when a verified gateway
//! callback arrives.

mod callback;
mod callback_errors;
mod catalog;
mod errors;
mod events;
mod intent;
mod purpose;
mod reference;
mod status;

pub use callback::{GatewayStatus, VerifiedCallback};
pub use callback_errors::CallbackError;
pub use catalog::{BoostOffer, Catalog, ListingFeeOffer, SubscriptionPlanOffer};
pub use errors::PaymentError;
pub use events::{PaymentSettled, PAYMENT_AGGREGATE};
pub use intent::PaymentIntent;
pub use purpose::{EntitlementSpec, PaymentPurpose, PurposeRequest};
pub use reference::{BankReference, ExternalRef};
pub use status::PaymentStatus;
