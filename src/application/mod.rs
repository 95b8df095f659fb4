//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! The reconciler is the single path by which a payment leaves `Pending`
//! and side effects run; handlers feed it from HTTP and from the
//! maintenance loop.

pub mod activators;
pub mod handlers;
pub mod invoice_issuer;
pub mod maintenance;
mod publishing;
pub mod reconciler;
pub mod referral_rewarder;
#[cfg(test)]
pub(crate) mod testing;

pub use activators::{
    ActivationOutcome, ActivatorRegistry, BoostActivator, EntitlementActivator, ListingFeeActivator,
    SubscriptionActivator,
};
pub use handlers::*;
pub use invoice_issuer::InvoiceIssuer;
pub use maintenance::{MaintenanceReport, MaintenanceWorker};
pub use reconciler::{ReconcileOutcome, Reconciler, ReconcilerSettings, SideEffectReport, StepOutcome};
pub use referral_rewarder::{ReferralRewarder, RewardOutcome};
