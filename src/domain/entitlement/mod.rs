//! Entitlement domain - what a settled payment grants.
//!
//! Records here are created as a consequence of a single terminal
//! transition and are never created twice for the same payment intent.

mod boost;
mod deferred;
mod events;
mod invoice;
mod listing_credit;
mod referral;
mod subscription;

pub use boost::ListingBoost;
pub use deferred::{DeferredTask, RetryPolicy, TaskKind, TaskState};
pub use events::{EntitlementGranted, InvoiceIssued, ReferralCredited};
pub use invoice::Invoice;
pub use listing_credit::ListingCredit;
pub use referral::{Referral, ReferralPolicy, ReferralStatus};
pub use subscription::{Subscription, SubscriptionStatus};
