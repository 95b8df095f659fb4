//! Domain layer containing business logic and domain types.
//!
//! - `foundation` - Shared primitives (ids, timestamps, errors, events)
//! - `payment` - Payment intents, catalog, gateway callback vocabulary
//! - `entitlement` - Subscriptions, boosts, listing credits, invoices, referrals

pub mod entitlement;
pub mod foundation;
pub mod payment;
