//! Payment Reconciler - payment intents and gateway callback reconciliation.
//!
//! Creates priced payment intents, hands the payer to a hosted gateway,
//! and turns the gateway's signed callbacks into exactly one terminal
//! status per intent plus the entitlement, invoice and referral reward
//! that follow from it.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
