//! Command and query handlers.

pub mod payment;

pub use payment::*;
