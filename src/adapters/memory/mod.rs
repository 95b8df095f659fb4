//! In-memory repositories for tests and local runs.
//!
//! Each repository keeps its state behind one mutex, so every port
//! operation is atomic the same way the Postgres statements are.

mod boost_repository;
mod deferred_task_repository;
mod invoice_repository;
mod listing_credit_repository;
mod payment_intent_repository;
mod referral_repository;
mod subscription_repository;

pub use boost_repository::InMemoryBoostRepository;
pub use deferred_task_repository::InMemoryDeferredTaskRepository;
pub use invoice_repository::InMemoryInvoiceRepository;
pub use listing_credit_repository::InMemoryListingCreditRepository;
pub use payment_intent_repository::InMemoryPaymentIntentRepository;
pub use referral_repository::InMemoryReferralRepository;
pub use subscription_repository::InMemorySubscriptionRepository;

use std::sync::{Mutex, MutexGuard};

use crate::domain::foundation::{DomainError, ErrorCode};

/// Lock, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) fn injected_failure(what: &str) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{} unavailable", what))
}
