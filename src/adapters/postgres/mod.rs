//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! Every write that can race is a single statement: a guarded `UPDATE ...
//! RETURNING` or an `INSERT ... ON CONFLICT`. Nothing here reads a row and
//! then writes it back.

mod boost_repository;
mod deferred_task_repository;
mod invoice_repository;
mod listing_credit_repository;
mod payment_intent_repository;
mod referral_repository;
mod subscription_repository;

pub use boost_repository::PostgresBoostRepository;
pub use deferred_task_repository::PostgresDeferredTaskRepository;
pub use invoice_repository::PostgresInvoiceRepository;
pub use listing_credit_repository::PostgresListingCreditRepository;
pub use payment_intent_repository::PostgresPaymentIntentRepository;
pub use referral_repository::PostgresReferralRepository;
pub use subscription_repository::PostgresSubscriptionRepository;

use std::fmt;

use crate::domain::foundation::{DomainError, ErrorCode, UserId};

/// True when `err` is a violation of the named unique constraint.
pub(crate) fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint() == Some(constraint),
        _ => false,
    }
}

/// A stored value no longer parses into its domain type.
pub(crate) fn corrupt(column: &str, err: impl fmt::Display) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Invalid {} value in row: {}", column, err))
}

pub(crate) fn user_id(column: &str, raw: String) -> Result<UserId, DomainError> {
    UserId::new(raw).map_err(|e| corrupt(column, e))
}
