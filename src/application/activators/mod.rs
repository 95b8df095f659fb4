//! Entitlement activators.
//!
//! One activator per kind of grant. Each `apply` is idempotent on its own:
//! the reconciler calls it once per settled intent, the retry worker and
//! the entitlement sweep may call it again.

mod boost;
mod listing_fee;
mod subscription;

pub use boost::BoostActivator;
pub use listing_fee::ListingFeeActivator;
pub use subscription::SubscriptionActivator;

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::payment::{EntitlementSpec, PaymentIntent};
use crate::ports::{BoostRepository, ListingCreditRepository, SaveResult, SubscriptionRepository};

/// Grants what a settled payment paid for.
#[async_trait]
pub trait EntitlementActivator: Send + Sync {
    /// Short name used in logs and events.
    fn name(&self) -> &'static str;

    /// Whether this activator grants the given entitlement.
    fn handles(&self, spec: &EntitlementSpec) -> bool;

    /// Grant the entitlement described by `intent.metadata`.
    async fn apply(&self, intent: &PaymentIntent) -> Result<SaveResult, DomainError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationOutcome {
    Granted {
        activator: &'static str,
        result: SaveResult,
    },
    /// The purpose unlocks nothing (adhoc charges).
    NothingToGrant,
}

/// Routes an intent to the activator that handles its entitlement.
pub struct ActivatorRegistry {
    activators: Vec<Arc<dyn EntitlementActivator>>,
}

impl ActivatorRegistry {
    pub fn new(activators: Vec<Arc<dyn EntitlementActivator>>) -> Self {
        Self { activators }
    }

    /// Subscription, boost and listing-fee activators over the given stores.
    pub fn standard(
        subscriptions: Arc<dyn SubscriptionRepository>,
        boosts: Arc<dyn BoostRepository>,
        credits: Arc<dyn ListingCreditRepository>,
    ) -> Self {
        Self::new(vec![
            Arc::new(SubscriptionActivator::new(subscriptions)),
            Arc::new(BoostActivator::new(boosts)),
            Arc::new(ListingFeeActivator::new(credits)),
        ])
    }

    pub async fn activate(&self, intent: &PaymentIntent) -> Result<ActivationOutcome, DomainError> {
        if intent.metadata == EntitlementSpec::None {
            return Ok(ActivationOutcome::NothingToGrant);
        }

        let activator = self
            .activators
            .iter()
            .find(|a| a.handles(&intent.metadata))
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::InternalError,
                    format!("No activator registered for payment {}", intent.id),
                )
            })?;

        let result = activator.apply(intent).await?;
        Ok(ActivationOutcome::Granted {
            activator: activator.name(),
            result,
        })
    }
}

/// Error for an activator handed an intent it does not handle.
pub(crate) fn mismatched_grant(activator: &str, intent: &PaymentIntent) -> DomainError {
    DomainError::new(
        ErrorCode::InternalError,
        format!(
            "{} activator cannot grant {:?} for payment {}",
            activator, intent.metadata, intent.id
        ),
    )
}
