//! Reconciler and background maintenance configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::entitlement::RetryPolicy;

/// Timeouts, retry schedule and sweep cadence.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconcilerConfig {
    /// Upper bound for granting an entitlement inline, in seconds
    #[serde(default = "default_activator_timeout")]
    pub activator_timeout_secs: u64,

    /// Upper bound for invoice and referral steps, in seconds
    #[serde(default = "default_side_effect_timeout")]
    pub side_effect_timeout_secs: u64,

    /// How often the maintenance loop runs, in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Attempts (including the inline one) before a deferred step gives up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_backoff_base")]
    pub backoff_base_secs: u64,

    #[serde(default = "default_backoff_max")]
    pub backoff_max_secs: u64,

    /// How long a claimed task is hidden from other workers, in seconds
    #[serde(default = "default_claim_lease")]
    pub claim_lease_secs: u64,

    /// Completed intents younger than this are left to the inline path
    #[serde(default = "default_sweep_grace")]
    pub sweep_grace_secs: u64,

    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    #[serde(default = "default_sweep_concurrency")]
    pub sweep_concurrency: usize,

    /// Cancel pending intents older than this many hours. Off when unset.
    pub stale_pending_expiry_hours: Option<u64>,
}

impl ReconcilerConfig {
    pub fn activator_timeout(&self) -> Duration {
        Duration::from_secs(self.activator_timeout_secs)
    }

    pub fn side_effect_timeout(&self) -> Duration {
        Duration::from_secs(self.side_effect_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_secs(self.backoff_base_secs)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_secs(self.backoff_max_secs)
    }

    pub fn claim_lease(&self) -> Duration {
        Duration::from_secs(self.claim_lease_secs)
    }

    pub fn sweep_grace(&self) -> Duration {
        Duration::from_secs(self.sweep_grace_secs)
    }

    pub fn stale_pending_expiry(&self) -> Option<Duration> {
        self.stale_pending_expiry_hours
            .map(|hours| Duration::from_secs(hours * 3_600))
    }

    /// Backoff schedule for deferred side effects.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            base_delay: self.backoff_base(),
            max_delay: self.backoff_max(),
            max_attempts: self.max_attempts,
        }
    }

    /// Validate reconciler configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.activator_timeout_secs == 0 {
            return Err(ValidationError::OutOfRange("reconciler.activator_timeout_secs"));
        }
        if self.side_effect_timeout_secs == 0 {
            return Err(ValidationError::OutOfRange("reconciler.side_effect_timeout_secs"));
        }
        if self.poll_interval_secs == 0 {
            return Err(ValidationError::OutOfRange("reconciler.poll_interval_secs"));
        }
        if self.max_attempts == 0 {
            return Err(ValidationError::OutOfRange("reconciler.max_attempts"));
        }
        if self.backoff_base_secs == 0 || self.backoff_base_secs > self.backoff_max_secs {
            return Err(ValidationError::OutOfRange("reconciler.backoff_base_secs"));
        }
        if self.batch_size == 0 || self.sweep_concurrency == 0 {
            return Err(ValidationError::OutOfRange("reconciler.batch_size"));
        }
        if self.stale_pending_expiry_hours == Some(0) {
            return Err(ValidationError::OutOfRange("reconciler.stale_pending_expiry_hours"));
        }
        Ok(())
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            activator_timeout_secs: default_activator_timeout(),
            side_effect_timeout_secs: default_side_effect_timeout(),
            poll_interval_secs: default_poll_interval(),
            max_attempts: default_max_attempts(),
            backoff_base_secs: default_backoff_base(),
            backoff_max_secs: default_backoff_max(),
            claim_lease_secs: default_claim_lease(),
            sweep_grace_secs: default_sweep_grace(),
            batch_size: default_batch_size(),
            sweep_concurrency: default_sweep_concurrency(),
            stale_pending_expiry_hours: None,
        }
    }
}

fn default_activator_timeout() -> u64 {
    10
}

fn default_side_effect_timeout() -> u64 {
    5
}

fn default_poll_interval() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    12
}

fn default_backoff_base() -> u64 {
    30
}

fn default_backoff_max() -> u64 {
    3_600
}

fn default_claim_lease() -> u64 {
    300
}

fn default_sweep_grace() -> u64 {
    120
}

fn default_batch_size() -> u32 {
    50
}

fn default_sweep_concurrency() -> usize {
    4
}
