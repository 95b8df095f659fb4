//! Feature flags configuration

use serde::Deserialize;

/// Feature flags for enabling/disabling functionality
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FeatureFlags {
    /// Settle purchases immediately with a synthetic success when no gateway
    /// is configured, or when the gateway cannot be reached.
    ///
    /// Never allowed in production.
    #[serde(default)]
    pub allow_offline_payments: bool,

    /// Show detailed error messages (disable in production!)
    #[serde(default)]
    pub verbose_errors: bool,
}
