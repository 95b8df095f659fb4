//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `PAYMENT_RECONCILER`
//! prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use payment_reconciler::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod features;
mod gateway;
mod reconciler;
mod referral;
mod server;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use features::FeatureFlags;
pub use gateway::GatewayConfig;
pub use reconciler::ReconcilerConfig;
pub use referral::ReferralConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Hosted payment gateway
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Timeouts, retries and sweeps
    #[serde(default)]
    pub reconciler: ReconcilerConfig,

    /// Referral rewards
    #[serde(default)]
    pub referral: ReferralConfig,

    /// Feature flags
    #[serde(default)]
    pub features: FeatureFlags,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `PAYMENT_RECONCILER` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `PAYMENT_RECONCILER__SERVER__BIND=0.0.0.0:8080` -> `server.bind = "0.0.0.0:8080"`
    /// - `PAYMENT_RECONCILER__GATEWAY__SECRET_KEY=...` -> `gateway.secret_key = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PAYMENT_RECONCILER")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Beyond per-section checks, refuses to start without a gateway unless
    /// offline payments are explicitly allowed, never allows offline payments
    /// in production, and checks the pool and request timeout leave room
    /// for the reconciler.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.features.allow_offline_payments && self.is_production() {
            return Err(ValidationError::OfflinePaymentsInProduction);
        }
        if !self.gateway.is_configured() && !self.features.allow_offline_payments {
            return Err(ValidationError::GatewayNotConfigured);
        }

        self.server.validate()?;
        self.database.validate()?;
        self.gateway.validate(&self.server.environment)?;
        self.reconciler.validate()?;
        self.referral.validate()?;

        if self.database.max_connections as usize <= self.reconciler.sweep_concurrency {
            return Err(ValidationError::PoolTooSmallForSweep);
        }
        // A callback settles inline: entitlement, then invoice, then referral.
        let settlement = self.reconciler.activator_timeout() + self.reconciler.side_effect_timeout() * 2;
        if self.server.request_timeout() <= settlement {
            return Err(ValidationError::RequestTimeoutTooShort);
        }
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
