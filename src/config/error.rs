//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid bind address")]
    InvalidBindAddress,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("database.max_connections must exceed reconciler.sweep_concurrency")]
    PoolTooSmallForSweep,

    #[error("server.request_timeout_secs is shorter than an inline settlement")]
    RequestTimeoutTooShort,

    #[error("Invalid URL for {0}")]
    InvalidUrl(&'static str),

    #[error("Gateway URLs must use HTTPS in production")]
    GatewayMustBeHttps,

    #[error("No payment gateway configured and offline payments are disabled")]
    GatewayNotConfigured,

    #[error("Offline payments cannot be enabled in production")]
    OfflinePaymentsInProduction,

    #[error("Invalid value for {0}")]
    OutOfRange(&'static str),
}
