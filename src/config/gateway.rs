//! Payment gateway configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;
use crate::ports::ReturnUrls;

/// Hosted payment gateway configuration.
///
/// The gateway counts as configured only when `base_url`, `site_code` and
/// `secret_key` are all present.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Gateway API base URL
    pub base_url: Option<String>,

    /// Merchant site code issued by the gateway
    #[serde(default)]
    pub site_code: String,

    /// Shared secret used to sign requests and verify callbacks
    pub secret_key: Option<SecretString>,

    #[serde(default = "default_country_code")]
    pub country_code: String,

    #[serde(default = "default_currency_code")]
    pub currency_code: String,

    /// Send requests in the gateway's test mode
    #[serde(default)]
    pub is_test: bool,

    /// Gateway request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_success_url")]
    pub success_url: String,

    #[serde(default = "default_cancel_url")]
    pub cancel_url: String,

    #[serde(default = "default_error_url")]
    pub error_url: String,

    #[serde(default = "default_notify_url")]
    pub notify_url: String,
}

impl GatewayConfig {
    /// Whether a live gateway can be built from this configuration.
    pub fn is_configured(&self) -> bool {
        self.base_url.as_deref().is_some_and(|url| !url.trim().is_empty())
            && !self.site_code.trim().is_empty()
            && self
                .secret_key
                .as_ref()
                .is_some_and(|key| !key.expose_secret().is_empty())
    }

    pub fn return_urls(&self) -> ReturnUrls {
        ReturnUrls {
            success_url: self.success_url.clone(),
            cancel_url: self.cancel_url.clone(),
            error_url: self.error_url.clone(),
            notify_url: self.notify_url.clone(),
        }
    }

    /// Validate gateway configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        let production = *environment == Environment::Production;

        let urls = [
            ("gateway.success_url", &self.success_url),
            ("gateway.cancel_url", &self.cancel_url),
            ("gateway.error_url", &self.error_url),
            ("gateway.notify_url", &self.notify_url),
        ];
        for (name, url) in urls {
            check_url(name, url, production)?;
        }

        if !self.is_configured() {
            return Ok(());
        }

        if let Some(base_url) = &self.base_url {
            check_url("gateway.base_url", base_url, production)?;
        }
        if self.timeout_secs == 0 || self.timeout_secs > 120 {
            return Err(ValidationError::OutOfRange("gateway.timeout_secs"));
        }
        if self.country_code.len() != 2 {
            return Err(ValidationError::OutOfRange("gateway.country_code"));
        }
        if self.currency_code.len() != 3 {
            return Err(ValidationError::OutOfRange("gateway.currency_code"));
        }
        Ok(())
    }
}

fn check_url(name: &'static str, value: &str, require_https: bool) -> Result<(), ValidationError> {
    let url = reqwest::Url::parse(value).map_err(|_| ValidationError::InvalidUrl(name))?;
    if require_https && url.scheme() != "https" {
        return Err(ValidationError::GatewayMustBeHttps);
    }
    Ok(())
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            site_code: String::new(),
            secret_key: None,
            country_code: default_country_code(),
            currency_code: default_currency_code(),
            is_test: false,
            timeout_secs: default_timeout(),
            success_url: default_success_url(),
            cancel_url: default_cancel_url(),
            error_url: default_error_url(),
            notify_url: default_notify_url(),
        }
    }
}

fn default_country_code() -> String {
    "ZA".to_string()
}

fn default_currency_code() -> String {
    "ZAR".to_string()
}

fn default_timeout() -> u64 {
    15
}

fn default_success_url() -> String {
    "http://localhost:8080/payments/success".to_string()
}

fn default_cancel_url() -> String {
    "http://localhost:8080/payments/cancel".to_string()
}

fn default_error_url() -> String {
    "http://localhost:8080/payments/error".to_string()
}

fn default_notify_url() -> String {
    "http://localhost:8080/api/payments/callback".to_string()
}
