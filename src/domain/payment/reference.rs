//! References exchanged with the payment gateway.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::foundation::ValidationError;

/// Gateway transaction reference; the idempotency key for callbacks.
///
/// Unique per payment intent. Restricted to ASCII alphanumerics, `-` and `_`
/// so it survives every gateway field encoding unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalRef(String);

impl ExternalRef {
    pub const MAX_LEN: usize = 64;

    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("transaction_reference"));
        }
        if trimmed.len() > Self::MAX_LEN {
            return Err(ValidationError::out_of_range(
                "transaction_reference",
                1,
                Self::MAX_LEN as i64,
                trimmed.len() as i64,
            ));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::invalid_format(
                "transaction_reference",
                "only letters, digits, '-' and '_' are allowed",
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Generates a fresh random reference.
    pub fn generate() -> Self {
        let raw = Uuid::new_v4().simple().to_string().to_uppercase();
        Self(format!("PR-{}", &raw[..20]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference printed on the payer's bank statement.
///
/// Derived from the purchase description and cut to the gateway's field limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankReference(String);

impl BankReference {
    pub const MAX_LEN: usize = 20;
    const FALLBACK: &'static str = "PAYMENT";

    pub fn from_description(description: &str) -> Self {
        let cleaned: String = description
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
            .collect();
        let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

        let mut truncated: String = collapsed.chars().take(Self::MAX_LEN).collect();
        truncated.truncate(truncated.trim_end().len());

        if truncated.is_empty() {
            Self(Self::FALLBACK.to_string())
        } else {
            Self(truncated)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BankReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
