//! Referral reward configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::entitlement::ReferralPolicy;
use crate::domain::foundation::Percentage;

#[derive(Debug, Clone, Deserialize)]
pub struct ReferralConfig {
    /// Share of the first payment credited to the referrer
    #[serde(default = "default_reward_percent")]
    pub reward_percent: u8,

    /// Upper bound for a percentage reward, in cents
    #[serde(default = "default_reward_cap")]
    pub reward_cap_cents: Option<i64>,

    /// Flat reward in cents. Takes precedence over the percentage.
    pub fixed_reward_cents: Option<i64>,
}

impl ReferralConfig {
    pub fn policy(&self) -> Result<ReferralPolicy, ValidationError> {
        if let Some(cents) = self.fixed_reward_cents {
            return Ok(ReferralPolicy::Fixed { cents });
        }
        let rate = Percentage::try_new(self.reward_percent)
            .map_err(|_| ValidationError::OutOfRange("referral.reward_percent"))?;
        Ok(ReferralPolicy::Percentage {
            rate,
            cap_cents: self.reward_cap_cents,
        })
    }

    /// Validate referral configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.fixed_reward_cents.is_some_and(|cents| cents < 0) {
            return Err(ValidationError::OutOfRange("referral.fixed_reward_cents"));
        }
        if self.reward_cap_cents.is_some_and(|cents| cents < 0) {
            return Err(ValidationError::OutOfRange("referral.reward_cap_cents"));
        }
        self.policy().map(|_| ())
    }
}

impl Default for ReferralConfig {
    fn default() -> Self {
        Self {
            reward_percent: default_reward_percent(),
            reward_cap_cents: default_reward_cap(),
            fixed_reward_cents: None,
        }
    }
}

fn default_reward_percent() -> u8 {
    10
}

fn default_reward_cap() -> Option<i64> {
    Some(5_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_matches_domain_default() {
        assert_eq!(ReferralConfig::default().policy().unwrap(), ReferralPolicy::default());
    }

    #[test]
    fn test_fixed_reward_wins() {
        let config = ReferralConfig {
            fixed_reward_cents: Some(1_000),
            ..Default::default()
        };
        assert_eq!(config.policy().unwrap(), ReferralPolicy::Fixed { cents: 1_000 });
    }

    #[test]
    fn test_percentage_over_100_is_rejected() {
        let config = ReferralConfig {
            reward_percent: 150,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
