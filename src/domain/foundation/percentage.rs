//! Percentage value object (0-100 scale).

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// A whole-number percentage between 0 and 100 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percentage(u8);

impl Percentage {
    pub const ZERO: Self = Self(0);

    /// Creates a Percentage, returning error if out of range.
    pub fn try_new(value: u8) -> Result<Self, ValidationError> {
        if value > 100 {
            return Err(ValidationError::out_of_range(
                "percentage",
                0,
                100,
                i64::from(value),
            ));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Applies this percentage to an amount in minor units, rounding down.
    ///
    /// Integer arithmetic only; no cent is ever invented by rounding.
    pub fn of_cents(&self, amount_cents: i64) -> i64 {
        amount_cents.saturating_mul(i64::from(self.0)) / 100
    }
}

impl Default for Percentage {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_new_rejects_above_hundred() {
        assert!(Percentage::try_new(100).is_ok());
        assert!(Percentage::try_new(101).is_err());
    }

    #[test]
    fn of_cents_rounds_down() {
        let ten = Percentage::try_new(10).unwrap();
        assert_eq!(ten.of_cents(9900), 990);
        assert_eq!(ten.of_cents(9), 0);
        assert_eq!(Percentage::ZERO.of_cents(9900), 0);
    }

    #[test]
    fn displays_with_percent_sign() {
        assert_eq!(Percentage::try_new(15).unwrap().to_string(), "15%");
    }
}
