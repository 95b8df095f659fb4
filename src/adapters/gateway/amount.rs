//! Decimal amount text used on the gateway wire.
//!
//! Amounts travel as major units with two decimals ("99.00"). Conversion
//! is done on digits only; no floating point is involved.

use crate::domain::payment::CallbackError;

pub fn format_amount(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Parse "99", "99.5" or "99.00" into cents.
///
/// Rejects signs, more than two decimals and anything that is not a digit.
pub fn parse_amount(text: &str) -> Result<i64, CallbackError> {
    let invalid = || CallbackError::ParseError(format!("invalid amount '{}'", text));
    let text = text.trim();

    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (text, ""),
    };

    let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if whole.is_empty() || !digits_only(whole) || !digits_only(fraction) || fraction.len() > 2 {
        return Err(invalid());
    }

    let units: i64 = whole.parse().map_err(|_| invalid())?;
    let cents: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => fraction.parse().map_err(|_| invalid())?,
    };

    units
        .checked_mul(100)
        .and_then(|v| v.checked_add(cents))
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn formats_two_decimals() {
        assert_eq!(format_amount(4_900), "49.00");
        assert_eq!(format_amount(5), "0.05");
        assert_eq!(format_amount(123_456), "1234.56");
    }

    #[test]
    fn parses_common_shapes() {
        assert_eq!(parse_amount("99.00").unwrap(), 9_900);
        assert_eq!(parse_amount("99").unwrap(), 9_900);
        assert_eq!(parse_amount("99.5").unwrap(), 9_950);
        assert_eq!(parse_amount(" 0.05 ").unwrap(), 5);
    }

    #[test]
    fn rejects_malformed_amounts() {
        for bad in ["", ".50", "-1.00", "+1.00", "1.005", "1,00", "1.2.3", "abc", "1e3"] {
            assert!(parse_amount(bad).is_err(), "accepted {:?}", bad);
        }
    }

    proptest! {
        #[test]
        fn formatted_amounts_parse_back(cents in 0i64..1_000_000_000) {
            prop_assert_eq!(parse_amount(&format_amount(cents)).unwrap(), cents);
        }
    }
}
