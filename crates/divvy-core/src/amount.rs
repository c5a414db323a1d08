//! Conversion between whole-coin decimal strings and units.

use crate::constants::{COIN, COIN_DECIMALS};
use crate::error::ParseError;
use crate::types::Amount;

/// Render `units` as a decimal number of whole coins, without trailing zeros.
///
/// # Examples
///
/// ```
/// use divvy_core::amount::format_amount;
/// use divvy_core::constants::COIN;
/// assert_eq!(format_amount(COIN / 4), "0.25");
/// assert_eq!(format_amount(19 * COIN), "19");
/// ```
pub fn format_amount(units: Amount) -> String {
    let whole = units / COIN;
    let frac = units % COIN;
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{frac:0width$}", width = COIN_DECIMALS);
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

/// Parse a decimal number of whole coins (e.g. `"1.5"`) into units.
///
/// At most [`COIN_DECIMALS`] fractional digits are accepted.
pub fn parse_amount(s: &str) -> Result<Amount, ParseError> {
    let invalid = || ParseError::InvalidAmount(s.to_string());
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    if frac.len() > COIN_DECIMALS {
        return Err(invalid());
    }

    let whole_units = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<Amount>()
            .ok()
            .and_then(|w| w.checked_mul(COIN))
            .ok_or_else(invalid)?
    };
    let frac_units = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<width$}", width = COIN_DECIMALS);
        padded.parse::<Amount>().map_err(|_| invalid())?
    };
    whole_units.checked_add(frac_units).ok_or_else(invalid)
}

/// Parse a raw integer count of units.
pub fn parse_units(s: &str) -> Result<Amount, ParseError> {
    s.parse::<Amount>()
        .map_err(|_| ParseError::InvalidAmount(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn format_whole_and_fractional() {
        assert_eq!(format_amount(0), "0");
        assert_eq!(format_amount(COIN), "1");
        assert_eq!(format_amount(COIN * 3 / 4), "0.75");
        assert_eq!(format_amount(1), "0.000000000000000001");
        assert_eq!(format_amount(12 * COIN + COIN / 2), "12.5");
    }

    #[test]
    fn parse_forms() {
        assert_eq!(parse_amount("1").unwrap(), COIN);
        assert_eq!(parse_amount("0.25").unwrap(), COIN / 4);
        assert_eq!(parse_amount(".5").unwrap(), COIN / 2);
        assert_eq!(parse_amount("2.").unwrap(), 2 * COIN);
        assert_eq!(parse_amount("0.000000000000000001").unwrap(), 1);
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in ["", ".", "abc", "1.2.3", "-1", "1e5", "0.0000000000000000001"] {
            assert!(parse_amount(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn parse_rejects_overflow() {
        assert!(parse_amount(&u128::MAX.to_string()).is_err());
    }

    #[test]
    fn parse_units_raw() {
        assert_eq!(parse_units("250000000000000000").unwrap(), COIN / 4);
        assert!(parse_units("0.5").is_err());
    }

    proptest! {
        #[test]
        fn formatted_amount_parses_back(units in 0u128..=(u64::MAX as u128) * COIN) {
            prop_assert_eq!(parse_amount(&format_amount(units)).unwrap(), units);
        }
    }
}
