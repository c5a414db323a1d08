//! Parsing of holder and value arguments.

use divvy_core::amount::{parse_amount, parse_units};
use divvy_core::constants::HOLDER_ID_LEN;
use divvy_core::error::ParseError;
use divvy_core::types::{Amount, HolderId};

/// Parse a holder given as 40 hex characters (optionally `0x`-prefixed) or
/// as a free-form label.
pub fn parse_holder(s: &str) -> Result<HolderId, ParseError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.len() == HOLDER_ID_LEN * 2 && digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return s.parse();
    }
    if s.is_empty() || s.starts_with("0x") {
        return Err(ParseError::InvalidHolder(s.to_string()));
    }
    Ok(HolderId::from_label(s))
}

/// Parse a value as whole coins, or as raw units when `raw` is set.
pub fn parse_value(s: &str, raw: bool) -> Result<Amount, ParseError> {
    if raw { parse_units(s) } else { parse_amount(s) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use divvy_core::constants::COIN;

    #[test]
    fn hex_holders_parse_with_or_without_prefix() {
        let id = HolderId([0xab; 20]);
        let hex = "ab".repeat(20);
        assert_eq!(parse_holder(&hex).unwrap(), id);
        assert_eq!(parse_holder(&format!("0x{hex}")).unwrap(), id);
    }

    #[test]
    fn labels_hash_to_stable_ids() {
        assert_eq!(parse_holder("alice").unwrap(), HolderId::from_label("alice"));
        assert_ne!(parse_holder("alice").unwrap(), parse_holder("bob").unwrap());
    }

    #[test]
    fn malformed_prefixed_hex_is_rejected() {
        assert!(parse_holder("0x1234").is_err());
        assert!(parse_holder("").is_err());
    }

    #[test]
    fn values_in_coins_or_units() {
        assert_eq!(parse_value("1.5", false).unwrap(), COIN + COIN / 2);
        assert_eq!(parse_value("15", true).unwrap(), 15);
        assert!(parse_value("1.5", true).is_err());
    }
}
