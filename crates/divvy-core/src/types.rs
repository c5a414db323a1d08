//! Core identity types: holders, tokens, amounts.
//!
//! All monetary values are in units (1 COIN = 10^18 units).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::HOLDER_ID_LEN;
use crate::error::ParseError;

/// A monetary amount in the smallest value unit.
pub type Amount = u128;

/// A count of indivisible shares (tokens).
pub type Shares = u64;

/// A 20-byte holder identity.
///
/// The all-zero identity is reserved: it is the `from` side of every mint
/// and may never receive a token.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct HolderId(pub [u8; HOLDER_ID_LEN]);

impl HolderId {
    /// The zero identity.
    pub const ZERO: Self = Self([0u8; HOLDER_ID_LEN]);

    /// Derive a stable identity from a human-readable label.
    ///
    /// Takes the first 20 bytes of the BLAKE3 hash of the label.
    ///
    /// # Examples
    ///
    /// ```
    /// use divvy_core::types::HolderId;
    /// assert_eq!(HolderId::from_label("alice"), HolderId::from_label("alice"));
    /// assert_ne!(HolderId::from_label("alice"), HolderId::from_label("bob"));
    /// ```
    pub fn from_label(label: &str) -> Self {
        let hash = blake3::hash(label.as_bytes());
        let mut bytes = [0u8; HOLDER_ID_LEN];
        bytes.copy_from_slice(&hash.as_bytes()[..HOLDER_ID_LEN]);
        Self(bytes)
    }

    /// Check if this is the zero identity.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HOLDER_ID_LEN]
    }
}

impl fmt::Display for HolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for HolderId {
    type Err = ParseError;

    /// Parse 40 hex characters, with or without a `0x` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(digits).map_err(|_| ParseError::InvalidHolder(s.to_string()))?;
        let bytes: [u8; HOLDER_ID_LEN] = raw
            .try_into()
            .map_err(|_| ParseError::InvalidHolder(s.to_string()))?;
        Ok(Self(bytes))
    }
}

/// Identifier of a single indivisible token.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
    bincode::Encode, bincode::Decode,
)]
pub struct TokenId(pub u64);

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
