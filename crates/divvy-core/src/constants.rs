//! Accounting constants. All monetary values in units (1 COIN = 10^18 units).

use primitive_types::U256;

/// Smallest units per whole coin.
pub const COIN: u128 = 1_000_000_000_000_000_000;

/// Number of decimal places in a whole coin.
pub const COIN_DECIMALS: usize = 18;

/// Bit width of the fixed-point scale applied to the per-share accumulator.
pub const MAGNITUDE_BITS: u32 = 128;

/// Fixed-point scale of the per-share accumulator (`2^128`).
///
/// `amount * MAGNITUDE / total_shares` keeps sub-unit precision per share,
/// so a holder's dividend is only floored once, when it is read.
///
/// # Examples
///
/// ```
/// use divvy_core::constants::{MAGNITUDE, MAGNITUDE_BITS};
/// use primitive_types::U256;
/// assert_eq!(MAGNITUDE, U256::from(2u8).pow(U256::from(MAGNITUDE_BITS)));
/// ```
pub const MAGNITUDE: U256 = U256([0, 0, 1, 0]);

/// Ceiling on the lifetime total distributed (`2^127 - 1` units).
///
/// Every holder numerator `mdps * balance + correction` is at most
/// `total_distributed * MAGNITUDE`, so this keeps it below 2^255 where the
/// two's-complement reading is exact.
pub const MAX_TOTAL_DISTRIBUTED: u128 = i128::MAX as u128;

/// Id assigned to the first minted token.
pub const FIRST_TOKEN_ID: u64 = 1;

/// Byte length of a holder identity.
pub const HOLDER_ID_LEN: usize = 20;

/// Four-byte file magic at the start of every snapshot file ("DIVY").
pub const SNAPSHOT_MAGIC: [u8; 4] = [0x44, 0x49, 0x56, 0x59];

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;
