//! Global per-share accumulator and vault.

use divvy_core::constants::{MAGNITUDE, MAX_TOTAL_DISTRIBUTED};
use divvy_core::error::DividendError;
use divvy_core::types::{Amount, Shares};
use primitive_types::U256;

/// Magnified per-share increment for distributing `amount` over `total_shares`.
///
/// Computes `amount * MAGNITUDE / total_shares` with floor division. The
/// remainder (below `1 / MAGNITUDE` units per share) is forfeited.
pub fn per_share_increment(amount: Amount, total_shares: Shares) -> Result<U256, DividendError> {
    if total_shares == 0 {
        return Err(DividendError::NoShares);
    }
    U256::from(amount)
        .checked_mul(MAGNITUDE)
        .ok_or(DividendError::ArithmeticOverflow)?
        .checked_div(U256::from(total_shares))
        .ok_or(DividendError::ArithmeticOverflow)
}

/// The singleton accounting state shared by all holders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accumulator {
    /// Sum of all per-share increments, scaled by `MAGNITUDE`. Never decreases.
    magnified_dividend_per_share: U256,
    /// Value held for holders and not yet withdrawn.
    vault: Amount,
    /// Value ever distributed. At most [`MAX_TOTAL_DISTRIBUTED`].
    total_distributed: Amount,
}

impl Accumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an accumulator from persisted parts.
    pub fn from_parts(
        magnified_dividend_per_share: U256,
        vault: Amount,
        total_distributed: Amount,
    ) -> Self {
        Self {
            magnified_dividend_per_share,
            vault,
            total_distributed,
        }
    }

    pub fn magnified_dividend_per_share(&self) -> U256 {
        self.magnified_dividend_per_share
    }

    pub fn vault(&self) -> Amount {
        self.vault
    }

    pub fn total_distributed(&self) -> Amount {
        self.total_distributed
    }

    /// Apply one distribution event.
    ///
    /// Returns `Ok(false)` for a zero amount (nothing changes). Fails with
    /// [`DividendError::NoShares`] when `total_shares` is zero, whatever the
    /// amount, and with [`DividendError::ArithmeticOverflow`] if the lifetime
    /// total would pass [`MAX_TOTAL_DISTRIBUTED`] or any other total would
    /// leave its range. On error no field is modified.
    pub fn distribute(
        &mut self,
        amount: Amount,
        total_shares: Shares,
    ) -> Result<bool, DividendError> {
        let increment = per_share_increment(amount, total_shares)?;
        if amount == 0 {
            return Ok(false);
        }

        let total = self
            .total_distributed
            .checked_add(amount)
            .filter(|total| *total <= MAX_TOTAL_DISTRIBUTED)
            .ok_or(DividendError::ArithmeticOverflow)?;
        let mdps = self
            .magnified_dividend_per_share
            .checked_add(increment)
            .ok_or(DividendError::ArithmeticOverflow)?;
        let vault = self
            .vault
            .checked_add(amount)
            .ok_or(DividendError::ArithmeticOverflow)?;

        self.magnified_dividend_per_share = mdps;
        self.vault = vault;
        self.total_distributed = total;
        Ok(true)
    }

    /// Remove `amount` from the vault for a withdrawal.
    pub(crate) fn debit_vault(&mut self, amount: Amount) -> Result<(), DividendError> {
        self.vault = self
            .vault
            .checked_sub(amount)
            .ok_or(DividendError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Reset the vault to a previously observed value (payout rollback).
    pub(crate) fn restore_vault(&mut self, vault: Amount) {
        self.vault = vault;
    }
}
