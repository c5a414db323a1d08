//! Per-holder correction terms and withdrawn totals.
//!
//! A holder's lifetime earnings are
//!
//! ```text
//! accumulative = (mdps * balance + correction) / MAGNITUDE
//! ```
//!
//! which is linear in `(balance, correction)`. Subtracting `mdps * delta` from
//! the correction whenever the balance moves by `delta` therefore leaves the
//! numerator, and so the earnings, unchanged.
//!
//! Corrections are signed and stored as two's-complement [`U256`]. All
//! correction arithmetic wraps modulo 2^256. Wrapping is exact here: every
//! intermediate is a term of a sum whose true value (the numerator above) is a
//! non-negative number of at most `total_distributed * MAGNITUDE`. The
//! accumulator caps the lifetime total at `MAX_TOTAL_DISTRIBUTED`, which keeps
//! that bound below 2^255, so the wrapped result equals the true result once
//! all terms are added.

use std::collections::HashMap;

use divvy_core::constants::MAGNITUDE;
use divvy_core::error::DividendError;
use divvy_core::types::{Amount, HolderId, Shares};
use primitive_types::U256;

/// Two's-complement negation modulo 2^256.
pub(crate) fn negate(value: U256) -> U256 {
    (!value).overflowing_add(U256::one()).0
}

/// Whether `value` is negative when read as two's complement.
pub(crate) fn is_negative(value: U256) -> bool {
    value.bit(255)
}

/// `mdps * delta` modulo 2^256, for a signed share delta.
fn signed_product(mdps: U256, delta: i128) -> U256 {
    let product = mdps.overflowing_mul(U256::from(delta.unsigned_abs())).0;
    if delta < 0 { negate(product) } else { product }
}

/// Lifetime earnings of a holder with the given balance and correction.
///
/// A negative numerator can only come from a correction that was never
/// matched by a balance change; it reads as zero.
pub fn accumulative_dividend(mdps: U256, balance: Shares, correction: U256) -> Amount {
    let numerator = mdps
        .overflowing_mul(U256::from(balance))
        .0
        .overflowing_add(correction)
        .0;
    if is_negative(numerator) {
        return 0;
    }
    (numerator / MAGNITUDE).low_u128()
}

/// Accounting record of one holder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HolderAccount {
    /// Offset cancelling the accumulator's effect on non-distribution balance
    /// changes. Signed, two's complement.
    pub magnified_dividend_correction: U256,
    /// Value this holder has withdrawn so far. Never decreases.
    pub withdrawn_dividend: Amount,
}

impl HolderAccount {
    /// An all-zero account is indistinguishable from an absent one.
    pub fn is_empty(&self) -> bool {
        self.magnified_dividend_correction.is_zero() && self.withdrawn_dividend == 0
    }
}

/// Zero-default mapping from holder to [`HolderAccount`].
///
/// Entries are created on the first non-zero write and dropped again when
/// they return to all-zero, so `len()` counts only holders with state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrectionLedger {
    accounts: HashMap<HolderId, HolderAccount>,
}

impl CorrectionLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted accounts. Empty accounts are skipped.
    pub fn from_accounts(accounts: impl IntoIterator<Item = (HolderId, HolderAccount)>) -> Self {
        Self {
            accounts: accounts
                .into_iter()
                .filter(|(_, account)| !account.is_empty())
                .collect(),
        }
    }

    /// The account of `holder`, all-zero if never touched.
    pub fn account(&self, holder: &HolderId) -> HolderAccount {
        self.accounts.get(holder).copied().unwrap_or_default()
    }

    pub fn correction(&self, holder: &HolderId) -> U256 {
        self.account(holder).magnified_dividend_correction
    }

    pub fn withdrawn(&self, holder: &HolderId) -> Amount {
        self.account(holder).withdrawn_dividend
    }

    /// Number of holders with non-zero state.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Iterate over holders with non-zero state, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&HolderId, &HolderAccount)> {
        self.accounts.iter()
    }

    /// `correction -= mdps * delta` for a balance change of `delta` shares.
    pub fn apply_balance_change(&mut self, holder: &HolderId, delta: i128, mdps: U256) {
        if delta == 0 || mdps.is_zero() {
            return;
        }
        let term = signed_product(mdps, delta);
        self.update(holder, |account| {
            account.magnified_dividend_correction =
                account.magnified_dividend_correction.overflowing_sub(term).0;
        });
    }

    /// `withdrawn += amount`.
    pub fn record_withdrawal(
        &mut self,
        holder: &HolderId,
        amount: Amount,
    ) -> Result<(), DividendError> {
        let withdrawn = self
            .withdrawn(holder)
            .checked_add(amount)
            .ok_or(DividendError::ArithmeticOverflow)?;
        self.update(holder, |account| account.withdrawn_dividend = withdrawn);
        Ok(())
    }

    /// Put back a previously read account verbatim (payout rollback).
    pub fn restore(&mut self, holder: &HolderId, account: HolderAccount) {
        self.update(holder, |current| *current = account);
    }

    fn update(&mut self, holder: &HolderId, f: impl FnOnce(&mut HolderAccount)) {
        let mut account = self.account(holder);
        f(&mut account);
        if account.is_empty() {
            self.accounts.remove(holder);
        } else {
            self.accounts.insert(*holder, account);
        }
    }
}
