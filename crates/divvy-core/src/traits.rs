//! Trait interfaces for the Divvy engine.
//!
//! These traits define the contracts between crates:
//! - [`ShareRegistry`]: read-only view of who owns how many shares (divvy-collection implements)
//! - [`BalanceObserver`]: balance-change hook (divvy-dividend implements)
//! - [`ValueTransfer`]: outbound payout channel (divvy-collection implements)

use crate::error::TransferError;
use crate::types::{Amount, HolderId, Shares};

/// Read-only view of the ownership registry.
///
/// The dividend engine never iterates holders; it only needs the
/// distribution denominator and the balance of the holder being queried.
pub trait ShareRegistry: Send + Sync {
    /// Total number of shares in existence.
    fn total_shares(&self) -> Shares;

    /// Number of shares currently owned by `holder`. Zero for unknown holders.
    fn balance_of(&self, holder: &HolderId) -> Shares;
}

/// Hook invoked by the ownership registry after it has validated and applied
/// a balance change.
///
/// The registry calls this once per affected holder with the net delta of the
/// operation: `+n` for a mint of `n` tokens, `-n`/`+n` for the two sides of a
/// transfer. Implementations must not fail.
pub trait BalanceObserver {
    /// `holder`'s balance changed by `delta` shares.
    fn on_balance_changed(&mut self, holder: &HolderId, delta: i128);

    /// `count` shares were minted to `to`.
    ///
    /// Default implementation: a single `+count` change.
    fn on_mint(&mut self, to: &HolderId, count: Shares) {
        self.on_balance_changed(to, i128::from(count));
    }

    /// `count` shares moved from `from` to `to`.
    ///
    /// Default implementation: `-count` on the sender, then `+count` on the recipient.
    fn on_transfer(&mut self, from: &HolderId, to: &HolderId, count: Shares) {
        self.on_balance_changed(from, -i128::from(count));
        self.on_balance_changed(to, i128::from(count));
    }
}

/// Outbound value channel used to pay withdrawn dividends.
///
/// A failed transfer must leave the implementation's own state untouched.
pub trait ValueTransfer: Send {
    /// Move `amount` units to `to`.
    fn transfer(&mut self, to: &HolderId, amount: Amount) -> Result<(), TransferError>;
}
