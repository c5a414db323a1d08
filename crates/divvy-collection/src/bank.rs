//! In-memory external value ledger used as the payout channel.

use std::collections::{BTreeMap, BTreeSet};

use divvy_core::error::TransferError;
use divvy_core::traits::ValueTransfer;
use divvy_core::types::{Amount, HolderId};

/// External balances of every payout recipient.
///
/// Recipients can be flagged to refuse incoming value, standing in for
/// accounts whose receive hook fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct Bank {
    balances: BTreeMap<HolderId, Amount>,
    rejecting: BTreeSet<HolderId>,
    paid_out: Amount,
}

impl Bank {
    pub fn new() -> Self {
        Self::default()
    }

    /// External balance of `holder`.
    pub fn balance_of(&self, holder: &HolderId) -> Amount {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    /// Total value ever received through [`ValueTransfer::transfer`].
    pub fn paid_out(&self) -> Amount {
        self.paid_out
    }

    /// Make `holder` refuse (or accept again) incoming transfers.
    pub fn set_rejecting(&mut self, holder: &HolderId, rejecting: bool) {
        if rejecting {
            self.rejecting.insert(*holder);
        } else {
            self.rejecting.remove(holder);
        }
    }

    pub fn is_rejecting(&self, holder: &HolderId) -> bool {
        self.rejecting.contains(holder)
    }

    /// Every recipient with a non-zero balance, ascending.
    pub fn accounts(&self) -> impl Iterator<Item = (&HolderId, &Amount)> {
        self.balances.iter()
    }
}

impl ValueTransfer for Bank {
    fn transfer(&mut self, to: &HolderId, amount: Amount) -> Result<(), TransferError> {
        if to.is_zero() {
            return Err(TransferError::ZeroRecipient);
        }
        if self.rejecting.contains(to) {
            return Err(TransferError::Rejected(*to));
        }
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TransferError::BalanceOverflow(*to))?;
        let paid_out = self
            .paid_out
            .checked_add(amount)
            .ok_or(TransferError::BalanceOverflow(*to))?;
        self.balances.insert(*to, balance);
        self.paid_out = paid_out;
        Ok(())
    }
}
