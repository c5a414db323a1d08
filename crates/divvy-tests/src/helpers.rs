//! Shared helpers for the integration tests.

use std::collections::BTreeMap;

use divvy_collection::{Bank, DividendPayingCollection};
use divvy_core::constants::COIN;
use divvy_core::types::{Amount, HolderId, Shares};

/// Holder identity from a seed byte.
pub fn holder(seed: u8) -> HolderId {
    HolderId([seed; 20])
}

/// `n` whole coins in base units.
pub fn coins(n: u128) -> Amount {
    n * COIN
}

/// Empty collection paying into a fresh [`Bank`].
pub fn fresh() -> DividendPayingCollection<Bank> {
    DividendPayingCollection::new(Bank::new())
}

/// Naive O(n) dividend bookkeeping: every distribution is credited to every
/// holder immediately.
///
/// Exact only when each distributed amount divides evenly by the supply.
#[derive(Debug, Default, Clone)]
pub struct ReferenceModel {
    balances: BTreeMap<HolderId, Shares>,
    earned: BTreeMap<HolderId, Amount>,
    withdrawn: BTreeMap<HolderId, Amount>,
}

impl ReferenceModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn supply(&self) -> Shares {
        self.balances.values().sum()
    }

    pub fn mint(&mut self, to: &HolderId, count: Shares) {
        *self.balances.entry(*to).or_default() += count;
    }

    pub fn transfer(&mut self, from: &HolderId, to: &HolderId, count: Shares) {
        let from_balance = self.balances.entry(*from).or_default();
        assert!(*from_balance >= count, "model transfer exceeds balance");
        *from_balance -= count;
        *self.balances.entry(*to).or_default() += count;
    }

    pub fn distribute(&mut self, amount: Amount) {
        let supply = self.supply() as Amount;
        assert!(supply > 0, "model distribution with no supply");
        for (holder, balance) in &self.balances {
            *self.earned.entry(*holder).or_default() += amount * (*balance as Amount) / supply;
        }
    }

    pub fn withdraw(&mut self, holder: &HolderId) -> Amount {
        let owed = self.withdrawable(holder);
        *self.withdrawn.entry(*holder).or_default() += owed;
        owed
    }

    pub fn balance(&self, holder: &HolderId) -> Shares {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    pub fn accumulative(&self, holder: &HolderId) -> Amount {
        self.earned.get(holder).copied().unwrap_or(0)
    }

    pub fn withdrawn(&self, holder: &HolderId) -> Amount {
        self.withdrawn.get(holder).copied().unwrap_or(0)
    }

    pub fn withdrawable(&self, holder: &HolderId) -> Amount {
        self.accumulative(holder) - self.withdrawn(holder)
    }
}

/// Assert accumulative, withdrawable and withdrawn dividends of `holder`.
#[track_caller]
pub fn assert_dividends(
    collection: &DividendPayingCollection<Bank>,
    holder: &HolderId,
    accumulative: Amount,
    withdrawable: Amount,
    withdrawn: Amount,
) {
    let earned = collection.accumulative_dividend_of(holder);
    assert_eq!(earned, accumulative, "accumulative of {holder}");
    let owed = collection.withdrawable_dividend_of(holder);
    assert_eq!(owed, withdrawable, "withdrawable of {holder}");
    assert_eq!(collection.dividend_of(holder), withdrawable, "dividend_of of {holder}");
    assert_eq!(collection.withdrawn_dividend_of(holder), withdrawn, "withdrawn of {holder}");
}
