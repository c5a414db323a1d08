//! Thread-safe handle to a collection.
//!
//! Every operation takes the lock for its whole duration, so each one is
//! atomic with respect to the others. The payout transfer inside a
//! withdrawal runs while the lock is held and cannot re-enter the handle.

use std::sync::Arc;

use parking_lot::Mutex;

use divvy_core::error::{DividendError, RegistryError};
use divvy_core::traits::ValueTransfer;
use divvy_core::types::{Amount, HolderId, Shares, TokenId};

use crate::collection::DividendPayingCollection;
use crate::storage::Snapshot;

/// Cloneable, lock-protected [`DividendPayingCollection`].
pub struct SharedCollection<T: ValueTransfer> {
    inner: Arc<Mutex<DividendPayingCollection<T>>>,
}

impl<T: ValueTransfer> Clone for SharedCollection<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: ValueTransfer> SharedCollection<T> {
    pub fn new(collection: DividendPayingCollection<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(collection)),
        }
    }

    /// Run `f` with exclusive access to the collection.
    pub fn with<R>(&self, f: impl FnOnce(&mut DividendPayingCollection<T>) -> R) -> R {
        f(&mut *self.inner.lock())
    }

    pub fn mint(&self, caller: &HolderId, amount: Shares) -> Result<Vec<TokenId>, RegistryError> {
        self.inner.lock().mint(caller, amount)
    }

    pub fn transfer_from(
        &self,
        caller: &HolderId,
        from: &HolderId,
        to: &HolderId,
        token_id: TokenId,
    ) -> Result<(), RegistryError> {
        self.inner.lock().transfer_from(caller, from, to, token_id)
    }

    pub fn distribute_dividends(
        &self,
        payer: &HolderId,
        amount: Amount,
    ) -> Result<(), DividendError> {
        self.inner.lock().distribute_dividends(payer, amount)
    }

    pub fn receive(&self, payer: &HolderId, amount: Amount) -> Result<(), DividendError> {
        self.inner.lock().receive(payer, amount)
    }

    pub fn withdraw_dividend(&self, caller: &HolderId) -> Result<Amount, DividendError> {
        self.inner.lock().withdraw_dividend(caller)
    }

    pub fn balance_of(&self, holder: &HolderId) -> Shares {
        self.inner.lock().balance_of(holder)
    }

    pub fn withdrawable_dividend_of(&self, holder: &HolderId) -> Amount {
        self.inner.lock().withdrawable_dividend_of(holder)
    }

    pub fn vault(&self) -> Amount {
        self.inner.lock().vault()
    }

    /// Consistent point-in-time snapshot.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&*self.inner.lock())
    }

    /// Recover the collection if this is the last handle.
    pub fn try_unwrap(self) -> Result<DividendPayingCollection<T>, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::Bank;
    use divvy_core::constants::COIN;
    use std::thread;

    fn holder(seed: u8) -> HolderId {
        HolderId([seed; 20])
    }

    #[test]
    fn concurrent_distributions_and_withdrawals_conserve_value() {
        let shared = SharedCollection::new(DividendPayingCollection::new(Bank::new()));
        for seed in 1..=4 {
            shared.mint(&holder(seed), 1).unwrap();
        }

        let handles: Vec<_> = (1..=4u8)
            .map(|seed| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        shared.distribute_dividends(&holder(100), 4 * COIN).unwrap();
                        shared.withdraw_dividend(&holder(seed)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let collection = shared.try_unwrap().ok().unwrap();
        let paid = collection.payout().paid_out();
        assert_eq!(collection.total_distributed(), 400 * COIN);
        assert_eq!(paid + collection.vault(), 400 * COIN);
        let owed: Amount = (1..=4)
            .map(|seed| collection.withdrawable_dividend_of(&holder(seed)))
            .sum();
        assert_eq!(owed, collection.vault());
    }

    #[test]
    fn with_gives_exclusive_access() {
        let shared = SharedCollection::new(DividendPayingCollection::new(Bank::new()));
        shared.mint(&holder(1), 2).unwrap();
        shared.with(|c| c.payout_mut().set_rejecting(&holder(1), true));
        shared.distribute_dividends(&holder(9), COIN).unwrap();

        assert!(matches!(
            shared.withdraw_dividend(&holder(1)),
            Err(DividendError::TransferFailed { .. })
        ));
        assert_eq!(shared.withdrawable_dividend_of(&holder(1)), COIN);
        assert_eq!(shared.vault(), COIN);
    }

    #[test]
    fn snapshot_matches_locked_state() {
        let shared = SharedCollection::new(DividendPayingCollection::new(Bank::new()));
        shared.mint(&holder(1), 1).unwrap();
        shared.receive(&holder(2), COIN).unwrap();
        let snapshot = shared.snapshot();
        assert_eq!(snapshot.vault, COIN);
        assert_eq!(snapshot.owners, vec![(TokenId(1), holder(1))]);
    }

    #[test]
    fn try_unwrap_fails_while_shared() {
        let shared = SharedCollection::new(DividendPayingCollection::new(Bank::new()));
        let other = shared.clone();
        let shared = shared.try_unwrap().err().unwrap();
        drop(other);
        assert!(shared.try_unwrap().is_ok());
    }
}
