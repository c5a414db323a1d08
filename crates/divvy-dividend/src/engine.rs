//! Dividend engine implementing the [`BalanceObserver`] trait.
//!
//! [`DividendEngine`] is the explicit context object holding the global
//! accumulator and every holder account. The ownership registry feeds it
//! balance changes; distributions and withdrawals read the registry for the
//! denominator and the holder's current balance.

use divvy_core::error::DividendError;
use divvy_core::events::Event;
use divvy_core::traits::{BalanceObserver, ShareRegistry, ValueTransfer};
use divvy_core::types::{Amount, HolderId};
use primitive_types::U256;
use tracing::{debug, info, warn};

use crate::accumulator::Accumulator;
use crate::ledger::{CorrectionLedger, HolderAccount, accumulative_dividend};

/// Accumulator, correction ledger, and pending notifications.
///
/// Every method runs to completion under `&mut self`, so operations are
/// serialized and the payout call inside [`withdraw_dividend`](Self::withdraw_dividend)
/// cannot re-enter the engine.
#[derive(Debug, Clone, Default)]
pub struct DividendEngine {
    accumulator: Accumulator,
    ledger: CorrectionLedger,
    pending_events: Vec<Event>,
}

impl DividendEngine {
    /// Create an engine with no distributions and no holder state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an engine from persisted state.
    pub fn from_parts(accumulator: Accumulator, ledger: CorrectionLedger) -> Self {
        Self {
            accumulator,
            ledger,
            pending_events: Vec::new(),
        }
    }

    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    pub fn ledger(&self) -> &CorrectionLedger {
        &self.ledger
    }

    // --- Distribution ---

    /// Explicit distribution of `amount` paid in by `payer`.
    pub fn distribute_dividends<R: ShareRegistry + ?Sized>(
        &mut self,
        payer: &HolderId,
        amount: Amount,
        registry: &R,
    ) -> Result<(), DividendError> {
        self.distribute(payer, amount, registry)
    }

    /// Value arriving through a plain transfer to the contract.
    ///
    /// Same semantics and preconditions as [`distribute_dividends`](Self::distribute_dividends).
    pub fn receive<R: ShareRegistry + ?Sized>(
        &mut self,
        payer: &HolderId,
        amount: Amount,
        registry: &R,
    ) -> Result<(), DividendError> {
        self.distribute(payer, amount, registry)
    }

    fn distribute<R: ShareRegistry + ?Sized>(
        &mut self,
        payer: &HolderId,
        amount: Amount,
        registry: &R,
    ) -> Result<(), DividendError> {
        let total_shares = registry.total_shares();
        if !self.accumulator.distribute(amount, total_shares)? {
            return Ok(());
        }
        info!(
            payer = %payer,
            amount = %amount,
            total_shares,
            vault = %self.accumulator.vault(),
            "dividends distributed"
        );
        self.pending_events.push(Event::DividendsDistributed {
            payer: *payer,
            amount,
        });
        Ok(())
    }

    // --- Withdrawal ---

    /// Pay `holder` everything they can currently withdraw.
    ///
    /// The withdrawn total and the vault are debited before `payout` is
    /// called. If the payout fails both are restored and
    /// [`DividendError::TransferFailed`] is returned. Returns the amount
    /// paid, zero when nothing is owed.
    pub fn withdraw_dividend<R, T>(
        &mut self,
        holder: &HolderId,
        registry: &R,
        payout: &mut T,
    ) -> Result<Amount, DividendError>
    where
        R: ShareRegistry + ?Sized,
        T: ValueTransfer + ?Sized,
    {
        let owed = self.withdrawable_dividend_of(holder, registry);
        if owed == 0 {
            return Ok(0);
        }

        let prior_account = self.ledger.account(holder);
        let prior_vault = self.accumulator.vault();

        self.ledger.record_withdrawal(holder, owed)?;
        if let Err(e) = self.accumulator.debit_vault(owed) {
            self.ledger.restore(holder, prior_account);
            return Err(e);
        }

        if let Err(source) = payout.transfer(holder, owed) {
            warn!(
                holder = %holder,
                amount = %owed,
                error = %source,
                "dividend payout failed, rolled back"
            );
            self.ledger.restore(holder, prior_account);
            self.accumulator.restore_vault(prior_vault);
            return Err(DividendError::TransferFailed {
                holder: *holder,
                amount: owed,
                source,
            });
        }

        info!(
            holder = %holder,
            amount = %owed,
            vault = %self.accumulator.vault(),
            "dividend withdrawn"
        );
        self.pending_events.push(Event::DividendWithdrawn {
            holder: *holder,
            amount: owed,
        });
        Ok(owed)
    }

    // --- Queries ---

    /// Everything `holder` has ever earned, withdrawn or not.
    pub fn accumulative_dividend_of<R>(&self, holder: &HolderId, registry: &R) -> Amount
    where
        R: ShareRegistry + ?Sized,
    {
        accumulative_dividend(
            self.accumulator.magnified_dividend_per_share(),
            registry.balance_of(holder),
            self.ledger.correction(holder),
        )
    }

    /// Earned but not yet withdrawn.
    pub fn withdrawable_dividend_of<R>(&self, holder: &HolderId, registry: &R) -> Amount
    where
        R: ShareRegistry + ?Sized,
    {
        self.accumulative_dividend_of(holder, registry)
            .saturating_sub(self.ledger.withdrawn(holder))
    }

    /// Alias of [`withdrawable_dividend_of`](Self::withdrawable_dividend_of).
    pub fn dividend_of<R>(&self, holder: &HolderId, registry: &R) -> Amount
    where
        R: ShareRegistry + ?Sized,
    {
        self.withdrawable_dividend_of(holder, registry)
    }

    pub fn withdrawn_dividend_of(&self, holder: &HolderId) -> Amount {
        self.ledger.withdrawn(holder)
    }

    pub fn vault(&self) -> Amount {
        self.accumulator.vault()
    }

    pub fn total_distributed(&self) -> Amount {
        self.accumulator.total_distributed()
    }

    pub fn magnified_dividend_per_share(&self) -> U256 {
        self.accumulator.magnified_dividend_per_share()
    }

    pub fn account(&self, holder: &HolderId) -> HolderAccount {
        self.ledger.account(holder)
    }

    // --- Notifications ---

    /// Notifications emitted since the last call, oldest first.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.pending_events)
    }
}

impl BalanceObserver for DividendEngine {
    fn on_balance_changed(&mut self, holder: &HolderId, delta: i128) {
        let mdps = self.accumulator.magnified_dividend_per_share();
        self.ledger.apply_balance_change(holder, delta, mdps);
        debug!(holder = %holder, delta = %delta, "dividend correction updated");
    }
}
