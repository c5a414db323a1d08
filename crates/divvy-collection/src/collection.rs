//! The dividend-paying collection contract.
//!
//! [`DividendPayingCollection`] wires the [`TokenRegistry`] to the
//! [`DividendEngine`] as its balance observer, pays withdrawals through a
//! [`ValueTransfer`] implementation, and keeps one ordered event log for both.

use divvy_core::error::{DividendError, RegistryError};
use divvy_core::events::Event;
use divvy_core::traits::{ShareRegistry, ValueTransfer};
use divvy_core::types::{Amount, HolderId, Shares, TokenId};
use divvy_dividend::DividendEngine;

use crate::registry::TokenRegistry;

/// Ownership registry, dividend engine, and payout channel behind one surface.
///
/// `caller` parameters are the authenticated identity of whoever invokes the
/// operation; authenticating them is the host's job.
#[derive(Debug, Clone)]
pub struct DividendPayingCollection<T: ValueTransfer> {
    registry: TokenRegistry,
    engine: DividendEngine,
    payout: T,
    events: Vec<Event>,
}

impl<T: ValueTransfer + Default> Default for DividendPayingCollection<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: ValueTransfer> DividendPayingCollection<T> {
    /// Create an empty collection paying withdrawals through `payout`.
    pub fn new(payout: T) -> Self {
        Self::from_parts(TokenRegistry::new(), DividendEngine::new(), payout, Vec::new())
    }

    /// Reassemble a collection from its parts.
    pub fn from_parts(
        registry: TokenRegistry,
        engine: DividendEngine,
        payout: T,
        events: Vec<Event>,
    ) -> Self {
        Self {
            registry,
            engine,
            payout,
            events,
        }
    }

    /// Split into `(registry, engine, payout, events)`.
    pub fn into_parts(self) -> (TokenRegistry, DividendEngine, T, Vec<Event>) {
        (self.registry, self.engine, self.payout, self.events)
    }

    // --- Token operations ---

    /// Mint `amount` tokens to `caller`.
    pub fn mint(
        &mut self,
        caller: &HolderId,
        amount: Shares,
    ) -> Result<Vec<TokenId>, RegistryError> {
        let minted = self.registry.mint(caller, amount, &mut self.engine)?;
        self.collect_events();
        Ok(minted)
    }

    pub fn transfer_from(
        &mut self,
        caller: &HolderId,
        from: &HolderId,
        to: &HolderId,
        token_id: TokenId,
    ) -> Result<(), RegistryError> {
        self.registry
            .transfer_from(caller, from, to, token_id, &mut self.engine)?;
        self.collect_events();
        Ok(())
    }

    pub fn approve(
        &mut self,
        caller: &HolderId,
        approved: &HolderId,
        token_id: TokenId,
    ) -> Result<(), RegistryError> {
        self.registry.approve(caller, approved, token_id)?;
        self.collect_events();
        Ok(())
    }

    pub fn set_approval_for_all(
        &mut self,
        caller: &HolderId,
        operator: &HolderId,
        approved: bool,
    ) -> Result<(), RegistryError> {
        self.registry.set_approval_for_all(caller, operator, approved)?;
        self.collect_events();
        Ok(())
    }

    // --- Dividend operations ---

    /// Distribute `amount` sent along with the call by `payer`.
    pub fn distribute_dividends(
        &mut self,
        payer: &HolderId,
        amount: Amount,
    ) -> Result<(), DividendError> {
        self.engine.distribute_dividends(payer, amount, &self.registry)?;
        self.collect_events();
        Ok(())
    }

    /// Plain value transfer to the collection; distributed like
    /// [`distribute_dividends`](Self::distribute_dividends).
    pub fn receive(&mut self, payer: &HolderId, amount: Amount) -> Result<(), DividendError> {
        self.engine.receive(payer, amount, &self.registry)?;
        self.collect_events();
        Ok(())
    }

    /// Pay `caller` their withdrawable dividend. Returns the amount paid.
    pub fn withdraw_dividend(&mut self, caller: &HolderId) -> Result<Amount, DividendError> {
        let paid = self
            .engine
            .withdraw_dividend(caller, &self.registry, &mut self.payout)?;
        self.collect_events();
        Ok(paid)
    }

    // --- Token queries ---

    pub fn balance_of(&self, holder: &HolderId) -> Shares {
        self.registry.balance_of(holder)
    }

    pub fn owner_of(&self, token_id: TokenId) -> Result<HolderId, RegistryError> {
        self.registry.owner_of(token_id)
    }

    pub fn total_supply(&self) -> Shares {
        self.registry.total_supply()
    }

    pub fn tokens_of(&self, holder: &HolderId) -> Vec<TokenId> {
        self.registry.tokens_of(holder)
    }

    pub fn get_approved(&self, token_id: TokenId) -> Result<Option<HolderId>, RegistryError> {
        self.registry.get_approved(token_id)
    }

    pub fn is_approved_for_all(&self, owner: &HolderId, operator: &HolderId) -> bool {
        self.registry.is_approved_for_all(owner, operator)
    }

    // --- Dividend queries ---

    pub fn accumulative_dividend_of(&self, holder: &HolderId) -> Amount {
        self.engine.accumulative_dividend_of(holder, &self.registry)
    }

    pub fn withdrawable_dividend_of(&self, holder: &HolderId) -> Amount {
        self.engine.withdrawable_dividend_of(holder, &self.registry)
    }

    pub fn dividend_of(&self, holder: &HolderId) -> Amount {
        self.engine.dividend_of(holder, &self.registry)
    }

    pub fn withdrawn_dividend_of(&self, holder: &HolderId) -> Amount {
        self.engine.withdrawn_dividend_of(holder)
    }

    pub fn vault(&self) -> Amount {
        self.engine.vault()
    }

    pub fn total_distributed(&self) -> Amount {
        self.engine.total_distributed()
    }

    // --- Parts ---

    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    pub fn engine(&self) -> &DividendEngine {
        &self.engine
    }

    pub fn payout(&self) -> &T {
        &self.payout
    }

    pub fn payout_mut(&mut self) -> &mut T {
        &mut self.payout
    }

    /// Every notification emitted so far, oldest first.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Take the event log, leaving it empty.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    fn collect_events(&mut self) {
        self.events.extend(self.registry.take_events());
        self.events.extend(self.engine.take_events());
    }
}
