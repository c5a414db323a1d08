//! In-memory ownership registry of indivisible tokens.
//!
//! Tracks who owns each token, per-token approvals, and operator approvals.
//! Every mutation is fully validated before any state changes, then the
//! [`BalanceObserver`] is notified with the net balance change of each side.
//!
//! Token ids are sequential, starting at [`FIRST_TOKEN_ID`].

use std::collections::{BTreeMap, BTreeSet, HashMap};

use divvy_core::constants::FIRST_TOKEN_ID;
use divvy_core::error::RegistryError;
use divvy_core::events::Event;
use divvy_core::traits::{BalanceObserver, ShareRegistry};
use divvy_core::types::{HolderId, Shares, TokenId};
use tracing::debug;

/// Ownership ledger implementing [`ShareRegistry`].
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    /// Token → current owner.
    owners: BTreeMap<TokenId, HolderId>,
    /// Holder → number of tokens owned. Holders with zero are absent.
    balances: HashMap<HolderId, Shares>,
    /// Token → address allowed to move it. Cleared on every transfer.
    token_approvals: BTreeMap<TokenId, HolderId>,
    /// `(owner, operator)` pairs where the operator may move all of the owner's tokens.
    operator_approvals: BTreeSet<(HolderId, HolderId)>,
    /// Id the next minted token receives.
    next_token_id: u64,
    pending_events: Vec<Event>,
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            owners: BTreeMap::new(),
            balances: HashMap::new(),
            token_approvals: BTreeMap::new(),
            operator_approvals: BTreeSet::new(),
            next_token_id: FIRST_TOKEN_ID,
            pending_events: Vec::new(),
        }
    }

    /// Rebuild a registry from persisted state.
    ///
    /// Balances are recomputed from the owner table. Fails if an owner is the
    /// zero identity or a token id is at or beyond `next_token_id`.
    pub fn from_parts(
        next_token_id: u64,
        owners: impl IntoIterator<Item = (TokenId, HolderId)>,
        token_approvals: impl IntoIterator<Item = (TokenId, HolderId)>,
        operator_approvals: impl IntoIterator<Item = (HolderId, HolderId)>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.next_token_id = next_token_id.max(FIRST_TOKEN_ID);
        for (token_id, owner) in owners {
            if owner.is_zero() {
                return Err(RegistryError::MintToZeroAddress);
            }
            if token_id.0 < FIRST_TOKEN_ID || token_id.0 >= registry.next_token_id {
                return Err(RegistryError::NonexistentToken(token_id));
            }
            registry.owners.insert(token_id, owner);
            *registry.balances.entry(owner).or_default() += 1;
        }
        for (token_id, approved) in token_approvals {
            if !registry.owners.contains_key(&token_id) {
                return Err(RegistryError::NonexistentToken(token_id));
            }
            registry.token_approvals.insert(token_id, approved);
        }
        registry.operator_approvals.extend(operator_approvals);
        Ok(registry)
    }

    // --- Mutations ---

    /// Mint `amount` new tokens to `to`.
    ///
    /// Returns the ids assigned, in order. The observer sees a single `+amount`.
    pub fn mint<O: BalanceObserver + ?Sized>(
        &mut self,
        to: &HolderId,
        amount: Shares,
        observer: &mut O,
    ) -> Result<Vec<TokenId>, RegistryError> {
        if amount == 0 {
            return Err(RegistryError::InvalidAmount);
        }
        if to.is_zero() {
            return Err(RegistryError::MintToZeroAddress);
        }
        let end = self
            .next_token_id
            .checked_add(amount)
            .ok_or(RegistryError::TokenIdOverflow)?;
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(RegistryError::TokenIdOverflow)?;

        let minted: Vec<TokenId> = (self.next_token_id..end).map(TokenId).collect();
        for token_id in &minted {
            self.owners.insert(*token_id, *to);
            self.pending_events.push(Event::Transfer {
                from: HolderId::ZERO,
                to: *to,
                token_id: *token_id,
            });
        }
        self.balances.insert(*to, balance);
        self.next_token_id = end;

        debug!(to = %to, amount, first = self.next_token_id - amount, "tokens minted");
        observer.on_mint(to, amount);
        Ok(minted)
    }

    /// Move `token_id` from `from` to `to` on behalf of `caller`.
    ///
    /// `caller` must own the token, be approved for it, or be an operator of
    /// the owner.
    pub fn transfer_from<O: BalanceObserver + ?Sized>(
        &mut self,
        caller: &HolderId,
        from: &HolderId,
        to: &HolderId,
        token_id: TokenId,
        observer: &mut O,
    ) -> Result<(), RegistryError> {
        let owner = self.owner_of(token_id)?;
        if !self.is_approved_or_owner(caller, &owner, token_id) {
            return Err(RegistryError::NotOwnerNorApproved);
        }
        if owner != *from {
            return Err(RegistryError::IncorrectOwner {
                token_id,
                from: *from,
            });
        }
        if to.is_zero() {
            return Err(RegistryError::TransferToZeroAddress);
        }

        self.token_approvals.remove(&token_id);
        self.decrement(from);
        *self.balances.entry(*to).or_default() += 1;
        self.owners.insert(token_id, *to);
        self.pending_events.push(Event::Transfer {
            from: *from,
            to: *to,
            token_id,
        });

        debug!(from = %from, to = %to, token = %token_id, "token transferred");
        observer.on_transfer(from, to, 1);
        Ok(())
    }

    /// Let `approved` move `token_id`. The zero identity clears the approval.
    pub fn approve(
        &mut self,
        caller: &HolderId,
        approved: &HolderId,
        token_id: TokenId,
    ) -> Result<(), RegistryError> {
        let owner = self.owner_of(token_id)?;
        if *approved == owner {
            return Err(RegistryError::ApprovalToCurrentOwner);
        }
        if *caller != owner && !self.is_approved_for_all(&owner, caller) {
            return Err(RegistryError::ApproveNotOwnerNorApprovedForAll);
        }

        if approved.is_zero() {
            self.token_approvals.remove(&token_id);
        } else {
            self.token_approvals.insert(token_id, *approved);
        }
        self.pending_events.push(Event::Approval {
            owner,
            approved: *approved,
            token_id,
        });
        Ok(())
    }

    /// Grant or revoke `operator` control over all of `owner`'s tokens.
    pub fn set_approval_for_all(
        &mut self,
        owner: &HolderId,
        operator: &HolderId,
        approved: bool,
    ) -> Result<(), RegistryError> {
        if owner == operator {
            return Err(RegistryError::ApproveToCaller);
        }
        if approved {
            self.operator_approvals.insert((*owner, *operator));
        } else {
            self.operator_approvals.remove(&(*owner, *operator));
        }
        self.pending_events.push(Event::ApprovalForAll {
            owner: *owner,
            operator: *operator,
            approved,
        });
        Ok(())
    }

    // --- Queries ---

    pub fn owner_of(&self, token_id: TokenId) -> Result<HolderId, RegistryError> {
        self.owners
            .get(&token_id)
            .copied()
            .ok_or(RegistryError::NonexistentToken(token_id))
    }

    pub fn get_approved(&self, token_id: TokenId) -> Result<Option<HolderId>, RegistryError> {
        self.owner_of(token_id)?;
        Ok(self.token_approvals.get(&token_id).copied())
    }

    pub fn is_approved_for_all(&self, owner: &HolderId, operator: &HolderId) -> bool {
        self.operator_approvals.contains(&(*owner, *operator))
    }

    /// Number of tokens in existence.
    pub fn total_supply(&self) -> Shares {
        self.owners.len() as Shares
    }

    pub fn next_token_id(&self) -> u64 {
        self.next_token_id
    }

    /// Tokens owned by `holder`, ascending. Scans the owner table.
    pub fn tokens_of(&self, holder: &HolderId) -> Vec<TokenId> {
        self.owners
            .iter()
            .filter(|(_, owner)| *owner == holder)
            .map(|(token_id, _)| *token_id)
            .collect()
    }

    /// Every holder with a non-zero balance, ascending.
    pub fn holders(&self) -> Vec<HolderId> {
        let mut holders: Vec<HolderId> = self.balances.keys().copied().collect();
        holders.sort();
        holders
    }

    pub fn owners(&self) -> impl Iterator<Item = (&TokenId, &HolderId)> {
        self.owners.iter()
    }

    pub fn token_approvals(&self) -> impl Iterator<Item = (&TokenId, &HolderId)> {
        self.token_approvals.iter()
    }

    pub fn operator_approvals(&self) -> impl Iterator<Item = &(HolderId, HolderId)> {
        self.operator_approvals.iter()
    }

    /// Notifications emitted since the last call, oldest first.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.pending_events)
    }

    // --- Internals ---

    fn is_approved_or_owner(
        &self,
        spender: &HolderId,
        owner: &HolderId,
        token_id: TokenId,
    ) -> bool {
        spender == owner
            || self.token_approvals.get(&token_id) == Some(spender)
            || self.is_approved_for_all(owner, spender)
    }

    fn decrement(&mut self, holder: &HolderId) {
        match self.balances.get_mut(holder) {
            Some(balance) if *balance > 1 => *balance -= 1,
            _ => {
                self.balances.remove(holder);
            }
        }
    }
}

impl ShareRegistry for TokenRegistry {
    fn total_shares(&self) -> Shares {
        self.total_supply()
    }

    fn balance_of(&self, holder: &HolderId) -> Shares {
        self.balances.get(holder).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<(HolderId, i128)>,
    }

    impl BalanceObserver for Recorder {
        fn on_balance_changed(&mut self, holder: &HolderId, delta: i128) {
            self.calls.push((*holder, delta));
        }
    }

    fn holder(seed: u8) -> HolderId {
        HolderId([seed; 20])
    }

    fn with_tokens(owner: HolderId, n: Shares) -> (TokenRegistry, Recorder) {
        let mut reg = TokenRegistry::new();
        let mut rec = Recorder::default();
        reg.mint(&owner, n, &mut rec).unwrap();
        reg.take_events();
        rec.calls.clear();
        (reg, rec)
    }

    // --- mint ---

    #[test]
    fn mint_zero_is_invalid() {
        let mut reg = TokenRegistry::new();
        let mut rec = Recorder::default();
        assert_eq!(reg.mint(&holder(1), 0, &mut rec), Err(RegistryError::InvalidAmount));
        assert!(rec.calls.is_empty());
        assert_eq!(reg.total_supply(), 0);
    }

    #[test]
    fn mint_to_zero_address_is_rejected() {
        let mut reg = TokenRegistry::new();
        let mut rec = Recorder::default();
        assert_eq!(reg.mint(&HolderId::ZERO, 1, &mut rec), Err(RegistryError::MintToZeroAddress));
        assert!(reg.take_events().is_empty());
    }

    #[test]
    fn mint_assigns_sequential_ids() {
        let mut reg = TokenRegistry::new();
        let mut rec = Recorder::default();
        assert_eq!(reg.mint(&holder(1), 2, &mut rec).unwrap(), vec![TokenId(1), TokenId(2)]);
        assert_eq!(reg.mint(&holder(2), 1, &mut rec).unwrap(), vec![TokenId(3)]);
        assert_eq!(reg.balance_of(&holder(1)), 2);
        assert_eq!(reg.owner_of(TokenId(3)), Ok(holder(2)));
        assert_eq!(reg.total_supply(), 3);
        assert_eq!(reg.next_token_id(), 4);
    }

    #[test]
    fn mint_notifies_once_with_net_delta() {
        let mut reg = TokenRegistry::new();
        let mut rec = Recorder::default();
        reg.mint(&holder(1), 3, &mut rec).unwrap();
        assert_eq!(rec.calls, vec![(holder(1), 3)]);
    }

    #[test]
    fn mint_emits_transfer_from_zero_per_token() {
        let mut reg = TokenRegistry::new();
        let mut rec = Recorder::default();
        reg.mint(&holder(1), 2, &mut rec).unwrap();
        assert_eq!(
            reg.take_events(),
            vec![
                Event::Transfer { from: HolderId::ZERO, to: holder(1), token_id: TokenId(1) },
                Event::Transfer { from: HolderId::ZERO, to: holder(1), token_id: TokenId(2) },
            ]
        );
    }

    #[test]
    fn mint_rejects_id_overflow() {
        let mut reg = TokenRegistry::from_parts(u64::MAX, [], [], []).unwrap();
        let mut rec = Recorder::default();
        assert_eq!(reg.mint(&holder(1), 1, &mut rec), Err(RegistryError::TokenIdOverflow));
    }

    // --- transfer_from ---

    #[test]
    fn owner_can_transfer() {
        let (mut reg, mut rec) = with_tokens(holder(1), 1);
        reg.transfer_from(&holder(1), &holder(1), &holder(2), TokenId(1), &mut rec).unwrap();
        assert_eq!(reg.balance_of(&holder(1)), 0);
        assert_eq!(reg.balance_of(&holder(2)), 1);
        assert_eq!(reg.owner_of(TokenId(1)), Ok(holder(2)));
        assert_eq!(rec.calls, vec![(holder(1), -1), (holder(2), 1)]);
        assert_eq!(
            reg.take_events(),
            vec![Event::Transfer { from: holder(1), to: holder(2), token_id: TokenId(1) }]
        );
        assert_eq!(reg.holders(), vec![holder(2)]);
    }

    #[test]
    fn transfer_to_zero_address_is_rejected() {
        let (mut reg, mut rec) = with_tokens(holder(1), 1);
        assert_eq!(
            reg.transfer_from(&holder(1), &holder(1), &HolderId::ZERO, TokenId(1), &mut rec),
            Err(RegistryError::TransferToZeroAddress)
        );
        assert!(rec.calls.is_empty());
        assert_eq!(reg.owner_of(TokenId(1)), Ok(holder(1)));
    }

    #[test]
    fn stranger_cannot_transfer() {
        let (mut reg, mut rec) = with_tokens(holder(1), 1);
        assert_eq!(
            reg.transfer_from(&holder(2), &holder(2), &holder(3), TokenId(1), &mut rec),
            Err(RegistryError::NotOwnerNorApproved)
        );
        assert!(rec.calls.is_empty());
    }

    #[test]
    fn transfer_of_missing_token_fails() {
        let (mut reg, mut rec) = with_tokens(holder(1), 1);
        assert_eq!(
            reg.transfer_from(&holder(1), &holder(1), &holder(2), TokenId(9), &mut rec),
            Err(RegistryError::NonexistentToken(TokenId(9)))
        );
    }

    #[test]
    fn wrong_from_is_rejected() {
        let (mut reg, mut rec) = with_tokens(holder(1), 1);
        reg.set_approval_for_all(&holder(1), &holder(2), true).unwrap();
        assert_eq!(
            reg.transfer_from(&holder(2), &holder(3), &holder(4), TokenId(1), &mut rec),
            Err(RegistryError::IncorrectOwner { token_id: TokenId(1), from: holder(3) })
        );
    }

    #[test]
    fn approved_spender_can_transfer_once() {
        let (mut reg, mut rec) = with_tokens(holder(1), 1);
        reg.approve(&holder(1), &holder(2), TokenId(1)).unwrap();
        assert_eq!(reg.get_approved(TokenId(1)), Ok(Some(holder(2))));

        reg.transfer_from(&holder(2), &holder(1), &holder(3), TokenId(1), &mut rec).unwrap();
        assert_eq!(reg.get_approved(TokenId(1)), Ok(None));
        assert_eq!(
            reg.transfer_from(&holder(2), &holder(3), &holder(2), TokenId(1), &mut rec),
            Err(RegistryError::NotOwnerNorApproved)
        );
    }

    #[test]
    fn operator_can_transfer_any_token() {
        let (mut reg, mut rec) = with_tokens(holder(1), 2);
        reg.set_approval_for_all(&holder(1), &holder(5), true).unwrap();
        assert!(reg.is_approved_for_all(&holder(1), &holder(5)));
        reg.transfer_from(&holder(5), &holder(1), &holder(2), TokenId(2), &mut rec).unwrap();
        assert_eq!(reg.tokens_of(&holder(1)), vec![TokenId(1)]);
        assert_eq!(reg.tokens_of(&holder(2)), vec![TokenId(2)]);

        reg.set_approval_for_all(&holder(1), &holder(5), false).unwrap();
        assert_eq!(
            reg.transfer_from(&holder(5), &holder(1), &holder(2), TokenId(1), &mut rec),
            Err(RegistryError::NotOwnerNorApproved)
        );
    }

    #[test]
    fn self_transfer_nets_to_zero() {
        let (mut reg, mut rec) = with_tokens(holder(1), 1);
        reg.transfer_from(&holder(1), &holder(1), &holder(1), TokenId(1), &mut rec).unwrap();
        assert_eq!(reg.balance_of(&holder(1)), 1);
        assert_eq!(rec.calls, vec![(holder(1), -1), (holder(1), 1)]);
    }

    // --- approvals ---

    #[test]
    fn approve_rules() {
        let (mut reg, _) = with_tokens(holder(1), 1);
        assert_eq!(
            reg.approve(&holder(1), &holder(1), TokenId(1)),
            Err(RegistryError::ApprovalToCurrentOwner)
        );
        assert_eq!(
            reg.approve(&holder(2), &holder(3), TokenId(1)),
            Err(RegistryError::ApproveNotOwnerNorApprovedForAll)
        );
        reg.set_approval_for_all(&holder(1), &holder(2), true).unwrap();
        reg.approve(&holder(2), &holder(3), TokenId(1)).unwrap();
        assert_eq!(reg.get_approved(TokenId(1)), Ok(Some(holder(3))));

        reg.approve(&holder(1), &HolderId::ZERO, TokenId(1)).unwrap();
        assert_eq!(reg.get_approved(TokenId(1)), Ok(None));
    }

    #[test]
    fn approve_to_self_as_operator_is_rejected() {
        let mut reg = TokenRegistry::new();
        assert_eq!(
            reg.set_approval_for_all(&holder(1), &holder(1), true),
            Err(RegistryError::ApproveToCaller)
        );
    }

    // --- from_parts ---

    #[test]
    fn from_parts_recomputes_balances() {
        let reg = TokenRegistry::from_parts(
            4,
            [(TokenId(1), holder(1)), (TokenId(2), holder(2)), (TokenId(3), holder(1))],
            [(TokenId(2), holder(7))],
            [(holder(1), holder(8))],
        )
        .unwrap();
        assert_eq!(reg.balance_of(&holder(1)), 2);
        assert_eq!(reg.total_shares(), 3);
        assert_eq!(reg.get_approved(TokenId(2)), Ok(Some(holder(7))));
        assert!(reg.is_approved_for_all(&holder(1), &holder(8)));
    }

    #[test]
    fn from_parts_rejects_unissued_ids() {
        let err = TokenRegistry::from_parts(2, [(TokenId(5), holder(1))], [], []).unwrap_err();
        assert_eq!(err, RegistryError::NonexistentToken(TokenId(5)));
    }

    // --- Properties ---

    proptest! {
        #[test]
        fn balances_match_owner_table(
            ops in prop::collection::vec((any::<bool>(), 1u8..=4, 1u64..4, any::<usize>()), 1..48)
        ) {
            let mut reg = TokenRegistry::new();
            let mut rec = Recorder::default();
            for (is_mint, who, count, pick) in ops {
                if is_mint || reg.total_supply() == 0 {
                    reg.mint(&holder(who), count, &mut rec).unwrap();
                } else {
                    let (token_id, owner) = reg
                        .owners()
                        .nth(pick % reg.total_supply() as usize)
                        .map(|(t, o)| (*t, *o))
                        .unwrap();
                    reg.transfer_from(&owner, &owner, &holder(who), token_id, &mut rec).unwrap();
                }
            }

            let mut observed: HashMap<HolderId, i128> = HashMap::new();
            for (h, delta) in &rec.calls {
                *observed.entry(*h).or_default() += delta;
            }
            let holders = reg.holders();
            let summed: Shares = holders.iter().map(|h| reg.balance_of(h)).sum();
            prop_assert_eq!(summed, reg.total_supply());
            for who in 1..=4 {
                let h = holder(who);
                let tokens = reg.tokens_of(&h);
                prop_assert_eq!(tokens.len() as Shares, reg.balance_of(&h));
                prop_assert!(tokens.iter().all(|t| reg.owner_of(*t) == Ok(h)));
                prop_assert_eq!(observed.get(&h).copied().unwrap_or(0), reg.balance_of(&h) as i128);
                prop_assert_eq!(holders.contains(&h), reg.balance_of(&h) > 0);
            }
        }
    }
}
