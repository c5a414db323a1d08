//! Persisted CLI session: the collection plus the bank it pays into.

use anyhow::{Context, Result};
use divvy_collection::{Bank, DividendPayingCollection, Snapshot, SnapshotStore};
use tracing::debug;

/// On-disk state of the CLI.
#[derive(Debug, Clone, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct CliState {
    pub collection: Snapshot,
    pub bank: Bank,
}

/// A loaded collection bound to its backing store.
pub struct Session {
    store: SnapshotStore,
    pub collection: DividendPayingCollection<Bank>,
}

impl Session {
    /// Load the collection from `store`, or start an empty one.
    pub fn open(store: SnapshotStore) -> Result<Self> {
        let collection = match store
            .load::<CliState>()
            .with_context(|| format!("failed to load state from {}", store.path().display()))?
        {
            Some(state) => state
                .collection
                .restore(state.bank)
                .context("stored collection is inconsistent")?,
            None => {
                debug!(path = %store.path().display(), "no saved state, starting empty");
                DividendPayingCollection::new(Bank::new())
            }
        };
        Ok(Self { store, collection })
    }

    /// Write the current collection back to the store.
    pub fn save(&self) -> Result<()> {
        let state = CliState {
            collection: Snapshot::capture(&self.collection),
            bank: self.collection.payout().clone(),
        };
        self.store
            .save(&state)
            .with_context(|| format!("failed to save state to {}", self.store.path().display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use divvy_core::types::HolderId;

    #[test]
    fn session_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collection.bin");
        let alice = HolderId::from_label("alice");

        let mut session = Session::open(SnapshotStore::new(&path)).unwrap();
        session.collection.mint(&alice, 2).unwrap();
        session.collection.distribute_dividends(&alice, 10).unwrap();
        session.collection.withdraw_dividend(&alice).unwrap();
        session.collection.payout_mut().set_rejecting(&alice, true);
        session.save().unwrap();

        let reopened = Session::open(SnapshotStore::new(&path)).unwrap();
        assert_eq!(reopened.collection.balance_of(&alice), 2);
        assert_eq!(reopened.collection.withdrawn_dividend_of(&alice), 10);
        assert_eq!(reopened.collection.payout().balance_of(&alice), 10);
        assert!(reopened.collection.payout().is_rejecting(&alice));
        assert_eq!(reopened.collection.events(), session.collection.events());
    }

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::open(SnapshotStore::new(dir.path().join("collection.bin"))).unwrap();
        assert_eq!(session.collection.total_supply(), 0);
    }
}
