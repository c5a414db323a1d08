//! Snapshot persistence for a dividend-paying collection.
//!
//! File layout:
//!
//! ```text
//! [4 bytes magic "DIVY"][4 bytes version, LE][bincode payload]
//! ```
//!
//! Writes go to a sibling temporary file that is then renamed over the
//! target, so a crash mid-write never leaves a truncated snapshot behind.

use std::fs;
use std::path::{Path, PathBuf};

use divvy_core::constants::{MAGNITUDE, MAX_TOTAL_DISTRIBUTED, SNAPSHOT_MAGIC, SNAPSHOT_VERSION};
use divvy_core::error::StorageError;
use divvy_core::events::Event;
use divvy_core::traits::ValueTransfer;
use divvy_core::types::{Amount, HolderId, TokenId};
use divvy_dividend::{Accumulator, CorrectionLedger, DividendEngine, HolderAccount};
use primitive_types::U256;
use tracing::debug;

use crate::collection::DividendPayingCollection;
use crate::registry::TokenRegistry;

const HEADER_LEN: usize = 8;

fn u256_to_le(value: U256) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    value.to_little_endian(&mut bytes);
    bytes
}

/// Persisted state of one holder account. The correction is a little-endian
/// two's-complement 256-bit value.
#[derive(Debug, Clone, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct AccountRecord {
    pub holder: HolderId,
    pub correction: [u8; 32],
    pub withdrawn: Amount,
}

/// Complete persisted state of a collection, excluding the payout channel.
///
/// All sequences are sorted so equal states encode to equal bytes.
#[derive(Debug, Clone, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct Snapshot {
    pub next_token_id: u64,
    pub owners: Vec<(TokenId, HolderId)>,
    pub token_approvals: Vec<(TokenId, HolderId)>,
    pub operator_approvals: Vec<(HolderId, HolderId)>,
    pub magnified_dividend_per_share: [u8; 32],
    pub vault: Amount,
    pub total_distributed: Amount,
    pub accounts: Vec<AccountRecord>,
    pub events: Vec<Event>,
}

impl Snapshot {
    /// Capture the current state of `collection`.
    pub fn capture<T: ValueTransfer>(collection: &DividendPayingCollection<T>) -> Self {
        let registry = collection.registry();
        let engine = collection.engine();

        let mut accounts: Vec<AccountRecord> = engine
            .ledger()
            .iter()
            .map(|(holder, account)| AccountRecord {
                holder: *holder,
                correction: u256_to_le(account.magnified_dividend_correction),
                withdrawn: account.withdrawn_dividend,
            })
            .collect();
        accounts.sort_by(|a, b| a.holder.cmp(&b.holder));

        Self {
            next_token_id: registry.next_token_id(),
            owners: registry.owners().map(|(t, h)| (*t, *h)).collect(),
            token_approvals: registry.token_approvals().map(|(t, h)| (*t, *h)).collect(),
            operator_approvals: registry.operator_approvals().copied().collect(),
            magnified_dividend_per_share: u256_to_le(engine.magnified_dividend_per_share()),
            vault: engine.vault(),
            total_distributed: engine.total_distributed(),
            accounts,
            events: collection.events().to_vec(),
        }
    }

    /// Rebuild a collection paying through `payout`.
    pub fn restore<T: ValueTransfer>(
        self,
        payout: T,
    ) -> Result<DividendPayingCollection<T>, StorageError> {
        if self.total_distributed > MAX_TOTAL_DISTRIBUTED {
            return Err(StorageError::Corrupted(format!(
                "total distributed {} exceeds the ceiling {MAX_TOTAL_DISTRIBUTED}",
                self.total_distributed
            )));
        }
        if self.vault > self.total_distributed {
            return Err(StorageError::Corrupted(format!(
                "vault {} exceeds total distributed {}",
                self.vault, self.total_distributed
            )));
        }

        let mdps = U256::from_little_endian(&self.magnified_dividend_per_share);
        // Each increment is at most `amount * MAGNITUDE`.
        if mdps > U256::from(self.total_distributed) * MAGNITUDE {
            return Err(StorageError::Corrupted("per-share figure out of range".into()));
        }

        let registry = TokenRegistry::from_parts(
            self.next_token_id,
            self.owners,
            self.token_approvals,
            self.operator_approvals,
        )
        .map_err(|e| StorageError::Corrupted(e.to_string()))?;

        let accumulator = Accumulator::from_parts(
            mdps,
            self.vault,
            self.total_distributed,
        );
        let ledger = CorrectionLedger::from_accounts(self.accounts.into_iter().map(|record| {
            (
                record.holder,
                HolderAccount {
                    magnified_dividend_correction: U256::from_little_endian(&record.correction),
                    withdrawn_dividend: record.withdrawn,
                },
            )
        }));

        Ok(DividendPayingCollection::from_parts(
            registry,
            DividendEngine::from_parts(accumulator, ledger),
            payout,
            self.events,
        ))
    }
}

/// File-backed store for one bincode-encoded state value.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Encode `state` and atomically replace the file.
    pub fn save<S: bincode::Encode>(&self, state: &S) -> Result<(), StorageError> {
        let payload = bincode::encode_to_vec(state, bincode::config::standard())
            .map_err(|e| StorageError::Encoding(e.to_string()))?;

        let mut data = Vec::with_capacity(HEADER_LEN + payload.len());
        data.extend_from_slice(&SNAPSHOT_MAGIC);
        data.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
        data.extend_from_slice(&payload);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StorageError::Io(e.to_string()))?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &data).map_err(|e| StorageError::Io(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| StorageError::Io(e.to_string()))?;

        debug!(path = %self.path.display(), bytes = data.len(), "snapshot saved");
        Ok(())
    }

    /// Decode the stored state. `Ok(None)` if no file exists yet.
    pub fn load<S: bincode::Decode<()>>(&self) -> Result<Option<S>, StorageError> {
        if !self.exists() {
            return Ok(None);
        }
        let data = fs::read(&self.path).map_err(|e| StorageError::Io(e.to_string()))?;
        if data.len() < HEADER_LEN {
            return Err(StorageError::Corrupted("file too short".into()));
        }
        if data[..4] != SNAPSHOT_MAGIC {
            return Err(StorageError::Corrupted("bad magic".into()));
        }
        let mut version = [0u8; 4];
        version.copy_from_slice(&data[4..HEADER_LEN]);
        let version = u32::from_le_bytes(version);
        if version != SNAPSHOT_VERSION {
            return Err(StorageError::UnsupportedVersion(version));
        }

        let (state, read) =
            bincode::decode_from_slice(&data[HEADER_LEN..], bincode::config::standard())
                .map_err(|e| StorageError::Encoding(e.to_string()))?;
        if HEADER_LEN + read != data.len() {
            return Err(StorageError::Corrupted("trailing bytes after payload".into()));
        }
        Ok(Some(state))
    }

    /// Delete the file. Returns whether one existed.
    pub fn remove(&self) -> Result<bool, StorageError> {
        if !self.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path).map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(true)
    }
}
