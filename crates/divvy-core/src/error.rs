//! Error types for the Divvy engine and its collaborators.
use thiserror::Error;

use crate::types::{Amount, HolderId, TokenId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("recipient {0} rejected the transfer")] Rejected(HolderId),
    #[error("recipient {0} balance overflow")] BalanceOverflow(HolderId),
    #[error("transfer to the zero address")] ZeroRecipient,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DividendError {
    #[error("total token supply is 0")] NoShares,
    #[error("dividend payout of {amount} to {holder} failed: {source}")] TransferFailed { holder: HolderId, amount: Amount, source: TransferError },
    #[error("arithmetic overflow")] ArithmeticOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("invalid amount")] InvalidAmount,
    #[error("mint to the zero address")] MintToZeroAddress,
    #[error("transfer to the zero address")] TransferToZeroAddress,
    #[error("transfer caller is not owner nor approved")] NotOwnerNorApproved,
    #[error("transfer of token {token_id} that is not owned by {from}")] IncorrectOwner { token_id: TokenId, from: HolderId },
    #[error("nonexistent token {0}")] NonexistentToken(TokenId),
    #[error("approval to current owner")] ApprovalToCurrentOwner,
    #[error("approve caller is not owner nor approved for all")] ApproveNotOwnerNorApprovedForAll,
    #[error("approve to caller")] ApproveToCaller,
    #[error("token id space exhausted")] TokenIdOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("io: {0}")] Io(String),
    #[error("corrupted snapshot: {0}")] Corrupted(String),
    #[error("unsupported snapshot version {0}")] UnsupportedVersion(u32),
    #[error("encoding: {0}")] Encoding(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid holder id: {0}")] InvalidHolder(String),
    #[error("invalid amount: {0}")] InvalidAmount(String),
}
