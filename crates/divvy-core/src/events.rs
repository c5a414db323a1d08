//! Notifications emitted by the engine and the token registry.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Amount, HolderId, TokenId};

/// An observable state change, appended to the collection's event log in
/// the order the operations committed.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub enum Event {
    /// Value was distributed across all current shareholders.
    DividendsDistributed { payer: HolderId, amount: Amount },
    /// A holder pulled their accrued dividend.
    DividendWithdrawn { holder: HolderId, amount: Amount },
    /// A token changed owner. `from` is zero for mints.
    Transfer { from: HolderId, to: HolderId, token_id: TokenId },
    /// `approved` may move `token_id` on the owner's behalf. Zero clears it.
    Approval { owner: HolderId, approved: HolderId, token_id: TokenId },
    /// `operator` may move every token of `owner`.
    ApprovalForAll { owner: HolderId, operator: HolderId, approved: bool },
}

impl Event {
    /// Short event name, as shown in logs and CLI output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DividendsDistributed { .. } => "DividendsDistributed",
            Self::DividendWithdrawn { .. } => "DividendWithdrawn",
            Self::Transfer { .. } => "Transfer",
            Self::Approval { .. } => "Approval",
            Self::ApprovalForAll { .. } => "ApprovalForAll",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DividendsDistributed { payer, amount } => {
                write!(f, "{}(payer={payer}, amount={amount})", self.name())
            }
            Self::DividendWithdrawn { holder, amount } => {
                write!(f, "{}(holder={holder}, amount={amount})", self.name())
            }
            Self::Transfer { from, to, token_id } => {
                write!(f, "{}(from={from}, to={to}, token={token_id})", self.name())
            }
            Self::Approval { owner, approved, token_id } => {
                write!(f, "{}(owner={owner}, approved={approved}, token={token_id})", self.name())
            }
            Self::ApprovalForAll { owner, operator, approved } => {
                write!(
                    f,
                    "{}(owner={owner}, operator={operator}, approved={approved})",
                    self.name()
                )
            }
        }
    }
}
