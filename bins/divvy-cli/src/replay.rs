//! Scripted operation sequences.
//!
//! A replay file is a JSON array of operations, for example:
//!
//! ```json
//! [
//!   {"op": "mint", "to": "alice", "amount": 2},
//!   {"op": "distribute", "from": "bob", "value": "10"},
//!   {"op": "transfer", "from": "alice", "to": "carol", "token": 1},
//!   {"op": "withdraw", "holder": "alice"}
//! ]
//! ```
//!
//! Values are whole coins unless `"raw": true` is given.

use anyhow::{Context, Result};
use divvy_collection::{Bank, DividendPayingCollection};
use divvy_core::types::{Shares, TokenId};
use serde::Deserialize;
use tracing::info;

use crate::input::{parse_holder, parse_value};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ReplayOp {
    Mint {
        to: String,
        amount: Shares,
    },
    Transfer {
        #[serde(default)]
        caller: Option<String>,
        from: String,
        to: String,
        token: u64,
    },
    Approve {
        owner: String,
        approved: String,
        token: u64,
    },
    ApproveAll {
        owner: String,
        operator: String,
        #[serde(default = "yes")]
        approved: bool,
    },
    Distribute {
        from: String,
        value: String,
        #[serde(default)]
        raw: bool,
    },
    Receive {
        from: String,
        value: String,
        #[serde(default)]
        raw: bool,
    },
    Withdraw {
        holder: String,
    },
    Reject {
        holder: String,
        #[serde(default = "yes")]
        rejecting: bool,
    },
}

fn yes() -> bool {
    true
}

/// Parse a replay script.
pub fn parse_script(json: &str) -> Result<Vec<ReplayOp>> {
    serde_json::from_str(json).context("replay file is not a valid operation list")
}

/// Apply `ops` in order, stopping at the first failure.
pub fn apply_all(collection: &mut DividendPayingCollection<Bank>, ops: &[ReplayOp]) -> Result<()> {
    for (index, op) in ops.iter().enumerate() {
        apply(collection, op).with_context(|| format!("replay op #{index} ({op:?}) failed"))?;
    }
    info!(ops = ops.len(), "replay complete");
    Ok(())
}

fn apply(c: &mut DividendPayingCollection<Bank>, op: &ReplayOp) -> Result<()> {
    match op {
        ReplayOp::Mint { to, amount } => {
            c.mint(&parse_holder(to)?, *amount)?;
        }
        ReplayOp::Transfer {
            caller,
            from,
            to,
            token,
        } => {
            let from = parse_holder(from)?;
            let caller = match caller {
                Some(caller) => parse_holder(caller)?,
                None => from,
            };
            c.transfer_from(&caller, &from, &parse_holder(to)?, TokenId(*token))?;
        }
        ReplayOp::Approve {
            owner,
            approved,
            token,
        } => {
            c.approve(&parse_holder(owner)?, &parse_holder(approved)?, TokenId(*token))?;
        }
        ReplayOp::ApproveAll {
            owner,
            operator,
            approved,
        } => {
            c.set_approval_for_all(&parse_holder(owner)?, &parse_holder(operator)?, *approved)?;
        }
        ReplayOp::Distribute { from, value, raw } => {
            c.distribute_dividends(&parse_holder(from)?, parse_value(value, *raw)?)?;
        }
        ReplayOp::Receive { from, value, raw } => {
            c.receive(&parse_holder(from)?, parse_value(value, *raw)?)?;
        }
        ReplayOp::Withdraw { holder } => {
            c.withdraw_dividend(&parse_holder(holder)?)?;
        }
        ReplayOp::Reject { holder, rejecting } => {
            c.payout_mut().set_rejecting(&parse_holder(holder)?, *rejecting);
        }
    }
    Ok(())
}
