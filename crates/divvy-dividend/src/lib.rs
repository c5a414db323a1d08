//! # divvy-dividend: proportional dividend accounting engine.
//!
//! All calculations use integer arithmetic only for determinism.
//!
//! Every operation is O(1): nothing iterates over holders or over past
//! distributions.
//! - **Accumulator**: one `magnified dividend per share` figure, scaled by
//!   `MAGNITUDE = 2^128`, raised once per distribution, plus the vault.
//! - **Correction ledger**: a signed per-holder offset that cancels the
//!   accumulator's effect on mints and transfers, plus each holder's
//!   withdrawn total.
//! - **Withdrawal**: debits are committed before the payout call and rolled
//!   back if it fails.

pub mod accumulator;
pub mod engine;
pub mod ledger;

pub use accumulator::{Accumulator, per_share_increment};
pub use engine::DividendEngine;
pub use ledger::{CorrectionLedger, HolderAccount, accumulative_dividend};
