//! # divvy-collection
//! A dividend-paying collection of non-fungible tokens.
//!
//! Composes the ownership registry, the dividend engine, and an outbound
//! payout channel into one contract surface, with snapshot persistence.

pub mod bank;
pub mod collection;
pub mod registry;
pub mod shared;
pub mod storage;

pub use bank::Bank;
pub use collection::DividendPayingCollection;
pub use registry::TokenRegistry;
pub use shared::SharedCollection;
pub use storage::{Snapshot, SnapshotStore};
