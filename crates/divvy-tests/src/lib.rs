//! Integration test suite for the divvy dividend collection.
//!
//! The tests in `tests/` drive a full [`DividendPayingCollection`] through
//! mint, transfer, distribution, and withdrawal sequences and check the
//! accounting against a naive per-holder reference model.
//!
//! [`DividendPayingCollection`]: divvy_collection::DividendPayingCollection

pub mod helpers;
