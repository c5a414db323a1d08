//! # divvy-core
//! Foundation types and traits for the Divvy dividend engine.

pub mod amount;
pub mod constants;
pub mod error;
pub mod events;
pub mod traits;
pub mod types;
