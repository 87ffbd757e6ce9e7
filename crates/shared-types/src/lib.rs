//! # Delta-Chain Shared Types
//!
//! Core chain entities shared across subsystems.
//!
//! ## Clusters
//!
//! - **Chain**: [`Transaction`], [`TxInput`], [`TxOutput`], [`OutPoint`],
//!   [`BlockHeader`], [`SubBlock`]
//! - **Policy**: [`FeeRate`], consensus constants
//! - **Ordering**: canonical numeric txid ordering for block finalization

#![warn(missing_docs)]
#![warn(clippy::all)]

mod entities;
mod fee;
mod ordering;

pub use entities::{
    Amount, BlockHeader, Hash, OutPoint, SubBlock, Transaction, TxInput, TxOutput, COIN,
    LOCKTIME_THRESHOLD, MIN_TX_SIZE, PROOFBASE_SENTINEL_INDEX,
};
pub use fee::FeeRate;
pub use ordering::numeric_txid_cmp;
