//! # Delta-Chain Transaction Pool
//!
//! The mempool view consumed by the block assembler.
//!
//! ## Data Structures
//!
//! - `by_hash`: O(1) lookup by txid, the owner of canonical entry data
//! - `by_score`: sorted index over modified fee rate (best first)
//! - `by_ancestor_score`: sorted index over ancestor-package fee rate
//!
//! ## Invariants Enforced
//!
//! - No duplicate txids (checked in `add()`)
//! - A child can only be added after its in-pool parents, so the
//!   aggregate-with-ancestors fields are exact at insertion time
//! - Both sorted indexes hold back-references only; `by_hash` owns the data

#![warn(missing_docs)]
#![warn(clippy::all)]

mod entry;
mod error;
mod pool;

pub use entry::{fee_rate_cmp, PoolEntry};
pub use error::MempoolError;
pub use pool::TransactionPool;
