//! Mempool error types.

use shared_types::Hash;
use thiserror::Error;

/// Errors raised by pool mutations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MempoolError {
    /// Transaction already exists in the pool.
    #[error("duplicate transaction {}", hex::encode(&.0[..4]))]
    DuplicateTransaction(Hash),

    /// Transaction not found in the pool.
    #[error("transaction not found {}", hex::encode(&.0[..4]))]
    TransactionNotFound(Hash),
}
