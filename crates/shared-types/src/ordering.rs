//! Canonical transaction ordering.
//!
//! A finalized sub-block lists its non-proofbase transactions in ascending
//! numeric txid order, treating the 32-byte hash as a little-endian
//! integer. Validators re-derive and check this order.

use crate::entities::Hash;
use std::cmp::Ordering;

/// Compares two txids as little-endian 256-bit integers.
pub fn numeric_txid_cmp(a: &Hash, b: &Hash) -> Ordering {
    a.iter().rev().cmp(b.iter().rev())
}
