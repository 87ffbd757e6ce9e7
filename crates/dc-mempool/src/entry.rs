//! Pool entry: a transaction plus the bookkeeping the assembler reads.

use shared_types::{Amount, Hash, Transaction};
use std::cmp::Ordering;
use std::collections::HashSet;

/// A transaction resident in the pool, with fee, sigop and ancestor
/// aggregate bookkeeping.
///
/// The aggregate-with-ancestors fields sum over the transitive closure of
/// in-pool ancestors including the entry itself. They are exact at
/// insertion time; during one selection pass they can go stale relative to
/// a partially included ancestor set, which the assembler detects by
/// comparing `count_with_ancestors` against the remaining package and
/// recomputing from the members.
#[derive(Clone, Debug)]
pub struct PoolEntry {
    /// The transaction.
    pub tx: Transaction,
    /// Cached txid.
    pub txid: Hash,
    /// Serialized size in bytes.
    pub size: u64,
    /// Fee actually attached to the transaction.
    pub fee: Amount,
    /// Miner fee delta applied on top of `fee`.
    pub fee_delta: Amount,
    /// Signature-operation count.
    pub sigops: u64,
    /// Chain height when the entry was accepted.
    pub entry_height: u64,
    /// Microsecond timestamp when the entry was accepted.
    pub first_seen_micros: u64,
    /// Coin-age priority at entry time.
    pub start_priority: f64,
    /// Miner priority delta applied on top of the computed priority.
    pub priority_delta: f64,
    /// Sum of the values of the spent inputs, for priority aging.
    pub input_value: Amount,
    /// Direct in-pool parents.
    pub parents: HashSet<Hash>,
    /// Direct in-pool children.
    pub children: HashSet<Hash>,
    /// Size summed over self plus all in-pool ancestors.
    pub size_with_ancestors: u64,
    /// Modified fee summed over self plus all in-pool ancestors.
    pub fee_with_ancestors: Amount,
    /// Sigops summed over self plus all in-pool ancestors.
    pub sigops_with_ancestors: u64,
    /// Number of transactions in self plus all in-pool ancestors.
    pub count_with_ancestors: u64,
}

impl PoolEntry {
    /// Creates an entry for `tx`. Ancestor aggregates start at the entry's
    /// own totals; the pool finalizes them on `add`.
    pub fn new(
        tx: Transaction,
        fee: Amount,
        sigops: u64,
        entry_height: u64,
        first_seen_micros: u64,
    ) -> Self {
        let txid = tx.txid();
        let size = tx.serialized_size();
        Self {
            tx,
            txid,
            size,
            fee,
            fee_delta: 0,
            sigops,
            entry_height,
            first_seen_micros,
            start_priority: 0.0,
            priority_delta: 0.0,
            input_value: 0,
            parents: HashSet::new(),
            children: HashSet::new(),
            size_with_ancestors: size,
            fee_with_ancestors: fee,
            sigops_with_ancestors: sigops,
            count_with_ancestors: 1,
        }
    }

    /// Sets the coin-age priority inputs.
    pub fn with_priority(mut self, start_priority: f64, input_value: Amount) -> Self {
        self.start_priority = start_priority;
        self.input_value = input_value;
        self
    }

    /// Applies miner deltas to the fee and priority.
    pub fn with_deltas(mut self, fee_delta: Amount, priority_delta: f64) -> Self {
        self.fee_delta = fee_delta;
        self.priority_delta = priority_delta;
        self
    }

    /// Fee adjusted by the miner delta; the value all rate orderings use.
    pub fn modified_fee(&self) -> Amount {
        self.fee.saturating_add(self.fee_delta)
    }

    /// Coin-age priority at `height`: the entry-time priority plus the
    /// aging of the spent inputs, delta-adjusted.
    pub fn priority(&self, height: u64) -> f64 {
        let aged_blocks = height.saturating_sub(self.entry_height) as f64;
        let aging = if self.size == 0 {
            0.0
        } else {
            aged_blocks * self.input_value as f64 / self.size as f64
        };
        self.start_priority + aging + self.priority_delta
    }

    /// Modified fee over size, as an ordering key via [`fee_rate_cmp`].
    pub fn score(&self) -> (Amount, u64) {
        (self.modified_fee(), self.size)
    }

    /// Ancestor-package fee over ancestor-package size.
    pub fn ancestor_score(&self) -> (Amount, u64) {
        (self.fee_with_ancestors, self.size_with_ancestors)
    }
}

/// Compares two fee rates `fee_a/size_a` and `fee_b/size_b` exactly, by
/// cross multiplication in 128-bit arithmetic.
pub fn fee_rate_cmp(fee_a: Amount, size_a: u64, fee_b: Amount, size_b: u64) -> Ordering {
    let lhs = i128::from(fee_a) * i128::from(size_b);
    let rhs = i128::from(fee_b) * i128::from(size_a);
    lhs.cmp(&rhs)
}
