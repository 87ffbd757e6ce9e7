//! The per-template accumulator.

use dc_mempool::PoolEntry;
use shared_types::{Amount, Hash};
use std::collections::HashSet;

/// Mutable state of one in-progress candidate.
///
/// Created fresh per template request and discarded afterwards. The
/// included set only grows; dependency validity is enforced by the
/// admission gate at admission time, never repaired after the fact.
/// Totals use saturating arithmetic so a crafted pool cannot overflow
/// them.
#[derive(Debug)]
pub struct CandidateBlockState {
    /// Txids admitted so far. Monotonic.
    included: HashSet<Hash>,
    /// Serialized bytes admitted so far, including the proofbase
    /// reservation.
    pub block_size: u64,
    /// Sigops admitted so far, including the proofbase reservation.
    pub sig_ops: u64,
    /// Admitted transactions, excluding the proofbase.
    pub tx_count: u64,
    /// Fees collected so far.
    pub fees: Amount,
    /// Admission attempts made while within 1000 bytes of a full block.
    pub near_full_attempts: u32,
    /// One-way latch: once set, no further admissions are attempted for
    /// this template.
    pub finished: bool,
}

impl CandidateBlockState {
    /// Creates the state for a new template with the proofbase size and
    /// sigop reservations already counted.
    pub fn new(reserved_size: u64, reserved_sigops: u64) -> Self {
        Self {
            included: HashSet::new(),
            block_size: reserved_size,
            sig_ops: reserved_sigops,
            tx_count: 0,
            fees: 0,
            near_full_attempts: 0,
            finished: false,
        }
    }

    /// True if `txid` has been admitted.
    pub fn contains(&self, txid: &Hash) -> bool {
        self.included.contains(txid)
    }

    /// The admitted set, for exclusion-aware ancestor traversal.
    pub fn included(&self) -> &HashSet<Hash> {
        &self.included
    }

    /// Admits `entry`: updates all running totals and the included set.
    /// The caller has already run the admission predicates.
    pub fn admit(&mut self, entry: &PoolEntry) {
        self.block_size = self.block_size.saturating_add(entry.size);
        self.sig_ops = self.sig_ops.saturating_add(entry.sigops);
        self.tx_count += 1;
        self.fees = self.fees.saturating_add(entry.fee);
        self.included.insert(entry.txid);
    }
}
