//! Fee-rate score selection.

use crate::gate::AdmissionGate;
use crate::state::CandidateBlockState;
use dc_mempool::{fee_rate_cmp, TransactionPool};
use shared_types::{Amount, Hash};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

/// Max-heap rank for deferred children, ordered like the pool's score
/// index: best fee rate first, txid as the tie-break.
struct ScoreRank {
    fee: Amount,
    size: u64,
    txid: Hash,
}

impl PartialEq for ScoreRank {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoreRank {}

impl Ord for ScoreRank {
    fn cmp(&self, other: &Self) -> Ordering {
        fee_rate_cmp(self.fee, self.size, other.fee, other.size)
            .then_with(|| other.txid.cmp(&self.txid))
    }
}

impl PartialOrd for ScoreRank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Fills the block in descending modified-fee-rate order.
///
/// Walks the pool's score index interleaved with a queue of previously
/// deferred children. A deferred child is always tried before advancing
/// the index: it only became eligible when its parent was admitted, and
/// at that point it is known to rank at least as well as anything the
/// index has left to offer from the parent's position on.
pub fn add_score_txs(
    pool: &TransactionPool,
    gate: &AdmissionGate<'_>,
    state: &mut CandidateBlockState,
    selected: &mut Vec<Hash>,
) {
    let mut index = pool.iter_by_score();
    let mut cleared: BinaryHeap<ScoreRank> = BinaryHeap::new();
    let mut waiting: HashSet<Hash> = HashSet::new();

    loop {
        if state.finished {
            break;
        }
        let entry = if let Some(rank) = cleared.pop() {
            let Some(entry) = pool.get(&rank.txid) else {
                continue;
            };
            entry
        } else {
            let Some(entry) = index.next() else {
                break;
            };
            entry
        };

        if state.contains(&entry.txid) {
            continue;
        }
        if gate.is_still_dependent(pool, state, &entry.txid) {
            waiting.insert(entry.txid);
            continue;
        }
        if !gate.test_for_block(state, entry) {
            continue;
        }

        state.admit(entry);
        selected.push(entry.txid);
        tracing::debug!(
            txid = %hex::encode(&entry.txid[..4]),
            fee = entry.modified_fee(),
            size = entry.size,
            "score add"
        );

        for child in pool.children_of(&entry.txid) {
            if waiting.remove(child) {
                if let Some(child_entry) = pool.get(child) {
                    let (fee, size) = child_entry.score();
                    cleared.push(ScoreRank {
                        fee,
                        size,
                        txid: *child,
                    });
                }
            }
        }
    }
}
