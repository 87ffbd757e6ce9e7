//! Coin-age priority selection.

use crate::gate::AdmissionGate;
use crate::state::CandidateBlockState;
use dc_mempool::TransactionPool;
use shared_types::Hash;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// Max-heap rank for the priority pass. Ties break on txid so selection
/// order is deterministic for equal priorities.
struct PriorityRank {
    priority: f64,
    txid: Hash,
}

impl PartialEq for PriorityRank {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PriorityRank {}

impl Ord for PriorityRank {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then_with(|| other.txid.cmp(&self.txid))
    }
}

impl PartialOrd for PriorityRank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Fills the priority portion of the block with the highest coin-age
/// transactions, regardless of the fees they pay.
///
/// Dependent transactions are parked with their computed priority and
/// re-queued once their last missing parent is admitted, so a
/// high-priority child can pull nothing: only its own rank ever places
/// it. The pass ends once the priority byte budget is reached or the
/// best remaining priority falls below the free-relay threshold.
pub fn add_priority_txs(
    pool: &TransactionPool,
    gate: &AdmissionGate<'_>,
    state: &mut CandidateBlockState,
    selected: &mut Vec<Hash>,
    priority_size: u64,
    max_block_size: u64,
) {
    let budget = priority_size.min(max_block_size);
    if budget == 0 {
        return;
    }
    let height = gate.height();

    let mut queue: BinaryHeap<PriorityRank> = pool
        .iter()
        .map(|entry| PriorityRank {
            priority: entry.priority(height),
            txid: entry.txid,
        })
        .collect();

    // Parked entries whose parents are not all in the block yet, keyed by
    // txid with the priority they ranked at.
    let mut waiting: HashMap<Hash, f64> = HashMap::new();

    while !state.finished {
        let Some(rank) = queue.pop() else {
            break;
        };
        if state.contains(&rank.txid) {
            continue;
        }
        let Some(entry) = pool.get(&rank.txid) else {
            continue;
        };

        if gate.is_still_dependent(pool, state, &rank.txid) {
            waiting.insert(rank.txid, rank.priority);
            continue;
        }

        if !gate.test_for_block(state, entry) {
            continue;
        }

        state.admit(entry);
        selected.push(entry.txid);
        tracing::debug!(
            txid = %hex::encode(&entry.txid[..4]),
            priority = rank.priority,
            fee = entry.modified_fee(),
            "priority add"
        );

        if state.block_size >= budget || rank.priority < crate::ALLOW_FREE_THRESHOLD {
            return;
        }

        // The admitted entry may have been the last missing parent of a
        // parked child; move such children back into the running.
        for child in pool.children_of(&entry.txid) {
            if let Some(priority) = waiting.remove(child) {
                queue.push(PriorityRank {
                    priority,
                    txid: *child,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssemblerConfig;
    use crate::policy::SigOpPolicy;
    use crate::ports::RespendDetector;
    use crate::ALLOW_FREE_THRESHOLD;
    use dc_mempool::PoolEntry;
    use shared_types::{Amount, OutPoint, Transaction, TxInput, TxOutput, COIN};

    struct NoRespends;
    impl RespendDetector for NoRespends {
        fn likely_respent(&self, _outpoint: &OutPoint) -> bool {
            false
        }
    }

    fn root_tx(tag: u8) -> Transaction {
        Transaction {
            version: 1,
            inputs: vec![TxInput::from_outpoint(OutPoint::new([tag; 32], 0))],
            outputs: vec![TxOutput {
                value: COIN,
                script_pubkey: vec![tag],
            }],
            lock_time: 0,
        }
    }

    fn child_tx(parent: &Transaction, tag: u8) -> Transaction {
        Transaction {
            version: 1,
            inputs: vec![TxInput::from_outpoint(OutPoint::new(parent.txid(), 0))],
            outputs: vec![TxOutput {
                value: COIN / 2,
                script_pubkey: vec![tag],
            }],
            lock_time: 0,
        }
    }

    fn add(pool: &mut TransactionPool, tx: Transaction, fee: Amount, priority: f64) -> Hash {
        let entry = PoolEntry::new(tx, fee, 1, 0, 0).with_priority(priority, 0);
        let txid = entry.txid;
        pool.add(entry).unwrap();
        txid
    }

    fn run(
        pool: &TransactionPool,
        config: &AssemblerConfig,
        state: &mut CandidateBlockState,
    ) -> Vec<Hash> {
        let respend = NoRespends;
        let gate = AdmissionGate::new(
            config,
            SigOpPolicy::Legacy,
            100,
            1_000_000,
            10_000_000,
            false,
            &respend,
        );
        let mut selected = Vec::new();
        add_priority_txs(
            pool,
            &gate,
            state,
            &mut selected,
            config.priority_size,
            config.max_block_size,
        );
        selected
    }

    fn high() -> f64 {
        ALLOW_FREE_THRESHOLD * 10.0
    }

    // =========================================================================
    // ORDERING TESTS
    // =========================================================================

    #[test]
    fn test_highest_priority_first() {
        let mut pool = TransactionPool::new();
        let low = add(&mut pool, root_tx(1), 0, high());
        let hi = add(&mut pool, root_tx(2), 0, high() * 2.0);

        let config = AssemblerConfig::default();
        let mut state = CandidateBlockState::new(0, 0);
        let selected = run(&pool, &config, &mut state);
        assert_eq!(selected, vec![hi, low]);
    }

    #[test]
    fn test_stops_below_free_threshold() {
        let mut pool = TransactionPool::new();
        let hi = add(&mut pool, root_tx(1), 0, high());
        let low = add(&mut pool, root_tx(2), 0, ALLOW_FREE_THRESHOLD / 2.0);
        let _lower = add(&mut pool, root_tx(3), 0, ALLOW_FREE_THRESHOLD / 4.0);

        let config = AssemblerConfig::default();
        let mut state = CandidateBlockState::new(0, 0);
        let selected = run(&pool, &config, &mut state);
        // The pass ends right after the first sub-threshold admission; the
        // entry behind it is never considered.
        assert_eq!(selected, vec![hi, low]);
    }

    #[test]
    fn test_zero_budget_selects_nothing() {
        let mut pool = TransactionPool::new();
        add(&mut pool, root_tx(1), 0, high());

        let config = AssemblerConfig {
            priority_size: 0,
            ..AssemblerConfig::default()
        };
        let mut state = CandidateBlockState::new(0, 0);
        assert!(run(&pool, &config, &mut state).is_empty());
    }

    #[test]
    fn test_budget_stops_after_crossing() {
        let mut pool = TransactionPool::new();
        let a = add(&mut pool, root_tx(1), 0, high() * 3.0);
        let b = add(&mut pool, root_tx(2), 0, high() * 2.0);
        let _c = add(&mut pool, root_tx(3), 0, high());
        let one_size = pool.get(&a).unwrap().size;

        // Budget covers two entries, the third never gets a look.
        let config = AssemblerConfig {
            priority_size: one_size + 1,
            ..AssemblerConfig::default()
        };
        let mut state = CandidateBlockState::new(0, 0);
        let selected = run(&pool, &config, &mut state);
        assert_eq!(selected, vec![a, b]);
    }

    // =========================================================================
    // DEPENDENCY TESTS
    // =========================================================================

    #[test]
    fn test_child_parked_until_parent_admitted() {
        let mut pool = TransactionPool::new();
        let parent_tx = root_tx(1);
        let child = child_tx(&parent_tx, 2);
        // Child outranks its parent; it must still come out after it.
        let parent_id = add(&mut pool, parent_tx, 0, high());
        let child_id = add(&mut pool, child, 0, high() * 5.0);

        let config = AssemblerConfig::default();
        let mut state = CandidateBlockState::new(0, 0);
        let selected = run(&pool, &config, &mut state);
        assert_eq!(selected, vec![parent_id, child_id]);
    }

    #[test]
    fn test_child_of_rejected_parent_stays_parked() {
        let mut pool = TransactionPool::new();
        let parent_tx = root_tx(1);
        let child = child_tx(&parent_tx, 2);
        // The parent arrived too recently to be mined, so the parked child
        // is never promoted and the pass drains the heap empty-handed.
        let parent = PoolEntry::new(parent_tx, 0, 1, 0, 9_900_000).with_priority(high(), 0);
        pool.add(parent).unwrap();
        let _child_id = add(&mut pool, child, 0, high() * 5.0);

        let config = AssemblerConfig::default();
        let mut state = CandidateBlockState::new(0, 0);
        let selected = run(&pool, &config, &mut state);
        assert!(selected.is_empty());
    }
}
