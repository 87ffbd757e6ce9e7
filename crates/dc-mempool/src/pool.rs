//! Multi-index transaction pool.

use crate::entry::{fee_rate_cmp, PoolEntry};
use crate::error::MempoolError;
use shared_types::{Amount, Hash};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// Back-reference key for the fee-rate sorted indexes.
///
/// Implements `Ord` such that a higher fee rate sorts first, with the txid
/// as a deterministic tie-break. Keys hold no entry data beyond what the
/// rate comparison needs; `by_hash` owns the canonical entry.
#[derive(Clone, Debug, PartialEq, Eq)]
struct RateKey {
    fee: Amount,
    size: u64,
    txid: Hash,
}

impl RateKey {
    fn new((fee, size): (Amount, u64), txid: Hash) -> Self {
        Self { fee, size, txid }
    }
}

impl Ord for RateKey {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher fee rate = higher priority (so reverse comparison).
        fee_rate_cmp(other.fee, other.size, self.fee, self.size)
            .then_with(|| self.txid.cmp(&other.txid))
    }
}

impl PartialOrd for RateKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Transaction pool with parallel sorted views.
///
/// The assembler consumes this read-only for the duration of one selection
/// pass: the score index for single-transaction selection, the ancestor
/// score index for package selection, the adjacency maps for dependency
/// checks, and the exclusion-aware ancestor traversal for package
/// recomputation.
#[derive(Debug, Default)]
pub struct TransactionPool {
    /// All entries indexed by txid.
    by_hash: HashMap<Hash, PoolEntry>,

    /// Entries ordered by modified fee rate, best first.
    by_score: BTreeSet<RateKey>,

    /// Entries ordered by ancestor-package fee rate, best first.
    by_ancestor_score: BTreeSet<RateKey>,
}

impl TransactionPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of transactions in the pool.
    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    /// Returns true if the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    /// Looks up an entry by txid.
    pub fn get(&self, txid: &Hash) -> Option<&PoolEntry> {
        self.by_hash.get(txid)
    }

    /// Checks if a transaction exists in the pool.
    pub fn contains(&self, txid: &Hash) -> bool {
        self.by_hash.contains_key(txid)
    }

    /// Adds an entry to the pool.
    ///
    /// Parents are resolved from the entry's input prevouts: a prevout
    /// whose transaction is not in the pool is treated as confirmed. The
    /// aggregate-with-ancestors fields are finalized here, so children must
    /// be added after their in-pool parents.
    ///
    /// # Errors
    /// - `DuplicateTransaction` if the txid already exists
    pub fn add(&mut self, mut entry: PoolEntry) -> Result<(), MempoolError> {
        if self.by_hash.contains_key(&entry.txid) {
            return Err(MempoolError::DuplicateTransaction(entry.txid));
        }

        let parents: HashSet<Hash> = entry
            .tx
            .inputs
            .iter()
            .map(|input| input.prevout.txid)
            .filter(|txid| self.by_hash.contains_key(txid))
            .collect();
        entry.parents = parents.clone();

        // Exact aggregates over the full unconfirmed ancestor closure.
        let ancestors = self.walk_ancestors(&parents, &HashSet::new());
        for ancestor in &ancestors {
            let a = &self.by_hash[ancestor];
            entry.size_with_ancestors = entry.size_with_ancestors.saturating_add(a.size);
            entry.fee_with_ancestors = entry.fee_with_ancestors.saturating_add(a.modified_fee());
            entry.sigops_with_ancestors = entry.sigops_with_ancestors.saturating_add(a.sigops);
            entry.count_with_ancestors += 1;
        }

        for parent in &parents {
            if let Some(parent_entry) = self.by_hash.get_mut(parent) {
                parent_entry.children.insert(entry.txid);
            }
        }

        self.by_score.insert(RateKey::new(entry.score(), entry.txid));
        self.by_ancestor_score
            .insert(RateKey::new(entry.ancestor_score(), entry.txid));

        tracing::debug!(
            txid = %hex::encode(&entry.txid[..4]),
            size = entry.size,
            fee = entry.fee,
            ancestors = entry.count_with_ancestors - 1,
            "pool add"
        );
        self.by_hash.insert(entry.txid, entry);
        Ok(())
    }

    /// Removes transactions that were mined into a connected block and
    /// refreshes the ancestor aggregates of their remaining descendants.
    pub fn remove_for_block(&mut self, txids: &[Hash]) -> Vec<PoolEntry> {
        let mut removed = Vec::new();
        let mut affected: HashSet<Hash> = HashSet::new();

        for txid in txids {
            let Some(entry) = self.by_hash.remove(txid) else {
                continue;
            };
            self.by_score.remove(&RateKey::new(entry.score(), entry.txid));
            self.by_ancestor_score
                .remove(&RateKey::new(entry.ancestor_score(), entry.txid));

            for parent in &entry.parents {
                if let Some(parent_entry) = self.by_hash.get_mut(parent) {
                    parent_entry.children.remove(txid);
                }
            }
            for child in &entry.children {
                if let Some(child_entry) = self.by_hash.get_mut(child) {
                    child_entry.parents.remove(txid);
                }
                affected.insert(*child);
            }
            removed.push(entry);
        }

        // Every remaining descendant of a removed entry carries stale
        // aggregates; recompute them from the surviving ancestor closure.
        let descendants = self.walk_descendants(&affected);
        for txid in descendants {
            let Some(entry) = self.by_hash.get(&txid) else {
                continue;
            };
            self.by_ancestor_score
                .remove(&RateKey::new(entry.ancestor_score(), txid));

            let parents = entry.parents.clone();
            let ancestors = self.walk_ancestors(&parents, &HashSet::new());
            let (mut size, mut fee, mut sigops, mut count) = {
                let e = &self.by_hash[&txid];
                (e.size, e.modified_fee(), e.sigops, 1u64)
            };
            for ancestor in &ancestors {
                let a = &self.by_hash[ancestor];
                size = size.saturating_add(a.size);
                fee = fee.saturating_add(a.modified_fee());
                sigops = sigops.saturating_add(a.sigops);
                count += 1;
            }

            let Some(entry) = self.by_hash.get_mut(&txid) else {
                continue;
            };
            entry.size_with_ancestors = size;
            entry.fee_with_ancestors = fee;
            entry.sigops_with_ancestors = sigops;
            entry.count_with_ancestors = count;
            self.by_ancestor_score
                .insert(RateKey::new(entry.ancestor_score(), txid));
        }

        removed
    }

    /// Applies miner fee and priority deltas to an entry.
    ///
    /// The fee delta changes the modified fee, so the entry is re-keyed in
    /// the score index and the delta flows into the ancestor aggregate of
    /// the entry and every descendant.
    ///
    /// # Errors
    /// - `TransactionNotFound` if the txid is not in the pool
    pub fn prioritise(
        &mut self,
        txid: &Hash,
        fee_delta: Amount,
        priority_delta: f64,
    ) -> Result<(), MempoolError> {
        let Some(entry) = self.by_hash.get(txid) else {
            return Err(MempoolError::TransactionNotFound(*txid));
        };
        let old_score = entry.score();
        let shift = fee_delta.saturating_sub(entry.fee_delta);

        self.by_score.remove(&RateKey::new(old_score, *txid));
        if let Some(entry) = self.by_hash.get_mut(txid) {
            entry.fee_delta = fee_delta;
            entry.priority_delta = priority_delta;
            let new_score = entry.score();
            self.by_score.insert(RateKey::new(new_score, *txid));
        }

        let roots: HashSet<Hash> = [*txid].into_iter().collect();
        for descendant in self.walk_descendants(&roots) {
            let Some(entry) = self.by_hash.get_mut(&descendant) else {
                continue;
            };
            let old_key = RateKey::new(entry.ancestor_score(), descendant);
            entry.fee_with_ancestors = entry.fee_with_ancestors.saturating_add(shift);
            let new_key = RateKey::new(entry.ancestor_score(), descendant);
            self.by_ancestor_score.remove(&old_key);
            self.by_ancestor_score.insert(new_key);
        }

        tracing::debug!(
            txid = %hex::encode(&txid[..4]),
            fee_delta,
            priority_delta,
            "prioritise"
        );
        Ok(())
    }

    /// Direct in-pool parents of `txid`.
    pub fn parents_of(&self, txid: &Hash) -> impl Iterator<Item = &Hash> {
        self.by_hash
            .get(txid)
            .into_iter()
            .flat_map(|entry| entry.parents.iter())
    }

    /// Direct in-pool children of `txid`.
    pub fn children_of(&self, txid: &Hash) -> impl Iterator<Item = &Hash> {
        self.by_hash
            .get(txid)
            .into_iter()
            .flat_map(|entry| entry.children.iter())
    }

    /// Unconfirmed ancestors of `txid`, excluding `exclude` and everything
    /// reachable only through it.
    ///
    /// The exclusion set is an explicit parameter: the assembler passes its
    /// included set so repeated calls never re-walk already-settled parts
    /// of the dependency tree. An excluded parent is treated like a
    /// confirmed one.
    pub fn ancestors_of(&self, txid: &Hash, exclude: &HashSet<Hash>) -> HashSet<Hash> {
        let parents: HashSet<Hash> = self.parents_of(txid).copied().collect();
        self.walk_ancestors(&parents, exclude)
    }

    /// Entries in descending modified-fee-rate order.
    pub fn iter_by_score(&self) -> impl Iterator<Item = &PoolEntry> {
        self.by_score
            .iter()
            .filter_map(move |key| self.by_hash.get(&key.txid))
    }

    /// Entries in descending ancestor-package-fee-rate order.
    pub fn iter_by_ancestor_score(&self) -> impl Iterator<Item = &PoolEntry> {
        self.by_ancestor_score
            .iter()
            .filter_map(move |key| self.by_hash.get(&key.txid))
    }

    /// All entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &PoolEntry> {
        self.by_hash.values()
    }

    fn walk_ancestors(&self, roots: &HashSet<Hash>, exclude: &HashSet<Hash>) -> HashSet<Hash> {
        let mut found = HashSet::new();
        let mut queue: VecDeque<Hash> = roots.iter().copied().collect();
        while let Some(current) = queue.pop_front() {
            if exclude.contains(&current) || found.contains(&current) {
                continue;
            }
            let Some(entry) = self.by_hash.get(&current) else {
                continue;
            };
            found.insert(current);
            queue.extend(entry.parents.iter().copied());
        }
        found
    }

    fn walk_descendants(&self, roots: &HashSet<Hash>) -> Vec<Hash> {
        let mut found = HashSet::new();
        let mut order = Vec::new();
        let mut queue: VecDeque<Hash> = roots.iter().copied().collect();
        while let Some(current) = queue.pop_front() {
            if !found.insert(current) {
                continue;
            }
            let Some(entry) = self.by_hash.get(&current) else {
                continue;
            };
            order.push(current);
            queue.extend(entry.children.iter().copied());
        }
        order
    }
}
