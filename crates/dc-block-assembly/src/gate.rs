//! Admission predicates and closing heuristics.
//!
//! Every rejection here is a silent skip: the transaction is simply left
//! out of this template. The gate also owns the two closing heuristics
//! that bound worst-case scanning of a nearly full block: the near-full
//! byte window and the within-2-of-cap sigop latch.

use crate::config::AssemblerConfig;
use crate::policy::SigOpPolicy;
use crate::ports::RespendDetector;
use crate::state::CandidateBlockState;
use dc_mempool::{PoolEntry, TransactionPool};
use shared_types::{Hash, MIN_TX_SIZE};
use std::collections::HashSet;

/// Stateless predicate battery for one template.
///
/// Chain-derived inputs (height, lock-time cutoff, active rules) are fixed
/// at construction; the mutable candidate state is passed per call.
pub struct AdmissionGate<'a> {
    config: &'a AssemblerConfig,
    policy: SigOpPolicy,
    height: u64,
    lock_time_cutoff: u64,
    now_micros: u64,
    min_tx_size_active: bool,
    respend: &'a dyn RespendDetector,
}

impl<'a> AdmissionGate<'a> {
    /// Creates the gate for one template.
    pub fn new(
        config: &'a AssemblerConfig,
        policy: SigOpPolicy,
        height: u64,
        lock_time_cutoff: u64,
        now_micros: u64,
        min_tx_size_active: bool,
        respend: &'a dyn RespendDetector,
    ) -> Self {
        Self {
            config,
            policy,
            height,
            lock_time_cutoff,
            now_micros,
            min_tx_size_active,
            respend,
        }
    }

    /// Candidate height this gate checks finality against.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// True while any direct in-pool parent of `txid` is still missing
    /// from the included set.
    pub fn is_still_dependent(
        &self,
        pool: &TransactionPool,
        state: &CandidateBlockState,
        txid: &Hash,
    ) -> bool {
        pool.parents_of(txid).any(|parent| !state.contains(parent))
    }

    /// Would a transaction of the given size and sigop count still fit?
    ///
    /// On a size rejection near the full mark the finished latch or the
    /// near-full attempt counter is updated, bounding how many more
    /// candidates will be tried. On the sigop side the latch closes once
    /// the total is within 2 of the cap, accepting that up to ~2 sigops of
    /// slack may go unused.
    pub fn incrementally_good(
        &self,
        state: &mut CandidateBlockState,
        extra_size: u64,
        extra_sigops: u64,
    ) -> bool {
        if state.finished {
            return false;
        }
        if state.block_size.saturating_add(extra_size) > self.config.max_block_size {
            // If the block is so close to full that nothing more will fit,
            // or we have already retried the remaining space 50 times,
            // stop trying altogether.
            if state.block_size > self.config.max_block_size.saturating_sub(100)
                || state.near_full_attempts > 50
            {
                state.finished = true;
                return false;
            }
            // Within 1000 bytes of a full block, only look at 50 more
            // candidates to fill the remaining space.
            if state.block_size > self.config.max_block_size.saturating_sub(1000) {
                state.near_full_attempts += 1;
            }
            return false;
        }

        let cap = self.policy.cap(state.block_size);
        let new_total = state.sig_ops.saturating_add(extra_sigops);
        if new_total > cap {
            if state.sig_ops > cap.saturating_sub(2) {
                state.finished = true;
            }
            return false;
        }
        // Accepted, but so close to the sigop limit that further scanning
        // would thrash; a block near the cap may end up shorter than a
        // perfect packing.
        if new_total > cap.saturating_sub(2) {
            state.finished = true;
        }
        true
    }

    /// Full single-transaction admission test. All filters are
    /// independent, short-circuiting and non-fatal.
    pub fn test_for_block(&self, state: &mut CandidateBlockState, entry: &PoolEntry) -> bool {
        if !self.incrementally_good(state, entry.size, entry.sigops) {
            return false;
        }

        // Lock times must still be valid at the candidate height; reorgs
        // keep the pool consistent but the pool does not re-check.
        if !entry.tx.is_final(self.height, self.lock_time_cutoff) {
            return false;
        }

        if self.min_tx_size_active && entry.size < MIN_TX_SIZE {
            return false;
        }

        // Skip anything that landed in the pool less than a second ago.
        if entry.first_seen_micros + crate::MIN_ENTRY_AGE_MICROS > self.now_micros {
            return false;
        }

        // Known double-spends stay out of the candidate. The detector is
        // heuristic; a false positive just defers the transaction.
        entry
            .tx
            .inputs
            .iter()
            .all(|input| !self.respend.likely_respent(&input.prevout))
    }

    /// Package-level sigop test, applied to a whole ancestor group at
    /// once. Under the legacy model the cap is evaluated at the size the
    /// block would have with the package included.
    pub fn package_sigops_ok(
        &self,
        state: &CandidateBlockState,
        package_size: u64,
        package_sigops: u64,
    ) -> bool {
        let cap = self.policy.cap(state.block_size.saturating_add(package_size));
        // Strict bound: assembles with one less sigcheck than possible.
        state.sig_ops.saturating_add(package_sigops) < cap
    }

    /// True when every member of the package is final at the candidate
    /// height. Size and sigops have already been tested.
    pub fn package_final(&self, pool: &TransactionPool, members: &HashSet<Hash>) -> bool {
        members.iter().all(|txid| {
            pool.get(txid)
                .is_some_and(|entry| entry.tx.is_final(self.height, self.lock_time_cutoff))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{Amount, OutPoint, Transaction, TxInput, TxOutput, COIN};

    struct NoRespends;
    impl RespendDetector for NoRespends {
        fn likely_respent(&self, _outpoint: &OutPoint) -> bool {
            false
        }
    }

    struct FlagAll;
    impl RespendDetector for FlagAll {
        fn likely_respent(&self, _outpoint: &OutPoint) -> bool {
            true
        }
    }

    fn entry(tag: u8, fee: Amount, sigops: u64) -> PoolEntry {
        let tx = Transaction {
            version: 1,
            inputs: vec![TxInput::from_outpoint(OutPoint::new([tag; 32], 0))],
            outputs: vec![TxOutput {
                value: COIN,
                script_pubkey: vec![tag],
            }],
            lock_time: 0,
        };
        // Entries default to a first-seen time old enough to pass the
        // pool-age filter when now_micros is large.
        PoolEntry::new(tx, fee, sigops, 0, 0)
    }

    fn gate<'a>(
        config: &'a AssemblerConfig,
        policy: SigOpPolicy,
        respend: &'a dyn RespendDetector,
    ) -> AdmissionGate<'a> {
        AdmissionGate::new(config, policy, 100, 1_000_000, 10_000_000, false, respend)
    }

    // =========================================================================
    // SIZE WINDOW TESTS
    // =========================================================================

    #[test]
    fn test_rejection_far_from_full_has_no_side_effects() {
        let config = AssemblerConfig {
            max_block_size: 100_000,
            ..AssemblerConfig::default()
        };
        let respend = NoRespends;
        let g = gate(&config, SigOpPolicy::Upgraded { max_sigchecks: 1_000 }, &respend);

        // Outside the 1000-byte near-full window: rejection is idempotent.
        let mut state = CandidateBlockState::new(50_000, 0);
        assert!(!g.incrementally_good(&mut state, 60_000, 1));
        assert!(!g.incrementally_good(&mut state, 60_000, 1));
        assert_eq!(state.near_full_attempts, 0);
        assert!(!state.finished);
        assert_eq!(state.block_size, 50_000);
    }

    #[test]
    fn test_near_full_boundary_at_minus_100() {
        let config = AssemblerConfig {
            max_block_size: 100_000,
            ..AssemblerConfig::default()
        };
        let respend = NoRespends;
        let g = gate(&config, SigOpPolicy::Upgraded { max_sigchecks: 1_000 }, &respend);

        // Exactly max - 100: rejected, counter bumped, but not finished.
        let mut state = CandidateBlockState::new(100_000 - 100, 0);
        assert!(!g.incrementally_good(&mut state, 200, 1));
        assert!(!state.finished);
        assert_eq!(state.near_full_attempts, 1);

        // One byte past max - 100: rejected and finished.
        let mut state = CandidateBlockState::new(100_000 - 99, 0);
        assert!(!g.incrementally_good(&mut state, 200, 1));
        assert!(state.finished);
    }

    #[test]
    fn test_fifty_near_full_attempts_close_the_block() {
        let config = AssemblerConfig {
            max_block_size: 100_000,
            ..AssemblerConfig::default()
        };
        let respend = NoRespends;
        let g = gate(&config, SigOpPolicy::Upgraded { max_sigchecks: 1_000 }, &respend);

        let mut state = CandidateBlockState::new(100_000 - 500, 0);
        for _ in 0..51 {
            assert!(!g.incrementally_good(&mut state, 600, 1));
            assert!(!state.finished);
        }
        // Counter now exceeds 50: the next oversized attempt latches.
        assert!(!g.incrementally_good(&mut state, 600, 1));
        assert!(state.finished);
    }

    // =========================================================================
    // SIGOP CAP TESTS
    // =========================================================================

    #[test]
    fn test_sigop_latch_on_admission_within_two_of_cap() {
        let config = AssemblerConfig::default();
        let respend = NoRespends;
        let g = gate(&config, SigOpPolicy::Upgraded { max_sigchecks: 100 }, &respend);

        // At cap - 1, adding one sigop is accepted and latches finished.
        let mut state = CandidateBlockState::new(0, 99);
        assert!(g.incrementally_good(&mut state, 10, 1));
        assert!(state.finished);
    }

    #[test]
    fn test_latched_state_rejects_fitting_candidates() {
        let config = AssemblerConfig::default();
        let respend = NoRespends;
        let g = gate(&config, SigOpPolicy::Upgraded { max_sigchecks: 100 }, &respend);

        let mut state = CandidateBlockState::new(0, 99);
        assert!(g.incrementally_good(&mut state, 10, 1));
        assert!(state.finished);
        // Plenty of room left, but the latch is one-way.
        assert!(!g.incrementally_good(&mut state, 10, 0));
    }

    #[test]
    fn test_sigop_rejection_over_cap() {
        let config = AssemblerConfig::default();
        let respend = NoRespends;
        let g = gate(&config, SigOpPolicy::Upgraded { max_sigchecks: 100 }, &respend);

        let mut state = CandidateBlockState::new(0, 50);
        assert!(!g.incrementally_good(&mut state, 10, 60));
        assert!(!state.finished);

        // Already within 2 of the cap: rejection also latches.
        let mut state = CandidateBlockState::new(0, 99);
        assert!(!g.incrementally_good(&mut state, 10, 5));
        assert!(state.finished);
    }

    #[test]
    fn test_legacy_cap_grows_with_block() {
        let config = AssemblerConfig {
            max_block_size: 4_000_000,
            ..AssemblerConfig::default()
        };
        let respend = NoRespends;
        let g = gate(&config, SigOpPolicy::Legacy, &respend);

        // 20k sigops fit in the first megabyte but 20k + 1 do not.
        let mut state = CandidateBlockState::new(500_000, 20_000);
        assert!(!g.incrementally_good(&mut state, 100, 1));

        // Past the megabyte boundary the cap doubles.
        let mut state = CandidateBlockState::new(1_200_000, 20_000);
        assert!(g.incrementally_good(&mut state, 100, 1));
    }

    // =========================================================================
    // FULL ADMISSION TESTS
    // =========================================================================

    #[test]
    fn test_non_final_transaction_rejected() {
        let config = AssemblerConfig::default();
        let respend = NoRespends;
        let g = gate(&config, SigOpPolicy::Legacy, &respend);

        let mut e = entry(1, 1_000, 1);
        e.tx.lock_time = 500; // height lock above the candidate height
        e.tx.inputs[0].sequence = 0;
        let mut state = CandidateBlockState::new(0, 0);
        assert!(!g.test_for_block(&mut state, &e));
    }

    #[test]
    fn test_min_tx_size_rule() {
        let config = AssemblerConfig::default();
        let respend = NoRespends;
        let g = AdmissionGate::new(
            &config,
            SigOpPolicy::Legacy,
            100,
            1_000_000,
            10_000_000,
            true,
            &respend,
        );

        let mut e = entry(1, 1_000, 1);
        e.size = MIN_TX_SIZE - 1;
        let mut state = CandidateBlockState::new(0, 0);
        assert!(!g.test_for_block(&mut state, &e));

        e.size = MIN_TX_SIZE;
        assert!(g.test_for_block(&mut state, &e));
    }

    #[test]
    fn test_fresh_transaction_rejected() {
        let config = AssemblerConfig::default();
        let respend = NoRespends;
        let g = gate(&config, SigOpPolicy::Legacy, &respend);

        let mut e = entry(1, 1_000, 1);
        e.first_seen_micros = 9_500_000; // half a second before now
        let mut state = CandidateBlockState::new(0, 0);
        assert!(!g.test_for_block(&mut state, &e));
    }

    #[test]
    fn test_respend_flag_rejects() {
        let config = AssemblerConfig::default();
        let respend = FlagAll;
        let g = gate(&config, SigOpPolicy::Legacy, &respend);

        let e = entry(1, 1_000, 1);
        let mut state = CandidateBlockState::new(0, 0);
        assert!(!g.test_for_block(&mut state, &e));
    }

    #[test]
    fn test_clean_transaction_admissible() {
        let config = AssemblerConfig::default();
        let respend = NoRespends;
        let g = gate(&config, SigOpPolicy::Legacy, &respend);

        let e = entry(1, 1_000, 1);
        let mut state = CandidateBlockState::new(0, 0);
        assert!(g.test_for_block(&mut state, &e));
    }

    // =========================================================================
    // PACKAGE PREDICATE TESTS
    // =========================================================================

    #[test]
    fn test_package_sigops_strict_bound() {
        let config = AssemblerConfig::default();
        let respend = NoRespends;
        let g = gate(&config, SigOpPolicy::Upgraded { max_sigchecks: 100 }, &respend);

        let state = CandidateBlockState::new(0, 50);
        assert!(g.package_sigops_ok(&state, 1_000, 49));
        // Landing exactly on the cap is rejected.
        assert!(!g.package_sigops_ok(&state, 1_000, 50));
    }
}
