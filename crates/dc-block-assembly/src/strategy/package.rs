//! Ancestor-package (child-pays-for-parent) selection.

use crate::config::AssemblerConfig;
use crate::gate::AdmissionGate;
use crate::state::CandidateBlockState;
use dc_mempool::TransactionPool;
use shared_types::Hash;

/// Outcome counters for one package pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PackageScan {
    /// Packages whose lead entry was examined.
    pub considered: u64,
    /// Packages that no longer fit a more-than-half-full block.
    pub failures: u64,
}

/// Fills the block in descending ancestor-package fee-rate order.
///
/// Each candidate is the entry plus its unconfirmed ancestors not already
/// in the block, admitted as one unit or not at all. Two early exits
/// bound the pass: once every remaining package pays below the relay
/// floor (and the block has reached its minimum size), and after
/// [`MAX_PACKAGE_FAILURES`](crate::MAX_PACKAGE_FAILURES) oversized
/// packages on a more-than-half-full block.
pub fn add_package_txs(
    pool: &TransactionPool,
    gate: &AdmissionGate<'_>,
    state: &mut CandidateBlockState,
    selected: &mut Vec<Hash>,
    config: &AssemblerConfig,
) -> PackageScan {
    let mut scan = PackageScan::default();

    for entry in pool.iter_by_ancestor_score() {
        if state.finished {
            break;
        }
        if state.contains(&entry.txid) {
            continue;
        }
        scan.considered += 1;

        let mut package_size = entry.size_with_ancestors;
        let package_fee = entry.fee_with_ancestors;
        let mut package_sigops = entry.sigops_with_ancestors;

        let mut members = pool.ancestors_of(&entry.txid, state.included());
        members.insert(entry.txid);

        // Earlier packages may have pulled in some of these ancestors, in
        // which case the cached aggregates over-count. The fee aggregate
        // is left as cached: it can only understate the package's rate,
        // never inflate it past its index position.
        if (members.len() as u64) < entry.count_with_ancestors {
            package_size = 0;
            package_sigops = 0;
            for txid in &members {
                if let Some(member) = pool.get(txid) {
                    package_size = package_size.saturating_add(member.size);
                    package_sigops = package_sigops.saturating_add(member.sigops);
                }
            }
        }

        // The index is sorted by this very rate, so everything after this
        // entry pays even less.
        if package_fee < config.min_relay_fee.fee_for(package_size)
            && state.block_size >= config.min_block_size
        {
            tracing::debug!(
                considered = scan.considered,
                block_size = state.block_size,
                "package pass hit relay-fee floor"
            );
            return scan;
        }

        if state.block_size.saturating_add(package_size) > config.max_block_size {
            // A handful of oversized packages on a half-full block means
            // the tail would be all misses; give up early.
            if state.block_size.saturating_mul(2) > config.max_block_size {
                scan.failures += 1;
                if scan.failures >= crate::MAX_PACKAGE_FAILURES {
                    tracing::debug!(
                        considered = scan.considered,
                        "package pass exhausted failure budget"
                    );
                    return scan;
                }
            }
            continue;
        }

        if !gate.package_sigops_ok(state, package_size, package_sigops) {
            continue;
        }
        if !gate.package_final(pool, &members) {
            continue;
        }

        // Admit the whole package, parents before children so the
        // included set stays dependency-valid at every step.
        let mut ordered: Vec<Hash> = members.into_iter().collect();
        ordered.sort_by_key(|txid| {
            pool.get(txid)
                .map(|member| member.count_with_ancestors)
                .unwrap_or(u64::MAX)
        });
        for txid in ordered {
            let Some(member) = pool.get(&txid) else {
                continue;
            };
            state.admit(member);
            selected.push(txid);
            tracing::debug!(
                txid = %hex::encode(&txid[..4]),
                package_fee,
                package_size,
                "package add"
            );
        }
    }

    scan
}
