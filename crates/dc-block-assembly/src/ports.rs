//! Outbound ports: the external collaborators one assembly pass consumes.
//!
//! All ports are synchronous. The engine has no suspension point other
//! than the pool lock; timeouts, if desired, belong to the caller wrapping
//! the whole construction call.

use shared_types::{Hash, OutPoint, SubBlock};

/// Read access to chain state at the current tip.
pub trait ChainView {
    /// Height of the current tip.
    fn tip_height(&self) -> u64;

    /// Hash of the current tip.
    fn tip_hash(&self) -> Hash;

    /// Median time past of the tip, in unix seconds. The lock-time cutoff
    /// for candidate finality.
    fn median_time_past(&self) -> u64;

    /// Network-adjusted wall clock, in unix seconds.
    fn adjusted_time(&self) -> u64;

    /// Wall clock in microseconds, for pool-residency checks.
    fn now_micros(&self) -> u64;

    /// True once the fixed-sigcheck cost model is active at the tip.
    fn upgraded_sigops_active(&self) -> bool;

    /// True once the minimum-transaction-size consensus rule is active.
    fn min_tx_size_active(&self) -> bool;

    /// Compact proof-of-work target for the next block.
    fn next_work_required(&self) -> u32;

    /// Version for a block built on the current tip.
    fn block_version(&self) -> u32;
}

/// The sub-block DAG, consumed only through its ancestor frontier.
///
/// The frontier's internal scoring and ordering belong to the DAG
/// subsystem; the assembler treats the returned hashes as opaque bytes to
/// embed in the proofbase.
pub trait DagView {
    /// Current frontier of ancestor sub-block hashes.
    fn frontier(&self) -> Vec<Hash>;
}

/// Heuristic double-spend detector.
///
/// The predicate has a known non-zero false-positive rate; a false
/// positive only delays a valid transaction to a later template, which is
/// accepted here rather than tightening the check.
pub trait RespendDetector {
    /// True if the referenced output has likely been respent elsewhere.
    fn likely_respent(&self, outpoint: &OutPoint) -> bool;
}

/// External full-consensus validation of a completed candidate.
pub trait TemplateValidator {
    /// Checks the candidate from start to finish on top of the current
    /// tip. Returns the failing consensus rule on rejection.
    fn test_validity(&self, block: &SubBlock) -> std::result::Result<(), String>;
}
