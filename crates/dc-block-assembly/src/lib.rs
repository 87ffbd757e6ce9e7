//! # Delta-Chain Block Assembly
//!
//! Builds candidate sub-block templates from the transaction pool.
//!
//! ## Purpose
//!
//! Given the pool's dependency-linked entries, select the subset that
//! maximizes miner revenue under the block's size and sigop budgets and
//! package it into a deterministic, externally-validatable template:
//!
//! - Priority selection first, to guarantee space for aged coin-age
//!   transactions regardless of fee
//! - Then exactly one of score selection (single-transaction fee rate) or
//!   package selection (child-pays-for-parent over whole ancestor groups)
//! - A proofbase transaction in slot 0 carrying the DAG ancestor frontier
//! - An external full-consensus check before the template is returned
//!
//! ## Critical Invariants
//!
//! 1. **Budget**: running size/sigop totals equal the sums over the
//!    included set and never exceed the configured caps
//! 2. **Topology**: a transaction is only admitted once every in-pool
//!    parent is already in the included set
//! 3. **Package atomicity**: an ancestor package is admitted whole or not
//!    at all
//! 4. **Monotonic included set**: admissions only grow the set; rejection
//!    is silent control flow, never an error
//! 5. **One fatal exit**: only the external validity check aborts template
//!    construction
//!
//! ## Module Structure
//!
//! - [`assembler`]: orchestration and the template type
//! - [`state`]: the per-template accumulator
//! - [`gate`]: admission predicates and closing heuristics
//! - [`strategy`]: the priority, score and package selection passes
//! - [`proofbase`]: first-slot transaction construction and reservation
//! - [`ports`]: outbound seams (chain, DAG, respend detector, validator)
//! - [`mining`]: extra-nonce stamping and header time maintenance
//! - [`metrics`]: process-wide assembly statistics

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assembler;
pub mod gate;
pub mod metrics;
pub mod mining;
pub mod ports;
pub mod proofbase;
pub mod state;
pub mod strategy;

mod config;
mod error;
mod policy;

pub use assembler::{SubBlockAssembler, SubBlockTemplate};
pub use config::AssemblerConfig;
pub use error::{AssemblyError, Result};
pub use gate::AdmissionGate;
pub use metrics::AssemblyMetrics;
pub use mining::{update_time, ExtraNonceTracker};
pub use policy::SigOpPolicy;
pub use ports::{ChainView, DagView, RespendDetector, TemplateValidator};
pub use proofbase::ProofbaseBuilder;
pub use state::CandidateBlockState;
pub use strategy::{add_package_txs, add_priority_txs, add_score_txs, PackageScan};

/// Largest block the assembler will create by default, in bytes.
pub const DEFAULT_MAX_BLOCK_SIZE: u64 = 2_000_000;

/// Default share of the block reserved for coin-age priority transactions.
pub const DEFAULT_BLOCK_PRIORITY_SIZE: u64 = 50_000;

/// Default serialized-size reservation for the miner's own proofbase.
///
/// Miners take the template, wipe the proofbase and substitute their own,
/// so the reservation must cover whichever is larger.
pub const DEFAULT_PROOFBASE_RESERVE: u64 = 1_000;

/// Default minimum relay fee rate in base units per kilobyte.
pub const DEFAULT_MIN_RELAY_FEE_PER_KB: i64 = 1_000;

/// Fixed sigcheck budget per block under the upgraded cost model.
pub const DEFAULT_MAX_SIGCHECKS: u64 = 141_000;

/// Sigop cap per megabyte of block size under the legacy cost model.
pub const LEGACY_SIGOPS_PER_MB: u64 = 20_000;

/// Sigops reserved for the miner's proofbase transaction.
pub const PROOFBASE_SIGOPS_RESERVE: u64 = 100;

/// Maximum proofbase signature-script size; the miner comment is clipped
/// to fit.
pub const MAX_PROOFBASE_SCRIPT_SIG: usize = 100;

/// Maximum failed attempts to fit an ancestor package before the package
/// pass bails out of a near-full block.
pub const MAX_PACKAGE_FAILURES: u64 = 5;

/// Coin-age priority above which a transaction rides for free.
///
/// One coin held for 144 blocks, spent in a 250-byte transaction.
pub const ALLOW_FREE_THRESHOLD: f64 = shared_types::COIN as f64 * 144.0 / 250.0;

/// Minimum pool residency before a transaction is considered, in
/// microseconds. Keeps just-relayed transactions out of the template.
pub const MIN_ENTRY_AGE_MICROS: u64 = 1_000_000;

/// Serialized size of the transaction-count prefix in a sub-block.
pub const TX_COUNT_PREFIX_SIZE: u64 = 8;
