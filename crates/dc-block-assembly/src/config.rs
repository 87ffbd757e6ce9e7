//! Configuration for the assembler.

use serde::Deserialize;
use shared_types::FeeRate;

/// Runtime configuration for candidate-block assembly.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AssemblerConfig {
    /// Largest block to create, in serialized bytes.
    pub max_block_size: u64,

    /// Minimum block size: the block is filled with below-relay-fee
    /// transactions until it reaches this size.
    pub min_block_size: u64,

    /// Share of the block dedicated to high-priority transactions,
    /// included regardless of the fees they pay. Zero disables the
    /// priority pass.
    pub priority_size: u64,

    /// Serialized-size reservation for the proofbase, when larger than
    /// the natural proofbase size.
    pub proofbase_reserve: u64,

    /// Minimum relay fee rate; the package pass stops scanning once every
    /// remaining package pays less than this.
    pub min_relay_fee: FeeRate,

    /// Fixed sigcheck budget used when the upgraded cost model is active.
    pub max_sigchecks: u64,

    /// Select by ancestor package (child-pays-for-parent) instead of by
    /// single-transaction score.
    pub use_cpfp: bool,

    /// Comment embedded in the proofbase signature script, clipped to the
    /// maximum script size.
    pub miner_comment: String,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            max_block_size: crate::DEFAULT_MAX_BLOCK_SIZE,
            min_block_size: 0,
            priority_size: crate::DEFAULT_BLOCK_PRIORITY_SIZE,
            proofbase_reserve: crate::DEFAULT_PROOFBASE_RESERVE,
            min_relay_fee: FeeRate::per_kb(crate::DEFAULT_MIN_RELAY_FEE_PER_KB),
            max_sigchecks: crate::DEFAULT_MAX_SIGCHECKS,
            use_cpfp: true,
            miner_comment: String::new(),
        }
    }
}

impl AssemblerConfig {
    /// Clamps the size knobs to sane relative values: neither the minimum
    /// block size nor the priority budget may exceed the maximum size.
    pub fn normalized(mut self) -> Self {
        self.min_block_size = self.min_block_size.min(self.max_block_size);
        self.priority_size = self.priority_size.min(self.max_block_size);
        self
    }
}
