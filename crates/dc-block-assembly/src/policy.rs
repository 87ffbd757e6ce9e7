//! Signature-operation cost models.

use crate::ports::ChainView;

/// The sigop cap model active for one template.
///
/// Selected once per template from the chain's upgrade flags; admission
/// code dispatches on the variant instead of re-checking activation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SigOpPolicy {
    /// Cap scales with the serialized block size.
    Legacy,
    /// Cap is a fixed sigcheck budget.
    Upgraded {
        /// The per-block sigcheck budget.
        max_sigchecks: u64,
    },
}

impl SigOpPolicy {
    /// Selects the model for the current tip.
    pub fn for_chain(chain: &dyn ChainView, max_sigchecks: u64) -> Self {
        if chain.upgraded_sigops_active() {
            Self::Upgraded { max_sigchecks }
        } else {
            Self::Legacy
        }
    }

    /// The sigop cap applicable at `block_size` serialized bytes.
    pub fn cap(&self, block_size: u64) -> u64 {
        match self {
            Self::Legacy => {
                (block_size.saturating_sub(1) / 1_000_000 + 1) * crate::LEGACY_SIGOPS_PER_MB
            }
            Self::Upgraded { max_sigchecks } => *max_sigchecks,
        }
    }
}
