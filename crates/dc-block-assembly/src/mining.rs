//! Template maintenance during proof-of-work search.
//!
//! A miner grinding on one template periodically re-stamps the proofbase
//! with a fresh extra nonce (changing the merkle root and therefore the
//! search space) and nudges the header time forward.

use crate::ports::ChainView;
use crate::proofbase::ProofbaseBuilder;
use shared_types::{BlockHeader, Hash, SubBlock, MIN_TX_SIZE};

/// Extra-nonce state for one mining loop.
///
/// The counter restarts whenever the template's previous-block hash
/// changes, so nonce reuse across different tips is impossible within
/// one tracker.
#[derive(Debug, Default)]
pub struct ExtraNonceTracker {
    last_prev: Hash,
    extra_nonce: u32,
}

impl ExtraNonceTracker {
    /// Creates a tracker with a zeroed counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamps the next extra nonce into the block's proofbase and
    /// recomputes the merkle root. Returns the nonce used.
    pub fn stamp(
        &mut self,
        block: &mut SubBlock,
        builder: &ProofbaseBuilder,
        min_tx_size_active: bool,
    ) -> u32 {
        if block.header.prev_block != self.last_prev {
            self.last_prev = block.header.prev_block;
            self.extra_nonce = 0;
        }
        self.extra_nonce += 1;

        if let Some(proofbase) = block.transactions.first_mut() {
            proofbase.inputs[0].script_sig = builder.signature_script(self.extra_nonce);
            if min_tx_size_active {
                let size = proofbase.serialized_size();
                if size < MIN_TX_SIZE {
                    let padding = (MIN_TX_SIZE - size) as usize;
                    proofbase.inputs[0]
                        .script_sig
                        .extend(std::iter::repeat(0u8).take(padding));
                }
            }
        }
        block.header.merkle_root = block.merkle_root();
        self.extra_nonce
    }
}

/// Moves the header time forward to the later of median-time-past plus
/// one and the network-adjusted clock. The time never moves backwards;
/// the returned delta may be non-positive when no update was needed.
pub fn update_time(header: &mut BlockHeader, chain: &dyn ChainView) -> i64 {
    let old = header.time;
    let new = (chain.median_time_past() + 1).max(chain.adjusted_time());
    if new > old {
        header.time = new;
    }
    new as i64 - old as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedChain {
        mtp: u64,
        adjusted: u64,
    }

    impl ChainView for FixedChain {
        fn tip_height(&self) -> u64 {
            0
        }
        fn tip_hash(&self) -> Hash {
            [0u8; 32]
        }
        fn median_time_past(&self) -> u64 {
            self.mtp
        }
        fn adjusted_time(&self) -> u64 {
            self.adjusted
        }
        fn now_micros(&self) -> u64 {
            0
        }
        fn upgraded_sigops_active(&self) -> bool {
            false
        }
        fn min_tx_size_active(&self) -> bool {
            false
        }
        fn next_work_required(&self) -> u32 {
            0
        }
        fn block_version(&self) -> u32 {
            1
        }
    }

    fn block_on(prev: Hash) -> SubBlock {
        let builder = ProofbaseBuilder::new(vec![0xAA], "test".into());
        let mut block = SubBlock {
            header: BlockHeader {
                prev_block: prev,
                ..BlockHeader::default()
            },
            transactions: vec![builder.build(&[], false)],
        };
        block.header.merkle_root = block.merkle_root();
        block
    }

    #[test]
    fn test_stamp_increments_and_changes_merkle_root() {
        let builder = ProofbaseBuilder::new(vec![0xAA], "test".into());
        let mut tracker = ExtraNonceTracker::new();
        let mut block = block_on([0x11; 32]);

        let before = block.header.merkle_root;
        assert_eq!(tracker.stamp(&mut block, &builder, false), 1);
        assert_ne!(block.header.merkle_root, before);
        assert_eq!(tracker.stamp(&mut block, &builder, false), 2);
    }

    #[test]
    fn test_counter_resets_on_new_tip() {
        let builder = ProofbaseBuilder::new(vec![0xAA], "test".into());
        let mut tracker = ExtraNonceTracker::new();

        let mut block = block_on([0x11; 32]);
        tracker.stamp(&mut block, &builder, false);
        tracker.stamp(&mut block, &builder, false);

        let mut next = block_on([0x22; 32]);
        assert_eq!(tracker.stamp(&mut next, &builder, false), 1);
    }

    #[test]
    fn test_update_time_takes_later_of_mtp_and_clock() {
        let mut header = BlockHeader::default();

        let chain = FixedChain {
            mtp: 1_000,
            adjusted: 900,
        };
        update_time(&mut header, &chain);
        assert_eq!(header.time, 1_001);

        let chain = FixedChain {
            mtp: 1_000,
            adjusted: 2_000,
        };
        assert_eq!(update_time(&mut header, &chain), 999);
        assert_eq!(header.time, 2_000);
    }

    #[test]
    fn test_update_time_never_moves_backwards() {
        let mut header = BlockHeader {
            time: 5_000,
            ..BlockHeader::default()
        };
        let chain = FixedChain {
            mtp: 1_000,
            adjusted: 1_500,
        };
        let delta = update_time(&mut header, &chain);
        assert_eq!(header.time, 5_000);
        assert!(delta < 0);
    }
}
