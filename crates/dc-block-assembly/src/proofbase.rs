//! Proofbase construction.
//!
//! The proofbase is the block's mandatory first transaction. Instead of a
//! plain coinbase it carries one input per ancestor-frontier hash; its
//! first input spends the null outpoint and holds the extra nonce plus
//! the miner comment. When the frontier is empty a sentinel input is
//! synthesized so the transaction never degenerates into a structure
//! another proofbase could collide with.

use crate::config::AssemblerConfig;
use shared_types::{
    BlockHeader, Hash, OutPoint, Transaction, TxInput, TxOutput, MIN_TX_SIZE,
    PROOFBASE_SENTINEL_INDEX,
};

/// Builds the proofbase for one template.
pub struct ProofbaseBuilder {
    script_pubkey: Vec<u8>,
    miner_comment: String,
}

impl ProofbaseBuilder {
    /// Creates a builder paying out to `script_pubkey`.
    pub fn new(script_pubkey: Vec<u8>, miner_comment: String) -> Self {
        Self {
            script_pubkey,
            miner_comment,
        }
    }

    /// The signature script of the proofbase's first input: the extra
    /// nonce followed by the miner comment, clipped to the script cap.
    pub fn signature_script(&self, extra_nonce: u32) -> Vec<u8> {
        let mut script = extra_nonce.to_le_bytes().to_vec();
        let comment = self.miner_comment.as_bytes();
        let room = crate::MAX_PROOFBASE_SCRIPT_SIG.saturating_sub(script.len());
        script.extend_from_slice(&comment[..comment.len().min(room)]);
        script
    }

    /// Constructs the proofbase over the given ancestor frontier.
    ///
    /// When the min-tx-size rule is active the first input's script is
    /// zero-padded until the whole transaction reaches the floor; padding
    /// may push the script past the comment cap, which only limits the
    /// comment itself.
    pub fn build(&self, frontier: &[Hash], min_tx_size_active: bool) -> Transaction {
        let mut inputs = vec![TxInput {
            prevout: OutPoint::null(),
            script_sig: self.signature_script(0),
            sequence: u32::MAX,
        }];
        if frontier.is_empty() {
            inputs.push(TxInput::from_outpoint(OutPoint::new(
                [0u8; 32],
                PROOFBASE_SENTINEL_INDEX,
            )));
        } else {
            for hash in frontier {
                inputs.push(TxInput::from_outpoint(OutPoint::new(*hash, 0)));
            }
        }

        let mut tx = Transaction {
            version: 1,
            inputs,
            outputs: vec![TxOutput {
                value: 0,
                script_pubkey: self.script_pubkey.clone(),
            }],
            lock_time: 0,
        };

        if min_tx_size_active {
            let size = tx.serialized_size();
            if size < MIN_TX_SIZE {
                let padding = (MIN_TX_SIZE - size) as usize;
                tx.inputs[0].script_sig.extend(std::iter::repeat(0u8).take(padding));
            }
        }
        tx
    }

    /// The serialized-size reservation made before selection starts.
    ///
    /// Covers the header, the transaction-count prefix and the larger of
    /// the natural proofbase size and the configured (or per-request
    /// overridden) reservation, so the final proofbase can never push the
    /// block past its size cap.
    pub fn reserve_size(
        &self,
        frontier: &[Hash],
        reserve_override: Option<u64>,
        config: &AssemblerConfig,
        min_tx_size_active: bool,
    ) -> u64 {
        let natural = self.build(frontier, min_tx_size_active).serialized_size();
        let reserved = natural.max(reserve_override.unwrap_or(config.proofbase_reserve));
        BlockHeader::default().serialized_size() + crate::TX_COUNT_PREFIX_SIZE + reserved
    }
}
