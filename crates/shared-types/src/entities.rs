//! # Core Chain Entities
//!
//! Transactions, outpoints, headers and sub-blocks for the delta-block
//! chain. Serialized sizes are computed with bincode, which is also the
//! canonical wire encoding for these types.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A 32-byte transaction or block hash.
pub type Hash = [u8; 32];

/// An amount in base units (satoshis). Signed so fee deltas and the
/// proofbase fee-claim convention (negative of collected fees) fit.
pub type Amount = i64;

/// One coin in base units.
pub const COIN: Amount = 100_000_000;

/// Minimum serialized transaction size once the min-tx-size rule is active.
pub const MIN_TX_SIZE: u64 = 100;

/// Lock-time values below this threshold are block heights, values at or
/// above it are unix timestamps.
pub const LOCKTIME_THRESHOLD: u32 = 500_000_000;

/// Outpoint index used for the synthesized proofbase sentinel input.
///
/// Must be non-zero so the sentinel never collides with the null outpoint
/// carried by the proofbase's first input.
pub const PROOFBASE_SENTINEL_INDEX: u32 = 1;

/// A reference to an output of a prior transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    /// Hash of the referenced transaction.
    pub txid: Hash,
    /// Index of the referenced output.
    pub index: u32,
}

impl OutPoint {
    /// Creates an outpoint.
    pub fn new(txid: Hash, index: u32) -> Self {
        Self { txid, index }
    }

    /// The null outpoint carried by a proofbase's first input.
    pub fn null() -> Self {
        Self {
            txid: [0u8; 32],
            index: 0,
        }
    }

    /// Returns true for the null outpoint.
    pub fn is_null(&self) -> bool {
        *self == Self::null()
    }
}

/// A transaction input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    /// The spent output.
    pub prevout: OutPoint,
    /// Unlocking script.
    pub script_sig: Vec<u8>,
    /// Sequence number; `u32::MAX` disables lock-time for this input.
    pub sequence: u32,
}

impl TxInput {
    /// Creates an input spending `prevout` with an empty script.
    pub fn from_outpoint(prevout: OutPoint) -> Self {
        Self {
            prevout,
            script_sig: Vec::new(),
            sequence: u32::MAX,
        }
    }
}

/// A transaction output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Value in base units.
    pub value: Amount,
    /// Locking script.
    pub script_pubkey: Vec<u8>,
}

/// A raw transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Protocol version of this transaction.
    pub version: u32,
    /// Spent outputs.
    pub inputs: Vec<TxInput>,
    /// Created outputs.
    pub outputs: Vec<TxOutput>,
    /// Earliest height/time this transaction may be mined at.
    pub lock_time: u32,
}

impl Transaction {
    /// Computes the transaction hash (double SHA-256 of the encoding).
    pub fn txid(&self) -> Hash {
        let encoded = bincode::serialize(self).expect("transaction encoding is infallible");
        sha256d(&encoded)
    }

    /// Canonical serialized size in bytes.
    pub fn serialized_size(&self) -> u64 {
        bincode::serialized_size(self).expect("transaction encoding is infallible")
    }

    /// Checks whether the lock-time is satisfied at the given candidate
    /// height and time cutoff (median time past).
    ///
    /// A lock-time below [`LOCKTIME_THRESHOLD`] is compared against the
    /// height, otherwise against the time cutoff. Inputs that all carry the
    /// maximum sequence number opt out of lock-time enforcement.
    pub fn is_final(&self, height: u64, time_cutoff: u64) -> bool {
        if self.lock_time == 0 {
            return true;
        }
        let cutoff = if u64::from(self.lock_time) < u64::from(LOCKTIME_THRESHOLD) {
            height
        } else {
            time_cutoff
        };
        if u64::from(self.lock_time) < cutoff {
            return true;
        }
        self.inputs.iter().all(|input| input.sequence == u32::MAX)
    }

    /// Returns true if this transaction has the proofbase shape: first
    /// input spends the null outpoint and at least one more input carries
    /// an ancestor reference or the sentinel.
    pub fn is_proofbase(&self) -> bool {
        self.inputs.len() >= 2 && self.inputs[0].prevout.is_null()
    }
}

/// The header of a sub-block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockHeader {
    /// Protocol version for this block.
    pub version: u32,
    /// Hash of the chain tip this candidate extends.
    pub prev_block: Hash,
    /// Merkle root of the transaction list.
    pub merkle_root: Hash,
    /// Unix timestamp of the block.
    pub time: u64,
    /// Compact encoding of the proof-of-work target.
    pub bits: u32,
    /// Proof-of-work nonce.
    pub nonce: u64,
}

impl BlockHeader {
    /// Canonical serialized size in bytes. Fixed for all headers.
    pub fn serialized_size(&self) -> u64 {
        bincode::serialized_size(self).expect("header encoding is infallible")
    }

    /// Computes the header hash (double SHA-256 of the encoding).
    pub fn hash(&self) -> Hash {
        let encoded = bincode::serialize(self).expect("header encoding is infallible");
        sha256d(&encoded)
    }
}

/// A sub-block: header plus ordered transaction list, proofbase first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SubBlock {
    /// The block header.
    pub header: BlockHeader,
    /// All transactions; index 0 is the proofbase.
    pub transactions: Vec<Transaction>,
}

impl SubBlock {
    /// Computes the merkle root over the transaction list.
    ///
    /// Pairwise double SHA-256; an odd level duplicates its last node.
    /// An empty list yields the zero hash.
    pub fn merkle_root(&self) -> Hash {
        let mut level: Vec<Hash> = self.transactions.iter().map(Transaction::txid).collect();
        if level.is_empty() {
            return [0u8; 32];
        }
        while level.len() > 1 {
            if level.len() % 2 == 1 {
                let last = level[level.len() - 1];
                level.push(last);
            }
            level = level
                .chunks(2)
                .map(|pair| {
                    let mut buf = [0u8; 64];
                    buf[..32].copy_from_slice(&pair[0]);
                    buf[32..].copy_from_slice(&pair[1]);
                    sha256d(&buf)
                })
                .collect();
        }
        level[0]
    }
}

fn sha256d(data: &[u8]) -> Hash {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}
