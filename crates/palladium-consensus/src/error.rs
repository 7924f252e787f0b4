//! Error types for consensus validation.

use crate::encode::WireError;
use crate::hash::H256;
use thiserror::Error;

/// Consensus validation errors.
#[derive(Error, Debug)]
pub enum ConsensusError {
    /// Compact bits decode to a negative, zero, overflowing or
    /// above-limit target.
    #[error("bad compact target encoding {0:#010x}")]
    BadPowEncoding(u32),

    /// Hash does not meet the claimed target.
    #[error("proof of work failed: hash {hash} above target for bits {bits:#010x}")]
    BadPow { hash: H256, bits: u32 },

    /// Header bits differ from what the difficulty engine requires.
    #[error("incorrect difficulty: got {got:#010x}, expected {expected:#010x}")]
    BadDiffBits { got: u32, expected: u32 },

    /// Block timestamp is not after the median time of its ancestors.
    #[error("block time {time} not after median time past {median}")]
    TimeTooOld { time: u32, median: u32 },

    /// Header merkle root does not match the transaction set.
    #[error("merkle root mismatch: got {got}, expected {expected}")]
    BadMerkleRoot { got: H256, expected: H256 },

    /// First transaction is not a coinbase, or a later one is.
    #[error("bad coinbase: {0}")]
    BadCoinbase(String),

    /// AuxPoW version bit does not match the activation height.
    #[error("auxpow flag {flag_set} does not match activation state at height {height}")]
    AuxVersionMismatch { height: i32, flag_set: bool },

    /// AuxPoW flag set but no proof attached.
    #[error("auxpow flag set but proof data missing")]
    AuxMissing,

    /// Parent coinbase branch does not reach the parent merkle root.
    #[error("auxpow coinbase branch does not reach parent merkle root {expected}")]
    AuxBadMerkle { expected: H256 },

    /// Commitment magic absent or followed by too little data.
    #[error("auxpow commitment magic not found in parent coinbase script")]
    AuxMagicNotFound,

    /// Parent coinbase commits to a different block hash.
    #[error("auxpow commitment mismatch: committed {committed}, expected {expected}")]
    AuxCommitMismatch { committed: H256, expected: H256 },

    /// Parent block PoW already used by a connected block.
    #[error("duplicate auxpow parent block hash {0}")]
    AuxDuplicateParent(H256),

    /// Block hash differs from a checkpoint at its height.
    #[error("block at height {height} does not match checkpoint {expected}")]
    CheckpointMismatch { height: i32, expected: H256 },

    /// Header-level rule violation not covered by a specific variant.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// Block-level rule violation not covered by a specific variant.
    #[error("invalid block: {0}")]
    InvalidBlock(String),

    /// Serialization problem while decoding submitted data.
    #[error("wire format error: {0}")]
    Wire(#[from] WireError),
}

impl ConsensusError {
    /// Short BIP22-style rejection slug for this error.
    pub fn reject_reason(&self) -> &'static str {
        match self {
            ConsensusError::BadPowEncoding(_) => "bad-diffbits",
            ConsensusError::BadPow { .. } => "high-hash",
            ConsensusError::BadDiffBits { .. } => "bad-diffbits",
            ConsensusError::TimeTooOld { .. } => "time-too-old",
            ConsensusError::BadMerkleRoot { .. } => "bad-txnmrklroot",
            ConsensusError::BadCoinbase(_) => "bad-cb-missing",
            ConsensusError::AuxVersionMismatch { flag_set: true, .. } => "bad-auxpow-unexpected",
            ConsensusError::AuxVersionMismatch { .. } => "bad-auxpow-version-missing",
            ConsensusError::AuxMissing => "bad-auxpow-data-missing",
            ConsensusError::AuxBadMerkle { .. } => "bad-auxpow-merkle",
            ConsensusError::AuxMagicNotFound => "bad-auxpow-commit",
            ConsensusError::AuxCommitMismatch { .. } => "bad-auxpow-commit",
            ConsensusError::AuxDuplicateParent(_) => "bad-auxpow-dup-parent",
            ConsensusError::CheckpointMismatch { .. } => "checkpoint-mismatch",
            ConsensusError::InvalidHeader(_) => "invalid-header",
            ConsensusError::InvalidBlock(_) => "bad-blk",
            ConsensusError::Wire(_) => "malformed",
        }
    }
}

/// Result type for consensus operations.
pub type ConsensusResult<T> = Result<T, ConsensusError>;
