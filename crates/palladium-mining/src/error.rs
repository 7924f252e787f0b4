//! Mining error types.

use thiserror::Error;

/// Mining errors.
#[derive(Error, Debug)]
pub enum MiningError {
    /// Long-poll id does not have the `<tip hash><counter>` shape.
    #[error("invalid longpollid format: {0}")]
    InvalidLongPollId(String),

    /// Template request is missing a required rule.
    #[error("invalid template request: {0}")]
    InvalidRequest(String),

    /// Header-only submission attempted at or past the AuxPoW fork.
    #[error("header submission is incompatible with active auxpow")]
    HeaderSubmissionWithAuxpow,

    /// Header submission referenced an unknown predecessor.
    #[error("previous block not known")]
    UnknownPrev,

    /// Header failed validation.
    #[error("header rejected: {0}")]
    HeaderRejected(String),

    /// On-demand generation requested outside regtest.
    #[error("block generation is only available on regtest")]
    GenerateDisabled,

    /// Nonce space exhausted before a solution was found.
    #[error("ran out of tries while searching for a solution")]
    OutOfTries,

    /// The node is shutting down.
    #[error("shutting down")]
    ShuttingDown,

    /// Consensus failure surfaced through mining paths.
    #[error("consensus error: {0}")]
    Consensus(#[from] palladium_consensus::ConsensusError),

    /// Anything else.
    #[error("{0}")]
    Internal(String),
}

/// Result type for mining operations.
pub type MiningResult<T> = Result<T, MiningError>;
