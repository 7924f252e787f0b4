//! Block and header submission.
//!
//! The gate in front of full validation: resolve the would-be height,
//! enforce the AuxPoW/non-AuxPoW dichotomy at the activation height,
//! short-circuit known blocks, and map every outcome onto the BIP22
//! reply taxonomy.

use crate::error::{MiningError, MiningResult};
use crate::signal::TipSignal;
use palladium_chain::{BlockStatus, ChainState, ValidationOutcome};
use palladium_consensus::{Block, BlockHeader};
use parking_lot::RwLock;
use tracing::{debug, info};

/// Standardized submission reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitReply {
    /// Block accepted; the reply wire form is null.
    Accepted,
    Duplicate,
    DuplicateInvalid,
    DuplicateInconclusive,
    /// Predecessor unknown.
    InconclusiveNotBestPrevBlk,
    /// Rejected, with an optional specific reason.
    Rejected(Option<String>),
}

impl SubmitReply {
    /// The BIP22 reply string; `None` stands for the null reply.
    pub fn bip22(&self) -> Option<String> {
        match self {
            SubmitReply::Accepted => None,
            SubmitReply::Duplicate => Some("duplicate".to_string()),
            SubmitReply::DuplicateInvalid => Some("duplicate-invalid".to_string()),
            SubmitReply::DuplicateInconclusive => Some("duplicate-inconclusive".to_string()),
            SubmitReply::InconclusiveNotBestPrevBlk => {
                Some("inconclusive-not-best-prevblk".to_string())
            }
            SubmitReply::Rejected(None) => Some("rejected".to_string()),
            SubmitReply::Rejected(Some(reason)) => Some(format!("rejected: {}", reason)),
        }
    }

    fn from_outcome(outcome: ValidationOutcome) -> SubmitReply {
        match outcome {
            ValidationOutcome::Accepted { .. } => SubmitReply::Accepted,
            ValidationOutcome::Duplicate => SubmitReply::Duplicate,
            ValidationOutcome::DuplicateInvalid => SubmitReply::DuplicateInvalid,
            ValidationOutcome::DuplicateInconclusive => SubmitReply::DuplicateInconclusive,
            ValidationOutcome::UnknownPrev => SubmitReply::InconclusiveNotBestPrevBlk,
            ValidationOutcome::Rejected(err) => {
                SubmitReply::Rejected(Some(err.reject_reason().to_string()))
            }
        }
    }
}

/// Submit a decoded block for full processing.
///
/// Wakes long-pollers when the active tip advances.
pub fn submit_block(
    chain: &RwLock<ChainState>,
    signal: &TipSignal,
    block: &Block,
) -> SubmitReply {
    let mut chain = chain.write();

    // Resolve the height this block would occupy.
    let height = match chain.height_for_prev(&block.header.prev_hash) {
        Some(height) => height,
        None if block.hash() == chain.params().consensus.genesis_hash => 0,
        None => {
            debug!(prev = %block.header.prev_hash, "submitted block builds on unknown prev");
            return SubmitReply::InconclusiveNotBestPrevBlk;
        }
    };

    // The AuxPoW flag must agree with the activation height before
    // anything else is looked at.
    let should_have_auxpow = chain.params().consensus.auxpow_active(height);
    let has_flag = block.header.is_auxpow();
    debug!(
        hash = %block.hash(),
        height,
        should_have_auxpow,
        has_flag,
        "block submitted"
    );
    if should_have_auxpow && !has_flag {
        return SubmitReply::Rejected(Some("bad-auxpow-version-missing".to_string()));
    }
    if !should_have_auxpow && has_flag {
        return SubmitReply::Rejected(Some("bad-auxpow-unexpected".to_string()));
    }
    if should_have_auxpow && block.auxpow.is_none() {
        return SubmitReply::Rejected(Some("bad-auxpow-data-missing".to_string()));
    }

    if block.txs.first().map(|tx| tx.is_coinbase()) != Some(true) {
        return SubmitReply::Rejected(Some("bad-cb-missing".to_string()));
    }

    // Known blocks short-circuit without re-validation.
    match chain.status_of(&block.hash()) {
        Some(BlockStatus::Valid) => return SubmitReply::Duplicate,
        Some(BlockStatus::Failed) => return SubmitReply::DuplicateInvalid,
        _ => {}
    }

    let outcome = chain.process_block(block);
    if let ValidationOutcome::Accepted {
        hash,
        height,
        new_tip: true,
    } = &outcome
    {
        info!(%hash, height, "submitted block extended the best chain");
        signal.notify_tip_changed();
    }
    SubmitReply::from_outcome(outcome)
}

/// Submit a bare header; only valid below the AuxPoW fork.
pub fn submit_header(chain: &RwLock<ChainState>, header: &BlockHeader) -> MiningResult<()> {
    let mut chain = chain.write();

    let height = match chain.height_for_prev(&header.prev_hash) {
        Some(height) => height,
        None => {
            if header.hash() == chain.params().consensus.genesis_hash {
                0
            } else {
                return Err(MiningError::UnknownPrev);
            }
        }
    };
    if chain.params().consensus.auxpow_active(height) {
        return Err(MiningError::HeaderSubmissionWithAuxpow);
    }

    match chain.process_header(header) {
        ValidationOutcome::Rejected(err) => Err(MiningError::HeaderRejected(err.to_string())),
        _ => Ok(()),
    }
}

/// Validate a proposal and map it to the reply taxonomy.
pub fn check_proposal(chain: &RwLock<ChainState>, block: &Block) -> SubmitReply {
    SubmitReply::from_outcome(chain.read().check_proposal(block))
}
