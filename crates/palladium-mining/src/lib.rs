//! # palladium-mining
//!
//! Mining support for the Palladium node.
//!
//! This crate provides:
//! - A fee-ordered transaction pool feeding block templates
//! - BIP22-style block template construction with long polling
//! - The submission gate enforcing the AuxPoW/non-AuxPoW dichotomy
//! - Mapping of validation outcomes to the standardized reply strings
//! - A regtest-only CPU block generator

mod error;
mod generator;
mod pool;
mod signal;
mod submit;
mod template;

pub use error::{MiningError, MiningResult};
pub use generator::generate_blocks;
pub use pool::{PoolEntry, TxPool};
pub use signal::TipSignal;
pub use submit::{check_proposal, submit_block, submit_header, SubmitReply};
pub use template::{
    AuxTemplate, BlockTemplate, TemplateBuilder, TemplateRequest, TemplateTransaction,
};

/// Maximum transactions drawn into one template.
pub const MAX_TEMPLATE_TRANSACTIONS: usize = 1000;

/// Block weight ceiling advertised to miners.
pub const MAX_BLOCK_WEIGHT: i64 = 4_000_000;

/// Sigop-cost ceiling advertised to miners.
pub const MAX_BLOCK_SIGOPS_COST: i64 = 80_000;

/// Witness scale factor for legacy limit reporting.
pub const WITNESS_SCALE_FACTOR: i64 = 4;
