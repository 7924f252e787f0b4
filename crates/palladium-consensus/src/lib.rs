//! # palladium-consensus
//!
//! Consensus rules for the Palladium blockchain.
//!
//! This crate provides:
//! - Chain parameters for main, test and regtest networks
//! - The compact (nBits) target codec
//! - Double-SHA256 hashing and Merkle tree helpers
//! - Difficulty retargeting (legacy Bitcoin-style and LWMA)
//! - Proof-of-Work verification, including auxiliary PoW for
//!   merge-mined blocks
//! - Block, header and transaction primitives with their wire encoding
//!
//! ## Difficulty
//!
//! Palladium retargets with the original Bitcoin algorithm below block
//! 29000 and with a linearly weighted moving average (N=240, T=120s)
//! from block 29000 on. The 70 blocks leading up to the switch reset to
//! the minimum difficulty so the LWMA window starts from a clean slate.
//!
//! ## AuxPoW
//!
//! From the activation height on, every block must carry proof-of-work
//! performed on a parent chain: the parent block's coinbase commits to
//! the Palladium block hash behind the magic prefix `70 6c 6d 01`.

pub mod auxpow;
pub mod block;
pub mod compact;
pub mod difficulty;
pub mod encode;
mod error;
pub mod hash;
pub mod merkle;
pub mod params;
pub mod pow;
pub mod script;
pub mod transaction;

pub use auxpow::{expected_commitment, AuxPow, AUXPOW_CHAIN_ID, AUXPOW_MAGIC};
pub use block::{Block, BlockHeader, AUXPOW_VERSION_BIT, BASE_VERSION};
pub use compact::{decode_compact, encode_compact};
pub use difficulty::{
    lwma_next_work, next_work_required, ChainEntry, HeaderChain, LWMA_ACTIVATION_HEIGHT,
};
pub use encode::{Decodable, Encodable, WireError};
pub use error::{ConsensusError, ConsensusResult};
pub use hash::{double_sha256, H256};
pub use merkle::{merkle_root, merkle_root_from_branch};
pub use params::{
    block_subsidy, params, select_params, ChainParams, ChainParamsError, ConsensusParams,
    Deployment, DeploymentPos, Network, RegtestOverrides, COIN, MAX_BLOCK_HEIGHT,
};
pub use pow::check_pow;
pub use script::Script;
pub use transaction::{OutPoint, Transaction, TxIn, TxOut};
