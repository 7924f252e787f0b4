//! # palladium-chain
//!
//! In-memory chain state for the Palladium consensus core.
//!
//! This crate provides:
//! - An arena-based block index with skip-list ancestor walks
//! - Chain-work accounting and most-work tip selection
//! - Full block and header validation against the consensus rules
//! - The duplicate-parent set guarding merge-mined blocks
//!
//! The index is a DAG with parent links only; entries are addressed by
//! integer ids, never by back pointers. All mutation happens under the
//! caller's validation lock.

mod index;
mod state;

pub use index::{block_proof, BlockIndex, BlockStatus, IndexEntry};
pub use state::{ChainState, ValidationOutcome};
