//! Chain state: validation, connection and tip selection.

use crate::index::{BlockIndex, BlockStatus};
use palladium_consensus::{
    check_pow, next_work_required, Block, BlockHeader, ChainEntry, ChainParams, ConsensusError,
    HeaderChain, H256,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of offering a block or header to the chain.
#[derive(Debug)]
pub enum ValidationOutcome {
    /// Connected or stored; `new_tip` says whether the active chain
    /// advanced.
    Accepted { hash: H256, height: i32, new_tip: bool },
    /// Already known and fully valid.
    Duplicate,
    /// Already known and marked failed.
    DuplicateInvalid,
    /// Header already known as part of a failed block.
    DuplicateInconclusive,
    /// The predecessor is not in the index.
    UnknownPrev,
    /// Failed validation; the hash is remembered as invalid.
    Rejected(ConsensusError),
}

/// The in-memory chain protected by the caller's validation lock.
///
/// Everything that must move together on a tip change — the index,
/// the active-chain vector and the duplicate-parent set — lives here
/// and is updated in one call.
pub struct ChainState {
    params: Arc<ChainParams>,
    index: BlockIndex,
    /// Entry ids of the active chain, position = height.
    active: Vec<usize>,
    /// Parent-chain hashes committed by connected merge-mined blocks.
    aux_parents: HashSet<H256>,
}

/// Difficulty-engine view of the chain ending at an arbitrary entry.
struct ChainView<'a> {
    index: &'a BlockIndex,
    tip: usize,
}

impl HeaderChain for ChainView<'_> {
    fn tip(&self) -> ChainEntry {
        let entry = self.index.get(self.tip);
        ChainEntry {
            height: entry.height,
            time: entry.time,
            bits: entry.bits,
        }
    }

    fn ancestor(&self, height: i32) -> Option<ChainEntry> {
        let id = self.index.ancestor(self.tip, height)?;
        let entry = self.index.get(id);
        Some(ChainEntry {
            height: entry.height,
            time: entry.time,
            bits: entry.bits,
        })
    }
}

impl ChainState {
    /// Initialize with the network's genesis block connected.
    pub fn new(params: Arc<ChainParams>) -> Self {
        let mut index = BlockIndex::new();
        let genesis_id = index.insert(&params.genesis.header, None, BlockStatus::Valid, None);
        info!(network = %params.network, genesis = %params.genesis.hash(), "chain initialized");
        ChainState {
            params,
            index,
            active: vec![genesis_id],
            aux_parents: HashSet::new(),
        }
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    pub fn height(&self) -> i32 {
        (self.active.len() - 1) as i32
    }

    pub fn tip_hash(&self) -> H256 {
        self.index.get(*self.active.last().expect("genesis")).hash
    }

    pub fn tip_bits(&self) -> u32 {
        self.index.get(*self.active.last().expect("genesis")).bits
    }

    pub fn tip_time(&self) -> u32 {
        self.index.get(*self.active.last().expect("genesis")).time
    }

    /// Hash of the active-chain block at `height`, if any.
    pub fn hash_at_height(&self, height: i32) -> Option<H256> {
        if height < 0 {
            return None;
        }
        self.active
            .get(height as usize)
            .map(|id| self.index.get(*id).hash)
    }

    /// Status of a known block.
    pub fn status_of(&self, hash: &H256) -> Option<BlockStatus> {
        self.index.lookup(hash).map(|id| self.index.get(id).status)
    }

    /// Height a block on top of `prev_hash` would have.
    pub fn height_for_prev(&self, prev_hash: &H256) -> Option<i32> {
        self.index
            .lookup(prev_hash)
            .map(|id| self.index.get(id).height + 1)
    }

    /// Median time past of the active tip.
    pub fn tip_median_time_past(&self) -> u32 {
        self.index
            .median_time_past(*self.active.last().expect("genesis"))
    }

    /// Bits required for a block extending the active tip.
    pub fn next_work_required(&self, candidate_time: u32) -> u32 {
        let view = ChainView {
            index: &self.index,
            tip: *self.active.last().expect("genesis"),
        };
        next_work_required(&view, candidate_time, &self.params.consensus)
    }

    /// Total work and oldest/newest times over the last `lookup`
    /// active blocks, for hashrate estimation.
    pub fn work_window(&self, lookup: usize) -> Option<(num_bigint::BigUint, u32, u32)> {
        let tip_pos = self.active.len() - 1;
        if tip_pos == 0 {
            return None;
        }
        let lookup = lookup.min(tip_pos).max(1);
        let newest = self.index.get(self.active[tip_pos]);
        let oldest = self.index.get(self.active[tip_pos - lookup]);
        let mut min_time = newest.time;
        let mut max_time = newest.time;
        for pos in (tip_pos - lookup)..=tip_pos {
            let time = self.index.get(self.active[pos]).time;
            min_time = min_time.min(time);
            max_time = max_time.max(time);
        }
        let work = newest.chain_work.clone() - oldest.chain_work.clone();
        Some((work, min_time, max_time))
    }

    /// Structure checks that need no chain context.
    fn check_block(&self, block: &Block) -> Result<(), ConsensusError> {
        if block.txs.is_empty() {
            return Err(ConsensusError::BadCoinbase(
                "block has no transactions".to_string(),
            ));
        }
        if !block.txs[0].is_coinbase() {
            return Err(ConsensusError::BadCoinbase(
                "first transaction is not a coinbase".to_string(),
            ));
        }
        if block.txs.iter().skip(1).any(|tx| tx.is_coinbase()) {
            return Err(ConsensusError::BadCoinbase(
                "more than one coinbase".to_string(),
            ));
        }
        let computed = block.compute_merkle_root();
        if computed != block.header.merkle_root {
            return Err(ConsensusError::BadMerkleRoot {
                got: block.header.merkle_root,
                expected: computed,
            });
        }
        Ok(())
    }

    /// Header checks against the block's predecessor.
    fn contextual_check_header(
        &self,
        header: &BlockHeader,
        prev_id: usize,
        height: i32,
    ) -> Result<(), ConsensusError> {
        let view = ChainView {
            index: &self.index,
            tip: prev_id,
        };
        let expected_bits = next_work_required(&view, header.time, &self.params.consensus);
        if header.bits != expected_bits {
            return Err(ConsensusError::BadDiffBits {
                got: header.bits,
                expected: expected_bits,
            });
        }

        let median = self.index.median_time_past(prev_id);
        if header.time <= median {
            return Err(ConsensusError::TimeTooOld {
                time: header.time,
                median,
            });
        }

        let auxpow_active = self.params.consensus.auxpow_active(height);
        if header.is_auxpow() != auxpow_active {
            return Err(ConsensusError::AuxVersionMismatch {
                height,
                flag_set: header.is_auxpow(),
            });
        }

        if let Some(expected) = self.params.checkpoints.get(&height) {
            if *expected != header.hash() {
                return Err(ConsensusError::CheckpointMismatch {
                    height,
                    expected: *expected,
                });
            }
        }
        Ok(())
    }

    /// Proof-of-work check: own hash, or the parent chain's via the
    /// AuxPoW proof.
    fn check_block_pow(&self, block: &Block) -> Result<(), ConsensusError> {
        if block.header.is_auxpow() {
            let auxpow = block.auxpow.as_ref().ok_or(ConsensusError::AuxMissing)?;
            auxpow.check(&block.header, &self.params.consensus, &self.aux_parents)
        } else {
            check_pow(&block.hash(), block.header.bits, &self.params.consensus)
        }
    }

    /// Offer a full block to the chain.
    pub fn process_block(&mut self, block: &Block) -> ValidationOutcome {
        let hash = block.hash();

        if let Some(id) = self.index.lookup(&hash) {
            match self.index.get(id).status {
                BlockStatus::Valid => return ValidationOutcome::Duplicate,
                BlockStatus::Failed => return ValidationOutcome::DuplicateInvalid,
                BlockStatus::HeaderValid => {}
            }
        }

        let prev_id = match self.index.lookup(&block.header.prev_hash) {
            Some(id) => id,
            None => {
                debug!(prev = %block.header.prev_hash, "previous block unknown");
                return ValidationOutcome::UnknownPrev;
            }
        };
        if self.index.get(prev_id).status == BlockStatus::Failed {
            return self.reject(
                block,
                prev_id,
                ConsensusError::InvalidHeader("previous block is invalid".to_string()),
            );
        }
        let height = self.index.get(prev_id).height + 1;

        if let Err(err) = self.check_block(block) {
            return self.reject(block, prev_id, err);
        }
        if let Err(err) = self.contextual_check_header(&block.header, prev_id, height) {
            return self.reject(block, prev_id, err);
        }
        if let Err(err) = self.check_block_pow(block) {
            return self.reject(block, prev_id, err);
        }

        self.connect(block, prev_id, height)
    }

    /// Offer a bare header, as used by pre-AuxPoW header sync.
    pub fn process_header(&mut self, header: &BlockHeader) -> ValidationOutcome {
        let hash = header.hash();
        if let Some(id) = self.index.lookup(&hash) {
            return match self.index.get(id).status {
                BlockStatus::Failed => ValidationOutcome::DuplicateInconclusive,
                _ => ValidationOutcome::Duplicate,
            };
        }
        let prev_id = match self.index.lookup(&header.prev_hash) {
            Some(id) => id,
            None => return ValidationOutcome::UnknownPrev,
        };
        let height = self.index.get(prev_id).height + 1;

        if let Err(err) = self.contextual_check_header(header, prev_id, height) {
            warn!(%hash, error = %err, "header rejected");
            self.index
                .insert(header, Some(prev_id), BlockStatus::Failed, None);
            return ValidationOutcome::Rejected(err);
        }
        if let Err(err) = check_pow(&hash, header.bits, &self.params.consensus) {
            self.index
                .insert(header, Some(prev_id), BlockStatus::Failed, None);
            return ValidationOutcome::Rejected(err);
        }

        self.index
            .insert(header, Some(prev_id), BlockStatus::HeaderValid, None);
        ValidationOutcome::Accepted {
            hash,
            height,
            new_tip: false,
        }
    }

    /// Validate a proposed block against the current tip without
    /// connecting it.
    pub fn check_proposal(&self, block: &Block) -> ValidationOutcome {
        let hash = block.hash();
        if let Some(id) = self.index.lookup(&hash) {
            match self.index.get(id).status {
                BlockStatus::Valid => return ValidationOutcome::Duplicate,
                BlockStatus::Failed => return ValidationOutcome::DuplicateInvalid,
                BlockStatus::HeaderValid => {}
            }
        }
        let prev_id = match self.index.lookup(&block.header.prev_hash) {
            Some(id) => id,
            None => return ValidationOutcome::UnknownPrev,
        };
        let height = self.index.get(prev_id).height + 1;

        if let Err(err) = self.check_block(block) {
            return ValidationOutcome::Rejected(err);
        }
        if let Err(err) = self.contextual_check_header(&block.header, prev_id, height) {
            return ValidationOutcome::Rejected(err);
        }
        // Proposals skip the PoW check: miners submit unsolved blocks.
        ValidationOutcome::Accepted {
            hash,
            height,
            new_tip: false,
        }
    }

    fn reject(&mut self, block: &Block, prev_id: usize, err: ConsensusError) -> ValidationOutcome {
        warn!(hash = %block.hash(), reason = err.reject_reason(), "block rejected");
        match self.index.lookup(&block.hash()) {
            Some(id) => self.index.set_status(id, BlockStatus::Failed),
            None => {
                self.index
                    .insert(&block.header, Some(prev_id), BlockStatus::Failed, None);
            }
        }
        ValidationOutcome::Rejected(err)
    }

    fn connect(&mut self, block: &Block, prev_id: usize, height: i32) -> ValidationOutcome {
        let hash = block.hash();
        let aux_parent = block.auxpow.as_ref().map(|auxpow| auxpow.parent_hash());

        let id = match self.index.lookup(&hash) {
            Some(existing) => {
                self.index.set_status(existing, BlockStatus::Valid);
                self.index.set_aux_parent(existing, aux_parent);
                existing
            }
            None => self
                .index
                .insert(&block.header, Some(prev_id), BlockStatus::Valid, aux_parent),
        };

        let tip_id = *self.active.last().expect("genesis");
        let new_tip = self.index.get(id).chain_work > self.index.get(tip_id).chain_work;
        if new_tip {
            self.set_active_tip(id);
            info!(%hash, height, "new best chain tip");
        } else {
            debug!(%hash, height, "block stored on side chain");
        }

        ValidationOutcome::Accepted {
            hash,
            height,
            new_tip,
        }
    }

    /// Rebuild the active-chain vector and the duplicate-parent set
    /// for a new tip. The two always change together.
    fn set_active_tip(&mut self, tip_id: usize) {
        let mut path = Vec::new();
        let mut cursor = Some(tip_id);
        while let Some(id) = cursor {
            path.push(id);
            cursor = self.index.get(id).parent;
        }
        path.reverse();
        self.active = path;
        self.rebuild_aux_parents();
    }

    /// Recompute the duplicate-parent set from the active chain, as
    /// done at startup and after reorgs.
    pub fn rebuild_aux_parents(&mut self) {
        self.aux_parents = self
            .active
            .iter()
            .filter_map(|id| self.index.get(*id).aux_parent)
            .collect();
    }

    /// Whether a parent-chain hash was already used on the active
    /// chain.
    pub fn aux_parent_seen(&self, hash: &H256) -> bool {
        self.aux_parents.contains(hash)
    }
}
