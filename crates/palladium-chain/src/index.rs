//! Arena-based block index.
//!
//! Entries live in a flat vector and refer to each other by id. Each
//! entry carries a skip pointer precomputed at insertion, making the
//! ancestor walk O(log n) from any starting point.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use palladium_consensus::{decode_compact, BlockHeader, H256};
use std::collections::HashMap;

/// Validation progress of an indexed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStatus {
    /// Header checked; block data not yet validated.
    HeaderValid,
    /// Fully validated.
    Valid,
    /// Failed validation; kept so duplicates short-circuit.
    Failed,
}

/// One block in the index.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub hash: H256,
    pub parent: Option<usize>,
    /// Skip-list pointer for fast ancestor walks.
    pub skip: Option<usize>,
    pub height: i32,
    pub version: i32,
    pub time: u32,
    pub bits: u32,
    pub nonce: u32,
    /// Total work from genesis up to and including this block.
    pub chain_work: BigUint,
    pub status: BlockStatus,
    /// Parent-chain hash committed by this block, when merge-mined.
    pub aux_parent: Option<H256>,
}

/// Work contributed by a block with the given bits.
///
/// `2^256 / (target + 1)`, zero for undecodable bits.
pub fn block_proof(bits: u32) -> BigUint {
    let (target, negative, overflow) = decode_compact(bits);
    if negative || overflow || target.is_zero() {
        return BigUint::zero();
    }
    (BigUint::one() << 256u32) / (target + BigUint::one())
}

/// Flat block index addressed by integer ids.
#[derive(Debug, Default)]
pub struct BlockIndex {
    entries: Vec<IndexEntry>,
    by_hash: HashMap<H256, usize>,
}

impl BlockIndex {
    pub fn new() -> Self {
        BlockIndex::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: usize) -> &IndexEntry {
        &self.entries[id]
    }

    pub fn lookup(&self, hash: &H256) -> Option<usize> {
        self.by_hash.get(hash).copied()
    }

    pub fn set_status(&mut self, id: usize, status: BlockStatus) {
        self.entries[id].status = status;
    }

    pub fn set_aux_parent(&mut self, id: usize, aux_parent: Option<H256>) {
        self.entries[id].aux_parent = aux_parent;
    }

    /// Insert a header below `parent`, computing height, cumulative
    /// work and the skip pointer. Returns the new entry's id.
    pub fn insert(
        &mut self,
        header: &BlockHeader,
        parent: Option<usize>,
        status: BlockStatus,
        aux_parent: Option<H256>,
    ) -> usize {
        let hash = header.hash();
        let (height, parent_work) = match parent {
            Some(parent_id) => {
                let parent_entry = &self.entries[parent_id];
                (parent_entry.height + 1, parent_entry.chain_work.clone())
            }
            None => (0, BigUint::zero()),
        };
        let skip = parent.and_then(|parent_id| self.ancestor(parent_id, skip_height(height)));
        let id = self.entries.len();
        self.entries.push(IndexEntry {
            hash,
            parent,
            skip,
            height,
            version: header.version,
            time: header.time,
            bits: header.bits,
            nonce: header.nonce,
            chain_work: parent_work + block_proof(header.bits),
            status,
            aux_parent,
        });
        self.by_hash.insert(hash, id);
        id
    }

    /// Ancestor of `from` at `height`, following skip pointers where
    /// they do not overshoot.
    pub fn ancestor(&self, from: usize, height: i32) -> Option<usize> {
        let mut walk = from;
        let mut walk_height = self.entries[walk].height;
        if height > walk_height || height < 0 {
            return None;
        }
        while walk_height > height {
            let entry = &self.entries[walk];
            let height_skip = skip_height(walk_height);
            let height_skip_prev = skip_height(walk_height - 1);
            let use_skip = match entry.skip {
                Some(_) => {
                    height_skip == height
                        || (height_skip > height
                            && !(height_skip_prev < height_skip - 2 && height_skip_prev >= height))
                }
                None => false,
            };
            if use_skip {
                walk = entry.skip.expect("skip checked above");
                walk_height = height_skip;
            } else {
                walk = entry.parent?;
                walk_height -= 1;
            }
        }
        Some(walk)
    }

    /// Median of the last 11 block times ending at `id`.
    pub fn median_time_past(&self, id: usize) -> u32 {
        let mut times = Vec::with_capacity(11);
        let mut cursor = Some(id);
        for _ in 0..11 {
            match cursor {
                Some(current) => {
                    let entry = &self.entries[current];
                    times.push(entry.time);
                    cursor = entry.parent;
                }
                None => break,
            }
        }
        times.sort_unstable();
        times[times.len() / 2]
    }
}

/// Height of the skip pointer for a block at `height`.
///
/// Turning the lowest set bit off twice gives exponentially spaced
/// jumps that still land on round heights.
fn skip_height(height: i32) -> i32 {
    if height < 2 {
        return 0;
    }
    if height & 1 == 1 {
        invert_lowest_one(invert_lowest_one(height - 1)) + 1
    } else {
        invert_lowest_one(height)
    }
}

fn invert_lowest_one(n: i32) -> i32 {
    n & (n - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_chain(len: i32) -> (BlockIndex, usize) {
        let mut index = BlockIndex::new();
        let mut header = BlockHeader {
            version: 1,
            prev_hash: H256::ZERO,
            merkle_root: H256::ZERO,
            time: 1_600_000_000,
            bits: 0x207fffff,
            nonce: 0,
        };
        let mut tip = index.insert(&header, None, BlockStatus::Valid, None);
        for h in 1..len {
            header.prev_hash = index.get(tip).hash;
            header.time = 1_600_000_000 + h as u32 * 120;
            header.nonce = h as u32;
            tip = index.insert(&header, Some(tip), BlockStatus::Valid, None);
        }
        (index, tip)
    }

    #[test]
    fn test_heights_and_lookup() {
        let (index, tip) = build_chain(10);
        assert_eq!(index.get(tip).height, 9);
        let hash = index.get(tip).hash;
        assert_eq!(index.lookup(&hash), Some(tip));
        assert_eq!(index.lookup(&H256::ZERO), None);
    }

    #[test]
    fn test_ancestor_walks_are_exact() {
        let (index, tip) = build_chain(300);
        for target in [0, 1, 2, 17, 128, 255, 298, 299] {
            let id = index.ancestor(tip, target).unwrap();
            assert_eq!(index.get(id).height, target);
        }
        assert_eq!(index.ancestor(tip, 300), None);
        assert_eq!(index.ancestor(tip, -1), None);
    }

    #[test]
    fn test_ancestor_matches_naive_walk() {
        let (index, tip) = build_chain(100);
        for target in 0..100 {
            // Naive parent walk as the reference.
            let mut cursor = tip;
            while index.get(cursor).height > target {
                cursor = index.get(cursor).parent.unwrap();
            }
            assert_eq!(index.ancestor(tip, target), Some(cursor));
        }
    }

    #[test]
    fn test_chain_work_accumulates() {
        let (index, tip) = build_chain(5);
        let unit = block_proof(0x207fffff);
        assert_eq!(index.get(tip).chain_work, unit * 5u32);
    }

    #[test]
    fn test_block_proof_invalid_bits() {
        assert!(block_proof(0).is_zero());
        assert!(block_proof(0x01803456).is_zero());
    }

    #[test]
    fn test_median_time_past() {
        let (index, tip) = build_chain(20);
        // Times increase monotonically, so the median of the last 11
        // is the time six blocks back from the tip.
        let expected = index.get(index.ancestor(tip, 19 - 5).unwrap()).time;
        assert_eq!(index.median_time_past(tip), expected);
    }

    #[test]
    fn test_median_time_past_short_chain() {
        let (index, _) = build_chain(3);
        assert_eq!(index.median_time_past(2), index.get(1).time);
    }
}
