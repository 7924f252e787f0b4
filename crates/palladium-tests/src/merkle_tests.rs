//! Merkle branch correctness over synthetic trees.

use palladium_consensus::merkle::{merkle_branch, merkle_root, merkle_root_from_branch};
use palladium_consensus::H256;
use proptest::prelude::*;

fn leaf(i: u32) -> H256 {
    let mut bytes = [0u8; 32];
    bytes[..4].copy_from_slice(&i.to_le_bytes());
    bytes[31] = 0x4c;
    H256::from_bytes(bytes)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_branch_recovers_root(count in 1usize..200, pick in any::<prop::sample::Index>()) {
        let leaves: Vec<H256> = (0..count as u32).map(leaf).collect();
        let root = merkle_root(&leaves);
        let index = pick.index(count);
        let branch = merkle_branch(&leaves, index);
        prop_assert_eq!(merkle_root_from_branch(leaves[index], &branch, index as i32), root);
    }

    #[test]
    fn prop_wrong_index_changes_root(count in 2usize..64, pick in any::<prop::sample::Index>()) {
        let leaves: Vec<H256> = (0..count as u32).map(leaf).collect();
        let root = merkle_root(&leaves);
        let index = pick.index(count);
        // Only meaningful when the bottom sibling is a distinct leaf;
        // a duplicated last node pairs with itself either way around.
        prop_assume!((index ^ 1) < count);
        let branch = merkle_branch(&leaves, index);
        let wrong = (index ^ 1) as i32;
        prop_assert_ne!(merkle_root_from_branch(leaves[index], &branch, wrong), root);
    }
}

#[test]
fn test_branch_at_sixteen_bit_scale() {
    // A full 2^16-leaf tree, the upper bound the verifier must handle.
    let leaves: Vec<H256> = (0..1u32 << 16).map(leaf).collect();
    let root = merkle_root(&leaves);
    for index in [0usize, 1, 12_345, 40_000, (1 << 16) - 1] {
        let branch = merkle_branch(&leaves, index);
        assert_eq!(branch.len(), 16);
        assert_eq!(
            merkle_root_from_branch(leaves[index], &branch, index as i32),
            root,
            "leaf {}",
            index
        );
    }
}

#[test]
fn test_branch_beats_forgery() {
    // Swapping one sibling in the branch must not reproduce the root.
    let leaves: Vec<H256> = (0..33u32).map(leaf).collect();
    let root = merkle_root(&leaves);
    let mut branch = merkle_branch(&leaves, 7);
    branch[2] = leaf(999);
    assert_ne!(merkle_root_from_branch(leaves[7], &branch, 7), root);
}
