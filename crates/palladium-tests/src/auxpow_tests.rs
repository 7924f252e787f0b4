//! Merge-mined block scenarios.

use crate::generators::make_auxpow_proof;
use crate::harness::TestChain;
use palladium_consensus::{
    expected_commitment, ConsensusError, AUXPOW_MAGIC, AUXPOW_VERSION_BIT,
};
use palladium_mining::SubmitReply;
use std::collections::HashSet;

#[test]
fn test_merge_mined_chain_extends() {
    let mut harness = TestChain::regtest_with_auxpow_from(1);
    let hashes = harness.extend(4);
    assert_eq!(harness.height(), 4);
    assert_eq!(harness.tip_hash(), hashes[3]);
}

#[test]
fn test_pow_hash_is_parent_hash() {
    let mut harness = TestChain::regtest_with_auxpow_from(1);
    let block = harness.make_block();
    let proof = block.auxpow.as_ref().expect("merge-mined block");
    assert_eq!(block.pow_hash(), proof.parent_hash());
    assert_ne!(block.pow_hash(), block.hash());
}

#[test]
fn test_commitment_recovery_matches_cleared_header() {
    // Clearing the version bit and rehashing reproduces exactly the
    // bytes embedded (reversed) behind the magic in the parent
    // coinbase.
    let mut harness = TestChain::regtest_with_auxpow_from(1);
    let block = harness.make_block();
    let proof = block.auxpow.as_ref().unwrap();

    let script = proof.coinbase_tx.inputs[0].script_sig.as_bytes();
    let offset = script
        .windows(AUXPOW_MAGIC.len())
        .position(|w| w == AUXPOW_MAGIC)
        .expect("magic present");
    let embedded = &script[offset + AUXPOW_MAGIC.len()..offset + AUXPOW_MAGIC.len() + 32];

    let expected = expected_commitment(&block.header);
    let mut reversed: Vec<u8> = expected.as_bytes().to_vec();
    reversed.reverse();
    assert_eq!(embedded, reversed.as_slice());

    // The AuxPoW bit is positional for the commitment but ordinary
    // for hashing: setting it must change the header hash.
    let mut cleared = block.header;
    cleared.version &= !AUXPOW_VERSION_BIT;
    assert_ne!(cleared.hash(), block.header.hash());
    assert_eq!(cleared.hash(), expected);
}

#[test]
fn test_duplicate_parent_rejected_at_validation_time() {
    let mut harness = TestChain::regtest_with_auxpow_from(1);
    let first = harness.make_block();
    assert_eq!(harness.submit(&first), SubmitReply::Accepted);
    let parent_hash = first.auxpow.as_ref().unwrap().parent_hash();

    // The connected block recorded its parent hash in the
    // duplicate-parent set.
    assert!(harness.chain.read().aux_parent_seen(&parent_hash));

    // Re-validating a proof with that parent now fails, where it
    // succeeded before the connect step.
    let mut scanned = HashSet::new();
    scanned.insert(parent_hash);
    let err = first.auxpow.as_ref().unwrap().check(
        &first.header,
        &harness.params.consensus,
        &scanned,
    );
    assert!(matches!(err, Err(ConsensusError::AuxDuplicateParent(_))));
    assert!(first
        .auxpow
        .as_ref()
        .unwrap()
        .check(&first.header, &harness.params.consensus, &HashSet::new())
        .is_ok());
}

#[test]
fn test_distinct_parents_accepted_in_sequence() {
    let mut harness = TestChain::regtest_with_auxpow_from(1);
    let first = harness.make_block();
    assert_eq!(harness.submit(&first), SubmitReply::Accepted);
    let second = harness.make_block();
    assert_eq!(harness.submit(&second), SubmitReply::Accepted);
    assert_ne!(
        first.auxpow.as_ref().unwrap().parent_hash(),
        second.auxpow.as_ref().unwrap().parent_hash()
    );
}

#[test]
fn test_tampered_commitment_rejected() {
    let mut harness = TestChain::regtest_with_auxpow_from(1);
    let mut block = harness.make_block();
    // Commit to a different header by regenerating the proof after
    // mutating the block time.
    let mut other_header = block.header;
    other_header.time += 1;
    block.auxpow = Some(make_auxpow_proof(
        &other_header,
        &harness.params.consensus,
        0xEE,
    ));
    match harness.submit(&block) {
        SubmitReply::Rejected(Some(reason)) => assert_eq!(reason, "bad-auxpow-commit"),
        other => panic!("unexpected reply {:?}", other),
    }
}

#[test]
fn test_parent_without_enough_work_rejected() {
    let mut harness = TestChain::regtest_with_auxpow_from(1);
    let mut block = harness.make_block();
    // Break the parent's PoW while keeping everything else intact:
    // tighten the enclosing block's claim so the parent misses it.
    let proof = block.auxpow.as_mut().unwrap();
    proof.parent_header.nonce = proof.parent_header.nonce.wrapping_add(1);
    loop {
        let hash = proof.parent_header.hash();
        if hash.to_biguint()
            > palladium_consensus::decode_compact(block.header.bits).0
        {
            break;
        }
        proof.parent_header.nonce = proof.parent_header.nonce.wrapping_add(1);
    }
    match harness.submit(&block) {
        SubmitReply::Rejected(Some(reason)) => assert_eq!(reason, "high-hash"),
        other => panic!("unexpected reply {:?}", other),
    }
}
