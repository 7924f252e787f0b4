//! Test data generators.

use palladium_chain::ChainState;
use palladium_consensus::{
    check_pow, expected_commitment, merkle_root, AuxPow, Block, BlockHeader, ChainEntry,
    ConsensusParams, HeaderChain, Script, Transaction, TxIn, TxOut, AUXPOW_MAGIC,
    AUXPOW_VERSION_BIT, BASE_VERSION, H256,
};

/// A dense synthetic header chain for driving the difficulty engine
/// without mining real blocks.
pub struct SyntheticChain {
    entries: Vec<ChainEntry>,
}

impl SyntheticChain {
    /// Entries at `start_height..start_height + len` with fixed
    /// spacing and bits.
    pub fn new(start_height: i32, len: i32, spacing: u32, bits: u32) -> Self {
        let entries = (0..len)
            .map(|offset| ChainEntry {
                height: start_height + offset,
                time: 1_600_000_000 + offset as u32 * spacing,
                bits,
            })
            .collect();
        SyntheticChain { entries }
    }

    pub fn tip_entry(&self) -> ChainEntry {
        *self.entries.last().expect("non-empty chain")
    }

    pub fn entry_mut(&mut self, height: i32) -> &mut ChainEntry {
        let base = self.entries[0].height;
        &mut self.entries[(height - base) as usize]
    }
}

impl HeaderChain for SyntheticChain {
    fn tip(&self) -> ChainEntry {
        self.tip_entry()
    }

    fn ancestor(&self, height: i32) -> Option<ChainEntry> {
        let base = self.entries.first()?.height;
        if height < base {
            return None;
        }
        self.entries.get((height - base) as usize).copied()
    }
}

/// Coinbase paying `value` with a height tag and extra nonce.
pub fn coinbase_tx(height: i32, extra_nonce: u64, value: i64) -> Transaction {
    let mut script_sig = Script::new();
    script_sig.push_scriptnum(i64::from(height));
    script_sig.push_scriptnum(extra_nonce as i64);
    Transaction {
        version: 1,
        inputs: vec![TxIn::coinbase(script_sig)],
        outputs: vec![TxOut {
            value,
            script_pubkey: Script::new(),
        }],
        lock_time: 0,
    }
}

/// A non-coinbase transaction spending a synthetic outpoint.
pub fn spend_tx(seed: u8, value: i64) -> Transaction {
    Transaction {
        version: 1,
        inputs: vec![TxIn {
            prevout: palladium_consensus::OutPoint {
                txid: H256::from_bytes([seed; 32]),
                vout: 0,
            },
            script_sig: Script::new(),
            sequence: u32::MAX,
        }],
        outputs: vec![TxOut {
            value,
            script_pubkey: Script::new(),
        }],
        lock_time: 0,
    }
}

/// Assemble an unsolved block on the current tip.
pub fn assemble_block(chain: &ChainState, extra_nonce: u64, txs: Vec<Transaction>) -> Block {
    let height = chain.height() + 1;
    let auxpow_active = chain.params().consensus.auxpow_active(height);
    let mut version = BASE_VERSION;
    if auxpow_active {
        version |= AUXPOW_VERSION_BIT;
    }
    let time = chain.tip_median_time_past() + 60;

    let mut all_txs = vec![coinbase_tx(height, extra_nonce, 50)];
    all_txs.extend(txs);

    let mut block = Block {
        header: BlockHeader {
            version,
            prev_hash: chain.tip_hash(),
            merkle_root: H256::ZERO,
            time,
            bits: chain.next_work_required(time),
            nonce: 0,
        },
        auxpow: None,
        txs: all_txs,
    };
    block.header.merkle_root = block.compute_merkle_root();
    block
}

/// Solve a block's own proof of work by nonce search.
pub fn solve_block(block: &mut Block, params: &ConsensusParams) {
    while check_pow(&block.hash(), block.header.bits, params).is_err() {
        block.header.nonce += 1;
    }
}

/// Build a merge-mining proof for `header` and mine the parent block.
///
/// `parent_seed` varies the parent's prev hash so successive proofs
/// use distinct parent blocks.
pub fn make_auxpow_proof(
    header: &BlockHeader,
    params: &ConsensusParams,
    parent_seed: u8,
) -> AuxPow {
    let mut script_sig = Script::new();
    script_sig.push_scriptnum(7);
    let commitment = expected_commitment(header);
    let mut commit_bytes: Vec<u8> = commitment.as_bytes().to_vec();
    commit_bytes.reverse();
    let mut payload = AUXPOW_MAGIC.to_vec();
    payload.extend_from_slice(&commit_bytes);
    script_sig.push_slice(&payload);

    let coinbase = Transaction {
        version: 1,
        inputs: vec![TxIn::coinbase(script_sig)],
        outputs: vec![],
        lock_time: 0,
    };
    let mut parent_header = BlockHeader {
        version: 1,
        prev_hash: H256::from_bytes([parent_seed; 32]),
        merkle_root: merkle_root(&[coinbase.txid()]),
        time: header.time,
        bits: header.bits,
        nonce: 0,
    };
    while check_pow(&parent_header.hash(), header.bits, params).is_err() {
        parent_header.nonce += 1;
    }

    AuxPow {
        coinbase_hash: coinbase.txid(),
        coinbase_tx: coinbase,
        coinbase_branch: Vec::new(),
        coinbase_index: 0,
        chain_branch: Vec::new(),
        chain_index: 0,
        parent_header,
    }
}
