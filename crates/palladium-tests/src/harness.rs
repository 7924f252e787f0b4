//! Test harness wiring the consensus core together.

use crate::generators::{assemble_block, make_auxpow_proof, solve_block};
use palladium_chain::ChainState;
use palladium_consensus::{Block, ChainParams, RegtestOverrides, Transaction, H256};
use palladium_mining::{
    submit_block, SubmitReply, TemplateBuilder, TipSignal, TxPool,
};
use parking_lot::RwLock;
use std::sync::Arc;

/// A regtest node core without any transport attached.
pub struct TestChain {
    pub params: Arc<ChainParams>,
    pub chain: Arc<RwLock<ChainState>>,
    pub pool: Arc<RwLock<TxPool>>,
    pub signal: Arc<TipSignal>,
    pub templates: Arc<TemplateBuilder>,
    extra_nonce: u64,
    parent_seed: u8,
}

impl TestChain {
    /// Plain regtest chain; AuxPoW disabled.
    pub fn regtest() -> Self {
        Self::regtest_with(RegtestOverrides::default())
    }

    /// Regtest chain with startup overrides.
    pub fn regtest_with(overrides: RegtestOverrides) -> Self {
        let params = Arc::new(ChainParams::regtest(&overrides).expect("valid overrides"));
        let chain = Arc::new(RwLock::new(ChainState::new(Arc::clone(&params))));
        let pool = Arc::new(RwLock::new(TxPool::new()));
        let signal = Arc::new(TipSignal::new());
        let templates = Arc::new(TemplateBuilder::new(
            Arc::clone(&chain),
            Arc::clone(&pool),
            Arc::clone(&signal),
        ));
        TestChain {
            params,
            chain,
            pool,
            signal,
            templates,
            extra_nonce: 0,
            parent_seed: 0,
        }
    }

    /// Regtest chain with AuxPoW active from `height`.
    pub fn regtest_with_auxpow_from(height: i64) -> Self {
        Self::regtest_with(RegtestOverrides {
            auxpow_start_height: Some(height),
            ..Default::default()
        })
    }

    /// A solved, submit-ready block on the current tip.
    pub fn make_block(&mut self) -> Block {
        self.make_block_with(Vec::new())
    }

    /// A solved block carrying extra transactions.
    pub fn make_block_with(&mut self, txs: Vec<Transaction>) -> Block {
        self.extra_nonce += 1;
        let chain = self.chain.read();
        let mut block = assemble_block(&chain, self.extra_nonce, txs);
        drop(chain);
        if block.header.is_auxpow() {
            self.parent_seed += 1;
            let proof =
                make_auxpow_proof(&block.header, &self.params.consensus, self.parent_seed);
            block.auxpow = Some(proof);
        } else {
            solve_block(&mut block, &self.params.consensus);
        }
        block
    }

    /// Submit through the full gate, waking long-pollers on success.
    pub fn submit(&self, block: &Block) -> SubmitReply {
        submit_block(&self.chain, &self.signal, block)
    }

    /// Mine and connect `count` blocks, returning their hashes.
    pub fn extend(&mut self, count: usize) -> Vec<H256> {
        let mut hashes = Vec::with_capacity(count);
        for _ in 0..count {
            let block = self.make_block();
            assert_eq!(self.submit(&block), SubmitReply::Accepted);
            hashes.push(block.hash());
        }
        hashes
    }

    pub fn height(&self) -> i32 {
        self.chain.read().height()
    }

    pub fn tip_hash(&self) -> H256 {
        self.chain.read().tip_hash()
    }
}
