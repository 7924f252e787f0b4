//! On-demand block generation for regtest.
//!
//! A CPU nonce search is hopeless against real difficulty and cannot
//! produce AuxPoW blocks, so generation is restricted to regtest
//! before the fork height.

use crate::error::{MiningError, MiningResult};
use crate::pool::TxPool;
use crate::signal::TipSignal;
use crate::submit::{submit_block, SubmitReply};
use crate::MAX_TEMPLATE_TRANSACTIONS;
use palladium_chain::ChainState;
use palladium_consensus::{
    block_subsidy, check_pow, Block, BlockHeader, Network, Script, Transaction, TxIn, TxOut,
    BASE_VERSION, H256,
};
use parking_lot::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Mine `count` blocks paying `script_pubkey` and connect them.
pub fn generate_blocks(
    chain: &RwLock<ChainState>,
    pool: &RwLock<TxPool>,
    signal: &TipSignal,
    script_pubkey: Script,
    count: usize,
    max_tries: u64,
    extra_nonce: &mut u64,
) -> MiningResult<Vec<H256>> {
    {
        let chain = chain.read();
        if chain.params().network != Network::Regtest {
            return Err(MiningError::GenerateDisabled);
        }
        let next_height = chain.height() + 1;
        if chain.params().consensus.auxpow_active(next_height) {
            return Err(MiningError::Internal(
                "cannot generate blocks once auxpow is active, use an external miner".to_string(),
            ));
        }
    }

    let consensus = chain.read().params().consensus.clone();
    let mut tries = max_tries;
    let mut hashes = Vec::with_capacity(count);
    while hashes.len() < count {
        if signal.shutdown_requested() {
            return Err(MiningError::ShuttingDown);
        }

        *extra_nonce += 1;
        let mut block = assemble_block(chain, pool, &script_pubkey, *extra_nonce);

        // Plain nonce search against the regtest target.
        let solved = loop {
            if tries == 0 || signal.shutdown_requested() {
                break false;
            }
            if check_pow(&block.hash(), block.header.bits, &consensus).is_ok() {
                break true;
            }
            if block.header.nonce == u32::MAX {
                break false;
            }
            block.header.nonce += 1;
            tries -= 1;
        };
        if !solved {
            if signal.shutdown_requested() {
                return Err(MiningError::ShuttingDown);
            }
            return Err(MiningError::OutOfTries);
        }
        debug!(nonce = block.header.nonce, "solution found");

        match submit_block(chain, signal, &block) {
            SubmitReply::Accepted => {
                let confirmed: Vec<H256> =
                    block.txs.iter().skip(1).map(|tx| tx.txid()).collect();
                if !confirmed.is_empty() {
                    pool.write().remove_confirmed(&confirmed);
                }
                hashes.push(block.hash());
            }
            other => {
                return Err(MiningError::Internal(format!(
                    "generated block not accepted: {:?}",
                    other.bip22()
                )))
            }
        }
    }

    info!(count = hashes.len(), "blocks generated");
    Ok(hashes)
}

/// Assemble an unsolved block on the current tip.
fn assemble_block(
    chain: &RwLock<ChainState>,
    pool: &RwLock<TxPool>,
    script_pubkey: &Script,
    extra_nonce: u64,
) -> Block {
    let chain = chain.read();
    let height = chain.height() + 1;

    let entries = pool.read().by_fee(MAX_TEMPLATE_TRANSACTIONS);
    let total_fees: i64 = entries.iter().map(|entry| entry.fee).sum();

    // Height tag plus extra nonce keep coinbase txids unique.
    let mut script_sig = Script::new();
    script_sig.push_scriptnum(i64::from(height));
    script_sig.push_scriptnum(extra_nonce as i64);
    let coinbase = Transaction {
        version: 1,
        inputs: vec![TxIn::coinbase(script_sig)],
        outputs: vec![TxOut {
            value: block_subsidy(height, &chain.params().consensus) + total_fees,
            script_pubkey: script_pubkey.clone(),
        }],
        lock_time: 0,
    };

    let mut txs = vec![coinbase];
    txs.extend(entries.into_iter().map(|entry| entry.tx));

    let mintime = chain.tip_median_time_past() + 1;
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|since| since.as_secs() as u32)
        .unwrap_or(mintime);
    let time = now.max(mintime);

    let mut block = Block {
        header: BlockHeader {
            version: BASE_VERSION,
            prev_hash: chain.tip_hash(),
            merkle_root: H256::ZERO,
            time,
            bits: chain.next_work_required(time),
            nonce: 0,
        },
        auxpow: None,
        txs,
    };
    block.header.merkle_root = block.compute_merkle_root();
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use palladium_consensus::{ChainParams, RegtestOverrides};
    use std::sync::Arc;

    fn setup(
        overrides: RegtestOverrides,
    ) -> (Arc<RwLock<ChainState>>, Arc<RwLock<TxPool>>, Arc<TipSignal>) {
        let params = ChainParams::regtest(&overrides).unwrap();
        (
            Arc::new(RwLock::new(ChainState::new(Arc::new(params)))),
            Arc::new(RwLock::new(TxPool::new())),
            Arc::new(TipSignal::new()),
        )
    }

    #[test]
    fn test_generate_extends_chain() {
        let (chain, pool, signal) = setup(RegtestOverrides::default());
        let mut extra_nonce = 0;
        let hashes = generate_blocks(
            &chain,
            &pool,
            &signal,
            Script::new(),
            3,
            1_000_000,
            &mut extra_nonce,
        )
        .unwrap();
        assert_eq!(hashes.len(), 3);
        assert_eq!(chain.read().height(), 3);
        assert_eq!(chain.read().tip_hash(), hashes[2]);
    }

    #[test]
    fn test_generate_refused_on_mainnet() {
        let params = ChainParams::main();
        let chain = Arc::new(RwLock::new(ChainState::new(Arc::new(params))));
        let pool = Arc::new(RwLock::new(TxPool::new()));
        let signal = Arc::new(TipSignal::new());
        let mut extra_nonce = 0;
        assert!(matches!(
            generate_blocks(&chain, &pool, &signal, Script::new(), 1, 100, &mut extra_nonce),
            Err(MiningError::GenerateDisabled)
        ));
    }

    #[test]
    fn test_generate_refused_when_auxpow_active() {
        let (chain, pool, signal) = setup(RegtestOverrides {
            auxpow_start_height: Some(1),
            ..Default::default()
        });
        let mut extra_nonce = 0;
        assert!(matches!(
            generate_blocks(&chain, &pool, &signal, Script::new(), 1, 100, &mut extra_nonce),
            Err(MiningError::Internal(_))
        ));
    }

    #[test]
    fn test_generated_blocks_confirm_pool_transactions() {
        let (chain, pool, signal) = setup(RegtestOverrides::default());
        let mut extra_nonce = 0;
        // Mine one block first so there is an output to pretend-spend.
        generate_blocks(&chain, &pool, &signal, Script::new(), 1, 1_000_000, &mut extra_nonce)
            .unwrap();

        let spend = Transaction {
            version: 1,
            inputs: vec![TxIn {
                prevout: palladium_consensus::OutPoint {
                    txid: H256::from_bytes([5; 32]),
                    vout: 0,
                },
                script_sig: Script::new(),
                sequence: u32::MAX,
            }],
            outputs: vec![TxOut {
                value: 1,
                script_pubkey: Script::new(),
            }],
            lock_time: 0,
        };
        pool.write().add(spend, 1_000, 1);

        generate_blocks(&chain, &pool, &signal, Script::new(), 1, 1_000_000, &mut extra_nonce)
            .unwrap();
        assert!(pool.read().is_empty());
    }
}
