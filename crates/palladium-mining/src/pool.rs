//! Fee-ordered transaction pool.
//!
//! Only the slice of pool behavior the template builder needs: hold
//! transactions with their fee metadata, hand them out richest-first,
//! and count updates so long-pollers notice activity.

use palladium_consensus::{Transaction, H256};
use tracing::debug;

/// A pooled transaction with miner-relevant metadata.
#[derive(Debug, Clone)]
pub struct PoolEntry {
    pub txid: H256,
    pub tx: Transaction,
    /// Absolute fee in base units.
    pub fee: i64,
    /// Sigop cost as counted at acceptance.
    pub sigops: i64,
    pub weight: i64,
}

/// In-memory transaction pool.
#[derive(Debug, Default)]
pub struct TxPool {
    entries: Vec<PoolEntry>,
    updates: u64,
}

impl TxPool {
    pub fn new() -> Self {
        TxPool::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Counter bumped on every mutation; long-pollers compare it.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Add a transaction with the fee its acceptor computed.
    pub fn add(&mut self, tx: Transaction, fee: i64, sigops: i64) {
        let txid = tx.txid();
        if self.entries.iter().any(|entry| entry.txid == txid) {
            return;
        }
        let weight = tx.weight();
        debug!(%txid, fee, "transaction pooled");
        self.entries.push(PoolEntry {
            txid,
            tx,
            fee,
            sigops,
            weight,
        });
        self.updates += 1;
    }

    /// Drop transactions confirmed by a connected block.
    pub fn remove_confirmed(&mut self, txids: &[H256]) {
        let before = self.entries.len();
        self.entries.retain(|entry| !txids.contains(&entry.txid));
        if self.entries.len() != before {
            self.updates += 1;
        }
    }

    /// Up to `limit` entries, highest fee first.
    pub fn by_fee(&self, limit: usize) -> Vec<PoolEntry> {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| b.fee.cmp(&a.fee));
        entries.truncate(limit);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palladium_consensus::{OutPoint, Script, TxIn, TxOut};

    fn spend(seed: u8, value: i64) -> Transaction {
        Transaction {
            version: 1,
            inputs: vec![TxIn {
                prevout: OutPoint {
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

    #[test]
    fn test_fee_ordering() {
        let mut pool = TxPool::new();
        pool.add(spend(1, 100), 500, 1);
        pool.add(spend(2, 100), 2_000, 1);
        pool.add(spend(3, 100), 1_000, 1);

        let picked = pool.by_fee(2);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0].fee, 2_000);
        assert_eq!(picked[1].fee, 1_000);
    }

    #[test]
    fn test_duplicate_ignored() {
        let mut pool = TxPool::new();
        let tx = spend(1, 100);
        pool.add(tx.clone(), 500, 1);
        pool.add(tx, 500, 1);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.updates(), 1);
    }

    #[test]
    fn test_remove_confirmed_bumps_counter() {
        let mut pool = TxPool::new();
        let tx = spend(1, 100);
        let txid = tx.txid();
        pool.add(tx, 500, 1);
        assert_eq!(pool.updates(), 1);
        pool.remove_confirmed(&[txid]);
        assert!(pool.is_empty());
        assert_eq!(pool.updates(), 2);
        // Removing nothing leaves the counter alone.
        pool.remove_confirmed(&[txid]);
        assert_eq!(pool.updates(), 2);
    }
}
