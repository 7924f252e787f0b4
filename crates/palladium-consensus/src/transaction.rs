//! Transaction primitives and their wire encoding.

use crate::encode::{decode_vec, encode_vec, Decodable, Encodable, Reader, WireError};
use crate::hash::{double_sha256, H256};
use crate::script::Script;

/// Reference to an output of a previous transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutPoint {
    pub txid: H256,
    pub vout: u32,
}

impl OutPoint {
    /// The null outpoint used by coinbase inputs.
    pub const NULL: OutPoint = OutPoint {
        txid: H256::ZERO,
        vout: u32::MAX,
    };

    pub fn is_null(&self) -> bool {
        self.txid.is_zero() && self.vout == u32::MAX
    }
}

/// Transaction input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxIn {
    pub prevout: OutPoint,
    pub script_sig: Script,
    pub sequence: u32,
}

impl TxIn {
    /// A coinbase-style input carrying the given scriptSig.
    pub fn coinbase(script_sig: Script) -> Self {
        TxIn {
            prevout: OutPoint::NULL,
            script_sig,
            sequence: u32::MAX,
        }
    }
}

/// Transaction output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOut {
    /// Value in base units.
    pub value: i64,
    pub script_pubkey: Script,
}

/// A transaction in legacy wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub lock_time: u32,
}

impl Transaction {
    /// Double-SHA256 of the serialized transaction.
    pub fn txid(&self) -> H256 {
        double_sha256(&self.encode())
    }

    /// A coinbase has exactly one input spending the null outpoint.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].prevout.is_null()
    }

    /// Serialized size in bytes.
    pub fn size(&self) -> usize {
        self.encode().len()
    }

    /// Block weight of a legacy transaction.
    pub fn weight(&self) -> i64 {
        self.size() as i64 * 4
    }
}

impl Encodable for OutPoint {
    fn encode_into(&self, out: &mut Vec<u8>) {
        self.txid.encode_into(out);
        out.extend_from_slice(&self.vout.to_le_bytes());
    }
}

impl Decodable for OutPoint {
    fn decode_from(reader: &mut Reader<'_>) -> Result<Self, WireError> {
        Ok(OutPoint {
            txid: reader.read_hash()?,
            vout: reader.read_u32()?,
        })
    }
}

impl Encodable for TxIn {
    fn encode_into(&self, out: &mut Vec<u8>) {
        self.prevout.encode_into(out);
        self.script_sig.encode_into(out);
        out.extend_from_slice(&self.sequence.to_le_bytes());
    }
}

impl Decodable for TxIn {
    fn decode_from(reader: &mut Reader<'_>) -> Result<Self, WireError> {
        Ok(TxIn {
            prevout: OutPoint::decode_from(reader)?,
            script_sig: Script::decode_from(reader)?,
            sequence: reader.read_u32()?,
        })
    }
}

impl Encodable for TxOut {
    fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.value.to_le_bytes());
        self.script_pubkey.encode_into(out);
    }
}

impl Decodable for TxOut {
    fn decode_from(reader: &mut Reader<'_>) -> Result<Self, WireError> {
        Ok(TxOut {
            value: reader.read_i64()?,
            script_pubkey: Script::decode_from(reader)?,
        })
    }
}

impl Encodable for Transaction {
    fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.version.to_le_bytes());
        encode_vec(&self.inputs, out);
        encode_vec(&self.outputs, out);
        out.extend_from_slice(&self.lock_time.to_le_bytes());
    }
}

impl Decodable for Transaction {
    fn decode_from(reader: &mut Reader<'_>) -> Result<Self, WireError> {
        Ok(Transaction {
            version: reader.read_i32()?,
            inputs: decode_vec(reader)?,
            outputs: decode_vec(reader)?,
            lock_time: reader.read_u32()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx() -> Transaction {
        let mut script_sig = Script::new();
        script_sig.push_scriptnum(17);
        Transaction {
            version: 1,
            inputs: vec![TxIn::coinbase(script_sig)],
            outputs: vec![TxOut {
                value: 50 * 100_000_000,
                script_pubkey: Script::from_bytes(vec![crate::script::OP_CHECKSIG]),
            }],
            lock_time: 0,
        }
    }

    #[test]
    fn test_coinbase_detection() {
        let tx = sample_tx();
        assert!(tx.is_coinbase());

        let mut spend = tx.clone();
        spend.inputs[0].prevout = OutPoint {
            txid: tx.txid(),
            vout: 0,
        };
        assert!(!spend.is_coinbase());
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let tx = sample_tx();
        let bytes = tx.encode();
        let decoded = Transaction::decode(&bytes).unwrap();
        assert_eq!(decoded, tx);
        assert_eq!(decoded.txid(), tx.txid());
    }

    #[test]
    fn test_txid_changes_with_content() {
        let tx = sample_tx();
        let mut other = tx.clone();
        other.outputs[0].value += 1;
        assert_ne!(tx.txid(), other.txid());
    }
}
