//! Minimal script construction and scanning.
//!
//! The consensus core never interprets scripts; it only needs to build
//! data pushes (genesis coinbase, height tags, AuxPoW commitments) and
//! to locate the commitment magic inside a parent coinbase scriptSig.

use crate::encode::{Decodable, Encodable, Reader, WireError};
use std::fmt;

pub const OP_CHECKSIG: u8 = 0xac;

const OP_PUSHDATA1: u8 = 0x4c;
const OP_PUSHDATA2: u8 = 0x4d;
const OP_PUSHDATA4: u8 = 0x4e;

/// A raw script as a byte string.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Script(Vec<u8>);

impl Script {
    pub fn new() -> Self {
        Script(Vec::new())
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Script(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push_opcode(&mut self, op: u8) {
        self.0.push(op);
    }

    /// Push arbitrary data with the shortest push opcode.
    pub fn push_slice(&mut self, data: &[u8]) {
        let len = data.len();
        if len < OP_PUSHDATA1 as usize {
            self.0.push(len as u8);
        } else if len <= u8::MAX as usize {
            self.0.push(OP_PUSHDATA1);
            self.0.push(len as u8);
        } else if len <= u16::MAX as usize {
            self.0.push(OP_PUSHDATA2);
            self.0.extend_from_slice(&(len as u16).to_le_bytes());
        } else {
            self.0.push(OP_PUSHDATA4);
            self.0.extend_from_slice(&(len as u32).to_le_bytes());
        }
        self.0.extend_from_slice(data);
    }

    /// Push a number in script-number form (minimal little-endian with
    /// a sign bit), always as a data push.
    pub fn push_scriptnum(&mut self, n: i64) {
        let bytes = scriptnum_bytes(n);
        self.push_slice(&bytes);
    }

    /// Offset of the first occurrence of `needle`, if any.
    pub fn find(&self, needle: &[u8]) -> Option<usize> {
        if needle.is_empty() || needle.len() > self.0.len() {
            return None;
        }
        self.0.windows(needle.len()).position(|w| w == needle)
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", hex::encode(&self.0))
    }
}

impl Encodable for Script {
    fn encode_into(&self, out: &mut Vec<u8>) {
        crate::encode::write_var_bytes(out, &self.0);
    }
}

impl Decodable for Script {
    fn decode_from(reader: &mut Reader<'_>) -> Result<Self, WireError> {
        Ok(Script(reader.read_var_bytes()?))
    }
}

fn scriptnum_bytes(n: i64) -> Vec<u8> {
    if n == 0 {
        return Vec::new();
    }
    let negative = n < 0;
    let mut abs = n.unsigned_abs();
    let mut out = Vec::new();
    while abs > 0 {
        out.push((abs & 0xff) as u8);
        abs >>= 8;
    }
    // The top bit carries the sign; add a byte if the magnitude uses it.
    if out.last().copied().unwrap_or(0) & 0x80 != 0 {
        out.push(if negative { 0x80 } else { 0x00 });
    } else if negative {
        let last = out.last_mut().unwrap();
        *last |= 0x80;
    }
    out
}
