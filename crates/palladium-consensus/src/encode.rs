//! Bitcoin wire-format serialization.
//!
//! Fixed-width integers are little-endian; collection lengths use the
//! compact-size prefix. Decoding is strict: non-canonical compact
//! sizes and trailing bytes are rejected.

use crate::hash::H256;
use thiserror::Error;

/// Hard ceiling on decoded collection lengths, a sanity bound well
/// above anything a valid block can carry.
const MAX_COLLECTION_LEN: u64 = 1 << 20;

/// Wire decoding errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// Input ended before the value was complete.
    #[error("unexpected end of data at byte {0}")]
    UnexpectedEof(usize),

    /// Compact size used a longer form than necessary.
    #[error("non-canonical compact size")]
    NonCanonicalSize,

    /// Collection length prefix beyond the sanity bound.
    #[error("collection length {0} exceeds limit")]
    OversizedCollection(u64),

    /// Bytes remained after the value was fully decoded.
    #[error("{0} trailing bytes after decoded value")]
    TrailingBytes(usize),

    /// Structurally invalid value.
    #[error("malformed {0}")]
    Malformed(&'static str),
}

/// Cursor over a byte slice.
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Reader { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        if self.remaining() < n {
            return Err(WireError::UnexpectedEof(self.pos));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, WireError> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, WireError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_i32(&mut self) -> Result<i32, WireError> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_u64(&mut self) -> Result<u64, WireError> {
        let bytes = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(arr))
    }

    pub fn read_i64(&mut self) -> Result<i64, WireError> {
        Ok(self.read_u64()? as i64)
    }

    /// Compact-size length prefix, canonical form required.
    pub fn read_compact_size(&mut self) -> Result<u64, WireError> {
        let tag = self.read_u8()?;
        let value = match tag {
            0xfd => {
                let v = self.read_u16()? as u64;
                if v < 0xfd {
                    return Err(WireError::NonCanonicalSize);
                }
                v
            }
            0xfe => {
                let v = self.read_u32()? as u64;
                if v <= u16::MAX as u64 {
                    return Err(WireError::NonCanonicalSize);
                }
                v
            }
            0xff => {
                let v = self.read_u64()?;
                if v <= u32::MAX as u64 {
                    return Err(WireError::NonCanonicalSize);
                }
                v
            }
            n => n as u64,
        };
        Ok(value)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, WireError> {
        Ok(self.take(n)?.to_vec())
    }

    pub fn read_var_bytes(&mut self) -> Result<Vec<u8>, WireError> {
        let len = self.read_compact_size()?;
        if len > MAX_COLLECTION_LEN {
            return Err(WireError::OversizedCollection(len));
        }
        self.read_bytes(len as usize)
    }

    pub fn read_hash(&mut self) -> Result<H256, WireError> {
        let bytes = self.take(32)?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(bytes);
        Ok(H256::from_bytes(arr))
    }
}

/// Append a compact-size length prefix.
pub fn write_compact_size(out: &mut Vec<u8>, n: u64) {
    if n < 0xfd {
        out.push(n as u8);
    } else if n <= u16::MAX as u64 {
        out.push(0xfd);
        out.extend_from_slice(&(n as u16).to_le_bytes());
    } else if n <= u32::MAX as u64 {
        out.push(0xfe);
        out.extend_from_slice(&(n as u32).to_le_bytes());
    } else {
        out.push(0xff);
        out.extend_from_slice(&n.to_le_bytes());
    }
}

/// Append a compact-size prefixed byte string.
pub fn write_var_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    write_compact_size(out, bytes.len() as u64);
    out.extend_from_slice(bytes);
}

/// A value with a canonical wire encoding.
pub trait Encodable {
    fn encode_into(&self, out: &mut Vec<u8>);

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }
}

/// A value decodable from its canonical wire encoding.
pub trait Decodable: Sized {
    fn decode_from(reader: &mut Reader<'_>) -> Result<Self, WireError>;

    /// Decode, requiring the input to be fully consumed.
    fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let mut reader = Reader::new(bytes);
        let value = Self::decode_from(&mut reader)?;
        if reader.remaining() > 0 {
            return Err(WireError::TrailingBytes(reader.remaining()));
        }
        Ok(value)
    }
}

impl Encodable for H256 {
    fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.as_bytes());
    }
}

impl Decodable for H256 {
    fn decode_from(reader: &mut Reader<'_>) -> Result<Self, WireError> {
        reader.read_hash()
    }
}

/// Encode a compact-size prefixed list.
pub fn encode_vec<T: Encodable>(items: &[T], out: &mut Vec<u8>) {
    write_compact_size(out, items.len() as u64);
    for item in items {
        item.encode_into(out);
    }
}

/// Decode a compact-size prefixed list.
pub fn decode_vec<T: Decodable>(reader: &mut Reader<'_>) -> Result<Vec<T>, WireError> {
    let len = reader.read_compact_size()?;
    if len > MAX_COLLECTION_LEN {
        return Err(WireError::OversizedCollection(len));
    }
    let mut items = Vec::with_capacity(len.min(1024) as usize);
    for _ in 0..len {
        items.push(T::decode_from(reader)?);
    }
    Ok(items)
}
