//! Proof-of-Work verification.

use crate::compact::decode_compact;
use crate::error::{ConsensusError, ConsensusResult};
use crate::hash::H256;
use crate::params::ConsensusParams;
use num_traits::Zero;

/// Check that `hash` satisfies the difficulty claimed by `bits`.
///
/// The bits must decode to a positive target no greater than the
/// network's PoW limit, and the hash, read as an unsigned 256-bit
/// integer, must not exceed that target. For merge-mined blocks the
/// caller passes the parent block hash here.
pub fn check_pow(hash: &H256, bits: u32, params: &ConsensusParams) -> ConsensusResult<()> {
    let (target, negative, overflow) = decode_compact(bits);
    if negative || target.is_zero() || overflow || target > params.pow_limit {
        return Err(ConsensusError::BadPowEncoding(bits));
    }
    if hash.to_biguint() > target {
        return Err(ConsensusError::BadPow { hash: *hash, bits });
    }
    Ok(())
}
