//! Difficulty retargeting.
//!
//! Two algorithms share the engine: the original Bitcoin retarget for
//! heights below 29000 and a linearly weighted moving average from
//! 29000 on. The last 70 pre-LWMA blocks reset to the minimum
//! difficulty so the averaging window opens from a known state.

use crate::compact::{decode_compact, encode_compact};
use crate::params::ConsensusParams;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use tracing::{debug, warn};

/// Height at which LWMA retargeting takes over.
pub const LWMA_ACTIVATION_HEIGHT: i32 = 29_000;

/// First predecessor height of the reset window before the switch.
pub const LWMA_RESET_START: i32 = 28_930;

/// Last predecessor height of the reset window before the switch.
pub const LWMA_RESET_END: i32 = 28_999;

/// Number of blocks in the LWMA averaging window.
pub const LWMA_WINDOW: i64 = 240;

/// Solvetimes are capped at this multiple of the target spacing, which
/// bounds how far a single out-of-line timestamp can move the average.
const LWMA_SOLVETIME_CAP: i64 = 6;

/// A block index entry as seen by the difficulty engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainEntry {
    pub height: i32,
    pub time: u32,
    pub bits: u32,
}

/// Read access to the header chain a candidate block builds on.
pub trait HeaderChain {
    /// The entry the next block would extend.
    fn tip(&self) -> ChainEntry;

    /// Ancestor of the tip at the given height.
    fn ancestor(&self, height: i32) -> Option<ChainEntry>;
}

/// Compute the bits the next block must carry.
pub fn next_work_required(
    chain: &impl HeaderChain,
    candidate_time: u32,
    params: &ConsensusParams,
) -> u32 {
    let last = chain.tip();
    let limit_bits = encode_compact(&params.pow_limit);

    // Reset window leading into the LWMA switch.
    if last.height >= LWMA_RESET_START && last.height <= LWMA_RESET_END {
        debug!(height = last.height + 1, "difficulty reset for lwma activation window");
        return limit_bits;
    }

    let height = last.height + 1;
    if height >= LWMA_ACTIVATION_HEIGHT {
        return lwma_next_work(chain, params);
    }

    let interval = params.adjustment_interval(height);
    if i64::from(height) % interval != 0 {
        if params.allow_min_difficulty_blocks {
            // A block arriving more than twice the spacing late may be
            // mined at the minimum difficulty.
            if i64::from(candidate_time)
                > i64::from(last.time) + params.pow_target_spacing * 2
            {
                return limit_bits;
            }
            // Otherwise inherit from the last block that was not
            // itself a min-difficulty exception.
            let mut entry = last;
            while entry.height > 0
                && i64::from(entry.height) % params.adjustment_interval(entry.height) != 0
                && entry.bits == limit_bits
            {
                match chain.ancestor(entry.height - 1) {
                    Some(prev) => entry = prev,
                    None => break,
                }
            }
            return entry.bits;
        }
        return last.bits;
    }

    // Retarget boundary: measure the elapsed time over the interval.
    let first_height = last.height - (interval as i32 - 1);
    let first = match chain.ancestor(first_height) {
        Some(entry) => entry,
        None => {
            warn!(height = first_height, "retarget ancestor missing");
            return limit_bits;
        }
    };
    calculate_next_work(last, first.time, params)
}

/// Classic retarget step at an adjustment boundary.
fn calculate_next_work(last: ChainEntry, first_time: u32, params: &ConsensusParams) -> u32 {
    if params.pow_no_retargeting {
        return last.bits;
    }

    let timespan = params.pow_target_timespan;
    let mut actual = i64::from(last.time) - i64::from(first_time);
    if actual < timespan / 4 {
        actual = timespan / 4;
    }
    if actual > timespan * 4 {
        actual = timespan * 4;
    }

    let (target, _, _) = decode_compact(last.bits);
    let mut new_target = target * BigUint::from(actual as u64) / BigUint::from(timespan as u64);
    if new_target > params.pow_limit {
        new_target = params.pow_limit.clone();
    }

    let new_bits = encode_compact(&new_target);
    debug!(
        old_bits = format!("{:#010x}", last.bits),
        new_bits = format!("{:#010x}", new_bits),
        actual_timespan = actual,
        "difficulty retarget"
    );
    new_bits
}

/// LWMA retarget over the last [`LWMA_WINDOW`] blocks.
///
/// Timestamps are clamped to be monotone inside the window and each
/// solvetime to `[1, 6T]`, then solvetimes are averaged with weights
/// growing linearly towards the most recent block.
pub fn lwma_next_work(chain: &impl HeaderChain, params: &ConsensusParams) -> u32 {
    let t = params.pow_target_spacing_v2;
    let n = LWMA_WINDOW;
    let k = n * (n + 1) * t / 2;
    let limit_bits = encode_compact(&params.pow_limit);

    let last = chain.tip();
    let height = i64::from(last.height);
    if height == 0 || height < n {
        return limit_bits;
    }

    let start = match chain.ancestor((height - n) as i32) {
        Some(entry) => entry,
        None => {
            warn!(height = height - n, "lwma window start missing");
            return limit_bits;
        }
    };

    let mut previous_time = i64::from(start.time);
    let mut weighted_sum: i64 = 0;
    let mut weight: i64 = 0;
    let mut sum_target = BigUint::zero();

    for h in (height - n + 1)..=height {
        let entry = match chain.ancestor(h as i32) {
            Some(entry) => entry,
            None => {
                warn!(height = h, "lwma window entry missing");
                return limit_bits;
            }
        };

        let mut this_time = i64::from(entry.time);
        if this_time < previous_time {
            this_time = previous_time;
        }
        let solvetime = (this_time - previous_time).max(1).min(LWMA_SOLVETIME_CAP * t);
        previous_time = this_time;

        weight += 1;
        weighted_sum += solvetime * weight;
        sum_target += decode_compact(entry.bits).0;
    }

    if t == 0 || k == 0 {
        warn!("lwma parameters degenerate, falling back to pow limit");
        return limit_bits;
    }

    let avg_target = sum_target / BigUint::from(n as u64);
    let mut next_target =
        avg_target * BigUint::from(weighted_sum as u64) / BigUint::from((k * t) as u64);
    if next_target > params.pow_limit {
        next_target = params.pow_limit.clone();
    }
    if next_target.is_zero() {
        // A zero target would make every later header unencodable.
        next_target = BigUint::one();
    }
    encode_compact(&next_target)
}
