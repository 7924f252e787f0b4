//! Compact (nBits) target codec.
//!
//! A compact target packs a 256-bit threshold into 32 bits: one size
//! byte and a 23-bit mantissa with a sign flag. The mantissa keeps the
//! most significant bytes of the value, so the encoding is lossy below
//! the top three bytes.

use num_bigint::BigUint;
use num_traits::Zero;

/// Decode compact bits into `(value, negative, overflow)`.
///
/// `negative` and `overflow` mirror the flags of the original
/// `arith_uint256::SetCompact`; callers must reject either.
pub fn decode_compact(bits: u32) -> (BigUint, bool, bool) {
    let size = (bits >> 24) as usize;
    let word = bits & 0x007f_ffff;
    let value = if size <= 3 {
        BigUint::from(word >> (8 * (3 - size)))
    } else {
        BigUint::from(word) << (8 * (size - 3))
    };
    let negative = word != 0 && (bits & 0x0080_0000) != 0;
    let overflow = word != 0
        && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32));
    (value, negative, overflow)
}

/// Encode a non-negative value as compact bits.
///
/// When the mantissa's top bit would collide with the sign flag the
/// mantissa is shifted down a byte and the exponent bumped, so the
/// sign bit is never set.
pub fn encode_compact(value: &BigUint) -> u32 {
    if value.is_zero() {
        return 0;
    }
    let mut size = ((value.bits() + 7) / 8) as usize;
    let mut compact: u64 = if size <= 3 {
        low_u64(value) << (8 * (3 - size))
    } else {
        low_u64(&(value >> (8 * (size - 3))))
    };
    if compact & 0x0080_0000 != 0 {
        compact >>= 8;
        size += 1;
    }
    (compact as u32) | ((size as u32) << 24)
}

fn low_u64(value: &BigUint) -> u64 {
    value.iter_u64_digits().next().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_mainnet_limit() {
        // Scenario: 0x1d00ffff is 0x00ffff shifted up 26 bytes.
        let (value, negative, overflow) = decode_compact(0x1d00ffff);
        assert!(!negative);
        assert!(!overflow);
        assert_eq!(value, BigUint::from(0x00ffffu32) << (8 * 26));
        assert_eq!(encode_compact(&value), 0x1d00ffff);
    }

    #[test]
    fn test_decode_zero_word() {
        let (value, negative, overflow) = decode_compact(0x00000000);
        assert!(value.is_zero());
        assert!(!negative);
        assert!(!overflow);

        // A zero mantissa never counts as negative or overflowing.
        let (value, negative, overflow) = decode_compact(0xff800000);
        assert!(value.is_zero());
        assert!(!negative);
        assert!(!overflow);
    }

    #[test]
    fn test_decode_negative_flag() {
        let (_, negative, _) = decode_compact(0x01803456);
        assert!(negative);
        let (_, negative, _) = decode_compact(0x01003456);
        assert!(!negative);
    }

    #[test]
    fn test_decode_overflow() {
        assert!(decode_compact(0x23000001).2);
        assert!(decode_compact(0x22000100).2);
        assert!(decode_compact(0x21010000).2);
        assert!(!decode_compact(0x22000001).2);
        assert!(!decode_compact(0x20ffffff).2);
    }

    #[test]
    fn test_encode_small_values() {
        assert_eq!(encode_compact(&BigUint::zero()), 0);
        assert_eq!(encode_compact(&BigUint::from(0x12u32)), 0x01120000);
        assert_eq!(encode_compact(&BigUint::from(0x1234u32)), 0x02123400);
        assert_eq!(encode_compact(&BigUint::from(0x123456u32)), 0x03123456);
    }

    #[test]
    fn test_encode_sign_bit_adjustment() {
        // Top mantissa bit set: shift down a byte, bump the exponent.
        assert_eq!(encode_compact(&BigUint::from(0x80u32)), 0x02008000);
        assert_eq!(encode_compact(&BigUint::from(0x800000u32)), 0x04008000);
    }

    #[test]
    fn test_round_trip_loses_at_most_low_bytes() {
        let value = BigUint::from(0x12345678u32);
        let decoded = decode_compact(encode_compact(&value)).0;
        assert_eq!(decoded, BigUint::from(0x12345600u32));

        let value = BigUint::from(0x80ffffu32);
        let decoded = decode_compact(encode_compact(&value)).0;
        assert_eq!(decoded, BigUint::from(0x80ff00u32));
    }

    #[test]
    fn test_regtest_limit_round_trip() {
        let limit = BigUint::from(0x7fffffu32) << (8 * 29);
        assert_eq!(encode_compact(&limit), 0x207fffff);
        assert_eq!(decode_compact(0x207fffff).0, limit);
    }
}
