//! SMILE variable-length integers, ZigZag and the 7-bit "safe" byte layout.
//!
//! A SMILE VInt stores its most significant group first. Every byte but the
//! last has the high bit clear and carries 7 bits; the last byte has the high
//! bit set and carries 6 bits.

use smallvec::SmallVec;

use crate::{Error, Result};

/// Upper bound for 32-bit quantities: string lengths, scales, int32 tokens.
pub const MAX_VINT32_BYTES: usize = 5;

/// Upper bound for int64 tokens.
pub const MAX_VINT64_BYTES: usize = 10;

pub type RawBytes = SmallVec<[u8; 16]>;

/// Reads one VInt starting at `pos`, returning the value and the number of
/// bytes it occupied.
pub fn read_vuint(bytes: &[u8], pos: usize, max_bytes: usize) -> Result<(u64, usize)> {
    let mut value: u64 = 0;
    for consumed in 0..max_bytes {
        let byte = *bytes
            .get(pos + consumed)
            .ok_or_else(|| Error::unexpected_end(bytes.len(), "variable-length integer"))?;
        if byte & 0x80 != 0 {
            value = (value << 6) | u64::from(byte & 0x3F);
            return Ok((value, consumed + 1));
        }
        value = (value << 7) | u64::from(byte);
    }
    Err(Error::value_too_large(pos, max_bytes))
}

#[inline]
pub fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

#[inline]
pub fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Folds `count` bytes of 7 payload bits each into one integer. Bits shifted
/// past the top of the accumulator are dropped, which is how SMILE packs the
/// 32-bit float (5 bytes) and 64-bit double (10 bytes) patterns.
pub fn read_fixed_7bit(bytes: &[u8], pos: usize, count: usize, context: &str) -> Result<u64> {
    let chunk = pos
        .checked_add(count)
        .and_then(|end| bytes.get(pos..end))
        .ok_or_else(|| Error::unexpected_end(bytes.len(), context))?;
    Ok(chunk
        .iter()
        .fold(0u64, |acc, &byte| (acc << 7) | u64::from(byte & 0x7F)))
}

/// Number of encoded bytes that carry `raw_len` raw bytes.
pub fn encoded_7bit_len(raw_len: usize) -> usize {
    let rem = raw_len % 7;
    (raw_len / 7) * 8 + if rem > 0 { rem + 1 } else { 0 }
}

/// Decodes `raw_len` bytes stored 7 bits per byte. Full groups are 8 encoded
/// bytes for 7 raw bytes; a trailing group of `n` raw bytes uses `n + 1`
/// encoded bytes, the last one holding `n` right-aligned bits.
pub fn decode_7bit(bytes: &[u8], pos: usize, raw_len: usize) -> Result<(RawBytes, usize)> {
    let encoded_len = encoded_7bit_len(raw_len);
    let encoded = pos
        .checked_add(encoded_len)
        .and_then(|end| bytes.get(pos..end))
        .ok_or_else(|| Error::unexpected_end(bytes.len(), "7-bit encoded bytes"))?;

    let full = raw_len / 7;
    let rem = raw_len % 7;
    let mut out = RawBytes::with_capacity(raw_len);
    for group in encoded[..full * 8].chunks_exact(8) {
        let acc = group
            .iter()
            .fold(0u64, |acc, &byte| (acc << 7) | u64::from(byte & 0x7F));
        out.extend_from_slice(&acc.to_be_bytes()[1..]);
    }
    if rem > 0 {
        let tail = &encoded[full * 8..];
        let mut acc = tail[..rem]
            .iter()
            .fold(0u64, |acc, &byte| (acc << 7) | u64::from(byte & 0x7F));
        acc = (acc << rem) | u64::from(tail[rem] & ((1u8 << rem) - 1));
        out.extend_from_slice(&acc.to_be_bytes()[8 - rem..]);
    }
    Ok((out, encoded_len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn encode_vuint(mut value: u64) -> Vec<u8> {
        let mut out = vec![0x80 | (value & 0x3F) as u8];
        value >>= 6;
        while value > 0 {
            out.push((value & 0x7F) as u8);
            value >>= 7;
        }
        out.reverse();
        out
    }

    fn encode_7bit(raw: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut chunks = raw.chunks_exact(7);
        for group in &mut chunks {
            let mut buf = [0u8; 8];
            buf[1..].copy_from_slice(group);
            let acc = u64::from_be_bytes(buf);
            for shift in (0..8).rev() {
                out.push(((acc >> (shift * 7)) & 0x7F) as u8);
            }
        }
        let tail = chunks.remainder();
        if !tail.is_empty() {
            let n = tail.len();
            let mut acc: u64 = 0;
            for &byte in tail {
                acc = (acc << 8) | u64::from(byte);
            }
            let last = (acc & ((1 << n) - 1)) as u8;
            let high = acc >> n;
            for shift in (0..n).rev() {
                out.push(((high >> (shift * 7)) & 0x7F) as u8);
            }
            out.push(last);
        }
        out
    }

    #[rstest::rstest]
    #[case(0, &[0x80])]
    #[case(63, &[0xBF])]
    #[case(64, &[0x01, 0x80])]
    #[case(300, &[0x04, 0xAC])]
    fn test_read_vuint_known_encodings(#[case] expected: u64, #[case] bytes: &[u8]) {
        let (value, consumed) = read_vuint(bytes, 0, MAX_VINT32_BYTES).unwrap();
        assert_eq!(value, expected);
        assert_eq!(consumed, bytes.len());
    }

    #[rstest::rstest]
    fn test_read_vuint_matches_encoder() {
        for value in [0u64, 1, 63, 64, 8191, 8192, 1 << 20, u32::MAX as u64] {
            let bytes = encode_vuint(value);
            let (decoded, consumed) = read_vuint(&bytes, 0, MAX_VINT32_BYTES).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(consumed, bytes.len());
        }
        let bytes = encode_vuint(u64::MAX);
        let (decoded, _) = read_vuint(&bytes, 0, MAX_VINT64_BYTES).unwrap();
        assert_eq!(decoded, u64::MAX);
    }

    #[rstest::rstest]
    fn test_read_vuint_stops_at_terminal_byte() {
        let bytes = [0x7F, 0x04, 0xAC, 0x42];
        let (value, consumed) = read_vuint(&bytes, 1, MAX_VINT32_BYTES).unwrap();
        assert_eq!(value, 300);
        assert_eq!(consumed, 2);
    }

    #[rstest::rstest]
    fn test_read_vuint_too_long() {
        let bytes = [0x01; MAX_VINT32_BYTES + 1];
        let err = read_vuint(&bytes, 0, MAX_VINT32_BYTES).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValueTooLarge);
        assert_eq!(err.offset(), Some(0));
    }

    #[rstest::rstest]
    #[case(&[])]
    #[case(&[0x01])]
    #[case(&[0x01, 0x02, 0x03])]
    fn test_read_vuint_truncated(#[case] bytes: &[u8]) {
        let err = read_vuint(bytes, 0, MAX_VINT32_BYTES).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedEnd);
        assert_eq!(err.offset(), Some(bytes.len()));
    }

    #[rstest::rstest]
    fn test_zigzag_involution() {
        for value in [0, -1, 1, -2, 2, i64::MIN / 2, i64::MAX / 2, i64::MIN, i64::MAX] {
            assert_eq!(zigzag_decode(zigzag_encode(value)), value);
        }
    }

    #[rstest::rstest]
    fn test_zigzag_small_values() {
        assert_eq!(zigzag_decode(0), 0);
        assert_eq!(zigzag_decode(1), -1);
        assert_eq!(zigzag_decode(2), 1);
        assert_eq!(zigzag_decode(3), -2);
        assert_eq!(zigzag_decode(31), -16);
        assert_eq!(zigzag_decode(30), 15);
    }

    #[rstest::rstest]
    fn test_read_fixed_7bit_double() {
        let bits = 1.5f64.to_bits();
        let mut bytes = Vec::new();
        for shift in (0..10).rev() {
            bytes.push(((bits >> (shift * 7)) & 0x7F) as u8);
        }
        let decoded = read_fixed_7bit(&bytes, 0, 10, "double").unwrap();
        assert_eq!(f64::from_bits(decoded), 1.5);
    }

    #[rstest::rstest]
    fn test_read_fixed_7bit_truncated() {
        let err = read_fixed_7bit(&[0x01, 0x02], 0, 5, "float").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedEnd);
        assert_eq!(err.offset(), Some(2));
    }

    #[rstest::rstest]
    #[case(&[])]
    #[case(&[0xFF])]
    #[case(&[0x12, 0x34, 0x56])]
    #[case(&[1, 2, 3, 4, 5, 6, 7])]
    #[case(&[0x80, 0, 0, 0, 0, 0, 0, 0xFF, 0x7F])]
    fn test_decode_7bit(#[case] raw: &[u8]) {
        let encoded = encode_7bit(raw);
        assert_eq!(encoded.len(), encoded_7bit_len(raw.len()));
        assert!(encoded.iter().all(|byte| byte & 0x80 == 0));
        let (decoded, consumed) = decode_7bit(&encoded, 0, raw.len()).unwrap();
        assert_eq!(decoded.as_slice(), raw);
        assert_eq!(consumed, encoded.len());
    }

    #[rstest::rstest]
    fn test_decode_7bit_truncated() {
        let encoded = encode_7bit(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let err = decode_7bit(&encoded[..5], 0, 8).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedEnd);
        assert_eq!(err.offset(), Some(5));
    }
}
