pub const SMILE_MAGIC: &[u8; 3] = b":)\n";

pub const SMILE_HEADER_LEN: usize = 4;

pub const MAX_DEPTH: usize = 1000;

pub const SHARED_TABLE_CAPACITY: usize = 1024;

/// Longest tiny/short string that takes part in value sharing.
pub const MAX_SHARED_STRING_LEN: usize = 65;

/// Largest BigInteger/BigDecimal magnitude accepted, in decoded bytes
/// (about 2,466 decimal digits).
pub const MAX_BIG_NUMBER_BYTES: usize = 1024;

pub const HEADER_VERSION_MASK: u8 = 0xF0;
pub const HEADER_RAW_BINARY: u8 = 0x04;
pub const HEADER_SHARED_VALUES: u8 = 0x02;
pub const HEADER_SHARED_NAMES: u8 = 0x01;

pub mod token {
    pub const EMPTY_STRING: u8 = 0x20;
    pub const NULL: u8 = 0x21;
    pub const FALSE: u8 = 0x22;
    pub const TRUE: u8 = 0x23;
    pub const INT32: u8 = 0x24;
    pub const INT64: u8 = 0x25;
    pub const BIG_INTEGER: u8 = 0x26;
    pub const FLOAT32: u8 = 0x28;
    pub const FLOAT64: u8 = 0x29;
    pub const BIG_DECIMAL: u8 = 0x2A;

    pub const TINY_ASCII: u8 = 0x40;
    pub const SHORT_ASCII: u8 = 0x60;
    pub const TINY_UNICODE: u8 = 0x80;
    pub const SHORT_UNICODE: u8 = 0xA0;
    pub const SMALL_INT: u8 = 0xC0;

    pub const LONG_ASCII: u8 = 0xE0;
    pub const LONG_UNICODE: u8 = 0xE4;
    pub const LONG_SHARED_VALUE: u8 = 0xEC;

    pub const START_ARRAY: u8 = 0xF8;
    pub const END_ARRAY: u8 = 0xF9;
    pub const START_OBJECT: u8 = 0xFA;
    pub const END_OBJECT: u8 = 0xFB;
    pub const END_STRING: u8 = 0xFC;
    pub const END_CONTENT: u8 = 0xFF;
}

pub mod key {
    pub const EMPTY: u8 = 0x20;
    pub const LONG_SHARED: u8 = 0x30;
    pub const LONG_UNICODE: u8 = 0x34;
    pub const SHORT_SHARED: u8 = 0x40;
    pub const SHORT_ASCII: u8 = 0x80;
    pub const SHORT_UNICODE: u8 = 0xC0;
    pub const SHORT_UNICODE_LAST: u8 = 0xF7;
}

#[inline]
pub fn is_structural_end(byte: u8) -> bool {
    matches!(byte, token::END_ARRAY | token::END_OBJECT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    fn test_is_structural_end() {
        assert!(is_structural_end(token::END_ARRAY));
        assert!(is_structural_end(token::END_OBJECT));
        assert!(!is_structural_end(token::START_ARRAY));
        assert!(!is_structural_end(token::END_STRING));
    }

    #[rstest::rstest]
    fn test_string_ranges_do_not_overlap() {
        assert!(token::TINY_ASCII + 0x1F < token::SHORT_ASCII);
        assert!(token::SHORT_ASCII + 0x1F < token::TINY_UNICODE);
        assert!(token::TINY_UNICODE + 0x1F < token::SHORT_UNICODE);
        assert!(token::SHORT_UNICODE + 0x1F < token::SMALL_INT);
        assert!(key::SHORT_UNICODE_LAST < token::START_ARRAY);
    }

    #[rstest::rstest]
    fn test_header_flag_bits_are_distinct() {
        let flags = [HEADER_RAW_BINARY, HEADER_SHARED_VALUES, HEADER_SHARED_NAMES];
        for (i, a) in flags.iter().enumerate() {
            assert_eq!(a & HEADER_VERSION_MASK, 0);
            for b in &flags[i + 1..] {
                assert_eq!(a & b, 0);
            }
        }
    }
}
