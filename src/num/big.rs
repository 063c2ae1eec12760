use std::fmt;

use super::number::{format_scaled, magnitude_to_decimal};

/// Arbitrary-precision integer kept as sign plus big-endian magnitude.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BigInteger {
    negative: bool,
    magnitude: Vec<u8>,
}

impl BigInteger {
    /// Builds from big-endian two's-complement bytes, as SMILE stores them.
    pub fn from_twos_complement(bytes: &[u8]) -> Self {
        let negative = bytes.first().is_some_and(|&byte| byte & 0x80 != 0);
        let mut magnitude: Vec<u8> = if negative {
            bytes.iter().map(|&byte| !byte).collect()
        } else {
            bytes.to_vec()
        };
        if negative {
            for byte in magnitude.iter_mut().rev() {
                let (sum, carry) = byte.overflowing_add(1);
                *byte = sum;
                if !carry {
                    break;
                }
            }
        }
        let leading = magnitude.iter().take_while(|&&byte| byte == 0).count();
        magnitude.drain(..leading);
        Self {
            negative: negative && !magnitude.is_empty(),
            magnitude,
        }
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude.is_empty()
    }

    pub fn magnitude(&self) -> &[u8] {
        &self.magnitude
    }

    pub fn to_i64(&self) -> Option<i64> {
        if self.magnitude.len() > 8 {
            return None;
        }
        let unsigned = self
            .magnitude
            .iter()
            .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte));
        if self.negative {
            0i64.checked_sub_unsigned(unsigned)
        } else {
            i64::try_from(unsigned).ok()
        }
    }

    pub fn to_f64(&self) -> f64 {
        let unsigned = self
            .magnitude
            .iter()
            .fold(0f64, |acc, &byte| acc * 256.0 + f64::from(byte));
        if self.negative {
            -unsigned
        } else {
            unsigned
        }
    }

    pub fn to_decimal_digits(&self) -> String {
        magnitude_to_decimal(&self.magnitude)
    }
}

impl From<i64> for BigInteger {
    fn from(value: i64) -> Self {
        Self::from_twos_complement(&value.to_be_bytes())
    }
}

impl fmt::Display for BigInteger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        f.write_str(&self.to_decimal_digits())
    }
}

/// `unscaled × 10^-scale`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BigDecimal {
    unscaled: BigInteger,
    scale: i32,
}

impl BigDecimal {
    pub fn new(unscaled: BigInteger, scale: i32) -> Self {
        Self { unscaled, scale }
    }

    pub fn unscaled(&self) -> &BigInteger {
        &self.unscaled
    }

    pub fn scale(&self) -> i32 {
        self.scale
    }

    pub fn to_f64(&self) -> f64 {
        self.to_string().parse().unwrap_or(f64::NAN)
    }
}

impl fmt::Display for BigDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.unscaled.to_decimal_digits();
        f.write_str(&format_scaled(
            self.unscaled.is_negative(),
            &digits,
            self.scale,
        ))
    }
}
