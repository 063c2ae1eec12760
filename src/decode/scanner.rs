use memchr::memchr;

use crate::num::varint::{self, RawBytes};
use crate::{Error, Result};

/// Forward-only cursor over a SMILE payload. Offsets are absolute positions in
/// the buffer handed to the decoder, header bytes included.
pub struct Scanner<'a> {
    input: &'a [u8],
    position: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self::at(input, 0)
    }

    pub fn at(input: &'a [u8], position: usize) -> Self {
        Self {
            input,
            position: position.min(input.len()),
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.input.len()
    }

    pub fn remaining(&self) -> usize {
        self.input.len() - self.position
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    pub fn skip(&mut self, count: usize) {
        self.position = self.position.saturating_add(count).min(self.input.len());
    }

    pub fn next_byte(&mut self, context: &str) -> Result<u8> {
        let byte = self.peek().ok_or_else(|| self.end_error(context))?;
        self.position += 1;
        Ok(byte)
    }

    pub fn take(&mut self, count: usize, context: &str) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(self.end_error(context));
        }
        let start = self.position;
        self.position += count;
        Ok(&self.input[start..self.position])
    }

    /// Returns the bytes before `marker` and moves past the marker itself.
    pub fn take_until(&mut self, marker: u8, context: &str) -> Result<&'a [u8]> {
        let rest = &self.input[self.position..];
        let idx = memchr(marker, rest).ok_or_else(|| self.end_error(context))?;
        self.position += idx + 1;
        Ok(&rest[..idx])
    }

    pub fn read_vuint(&mut self, max_bytes: usize) -> Result<u64> {
        let (value, consumed) = varint::read_vuint(self.input, self.position, max_bytes)?;
        self.position += consumed;
        Ok(value)
    }

    pub fn read_fixed_7bit(&mut self, count: usize, context: &str) -> Result<u64> {
        let bits = varint::read_fixed_7bit(self.input, self.position, count, context)?;
        self.position += count;
        Ok(bits)
    }

    pub fn read_7bit_bytes(&mut self, raw_len: usize) -> Result<RawBytes> {
        let (bytes, consumed) = varint::decode_7bit(self.input, self.position, raw_len)?;
        self.position += consumed;
        Ok(bytes)
    }

    fn end_error(&self, context: &str) -> Error {
        Error::unexpected_end(self.input.len(), context)
    }
}
