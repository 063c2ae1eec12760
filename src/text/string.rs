use crate::{Error, Result};

/// Copies a string payload out of the input. `offset` is where the payload
/// starts and is reported if the bytes are not UTF-8.
pub fn decode_text(bytes: &[u8], offset: usize) -> Result<String> {
    if bytes.is_ascii() {
        // ASCII is valid UTF-8; skip the full validation pass.
        return Ok(bytes.iter().map(|&byte| char::from(byte)).collect());
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(text.to_owned()),
        Err(err) => Err(Error::invalid_utf8(offset + err.valid_up_to())),
    }
}

/// Drops control characters so header fields print on one line.
pub fn printable(text: &str) -> String {
    text.chars().filter(|ch| !ch.is_control()).collect()
}
