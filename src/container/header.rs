use memchr::memchr;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The JSON line that opens every match file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub version: String,
    pub compress: bool,
    #[serde(rename = "useSmile")]
    pub use_smile: bool,
}

/// Parses the header line and returns it with the offset where the payload
/// starts (one past the newline).
pub fn read_header(input: &[u8]) -> Result<(Header, usize)> {
    let newline = memchr(b'\n', input)
        .ok_or_else(|| Error::header("header line is not terminated by a newline"))?;
    let header = serde_json::from_slice(&input[..newline])
        .map_err(|err| Error::header(format!("invalid header: {err}")))?;
    Ok((header, newline + 1))
}
