use std::io::Read;

use flate2::read::GzDecoder;

use crate::{Error, Result};

pub fn gunzip(payload: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(payload);
    let mut out = Vec::with_capacity(payload.len().saturating_mul(4));
    decoder
        .read_to_end(&mut out)
        .map_err(|err| Error::decompress(&err))?;
    Ok(out)
}
