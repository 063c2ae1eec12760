//! The match file container: a JSON header line followed by a payload that
//! may be gzip compressed and may be SMILE encoded.

pub mod compression;
pub mod header;

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::decode::{decode_smile, DecodeWarning};
use crate::text::string::printable;
use crate::types::{Map, Value};
use crate::{DecodeOptions, Error, ErrorStage, Result};

pub use compression::gunzip;
pub use header::{read_header, Header};

/// Top-level keys copied into [`Match::info`] when the document has them.
const SUMMARY_KEYS: [&str; 6] = ["playerX", "playerO", "matchLength", "score", "date", "event"];

#[derive(Debug, Clone)]
pub struct Match {
    pub header: Header,
    pub data: Value,
    /// Set when the SMILE payload could only be decoded in part.
    pub warning: Option<DecodeWarning>,
}

impl Match {
    pub fn format(&self) -> &str {
        &self.header.format
    }

    pub fn version(&self) -> &str {
        &self.header.version
    }

    pub fn is_compressed(&self) -> bool {
        self.header.compress
    }

    pub fn uses_smile(&self) -> bool {
        self.header.use_smile
    }

    pub fn is_partial(&self) -> bool {
        self.warning.is_some()
    }

    pub fn info(&self) -> Map {
        let mut info = Map::new();
        info.insert("format".into(), Value::String(self.header.format.clone()));
        info.insert("version".into(), Value::String(self.header.version.clone()));
        info.insert("compress".into(), Value::Bool(self.header.compress));
        info.insert("useSmile".into(), Value::Bool(self.header.use_smile));
        for key in SUMMARY_KEYS {
            if let Some(value) = self.data.get(key) {
                info.insert(key.into(), value.clone());
            }
        }
        info
    }

    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(serde_json::Value::from(&self.data))
            .map_err(|err| Error::deserialize(format!("deserialize failed: {err}")))
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BGF Match (Format: {}, Version: {}, Compressed: {}, SMILE: {})",
            printable(&self.header.format),
            printable(&self.header.version),
            self.header.compress,
            self.header.use_smile
        )
    }
}

pub fn from_slice(input: &[u8], options: &DecodeOptions) -> Result<Match> {
    let (header, payload_start) = read_header(input)?;
    debug!(
        format = %header.format,
        version = %header.version,
        compress = header.compress,
        use_smile = header.use_smile,
        "read match header"
    );

    let payload = &input[payload_start..];
    debug!(bytes = payload.len(), "read payload");

    let inflated;
    let body = if header.compress {
        inflated = gunzip(payload)?;
        debug!(
            compressed = payload.len(),
            inflated = inflated.len(),
            "decompressed payload"
        );
        inflated.as_slice()
    } else {
        payload
    };

    let (data, warning) = if header.use_smile {
        debug!(bytes = body.len(), "decoding smile payload");
        decode_smile(body, options)?.into_parts()
    } else {
        debug!(bytes = body.len(), "decoding json payload");
        let json: serde_json::Value =
            serde_json::from_slice(body).map_err(|err| Error::json(&err))?;
        (Value::from(json), None)
    };
    debug!(partial = warning.is_some(), "match decoded");

    Ok(Match {
        header,
        data,
        warning,
    })
}

pub fn from_reader<R: Read>(mut reader: R, options: &DecodeOptions) -> Result<Match> {
    let mut buf = Vec::new();
    reader
        .read_to_end(&mut buf)
        .map_err(|err| Error::io(ErrorStage::Payload, &err))?;
    from_slice(&buf, options)
}

pub fn from_path(path: &Path, options: &DecodeOptions) -> Result<Match> {
    debug!(path = %path.display(), "opening match file");
    let bytes = std::fs::read(path)
        .map_err(|err| Error::io(ErrorStage::Payload, &err).with_context(path.display()))?;
    from_slice(&bytes, options).map_err(|err| err.with_context(path.display()))
}

pub fn parse_files<I, P>(paths: I, options: &DecodeOptions) -> Vec<(PathBuf, Result<Match>)>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    paths
        .into_iter()
        .map(|path| {
            let path = path.as_ref().to_path_buf();
            let parsed = from_path(&path, options);
            (path, parsed)
        })
        .collect()
}

#[cfg(feature = "parallel")]
pub fn parse_files_parallel<P>(paths: &[P], options: &DecodeOptions) -> Vec<(PathBuf, Result<Match>)>
where
    P: AsRef<Path> + Sync,
{
    use rayon::prelude::*;

    paths
        .par_iter()
        .map(|path| {
            let path = path.as_ref().to_path_buf();
            let parsed = from_path(&path, options);
            (path, parsed)
        })
        .collect()
}
