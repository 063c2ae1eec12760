pub mod parser;
pub mod scanner;
pub mod shared;

use std::fmt;

use tracing::warn;

use crate::constants::{
    HEADER_RAW_BINARY, HEADER_SHARED_NAMES, HEADER_SHARED_VALUES, HEADER_VERSION_MASK,
    SMILE_HEADER_LEN, SMILE_MAGIC,
};
use crate::types::Value;
use crate::{DecodeOptions, Error, Result};

use parser::{Interrupted, SmileParser};

/// Flags carried by the fourth byte of a SMILE stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmileHeader {
    pub version: u8,
    pub raw_binary: bool,
    pub shared_values: bool,
    pub shared_names: bool,
}

impl SmileHeader {
    pub fn parse(input: &[u8]) -> Result<Self> {
        if input.len() < SMILE_HEADER_LEN || !input.starts_with(SMILE_MAGIC) {
            return Err(Error::invalid_magic());
        }
        let flags = input[SMILE_MAGIC.len()];
        let version = (flags & HEADER_VERSION_MASK) >> 4;
        if version != 0 {
            return Err(Error::unsupported_version(version));
        }
        Ok(Self {
            version,
            raw_binary: flags & HEADER_RAW_BINARY != 0,
            shared_values: flags & HEADER_SHARED_VALUES != 0,
            shared_names: flags & HEADER_SHARED_NAMES != 0,
        })
    }
}

/// Diagnostics for a decode that stopped before the end of its input.
#[derive(Debug, Clone)]
pub struct DecodeWarning {
    pub error: Error,
    pub offset: usize,
    pub total: usize,
}

impl DecodeWarning {
    pub fn percent_consumed(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.offset as f64 * 100.0 / self.total as f64
    }
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "partial decode: stopped at byte {} of {} ({:.1}%): {}",
            self.offset,
            self.total,
            self.percent_consumed(),
            self.error
        )
    }
}

#[derive(Debug, Clone)]
pub enum DecodeOutcome {
    Complete(Value),
    /// Everything decoded before the failure. Containers that were still open
    /// contribute only the entries they finished.
    Partial { value: Value, warning: DecodeWarning },
}

impl DecodeOutcome {
    pub fn value(&self) -> &Value {
        match self {
            DecodeOutcome::Complete(value) | DecodeOutcome::Partial { value, .. } => value,
        }
    }

    pub fn warning(&self) -> Option<&DecodeWarning> {
        match self {
            DecodeOutcome::Complete(_) => None,
            DecodeOutcome::Partial { warning, .. } => Some(warning),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, DecodeOutcome::Complete(_))
    }

    pub fn into_value(self) -> Value {
        self.into_parts().0
    }

    pub fn into_parts(self) -> (Value, Option<DecodeWarning>) {
        match self {
            DecodeOutcome::Complete(value) => (value, None),
            DecodeOutcome::Partial { value, warning } => (value, Some(warning)),
        }
    }
}

pub fn decode_smile(input: &[u8], options: &DecodeOptions) -> Result<DecodeOutcome> {
    let header = SmileHeader::parse(input)?;
    if header.raw_binary {
        tracing::debug!("raw binary flag set; binary values are not expected in match data");
    }
    let mut parser = SmileParser::new(input, SMILE_HEADER_LEN, header, options);
    match parser.decode_document() {
        Ok(value) => Ok(DecodeOutcome::Complete(value)),
        Err(Interrupted { error, partial }) => {
            let offset = error.offset().unwrap_or_else(|| parser.position());
            let warning = DecodeWarning {
                error,
                offset,
                total: input.len(),
            };
            warn!(
                offset = warning.offset,
                total = warning.total,
                "{}",
                warning
            );
            Ok(DecodeOutcome::Partial {
                value: partial.unwrap_or_default(),
                warning,
            })
        }
    }
}
