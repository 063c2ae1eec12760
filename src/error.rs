use std::fmt;

use thiserror::Error;

use crate::decode::shared::TableKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Header,
    Decompress,
    Json,
    Deserialize,
    InvalidMagic,
    UnsupportedVersion(u8),
    UnexpectedEnd,
    ValueTooLarge,
    UnknownToken(u8),
    BackReference { table: TableKind, index: usize },
    InvalidUtf8,
    DepthLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStage {
    Header,
    Payload,
    Decompress,
    Smile,
    Json,
    Deserialize,
}

impl fmt::Display for ErrorStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorStage::Header => "header",
            ErrorStage::Payload => "payload",
            ErrorStage::Decompress => "decompress",
            ErrorStage::Smile => "smile",
            ErrorStage::Json => "json",
            ErrorStage::Deserialize => "deserialize",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub offset: usize,
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub stage: ErrorStage,
    pub message: String,
    pub location: Option<Location>,
}

impl Error {
    fn new(kind: ErrorKind, stage: ErrorStage, message: impl Into<String>) -> Self {
        Self {
            kind,
            stage,
            message: message.into(),
            location: None,
        }
    }

    pub fn io(stage: ErrorStage, err: &std::io::Error) -> Self {
        Self::new(ErrorKind::Io, stage, format!("read failed: {err}"))
    }

    pub fn header(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Header, ErrorStage::Header, message)
    }

    pub fn decompress(err: &std::io::Error) -> Self {
        Self::new(
            ErrorKind::Decompress,
            ErrorStage::Decompress,
            format!("gzip decompression failed: {err}"),
        )
    }

    pub fn json(err: &serde_json::Error) -> Self {
        Self::new(
            ErrorKind::Json,
            ErrorStage::Json,
            format!("invalid json payload: {err}"),
        )
    }

    pub fn deserialize(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Deserialize, ErrorStage::Deserialize, message)
    }

    pub fn invalid_magic() -> Self {
        Self::new(
            ErrorKind::InvalidMagic,
            ErrorStage::Smile,
            "invalid smile header: expected `:)\\n`",
        )
    }

    pub fn unsupported_version(version: u8) -> Self {
        Self::new(
            ErrorKind::UnsupportedVersion(version),
            ErrorStage::Smile,
            format!("unsupported smile version: {version}"),
        )
    }

    pub fn unexpected_end(offset: usize, context: &str) -> Self {
        Self::new(
            ErrorKind::UnexpectedEnd,
            ErrorStage::Smile,
            format!("unexpected end of input while reading {context}"),
        )
        .at(offset)
    }

    pub fn value_too_large(offset: usize, max_bytes: usize) -> Self {
        Self::new(
            ErrorKind::ValueTooLarge,
            ErrorStage::Smile,
            format!("variable-length integer longer than {max_bytes} bytes"),
        )
        .at(offset)
    }

    pub fn unknown_token(offset: usize, byte: u8, context: &str) -> Self {
        Self::new(
            ErrorKind::UnknownToken(byte),
            ErrorStage::Smile,
            format!("unexpected {context} token 0x{byte:02x}"),
        )
        .at(offset)
    }

    pub fn back_reference(offset: usize, table: TableKind, index: usize, len: usize) -> Self {
        Self::new(
            ErrorKind::BackReference { table, index },
            ErrorStage::Smile,
            format!("shared {table} reference {index} out of range (table holds {len})"),
        )
        .at(offset)
    }

    pub fn invalid_utf8(offset: usize) -> Self {
        Self::new(
            ErrorKind::InvalidUtf8,
            ErrorStage::Smile,
            "string is not valid utf-8",
        )
        .at(offset)
    }

    pub fn number_out_of_range(offset: usize, context: &str) -> Self {
        Self::new(
            ErrorKind::ValueTooLarge,
            ErrorStage::Smile,
            format!("{context} out of range"),
        )
        .at(offset)
    }

    pub fn depth_limit(offset: usize, max_depth: usize) -> Self {
        Self::new(
            ErrorKind::DepthLimit,
            ErrorStage::Smile,
            format!("nesting deeper than {max_depth} levels"),
        )
        .at(offset)
    }

    pub fn at(mut self, offset: usize) -> Self {
        self.location = Some(Location { offset });
        self
    }

    pub fn with_stage(mut self, stage: ErrorStage) -> Self {
        self.stage = stage;
        self
    }

    pub fn with_context(mut self, context: impl fmt::Display) -> Self {
        self.message = format!("{context}: {}", self.message);
        self
    }

    pub fn offset(&self) -> Option<usize> {
        self.location.map(|location| location.offset)
    }

    /// Errors raised while interpreting SMILE tokens after the header has
    /// validated. These never abort a decode; they end up in a partial result.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::UnexpectedEnd
                | ErrorKind::ValueTooLarge
                | ErrorKind::UnknownToken(_)
                | ErrorKind::BackReference { .. }
                | ErrorKind::InvalidUtf8
                | ErrorKind::DepthLimit
        )
    }
}
