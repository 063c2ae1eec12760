pub mod constants;
pub mod container;
pub mod decode;
pub mod error;
pub mod num;
pub mod options;
pub mod text;
pub mod types;

use std::io::Read;
use std::path::{Path, PathBuf};

pub use crate::container::{read_header, Header, Match};
pub use crate::decode::shared::TableKind;
pub use crate::decode::{DecodeOutcome, DecodeWarning, SmileHeader};
pub use crate::error::{Error, ErrorKind, ErrorStage, Location};
pub use crate::num::{BigDecimal, BigInteger};
pub use crate::options::DecodeOptions;
pub use crate::types::{Map, Value};

pub type Result<T> = std::result::Result<T, Error>;

/// Decodes a standalone SMILE document. Fails only when the stream header is
/// unusable; anything that goes wrong after that yields
/// [`DecodeOutcome::Partial`].
pub fn decode_smile(input: &[u8]) -> Result<DecodeOutcome> {
    decode_smile_with_options(input, &DecodeOptions::default())
}

pub fn decode_smile_with_options(input: &[u8], options: &DecodeOptions) -> Result<DecodeOutcome> {
    decode::decode_smile(input, options)
}

pub fn from_slice(input: &[u8]) -> Result<Match> {
    from_slice_with_options(input, &DecodeOptions::default())
}

pub fn from_slice_with_options(input: &[u8], options: &DecodeOptions) -> Result<Match> {
    container::from_slice(input, options)
}

pub fn from_reader<R: Read>(reader: R) -> Result<Match> {
    from_reader_with_options(reader, &DecodeOptions::default())
}

pub fn from_reader_with_options<R: Read>(reader: R, options: &DecodeOptions) -> Result<Match> {
    container::from_reader(reader, options)
}

pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Match> {
    from_path_with_options(path, &DecodeOptions::default())
}

pub fn from_path_with_options<P: AsRef<Path>>(path: P, options: &DecodeOptions) -> Result<Match> {
    container::from_path(path.as_ref(), options)
}

pub fn parse_files<I, P>(paths: I) -> Vec<(PathBuf, Result<Match>)>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    container::parse_files(paths, &DecodeOptions::default())
}

#[cfg(feature = "parallel")]
pub fn parse_files_parallel<P>(paths: &[P]) -> Vec<(PathBuf, Result<Match>)>
where
    P: AsRef<Path> + Sync,
{
    container::parse_files_parallel(paths, &DecodeOptions::default())
}
