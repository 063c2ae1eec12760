use crate::constants::{is_structural_end, key, token, MAX_BIG_NUMBER_BYTES, MAX_SHARED_STRING_LEN};
use crate::num::varint::{zigzag_decode, MAX_VINT32_BYTES, MAX_VINT64_BYTES};
use crate::num::{BigDecimal, BigInteger};
use crate::text::decode_text;
use crate::types::{Map, Value};
use crate::{DecodeOptions, Error, Result};

use super::scanner::Scanner;
use super::shared::{SharedTable, TableKind};
use super::SmileHeader;

/// A decode that stopped early. `partial` is the outermost container that
/// was open when the error surfaced, holding only the entries it completed.
#[derive(Debug)]
pub(crate) struct Interrupted {
    pub error: Error,
    pub partial: Option<Value>,
}

/// An open container. Objects carry the key whose value is being decoded.
enum Frame {
    Array(Vec<Value>),
    Object { map: Map, pending: Option<String> },
}

impl Frame {
    fn push(&mut self, value: Value) {
        match self {
            Frame::Array(items) => items.push(value),
            Frame::Object { map, pending } => {
                if let Some(name) = pending.take() {
                    map.insert(name, value);
                }
            }
        }
    }

    fn into_value(self) -> Value {
        match self {
            Frame::Array(items) => Value::Array(items),
            Frame::Object { map, .. } => Value::Object(map),
        }
    }
}

pub(crate) struct SmileParser<'a> {
    scanner: Scanner<'a>,
    keys: SharedTable,
    values: SharedTable,
    share_keys: bool,
    share_values: bool,
    max_depth: usize,
    retain_partial: bool,
}

impl<'a> SmileParser<'a> {
    pub fn new(input: &'a [u8], start: usize, header: SmileHeader, options: &DecodeOptions) -> Self {
        Self {
            scanner: Scanner::at(input, start),
            keys: SharedTable::with_capacity(TableKind::Keys, options.shared_capacity),
            values: SharedTable::with_capacity(TableKind::Values, options.shared_capacity),
            share_keys: header.shared_names,
            share_values: header.shared_values,
            max_depth: options.max_depth,
            retain_partial: options.retain_partial_containers,
        }
    }

    pub fn position(&self) -> usize {
        self.scanner.position()
    }

    pub fn decode_document(&mut self) -> std::result::Result<Value, Interrupted> {
        let value = self.decode_tree()?;
        if self.scanner.peek() == Some(token::END_CONTENT) {
            self.scanner.skip(1);
        }
        if !self.scanner.is_at_end() {
            tracing::debug!(
                trailing = self.scanner.remaining(),
                "ignoring bytes after the root value"
            );
        }
        Ok(value)
    }

    /// Builds the root value with an explicit stack of open containers, so
    /// nesting depth is bounded by `max_depth` alone.
    fn decode_tree(&mut self) -> std::result::Result<Value, Interrupted> {
        let mut stack: Vec<Frame> = Vec::new();
        loop {
            match self.step(&mut stack) {
                Ok(Some(value)) => match stack.last_mut() {
                    Some(frame) => frame.push(value),
                    None => return Ok(value),
                },
                Ok(None) => {}
                Err(error) => return Err(self.unwind(stack, error)),
            }
        }
    }

    /// Consumes one token group. Returns a value once it is complete, or
    /// `None` after opening a container or reading a key.
    fn step(&mut self, stack: &mut Vec<Frame>) -> Result<Option<Value>> {
        let expecting = match stack.last() {
            Some(Frame::Array(_)) => Some((token::END_ARRAY, "array")),
            Some(Frame::Object { pending: None, .. }) => Some((token::END_OBJECT, "object")),
            _ => None,
        };
        if let Some((end, context)) = expecting {
            match self.scanner.peek() {
                None => return Err(Error::unexpected_end(self.scanner.len(), context)),
                Some(byte) if byte == end => {
                    self.scanner.skip(1);
                    return Ok(stack.pop().map(Frame::into_value));
                }
                Some(_) => {}
            }
            if end == token::END_OBJECT {
                let name = self.decode_key()?;
                if let Some(Frame::Object { pending, .. }) = stack.last_mut() {
                    *pending = Some(name);
                }
                return Ok(None);
            }
        }

        let offset = self.scanner.position();
        let byte = self.scanner.next_byte("value")?;
        match byte {
            token::START_ARRAY => {
                self.enter(offset, stack.len())?;
                stack.push(Frame::Array(Vec::new()));
                Ok(None)
            }
            token::START_OBJECT => {
                self.enter(offset, stack.len())?;
                stack.push(Frame::Object {
                    map: Map::new(),
                    pending: None,
                });
                Ok(None)
            }
            _ => self.decode_scalar(offset, byte).map(Some),
        }
    }

    /// Closes every open container from the innermost out. Inner partials are
    /// attached to their parents only when partial containers are retained.
    fn unwind(&self, mut stack: Vec<Frame>, error: Error) -> Interrupted {
        let mut partial = None;
        while let Some(mut frame) = stack.pop() {
            if self.retain_partial {
                if let Some(inner) = partial.take() {
                    frame.push(inner);
                }
            }
            partial = Some(frame.into_value());
        }
        Interrupted { error, partial }
    }

    fn decode_scalar(&mut self, offset: usize, byte: u8) -> Result<Value> {
        let value = match byte {
            0x01..=0x1F => self.shared_value(offset, usize::from(byte - 1))?,
            token::EMPTY_STRING => Value::String(String::new()),
            token::NULL => Value::Null,
            token::FALSE => Value::Bool(false),
            token::TRUE => Value::Bool(true),
            token::INT32 => Value::Int(zigzag_decode(self.scanner.read_vuint(MAX_VINT32_BYTES)?)),
            token::INT64 => Value::Int(zigzag_decode(self.scanner.read_vuint(MAX_VINT64_BYTES)?)),
            token::BIG_INTEGER => Value::BigInteger(self.big_integer()?),
            token::FLOAT32 => {
                let bits = self.scanner.read_fixed_7bit(5, "float")?;
                Value::Float32(f32::from_bits(bits as u32))
            }
            token::FLOAT64 => {
                let bits = self.scanner.read_fixed_7bit(10, "double")?;
                Value::Float64(f64::from_bits(bits))
            }
            token::BIG_DECIMAL => {
                let scale_offset = self.scanner.position();
                let scale = zigzag_decode(self.scanner.read_vuint(MAX_VINT32_BYTES)?);
                let scale = i32::try_from(scale)
                    .map_err(|_| Error::number_out_of_range(scale_offset, "big decimal scale"))?;
                Value::BigDecimal(BigDecimal::new(self.big_integer()?, scale))
            }
            token::TINY_ASCII..=0xBF => Value::String(self.short_string(byte)?),
            token::SMALL_INT..=0xDF => Value::Int(zigzag_decode(u64::from(byte & 0x1F))),
            token::LONG_ASCII | token::LONG_UNICODE => {
                let start = self.scanner.position();
                let text = self.scanner.take_until(token::END_STRING, "long string")?;
                Value::String(decode_text(text, start)?)
            }
            token::LONG_SHARED_VALUE..=0xEF => {
                let low = self.scanner.next_byte("shared value reference")?;
                let index = (usize::from(byte & 0x03) << 8) | usize::from(low);
                self.shared_value(offset, index)?
            }
            byte if is_structural_end(byte) => {
                return Err(Error::unknown_token(offset, byte, "unbalanced end"))
            }
            _ => return Err(Error::unknown_token(offset, byte, "value")),
        };
        Ok(value)
    }

    fn decode_key(&mut self) -> Result<String> {
        let offset = self.scanner.position();
        let byte = self.scanner.next_byte("key")?;
        match byte {
            key::EMPTY => Ok(String::new()),
            key::LONG_SHARED..=0x33 => {
                let low = self.scanner.next_byte("shared key reference")?;
                let index = (usize::from(byte & 0x03) << 8) | usize::from(low);
                self.shared_key(offset, index)
            }
            key::LONG_UNICODE => {
                let start = self.scanner.position();
                let text = self.scanner.take_until(token::END_STRING, "long key")?;
                let name = decode_text(text, start)?;
                self.register_key(&name);
                Ok(name)
            }
            key::SHORT_SHARED..=0x7F => self.shared_key(offset, usize::from(byte & 0x3F)),
            key::SHORT_ASCII..=0xBF => self.short_key(usize::from(byte & 0x3F) + 1),
            key::SHORT_UNICODE..=key::SHORT_UNICODE_LAST => {
                self.short_key(usize::from(byte & 0x3F) + 2)
            }
            _ => Err(Error::unknown_token(offset, byte, "key")),
        }
    }

    fn enter(&self, offset: usize, depth: usize) -> Result<()> {
        if depth >= self.max_depth {
            return Err(Error::depth_limit(offset, self.max_depth));
        }
        Ok(())
    }


    fn short_string(&mut self, byte: u8) -> Result<String> {
        let low = usize::from(byte & 0x1F);
        let len = match byte & 0xE0 {
            token::TINY_ASCII => low + 1,
            token::SHORT_ASCII => low + 33,
            token::TINY_UNICODE => low + 2,
            _ => low + 34,
        };
        let start = self.scanner.position();
        let bytes = self.scanner.take(len, "string")?;
        let text = decode_text(bytes, start)?;
        if self.share_values && len <= MAX_SHARED_STRING_LEN {
            self.values.add(text.as_str());
        }
        Ok(text)
    }

    fn short_key(&mut self, len: usize) -> Result<String> {
        let start = self.scanner.position();
        let bytes = self.scanner.take(len, "key")?;
        let name = decode_text(bytes, start)?;
        self.register_key(&name);
        Ok(name)
    }

    fn register_key(&mut self, name: &str) {
        if self.share_keys {
            self.keys.add(name);
        }
    }

    fn big_integer(&mut self) -> Result<BigInteger> {
        let offset = self.scanner.position();
        let raw_len = self.scanner.read_vuint(MAX_VINT32_BYTES)?;
        let raw_len = usize::try_from(raw_len)
            .ok()
            .filter(|len| *len <= MAX_BIG_NUMBER_BYTES)
            .ok_or_else(|| Error::number_out_of_range(offset, "big integer length"))?;
        if raw_len > self.scanner.remaining() {
            return Err(Error::unexpected_end(self.scanner.len(), "big integer"));
        }
        let raw = self.scanner.read_7bit_bytes(raw_len)?;
        Ok(BigInteger::from_twos_complement(&raw))
    }

    fn shared_value(&self, offset: usize, index: usize) -> Result<Value> {
        self.values
            .get(index)
            .map(|text| Value::String(text.to_string()))
            .ok_or_else(|| Error::back_reference(offset, TableKind::Values, index, self.values.len()))
    }

    fn shared_key(&self, offset: usize, index: usize) -> Result<String> {
        self.keys
            .get(index)
            .map(|text| text.to_string())
            .ok_or_else(|| Error::back_reference(offset, TableKind::Keys, index, self.keys.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_DEPTH;
    use crate::ErrorKind;

    fn header(shared_names: bool, shared_values: bool) -> SmileHeader {
        SmileHeader {
            version: 0,
            raw_binary: false,
            shared_values,
            shared_names,
        }
    }

    fn parse(body: &[u8]) -> std::result::Result<Value, Interrupted> {
        parse_with(body, &DecodeOptions::default())
    }

    fn parse_with(body: &[u8], options: &DecodeOptions) -> std::result::Result<Value, Interrupted> {
        let mut parser = SmileParser::new(body, 0, header(true, true), options);
        parser.decode_document()
    }

    #[rstest::rstest]
    #[case(&[0x21], Value::Null)]
    #[case(&[0x22], Value::Bool(false))]
    #[case(&[0x23], Value::Bool(true))]
    #[case(&[0x20], Value::String(String::new()))]
    #[case(&[0xC0], Value::Int(0))]
    #[case(&[0xC1], Value::Int(-1))]
    #[case(&[0xC2], Value::Int(1))]
    #[case(&[0xDF], Value::Int(-16))]
    #[case(&[0xDE], Value::Int(15))]
    #[case(&[0x24, 0x04, 0xAC], Value::Int(150))]
    #[case(&[0x25, 0x04, 0xAD], Value::Int(-151))]
    #[case(&[0x40, b'x'], Value::String("x".into()))]
    #[case(&[0x80, 0xC3, 0xA9], Value::String("\u{e9}".into()))]
    #[case(&[0xE0, b'l', b'o', b'n', b'g', 0xFC], Value::String("long".into()))]
    fn test_scalars(#[case] body: &[u8], #[case] expected: Value) {
        assert_eq!(parse(body).unwrap(), expected);
    }

    #[rstest::rstest]
    fn test_float_tokens() {
        let bits = 0.5f32.to_bits();
        let mut body = vec![token::FLOAT32];
        for shift in (0..5).rev() {
            body.push(((bits >> (shift * 7)) & 0x7F) as u8);
        }
        assert_eq!(parse(&body).unwrap(), Value::Float32(0.5));

        let bits = (-2.25f64).to_bits();
        let mut body = vec![token::FLOAT64];
        for shift in (0..10).rev() {
            body.push(((bits >> (shift * 7)) & 0x7F) as u8);
        }
        assert_eq!(parse(&body).unwrap(), Value::Float64(-2.25));
    }

    #[rstest::rstest]
    fn test_big_number_tokens() {
        // raw bytes [0x01, 0x00] = 256: 0x00 0x40 0x00 in 7-bit groups.
        let body = [token::BIG_INTEGER, 0x82, 0x00, 0x40, 0x00];
        let value = parse(&body).unwrap();
        assert_eq!(value.to_string(), "256");

        // scale 2 (zigzag 4), unscaled 125 = raw [0x7D].
        let body = [token::BIG_DECIMAL, 0x84, 0x81, 0x3E, 0x01];
        let value = parse(&body).unwrap();
        assert_eq!(value.to_string(), "1.25");
    }

    #[rstest::rstest]
    fn test_big_integer_length_past_input() {
        let body = [token::BIG_INTEGER, 0x01, 0x80, 0x00];
        let err = parse(&body).unwrap_err();
        assert_eq!(err.error.kind, ErrorKind::UnexpectedEnd);
        assert_eq!(err.error.offset(), Some(body.len()));
    }

    #[rstest::rstest]
    fn test_big_decimal_scale_out_of_i32_range() {
        // scale VInt 2^33 zigzags to 2^32.
        let body = [token::BIG_DECIMAL, 0x40, 0x00, 0x00, 0x00, 0x80, 0x81, 0x02, 0x01];
        let err = parse(&body).unwrap_err();
        assert_eq!(err.error.kind, ErrorKind::ValueTooLarge);
        assert_eq!(err.error.offset(), Some(1));
        assert!(err.partial.is_none());
    }

    #[rstest::rstest]
    fn test_big_integer_length_capped() {
        // raw length 1025 = 0x10 0x81.
        let mut body = vec![0xF8, 0xC2, token::BIG_INTEGER, 0x10, 0x81];
        body.resize(body.len() + 1200, 0x01);
        let err = parse(&body).unwrap_err();
        assert_eq!(err.error.kind, ErrorKind::ValueTooLarge);
        assert_eq!(err.error.offset(), Some(3));
        assert_eq!(err.partial, Some(Value::Array(vec![Value::Int(1)])));

        let mut body = vec![token::BIG_INTEGER, 0x10, 0x80];
        body.resize(body.len() + 1171, 0x01);
        assert!(parse(&body).is_ok());
    }

    #[rstest::rstest]
    fn test_object_keys_and_shared_references() {
        // {"ab": "v", "ab": "v"} written the second time with back-references.
        let body = [0xFA, 0x81, b'a', b'b', 0x40, b'v', 0x40, 0x01, 0xFB];
        let value = parse(&body).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(obj["ab"], Value::String("v".into()));
    }

    #[rstest::rstest]
    fn test_long_key_registers() {
        let body = [0xFA, 0x34, b'k', 0xFC, 0x21, 0x40, 0xC2, 0xFB];
        let value = parse(&body).unwrap();
        assert_eq!(value["k"], Value::Int(1));
    }

    #[rstest::rstest]
    fn test_long_shared_key_reference() {
        let body = [0xFA, 0x80, b'a', 0xC2, 0x30, 0x00, 0xC4, 0xFB];
        let value = parse(&body).unwrap();
        assert_eq!(value["a"], Value::Int(2));
    }

    #[rstest::rstest]
    fn test_sharing_disabled_by_header() {
        let body = [0xF8, 0x40, b'v', 0x01, 0xF9];
        let mut parser = SmileParser::new(&body, 0, header(false, false), &DecodeOptions::default());
        let err = parser.decode_document().unwrap_err();
        assert_eq!(
            err.error.kind,
            ErrorKind::BackReference {
                table: TableKind::Values,
                index: 0
            }
        );
        assert_eq!(err.error.offset(), Some(3));
        assert_eq!(err.partial, Some(Value::Array(vec![Value::String("v".into())])));
    }

    #[rstest::rstest]
    fn test_long_strings_do_not_register() {
        let body = [0xF8, 0xE0, b'x', 0xFC, 0x01, 0xF9];
        let err = parse(&body).unwrap_err();
        assert!(matches!(err.error.kind, ErrorKind::BackReference { .. }));
    }

    #[rstest::rstest]
    #[case(&[0x00])]
    #[case(&[0x27])]
    #[case(&[0xF0])]
    #[case(&[0xFB])]
    fn test_unknown_value_tokens(#[case] body: &[u8]) {
        let err = parse(body).unwrap_err();
        assert_eq!(err.error.kind, ErrorKind::UnknownToken(body[0]));
        assert_eq!(err.error.offset(), Some(0));
        assert!(err.partial.is_none());
    }

    #[rstest::rstest]
    fn test_unknown_key_token_keeps_prior_entries() {
        let body = [0xFA, 0x80, b'a', 0x23, 0x10, 0x21, 0xFB];
        let err = parse(&body).unwrap_err();
        assert_eq!(err.error.kind, ErrorKind::UnknownToken(0x10));
        assert_eq!(err.error.offset(), Some(4));
        let partial = err.partial.unwrap();
        assert_eq!(partial.as_object().unwrap().len(), 1);
        assert_eq!(partial["a"], Value::Bool(true));
    }

    #[rstest::rstest]
    fn test_nested_partial_dropped_by_default() {
        let body = [0xFA, 0x80, b'a', 0xC2, 0x80, b'b', 0xF8, 0xC4, 0x40];
        let err = parse(&body).unwrap_err();
        assert_eq!(err.error.kind, ErrorKind::UnexpectedEnd);
        assert_eq!(err.error.offset(), Some(body.len()));
        let partial = err.partial.unwrap();
        let obj = partial.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(obj["a"], Value::Int(1));
    }

    #[rstest::rstest]
    fn test_nested_partial_retained_on_request() {
        let body = [0xFA, 0x80, b'a', 0xC2, 0x80, b'b', 0xF8, 0xC4, 0x40];
        let options = DecodeOptions::default().with_retain_partial_containers(true);
        let err = parse_with(&body, &options).unwrap_err();
        let partial = err.partial.unwrap();
        assert_eq!(partial["b"], Value::Array(vec![Value::Int(2)]));
    }

    #[rstest::rstest]
    fn test_depth_limit() {
        let body = [0xF8, 0xF8, 0xF8, 0xF9, 0xF9, 0xF9];
        let options = DecodeOptions::default().with_max_depth(2);
        let err = parse_with(&body, &options).unwrap_err();
        assert_eq!(err.error.kind, ErrorKind::DepthLimit);
        assert_eq!(err.error.offset(), Some(2));

        let options = DecodeOptions::default().with_max_depth(3);
        assert!(parse_with(&body, &options).is_ok());
    }

    #[rstest::rstest]
    fn test_deep_nesting_does_not_recurse() {
        let body = vec![token::START_ARRAY; 200_000];
        let options = DecodeOptions::default().with_max_depth(usize::MAX);
        let err = parse_with(&body, &options).unwrap_err();
        assert_eq!(err.error.kind, ErrorKind::UnexpectedEnd);
        assert_eq!(err.error.offset(), Some(body.len()));
        assert_eq!(err.partial, Some(Value::Array(Vec::new())));
    }

    #[rstest::rstest]
    fn test_default_depth_closes_cleanly() {
        let mut body = vec![token::START_ARRAY; MAX_DEPTH];
        body.push(0xC2);
        body.resize(body.len() + MAX_DEPTH, token::END_ARRAY);
        let mut value = parse(&body).unwrap();
        let mut levels = 0;
        while let Value::Array(mut items) = value {
            levels += 1;
            value = items.pop().unwrap_or(Value::Null);
        }
        assert_eq!(levels, MAX_DEPTH);
        assert_eq!(value, Value::Int(1));
    }

    #[rstest::rstest]
    fn test_end_content_marker_is_optional() {
        assert_eq!(parse(&[0x23, 0xFF]).unwrap(), Value::Bool(true));
        assert_eq!(parse(&[0x23]).unwrap(), Value::Bool(true));
    }
}
