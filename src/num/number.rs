use std::iter;

pub fn format_f64(value: f64) -> String {
    if !value.is_finite() {
        return "null".to_string();
    }
    let mut buffer = ryu::Buffer::new();
    trim_fraction(buffer.format_finite(value))
}

pub fn format_f32(value: f32) -> String {
    if !value.is_finite() {
        return "null".to_string();
    }
    let mut buffer = ryu::Buffer::new();
    trim_fraction(buffer.format_finite(value))
}

pub fn format_i64(value: i64) -> String {
    let mut buffer = itoa::Buffer::new();
    buffer.format(value).to_string()
}

fn trim_fraction(raw: &str) -> String {
    raw.strip_suffix(".0").unwrap_or(raw).to_string()
}

const CHUNK: u64 = 1_000_000_000;
const CHUNK_DIGITS: usize = 9;

/// Renders an unsigned big-endian magnitude in base 10. Each base-1e9 limb
/// costs a full division pass, so time grows with the square of the input
/// length; the decoder caps magnitudes at `MAX_BIG_NUMBER_BYTES`.
pub fn magnitude_to_decimal(magnitude: &[u8]) -> String {
    let start = magnitude
        .iter()
        .position(|&byte| byte != 0)
        .unwrap_or(magnitude.len());
    let mut rest = magnitude[start..].to_vec();
    if rest.is_empty() {
        return "0".to_string();
    }

    let mut chunks: Vec<u32> = Vec::new();
    while !rest.is_empty() {
        let mut remainder: u64 = 0;
        for byte in rest.iter_mut() {
            let current = (remainder << 8) | u64::from(*byte);
            *byte = (current / CHUNK) as u8;
            remainder = current % CHUNK;
        }
        chunks.push(remainder as u32);
        let leading = rest.iter().take_while(|&&byte| byte == 0).count();
        rest.drain(..leading);
    }

    let mut buffer = itoa::Buffer::new();
    let mut out = String::with_capacity(chunks.len() * CHUNK_DIGITS);
    let mut iter = chunks.iter().rev();
    if let Some(first) = iter.next() {
        out.push_str(buffer.format(*first));
    }
    for chunk in iter {
        let digits = buffer.format(*chunk);
        out.extend(iter::repeat('0').take(CHUNK_DIGITS - digits.len()));
        out.push_str(digits);
    }
    out
}

/// Places a decimal point `scale` digits from the right of `digits`, using
/// plain notation while the adjusted exponent stays at or above -6 and
/// scientific notation otherwise.
pub fn format_scaled(negative: bool, digits: &str, scale: i32) -> String {
    let len = digits.len() as i64;
    let adjusted = -i64::from(scale) + (len - 1);
    let mut out = String::with_capacity(digits.len() + 8);
    if negative {
        out.push('-');
    }

    if scale >= 0 && adjusted >= -6 {
        let scale = scale as usize;
        if scale == 0 {
            out.push_str(digits);
        } else if digits.len() > scale {
            let point = digits.len() - scale;
            out.push_str(&digits[..point]);
            out.push('.');
            out.push_str(&digits[point..]);
        } else {
            out.push_str("0.");
            out.extend(iter::repeat('0').take(scale - digits.len()));
            out.push_str(digits);
        }
        return out;
    }

    out.push_str(&digits[..1]);
    if digits.len() > 1 {
        out.push('.');
        out.push_str(&digits[1..]);
    }
    out.push('E');
    if adjusted >= 0 {
        out.push('+');
    }
    let mut buffer = itoa::Buffer::new();
    out.push_str(buffer.format(adjusted));
    out
}
