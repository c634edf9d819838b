//! Typed card values and the 70-byte value-field codec.
//!
//! A FITS card stores its value in bytes 10..80 of the 80-byte card. Numeric
//! and logical values are right-justified in columns 11-30; strings start at
//! column 11 with a single quote; complex values are a parenthesized pair of
//! doubles. An optional comment follows a ` /` separator.

use alloc::string::String;
use alloc::string::ToString;
use core::str;

/// Width of the value field (bytes 10..80 of a card).
pub const VALUE_FIELD_SIZE: usize = 70;

/// Width of the fixed numeric value column (card columns 11-30).
const NUMERIC_FIELD_SIZE: usize = 20;

/// A card value, tagged by its FITS type.
///
/// Valueless cards (END, blank, commentary) carry [`CardValue::Blank`]; the
/// variant tag is the single source of truth for the card's type, so typed
/// access can never observe a mismatched representation.
#[derive(Debug, Clone, PartialEq)]
pub enum CardValue {
    /// FITS logical (`T` or `F` in column 30).
    Logical(bool),
    /// FITS integer, right-justified decimal.
    Integer(i64),
    /// FITS floating-point value.
    Float(f64),
    /// FITS character string (content between single quotes).
    Text(String),
    /// FITS complex value, `(real, imaginary)` as two doubles.
    Complex(f64, f64),
    /// No value field at all.
    Blank,
}

impl CardValue {
    /// Returns `true` for the valueless variant.
    pub fn is_blank(&self) -> bool {
        matches!(self, CardValue::Blank)
    }
}

/// Locate a ` /` comment separator and split the field around it.
///
/// The standard separator is ` / ` but files written by IDL and friends omit
/// the trailing space, so only ` /` is required.
fn split_comment(field: &[u8]) -> (&[u8], Option<&str>) {
    for i in 0..field.len().saturating_sub(1) {
        if field[i] == b' ' && field[i + 1] == b'/' {
            let mut start = i + 2;
            if field.get(start) == Some(&b' ') {
                start += 1;
            }
            let comment = str::from_utf8(&field[start..]).ok().map(str::trim_end);
            return (&field[..i], comment.filter(|c| !c.is_empty()));
        }
    }
    (field, None)
}

/// Parse a quoted string value. Doubled quotes (`''`) encode a literal quote;
/// trailing spaces inside the quotes are padding and get trimmed.
fn parse_text(field: &[u8]) -> Option<(CardValue, Option<&str>)> {
    if field.first() != Some(&b'\'') {
        return None;
    }

    let mut content = String::new();
    let mut i = 1;
    while i < field.len() {
        if field[i] == b'\'' {
            if field.get(i + 1) == Some(&b'\'') {
                content.push('\'');
                i += 2;
            } else {
                i += 1;
                break;
            }
        } else {
            content.push(field[i] as char);
            i += 1;
        }
    }

    let trimmed = content.trim_end().to_string();
    let (_, comment) = split_comment(&field[i..]);
    Some((CardValue::Text(trimmed), comment))
}

/// Parse a float, accepting the FITS `D` exponent marker as well as `E`.
fn parse_float_text(s: &str) -> Option<f64> {
    s.replace(['D', 'd'], "E").parse::<f64>().ok()
}

/// Parse a `(real, imaginary)` complex value. Both components are read as
/// doubles; integer-looking components are promoted.
fn parse_complex_text(s: &str) -> Option<CardValue> {
    let inner = s.strip_prefix('(')?.strip_suffix(')')?;
    let (re, im) = inner.split_once(',')?;
    let re = parse_float_text(re.trim())?;
    let im = parse_float_text(im.trim())?;
    Some(CardValue::Complex(re, im))
}

/// Parse a value field (bytes 10..80 of a card with a `= ` indicator).
///
/// Returns the value and an optional trailing comment, or `None` if the field
/// holds nothing parseable (all spaces, or garbage).
pub fn parse_value(field: &[u8]) -> Option<(CardValue, Option<&str>)> {
    if field.is_empty() {
        return None;
    }

    if field[0] == b'\'' {
        return parse_text(field);
    }

    let (value_part, comment) = split_comment(field);
    let text = str::from_utf8(value_part).ok()?.trim();
    if text.is_empty() {
        return None;
    }

    match text {
        "T" => return Some((CardValue::Logical(true), comment)),
        "F" => return Some((CardValue::Logical(false), comment)),
        _ => {}
    }

    if text.starts_with('(') {
        if let Some(v) = parse_complex_text(text) {
            return Some((v, comment));
        }
    }

    let looks_integral = !text.contains(['.', 'E', 'e', 'D', 'd']);
    if looks_integral {
        if let Ok(n) = text.parse::<i64>() {
            return Some((CardValue::Integer(n), comment));
        }
    }

    parse_float_text(text).map(|f| (CardValue::Float(f), comment))
}

/// Serialize a [`CardValue`] into a 70-byte value field.
pub fn format_value(value: &CardValue) -> [u8; VALUE_FIELD_SIZE] {
    let mut field = [b' '; VALUE_FIELD_SIZE];

    match value {
        CardValue::Logical(b) => {
            // Column 30 of the card = index 19 of the value field.
            field[NUMERIC_FIELD_SIZE - 1] = if *b { b'T' } else { b'F' };
        }
        CardValue::Integer(n) => {
            let text = alloc::format!("{n}");
            right_justify(text.as_bytes(), &mut field[..NUMERIC_FIELD_SIZE]);
        }
        CardValue::Float(f) => {
            let text = format_float(*f, NUMERIC_FIELD_SIZE);
            right_justify(text.as_bytes(), &mut field[..NUMERIC_FIELD_SIZE]);
        }
        CardValue::Text(s) => {
            write_text(s, &mut field);
        }
        CardValue::Complex(re, im) => {
            let text = alloc::format!(
                "({}, {})",
                format_float(*re, NUMERIC_FIELD_SIZE),
                format_float(*im, NUMERIC_FIELD_SIZE)
            );
            right_justify(text.as_bytes(), &mut field[..50]);
        }
        CardValue::Blank => {}
    }

    field
}

/// Right-justify `src` within `dest`, left-padded with spaces.
fn right_justify(src: &[u8], dest: &mut [u8]) {
    let len = src.len().min(dest.len());
    let start = dest.len() - len;
    dest[start..].copy_from_slice(&src[..len]);
}

/// Format a float in exponent form, shrinking the precision until the result
/// fits in `max_len` bytes.
fn format_float(f: f64, max_len: usize) -> String {
    if f == 0.0 {
        return String::from("0.0");
    }
    let mut precision = 15usize;
    loop {
        let s = alloc::format!("{f:.precision$E}");
        if s.len() <= max_len || precision == 0 {
            return s;
        }
        precision -= 1;
    }
}

/// Write a quoted string value starting at column 11, doubling embedded
/// quotes and padding short strings to the 8-character minimum field width.
fn write_text(s: &str, field: &mut [u8; VALUE_FIELD_SIZE]) {
    field[0] = b'\'';
    let mut pos = 1;

    for byte in s.bytes() {
        if pos >= VALUE_FIELD_SIZE - 1 {
            break;
        }
        if byte == b'\'' {
            if pos + 1 >= VALUE_FIELD_SIZE - 1 {
                break;
            }
            field[pos] = b'\'';
            field[pos + 1] = b'\'';
            pos += 2;
        } else {
            field[pos] = byte;
            pos += 1;
        }
    }

    // Minimum string field width per the standard: closing quote at column
    // 20 or later, i.e. at least 8 content characters between the quotes.
    while pos < 9 {
        field[pos] = b' ';
        pos += 1;
    }

    if pos < VALUE_FIELD_SIZE {
        field[pos] = b'\'';
    }
}
