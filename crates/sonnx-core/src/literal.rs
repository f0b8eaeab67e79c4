// Copyright (c) ONNX Project Contributors
// SPDX-License-Identifier: Apache-2.0

//! Conversion of surface-syntax literals to host values.
//!
//! Integer literals are narrowed 32-bit-first: without an `L`/`l`
//! suffix the text is parsed as `u32` and widened to `u64` only when it
//! does not fit; a suffix forces 64-bit regardless of magnitude. Byte
//! literals are hex digit pairs; string literals use conventional
//! backslash escapes.

use thiserror::Error;

/// A parsed integer literal, tagged with the width it landed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntValue {
    U32(u32),
    U64(u64),
}

impl IntValue {
    /// Widens to `u64` regardless of the stored width.
    pub fn as_u64(&self) -> u64 {
        match self {
            IntValue::U32(v) => u64::from(*v),
            IntValue::U64(v) => *v,
        }
    }
}

/// Failure to convert a literal's text to a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    #[error("integer literal out of range: '{0}'")]
    IntOutOfRange(String),
    #[error("number of hex digits must be even")]
    OddHexDigits,
    #[error("invalid hex digit: '{0}'")]
    InvalidHexDigit(char),
}

/// Parses an integer literal, suffix included.
///
/// # Examples
///
/// ```
/// use sonnx_core::literal::{parse_integer, IntValue};
///
/// assert_eq!(parse_integer("4294967295"), Ok(IntValue::U32(4294967295)));
/// assert_eq!(parse_integer("4294967296"), Ok(IntValue::U64(4294967296)));
/// assert_eq!(parse_integer("42L"), Ok(IntValue::U64(42)));
/// assert!(parse_integer("18446744073709551616").is_err());
/// ```
pub fn parse_integer(text: &str) -> Result<IntValue, LiteralError> {
    let (digits, forced_wide) = match text.strip_suffix(['L', 'l']) {
        Some(rest) => (rest, true),
        None => (text, false),
    };
    if forced_wide {
        let value = digits
            .parse::<u64>()
            .map_err(|_| LiteralError::IntOutOfRange(text.to_string()))?;
        return Ok(IntValue::U64(value));
    }
    if let Ok(value) = digits.parse::<u32>() {
        return Ok(IntValue::U32(value));
    }
    digits
        .parse::<u64>()
        .map(IntValue::U64)
        .map_err(|_| LiteralError::IntOutOfRange(text.to_string()))
}

/// Resolves backslash escapes in the body of a string literal (the
/// text between the quotes). Unrecognized escapes are dropped.
pub fn unescape_string(body: &str) -> String {
    let mut result = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('b') => result.push('\u{0008}'),
            Some('t') => result.push('\t'),
            Some('n') => result.push('\n'),
            Some('f') => result.push('\u{000C}'),
            Some('r') => result.push('\r'),
            Some('\'') => result.push('\''),
            Some('"') => result.push('"'),
            Some('\\') => result.push('\\'),
            _ => {}
        }
    }
    result
}

/// Decodes the hex-digit body of a bytes literal (marker already
/// stripped). The digit count must be even.
pub fn decode_bytes(hex: &str) -> Result<Vec<u8>, LiteralError> {
    if hex.len() % 2 != 0 {
        return Err(LiteralError::OddHexDigits);
    }
    let mut result = Vec::with_capacity(hex.len() / 2);
    let digits: Vec<char> = hex.chars().collect();
    for pair in digits.chunks(2) {
        let hi = hex_value(pair[0])?;
        let lo = hex_value(pair[1])?;
        result.push((hi << 4) | lo);
    }
    Ok(result)
}

/// Formats a byte payload the way the IR prints raw data: lowercase
/// hex, two digits per byte, no separator.
pub fn encode_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

fn hex_value(c: char) -> Result<u8, LiteralError> {
    c.to_digit(16)
        .map(|v| v as u8)
        .ok_or(LiteralError::InvalidHexDigit(c))
}
