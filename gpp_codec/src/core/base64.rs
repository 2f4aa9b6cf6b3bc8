//! Compressed Base64-URL encoding.
//!
//! Every character carries exactly 6 bits, using the URL safe alphabet. There is no `=` padding:
//! a final partial group of bits is completed with zeroes on the right.
use crate::core::bits::Bits;
use thiserror::Error;

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// The error type that describes failures to decode Base64 encoded strings.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum DecodeError {
    /// An invalid byte was found in the input. The offset, offending byte and input are provided.
    #[error("invalid byte {byte:#04x} at offset {offset} in {input:?}")]
    InvalidByte {
        offset: usize,
        byte: u8,
        input: String,
    },
}

pub fn encode(bits: &Bits) -> String {
    let mut out = String::with_capacity(bits.len().div_ceil(6));
    let mut value = 0u8;

    for i in 0..bits.len() {
        value = (value << 1) | u8::from(bits.get(i).unwrap_or(false));
        if i % 6 == 5 {
            out.push(ALPHABET[value as usize] as char);
            value = 0;
        }
    }

    let rest = bits.len() % 6;
    if rest > 0 {
        value <<= 6 - rest;
        out.push(ALPHABET[value as usize] as char);
    }

    out
}

/// Decodes a string into a bit buffer of exactly `6 * s.len()` bits.
pub fn decode(s: &str) -> Result<Bits, DecodeError> {
    let mut bits = Bits::with_capacity(s.len() * 6);

    for (offset, b) in s.bytes().enumerate() {
        let value = base64_value(b).ok_or_else(|| DecodeError::InvalidByte {
            offset,
            byte: b,
            input: s.to_string(),
        })?;
        bits.push_unsigned(6, value as u64);
    }

    Ok(bits)
}

fn base64_value(b: u8) -> Option<u8> {
    match b {
        b'A'..=b'Z' => Some(b - b'A'),
        b'a'..=b'z' => Some(b - b'a' + 26),
        b'0'..=b'9' => Some(b - b'0' + 52),
        b'-' => Some(62),
        b'_' => Some(63),
        _ => None,
    }
}
