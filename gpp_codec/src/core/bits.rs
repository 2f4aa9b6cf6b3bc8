use bitstream_io::{BigEndian, BitRead, BitReader};
use std::fmt;
use std::io;

/// A growable sequence of bits, stored most significant bit first.
///
/// Only the first [`len`](Bits::len) bits are meaningful. Any bits past that point in the last
/// byte are always zero.
#[derive(Clone, Default, Eq, PartialEq, Hash)]
pub struct Bits {
    bytes: Vec<u8>,
    len: usize,
}

impl Bits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bits.div_ceil(8)),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        if index >= self.len {
            return None;
        }
        Some(self.bytes[index / 8] & (0x80 >> (index % 8)) != 0)
    }

    pub fn push_bit(&mut self, bit: bool) {
        let offset = self.len % 8;
        if offset == 0 {
            self.bytes.push(0);
        }
        if bit {
            if let Some(last) = self.bytes.last_mut() {
                *last |= 0x80 >> offset;
            }
        }
        self.len += 1;
    }

    /// Appends the `bits` lowest bits of `value`, most significant first.
    pub fn push_unsigned(&mut self, bits: u32, value: u64) {
        for i in (0..bits).rev() {
            self.push_bit((value >> i) & 1 == 1);
        }
    }

    pub fn reader(&self) -> BitsReader<'_> {
        BitsReader {
            inner: BitReader::endian(&self.bytes, BigEndian),
            remaining: self.len,
        }
    }
}

impl fmt::Debug for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bits(")?;
        for i in 0..self.len {
            f.write_str(if self.get(i) == Some(true) { "1" } else { "0" })?;
        }
        write!(f, ")")
    }
}

/// Reads values out of a [`Bits`] buffer, refusing to read past its logical length.
pub struct BitsReader<'a> {
    inner: BitReader<&'a [u8], BigEndian>,
    remaining: usize,
}

impl BitsReader<'_> {
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    fn consume(&mut self, bits: u32) -> io::Result<()> {
        let bits = bits as usize;
        if bits > self.remaining {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("need {bits} bits, {} left", self.remaining),
            ));
        }
        self.remaining -= bits;
        Ok(())
    }

    pub fn read_bit(&mut self) -> io::Result<bool> {
        self.consume(1)?;
        self.inner.read_bit()
    }

    pub fn read_unsigned(&mut self, bits: u32) -> io::Result<u32> {
        if bits == 0 {
            return Ok(0);
        }
        self.consume(bits)?;
        self.inner.read_unsigned_var::<u32>(bits)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use test_case::test_case;

    /// Transform a string of literal binary digits into a bit buffer.
    /// Any character other than `0` and `1` is ignored.
    pub(crate) fn b(s: &str) -> Bits {
        let mut bits = Bits::new();
        for c in s.chars() {
            match c {
                '0' => bits.push_bit(false),
                '1' => bits.push_bit(true),
                _ => {}
            }
        }
        bits
    }

    #[test_case("00000001 00000010 00000011" => vec![1, 2, 3])]
    #[test_case("000000 010000 001000 000011" => vec![1, 2, 3])]
    #[test_case("000000 010000 001000 000011 1001" => vec![1, 2, 3, 144])]
    fn bytes(s: &str) -> Vec<u8> {
        b(s).as_bytes().to_vec()
    }

    #[test_case(6, 3 => "000011")]
    #[test_case(2, 2 => "10")]
    #[test_case(12, 1 => "000000000001")]
    #[test_case(1, 1 => "1")]
    fn push_unsigned(bits: u32, value: u64) -> String {
        let mut buf = Bits::new();
        buf.push_unsigned(bits, value);
        format!("{buf:?}")
            .trim_start_matches("Bits(")
            .trim_end_matches(')')
            .to_string()
    }

    #[test]
    fn read_back_in_order() {
        let bits = b("000011 000001 10 1");
        let mut r = bits.reader();

        assert_eq!(r.read_unsigned(6).unwrap(), 3);
        assert_eq!(r.read_unsigned(6).unwrap(), 1);
        assert_eq!(r.read_unsigned(2).unwrap(), 2);
        assert!(r.read_bit().unwrap());
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn reading_past_length_fails() {
        // 3 meaningful bits inside a full byte
        let bits = b("101");
        let mut r = bits.reader();

        let err = r.read_unsigned(4).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
