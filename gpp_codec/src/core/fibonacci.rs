use crate::core::bits::{Bits, BitsReader};
use num_traits::ops::checked::CheckedAdd;
use num_traits::One;
use std::collections::BTreeSet;
use std::io;

/// Iterative generic fibonacci implementation
pub struct Fibonacci<T> {
    curr: Option<T>,
    next: Option<T>,
}

impl<T> Iterator for Fibonacci<T>
where
    T: CheckedAdd + Copy,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let next = self.curr?.checked_add(&self.next?);

        self.curr = self.next;
        self.next = next;

        self.curr
    }
}

/// Create a new Iterative fibonacci.
pub fn fibonacci_iterator<T>() -> Fibonacci<T>
where
    T: One + Copy,
{
    let init = T::one();
    Fibonacci {
        curr: Some(init),
        next: Some(init),
    }
}

/// Zeckendorf representation of `n`, smallest term first, without the terminating bit.
fn zeckendorf(n: u32) -> Vec<bool> {
    let terms = fibonacci_iterator::<u32>()
        .take_while(|&f| f <= n)
        .collect::<Vec<_>>();
    let mut digits = vec![false; terms.len()];
    let mut rest = n;

    for (i, &f) in terms.iter().enumerate().rev() {
        if f <= rest {
            digits[i] = true;
            rest -= f;
        }
    }

    digits
}

/// Number of bits used by the Fibonacci coding of `n`, terminator included.
pub fn fibonacci_integer_width(n: u32) -> usize {
    zeckendorf(n).len() + 1
}

/// Writes `n` (which must be at least 1) in Fibonacci coding.
pub fn write_fibonacci_integer(out: &mut Bits, n: u32) {
    for bit in zeckendorf(n) {
        out.push_bit(bit);
    }
    // two consecutive 1's signal the end of the value
    out.push_bit(true);
}

pub fn read_fibonacci_integer(r: &mut BitsReader) -> io::Result<u32> {
    let mut fib = fibonacci_iterator::<u32>();
    let mut total = 0u32;
    let mut last_bit = false;

    loop {
        let bit = r.read_bit()?;

        if last_bit && bit {
            break;
        }

        let fib_value = fib.next();
        if bit {
            total = fib_value
                .and_then(|f| total.checked_add(f))
                .ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidData, "fibonacci integer overflow")
                })?;
        }
        last_bit = bit;
    }

    Ok(total)
}

/// Splits a sorted set into runs of consecutive values.
fn groups(ids: &BTreeSet<u16>) -> Vec<(u16, u16)> {
    let mut groups: Vec<(u16, u16)> = vec![];
    for &id in ids {
        match groups.last_mut() {
            Some((_, end)) if end.checked_add(1) == Some(id) => *end = id,
            _ => groups.push((id, id)),
        }
    }
    groups
}

const RANGE_COUNT_BITS: u32 = 12;

pub fn fibonacci_range_width(ids: &BTreeSet<u16>) -> usize {
    let mut offset = 0u32;
    let mut width = RANGE_COUNT_BITS as usize;

    for (start, end) in groups(ids) {
        let (start, end) = (start as u32, end as u32);
        width += 1 + fibonacci_integer_width(start - offset);
        if start != end {
            width += fibonacci_integer_width(end - start);
        }
        offset = end;
    }

    width
}

/// Writes an ascending set of positive integers as a Fibonacci-coded range.
pub fn write_fibonacci_range(out: &mut Bits, ids: &BTreeSet<u16>) {
    let groups = groups(ids);
    out.push_unsigned(RANGE_COUNT_BITS, groups.len() as u64);

    let mut offset = 0u32;
    for (start, end) in groups {
        let (start, end) = (start as u32, end as u32);
        if start == end {
            out.push_bit(false);
            write_fibonacci_integer(out, start - offset);
        } else {
            out.push_bit(true);
            write_fibonacci_integer(out, start - offset);
            write_fibonacci_integer(out, end - start);
        }
        offset = end;
    }
}

fn offset_id(base: u32, offset: u32) -> io::Result<u32> {
    base.checked_add(offset)
        .filter(|&id| id <= u16::MAX as u32)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "id out of range"))
}

pub fn read_fibonacci_range(r: &mut BitsReader) -> io::Result<BTreeSet<u16>> {
    let n = r.read_unsigned(RANGE_COUNT_BITS)?;
    let mut range = BTreeSet::new();
    let mut last_id = 0u32;

    for _ in 0..n {
        let is_group = r.read_bit()?;
        let start = offset_id(last_id, read_fibonacci_integer(r)?)?;
        let end = if is_group {
            offset_id(start, read_fibonacci_integer(r)?)?
        } else {
            start
        };

        range.extend(start as u16..=end as u16);
        last_id = end;
    }

    Ok(range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bits::tests::b;
    use test_case::test_case;

    #[test]
    fn sequence_is_correct() {
        assert_eq!(
            fibonacci_iterator::<u16>().take(16).collect::<Vec<_>>(),
            vec![1, 2, 3, 5, 8, 13, 21, 34, 55, 89, 144, 233, 377, 610, 987, 1597]
        );
    }

    #[test]
    fn u8_overflow() {
        assert_eq!(
            fibonacci_iterator::<u8>().collect::<Vec<_>>(),
            vec![1, 2, 3, 5, 8, 13, 21, 34, 55, 89, 144, 233]
        );
    }

    #[test_case("11" => 1)]
    #[test_case("011" => 2)]
    #[test_case("0011" => 3)]
    #[test_case("1011" => 4)]
    #[test_case("00011" => 5)]
    #[test_case("10011" => 6)]
    #[test_case("01011" => 7)]
    #[test_case("01000011" => 23)]
    fn read_fibonacci(s: &str) -> u32 {
        read_fibonacci_integer(&mut b(s).reader()).unwrap()
    }

    #[test_case(1 => b("11"))]
    #[test_case(2 => b("011"))]
    #[test_case(4 => b("1011"))]
    #[test_case(6 => b("10011"))]
    #[test_case(7 => b("01011"))]
    #[test_case(23 => b("01000011"))]
    fn write_fibonacci(n: u32) -> Bits {
        let mut out = Bits::new();
        write_fibonacci_integer(&mut out, n);
        assert_eq!(out.len(), fibonacci_integer_width(n));
        out
    }

    #[test]
    fn unterminated_integer_fails() {
        assert!(read_fibonacci_integer(&mut b("0101").reader()).is_err());
    }

    #[test_case("000000000010 0 011 0 1011" => BTreeSet::from_iter([2, 6]) ; "singles")]
    #[test_case("000000000001 1 01011 11" => BTreeSet::from_iter([7, 8]) ; "one group")]
    #[test_case("000000000010 0 0011 1 011 0011" => BTreeSet::from_iter([3, 5, 6, 7, 8]) ; "single then group")]
    #[test_case("000000000000" => BTreeSet::new() ; "empty")]
    fn read_range(s: &str) -> BTreeSet<u16> {
        read_fibonacci_range(&mut b(s).reader()).unwrap()
    }

    #[test_case(&[2, 6] => b("000000000010 0 011 0 1011") ; "singles")]
    #[test_case(&[7, 8] => b("000000000001 1 01011 11") ; "one group")]
    #[test_case(&[8, 7, 9, 10] => b("000000000001 1 01011 0011") ; "unordered input")]
    #[test_case(&[] => b("000000000000") ; "empty")]
    fn write_range(ids: &[u16]) -> Bits {
        let ids = ids.iter().copied().collect();
        let mut out = Bits::new();
        write_fibonacci_range(&mut out, &ids);
        assert_eq!(out.len(), fibonacci_range_width(&ids));
        out
    }

    #[test]
    fn truncated_range_fails() {
        // announces two entries but only carries one
        assert!(read_fibonacci_range(&mut b("000000000010 0 011").reader()).is_err());
    }
}
