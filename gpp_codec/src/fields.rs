//! Field descriptors and the values bound to them.
//!
//! A [`FieldSpec`] is the static description of one slot in a segment: its name, its bit layout
//! ([`FieldKind`]), its default value and an optional validator restricting the legal domain.
//! A [`FieldValue`] is what a live segment stores for that slot.
//!
//! Values are checked against their spec when they are assigned, never when they are encoded.
//! An out of domain value is rejected, it is never truncated or clamped.
//!
//! ```
//! use gpp_codec::fields::{FieldSpec, FieldValue, ValidationError};
//!
//! const SALE_OPT_OUT: FieldSpec = FieldSpec::integer("SaleOptOut", 2).with_validator(|n| n <= 2);
//!
//! assert!(SALE_OPT_OUT.validate(&FieldValue::Integer(2)).is_ok());
//! assert!(matches!(
//!     SALE_OPT_OUT.validate(&FieldValue::Integer(3)),
//!     Err(ValidationError::OutOfDomain { field: "SaleOptOut", value: 3 })
//! ));
//! ```
use crate::core::bits::{Bits, BitsReader};
use crate::core::fibonacci::{fibonacci_range_width, read_fibonacci_range, write_fibonacci_range};
#[cfg(feature = "serde")]
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::io;
use thiserror::Error;

pub type IdSet = BTreeSet<u16>;

/// A predicate over the integers a field accepts, applied to every element of list fields.
pub type Validator = fn(u32) -> bool;

/// The bit layout of a field.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FieldKind {
    /// An unsigned integer written on `bits` bits, most significant bit first.
    FixedInteger { bits: u32 },
    /// `len` unsigned integers of `bits` bits each, written back to back.
    FixedIntegerList { bits: u32, len: usize },
    /// A single bit.
    Boolean,
    /// An ascending set of positive integers, in Fibonacci coding behind a 12-bit group count.
    FibonacciIntegerRange,
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::FixedInteger { .. } => "integer",
            FieldKind::FixedIntegerList { .. } => "integer list",
            FieldKind::Boolean => "boolean",
            FieldKind::FibonacciIntegerRange => "id set",
        }
    }

    /// The smallest number of bits a value of this kind can occupy.
    pub fn min_width(&self) -> usize {
        match self {
            FieldKind::FixedInteger { bits } => *bits as usize,
            FieldKind::FixedIntegerList { bits, len } => *bits as usize * len,
            FieldKind::Boolean => 1,
            FieldKind::FibonacciIntegerRange => 12,
        }
    }
}

/// Converts a single typed value to and from its bit representation.
///
/// Implementations never validate domains: that happens once, when a value is assigned.
pub trait BitCodec {
    fn width_in_bits(&self, value: &FieldValue) -> usize;

    fn pack(&self, value: &FieldValue, out: &mut Bits);

    fn unpack(&self, r: &mut BitsReader) -> io::Result<FieldValue>;
}

impl BitCodec for FieldKind {
    fn width_in_bits(&self, value: &FieldValue) -> usize {
        match (self, value) {
            (FieldKind::FibonacciIntegerRange, FieldValue::IdSet(ids)) => {
                fibonacci_range_width(ids)
            }
            (kind, _) => kind.min_width(),
        }
    }

    fn pack(&self, value: &FieldValue, out: &mut Bits) {
        match (self, value) {
            (FieldKind::FixedInteger { bits }, FieldValue::Integer(n)) => {
                out.push_unsigned(*bits, *n as u64);
            }
            (FieldKind::FixedIntegerList { bits, len }, FieldValue::IntegerList(v)) => {
                for i in 0..*len {
                    out.push_unsigned(*bits, v.get(i).copied().unwrap_or_default() as u64);
                }
            }
            (FieldKind::Boolean, FieldValue::Boolean(b)) => out.push_bit(*b),
            (FieldKind::FibonacciIntegerRange, FieldValue::IdSet(ids)) => {
                write_fibonacci_range(out, ids);
            }
            // segments only hold values accepted by FieldSpec::validate, the layout width is kept
            // even if that ever stops holding
            (kind, _) => {
                for _ in 0..kind.min_width() {
                    out.push_bit(false);
                }
            }
        }
    }

    fn unpack(&self, r: &mut BitsReader) -> io::Result<FieldValue> {
        Ok(match self {
            FieldKind::FixedInteger { bits } => FieldValue::Integer(r.read_unsigned(*bits)?),
            FieldKind::FixedIntegerList { bits, len } => FieldValue::IntegerList(
                (0..*len)
                    .map(|_| r.read_unsigned(*bits))
                    .collect::<io::Result<Vec<_>>>()?,
            ),
            FieldKind::Boolean => FieldValue::Boolean(r.read_bit()?),
            FieldKind::FibonacciIntegerRange => FieldValue::IdSet(read_fibonacci_range(r)?),
        })
    }
}

/// The static description of a field inside a segment.
#[derive(Clone, Copy, Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Initial value: the integer itself, every element of a list, `!= 0` for booleans.
    /// Ignored for id sets, which always start empty.
    pub default: u32,
    pub validator: Option<Validator>,
}

impl FieldSpec {
    /// An unsigned integer on `bits` bits.
    ///
    /// # Panics
    ///
    /// Panics if `bits` is not within 1 to 32. Evaluated in a `const`, this fails the build.
    pub const fn integer(name: &'static str, bits: u32) -> Self {
        assert!(bits >= 1 && bits <= 32, "integer fields are 1 to 32 bits wide");
        Self {
            name,
            kind: FieldKind::FixedInteger { bits },
            default: 0,
            validator: None,
        }
    }

    /// `len` unsigned integers of `bits` bits each.
    ///
    /// # Panics
    ///
    /// Panics if `bits` is not within 1 to 32.
    pub const fn integer_list(name: &'static str, bits: u32, len: usize) -> Self {
        assert!(bits >= 1 && bits <= 32, "integer fields are 1 to 32 bits wide");
        Self {
            name,
            kind: FieldKind::FixedIntegerList { bits, len },
            default: 0,
            validator: None,
        }
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Boolean,
            default: 0,
            validator: None,
        }
    }

    pub const fn fibonacci_range(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::FibonacciIntegerRange,
            default: 0,
            validator: None,
        }
    }

    pub const fn with_default(self, default: u32) -> Self {
        Self { default, ..self }
    }

    pub const fn with_validator(self, validator: Validator) -> Self {
        Self {
            validator: Some(validator),
            ..self
        }
    }

    pub fn default_value(&self) -> FieldValue {
        match self.kind {
            FieldKind::FixedInteger { .. } => FieldValue::Integer(self.default),
            FieldKind::FixedIntegerList { len, .. } => {
                FieldValue::IntegerList(vec![self.default; len])
            }
            FieldKind::Boolean => FieldValue::Boolean(self.default != 0),
            FieldKind::FibonacciIntegerRange => FieldValue::IdSet(IdSet::new()),
        }
    }

    /// Checks that `value` has the kind of this field and lies within its domain.
    pub fn validate(&self, value: &FieldValue) -> Result<(), ValidationError> {
        match (self.kind, value) {
            (FieldKind::FixedInteger { bits }, FieldValue::Integer(n)) => {
                self.check_element(bits, *n)
            }
            (FieldKind::FixedIntegerList { bits, len }, FieldValue::IntegerList(v)) => {
                if v.len() != len {
                    return Err(ValidationError::WrongLength {
                        field: self.name,
                        expected: len,
                        found: v.len(),
                    });
                }
                v.iter().try_for_each(|&n| self.check_element(bits, n))
            }
            (FieldKind::Boolean, FieldValue::Boolean(_)) => Ok(()),
            (FieldKind::FibonacciIntegerRange, FieldValue::IdSet(ids)) => ids
                .iter()
                .try_for_each(|&id| match id {
                    0 => Err(self.out_of_domain(0)),
                    id => self.check_element(16, id as u32),
                }),
            (kind, found) => Err(ValidationError::KindMismatch {
                field: self.name,
                expected: kind.name(),
                found: found.clone(),
            }),
        }
    }

    fn check_element(&self, bits: u32, n: u32) -> Result<(), ValidationError> {
        let fits = bits >= u32::BITS || n >> bits == 0;
        let allowed = self.validator.map_or(true, |v| v(n));
        if fits && allowed {
            Ok(())
        } else {
            Err(self.out_of_domain(n))
        }
    }

    fn out_of_domain(&self, value: u32) -> ValidationError {
        ValidationError::OutOfDomain {
            field: self.name,
            value,
        }
    }

    /// Parses the textual form of a value for this field, then validates it.
    ///
    /// Lists and id sets are comma separated, booleans are `true`/`false` or `1`/`0`.
    pub fn parse_value(&self, s: &str) -> Result<FieldValue, ValidationError> {
        let unparsable = || ValidationError::Unparsable {
            field: self.name,
            input: s.to_string(),
        };
        let s = s.trim();

        let value = match self.kind {
            FieldKind::FixedInteger { .. } => {
                FieldValue::Integer(s.parse().map_err(|_| unparsable())?)
            }
            FieldKind::FixedIntegerList { .. } => FieldValue::IntegerList(
                s.split(',')
                    .map(|n| n.trim().parse())
                    .collect::<Result<_, _>>()
                    .map_err(|_| unparsable())?,
            ),
            FieldKind::Boolean => FieldValue::Boolean(match s {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => return Err(unparsable()),
            }),
            FieldKind::FibonacciIntegerRange if s.is_empty() => FieldValue::IdSet(IdSet::new()),
            FieldKind::FibonacciIntegerRange => FieldValue::IdSet(
                s.split(',')
                    .map(|n| n.trim().parse())
                    .collect::<Result<_, _>>()
                    .map_err(|_| unparsable())?,
            ),
        };

        self.validate(&value)?;
        Ok(value)
    }
}

/// The current value of a field.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(untagged))]
pub enum FieldValue {
    Integer(u32),
    IntegerList(Vec<u32>),
    Boolean(bool),
    IdSet(IdSet),
}

impl FieldValue {
    pub fn as_integer(&self) -> Option<u32> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_id_set(&self) -> Option<&IdSet> {
        match self {
            FieldValue::IdSet(ids) => Some(ids),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<T: ToString>(it: impl Iterator<Item = T>) -> String {
            it.map(|n| n.to_string()).collect::<Vec<_>>().join(",")
        }

        match self {
            FieldValue::Integer(n) => write!(f, "{n}"),
            FieldValue::IntegerList(v) => write!(f, "[{}]", join(v.iter())),
            FieldValue::Boolean(b) => write!(f, "{b}"),
            FieldValue::IdSet(ids) => write!(f, "{{{}}}", join(ids.iter())),
        }
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        FieldValue::Integer(n)
    }
}

impl From<u8> for FieldValue {
    fn from(n: u8) -> Self {
        FieldValue::Integer(n.into())
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Boolean(b)
    }
}

impl From<Vec<u32>> for FieldValue {
    fn from(v: Vec<u32>) -> Self {
        FieldValue::IntegerList(v)
    }
}

impl<const N: usize> From<[u32; N]> for FieldValue {
    fn from(v: [u32; N]) -> Self {
        FieldValue::IntegerList(v.to_vec())
    }
}

impl From<IdSet> for FieldValue {
    fn from(ids: IdSet) -> Self {
        FieldValue::IdSet(ids)
    }
}

/// The error type for field assignments.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum ValidationError {
    /// No field with this name exists in the segment or section.
    #[error("unknown field {0:?}")]
    UnknownField(String),
    /// The value does not have the kind declared by the field.
    #[error("field {field} holds {expected} values, got {found}")]
    KindMismatch {
        field: &'static str,
        expected: &'static str,
        found: FieldValue,
    },
    /// A list value does not have the number of elements declared by the field.
    #[error("field {field} holds {expected} elements, got {found}")]
    WrongLength {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    /// The value does not fit in the field width, or is rejected by its validator.
    #[error("value {value} is outside the domain of field {field}")]
    OutOfDomain { field: &'static str, value: u32 },
    /// The textual form of a value could not be parsed.
    #[error("unable to parse {input:?} as a value for field {field}")]
    Unparsable { field: &'static str, input: String },
}
