//! Segments: fixed, ordered field layouts bound to live values.
//!
//! A segment encodes to a single dot-free token, the compressed base64 form of its fields packed
//! back to back in declared order. The packed bits are computed lazily and kept until a field
//! changes.
use crate::core::base64;
use crate::core::bits::Bits;
use crate::core::cache::EncodeCache;
use crate::fields::{BitCodec, FieldSpec, FieldValue, ValidationError};
use crate::sections::SectionDecodeError;
#[cfg(feature = "serde")]
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

/// Leftover bits tolerated after the last field of a segment.
///
/// Encoders may align the packed fields to a byte, then to a base64 character, which leaves at
/// most 11 unused bits.
pub const MAX_PADDING_BITS: usize = 11;

/// The static layout of a segment type.
#[derive(Debug)]
pub struct SegmentSchema {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl SegmentSchema {
    pub const fn new(name: &'static str, fields: &'static [FieldSpec]) -> Self {
        Self { name, fields }
    }

    pub fn index_of(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|spec| spec.name == field)
    }

    pub fn spec(&self, field: &str) -> Option<&'static FieldSpec> {
        let fields: &'static [FieldSpec] = self.fields;
        fields.iter().find(|spec| spec.name == field)
    }

    /// The number of bits a segment of this type needs at the very least.
    pub fn min_width(&self) -> usize {
        self.fields.iter().map(|spec| spec.kind.min_width()).sum()
    }
}

/// Packs values in order into one contiguous bit buffer.
pub fn encode_fields<'a, I>(fields: I) -> Bits
where
    I: IntoIterator<Item = (&'a FieldSpec, &'a FieldValue)>,
{
    let mut bits = Bits::new();
    for (spec, value) in fields {
        spec.kind.pack(value, &mut bits);
    }
    bits
}

/// Unpacks every field of `schema` from `bits`, in order.
///
/// Up to [`MAX_PADDING_BITS`] bits left over once the last field is read are padding and ignored,
/// more is [`SectionDecodeError::TrailingBits`]. Each value is checked against its field spec, a
/// wire value outside the field domain is an error.
pub fn decode_fields(
    schema: &SegmentSchema,
    bits: &Bits,
) -> Result<Vec<FieldValue>, SectionDecodeError> {
    let expected = schema.min_width();
    if bits.len() < expected {
        return Err(SectionDecodeError::Truncated {
            segment: schema.name,
            expected,
            found: bits.len(),
        });
    }

    let mut r = bits.reader();
    let values = schema
        .fields
        .iter()
        .map(|spec| {
            let value = spec.kind.unpack(&mut r)?;
            spec.validate(&value)
                .map_err(SectionDecodeError::InvalidFieldValue)?;
            Ok(value)
        })
        .collect::<Result<Vec<_>, SectionDecodeError>>()?;

    let padding = r.remaining();
    if padding > MAX_PADDING_BITS {
        return Err(SectionDecodeError::TrailingBits {
            segment: schema.name,
            found: padding,
        });
    }
    if padding >= 6 {
        debug!(segment = schema.name, padding, "ignoring padding character");
    }

    Ok(values)
}

/// A live segment: a schema and one value per field.
#[derive(Clone, Debug)]
pub struct Segment {
    schema: &'static SegmentSchema,
    values: Vec<FieldValue>,
    bits: EncodeCache<Bits>,
}

impl Segment {
    /// Creates a segment with every field at its default value.
    pub fn new(schema: &'static SegmentSchema) -> Self {
        Self {
            schema,
            values: schema.fields.iter().map(FieldSpec::default_value).collect(),
            bits: EncodeCache::new(),
        }
    }

    pub fn schema(&self) -> &'static SegmentSchema {
        self.schema
    }

    pub fn name(&self) -> &'static str {
        self.schema.name
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(self.schema.index_of(field)?)
    }

    /// Shorthand for the value of an integer field.
    pub fn integer(&self, field: &str) -> Option<u32> {
        self.get(field).and_then(FieldValue::as_integer)
    }

    /// Assigns a field, rejecting values outside its domain.
    ///
    /// On error the segment is left untouched.
    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) -> Result<(), ValidationError> {
        let index = self
            .schema
            .index_of(field)
            .ok_or_else(|| ValidationError::UnknownField(field.to_string()))?;
        let value = value.into();
        self.schema.fields[index].validate(&value)?;

        if self.values[index] != value {
            self.values[index] = value;
            self.bits.invalidate();
        }
        Ok(())
    }

    /// Field names and values, in declared order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> + '_ {
        self.schema
            .fields
            .iter()
            .map(|spec| spec.name)
            .zip(self.values.iter())
    }

    /// The packed fields, computed on first use.
    pub fn bits(&self) -> &Bits {
        self.bits
            .get_or_encode(|| encode_fields(self.schema.fields.iter().zip(self.values.iter())))
    }

    pub fn encode(&self) -> String {
        base64::encode(self.bits())
    }

    pub fn decode(schema: &'static SegmentSchema, s: &str) -> Result<Self, SectionDecodeError> {
        Self::decode_bits(schema, &base64::decode(s)?)
    }

    pub fn decode_bits(
        schema: &'static SegmentSchema,
        bits: &Bits,
    ) -> Result<Self, SectionDecodeError> {
        Ok(Self {
            schema,
            values: decode_fields(schema, bits)?,
            bits: EncodeCache::new(),
        })
    }
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name == other.schema.name && self.values == other.values
    }
}

impl Eq for Segment {}

#[cfg(feature = "serde")]
impl Serialize for Segment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.fields() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bits::tests::b;
    use test_case::test_case;

    const FIELDS: &[FieldSpec] = &[
        FieldSpec::integer("Version", 6).with_default(1),
        FieldSpec::integer("Notice", 2).with_validator(|n| n <= 2),
        FieldSpec::integer_list("Choices", 2, 3).with_validator(|n| n <= 2),
        FieldSpec::boolean("Flag"),
    ];
    static SCHEMA: SegmentSchema = SegmentSchema::new("test", FIELDS);

    #[test]
    fn defaults() {
        let segment = Segment::new(&SCHEMA);
        assert_eq!(segment.integer("Version"), Some(1));
        assert_eq!(
            segment.get("Choices"),
            Some(&FieldValue::IntegerList(vec![0, 0, 0]))
        );
        assert_eq!(segment.get("Flag"), Some(&FieldValue::Boolean(false)));
        assert_eq!(segment.get("Missing"), None);
    }

    #[test]
    fn width_is_sum_of_fields() {
        assert_eq!(SCHEMA.min_width(), 6 + 2 + 6 + 1);
        assert_eq!(Segment::new(&SCHEMA).bits().len(), SCHEMA.min_width());
    }

    #[test]
    fn encode_in_declared_order() {
        let mut segment = Segment::new(&SCHEMA);
        segment.set("Notice", 2u32).unwrap();
        segment.set("Choices", [0u32, 1, 2]).unwrap();
        segment.set("Flag", true).unwrap();

        assert_eq!(segment.bits(), &b("000001 10 00 01 10 1"));
        assert_eq!(segment.encode(), "Bho");
    }

    #[test]
    fn mutation_invalidates_cache() {
        let mut segment = Segment::new(&SCHEMA);
        let before = segment.encode();
        assert!(segment.bits.is_cached());

        segment.set("Notice", 1u32).unwrap();
        assert!(!segment.bits.is_cached());
        let after = segment.encode();

        assert_ne!(before, after);
        assert_eq!(Segment::decode(&SCHEMA, &after).unwrap().integer("Notice"), Some(1));
    }

    #[test]
    fn rejected_assignment_keeps_state() {
        let mut segment = Segment::new(&SCHEMA);
        segment.set("Notice", 1u32).unwrap();
        let encoded = segment.encode();

        assert_eq!(
            segment.set("Notice", 3u32),
            Err(ValidationError::OutOfDomain {
                field: "Notice",
                value: 3
            })
        );
        assert!(matches!(
            segment.set("Nope", 1u32),
            Err(ValidationError::UnknownField(_))
        ));
        assert_eq!(segment.integer("Notice"), Some(1));
        assert_eq!(segment.encode(), encoded);
    }

    #[test]
    fn round_trip() {
        let mut segment = Segment::new(&SCHEMA);
        segment.set("Version", 63u32).unwrap();
        segment.set("Choices", [2u32, 2, 1]).unwrap();
        segment.set("Flag", true).unwrap();

        assert_eq!(Segment::decode(&SCHEMA, &segment.encode()).unwrap(), segment);
    }

    #[test_case("Bho" => matches Ok(()) ; "exact")]
    #[test_case("BhoA" => matches Ok(()) ; "trailing padding")]
    #[test_case("BhoAA" => matches Err(SectionDecodeError::TrailingBits { segment: "test", found: 15 }) ; "trailing characters")]
    #[test_case("Bh" => matches Err(SectionDecodeError::Truncated { segment: "test", expected: 15, found: 12 }) ; "truncated")]
    #[test_case("" => matches Err(SectionDecodeError::Truncated { found: 0, .. }) ; "empty")]
    #[test_case("B+o" => matches Err(SectionDecodeError::DecodeSegment(_)) ; "bad character")]
    #[test_case("Bxo" => matches Err(SectionDecodeError::InvalidFieldValue(ValidationError::OutOfDomain { field: "Notice", value: 3 })) ; "value out of domain")]
    fn decode(s: &str) -> Result<(), SectionDecodeError> {
        Segment::decode(&SCHEMA, s).map(|_| ())
    }
}
