use crate::core::cache::EncodeCache;
use crate::fields::{FieldSpec, FieldValue, ValidationError};
use crate::segment::{Segment, SegmentSchema};
use crate::sections::{Encodable, SectionDecodeError, SectionFields, SectionId};
#[cfg(feature = "serde")]
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::marker::PhantomData;
use tracing::warn;

/// The static description of a section made of base64 segments.
pub trait SectionLayout: 'static {
    const ID: SectionId;
    const VERSION: u32;
    /// Segment types in wire order. The first one is the mandatory core segment, the following
    /// ones are optional.
    const SEGMENTS: &'static [SegmentSchema];
}

/// Layouts whose second segment is the Global Privacy Control subsection.
pub trait WithGpc: SectionLayout {}

/// A section made of a mandatory core segment followed by optional segments.
///
/// Segments are joined with `.` on the wire. Optional segments carry no presence marker: a
/// string made of `n` chunks holds the first `n` segment types of the layout.
pub struct SegmentedSection<L> {
    segments: Vec<Segment>,
    included: Vec<bool>,
    encoded: EncodeCache<String>,
    layout: PhantomData<fn() -> L>,
}

impl<L: SectionLayout> SegmentedSection<L> {
    /// Creates a section with every field at its default value and no optional segment.
    pub fn new() -> Self {
        Self {
            segments: L::SEGMENTS.iter().map(Segment::new).collect(),
            included: (0..L::SEGMENTS.len()).map(|i| i == 0).collect(),
            encoded: EncodeCache::new(),
            layout: PhantomData,
        }
    }

    pub fn id(&self) -> SectionId {
        L::ID
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    /// Mutable access to a segment. The section encoding is recomputed on next use.
    pub fn segment_mut(&mut self, index: usize) -> Option<&mut Segment> {
        self.encoded.invalidate();
        self.segments.get_mut(index)
    }

    pub fn segment_included(&self, index: usize) -> bool {
        self.included.get(index).copied().unwrap_or(false)
    }

    /// Includes or excludes an optional segment. The core segment is always included.
    pub fn set_segment_included(&mut self, index: usize, included: bool) {
        if index == 0 {
            return;
        }
        if let Some(flag) = self.included.get_mut(index) {
            if *flag != included {
                *flag = included;
                self.encoded.invalidate();
            }
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.segments.iter().find_map(|segment| segment.get(name))
    }

    pub fn field_spec(&self, name: &str) -> Option<&'static FieldSpec> {
        L::SEGMENTS.iter().find_map(|schema| schema.spec(name))
    }

    /// Assigns a field of any segment.
    ///
    /// Fields of optional segments can be set while the segment is excluded, the value is kept
    /// and encoded once the segment is included.
    pub fn set_field(
        &mut self,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), ValidationError> {
        let segment = self
            .segments
            .iter_mut()
            .find(|segment| segment.schema().index_of(name).is_some())
            .ok_or_else(|| ValidationError::UnknownField(name.to_string()))?;
        segment.set(name, value)?;
        self.encoded.invalidate();
        Ok(())
    }

    /// Field names and values of the included segments, in wire order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> + '_ {
        self.included_segments().flat_map(Segment::fields)
    }

    pub fn version(&self) -> Option<u32> {
        self.field("Version").and_then(FieldValue::as_integer)
    }

    /// The version carried by the core segment, if it differs from the one of the layout.
    pub fn version_mismatch(&self) -> Option<u32> {
        self.version().filter(|&v| v != L::VERSION)
    }

    fn included_segments(&self) -> impl Iterator<Item = &Segment> + '_ {
        // optional segments are positional, so everything up to the last included one is written
        let count = self.included.iter().rposition(|&b| b).map_or(1, |i| i + 1);
        self.segments.iter().take(count)
    }
}

impl<L: SectionLayout + WithGpc> SegmentedSection<L> {
    /// The Global Privacy Control signal, `None` when the GPC segment is not included.
    pub fn gpc(&self) -> Option<bool> {
        if !self.segment_included(1) {
            return None;
        }
        self.segments
            .get(1)
            .and_then(|segment| segment.get("Gpc"))
            .and_then(FieldValue::as_bool)
    }

    /// Sets the Global Privacy Control signal, `None` excludes the GPC segment.
    pub fn set_gpc(&mut self, gpc: Option<bool>) {
        if let Some(gpc) = gpc {
            if let Some(segment) = self.segments.get_mut(1) {
                // a boolean always validates
                let _ = segment.set("Gpc", gpc);
            }
        }
        self.encoded.invalidate();
        self.set_segment_included(1, gpc.is_some());
    }
}

impl<L: SectionLayout> Encodable for SegmentedSection<L> {
    fn encode(&self) -> String {
        self.encoded
            .get_or_encode(|| {
                self.included_segments()
                    .map(Segment::encode)
                    .collect::<Vec<_>>()
                    .join(".")
            })
            .clone()
    }

    fn decode(s: &str) -> Result<Self, SectionDecodeError> {
        let chunks = s.split('.').collect::<Vec<_>>();
        if chunks.len() > L::SEGMENTS.len() {
            return Err(SectionDecodeError::TooManySegments {
                section: L::ID,
                expected: L::SEGMENTS.len(),
                found: chunks.len(),
            });
        }

        let mut section = Self::new();
        for (index, (chunk, schema)) in chunks.into_iter().zip(L::SEGMENTS).enumerate() {
            if chunk.is_empty() {
                return Err(SectionDecodeError::EmptySegment {
                    section: L::ID,
                    index,
                });
            }
            section.segments[index] = Segment::decode(schema, chunk)?;
            section.included[index] = true;
        }

        if let Some(found) = section.version_mismatch() {
            warn!(
                section = %L::ID,
                expected = L::VERSION,
                found,
                "section version mismatch, decoded with the known layout"
            );
        }

        Ok(section)
    }
}

impl<L: SectionLayout> SectionFields for SegmentedSection<L> {
    fn field_spec(&self, name: &str) -> Option<&'static FieldSpec> {
        SegmentedSection::field_spec(self, name)
    }

    fn field_values(&self) -> Vec<(&'static str, FieldValue)> {
        self.fields()
            .map(|(name, value)| (name, value.clone()))
            .collect()
    }

    fn assign(&mut self, name: &str, value: FieldValue) -> Result<(), ValidationError> {
        self.set_field(name, value)
    }

    fn version(&self) -> Option<u32> {
        SegmentedSection::version(self)
    }

    fn expected_version(&self) -> u32 {
        L::VERSION
    }
}

impl<L: SectionLayout> Default for SegmentedSection<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L> Clone for SegmentedSection<L> {
    fn clone(&self) -> Self {
        Self {
            segments: self.segments.clone(),
            included: self.included.clone(),
            encoded: self.encoded.clone(),
            layout: PhantomData,
        }
    }
}

impl<L: SectionLayout> fmt::Debug for SegmentedSection<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentedSection")
            .field("id", &L::ID)
            .field("segments", &self.segments)
            .field("included", &self.included)
            .finish()
    }
}

/// Two sections are equal when they encode the same segments, values held by excluded optional
/// segments are not compared.
impl<L: SectionLayout> PartialEq for SegmentedSection<L> {
    fn eq(&self, other: &Self) -> bool {
        self.included_segments().eq(other.included_segments())
    }
}

impl<L: SectionLayout> Eq for SegmentedSection<L> {}

#[cfg(feature = "serde")]
impl<L: SectionLayout> Serialize for SegmentedSection<L> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let segments = self.included_segments().collect::<Vec<_>>();
        let mut map = serializer.serialize_map(Some(segments.len()))?;
        for segment in segments {
            map.serialize_entry(segment.name(), segment)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const CORE_FIELDS: &[FieldSpec] = &[
        FieldSpec::integer("Version", 6).with_default(2),
        FieldSpec::integer("Value", 4),
    ];
    const EXTRA_FIELDS: &[FieldSpec] = &[FieldSpec::boolean("Extra")];
    const OTHER_FIELDS: &[FieldSpec] = &[FieldSpec::integer("Other", 6)];

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    struct TestLayout;

    impl SectionLayout for TestLayout {
        const ID: SectionId = SectionId::UsNat;
        const VERSION: u32 = 2;
        const SEGMENTS: &'static [SegmentSchema] = &[
            SegmentSchema::new("core", CORE_FIELDS),
            SegmentSchema::new("extra", EXTRA_FIELDS),
            SegmentSchema::new("other", OTHER_FIELDS),
        ];
    }

    type TestSection = SegmentedSection<TestLayout>;

    #[test]
    fn only_core_by_default() {
        let section = TestSection::new();
        assert_eq!(section.encode(), "CA");
        assert!(section.segment_included(0));
        assert!(!section.segment_included(1));
    }

    #[test]
    fn optional_segment_changes_chunk_count() {
        let mut section = TestSection::new();
        section.set_field("Extra", true).unwrap();
        assert_eq!(section.encode(), "CA");

        section.set_segment_included(1, true);
        assert_eq!(section.encode(), "CA.g");

        let decoded = TestSection::decode("CA.g").unwrap();
        assert!(decoded.segment_included(1));
        assert_eq!(decoded.field("Extra"), Some(&FieldValue::Boolean(true)));
        assert_eq!(decoded, section);
    }

    #[test]
    fn later_segment_pulls_earlier_ones() {
        let mut section = TestSection::new();
        section.set_segment_included(2, true);
        assert_eq!(section.encode(), "CA.A.A");
    }

    #[test]
    fn equality_ignores_excluded_segments() {
        let mut section = TestSection::new();
        section.set_field("Extra", true).unwrap();
        assert_eq!(TestSection::decode(&section.encode()).unwrap(), section);
        assert_eq!(section, TestSection::new());

        section.set_segment_included(1, true);
        assert_ne!(section, TestSection::new());

        let mut pulled = TestSection::new();
        pulled.set_segment_included(2, true);
        assert!(!pulled.segment_included(1));
        assert_eq!(TestSection::decode(&pulled.encode()).unwrap(), pulled);
    }

    #[test]
    fn missing_chunk_keeps_defaults() {
        let section = TestSection::decode("CQ").unwrap();
        assert_eq!(section.field("Value"), Some(&FieldValue::Integer(4)));
        assert!(!section.segment_included(1));
        assert_eq!(section.field("Extra"), Some(&FieldValue::Boolean(false)));
    }

    #[test]
    fn core_cannot_be_excluded() {
        let mut section = TestSection::new();
        section.set_segment_included(0, false);
        assert!(section.segment_included(0));
    }

    #[test]
    fn mutation_through_segment_invalidates_cache() {
        let mut section = TestSection::new();
        let before = section.encode();
        section
            .segment_mut(0)
            .unwrap()
            .set("Value", 15u32)
            .unwrap();
        assert_ne!(section.encode(), before);
        assert_eq!(section.encode(), "C8");
    }

    #[test]
    fn version_mismatch_is_tolerated() {
        let section = TestSection::decode("BA").unwrap();
        assert_eq!(section.version(), Some(1));
        assert_eq!(section.version_mismatch(), Some(1));
        assert_eq!(TestSection::new().version_mismatch(), None);
    }

    #[test]
    fn decode_from_keeps_state_on_error() {
        let mut section = TestSection::decode("CQ").unwrap();
        assert!(section.decode_from("C").is_err());
        assert_eq!(section.field("Value"), Some(&FieldValue::Integer(4)));

        section.decode_from("C8.g").unwrap();
        assert_eq!(section.field("Value"), Some(&FieldValue::Integer(15)));
        assert!(section.segment_included(1));
    }

    #[test_case("CA.g.A.A" => matches SectionDecodeError::TooManySegments { expected: 3, found: 4, .. } ; "too many segments")]
    #[test_case("CA..A" => matches SectionDecodeError::EmptySegment { index: 1, .. } ; "empty optional segment")]
    #[test_case("" => matches SectionDecodeError::EmptySegment { index: 0, .. } ; "empty string")]
    #[test_case("C" => matches SectionDecodeError::Truncated { segment: "core", .. } ; "truncated core")]
    fn error(s: &str) -> SectionDecodeError {
        TestSection::decode(s).unwrap_err()
    }

    #[test]
    fn unknown_field() {
        let mut section = TestSection::new();
        assert_eq!(
            section.set_field("Nope", 1u32),
            Err(ValidationError::UnknownField("Nope".to_string()))
        );
    }
}
