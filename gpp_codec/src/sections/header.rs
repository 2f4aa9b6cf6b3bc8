//! The GPP header section (ID 3).
//!
//! It always comes first in a consent string and lists the IDs of the sections that follow, in
//! order.
use crate::fields::{FieldSpec, FieldValue, IdSet, ValidationError};
use crate::sections::{SectionId, SectionLayout, SegmentedSection};
use crate::segment::SegmentSchema;

/// The value of the 6-bit type field that opens every GPP string.
pub const HEADER_TYPE: u32 = 3;

fn is_header_type(n: u32) -> bool {
    n == HEADER_TYPE
}

const FIELDS: &[FieldSpec] = &[
    FieldSpec::integer("Id", 6)
        .with_default(HEADER_TYPE)
        .with_validator(is_header_type),
    FieldSpec::integer("Version", 6).with_default(1),
    FieldSpec::fibonacci_range("SectionIds"),
];

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct HeaderLayout;

impl SectionLayout for HeaderLayout {
    const ID: SectionId = SectionId::Header;
    const VERSION: u32 = 1;
    const SEGMENTS: &'static [SegmentSchema] = &[SegmentSchema::new("header", FIELDS)];
}

pub type Header = SegmentedSection<HeaderLayout>;

impl SegmentedSection<HeaderLayout> {
    /// Section IDs declared by the header, in ascending order.
    pub fn section_ids(&self) -> impl Iterator<Item = u16> + '_ {
        self.field("SectionIds")
            .and_then(FieldValue::as_id_set)
            .into_iter()
            .flatten()
            .copied()
    }

    pub fn set_section_ids<I>(&mut self, ids: I) -> Result<(), ValidationError>
    where
        I: IntoIterator<Item = u16>,
    {
        self.set_field("SectionIds", ids.into_iter().collect::<IdSet>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::{Encodable, SectionDecodeError};
    use test_case::test_case;

    #[test_case(&[] => "DBAA" ; "no sections")]
    #[test_case(&[6] => "DBABT" ; "uspv1")]
    #[test_case(&[2, 6] => "DBACNY" ; "tcfeuv2 and uspv1")]
    #[test_case(&[7] => "DBABL" ; "usnat")]
    #[test_case(&[7, 8] => "DBABrw" ; "one group")]
    #[test_case(&[7, 8, 9, 10] => "DBABrM" ; "longer group")]
    #[test_case(&[5, 6] => "DBABjw" ; "tcfcav1 and uspv1")]
    #[test_case(&[6, 30] => "DBACTEY" ; "unknown id")]
    fn encode(ids: &[u16]) -> String {
        let mut header = Header::new();
        header.set_section_ids(ids.iter().copied()).unwrap();
        header.encode()
    }

    #[test_case("DBABMA" => vec![2] ; "tcfeuv2")]
    #[test_case("DBABTA" => vec![6] ; "uspv1 with padding")]
    #[test_case("DBACNY" => vec![2, 6] ; "tcfeuv2 and uspv1")]
    #[test_case("DBABrM" => vec![7, 8, 9, 10] ; "group")]
    #[test_case("DBACLIY" => vec![7, 30] ; "unknown id")]
    #[test_case("DBAA" => Vec::<u16>::new() ; "empty")]
    fn decode(s: &str) -> Vec<u16> {
        Header::decode(s).unwrap().section_ids().collect()
    }

    #[test_case("DBA" => matches SectionDecodeError::Truncated { expected: 24, found: 18, .. } ; "too short")]
    #[test_case("BBAA" => matches SectionDecodeError::InvalidFieldValue(ValidationError::OutOfDomain { field: "Id", value: 1 }) ; "not a header")]
    #[test_case("DBAC" => matches SectionDecodeError::Read(_) ; "declared ids missing")]
    #[test_case("DBAA.A" => matches SectionDecodeError::TooManySegments { .. } ; "extra segment")]
    fn error(s: &str) -> SectionDecodeError {
        Header::decode(s).unwrap_err()
    }

    #[test]
    fn zero_is_not_a_section_id() {
        let mut header = Header::new();
        assert!(header.set_section_ids([0]).is_err());
        assert_eq!(header.section_ids().count(), 0);
    }
}
