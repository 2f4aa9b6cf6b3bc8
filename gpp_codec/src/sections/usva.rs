//! US Virginia section (ID 9).
//!
//! Sensitive data processing categories, in order: racial or ethnic origin, religious or
//! philosophical beliefs, health diagnosis data, sex life or sexual orientation, citizenship or
//! immigration status, genetic unique identification, biometric unique identification, precise
//! geolocation data.
use crate::fields::FieldSpec;
use crate::sections::us_common::{
    choice, choice_list, UsLayout, MSPA_COVERED_TRANSACTION, MSPA_OPT_OUT_OPTION_MODE,
    MSPA_SERVICE_PROVIDER_MODE, VERSION,
};
use crate::sections::{SectionId, SectionLayout, SegmentedSection};
use crate::segment::SegmentSchema;

const CORE_FIELDS: &[FieldSpec] = &[
    VERSION,
    choice("SharingNotice"),
    choice("SaleOptOutNotice"),
    choice("TargetedAdvertisingOptOutNotice"),
    choice("SaleOptOut"),
    choice("TargetedAdvertisingOptOut"),
    choice_list("SensitiveDataProcessing", 8),
    choice("KnownChildSensitiveDataConsents"),
    MSPA_COVERED_TRANSACTION,
    MSPA_OPT_OUT_OPTION_MODE,
    MSPA_SERVICE_PROVIDER_MODE,
];

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct UsVaLayout;

impl SectionLayout for UsVaLayout {
    const ID: SectionId = SectionId::UsVa;
    const VERSION: u32 = 1;
    const SEGMENTS: &'static [SegmentSchema] = &[SegmentSchema::new("core", CORE_FIELDS)];
}

impl UsLayout for UsVaLayout {
    const NOTICE_OPT_OUT_PAIRS: &'static [(&'static str, &'static str)] = &[
        ("SaleOptOutNotice", "SaleOptOut"),
        ("TargetedAdvertisingOptOutNotice", "TargetedAdvertisingOptOut"),
    ];
    const SERVICE_PROVIDER_NOTICES: &'static [&'static str] = &["SaleOptOutNotice"];
}

pub type UsVa = SegmentedSection<UsVaLayout>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::us_common::Inconsistency;
    use crate::sections::{Encodable, SectionDecodeError};
    use test_case::test_case;

    fn all_ones() -> UsVa {
        let mut s = UsVa::new();
        for name in [
            "SharingNotice",
            "SaleOptOutNotice",
            "TargetedAdvertisingOptOutNotice",
            "SaleOptOut",
            "TargetedAdvertisingOptOut",
            "KnownChildSensitiveDataConsents",
            "MspaOptOutOptionMode",
        ] {
            s.set_field(name, 1u32).unwrap();
        }
        s.set_field("SensitiveDataProcessing", vec![1u32; 8]).unwrap();
        s.set_field("MspaCoveredTransaction", 2u32).unwrap();
        s.set_field("MspaServiceProviderMode", 2u32).unwrap();
        s
    }

    #[test]
    fn core_width() {
        assert_eq!(UsVaLayout::SEGMENTS[0].min_width(), 40);
    }

    #[test_case(UsVa::new() => "BAAAABA" ; "defaults")]
    #[test_case(all_ones() => "BVVVVWY" ; "all ones")]
    fn encode(s: UsVa) -> String {
        s.encode()
    }

    #[test_case("BAAAABA" => UsVa::new() ; "defaults")]
    #[test_case("BVVVVWY" => all_ones() ; "all ones")]
    fn decode(s: &str) -> UsVa {
        UsVa::decode(s).unwrap()
    }

    #[test]
    fn no_optional_segment() {
        assert!(matches!(
            UsVa::decode("BVVVVWY.Y"),
            Err(SectionDecodeError::TooManySegments {
                expected: 1,
                found: 2,
                ..
            })
        ));
    }

    #[test]
    fn consistency() {
        assert_eq!(all_ones().validate(), Ok(()));

        let mut s = all_ones();
        s.set_field("TargetedAdvertisingOptOut", 0u32).unwrap();
        assert_eq!(
            s.validate(),
            Err(vec![Inconsistency {
                field1: ("TargetedAdvertisingOptOutNotice", 1),
                field2: ("TargetedAdvertisingOptOut", 0),
            }])
        );
    }
}
