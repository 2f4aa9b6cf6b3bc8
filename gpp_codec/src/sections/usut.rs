//! US Utah section (ID 11).
//!
//! Sensitive data processing categories, in order: racial or ethnic origin, religious beliefs,
//! sexual orientation, citizenship or immigration status, health data, genetic unique
//! identification, biometric unique identification, specific geolocation data.
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
    choice("SensitiveDataProcessingOptOutNotice"),
    choice("SaleOptOut"),
    choice("TargetedAdvertisingOptOut"),
    choice_list("SensitiveDataProcessing", 8),
    choice("KnownChildSensitiveDataConsents"),
    MSPA_COVERED_TRANSACTION,
    MSPA_OPT_OUT_OPTION_MODE,
    MSPA_SERVICE_PROVIDER_MODE,
];

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct UsUtLayout;

impl SectionLayout for UsUtLayout {
    const ID: SectionId = SectionId::UsUt;
    const VERSION: u32 = 1;
    const SEGMENTS: &'static [SegmentSchema] = &[SegmentSchema::new("core", CORE_FIELDS)];
}

impl UsLayout for UsUtLayout {
    const NOTICE_OPT_OUT_PAIRS: &'static [(&'static str, &'static str)] = &[
        ("SaleOptOutNotice", "SaleOptOut"),
        ("TargetedAdvertisingOptOutNotice", "TargetedAdvertisingOptOut"),
    ];
    const SERVICE_PROVIDER_NOTICES: &'static [&'static str] = &["SaleOptOutNotice"];
}

pub type UsUt = SegmentedSection<UsUtLayout>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldValue;
    use crate::sections::Encodable;
    use test_case::test_case;

    fn sample() -> UsUt {
        let mut s = UsUt::new();
        for name in [
            "SharingNotice",
            "SaleOptOutNotice",
            "TargetedAdvertisingOptOutNotice",
            "SensitiveDataProcessingOptOutNotice",
            "SaleOptOut",
            "TargetedAdvertisingOptOut",
            "KnownChildSensitiveDataConsents",
            "MspaOptOutOptionMode",
        ] {
            s.set_field(name, 1u32).unwrap();
        }
        s.set_field("SensitiveDataProcessing", vec![2u32; 8]).unwrap();
        s.set_field("MspaServiceProviderMode", 2u32).unwrap();
        s
    }

    #[test]
    fn core_width() {
        assert_eq!(UsUtLayout::SEGMENTS[0].min_width(), 42);
    }

    #[test_case(UsUt::new() => "BAAAAAQ" ; "defaults")]
    #[test_case(sample() => "BVVqqpW" ; "sample")]
    fn encode(s: UsUt) -> String {
        s.encode()
    }

    #[test_case("BAAAAAQ" => UsUt::new() ; "defaults")]
    #[test_case("BVVqqpW" => sample() ; "sample")]
    fn decode(s: &str) -> UsUt {
        UsUt::decode(s).unwrap()
    }

    #[test]
    fn fields_in_wire_order() {
        let s = sample();
        let names = s.fields().map(|(name, _)| name).collect::<Vec<_>>();
        assert_eq!(names.first(), Some(&"Version"));
        assert_eq!(names.last(), Some(&"MspaServiceProviderMode"));
        assert_eq!(names.len(), 12);
        assert_eq!(
            s.field("KnownChildSensitiveDataConsents"),
            Some(&FieldValue::Integer(1))
        );
        assert_eq!(s.validate(), Ok(()));
    }
}
