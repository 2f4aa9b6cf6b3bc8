//! US Colorado section (ID 10).
//!
//! Sensitive data processing categories, in order: racial or ethnic origin, religious beliefs,
//! health condition or diagnosis, sex life or sexual orientation, citizenship data, genetic unique
//! identification, biometric unique identification.
use crate::fields::FieldSpec;
use crate::sections::us_common::{
    choice, choice_list, UsLayout, GPC_SEGMENT, MSPA_COVERED_TRANSACTION,
    MSPA_OPT_OUT_OPTION_MODE, MSPA_SERVICE_PROVIDER_MODE, VERSION,
};
use crate::sections::{SectionId, SectionLayout, SegmentedSection, WithGpc};
use crate::segment::SegmentSchema;

const CORE_FIELDS: &[FieldSpec] = &[
    VERSION,
    choice("SharingNotice"),
    choice("SaleOptOutNotice"),
    choice("TargetedAdvertisingOptOutNotice"),
    choice("SaleOptOut"),
    choice("TargetedAdvertisingOptOut"),
    choice_list("SensitiveDataProcessing", 7),
    choice("KnownChildSensitiveDataConsents"),
    MSPA_COVERED_TRANSACTION,
    MSPA_OPT_OUT_OPTION_MODE,
    MSPA_SERVICE_PROVIDER_MODE,
];

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct UsCoLayout;

impl SectionLayout for UsCoLayout {
    const ID: SectionId = SectionId::UsCo;
    const VERSION: u32 = 1;
    const SEGMENTS: &'static [SegmentSchema] =
        &[SegmentSchema::new("core", CORE_FIELDS), GPC_SEGMENT];
}

impl WithGpc for UsCoLayout {}

impl UsLayout for UsCoLayout {
    const NOTICE_OPT_OUT_PAIRS: &'static [(&'static str, &'static str)] = &[
        ("SaleOptOutNotice", "SaleOptOut"),
        ("TargetedAdvertisingOptOutNotice", "TargetedAdvertisingOptOut"),
    ];
    const SERVICE_PROVIDER_NOTICES: &'static [&'static str] = &["SaleOptOutNotice"];
}

pub type UsCo = SegmentedSection<UsCoLayout>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::Encodable;
    use test_case::test_case;

    fn sample() -> UsCo {
        let mut s = UsCo::new();
        for name in [
            "SharingNotice",
            "SaleOptOutNotice",
            "TargetedAdvertisingOptOutNotice",
            "KnownChildSensitiveDataConsents",
            "MspaOptOutOptionMode",
        ] {
            s.set_field(name, 1u32).unwrap();
        }
        s.set_field("SaleOptOut", 2u32).unwrap();
        s.set_field("TargetedAdvertisingOptOut", 2u32).unwrap();
        s.set_field("SensitiveDataProcessing", vec![2u32; 7]).unwrap();
        s.set_field("MspaCoveredTransaction", 2u32).unwrap();
        s.set_field("MspaServiceProviderMode", 2u32).unwrap();
        s
    }

    #[test]
    fn core_width() {
        assert_eq!(UsCoLayout::SEGMENTS[0].min_width(), 38);
    }

    #[test_case(UsCo::new() => "BAAAAEA" ; "defaults")]
    #[test_case(sample() => "BVqqqZg" ; "sample")]
    fn encode(s: UsCo) -> String {
        s.encode()
    }

    #[test_case("BAAAAEA" => UsCo::new() ; "defaults")]
    #[test_case("BVqqqZg" => sample() ; "sample")]
    fn decode(s: &str) -> UsCo {
        UsCo::decode(s).unwrap()
    }

    #[test]
    fn gpc_round_trip() {
        let mut s = sample();
        s.set_gpc(Some(false));
        let encoded = s.encode();
        assert_eq!(encoded, "BVqqqZg.Q");

        let decoded = UsCo::decode(&encoded).unwrap();
        assert_eq!(decoded.gpc(), Some(false));
        assert_eq!(decoded, s);
        assert_eq!(decoded.validate(), Ok(()));
    }
}
