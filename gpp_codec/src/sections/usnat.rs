//! US National Privacy section (ID 7).
//!
//! Sensitive data processing categories, in order: racial or ethnic origin, religious or
//! philosophical beliefs, health data, sex life or sexual orientation, citizenship or immigration
//! status, genetic unique identification, biometric unique identification, precise geolocation,
//! identification documents, financial data, union membership, mail, email or text messages.
//!
//! Known child sensitive data consents: from 13 to 16, under 13.
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
    choice("SharingOptOutNotice"),
    choice("TargetedAdvertisingOptOutNotice"),
    choice("SensitiveDataProcessingOptOutNotice"),
    choice("SensitiveDataLimitUseNotice"),
    choice("SaleOptOut"),
    choice("SharingOptOut"),
    choice("TargetedAdvertisingOptOut"),
    choice_list("SensitiveDataProcessing", 12),
    choice_list("KnownChildSensitiveDataConsents", 2),
    choice("PersonalDataConsents"),
    MSPA_COVERED_TRANSACTION,
    MSPA_OPT_OUT_OPTION_MODE,
    MSPA_SERVICE_PROVIDER_MODE,
];

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct UsNatLayout;

impl SectionLayout for UsNatLayout {
    const ID: SectionId = SectionId::UsNat;
    const VERSION: u32 = 1;
    const SEGMENTS: &'static [SegmentSchema] =
        &[SegmentSchema::new("core", CORE_FIELDS), GPC_SEGMENT];
}

impl WithGpc for UsNatLayout {}

impl UsLayout for UsNatLayout {
    const NOTICE_OPT_OUT_PAIRS: &'static [(&'static str, &'static str)] = &[
        ("SharingNotice", "SharingOptOut"),
        ("SharingOptOutNotice", "SharingOptOut"),
        ("SaleOptOutNotice", "SaleOptOut"),
        ("TargetedAdvertisingOptOutNotice", "TargetedAdvertisingOptOut"),
    ];
    const SERVICE_PROVIDER_NOTICES: &'static [&'static str] = &[
        "SaleOptOutNotice",
        "SharingOptOutNotice",
        "SensitiveDataLimitUseNotice",
    ];
}

pub type UsNat = SegmentedSection<UsNatLayout>;
