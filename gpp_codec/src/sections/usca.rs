//! US California section (ID 8).
//!
//! Sensitive data processing categories, in order: identification documents, financial data,
//! precise geolocation, racial or ethnic origin, religious beliefs or union membership, mail,
//! email or text messages, genetic data, biometric unique identification, health data, sex life or
//! sexual orientation.
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
    choice("SaleOptOutNotice"),
    choice("SharingOptOutNotice"),
    choice("SensitiveDataLimitUseNotice"),
    choice("SaleOptOut"),
    choice("SharingOptOut"),
    choice_list("SensitiveDataProcessing", 9),
    choice_list("KnownChildSensitiveDataConsents", 2),
    choice("PersonalDataConsents"),
    MSPA_COVERED_TRANSACTION,
    MSPA_OPT_OUT_OPTION_MODE,
    MSPA_SERVICE_PROVIDER_MODE,
];

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct UsCaLayout;

impl SectionLayout for UsCaLayout {
    const ID: SectionId = SectionId::UsCa;
    const VERSION: u32 = 1;
    const SEGMENTS: &'static [SegmentSchema] =
        &[SegmentSchema::new("core", CORE_FIELDS), GPC_SEGMENT];
}

impl WithGpc for UsCaLayout {}

impl UsLayout for UsCaLayout {
    const NOTICE_OPT_OUT_PAIRS: &'static [(&'static str, &'static str)] = &[
        ("SharingOptOutNotice", "SharingOptOut"),
        ("SaleOptOutNotice", "SaleOptOut"),
    ];
    const SERVICE_PROVIDER_NOTICES: &'static [&'static str] = &[
        "SaleOptOutNotice",
        "SharingOptOutNotice",
        "SensitiveDataLimitUseNotice",
    ];
}

pub type UsCa = SegmentedSection<UsCaLayout>;
