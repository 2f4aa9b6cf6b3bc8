//! US Connecticut section (ID 12).
//!
//! Sensitive data processing categories, in order: racial or ethnic origin, religious beliefs,
//! health condition or diagnosis, sex life or sexual orientation, citizenship or immigration
//! status, genetic unique identification, biometric unique identification, precise geolocation
//! data.
//!
//! Known child sensitive data consents: process sensitive data from a known child, sell personal
//! data from 13 to 16, process personal data from 13 to 16.
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
    choice_list("SensitiveDataProcessing", 8),
    choice_list("KnownChildSensitiveDataConsents", 3),
    MSPA_COVERED_TRANSACTION,
    MSPA_OPT_OUT_OPTION_MODE,
    MSPA_SERVICE_PROVIDER_MODE,
];

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct UsCtLayout;

impl SectionLayout for UsCtLayout {
    const ID: SectionId = SectionId::UsCt;
    const VERSION: u32 = 1;
    const SEGMENTS: &'static [SegmentSchema] =
        &[SegmentSchema::new("core", CORE_FIELDS), GPC_SEGMENT];
}

impl WithGpc for UsCtLayout {}

impl UsLayout for UsCtLayout {
    const NOTICE_OPT_OUT_PAIRS: &'static [(&'static str, &'static str)] = &[
        ("SaleOptOutNotice", "SaleOptOut"),
        ("TargetedAdvertisingOptOutNotice", "TargetedAdvertisingOptOut"),
    ];
    const SERVICE_PROVIDER_NOTICES: &'static [&'static str] = &["SaleOptOutNotice"];
}

pub type UsCt = SegmentedSection<UsCtLayout>;
