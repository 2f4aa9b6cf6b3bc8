//! Field layouts and checks shared by the US sections.
use crate::fields::{FieldSpec, FieldValue};
use crate::sections::{SectionLayout, SegmentedSection};
use crate::segment::SegmentSchema;
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;
#[cfg(feature = "serde")]
use serde::Serialize;

#[derive(Clone, Copy, Debug, Eq, PartialEq, FromPrimitive, ToPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Notice {
    NotApplicable = 0,
    Provided = 1,
    NotProvided = 2,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, FromPrimitive, ToPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum OptOut {
    NotApplicable = 0,
    OptedOut = 1,
    DidNotOptOut = 2,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, FromPrimitive, ToPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum MspaMode {
    NotApplicable = 0,
    Yes = 1,
    No = 2,
}

pub fn is_choice(n: u32) -> bool {
    n <= 2
}

pub fn is_mspa_covered_transaction(n: u32) -> bool {
    (1..=2).contains(&n)
}

fn is_gpc_subsection(n: u32) -> bool {
    n == 1
}

pub(crate) const VERSION: FieldSpec = FieldSpec::integer("Version", 6).with_default(1);

/// A notice, opt-out or consent field: 2 bits, 0 to 2.
pub(crate) const fn choice(name: &'static str) -> FieldSpec {
    FieldSpec::integer(name, 2).with_validator(is_choice)
}

pub(crate) const fn choice_list(name: &'static str, len: usize) -> FieldSpec {
    FieldSpec::integer_list(name, 2, len).with_validator(is_choice)
}

pub(crate) const MSPA_COVERED_TRANSACTION: FieldSpec =
    FieldSpec::integer("MspaCoveredTransaction", 2)
        .with_default(1)
        .with_validator(is_mspa_covered_transaction);
pub(crate) const MSPA_OPT_OUT_OPTION_MODE: FieldSpec = choice("MspaOptOutOptionMode");
pub(crate) const MSPA_SERVICE_PROVIDER_MODE: FieldSpec = choice("MspaServiceProviderMode");

const GPC_FIELDS: &[FieldSpec] = &[
    FieldSpec::integer("SubsectionType", 2)
        .with_default(1)
        .with_validator(is_gpc_subsection),
    FieldSpec::boolean("Gpc"),
];

/// The optional Global Privacy Control segment.
pub(crate) const GPC_SEGMENT: SegmentSchema = SegmentSchema::new("gpc", GPC_FIELDS);

/// US sections subject to the MSPA notice and opt-out consistency rules.
pub trait UsLayout: SectionLayout {
    /// Notice fields and the opt-out field each of them governs.
    const NOTICE_OPT_OUT_PAIRS: &'static [(&'static str, &'static str)];
    /// Notices that must be left not applicable depending on the service provider mode.
    const SERVICE_PROVIDER_NOTICES: &'static [&'static str];
}

/// A pair of field values which are not consistent with each other.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Inconsistency {
    pub field1: (&'static str, u32),
    pub field2: (&'static str, u32),
}

impl Inconsistency {
    fn new(field1: &'static str, val1: u32, field2: &'static str, val2: u32) -> Self {
        Self {
            field1: (field1, val1),
            field2: (field2, val2),
        }
    }
}

fn is_notice_and_opt_out_combination_ok(notice: Option<Notice>, opt_out: Option<OptOut>) -> bool {
    matches!(
        (notice, opt_out),
        (Some(Notice::NotApplicable), Some(OptOut::NotApplicable))
            | (
                Some(Notice::Provided),
                Some(OptOut::OptedOut | OptOut::DidNotOptOut)
            )
            | (Some(Notice::NotProvided), Some(OptOut::OptedOut))
    )
}

impl<L: UsLayout> SegmentedSection<L> {
    fn integer(&self, name: &str) -> u32 {
        self.field(name)
            .and_then(FieldValue::as_integer)
            .unwrap_or_default()
    }

    /// Checks the consistency of notices, opt-outs and MSPA modes.
    ///
    /// This never runs implicitly: a section holding inconsistent values still encodes and
    /// decodes. Every inconsistent pair is reported.
    pub fn validate(&self) -> Result<(), Vec<Inconsistency>> {
        let mut errors = vec![];

        for &(notice, opt_out) in L::NOTICE_OPT_OUT_PAIRS {
            let (n, o) = (self.integer(notice), self.integer(opt_out));
            if !is_notice_and_opt_out_combination_ok(Notice::from_u32(n), OptOut::from_u32(o)) {
                errors.push(Inconsistency::new(notice, n, opt_out, o));
            }
        }

        const SP_MODE: &str = "MspaServiceProviderMode";
        const OPT_OUT_MODE: &str = "MspaOptOutOptionMode";
        let sp_mode = self.integer(SP_MODE);
        let opt_out_mode = self.integer(OPT_OUT_MODE);

        match MspaMode::from_u32(sp_mode) {
            Some(MspaMode::NotApplicable) | Some(MspaMode::Yes) => {
                if sp_mode == MspaMode::Yes as u32 && opt_out_mode != MspaMode::No as u32 {
                    errors.push(Inconsistency::new(
                        SP_MODE,
                        sp_mode,
                        OPT_OUT_MODE,
                        opt_out_mode,
                    ));
                }
                for &notice in L::SERVICE_PROVIDER_NOTICES {
                    let n = self.integer(notice);
                    if n != Notice::NotApplicable as u32 {
                        errors.push(Inconsistency::new(SP_MODE, sp_mode, notice, n));
                    }
                }
            }
            Some(MspaMode::No) if opt_out_mode != MspaMode::Yes as u32 => {
                errors.push(Inconsistency::new(
                    SP_MODE,
                    sp_mode,
                    OPT_OUT_MODE,
                    opt_out_mode,
                ));
            }
            _ => {}
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
