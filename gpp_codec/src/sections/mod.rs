//! Traits, helpers, and type definitions for working with GPP sections.
//!
//! Every section ID defined by the GPP standard is listed in [`SectionId`], which also acts as the
//! section registry: canonical names, and the order used when several sections are serialized
//! together ([`SECTION_ORDER`]).
//!
//! Only some of these sections have a codec in this crate. They are listed in the [`Section`]
//! enum, and each one is implemented in its own submodule. Sections made of base64 segments are
//! all instances of [`SegmentedSection`], parameterized by a [`SectionLayout`] describing their
//! segments.
//!
//! Note that the GPP specification states that each section specification is supposed to be
//! independent. As a consequence, there is a lot of duplication between the US section layouts.
//!
use crate::core::base64::DecodeError;
use crate::fields::{FieldSpec, FieldValue, ValidationError};
use num_derive::{FromPrimitive, ToPrimitive};
#[cfg(feature = "serde")]
use serde::Serialize;
use std::io;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};
use thiserror::Error;

pub use segmented::{SectionLayout, SegmentedSection, WithGpc};

pub mod header;
mod segmented;
pub mod us_common;
pub mod usca;
pub mod usco;
pub mod usct;
pub mod usnat;
pub mod uspv1;
pub mod usut;
pub mod usva;

#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    FromPrimitive,
    ToPrimitive,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[strum(serialize_all = "lowercase")]
#[non_exhaustive]
pub enum SectionId {
    TcfEuV1 = 1,
    TcfEuV2 = 2,
    Header = 3,
    SignalIntegrity = 4,
    TcfCaV1 = 5,
    UspV1 = 6,
    UsNat = 7,
    UsCa = 8,
    UsVa = 9,
    UsCo = 10,
    UsUt = 11,
    UsCt = 12,
    UsFl = 13,
    UsMt = 14,
    UsOr = 15,
    UsTx = 16,
    UsDe = 17,
    UsIa = 18,
    UsNe = 19,
    UsNh = 20,
    UsNj = 21,
    UsTn = 22,
}

/// Canonical order of data sections inside a consent string.
///
/// The header always comes first and is not listed here, neither is the signal integrity section.
pub const SECTION_ORDER: &[SectionId] = &[
    SectionId::TcfEuV1,
    SectionId::TcfEuV2,
    SectionId::TcfCaV1,
    SectionId::UspV1,
    SectionId::UsNat,
    SectionId::UsCa,
    SectionId::UsVa,
    SectionId::UsCo,
    SectionId::UsUt,
    SectionId::UsCt,
    SectionId::UsFl,
    SectionId::UsMt,
    SectionId::UsOr,
    SectionId::UsTx,
    SectionId::UsDe,
    SectionId::UsIa,
    SectionId::UsNe,
    SectionId::UsNh,
    SectionId::UsNj,
    SectionId::UsTn,
];

impl SectionId {
    /// The canonical lowercase name of the section, e.g. `usnat`.
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Position of the section in [`SECTION_ORDER`].
    pub fn order(self) -> Option<usize> {
        SECTION_ORDER.iter().position(|&id| id == self)
    }

    /// Whether this crate is able to decode and encode the section as a data section.
    ///
    /// The header is decoded by the consent string parser itself and is never a data section.
    pub fn is_supported(self) -> bool {
        matches!(
            self,
            SectionId::UspV1
                | SectionId::UsNat
                | SectionId::UsCa
                | SectionId::UsVa
                | SectionId::UsCo
                | SectionId::UsUt
                | SectionId::UsCt
        )
    }
}

/// The error type for section decoding failures.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SectionDecodeError {
    #[error("missing section {0}")]
    MissingSection(SectionId),
    #[error("unsupported section id {0}")]
    UnsupportedSectionId(SectionId),
    #[error("unable to read string")]
    Read(#[from] io::Error),
    #[error("segment {segment} needs at least {expected} bits, found {found}")]
    Truncated {
        segment: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("segment {segment} has {found} unused trailing bits")]
    TrailingBits { segment: &'static str, found: usize },
    #[error("unable to decode segment")]
    DecodeSegment(#[from] DecodeError),
    #[error("invalid field value: {0}")]
    InvalidFieldValue(ValidationError),
    #[error("too many segments in section {section} (expected at most {expected}, found {found})")]
    TooManySegments {
        section: SectionId,
        expected: usize,
        found: usize,
    },
    #[error("empty segment at position {index} in section {section}")]
    EmptySegment { section: SectionId, index: usize },
    #[error("unexpected end of string in {0}")]
    UnexpectedEndOfString(String),
    #[error("invalid character {character:?} in {kind} string {s:?}")]
    InvalidCharacter {
        character: char,
        kind: &'static str,
        s: String,
    },
    #[error("unexpected trailing data in {kind} string {s:?}")]
    TrailingData { kind: &'static str, s: String },
}

/// Types with a string wire form.
///
/// Implementors cache their encoding: calling [`encode`](Encodable::encode) repeatedly without
/// mutating the value in between does the work once. Every mutation clears that cache.
pub trait Encodable: Sized {
    fn encode(&self) -> String;

    fn decode(s: &str) -> Result<Self, SectionDecodeError>;

    /// Replaces `self` with the decoded form of `s`.
    ///
    /// On error, `self` is left untouched.
    fn decode_from(&mut self, s: &str) -> Result<(), SectionDecodeError> {
        *self = Self::decode(s)?;
        Ok(())
    }
}

/// Named field access, common to every section type.
pub trait SectionFields {
    fn field_spec(&self, name: &str) -> Option<&'static FieldSpec>;

    /// Every field of the section that takes part in its encoding, in wire order.
    fn field_values(&self) -> Vec<(&'static str, FieldValue)>;

    fn assign(&mut self, name: &str, value: FieldValue) -> Result<(), ValidationError>;

    /// The version carried by the section.
    fn version(&self) -> Option<u32>;

    /// The version described by the layout this crate knows for the section.
    fn expected_version(&self) -> u32;

    /// The version carried by the section, if it differs from the expected one.
    fn version_mismatch(&self) -> Option<u32> {
        self.version().filter(|&v| v != self.expected_version())
    }
}

/// A section type which can be stored in a [`Section`].
pub trait DecodableSection: Encodable + SectionFields + Into<Section> {
    const ID: SectionId;

    fn from_section(section: &Section) -> Option<&Self>;

    fn from_section_mut(section: &mut Section) -> Option<&mut Self>;
}

macro_rules! sections {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        /// A decoded section, of any supported type.
        #[derive(Clone, Debug, Eq, PartialEq)]
        #[cfg_attr(feature = "serde", derive(Serialize))]
        #[non_exhaustive]
        pub enum Section {
            $($variant($ty),)*
        }

        impl Section {
            pub fn id(&self) -> SectionId {
                match self {
                    $(Section::$variant(_) => SectionId::$variant,)*
                }
            }

            /// A section of the given type with every field at its default value.
            pub fn from_id(id: SectionId) -> Option<Self> {
                match id {
                    $(SectionId::$variant => Some(Section::$variant(<$ty>::default())),)*
                    _ => None,
                }
            }

            pub fn encode(&self) -> String {
                match self {
                    $(Section::$variant(s) => s.encode(),)*
                }
            }

            fn fields_ref(&self) -> &dyn SectionFields {
                match self {
                    $(Section::$variant(s) => s,)*
                }
            }

            fn fields_mut(&mut self) -> &mut dyn SectionFields {
                match self {
                    $(Section::$variant(s) => s,)*
                }
            }
        }

        /// Decodes a section body, given the section ID declared in the header.
        pub fn decode_section(id: SectionId, s: &str) -> Result<Section, SectionDecodeError> {
            Ok(match id {
                $(SectionId::$variant => Section::$variant(<$ty>::decode(s)?),)*
                id => return Err(SectionDecodeError::UnsupportedSectionId(id)),
            })
        }

        $(
            impl From<$ty> for Section {
                fn from(section: $ty) -> Self {
                    Section::$variant(section)
                }
            }

            impl DecodableSection for $ty {
                const ID: SectionId = SectionId::$variant;

                fn from_section(section: &Section) -> Option<&Self> {
                    match section {
                        Section::$variant(s) => Some(s),
                        _ => None,
                    }
                }

                fn from_section_mut(section: &mut Section) -> Option<&mut Self> {
                    match section {
                        Section::$variant(s) => Some(s),
                        _ => None,
                    }
                }
            }
        )*
    };
}

sections! {
    UspV1(uspv1::UspV1),
    UsNat(usnat::UsNat),
    UsCa(usca::UsCa),
    UsVa(usva::UsVa),
    UsCo(usco::UsCo),
    UsUt(usut::UsUt),
    UsCt(usct::UsCt),
}

impl Section {
    pub fn field_spec(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields_ref().field_spec(name)
    }

    pub fn field(&self, name: &str) -> Option<FieldValue> {
        self.fields()
            .into_iter()
            .find_map(|(n, value)| (n == name).then_some(value))
    }

    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        self.fields_ref().field_values()
    }

    pub fn set_field(
        &mut self,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), ValidationError> {
        self.fields_mut().assign(name, value.into())
    }

    pub fn expected_version(&self) -> u32 {
        self.fields_ref().expected_version()
    }

    pub fn version_mismatch(&self) -> Option<u32> {
        self.fields_ref().version_mismatch()
    }
}
