//! Version 1 of the IAB Global Privacy Platform string.
//!
//! A GPP string contains a header which lists the sections which are present
//! in the next optional parts.
//!
//! A typical GPP string will look like this:
//!
//! ```text
//! DBABzw~1YNN~BAAAAAAAAQ
//! ```
//!
//! It contains a header (`DBABzw`) and two sections separated by a `~` character.
//!
//! Most sections are made of one or more segments separated by `.`, each one encoded in a
//! compressed variation of URL-safe Base64. The legacy USP v1 section is the exception, it uses
//! a simpler character set where `Y` and `N` simply mean yes and no.
//!
//! Two types give access to a consent string:
//!
//! - [`GPPString`] splits a string and keeps each section in its raw form, to be decoded on
//!   demand.
//! - [`ConsentString`] holds decoded sections and is able to assemble them back into a string.
//!
//! # Examples
//!
//! You can use the [`GPPString::parse_str`] method to try to parse a consent string:
//!
//! ```
//! use gpp_codec::v1::GPPString;
//! use gpp_codec::v1::GPPDecodeError;
//!
//! fn main() -> Result<(), GPPDecodeError> {
//!     let s = GPPString::parse_str("DBABTA~1YNN")?;
//!     Ok(())
//! }
//! ```
//!
//! Since [`GPPString`] implements the [`FromStr`] trait, you can also use [`str::parse`]:
//!
//! ```
//! use gpp_codec::v1::GPPString;
//! use gpp_codec::v1::GPPDecodeError;
//!
//! fn main() -> Result<(), GPPDecodeError> {
//!     let s: GPPString = "DBABTA~1YNN".parse()?;
//!     Ok(())
//! }
//! ```
//!
//! Building a string goes through [`ConsentString`]. Sections may be inserted in any order:
//!
//! ```
//! use gpp_codec::sections::usca::UsCa;
//! use gpp_codec::sections::usnat::UsNat;
//! use gpp_codec::v1::ConsentString;
//!
//! let mut consent = ConsentString::new();
//! consent.insert(UsCa::new());
//! consent.insert(UsNat::new());
//!
//! assert_eq!(consent.encode(), "DBABrw~BAAAAAAAAQ~BAAAAABA");
//! ```
//!
//! If parsing fails, a [`GPPDecodeError`] is returned instead.
//!
use crate::core::base64;
use crate::sections::header::{Header, HEADER_TYPE};
use crate::sections::{
    decode_section, DecodableSection, Encodable, Section, SectionDecodeError, SectionId,
};
use fnv::FnvHashMap;
use num_traits::FromPrimitive;
#[cfg(feature = "serde")]
use serde::Serialize;
use std::fmt;
use std::iter::FusedIterator;
use std::slice::Iter;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

const GPP_VERSION: u32 = 1;

/// The error type for GPP String decoding operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GPPDecodeError {
    /// The string does not contain the mandatory header section.
    #[error("no header found")]
    NoHeaderFound,
    /// The header has an invalid type for this version of GPP.
    #[error("invalid header type (expected {HEADER_TYPE}, found {found})")]
    InvalidHeaderType { found: u32 },
    /// The header has an invalid GPP version.
    ///
    /// Note that there is currently only V1 of the standard.
    #[error("invalid GPP version (expected {GPP_VERSION}, found {found})")]
    InvalidGPPVersion { found: u32 },
    /// The header could not be decoded.
    ///
    /// This usually occurs if the input string is truncated.
    #[error("unable to decode header: {0}")]
    Header(#[source] SectionDecodeError),
    /// The number of sections listed in the header does not match the number of actual sections
    /// present in the string.
    #[error("ids do not match sections (number of ids {ids}, number of sections {sections})")]
    IdSectionMismatch { ids: usize, sections: usize },
    /// A section listed in the header has an empty body.
    #[error("empty section {id}")]
    EmptySection { id: u16 },
    /// A section failed to decode.
    #[error("unable to decode section {id}: {source}")]
    Section {
        id: SectionId,
        #[source]
        source: SectionDecodeError,
    },
    /// The header lists an ID that is not part of the registry (strict parsing only).
    #[error("unknown section id {0}")]
    UnknownSectionId(u16),
    /// The header lists a section this crate has no codec for (strict parsing only).
    #[error("unsupported section {0}")]
    UnsupportedSection(SectionId),
    /// A section carries a version other than the one its layout describes (strict parsing
    /// only).
    #[error("section {section} has version {found}, expected {expected}")]
    VersionMismatch {
        section: SectionId,
        expected: u32,
        found: u32,
    },
}

/// The representation of a parsed GPP consent string.
///
/// This structure gives access to the list of section IDs which it contains, as well as the raw
/// section strings.
///
/// It also offers methods to decode either a specific section, or all sections at once.
///
/// IDs that the header declares but which are not part of the section registry are kept apart,
/// see [`unknown_sections`](GPPString::unknown_sections).
#[derive(Debug)]
pub struct GPPString {
    header: Header,
    section_ids: Vec<SectionId>,
    sections: FnvHashMap<SectionId, String>,
    unknown: Vec<(u16, String)>,
}

impl GPPString {
    /// Parses a string and returns a [`GPPString`] if successful.
    ///
    /// # Errors
    ///
    /// Returns a [`GPPDecodeError`] if unable to parse the string.
    ///
    /// # Example
    ///
    /// ```
    /// use gpp_codec::v1::GPPString;
    ///
    /// let r = GPPString::parse_str("DBABTA~1YNN");
    ///
    /// assert!(matches!(r, Ok(gpp_str)));
    /// ```
    ///
    pub fn parse_str(s: &str) -> Result<Self, GPPDecodeError> {
        s.parse()
    }

    /// The decoded header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns a reference to a raw section contained in this GPP string.
    ///
    /// If the given section is not present within the GPP string, the method returns [`None`].
    ///
    /// # Example
    ///
    /// ```
    /// use std::str::FromStr;
    /// use gpp_codec::sections::SectionId;
    /// use gpp_codec::v1::GPPString;
    /// use gpp_codec::v1::GPPDecodeError;
    ///
    /// fn main() -> Result<(), GPPDecodeError> {
    ///     let gpp_str = GPPString::from_str("DBABTA~1YNN")?;
    ///     let s = gpp_str.section(SectionId::UspV1);
    ///
    ///     assert_eq!(s, Some("1YNN"));
    ///
    ///     Ok(())
    /// }
    /// ```
    pub fn section(&self, id: SectionId) -> Option<&str> {
        self.sections.get(&id).map(|s| s.as_str())
    }

    /// Returns an iterator that yields the registered section IDs present in this GPP string,
    /// in header order.
    ///
    /// # Example
    ///
    /// ```
    /// use gpp_codec::sections::SectionId;
    /// use gpp_codec::v1::GPPString;
    /// use gpp_codec::v1::GPPDecodeError;
    ///
    /// fn main() -> Result<(), GPPDecodeError> {
    ///     let gpp_str = GPPString::parse_str("DBABTA~1YNN")?;
    ///     let mut it = gpp_str.section_ids();
    ///
    ///     assert_eq!(it.next(), Some(&SectionId::UspV1));
    ///     assert_eq!(it.next(), None);
    ///
    ///     Ok(())
    /// }
    /// ```
    pub fn section_ids(&self) -> SectionIds<'_> {
        SectionIds(self.section_ids.iter())
    }

    /// Returns an iterator that yields the raw strings of the registered sections present in
    /// this GPP string.
    ///
    /// # Example
    ///
    /// ```
    /// use gpp_codec::v1::GPPString;
    /// use gpp_codec::v1::GPPDecodeError;
    ///
    /// fn main() -> Result<(), GPPDecodeError> {
    ///     let gpp_str = GPPString::parse_str("DBABzw~1YNN~BAAAAAAAAQ")?;
    ///     let mut it = gpp_str.sections();
    ///
    ///     assert_eq!(it.next(), Some("1YNN"));
    ///     assert_eq!(it.next(), Some("BAAAAAAAAQ"));
    ///     assert_eq!(it.next(), None);
    ///
    ///     Ok(())
    /// }
    /// ```
    pub fn sections(&self) -> Sections<'_> {
        Sections {
            gpp_str: self,
            idx: 0,
        }
    }

    /// IDs declared by the header which are not part of the registry, with their raw strings.
    pub fn unknown_sections(&self) -> impl Iterator<Item = (u16, &str)> + '_ {
        self.unknown.iter().map(|(id, s)| (*id, s.as_str()))
    }

    /// Decodes and returns a single section of this GPP string.
    ///
    /// The returned section is wrapped in a [`Section`] enum, meaning that it must be
    /// explicitly matched. Therefore, this method is better used in loops, or when
    /// the type of section to parse is not known by advance.
    ///
    /// If you know by advance which section type you want to decode, use the generic
    /// [`decode`](GPPString::decode) method instead.
    ///
    /// # Example
    ///
    /// ```
    /// use gpp_codec::sections::SectionId;
    /// use gpp_codec::sections::Section;
    /// use gpp_codec::v1::GPPString;
    /// use gpp_codec::v1::GPPDecodeError;
    ///
    /// fn main() -> Result<(), GPPDecodeError> {
    ///     let gpp_str = GPPString::parse_str("DBABTA~1YNN")?;
    ///     let r = gpp_str.decode_section(SectionId::UspV1);
    ///
    ///     assert!(matches!(r, Ok(Section::UspV1(_))));
    ///
    ///     Ok(())
    /// }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a [`SectionDecodeError`] if decoding the section fails or if the section is not
    /// present in the string.
    ///
    pub fn decode_section(&self, id: SectionId) -> Result<Section, SectionDecodeError> {
        let s = self
            .section(id)
            .ok_or(SectionDecodeError::MissingSection(id))?;
        decode_section(id, s)
    }

    /// Decodes and returns a single section of this GPP string, given its type.
    ///
    /// # Example
    ///
    /// ```
    /// use gpp_codec::sections::uspv1::{Flag, UspV1};
    /// use gpp_codec::v1::GPPString;
    /// use gpp_codec::v1::GPPDecodeError;
    ///
    /// fn main() -> Result<(), GPPDecodeError> {
    ///     let gpp_str = GPPString::parse_str("DBABTA~1YNN")?;
    ///     let usp = gpp_str.decode::<UspV1>().unwrap();
    ///
    ///     assert_eq!(usp.opt_out_notice, Flag::Yes);
    ///
    ///     Ok(())
    /// }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a [`SectionDecodeError`] if decoding the section fails or if the section is not
    /// present in the string.
    ///
    pub fn decode<T>(&self) -> Result<T, SectionDecodeError>
    where
        T: DecodableSection,
    {
        let s = self
            .section(T::ID)
            .ok_or(SectionDecodeError::MissingSection(T::ID))?;
        T::decode(s)
    }

    /// Decodes and returns all registered sections present in this GPP string.
    ///
    /// Each entry is either the decoded section or an error if decoding fails.
    pub fn decode_all_sections(&self) -> Vec<Result<Section, SectionDecodeError>> {
        self.section_ids
            .iter()
            .map(|id| self.decode_section(*id))
            .collect()
    }
}

impl FromStr for GPPString {
    type Err = GPPDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chunks = s.split('~');
        let header_str = chunks
            .next()
            .filter(|h| !h.is_empty())
            .ok_or(GPPDecodeError::NoHeaderFound)?;
        let header = decode_header(header_str)?;

        let ids = header.section_ids().collect::<Vec<_>>();
        let chunks = chunks.collect::<Vec<_>>();
        if chunks.len() != ids.len() {
            return Err(GPPDecodeError::IdSectionMismatch {
                ids: ids.len(),
                sections: chunks.len(),
            });
        }

        let mut section_ids = Vec::with_capacity(ids.len());
        let mut sections = FnvHashMap::default();
        let mut unknown = vec![];
        for (id, chunk) in ids.into_iter().zip(chunks) {
            if chunk.is_empty() {
                return Err(GPPDecodeError::EmptySection { id });
            }
            match SectionId::from_u16(id) {
                Some(section_id) => {
                    section_ids.push(section_id);
                    sections.insert(section_id, chunk.to_string());
                }
                None => unknown.push((id, chunk.to_string())),
            }
        }

        Ok(Self {
            header,
            section_ids,
            sections,
            unknown,
        })
    }
}

fn decode_header(s: &str) -> Result<Header, GPPDecodeError> {
    let bits = base64::decode(s).map_err(|e| GPPDecodeError::Header(e.into()))?;
    let mut r = bits.reader();
    let read_error = |e| GPPDecodeError::Header(SectionDecodeError::Read(e));

    let header_type = r.read_unsigned(6).map_err(read_error)?;
    if header_type != HEADER_TYPE {
        return Err(GPPDecodeError::InvalidHeaderType { found: header_type });
    }

    let gpp_version = r.read_unsigned(6).map_err(read_error)?;
    if gpp_version != GPP_VERSION {
        return Err(GPPDecodeError::InvalidGPPVersion { found: gpp_version });
    }

    Header::decode(s).map_err(GPPDecodeError::Header)
}

/// Created with the method [`sections`](GPPString::sections).
pub struct Sections<'a> {
    gpp_str: &'a GPPString,
    idx: usize,
}

impl<'a> Iterator for Sections<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let section_id = self.gpp_str.section_ids.get(self.idx)?;
        self.idx += 1;
        self.gpp_str.section(*section_id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.len();
        (len, Some(len))
    }
}

impl ExactSizeIterator for Sections<'_> {
    fn len(&self) -> usize {
        self.gpp_str.section_ids.len() - self.idx
    }
}

impl FusedIterator for Sections<'_> {}

/// Created with the method [`section_ids`](GPPString::section_ids).
pub struct SectionIds<'a>(Iter<'a, SectionId>);

impl<'a> Iterator for SectionIds<'a> {
    type Item = &'a SectionId;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl ExactSizeIterator for SectionIds<'_> {
    fn len(&self) -> usize {
        self.0.len()
    }
}

impl FusedIterator for SectionIds<'_> {}

/// Controls how [`ConsentString::parse_with`] treats anomalies that do not prevent decoding.
///
/// By default every anomaly is tolerated and reported as a [`DecodeWarning`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ParseOptions {
    /// Fail when a section carries a version other than the one its layout describes.
    pub reject_version_mismatch: bool,
    /// Fail when the header lists an unknown ID, or a section without a codec.
    pub reject_unknown_sections: bool,
}

impl ParseOptions {
    /// Options rejecting every anomaly.
    pub fn strict() -> Self {
        Self {
            reject_version_mismatch: true,
            reject_unknown_sections: true,
        }
    }
}

/// An anomaly found while parsing a consent string, which did not prevent decoding.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum DecodeWarning {
    /// The header lists an ID that is not part of the registry. Its section was skipped.
    UnknownSectionId(u16),
    /// The header lists a section this crate has no codec for. It was skipped.
    UnsupportedSection(SectionId),
    /// A section was decoded with a layout describing another version.
    VersionMismatch {
        section: SectionId,
        expected: u32,
        found: u32,
    },
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeWarning::UnknownSectionId(id) => write!(f, "skipped unknown section id {id}"),
            DecodeWarning::UnsupportedSection(id) => write!(f, "skipped unsupported section {id}"),
            DecodeWarning::VersionMismatch {
                section,
                expected,
                found,
            } => write!(
                f,
                "section {section} has version {found}, decoded as version {expected}"
            ),
        }
    }
}

/// The outcome of a successful [`ConsentString::parse_with`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Parsed {
    pub consent: ConsentString,
    pub warnings: Vec<DecodeWarning>,
}

/// A set of decoded sections, at most one per section ID.
///
/// Sections are always kept in [`SECTION_ORDER`](crate::sections::SECTION_ORDER), regardless of
/// the order in which they were inserted. The header is derived from the sections present
/// whenever the string is encoded.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ConsentString {
    sections: Vec<Section>,
}

impl ConsentString {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a string, tolerating unknown sections and version mismatches.
    ///
    /// # Errors
    ///
    /// Returns a [`GPPDecodeError`] if the header or any supported section fails to decode.
    pub fn parse(s: &str) -> Result<Parsed, GPPDecodeError> {
        Self::parse_with(s, &ParseOptions::default())
    }

    /// Parses a string, with control over which anomalies are fatal.
    ///
    /// # Example
    ///
    /// ```
    /// use gpp_codec::sections::SectionId;
    /// use gpp_codec::v1::{ConsentString, DecodeWarning, GPPDecodeError, ParseOptions};
    ///
    /// let s = "DBACLIY~BAAAAAAAAQ~BAAA";
    ///
    /// let parsed = ConsentString::parse(s).unwrap();
    /// assert_eq!(parsed.consent.section_ids().collect::<Vec<_>>(), vec![SectionId::UsNat]);
    /// assert_eq!(parsed.warnings, vec![DecodeWarning::UnknownSectionId(30)]);
    ///
    /// let r = ConsentString::parse_with(s, &ParseOptions::strict());
    /// assert!(matches!(r, Err(GPPDecodeError::UnknownSectionId(30))));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a [`GPPDecodeError`] if the header or any supported section fails to decode, or if
    /// `options` rejects an anomaly.
    pub fn parse_with(s: &str, options: &ParseOptions) -> Result<Parsed, GPPDecodeError> {
        let gpp = GPPString::parse_str(s)?;
        let mut warnings = vec![];

        for (id, _) in gpp.unknown_sections() {
            if options.reject_unknown_sections {
                return Err(GPPDecodeError::UnknownSectionId(id));
            }
            warn!(id, "skipping unknown section id");
            warnings.push(DecodeWarning::UnknownSectionId(id));
        }

        let mut consent = ConsentString::new();
        for &id in gpp.section_ids() {
            if Section::from_id(id).is_none() {
                if options.reject_unknown_sections {
                    return Err(GPPDecodeError::UnsupportedSection(id));
                }
                warn!(section = %id, "skipping unsupported section");
                warnings.push(DecodeWarning::UnsupportedSection(id));
                continue;
            }

            let section = gpp
                .decode_section(id)
                .map_err(|source| GPPDecodeError::Section { id, source })?;
            if let Some(found) = section.version_mismatch() {
                let expected = section.expected_version();
                if options.reject_version_mismatch {
                    return Err(GPPDecodeError::VersionMismatch {
                        section: id,
                        expected,
                        found,
                    });
                }
                warnings.push(DecodeWarning::VersionMismatch {
                    section: id,
                    expected,
                    found,
                });
            }
            consent.insert(section);
        }

        Ok(Parsed { consent, warnings })
    }

    fn position(&self, id: SectionId) -> Result<usize, usize> {
        self.sections
            .binary_search_by_key(&id.order(), |s| s.id().order())
    }

    /// Inserts a section, replacing and returning any section with the same ID.
    pub fn insert(&mut self, section: impl Into<Section>) -> Option<Section> {
        let section = section.into();
        match self.position(section.id()) {
            Ok(i) => Some(std::mem::replace(&mut self.sections[i], section)),
            Err(i) => {
                self.sections.insert(i, section);
                None
            }
        }
    }

    pub fn remove(&mut self, id: SectionId) -> Option<Section> {
        let i = self.position(id).ok()?;
        Some(self.sections.remove(i))
    }

    pub fn get(&self, id: SectionId) -> Option<&Section> {
        let i = self.position(id).ok()?;
        self.sections.get(i)
    }

    pub fn get_mut(&mut self, id: SectionId) -> Option<&mut Section> {
        let i = self.position(id).ok()?;
        self.sections.get_mut(i)
    }

    /// The section of type `T`, if present.
    ///
    /// ```
    /// use gpp_codec::sections::usnat::UsNat;
    /// use gpp_codec::v1::ConsentString;
    ///
    /// let parsed = ConsentString::parse("DBABL~BAAAAAAAAQ").unwrap();
    /// let usnat = parsed.consent.section::<UsNat>().unwrap();
    ///
    /// assert_eq!(usnat.gpc(), None);
    /// ```
    pub fn section<T: DecodableSection>(&self) -> Option<&T> {
        self.get(T::ID).and_then(T::from_section)
    }

    pub fn section_mut<T: DecodableSection>(&mut self) -> Option<&mut T> {
        self.get_mut(T::ID).and_then(T::from_section_mut)
    }

    pub fn sections(&self) -> Iter<'_, Section> {
        self.sections.iter()
    }

    pub fn section_ids(&self) -> impl Iterator<Item = SectionId> + '_ {
        self.sections.iter().map(Section::id)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// A header listing the sections currently present.
    pub fn header(&self) -> Header {
        let mut header = Header::new();
        // registry ids start at 1, which the range field always accepts
        let _ = header.set_section_ids(self.section_ids().map(|id| id as u16));
        header
    }

    /// Assembles the header and every section into a consent string.
    pub fn encode(&self) -> String {
        let s = std::iter::once(self.header().encode())
            .chain(self.sections.iter().map(Section::encode))
            .collect::<Vec<_>>()
            .join("~");
        debug!(sections = self.sections.len(), "encoded consent string");
        s
    }
}

impl FromStr for ConsentString {
    type Err = GPPDecodeError;

    /// Parses leniently, dropping any warning.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).map(|parsed| parsed.consent)
    }
}

impl FromIterator<Section> for ConsentString {
    fn from_iter<I: IntoIterator<Item = Section>>(iter: I) -> Self {
        let mut consent = ConsentString::new();
        for section in iter {
            consent.insert(section);
        }
        consent
    }
}

impl<'a> IntoIterator for &'a ConsentString {
    type Item = &'a Section;
    type IntoIter = Iter<'a, Section>;

    fn into_iter(self) -> Self::IntoIter {
        self.sections.iter()
    }
}

/// Assembles sections into a consent string.
///
/// Sections are serialized in canonical order whatever the iteration order. When several
/// sections share an ID, the last one wins.
///
/// ```
/// use gpp_codec::sections::Section;
/// use gpp_codec::sections::usca::UsCa;
/// use gpp_codec::sections::usnat::UsNat;
/// use gpp_codec::v1::assemble;
///
/// let s = assemble([Section::from(UsCa::new()), Section::from(UsNat::new())]);
/// assert_eq!(s, "DBABrw~BAAAAAAAAQ~BAAAAABA");
/// ```
pub fn assemble<I>(sections: I) -> String
where
    I: IntoIterator<Item = Section>,
{
    sections.into_iter().collect::<ConsentString>().encode()
}
