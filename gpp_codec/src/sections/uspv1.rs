//! US Privacy string v1 (ID 6), the legacy CCPA signal.
//!
//! Unlike the other sections it is not base64 encoded: it is made of a version digit followed by
//! three flags, each one of `Y`, `N` or `-`.
//!
//! See <https://github.com/InteractiveAdvertisingBureau/USPrivacy/blob/master/CCPA/US%20Privacy%20String.md#us-privacy-string-format>
use crate::fields::{FieldSpec, FieldValue, ValidationError};
use crate::sections::us_common::is_choice;
use crate::sections::{Encodable, SectionDecodeError, SectionFields};
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive, ToPrimitive};
#[cfg(feature = "serde")]
use serde::Serialize;
use std::str::Chars;
use tracing::warn;

const USP_V1_VERSION: u8 = 1;
const KIND: &str = "uspv1";

fn is_digit(n: u32) -> bool {
    n <= 9
}

const FIELDS: &[FieldSpec] = &[
    FieldSpec::integer("Version", 4)
        .with_default(USP_V1_VERSION as u32)
        .with_validator(is_digit),
    FieldSpec::integer("Notice", 2).with_validator(is_choice),
    FieldSpec::integer("OptOutSale", 2).with_validator(is_choice),
    FieldSpec::integer("LspaCovered", 2).with_validator(is_choice),
];

/// A US Privacy flag. The numeric values follow the GPP notice and opt-out convention.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, FromPrimitive, ToPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Flag {
    #[default]
    NotApplicable = 0,
    Yes = 1,
    No = 2,
}

impl Flag {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'Y' => Some(Self::Yes),
            'N' => Some(Self::No),
            '-' => Some(Self::NotApplicable),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            Self::Yes => 'Y',
            Self::No => 'N',
            Self::NotApplicable => '-',
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct UspV1 {
    pub version: u8,
    pub opt_out_notice: Flag,
    pub opt_out_sale: Flag,
    pub lspa_covered_transaction: Flag,
}

impl Default for UspV1 {
    fn default() -> Self {
        Self {
            version: USP_V1_VERSION,
            opt_out_notice: Flag::default(),
            opt_out_sale: Flag::default(),
            lspa_covered_transaction: Flag::default(),
        }
    }
}

impl Encodable for UspV1 {
    fn encode(&self) -> String {
        format!(
            "{}{}{}{}",
            self.version,
            self.opt_out_notice.as_char(),
            self.opt_out_sale.as_char(),
            self.lspa_covered_transaction.as_char(),
        )
    }

    fn decode(s: &str) -> Result<Self, SectionDecodeError> {
        let mut chars = s.chars();

        let version = chars
            .next()
            .ok_or_else(|| SectionDecodeError::UnexpectedEndOfString(s.to_string()))?;
        let version = version
            .to_digit(10)
            .ok_or_else(|| SectionDecodeError::InvalidCharacter {
                character: version,
                kind: KIND,
                s: s.to_string(),
            })? as u8;
        if version != USP_V1_VERSION {
            warn!(
                section = KIND,
                expected = USP_V1_VERSION,
                found = version,
                "section version mismatch, decoded with the known layout"
            );
        }

        let section = Self {
            version,
            opt_out_notice: parse_next_char(&mut chars, s)?,
            opt_out_sale: parse_next_char(&mut chars, s)?,
            lspa_covered_transaction: parse_next_char(&mut chars, s)?,
        };

        if chars.next().is_some() {
            return Err(SectionDecodeError::TrailingData {
                kind: KIND,
                s: s.to_string(),
            });
        }

        Ok(section)
    }
}

impl SectionFields for UspV1 {
    fn field_spec(&self, name: &str) -> Option<&'static FieldSpec> {
        FIELDS.iter().find(|spec| spec.name == name)
    }

    fn field_values(&self) -> Vec<(&'static str, FieldValue)> {
        let flags = [
            self.opt_out_notice,
            self.opt_out_sale,
            self.lspa_covered_transaction,
        ];
        FIELDS
            .iter()
            .map(|spec| spec.name)
            .zip(
                std::iter::once(self.version as u32)
                    .chain(flags.iter().map(|f| f.to_u32().unwrap_or_default())),
            )
            .map(|(name, n)| (name, FieldValue::Integer(n)))
            .collect()
    }

    fn assign(&mut self, name: &str, value: FieldValue) -> Result<(), ValidationError> {
        let spec = self
            .field_spec(name)
            .ok_or_else(|| ValidationError::UnknownField(name.to_string()))?;
        spec.validate(&value)?;
        let n = value.as_integer().unwrap_or_default();

        match spec.name {
            "Version" => self.version = n as u8,
            name => {
                let flag = Flag::from_u32(n).unwrap_or_default();
                match name {
                    "Notice" => self.opt_out_notice = flag,
                    "OptOutSale" => self.opt_out_sale = flag,
                    _ => self.lspa_covered_transaction = flag,
                }
            }
        }
        Ok(())
    }

    fn version(&self) -> Option<u32> {
        Some(self.version.into())
    }

    fn expected_version(&self) -> u32 {
        USP_V1_VERSION.into()
    }
}

fn parse_next_char(chars: &mut Chars, original_str: &str) -> Result<Flag, SectionDecodeError> {
    let char = chars
        .next()
        .ok_or_else(|| SectionDecodeError::UnexpectedEndOfString(original_str.to_string()))?;

    Flag::from_char(char).ok_or_else(|| SectionDecodeError::InvalidCharacter {
        character: char,
        kind: KIND,
        s: original_str.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("1YN-" => UspV1 {
        version: 1,
        opt_out_notice: Flag::Yes,
        opt_out_sale: Flag::No,
        lspa_covered_transaction: Flag::NotApplicable,
    } ; "mix")]
    #[test_case("1NNN" => UspV1 {
        version: 1,
        opt_out_notice: Flag::No,
        opt_out_sale: Flag::No,
        lspa_covered_transaction: Flag::No,
    } ; "all no")]
    #[test_case("2YYY" => UspV1 {
        version: 2,
        opt_out_notice: Flag::Yes,
        opt_out_sale: Flag::Yes,
        lspa_covered_transaction: Flag::Yes,
    } ; "other version")]
    fn parse(s: &str) -> UspV1 {
        let section = UspV1::decode(s).unwrap();
        assert_eq!(section.encode(), s);
        section
    }

    #[test_case("ZYN-" => matches SectionDecodeError::InvalidCharacter { character: 'Z', .. } ; "invalid version character")]
    #[test_case("" => matches SectionDecodeError::UnexpectedEndOfString(_) ; "empty string")]
    #[test_case("1" => matches SectionDecodeError::UnexpectedEndOfString(_) ; "header only")]
    #[test_case("1N" => matches SectionDecodeError::UnexpectedEndOfString(_) ; "missing characters")]
    #[test_case("1A" => matches SectionDecodeError::InvalidCharacter { character: 'A', .. } ; "invalid consent character")]
    #[test_case("1YNNY" => matches SectionDecodeError::TrailingData { .. } ; "too long")]
    fn error(s: &str) -> SectionDecodeError {
        UspV1::decode(s).unwrap_err()
    }

    #[test]
    fn default_is_not_applicable() {
        assert_eq!(UspV1::default().encode(), "1---");
    }

    #[test]
    fn version_mismatch() {
        assert_eq!(UspV1::decode("1YNN").unwrap().version_mismatch(), None);
        assert_eq!(UspV1::decode("2YNN").unwrap().version_mismatch(), Some(2));
    }

    #[test]
    fn named_fields() {
        let mut section = UspV1::default();
        section.assign("Notice", FieldValue::Integer(1)).unwrap();
        section.assign("OptOutSale", FieldValue::Integer(2)).unwrap();
        assert_eq!(section.encode(), "1YN-");

        assert!(matches!(
            section.assign("OptOutSale", FieldValue::Integer(3)),
            Err(ValidationError::OutOfDomain { .. })
        ));
        assert!(matches!(
            section.assign("Gpc", FieldValue::Boolean(true)),
            Err(ValidationError::UnknownField(_))
        ));
        assert_eq!(
            section.field_values(),
            vec![
                ("Version", FieldValue::Integer(1)),
                ("Notice", FieldValue::Integer(1)),
                ("OptOutSale", FieldValue::Integer(2)),
                ("LspaCovered", FieldValue::Integer(0)),
            ]
        );
    }
}
