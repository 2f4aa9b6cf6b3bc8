//! This crate is a bit-level codec for the IAB Global Privacy Platform (GPP)
//! [Consent String Specification](https://github.com/InteractiveAdvertisingBureau/Global-Privacy-Platform).
//!
//! It is able to decode, build and encode the header, the legacy US Privacy v1 section and the
//! US National, California, Virginia, Colorado, Utah and Connecticut sections. Other section IDs
//! are recognized and can be accessed in their raw form.
//!
//! NOTE: This is not an official IAB library.
//!
//! # Parsing GPP strings
//!
//! A GPP Consent String is made of a mandatory header and a list of optional sections.
//!
//! The [`GPPString`](v1::GPPString) type splits consent strings and decodes sections on demand.
//!
//! ```
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! use std::str::FromStr;
//! use gpp_codec::v1::GPPString;
//!
//! let s = "DBABzw~1YNN~BAAAAAAAAQ";
//! let gpp_string = GPPString::from_str(s)?;
//!
//! // Individual sections can be then be accessed:
//! for &id in gpp_string.section_ids() {
//!     let section_str = gpp_string.section(id).ok_or("missing section")?;
//!     println!("{section_str}");
//!
//!     let section = gpp_string.decode_section(id)?;
//!     println!("Section: {:?}", &section);
//! }
//!
//! // All sections can be decoded at once as well:
//! let sections = gpp_string.decode_all_sections();
//! # Ok(())
//! # }
//! ```
//!
//! # Building GPP strings
//!
//! [`ConsentString`](v1::ConsentString) holds decoded sections. Fields are read and written by
//! name, and every assignment is checked against the field's domain.
//!
//! ```
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! use gpp_codec::sections::usnat::UsNat;
//! use gpp_codec::v1::ConsentString;
//!
//! let mut usnat = UsNat::new();
//! usnat.set_field("SaleOptOutNotice", 1u32)?;
//! usnat.set_field("SaleOptOut", 1u32)?;
//! usnat.set_gpc(Some(true));
//!
//! // values outside of the field domain are rejected
//! assert!(usnat.set_field("SaleOptOut", 3u32).is_err());
//!
//! let mut consent = ConsentString::new();
//! consent.insert(usnat);
//!
//! assert_eq!(consent.encode(), "DBABL~BEAQAAAAAQ.Y");
//! # Ok(())
//! # }
//! ```
//!
//! # Error handling
//!
//! Truncated or malformed sections, and values outside of a field's domain, are errors.
//!
//! Some anomalies do not prevent decoding: a section with an unexpected version is decoded with
//! the layout this crate knows, and sections which cannot be decoded are skipped. By default
//! they are logged through [`tracing`](https://docs.rs/tracing) and reported as
//! [`DecodeWarning`](v1::DecodeWarning)s, and [`ParseOptions`](v1::ParseOptions) turns them into
//! errors.
//!
pub mod core;
pub mod fields;
pub mod sections;
pub mod segment;
pub mod v1;
