//! Bit level building blocks shared by segments and sections.
pub mod base64;
pub mod bits;
pub(crate) mod cache;
pub mod fibonacci;

pub use bits::{Bits, BitsReader};
