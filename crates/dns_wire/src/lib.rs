//! Wire Name Parsing
//!
//! Names travel in the length-prefixed DNS wire format: each label is a
//! length byte followed by that many bytes, and the sequence ends with a
//! zero-length label. This crate validates and builds such names, computes
//! their recursive namespace hash, and extracts the sub-identifier that sits
//! to the left of a designated marker label.

pub mod errors;
pub mod extract;
pub mod wire;

pub use errors::*;
pub use extract::{extract_identifier, IdentifierExtractor, MIN_NAME_LEN};
pub use wire::{encode, namehash, namehash_dotted, Labels, WireName, MAX_LABEL_LEN};
