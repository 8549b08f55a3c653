//! Shared primitives for namespace credential resolution.
//!
//! Every other crate in the workspace speaks in terms of these types:
//! 20-byte [`Address`]es (the zero address is the null resolver), 32-byte
//! namespace hashes ([`Node`]), four-byte function [`Selector`]s, the
//! call-data codec used at the resolution entry point, and the [`Clock`]
//! abstraction used for commitment ages and expirations.

pub mod abi;
pub mod address;
pub mod clock;
pub mod hash;

pub use abi::*;
pub use address::*;
pub use clock::*;
pub use hash::*;
