//! Offchain fetch adapter
//!
//! Builds the storage-read requests carried by the remote-read protocol,
//! verifies agent responses against trusted state roots using Merkle storage
//! proofs, and decodes the proven raw values. [`LocalGateway`] is an
//! in-memory agent for tests and local development.

pub mod agent;
pub mod errors;
pub mod lookup;
pub mod proof;
pub mod request;
pub mod value;

pub use agent::{Gateway, LocalGateway, StateSnapshot};
pub use errors::*;
pub use lookup::OffchainLookup;
pub use proof::{GatewayResponse, MerkleStateVerifier, ProofVerifier, StorageProof};
pub use request::{derive_slot, GatewayRequest, Op, StorageReader};
pub use value::decode_uint_decimal;
