//! Error types for the gateway crate

use namecred_types::Address;
use thiserror::Error;

/// Failures while building, executing or decoding a storage-read request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Program read storage before setting a target")]
    NoTarget,

    #[error("Follow with an empty key stack")]
    EmptyStack,

    #[error("Output index {index} out of range ({count} declared)")]
    OutputOutOfRange { index: usize, count: usize },

    #[error("Storage slot unavailable: {target} 0x{slot}")]
    SlotUnavailable { target: Address, slot: String },

    #[error("Value is {0} bytes, wider than a 32-byte word")]
    ValueTooWide(usize),

    #[error("Empty value")]
    EmptyValue,
}

impl GatewayError {
    pub(crate) fn slot_unavailable(target: &Address, slot: &[u8; 32]) -> Self {
        GatewayError::SlotUnavailable {
            target: *target,
            slot: hex::encode(slot),
        }
    }
}

/// Failures while checking a gateway response against a trusted state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("State root 0x{0} is not trusted")]
    UntrustedRoot(String),

    #[error("No storage proof for {target} 0x{slot}")]
    MissingProof { target: Address, slot: String },

    #[error("Storage proof for {target} 0x{slot} does not match the state root")]
    InvalidProof { target: Address, slot: String },

    #[error("Re-execution failed: {0}")]
    Execution(#[from] GatewayError),
}

/// Failure reported by an off-chain agent. The payload is opaque and is
/// carried byte-for-byte back to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Gateway request failed ({} byte payload)", payload.len())]
pub struct GatewayFailure {
    pub payload: Vec<u8>,
}

impl GatewayFailure {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
