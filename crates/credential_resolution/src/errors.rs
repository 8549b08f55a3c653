//! Error types for credential resolution

use namecred_dns_wire::WireNameError;
use namecred_gateway::{GatewayError, VerificationError};
use namecred_namespace_registry::NamespaceRegistryError;
use namecred_types::{AbiError, Address};
use thiserror::Error;

/// Everything that can abort a resolution.
///
/// Upstream errors are wrapped unchanged so callers can inspect the exact
/// failure; [`ResolutionError::kind`] groups them into the protocol taxonomy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error(transparent)]
    WireName(#[from] WireNameError),

    #[error(transparent)]
    Registry(#[from] NamespaceRegistryError),

    #[error("Call data: {0}")]
    Codec(#[from] AbiError),

    #[error("Unsupported operation: {operation}")]
    UnsupportedOperation { operation: String },

    #[error("Remote verification failed: {0}")]
    RemoteVerificationFailure(#[from] VerificationError),

    /// Failure payload of the off-chain agent, carried byte-for-byte.
    #[error("Remote fetch failed ({} byte payload)", payload.len())]
    RemoteFetchFailed { payload: Vec<u8> },

    #[error("Remote read returned no value")]
    EmptyResult,

    #[error("Remote value: {0}")]
    Value(#[from] GatewayError),

    #[error("Invalid identifier: {reason}")]
    InvalidIdentifier { reason: String },

    #[error("{caller} does not own resolver {resolver}")]
    NotResolverOwner { resolver: Address, caller: Address },

    #[error("Invalid callback context: {0}")]
    InvalidExtraData(String),

    #[error("No resolver deployed at {0}")]
    UnknownResolver(Address),

    #[error("Lookup raised by {actual}, expected the router at {expected}")]
    UnexpectedSender { expected: Address, actual: Address },

    #[error("Gave up after {limit} remote round trips")]
    RoundTripLimit { limit: usize },

    #[error("Gateway did not answer within {after_ms} ms")]
    Timeout { after_ms: u64 },
}

/// Protocol-level classification of a [`ResolutionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedEncoding,
    NoMatchFound,
    Unauthorized,
    Expired,
    UnsupportedOperation,
    RemoteVerificationFailure,
    InvalidInput,
    Protocol,
}

impl ResolutionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolutionError::WireName(WireNameError::NoMatchFound) => ErrorKind::NoMatchFound,
            ResolutionError::WireName(_) | ResolutionError::Codec(_) => ErrorKind::MalformedEncoding,
            ResolutionError::Registry(NamespaceRegistryError::Unauthorized { .. })
            | ResolutionError::NotResolverOwner { .. } => ErrorKind::Unauthorized,
            ResolutionError::Registry(NamespaceRegistryError::Expired { .. }) => ErrorKind::Expired,
            ResolutionError::Registry(NamespaceRegistryError::NamespaceNotFound { .. }) => {
                ErrorKind::NoMatchFound
            }
            ResolutionError::Registry(_) => ErrorKind::InvalidInput,
            ResolutionError::UnsupportedOperation { .. } => ErrorKind::UnsupportedOperation,
            ResolutionError::RemoteVerificationFailure(_)
            | ResolutionError::RemoteFetchFailed { .. }
            | ResolutionError::EmptyResult
            | ResolutionError::Value(_) => ErrorKind::RemoteVerificationFailure,
            ResolutionError::InvalidIdentifier { .. } => ErrorKind::InvalidInput,
            ResolutionError::InvalidExtraData(_)
            | ResolutionError::UnknownResolver(_)
            | ResolutionError::UnexpectedSender { .. }
            | ResolutionError::RoundTripLimit { .. }
            | ResolutionError::Timeout { .. } => ErrorKind::Protocol,
        }
    }
}

pub type Result<T> = std::result::Result<T, ResolutionError>;
