//! Error types for the namespace registry

use namecred_types::Address;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NamespaceRegistryError {
    #[error("Invalid namespace: {namespace} ({reason})")]
    InvalidNamespace { namespace: String, reason: String },

    #[error("Namespace not found: {namespace}")]
    NamespaceNotFound { namespace: String },

    #[error("Namespace already registered and active: {namespace}")]
    NamespaceUnavailable { namespace: String },

    #[error("Unauthorized: {caller} is not the owner of {namespace}")]
    Unauthorized { namespace: String, caller: Address },

    #[error("Namespace expired: {namespace} (expired at {expires_at})")]
    Expired { namespace: String, expires_at: u64 },

    #[error("No commitment matches the revealed registration")]
    CommitmentNotFound,

    #[error("An unexpired commitment with the same digest already exists")]
    UnexpiredCommitmentExists,

    #[error("Commitment too new: revealable at {revealable_at}, now {now}")]
    CommitmentTooNew { revealable_at: u64, now: u64 },

    #[error("Commitment too old: expired at {expired_at}, now {now}")]
    CommitmentTooOld { expired_at: u64, now: u64 },

    #[error("Invalid registry configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, NamespaceRegistryError>;
