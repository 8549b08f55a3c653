//! Verified remote read protocol
//!
//! A resolution either finishes locally, suspends with an
//! [`OffchainLookup`] for an off-chain agent to answer, or fails. The caller
//! resumes a suspended call through the success or failure callback named in
//! the lookup, which may in turn suspend again.

use crate::errors::ResolutionError;
use namecred_gateway::OffchainLookup;

/// Result of one step of a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Done(T),
    Suspend(OffchainLookup),
    Failed(ResolutionError),
}

impl<T> Outcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Done(value) => Outcome::Done(f(value)),
            Outcome::Suspend(lookup) => Outcome::Suspend(lookup),
            Outcome::Failed(err) => Outcome::Failed(err),
        }
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self, Outcome::Suspend(_))
    }

    /// The lookup of a suspended outcome.
    pub fn lookup(&self) -> Option<&OffchainLookup> {
        match self {
            Outcome::Suspend(lookup) => Some(lookup),
            _ => None,
        }
    }
}

impl<T> From<Result<T, ResolutionError>> for Outcome<T> {
    fn from(result: Result<T, ResolutionError>) -> Self {
        match result {
            Ok(value) => Outcome::Done(value),
            Err(err) => Outcome::Failed(err),
        }
    }
}
