//! Credential resolution
//!
//! The [`Router`] is the resolution entry point for a naming scope: it
//! extracts the identifier from a wildcard name, matches the queried key to
//! the most specific active namespace binding and dispatches to that
//! namespace's [`CredentialResolver`]. Resolvers backed by off-chain data
//! suspend with an [`namecred_gateway::OffchainLookup`]; the
//! [`ResolutionClient`] drives those round trips against a
//! [`namecred_gateway::Gateway`] and resumes through the router's callbacks.

pub mod client;
pub mod config;
pub mod errors;
pub mod matcher;
pub mod offchain;
pub mod onchain;
pub mod protocol;
pub mod resolver;
pub mod router;

pub use client::{ResolutionClient, DEFAULT_MAX_ROUND_TRIPS};
pub use config::ResolutionConfig;
pub use errors::*;
pub use matcher::{key_candidates, select_resolver, select_resolver_by, select_resolver_with};
pub use offchain::{OffchainAddressResolver, OffchainFetcher, OffchainNameResolver};
pub use onchain::{ResolverEvent, TextRecordResolver};
pub use protocol::Outcome;
pub use resolver::{CredentialResolver, InterfaceId, ResolverDirectory, ResolverMetadata};
pub use router::{Router, RouterEvent};
