//! Namespace Registry
//!
//! Admits namespaces through a two-phase commit-reveal protocol so that a
//! pending registration cannot be copied and front-run, then tracks the
//! owner, resolver binding and expiration of every admitted namespace.
//! Expiration is never swept: an expired entry simply stops being eligible.

pub mod commitment;
pub mod errors;
pub mod registry;
pub mod types;

pub use commitment::{make_commitment, Secret};
pub use errors::*;
pub use registry::NamespaceRegistry;
pub use types::*;
