//! Registration commitments

use namecred_types::{keccak256_concat, Address};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Owner-chosen secret blinding a commitment.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Secret(pub [u8; 32]);

impl Secret {
    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(..)")
    }
}

/// Digest submitted in the commit phase.
///
/// `keccak256(namespace || owner || secret || resolver)`. The namespace is
/// the only variable-length field and comes first, so the layout is
/// unambiguous. Binding the owner means a copied reveal cannot redirect the
/// registration to someone else.
pub fn make_commitment(
    namespace: &str,
    owner: &Address,
    secret: &Secret,
    resolver: &Address,
) -> [u8; 32] {
    keccak256_concat(&[
        namespace.as_bytes(),
        owner.as_bytes(),
        &secret.0,
        resolver.as_bytes(),
    ])
}
