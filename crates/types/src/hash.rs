//! Keccak-256 hashing, namespace hashes and function selectors.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;

/// Keccak-256 of `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Keccak-256 over the concatenation of `parts`.
pub fn keccak256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// 32-byte namespace hash computed recursively over a wire name.
///
/// `Node::ROOT` is the hash of the empty name; every label extends its parent
/// as `keccak256(parent || keccak256(label))`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Node(pub [u8; 32]);

impl Node {
    pub const ROOT: Node = Node([0u8; 32]);

    /// Hash of `label` placed directly under `self`.
    pub fn child(&self, label: &[u8]) -> Node {
        let label_hash = keccak256(label);
        Node(keccak256_concat(&[&self.0, &label_hash]))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node(0x{})", hex::encode(self.0))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for Node {
    fn from(value: [u8; 32]) -> Self {
        Node(value)
    }
}

/// Four-byte function selector.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selector(pub [u8; 4]);

impl Selector {
    /// Selector of a canonical function signature such as `text(bytes32,string)`.
    pub fn from_signature(signature: &str) -> Self {
        let digest = keccak256(signature.as_bytes());
        Selector([digest[0], digest[1], digest[2], digest[3]])
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Selector(0x{})", hex::encode(self.0))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}
