//! Storage proofs and response verification
//!
//! Storage is committed to by a binary SHA-256 Merkle tree over the sorted
//! `(target, slot, value)` leaves; an odd node at the end of a level is
//! paired with itself.

use crate::errors::*;
use crate::request::{GatewayRequest, StorageReader};
use namecred_types::Address;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// One proven storage slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageProof {
    pub target: Address,
    pub slot: [u8; 32],
    pub value: Vec<u8>,
    pub leaf_index: usize,
    /// Sibling hashes from the leaf up to the root
    pub path: Vec<[u8; 32]>,
}

impl StorageProof {
    /// Whether the path leads from this slot's leaf to `root`.
    pub fn verify(&self, root: &[u8; 32]) -> bool {
        let mut current = leaf_hash(&self.target, &self.slot, &self.value);
        let mut index = self.leaf_index;

        for sibling in &self.path {
            current = if index % 2 == 0 {
                hash_pair(&current, sibling)
            } else {
                hash_pair(sibling, &current)
            };
            index /= 2;
        }

        index == 0 && current == *root
    }
}

/// Agent answer to a [`GatewayRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayResponse {
    pub state_root: [u8; 32],
    pub proofs: Vec<StorageProof>,
}

/// Checks a gateway response and yields the verified output values.
pub trait ProofVerifier: Send + Sync + std::fmt::Debug {
    fn verify(
        &self,
        request: &GatewayRequest,
        response: &GatewayResponse,
    ) -> std::result::Result<Vec<Vec<u8>>, VerificationError>;
}

/// Verifier accepting responses proven against a set of trusted state roots.
///
/// The request is re-executed on proven values only, so the agent cannot
/// substitute a different slot or invent outputs.
#[derive(Debug, Clone, Default)]
pub struct MerkleStateVerifier {
    trusted_roots: Arc<RwLock<HashSet<[u8; 32]>>>,
}

impl MerkleStateVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: [u8; 32]) -> Self {
        let verifier = Self::new();
        verifier.trust_root(root);
        verifier
    }

    pub fn trust_root(&self, root: [u8; 32]) {
        self.trusted_roots.write().insert(root);
    }

    pub fn revoke_root(&self, root: &[u8; 32]) -> bool {
        self.trusted_roots.write().remove(root)
    }

    pub fn is_trusted(&self, root: &[u8; 32]) -> bool {
        self.trusted_roots.read().contains(root)
    }
}

impl ProofVerifier for MerkleStateVerifier {
    fn verify(
        &self,
        request: &GatewayRequest,
        response: &GatewayResponse,
    ) -> std::result::Result<Vec<Vec<u8>>, VerificationError> {
        if !self.is_trusted(&response.state_root) {
            warn!(root = %hex::encode(response.state_root), "response against untrusted state root");
            return Err(VerificationError::UntrustedRoot(hex::encode(response.state_root)));
        }

        let reader = ProvenStorage {
            root: response.state_root,
            proofs: response
                .proofs
                .iter()
                .map(|proof| ((proof.target, proof.slot), proof))
                .collect(),
        };
        let values = request.execute(&reader)?;
        debug!(outputs = values.len(), proofs = response.proofs.len(), "gateway response verified");
        Ok(values)
    }
}

struct ProvenStorage<'a> {
    root: [u8; 32],
    proofs: HashMap<(Address, [u8; 32]), &'a StorageProof>,
}

impl StorageReader for ProvenStorage<'_> {
    type Error = VerificationError;

    fn read_slot(
        &self,
        target: &Address,
        slot: &[u8; 32],
    ) -> std::result::Result<Vec<u8>, VerificationError> {
        let proof = self
            .proofs
            .get(&(*target, *slot))
            .ok_or_else(|| VerificationError::MissingProof {
                target: *target,
                slot: hex::encode(slot),
            })?;
        if !proof.verify(&self.root) {
            return Err(VerificationError::InvalidProof {
                target: *target,
                slot: hex::encode(slot),
            });
        }
        Ok(proof.value.clone())
    }
}

pub fn leaf_hash(target: &Address, slot: &[u8; 32], value: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(target.as_bytes());
    hasher.update(slot);
    hasher.update(value);
    hasher.finalize().into()
}

fn hash_pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Root over `leaves`; all zeroes for an empty tree.
pub fn merkle_root(leaves: &[[u8; 32]]) -> [u8; 32] {
    let mut level = leaves.to_vec();
    if level.is_empty() {
        return [0u8; 32];
    }
    while level.len() > 1 {
        level = next_level(&level);
    }
    level[0]
}

/// Sibling path for the leaf at `index`, or `None` when out of range.
pub fn merkle_path(leaves: &[[u8; 32]], index: usize) -> Option<Vec<[u8; 32]>> {
    if index >= leaves.len() {
        return None;
    }

    let mut path = Vec::new();
    let mut level = leaves.to_vec();
    let mut index = index;
    while level.len() > 1 {
        let sibling = if index % 2 == 0 { index + 1 } else { index - 1 };
        path.push(*level.get(sibling).unwrap_or(&level[index]));
        level = next_level(&level);
        index /= 2;
    }
    Some(path)
}

fn next_level(level: &[[u8; 32]]) -> Vec<[u8; 32]> {
    level
        .chunks(2)
        .map(|pair| hash_pair(&pair[0], pair.get(1).unwrap_or(&pair[0])))
        .collect()
}
