//! Off-chain agent boundary and an in-memory reference agent

use crate::errors::*;
use crate::proof::{leaf_hash, merkle_path, merkle_root, GatewayResponse, StorageProof};
use crate::request::{GatewayRequest, StorageReader};
use async_trait::async_trait;
use namecred_types::Address;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Off-chain agent answering storage-read requests.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn fetch(
        &self,
        urls: &[String],
        request: &GatewayRequest,
    ) -> std::result::Result<GatewayResponse, GatewayFailure>;
}

/// Point-in-time contract storage committed to by a Merkle root.
#[derive(Debug, Clone, Default)]
pub struct StateSnapshot {
    slots: BTreeMap<(Address, [u8; 32]), Vec<u8>>,
}

impl StateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, target: Address, slot: [u8; 32], value: impl Into<Vec<u8>>) {
        self.slots.insert((target, slot), value.into());
    }

    pub fn remove(&mut self, target: &Address, slot: &[u8; 32]) -> Option<Vec<u8>> {
        self.slots.remove(&(*target, *slot))
    }

    pub fn get(&self, target: &Address, slot: &[u8; 32]) -> Option<&Vec<u8>> {
        self.slots.get(&(*target, *slot))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn root(&self) -> [u8; 32] {
        merkle_root(&self.leaves())
    }

    /// Proof for one slot, `None` when the slot holds no value.
    pub fn prove(&self, target: &Address, slot: &[u8; 32]) -> Option<StorageProof> {
        let key = (*target, *slot);
        let leaf_index = self.slots.keys().position(|k| *k == key)?;
        let value = self.slots.get(&key)?.clone();
        let path = merkle_path(&self.leaves(), leaf_index)?;
        Some(StorageProof {
            target: *target,
            slot: *slot,
            value,
            leaf_index,
            path,
        })
    }

    /// Execute `request` and prove every slot it reads.
    pub fn answer(&self, request: &GatewayRequest) -> Result<GatewayResponse> {
        let recorder = ProvingReader {
            snapshot: self,
            proofs: RwLock::new(Vec::new()),
        };
        request.execute(&recorder)?;
        Ok(GatewayResponse {
            state_root: self.root(),
            proofs: recorder.proofs.into_inner(),
        })
    }

    fn leaves(&self) -> Vec<[u8; 32]> {
        self.slots
            .iter()
            .map(|((target, slot), value)| leaf_hash(target, slot, value))
            .collect()
    }
}

struct ProvingReader<'a> {
    snapshot: &'a StateSnapshot,
    proofs: RwLock<Vec<StorageProof>>,
}

impl StorageReader for ProvingReader<'_> {
    type Error = GatewayError;

    fn read_slot(&self, target: &Address, slot: &[u8; 32]) -> Result<Vec<u8>> {
        let proof = self
            .snapshot
            .prove(target, slot)
            .ok_or_else(|| GatewayError::slot_unavailable(target, slot))?;
        let value = proof.value.clone();
        self.proofs.write().push(proof);
        Ok(value)
    }
}

/// Reference agent serving a shared [`StateSnapshot`].
///
/// Failures are reported as a [`GatewayFailure`] whose payload is the error
/// message, the way a remote agent returns an error body.
#[derive(Debug, Clone, Default)]
pub struct LocalGateway {
    snapshot: Arc<RwLock<StateSnapshot>>,
    served: Arc<AtomicUsize>,
}

impl LocalGateway {
    pub fn new(snapshot: StateSnapshot) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(snapshot)),
            served: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn snapshot(&self) -> Arc<RwLock<StateSnapshot>> {
        Arc::clone(&self.snapshot)
    }

    pub fn root(&self) -> [u8; 32] {
        self.snapshot.read().root()
    }

    /// Number of requests answered so far, failed or not.
    pub fn requests_served(&self) -> usize {
        self.served.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Gateway for LocalGateway {
    async fn fetch(
        &self,
        urls: &[String],
        request: &GatewayRequest,
    ) -> std::result::Result<GatewayResponse, GatewayFailure> {
        self.served.fetch_add(1, Ordering::Relaxed);
        let answer = self.snapshot.read().answer(request);
        match answer {
            Ok(response) => {
                debug!(urls = ?urls, proofs = response.proofs.len(), "local gateway answered");
                Ok(response)
            }
            Err(err) => {
                warn!(error = %err, "local gateway failed request");
                Err(GatewayFailure::new(err.to_string().into_bytes()))
            }
        }
    }
}
