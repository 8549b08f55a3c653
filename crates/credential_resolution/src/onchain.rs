//! Text-record credential resolver answering from local state

use crate::errors::*;
use crate::protocol::Outcome;
use crate::resolver::{CredentialResolver, InterfaceId, ResolverMetadata};
use namecred_dns_wire::WireName;
use namecred_types::Address;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolverEvent {
    KeyUpdated {
        identifier: String,
        key: String,
        value: String,
    },
}

/// Resolver holding `(identifier, key) → value` records set by its owner.
///
/// Missing records resolve to the empty string.
#[derive(Debug, Clone)]
pub struct TextRecordResolver {
    address: Address,
    owner: Address,
    records: Arc<RwLock<HashMap<(WireName, String), String>>>,
    events: Arc<RwLock<Vec<ResolverEvent>>>,
}

impl TextRecordResolver {
    pub fn new(address: Address, owner: Address) -> Self {
        Self {
            address,
            owner,
            records: Arc::new(RwLock::new(HashMap::new())),
            events: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn set_credential(
        &self,
        caller: &Address,
        identifier: &WireName,
        key: &str,
        value: &str,
    ) -> Result<()> {
        if *caller != self.owner {
            return Err(ResolutionError::NotResolverOwner {
                resolver: self.address,
                caller: *caller,
            });
        }

        self.records
            .write()
            .insert((identifier.clone(), key.to_string()), value.to_string());
        info!(identifier = %identifier, key, "credential updated");
        self.events.write().push(ResolverEvent::KeyUpdated {
            identifier: identifier.to_dotted(),
            key: key.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    pub fn events(&self) -> Vec<ResolverEvent> {
        self.events.read().clone()
    }
}

impl CredentialResolver for TextRecordResolver {
    fn address(&self) -> Address {
        self.address
    }

    fn credential(&self, identifier: &WireName, key: &str) -> Outcome<String> {
        let value = self
            .records
            .read()
            .get(&(identifier.clone(), key.to_string()))
            .cloned()
            .unwrap_or_default();
        Outcome::Done(value)
    }

    fn supports_interface(&self, interface: InterfaceId) -> bool {
        matches!(
            interface,
            InterfaceId::Erc165 | InterfaceId::CredentialResolver | InterfaceId::Metadata
        )
    }

    fn metadata(&self) -> ResolverMetadata {
        ResolverMetadata {
            name: "text-records".to_string(),
            credential_key: None,
            remote_target: None,
            gateway_urls: Vec::new(),
        }
    }
}
