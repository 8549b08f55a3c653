//! Credential resolver capability and interface discovery

use crate::errors::ResolutionError;
use crate::protocol::Outcome;
use namecred_dns_wire::WireName;
use namecred_gateway::GatewayResponse;
use namecred_types::{Address, Selector};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Optional protocols a component may implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterfaceId {
    /// Interface discovery itself
    Erc165,
    /// `credential(identifier, key)`
    CredentialResolver,
    /// Wildcard `resolve(name, data)`
    ExtendedResolver,
    /// `text(node, key)`
    TextResolver,
    /// Suspend/resume through off-chain lookups
    RemoteRead,
    /// `metadata()`
    Metadata,
}

impl InterfaceId {
    pub fn signature(&self) -> &'static str {
        match self {
            InterfaceId::Erc165 => "supportsInterface(bytes4)",
            InterfaceId::CredentialResolver => "credential(bytes,string)",
            InterfaceId::ExtendedResolver => "resolve(bytes,bytes)",
            InterfaceId::TextResolver => "text(bytes32,string)",
            InterfaceId::RemoteRead => "OffchainLookup(address,string[],bytes,bytes4,bytes)",
            InterfaceId::Metadata => "metadata()",
        }
    }

    pub fn selector(&self) -> Selector {
        Selector::from_signature(self.signature())
    }
}

/// Descriptive information a resolver publishes about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverMetadata {
    pub name: String,
    /// Key this resolver answers, `None` for any key
    pub credential_key: Option<String>,
    /// Remote contract read for off-chain resolvers
    pub remote_target: Option<Address>,
    pub gateway_urls: Vec<String>,
}

/// Component answering `credential(identifier, key)` lookups.
///
/// Implementations that read off-chain data answer with
/// [`Outcome::Suspend`] and finish in [`CredentialResolver::credential_callback`].
pub trait CredentialResolver: Send + Sync {
    /// Address this resolver is deployed at.
    fn address(&self) -> Address;

    fn credential(&self, identifier: &WireName, key: &str) -> Outcome<String>;

    /// Success callback for a lookup raised by [`CredentialResolver::credential`].
    fn credential_callback(&self, response: GatewayResponse, extra_data: &[u8]) -> Outcome<String> {
        let _ = (response, extra_data);
        Outcome::Failed(ResolutionError::UnsupportedOperation {
            operation: "credential_callback".to_string(),
        })
    }

    /// Failure callback; re-raises the agent's payload unchanged.
    fn credential_failure(&self, payload: Vec<u8>, extra_data: &[u8]) -> ResolutionError {
        let _ = extra_data;
        ResolutionError::RemoteFetchFailed { payload }
    }

    fn supports_interface(&self, interface: InterfaceId) -> bool;

    fn metadata(&self) -> ResolverMetadata;
}

impl fmt::Debug for dyn CredentialResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("address", &self.address())
            .finish()
    }
}

/// Resolver implementations by deployment address.
#[derive(Debug, Clone, Default)]
pub struct ResolverDirectory {
    resolvers: Arc<RwLock<HashMap<Address, Arc<dyn CredentialResolver>>>>,
}

impl ResolverDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `resolver` reachable at its address, replacing any previous one.
    pub fn deploy(&self, resolver: Arc<dyn CredentialResolver>) -> Address {
        let address = resolver.address();
        self.resolvers.write().insert(address, resolver);
        address
    }

    pub fn get(&self, address: &Address) -> Option<Arc<dyn CredentialResolver>> {
        self.resolvers.read().get(address).cloned()
    }

    pub fn len(&self) -> usize {
        self.resolvers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Address);

    impl CredentialResolver for Fixed {
        fn address(&self) -> Address {
            self.0
        }

        fn credential(&self, _identifier: &WireName, key: &str) -> Outcome<String> {
            Outcome::Done(key.to_uppercase())
        }

        fn supports_interface(&self, interface: InterfaceId) -> bool {
            matches!(interface, InterfaceId::Erc165 | InterfaceId::CredentialResolver)
        }

        fn metadata(&self) -> ResolverMetadata {
            ResolverMetadata {
                name: "fixed".into(),
                credential_key: None,
                remote_target: None,
                gateway_urls: Vec::new(),
            }
        }
    }

    #[test]
    fn interface_selectors() {
        assert_eq!(InterfaceId::Erc165.selector().0, [0x01, 0xff, 0xc9, 0xa7]);
        assert_eq!(InterfaceId::TextResolver.selector().0, [0x59, 0xd1, 0xd4, 0x3c]);
        assert_eq!(InterfaceId::ExtendedResolver.selector().0, [0x90, 0x61, 0xb9, 0x23]);
    }

    #[test]
    fn default_callbacks() {
        let resolver = Fixed(Address::repeat_byte(1));
        assert!(matches!(
            resolver.credential_callback(
                GatewayResponse {
                    state_root: [0u8; 32],
                    proofs: Vec::new()
                },
                &[]
            ),
            Outcome::Failed(ResolutionError::UnsupportedOperation { .. })
        ));
        assert_eq!(
            resolver.credential_failure(b"boom".to_vec(), &[]),
            ResolutionError::RemoteFetchFailed {
                payload: b"boom".to_vec()
            }
        );
    }

    #[test]
    fn directory_deploys_by_address() {
        let directory = ResolverDirectory::new();
        let address = directory.deploy(Arc::new(Fixed(Address::repeat_byte(7))));
        assert_eq!(address, Address::repeat_byte(7));
        assert_eq!(directory.len(), 1);
        let resolver = directory.get(&address).unwrap();
        assert_eq!(
            resolver.credential(&WireName::root(), "k"),
            Outcome::Done("K".to_string())
        );
        assert!(directory.get(&Address::ZERO).is_none());
    }
}
