//! Routing contract
//!
//! Entry point of resolution for one parent naming scope. Owns the
//! namespace → resolver binding table, extracts the identifier from the
//! queried name, picks a resolver for the key and relays the remote-read
//! protocol so that callers only ever talk to the router.

use crate::errors::*;
use crate::matcher::select_resolver_by;
use crate::protocol::Outcome;
use crate::resolver::{CredentialResolver, InterfaceId, ResolverDirectory};
use namecred_dns_wire::{IdentifierExtractor, WireName};
use namecred_gateway::{GatewayResponse, OffchainLookup};
use namecred_namespace_registry::{namespace_node, NamespaceEntry, NamespaceRegistry};
use namecred_types::{decode_text_args, encode_string, split_selector, Address, Node, Selector, TEXT_SELECTOR};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Signature of the router's success callback.
pub const RESOLVE_CALLBACK_SIGNATURE: &str = "resolveCallback(bytes,bytes)";

/// Binding changes observed on the router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouterEvent {
    ResolverRegistered { node: Node, resolver: Address },
    ResolverRemoved { node: Node },
}

/// State carried through a suspended call in the lookup's `extra_data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CallContext {
    resolver: Address,
    extra_data: Vec<u8>,
}

/// Resolver chosen by the owner of one registration of a namespace.
///
/// A binding only answers while the registry entry still has the same owner
/// and registration time; the zero resolver is a recorded removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Binding {
    resolver: Address,
    owner: Address,
    registered_at: u64,
}

impl Binding {
    fn matches(&self, entry: &NamespaceEntry) -> bool {
        self.owner == entry.owner && self.registered_at == entry.registered_at
    }
}

#[derive(Debug)]
pub struct Router {
    address: Address,
    extractor: IdentifierExtractor,
    registry: Arc<NamespaceRegistry>,
    directory: ResolverDirectory,
    /// Namespace hash → binding
    bindings: Arc<RwLock<HashMap<Node, Binding>>>,
    events: Arc<RwLock<Vec<RouterEvent>>>,
}

impl Router {
    pub fn new(
        address: Address,
        extractor: IdentifierExtractor,
        registry: Arc<NamespaceRegistry>,
        directory: ResolverDirectory,
    ) -> Self {
        Self {
            address,
            extractor,
            registry,
            directory,
            bindings: Arc::new(RwLock::new(HashMap::new())),
            events: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn callback_selector(&self) -> Selector {
        Selector::from_signature(RESOLVE_CALLBACK_SIGNATURE)
    }

    pub fn registry(&self) -> &Arc<NamespaceRegistry> {
        &self.registry
    }

    pub fn directory(&self) -> &ResolverDirectory {
        &self.directory
    }

    /// Bind `namespace` to `resolver`; the zero address removes the binding.
    ///
    /// Only the current owner of an unexpired namespace may do this.
    pub fn register_resolver(&self, caller: &Address, namespace: &str, resolver: Address) -> Result<()> {
        let node = namespace_node(namespace)?;
        let entry = self.registry.ensure_authorized(caller, &node)?;
        self.bindings.write().insert(
            node,
            Binding {
                resolver,
                owner: entry.owner,
                registered_at: entry.registered_at,
            },
        );

        let event = if resolver.is_zero() {
            info!(namespace, "credential resolver removed");
            RouterEvent::ResolverRemoved { node }
        } else {
            info!(namespace, resolver = %resolver, "credential resolver registered");
            RouterEvent::ResolverRegistered { node, resolver }
        };
        self.events.write().push(event);
        Ok(())
    }

    /// Resolver for the current registration of `namespace`, regardless of
    /// expiry.
    ///
    /// A binding made under an earlier owner or registration is ignored in
    /// favour of the resolver revealed with the current registration.
    pub fn binding(&self, namespace: &str) -> Result<Option<Address>> {
        let node = namespace_node(namespace)?;
        Ok(self
            .registry
            .entry(&node)
            .and_then(|entry| self.current_resolver(&node, &entry)))
    }

    /// Resolver answering `key`, or zero when no active namespace matches.
    pub fn resolver_for_key(&self, key: &str) -> Address {
        let now = self.registry.now();
        select_resolver_by(key, |node| {
            let entry = self.registry.entry(node).filter(|entry| !entry.is_expired(now))?;
            self.current_resolver(node, &entry)
        })
    }

    /// Wildcard resolution of `name` for a `text(bytes32,string)` call.
    pub fn resolve(&self, name: &[u8], call_data: &[u8]) -> Outcome<Vec<u8>> {
        let (identifier, key) = match self.decode_call(name, call_data) {
            Ok(decoded) => decoded,
            Err(err) => return Outcome::Failed(err),
        };

        let resolver_address = self.resolver_for_key(&key);
        if resolver_address.is_zero() {
            warn!(key = %key, "no credential resolver for key");
            return Outcome::Done(encode_string(""));
        }
        let Some(resolver) = self.directory.get(&resolver_address) else {
            warn!(key = %key, resolver = %resolver_address, "no resolver deployed at bound address");
            return Outcome::Done(encode_string(""));
        };

        debug!(
            identifier = %identifier,
            key = %key,
            resolver = %resolver_address,
            "dispatching credential lookup"
        );
        let outcome = resolver.credential(&identifier, &key);
        self.relay(resolver_address, outcome)
    }

    /// Success callback: hand the agent response to the resolver that raised
    /// the lookup and encode its answer as if returned directly.
    pub fn resolve_callback(&self, response: GatewayResponse, extra_data: &[u8]) -> Outcome<Vec<u8>> {
        let (context, resolver) = match self.open_context(extra_data) {
            Ok(opened) => opened,
            Err(err) => return Outcome::Failed(err),
        };
        let outcome = resolver.credential_callback(response, &context.extra_data);
        self.relay(context.resolver, outcome)
    }

    /// Failure callback: the resolver re-raises the agent's payload.
    pub fn resolve_failure(&self, payload: Vec<u8>, extra_data: &[u8]) -> Outcome<Vec<u8>> {
        match self.open_context(extra_data) {
            Ok((context, resolver)) => {
                Outcome::Failed(resolver.credential_failure(payload, &context.extra_data))
            }
            Err(err) => Outcome::Failed(err),
        }
    }

    pub fn supports_interface(&self, interface: InterfaceId) -> bool {
        matches!(
            interface,
            InterfaceId::Erc165
                | InterfaceId::ExtendedResolver
                | InterfaceId::TextResolver
                | InterfaceId::RemoteRead
        )
    }

    pub fn events(&self) -> Vec<RouterEvent> {
        self.events.read().clone()
    }

    fn current_resolver(&self, node: &Node, entry: &NamespaceEntry) -> Option<Address> {
        let resolver = match self.bindings.read().get(node) {
            Some(binding) if binding.matches(entry) => binding.resolver,
            Some(_) => {
                debug!(node = %node, owner = %entry.owner, "ignoring binding from a previous registration");
                entry.resolver
            }
            None => entry.resolver,
        };
        Some(resolver).filter(|resolver| !resolver.is_zero())
    }

    fn decode_call(&self, name: &[u8], call_data: &[u8]) -> Result<(WireName, String)> {
        let (selector, args) = split_selector(call_data)?;
        if selector != TEXT_SELECTOR {
            return Err(ResolutionError::UnsupportedOperation {
                operation: selector.to_string(),
            });
        }
        let (_, key) = decode_text_args(args)?;
        let identifier = self.extractor.extract(name)?;
        Ok((identifier, key))
    }

    /// Encode a finished answer, or re-address a resolver's lookup so that
    /// the router is its sender and callback target.
    fn relay(&self, resolver: Address, outcome: Outcome<String>) -> Outcome<Vec<u8>> {
        match outcome {
            Outcome::Done(value) => Outcome::Done(encode_string(&value)),
            Outcome::Failed(err) => Outcome::Failed(err),
            Outcome::Suspend(inner) => {
                let context = CallContext {
                    resolver,
                    extra_data: inner.extra_data,
                };
                match bincode::serialize(&context) {
                    Ok(extra_data) => {
                        debug!(resolver = %resolver, urls = inner.urls.len(), "suspending for off-chain lookup");
                        Outcome::Suspend(OffchainLookup {
                            sender: self.address,
                            urls: inner.urls,
                            request: inner.request,
                            callback: self.callback_selector(),
                            extra_data,
                        })
                    }
                    Err(err) => Outcome::Failed(ResolutionError::InvalidExtraData(err.to_string())),
                }
            }
        }
    }

    fn open_context(&self, extra_data: &[u8]) -> Result<(CallContext, Arc<dyn CredentialResolver>)> {
        let context: CallContext = bincode::deserialize(extra_data)
            .map_err(|err| ResolutionError::InvalidExtraData(err.to_string()))?;
        let resolver = self
            .directory
            .get(&context.resolver)
            .ok_or(ResolutionError::UnknownResolver(context.resolver))?;
        Ok((context, resolver))
    }
}
