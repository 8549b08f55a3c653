//! Off-chain credential resolvers
//!
//! Both resolvers answer a single configured credential key by reading a
//! numeric value from a remote contract's storage. They share an
//! [`OffchainFetcher`] that builds the lookup and verifies the agent's answer.

use crate::errors::*;
use crate::protocol::Outcome;
use crate::resolver::{CredentialResolver, InterfaceId, ResolverMetadata};
use namecred_dns_wire::WireName;
use namecred_gateway::{decode_uint_decimal, GatewayRequest, GatewayResponse, OffchainLookup, ProofVerifier};
use namecred_types::{Address, Selector};
use std::sync::Arc;
use tracing::debug;

/// Signature of the resolvers' success callback.
pub const CREDENTIAL_CALLBACK_SIGNATURE: &str = "credentialCallback(bytes,bytes)";

/// Remote storage location plus the verifier trusted for it.
#[derive(Debug, Clone)]
pub struct OffchainFetcher {
    target: Address,
    base_slot: u64,
    urls: Vec<String>,
    verifier: Arc<dyn ProofVerifier>,
}

impl OffchainFetcher {
    pub fn new(
        target: Address,
        base_slot: u64,
        urls: Vec<String>,
        verifier: Arc<dyn ProofVerifier>,
    ) -> Self {
        Self {
            target,
            base_slot,
            urls,
            verifier,
        }
    }

    pub fn target(&self) -> Address {
        self.target
    }

    pub fn base_slot(&self) -> u64 {
        self.base_slot
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Suspend with `request`; the request itself travels in `extra_data`
    /// so the callback re-verifies exactly what was asked for.
    pub fn suspend(&self, sender: Address, request: GatewayRequest) -> Outcome<String> {
        match bincode::serialize(&request) {
            Ok(extra_data) => Outcome::Suspend(OffchainLookup {
                sender,
                urls: self.urls.clone(),
                request,
                callback: Selector::from_signature(CREDENTIAL_CALLBACK_SIGNATURE),
                extra_data,
            }),
            Err(err) => Outcome::Failed(ResolutionError::InvalidExtraData(err.to_string())),
        }
    }

    /// Verify `response` and return the first output, which must be non-empty.
    pub fn verified_value(&self, response: &GatewayResponse, extra_data: &[u8]) -> Result<Vec<u8>> {
        let request: GatewayRequest = bincode::deserialize(extra_data)
            .map_err(|err| ResolutionError::InvalidExtraData(err.to_string()))?;
        let values = self.verifier.verify(&request, response)?;
        match values.into_iter().next() {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(ResolutionError::EmptyResult),
        }
    }

    /// Verified first output rendered as a decimal integer.
    pub fn verified_decimal(&self, response: &GatewayResponse, extra_data: &[u8]) -> Result<String> {
        let value = self.verified_value(response, extra_data)?;
        Ok(decode_uint_decimal(&value)?)
    }

    fn metadata(&self, name: &str, key: &str) -> ResolverMetadata {
        ResolverMetadata {
            name: name.to_string(),
            credential_key: Some(key.to_string()),
            remote_target: Some(self.target),
            gateway_urls: self.urls.clone(),
        }
    }
}

fn supports_remote(interface: InterfaceId) -> bool {
    matches!(
        interface,
        InterfaceId::Erc165
            | InterfaceId::CredentialResolver
            | InterfaceId::RemoteRead
            | InterfaceId::Metadata
    )
}

/// Reads `base_slot[namehash(identifier)]` for name identifiers.
#[derive(Debug, Clone)]
pub struct OffchainNameResolver {
    address: Address,
    key: String,
    fetcher: OffchainFetcher,
}

impl OffchainNameResolver {
    pub fn new(address: Address, key: impl Into<String>, fetcher: OffchainFetcher) -> Self {
        Self {
            address,
            key: key.into(),
            fetcher,
        }
    }

    pub fn request_for(&self, identifier: &WireName) -> GatewayRequest {
        GatewayRequest::by_node(self.fetcher.target, self.fetcher.base_slot, &identifier.namehash())
    }
}

impl CredentialResolver for OffchainNameResolver {
    fn address(&self) -> Address {
        self.address
    }

    fn credential(&self, identifier: &WireName, key: &str) -> Outcome<String> {
        if key != self.key {
            return Outcome::Done(String::new());
        }
        debug!(identifier = %identifier, key, "name credential needs remote read");
        self.fetcher.suspend(self.address, self.request_for(identifier))
    }

    fn credential_callback(&self, response: GatewayResponse, extra_data: &[u8]) -> Outcome<String> {
        self.fetcher.verified_decimal(&response, extra_data).into()
    }

    fn supports_interface(&self, interface: InterfaceId) -> bool {
        supports_remote(interface)
    }

    fn metadata(&self) -> ResolverMetadata {
        self.fetcher.metadata("offchain-name", &self.key)
    }
}

/// Reads `base_slot[address][coin_type]` for identifiers of the form
/// `<40 hex address>.<hex coin type>`.
#[derive(Debug, Clone)]
pub struct OffchainAddressResolver {
    address: Address,
    key: String,
    fetcher: OffchainFetcher,
}

impl OffchainAddressResolver {
    pub fn new(address: Address, key: impl Into<String>, fetcher: OffchainFetcher) -> Self {
        Self {
            address,
            key: key.into(),
            fetcher,
        }
    }

    /// Split an identifier into the queried address and coin type.
    pub fn parse_identifier(identifier: &WireName) -> Result<(Address, u64)> {
        let invalid = |reason: String| ResolutionError::InvalidIdentifier { reason };
        let labels: Vec<&[u8]> = identifier.labels().collect();
        let [address_label, coin_label] = labels.as_slice() else {
            return Err(invalid(format!("expected 2 labels, found {}", labels.len())));
        };

        let address_text = std::str::from_utf8(address_label)
            .map_err(|_| invalid("address label is not UTF-8".to_string()))?;
        let address = Address::from_hex_loose(address_text).map_err(|e| invalid(e.to_string()))?;

        let coin_text = std::str::from_utf8(coin_label)
            .map_err(|_| invalid("coin type label is not UTF-8".to_string()))?;
        let coin_type =
            u64::from_str_radix(coin_text, 16).map_err(|e| invalid(format!("coin type: {e}")))?;

        Ok((address, coin_type))
    }

    pub fn request_for(&self, identifier: &WireName) -> Result<GatewayRequest> {
        let (address, coin_type) = Self::parse_identifier(identifier)?;
        Ok(GatewayRequest::by_address(
            self.fetcher.target,
            self.fetcher.base_slot,
            &address,
            coin_type,
        ))
    }
}

impl CredentialResolver for OffchainAddressResolver {
    fn address(&self) -> Address {
        self.address
    }

    fn credential(&self, identifier: &WireName, key: &str) -> Outcome<String> {
        if key != self.key {
            return Outcome::Done(String::new());
        }
        match self.request_for(identifier) {
            Ok(request) => {
                debug!(identifier = %identifier, key, "address credential needs remote read");
                self.fetcher.suspend(self.address, request)
            }
            Err(err) => Outcome::Failed(err),
        }
    }

    fn credential_callback(&self, response: GatewayResponse, extra_data: &[u8]) -> Outcome<String> {
        self.fetcher.verified_decimal(&response, extra_data).into()
    }

    fn supports_interface(&self, interface: InterfaceId) -> bool {
        supports_remote(interface)
    }

    fn metadata(&self) -> ResolverMetadata {
        self.fetcher.metadata("offchain-address", &self.key)
    }
}
