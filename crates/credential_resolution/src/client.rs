//! Async driver for the remote-read protocol
//!
//! Plays the caller's infrastructure role: it calls the router, and each
//! time the router suspends it forwards the lookup to the gateway and
//! resumes through the matching callback until the call finishes.

use crate::config::ResolutionConfig;
use crate::errors::*;
use crate::protocol::Outcome;
use crate::router::Router;
use futures::future::join_all;
use namecred_dns_wire::WireName;
use namecred_gateway::{Gateway, GatewayFailure, GatewayResponse, OffchainLookup};
use namecred_types::{decode_string, encode_text_call, Node};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default bound on round trips per call.
pub const DEFAULT_MAX_ROUND_TRIPS: usize = 4;

pub struct ResolutionClient {
    router: Arc<Router>,
    gateway: Arc<dyn Gateway>,
    max_round_trips: usize,
    timeout: Option<Duration>,
}

impl ResolutionClient {
    pub fn new(router: Arc<Router>, gateway: Arc<dyn Gateway>) -> Self {
        Self {
            router,
            gateway,
            max_round_trips: DEFAULT_MAX_ROUND_TRIPS,
            timeout: None,
        }
    }

    pub fn from_config(router: Arc<Router>, gateway: Arc<dyn Gateway>, config: &ResolutionConfig) -> Self {
        let client = Self::new(router, gateway).with_max_round_trips(config.max_round_trips);
        match config.gateway_timeout_ms {
            Some(ms) => client.with_timeout(Duration::from_millis(ms)),
            None => client,
        }
    }

    pub fn with_max_round_trips(mut self, max_round_trips: usize) -> Self {
        self.max_round_trips = max_round_trips;
        self
    }

    /// Bound each gateway fetch. Without it an unresponsive agent stalls
    /// the call indefinitely.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Resolve the text credential `key` for wire name `name`.
    pub async fn resolve_text(&self, name: &[u8], key: &str) -> Result<String> {
        // Malformed names still reach the router, which reports them.
        let node = WireName::parse(name.to_vec())
            .map(|wire| wire.namehash())
            .unwrap_or(Node::ROOT);
        let encoded = self.resolve(name, &encode_text_call(&node, key)).await?;
        Ok(decode_string(&encoded)?)
    }

    /// Drive one call to completion.
    pub async fn resolve(&self, name: &[u8], call_data: &[u8]) -> Result<Vec<u8>> {
        let mut outcome = self.router.resolve(name, call_data);
        let mut round_trips = 0usize;

        loop {
            let lookup = match outcome {
                Outcome::Done(value) => return Ok(value),
                Outcome::Failed(err) => {
                    debug!(error = %err, round_trips, "resolution failed");
                    return Err(err);
                }
                Outcome::Suspend(lookup) => lookup,
            };

            self.check_lookup(&lookup)?;
            if round_trips >= self.max_round_trips {
                warn!(limit = self.max_round_trips, "round trip limit reached");
                return Err(ResolutionError::RoundTripLimit {
                    limit: self.max_round_trips,
                });
            }
            round_trips += 1;

            outcome = match self.fetch(&lookup).await? {
                Ok(response) => {
                    debug!(round_trips, proofs = response.proofs.len(), "resuming with gateway response");
                    self.router.resolve_callback(response, &lookup.extra_data)
                }
                Err(failure) => {
                    info!(round_trips, payload_len = failure.payload.len(), "gateway reported failure");
                    self.router.resolve_failure(failure.payload, &lookup.extra_data)
                }
            };
        }
    }

    /// Resolve many `(name, key)` queries concurrently.
    pub async fn resolve_batch(&self, queries: &[(Vec<u8>, String)]) -> Vec<Result<String>> {
        let futures = queries
            .iter()
            .map(|(name, key)| self.resolve_text(name, key));
        join_all(futures).await
    }

    fn check_lookup(&self, lookup: &OffchainLookup) -> Result<()> {
        if lookup.sender != self.router.address() {
            return Err(ResolutionError::UnexpectedSender {
                expected: self.router.address(),
                actual: lookup.sender,
            });
        }
        if lookup.callback != self.router.callback_selector() {
            return Err(ResolutionError::UnsupportedOperation {
                operation: format!("callback {}", lookup.callback),
            });
        }
        Ok(())
    }

    async fn fetch(
        &self,
        lookup: &OffchainLookup,
    ) -> Result<std::result::Result<GatewayResponse, GatewayFailure>> {
        let fetch = self.gateway.fetch(&lookup.urls, &lookup.request);
        match self.timeout {
            None => Ok(fetch.await),
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .map_err(|_| ResolutionError::Timeout {
                    after_ms: limit.as_millis() as u64,
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use namecred_dns_wire::IdentifierExtractor;
    use namecred_gateway::{GatewayRequest, LocalGateway};
    use namecred_namespace_registry::NamespaceRegistry;
    use crate::resolver::ResolverDirectory;
    use namecred_types::{Address, Selector};

    fn client() -> ResolutionClient {
        let router = Router::new(
            Address::repeat_byte(0xf0),
            IdentifierExtractor::new("name", "eth").unwrap(),
            Arc::new(NamespaceRegistry::default()),
            ResolverDirectory::new(),
        );
        ResolutionClient::new(Arc::new(router), Arc::new(LocalGateway::default()))
    }

    fn lookup(client: &ResolutionClient) -> OffchainLookup {
        OffchainLookup {
            sender: client.router.address(),
            urls: Vec::new(),
            request: GatewayRequest::new(0),
            callback: client.router.callback_selector(),
            extra_data: Vec::new(),
        }
    }

    #[test]
    fn lookups_must_come_from_the_router() {
        let client = client();
        assert!(client.check_lookup(&lookup(&client)).is_ok());

        let mut forged = lookup(&client);
        forged.sender = Address::repeat_byte(0x66);
        assert_eq!(
            client.check_lookup(&forged),
            Err(ResolutionError::UnexpectedSender {
                expected: Address::repeat_byte(0xf0),
                actual: Address::repeat_byte(0x66),
            })
        );

        let mut wrong_callback = lookup(&client);
        wrong_callback.callback = Selector([0, 0, 0, 0]);
        assert!(matches!(
            client.check_lookup(&wrong_callback),
            Err(ResolutionError::UnsupportedOperation { .. })
        ));
    }

    #[tokio::test]
    async fn empty_context_is_rejected_on_resume() {
        let client = client();
        let fetched = client.fetch(&lookup(&client)).await.unwrap();
        let response = fetched.expect("empty program needs no storage");
        assert!(matches!(
            client.router.resolve_callback(response, &[]),
            Outcome::Failed(ResolutionError::InvalidExtraData(_))
        ));
    }
}
