//! Shared fixtures for credential resolution integration tests.

#![allow(dead_code)]

use namecred_credential_resolution::*;
use namecred_dns_wire::{encode, IdentifierExtractor};
use namecred_gateway::{derive_slot, LocalGateway, MerkleStateVerifier, StateSnapshot};
use namecred_namespace_registry::{NamespaceRegistry, RegistryConfig, Reveal, Secret};
use namecred_types::{Address, ManualClock};
use std::sync::Arc;

pub const OWNER: Address = Address::repeat_byte(0x01);
pub const ROUTER: Address = Address::repeat_byte(0xf0);
pub const REMOTE_STORE: Address = Address::repeat_byte(0x77);
pub const HOLDER: Address = Address::repeat_byte(0xab);

pub const TEXT_RESOLVER: Address = Address::repeat_byte(0xa0);
pub const NAME_RESOLVER: Address = Address::repeat_byte(0xa1);
pub const ADDRESS_RESOLVER: Address = Address::repeat_byte(0xa2);

pub const NAME_SLOT: u64 = 4;
pub const ADDRESS_SLOT: u64 = 3;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn word(value: u64) -> Vec<u8> {
    let mut word = vec![0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Wire name `<identifier>.name.tag.eth`.
pub fn query_name(identifier: &str) -> Vec<u8> {
    encode(&format!("{identifier}.name.tag.eth"))
        .unwrap()
        .into_bytes()
}

/// Identifier of the address resolver for `HOLDER` on coin type 60.
pub fn holder_identifier() -> String {
    format!("{}.3c", hex::encode(HOLDER.as_bytes()))
}

pub fn admit(registry: &NamespaceRegistry, clock: &ManualClock, namespace: &str) {
    let reveal = Reveal {
        namespace: namespace.to_string(),
        owner: OWNER,
        secret: Secret::random(),
        resolver: Address::ZERO,
    };
    registry.commit(reveal.commitment()).unwrap();
    clock.advance(registry.config().min_commitment_age_secs);
    registry.register(reveal).unwrap();
}

/// Remote storage holding a star count for `alice.example` and a balance
/// for `HOLDER`.
pub fn remote_state() -> StateSnapshot {
    let mut snapshot = StateSnapshot::new();
    let alice = encode("alice.example").unwrap().namehash();
    snapshot.set(REMOTE_STORE, derive_slot(NAME_SLOT, &[alice.as_bytes()]), word(42));
    snapshot.set(
        REMOTE_STORE,
        derive_slot(ADDRESS_SLOT, &[&HOLDER.to_word(), &word(60)]),
        word(1_000_000_000),
    );
    snapshot
}

pub struct World {
    pub clock: ManualClock,
    pub router: Arc<Router>,
    pub gateway: Arc<LocalGateway>,
    pub text: Arc<TextRecordResolver>,
}

/// Registry with namespaces `notes` (text records), `stars` (off-chain by
/// name) and `wallet` (off-chain by address), each bound on the router.
pub fn world() -> World {
    world_with_verifier(None)
}

/// Like [`world`], but the off-chain resolvers trust `root` instead of the
/// gateway's actual state root when given.
pub fn world_with_verifier(root: Option<[u8; 32]>) -> World {
    init_tracing();
    let clock = ManualClock::new(1_700_000_000);
    let registry = Arc::new(
        NamespaceRegistry::new(RegistryConfig::default(), Arc::new(clock.clone())).unwrap(),
    );
    for namespace in ["notes", "stars", "wallet"] {
        admit(&registry, &clock, namespace);
    }

    let gateway = Arc::new(LocalGateway::new(remote_state()));
    let verifier = Arc::new(MerkleStateVerifier::with_root(root.unwrap_or(gateway.root())));
    let urls = vec!["https://gateway.invalid/{sender}/{data}".to_string()];

    let text = Arc::new(TextRecordResolver::new(TEXT_RESOLVER, OWNER));
    let directory = ResolverDirectory::new();
    directory.deploy(text.clone());
    directory.deploy(Arc::new(OffchainNameResolver::new(
        NAME_RESOLVER,
        "stars.count",
        OffchainFetcher::new(REMOTE_STORE, NAME_SLOT, urls.clone(), verifier.clone()),
    )));
    directory.deploy(Arc::new(OffchainAddressResolver::new(
        ADDRESS_RESOLVER,
        "wallet:balance",
        OffchainFetcher::new(REMOTE_STORE, ADDRESS_SLOT, urls, verifier),
    )));

    let router = Arc::new(Router::new(
        ROUTER,
        IdentifierExtractor::new("name", "eth").unwrap(),
        registry,
        directory,
    ));
    router.register_resolver(&OWNER, "notes", TEXT_RESOLVER).unwrap();
    router.register_resolver(&OWNER, "stars", NAME_RESOLVER).unwrap();
    router.register_resolver(&OWNER, "wallet", ADDRESS_RESOLVER).unwrap();

    World {
        clock,
        router,
        gateway,
        text,
    }
}

impl World {
    pub fn client(&self) -> ResolutionClient {
        ResolutionClient::new(self.router.clone(), self.gateway.clone())
    }
}
