//! Namespace Registry implementation
//!
//! Commit-reveal admission plus owner-gated mutation of admitted namespaces
//! (resolver rebinding, transfer, renewal, relinquishment).

use crate::errors::*;
use crate::types::*;
use namecred_types::{Address, Clock, Node, SystemClock};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Namespace Registry
///
/// Exclusively owns namespace entries and pending commitments. Other
/// components read it and route authorization checks through
/// [`NamespaceRegistry::ensure_authorized`].
#[derive(Debug)]
pub struct NamespaceRegistry {
    config: RegistryConfig,
    clock: Arc<dyn Clock>,
    /// Namespace hash → entry
    entries: Arc<RwLock<HashMap<Node, NamespaceEntry>>>,
    /// Commitment digest → submission time
    commitments: Arc<RwLock<HashMap<[u8; 32], u64>>>,
    /// Owner → namespaces
    owner_to_namespaces: Arc<RwLock<HashMap<Address, Vec<Node>>>>,
    events: Arc<RwLock<Vec<RegistryEvent>>>,
}

impl NamespaceRegistry {
    /// Create a registry with the given timing parameters and clock.
    pub fn new(config: RegistryConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            clock,
            entries: Arc::new(RwLock::new(HashMap::new())),
            commitments: Arc::new(RwLock::new(HashMap::new())),
            owner_to_namespaces: Arc::new(RwLock::new(HashMap::new())),
            events: Arc::new(RwLock::new(Vec::new())),
        })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Phase 1: record a commitment digest.
    ///
    /// A digest may only be submitted again once the previous submission is
    /// past `max_commitment_age_secs`. Commitments past that age can no
    /// longer be revealed and are dropped here.
    pub fn commit(&self, commitment: [u8; 32]) -> Result<()> {
        let now = self.now();
        let max_age = self.config.max_commitment_age_secs;
        {
            let mut commitments = self.commitments.write();
            commitments.retain(|_, submitted| submitted.saturating_add(max_age) >= now);
            if commitments.contains_key(&commitment) {
                return Err(NamespaceRegistryError::UnexpiredCommitmentExists);
            }
            commitments.insert(commitment, now);
        }

        debug!(commitment = %hex::encode(commitment), at = now, "commitment recorded");
        self.emit(RegistryEvent::CommitmentSubmitted { commitment, at: now });
        Ok(())
    }

    /// Phase 2: reveal the plaintext and admit the namespace.
    pub fn register(&self, reveal: Reveal) -> Result<Node> {
        let node = namespace_node(&reveal.namespace)?;
        let now = self.now();

        let mut entries = self.entries.write();
        if let Some(existing) = entries.get(&node) {
            if !existing.is_expired(now) {
                return Err(NamespaceRegistryError::NamespaceUnavailable {
                    namespace: reveal.namespace,
                });
            }
        }

        let commitment = reveal.commitment();
        {
            let mut commitments = self.commitments.write();
            let submitted = *commitments
                .get(&commitment)
                .ok_or(NamespaceRegistryError::CommitmentNotFound)?;

            let revealable_at = submitted.saturating_add(self.config.min_commitment_age_secs);
            if now < revealable_at {
                return Err(NamespaceRegistryError::CommitmentTooNew { revealable_at, now });
            }
            let expired_at = submitted.saturating_add(self.config.max_commitment_age_secs);
            if now > expired_at {
                commitments.remove(&commitment);
                return Err(NamespaceRegistryError::CommitmentTooOld { expired_at, now });
            }

            commitments.remove(&commitment);
        }

        let expires_at = now.saturating_add(self.config.registration_duration_secs);
        let entry = NamespaceEntry {
            namespace: reveal.namespace.clone(),
            owner: reveal.owner,
            resolver: reveal.resolver,
            registered_at: now,
            expires_at,
        };

        {
            let mut owners = self.owner_to_namespaces.write();
            if let Some(previous) = entries.insert(node, entry) {
                Self::unindex_owner(&mut owners, &previous.owner, &node);
            }
            owners.entry(reveal.owner).or_default().push(node);
        }
        drop(entries);

        info!(
            namespace = %reveal.namespace,
            owner = %reveal.owner,
            resolver = %reveal.resolver,
            expires_at,
            "namespace registered"
        );
        self.emit(RegistryEvent::NamespaceRegistered {
            namespace: reveal.namespace,
            node,
            owner: reveal.owner,
            resolver: reveal.resolver,
            expires_at,
        });

        Ok(node)
    }

    /// Rebind the resolver of a namespace. The zero address removes it.
    pub fn set_resolver(&self, caller: &Address, namespace: &str, resolver: Address) -> Result<()> {
        let node = namespace_node(namespace)?;
        self.mutate_owned(caller, &node, |entry| entry.resolver = resolver)?;

        if resolver.is_zero() {
            info!(namespace, "namespace resolver removed");
            self.emit(RegistryEvent::ResolverRemoved { node });
        } else {
            info!(namespace, resolver = %resolver, "namespace resolver updated");
            self.emit(RegistryEvent::ResolverUpdated { node, resolver });
        }
        Ok(())
    }

    /// Transfer ownership to `new_owner`.
    pub fn transfer(&self, caller: &Address, namespace: &str, new_owner: Address) -> Result<()> {
        let node = namespace_node(namespace)?;
        let now = self.now();
        {
            let mut entries = self.entries.write();
            Self::owned_mut(&mut entries, caller, &node, now)?.owner = new_owner;

            let mut owners = self.owner_to_namespaces.write();
            Self::unindex_owner(&mut owners, caller, &node);
            owners.entry(new_owner).or_default().push(node);
        }

        info!(namespace, from = %caller, to = %new_owner, "namespace transferred");
        self.emit(RegistryEvent::OwnershipTransferred {
            node,
            from: *caller,
            to: new_owner,
        });
        Ok(())
    }

    /// Extend the lifetime of an active namespace by one registration period.
    pub fn renew(&self, caller: &Address, namespace: &str) -> Result<u64> {
        let node = namespace_node(namespace)?;
        let now = self.now();
        let duration = self.config.registration_duration_secs;
        let mut expires_at = 0;
        self.mutate_owned(caller, &node, |entry| {
            entry.expires_at = entry.expires_at.max(now).saturating_add(duration);
            expires_at = entry.expires_at;
        })?;

        info!(namespace, expires_at, "namespace renewed");
        self.emit(RegistryEvent::NamespaceRenewed { node, expires_at });
        Ok(expires_at)
    }

    /// Give up a namespace; it becomes available for a new commit-reveal.
    pub fn relinquish(&self, caller: &Address, namespace: &str) -> Result<()> {
        let node = namespace_node(namespace)?;
        let now = self.now();
        {
            let mut entries = self.entries.write();
            Self::owned_mut(&mut entries, caller, &node, now)?;
            entries.remove(&node);
            Self::unindex_owner(&mut self.owner_to_namespaces.write(), caller, &node);
        }

        info!(namespace, owner = %caller, "namespace relinquished");
        self.emit(RegistryEvent::NamespaceRelinquished { node });
        Ok(())
    }

    /// Authorization and expiration check for state-mutating calls.
    pub fn ensure_authorized(&self, caller: &Address, node: &Node) -> Result<NamespaceEntry> {
        let entries = self.entries.read();
        let entry = entries
            .get(node)
            .ok_or_else(|| NamespaceRegistryError::NamespaceNotFound {
                namespace: node.to_string(),
            })?;
        Self::check_owned(entry, caller, self.now())?;
        Ok(entry.clone())
    }

    /// Entry for `node`, expired or not.
    pub fn entry(&self, node: &Node) -> Option<NamespaceEntry> {
        self.entries.read().get(node).cloned()
    }

    /// Entry for a namespace name, expired or not.
    pub fn get(&self, namespace: &str) -> Result<NamespaceEntry> {
        let node = namespace_node(namespace)?;
        self.entry(&node)
            .ok_or_else(|| NamespaceRegistryError::NamespaceNotFound {
                namespace: namespace.to_string(),
            })
    }

    /// Owner of an active namespace.
    pub fn owner_of(&self, namespace: &str) -> Result<Address> {
        Ok(self.active(namespace)?.owner)
    }

    /// Resolver of an active namespace (zero when unbound).
    pub fn resolver_of(&self, namespace: &str) -> Result<Address> {
        Ok(self.active(namespace)?.resolver)
    }

    pub fn is_active(&self, node: &Node) -> bool {
        let now = self.now();
        self.entries
            .read()
            .get(node)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Submission time of a pending commitment.
    pub fn commitment_submitted_at(&self, commitment: &[u8; 32]) -> Option<u64> {
        self.commitments.read().get(commitment).copied()
    }

    /// All namespaces currently indexed under `owner`.
    pub fn list_owner_namespaces(&self, owner: &Address) -> Vec<Node> {
        self.owner_to_namespaces
            .read()
            .get(owner)
            .cloned()
            .unwrap_or_default()
    }

    pub fn events(&self) -> Vec<RegistryEvent> {
        self.events.read().clone()
    }

    fn active(&self, namespace: &str) -> Result<NamespaceEntry> {
        let entry = self.get(namespace)?;
        if entry.is_expired(self.now()) {
            return Err(NamespaceRegistryError::Expired {
                namespace: namespace.to_string(),
                expires_at: entry.expires_at,
            });
        }
        Ok(entry)
    }

    fn check_owned(entry: &NamespaceEntry, caller: &Address, now: u64) -> Result<()> {
        if entry.owner != *caller {
            return Err(NamespaceRegistryError::Unauthorized {
                namespace: entry.namespace.clone(),
                caller: *caller,
            });
        }
        if entry.is_expired(now) {
            return Err(NamespaceRegistryError::Expired {
                namespace: entry.namespace.clone(),
                expires_at: entry.expires_at,
            });
        }
        Ok(())
    }

    fn mutate_owned(
        &self,
        caller: &Address,
        node: &Node,
        apply: impl FnOnce(&mut NamespaceEntry),
    ) -> Result<()> {
        let now = self.now();
        let mut entries = self.entries.write();
        apply(Self::owned_mut(&mut entries, caller, node, now)?);
        Ok(())
    }

    /// Entry for `node` if `caller` owns it and it is unexpired. Callers hold
    /// the entries write lock across the check and the mutation.
    fn owned_mut<'a>(
        entries: &'a mut HashMap<Node, NamespaceEntry>,
        caller: &Address,
        node: &Node,
        now: u64,
    ) -> Result<&'a mut NamespaceEntry> {
        let entry = entries
            .get_mut(node)
            .ok_or_else(|| NamespaceRegistryError::NamespaceNotFound {
                namespace: node.to_string(),
            })?;
        Self::check_owned(entry, caller, now)?;
        Ok(entry)
    }

    fn unindex_owner(owners: &mut HashMap<Address, Vec<Node>>, owner: &Address, node: &Node) {
        if let Some(list) = owners.get_mut(owner) {
            list.retain(|n| n != node);
            if list.is_empty() {
                owners.remove(owner);
            }
        }
    }

    fn emit(&self, event: RegistryEvent) {
        self.events.write().push(event);
    }
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        Self {
            config: RegistryConfig::default(),
            clock: Arc::new(SystemClock),
            entries: Arc::new(RwLock::new(HashMap::new())),
            commitments: Arc::new(RwLock::new(HashMap::new())),
            owner_to_namespaces: Arc::new(RwLock::new(HashMap::new())),
            events: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commitment::Secret;
    use namecred_types::ManualClock;

    const START: u64 = 1_700_000_000;

    fn setup() -> (NamespaceRegistry, ManualClock) {
        let clock = ManualClock::new(START);
        let registry = NamespaceRegistry::new(RegistryConfig::default(), Arc::new(clock.clone()))
            .expect("default config is valid");
        (registry, clock)
    }

    fn reveal(namespace: &str, owner: Address) -> Reveal {
        Reveal {
            namespace: namespace.to_string(),
            owner,
            secret: Secret([3u8; 32]),
            resolver: Address::repeat_byte(0xee),
        }
    }

    fn admit(registry: &NamespaceRegistry, clock: &ManualClock, reveal: Reveal) -> Node {
        registry.commit(reveal.commitment()).unwrap();
        clock.advance(registry.config().min_commitment_age_secs);
        registry.register(reveal).unwrap()
    }

    #[test]
    fn test_commit_then_reveal_registers_namespace() {
        let (registry, clock) = setup();
        let owner = Address::repeat_byte(1);
        let node = admit(&registry, &clock, reveal("ethstars", owner));

        let entry = registry.entry(&node).unwrap();
        assert_eq!(entry.owner, owner);
        assert_eq!(entry.resolver, Address::repeat_byte(0xee));
        assert_eq!(
            entry.expires_at,
            clock.now() + registry.config().registration_duration_secs
        );
        assert!(registry.is_active(&node));
        assert_eq!(registry.owner_of("ethstars").unwrap(), owner);
        assert_eq!(registry.list_owner_namespaces(&owner), vec![node]);
    }

    #[test]
    fn test_reveal_without_commitment_fails() {
        let (registry, _) = setup();
        let err = registry
            .register(reveal("ethstars", Address::repeat_byte(1)))
            .unwrap_err();
        assert_eq!(err, NamespaceRegistryError::CommitmentNotFound);
    }

    #[test]
    fn test_reveal_before_min_age_fails() {
        let (registry, clock) = setup();
        let r = reveal("ethstars", Address::repeat_byte(1));
        registry.commit(r.commitment()).unwrap();
        clock.advance(registry.config().min_commitment_age_secs - 1);
        let err = registry.register(r).unwrap_err();
        assert!(matches!(err, NamespaceRegistryError::CommitmentTooNew { .. }));
    }

    #[test]
    fn test_reveal_after_max_age_fails() {
        let (registry, clock) = setup();
        let r = reveal("ethstars", Address::repeat_byte(1));
        registry.commit(r.commitment()).unwrap();
        clock.advance(registry.config().max_commitment_age_secs + 1);
        let err = registry.register(r.clone()).unwrap_err();
        assert!(matches!(err, NamespaceRegistryError::CommitmentTooOld { .. }));
        assert_eq!(registry.commitment_submitted_at(&r.commitment()), None);
    }

    #[test]
    fn test_commit_drops_stale_commitments() {
        let (registry, clock) = setup();
        let stale = [7u8; 32];
        registry.commit(stale).unwrap();
        clock.advance(registry.config().max_commitment_age_secs + 1);

        registry.commit([8u8; 32]).unwrap();
        assert_eq!(registry.commitment_submitted_at(&stale), None);
        assert_eq!(registry.commitment_submitted_at(&[8u8; 32]), Some(clock.now()));
    }

    #[test]
    fn test_duplicate_commitment_rejected_until_expired() {
        let (registry, clock) = setup();
        let digest = [5u8; 32];
        registry.commit(digest).unwrap();
        assert_eq!(
            registry.commit(digest),
            Err(NamespaceRegistryError::UnexpiredCommitmentExists)
        );
        clock.advance(registry.config().max_commitment_age_secs + 1);
        assert!(registry.commit(digest).is_ok());
        assert_eq!(registry.commitment_submitted_at(&digest), Some(clock.now()));
    }

    #[test]
    fn test_reveal_with_mismatched_plaintext_fails() {
        let (registry, clock) = setup();
        let r = reveal("ethstars", Address::repeat_byte(1));
        registry.commit(r.commitment()).unwrap();
        clock.advance(registry.config().min_commitment_age_secs);

        let mut tampered = r.clone();
        tampered.resolver = Address::repeat_byte(0x66);
        assert_eq!(
            registry.register(tampered),
            Err(NamespaceRegistryError::CommitmentNotFound)
        );
        assert!(registry.register(r).is_ok());
    }

    #[test]
    fn test_set_resolver_requires_owner() {
        let (registry, clock) = setup();
        let owner = Address::repeat_byte(1);
        let stranger = Address::repeat_byte(2);
        let node = admit(&registry, &clock, reveal("ethstars", owner));

        let err = registry
            .set_resolver(&stranger, "ethstars", Address::repeat_byte(9))
            .unwrap_err();
        assert!(matches!(err, NamespaceRegistryError::Unauthorized { .. }));

        registry
            .set_resolver(&owner, "ethstars", Address::repeat_byte(9))
            .unwrap();
        assert_eq!(registry.entry(&node).unwrap().resolver, Address::repeat_byte(9));
    }

    #[test]
    fn test_resolver_removal_emits_distinct_event() {
        let (registry, clock) = setup();
        let owner = Address::repeat_byte(1);
        let node = admit(&registry, &clock, reveal("ethstars", owner));

        registry
            .set_resolver(&owner, "ethstars", Address::repeat_byte(9))
            .unwrap();
        registry.set_resolver(&owner, "ethstars", Address::ZERO).unwrap();

        let events = registry.events();
        assert!(events.contains(&RegistryEvent::ResolverUpdated {
            node,
            resolver: Address::repeat_byte(9)
        }));
        assert_eq!(events.last(), Some(&RegistryEvent::ResolverRemoved { node }));
        assert_eq!(registry.resolver_of("ethstars").unwrap(), Address::ZERO);
    }

    #[test]
    fn test_expired_namespace_rejects_mutation() {
        let (registry, clock) = setup();
        let owner = Address::repeat_byte(1);
        admit(&registry, &clock, reveal("ethstars", owner));
        clock.advance(registry.config().registration_duration_secs);

        let err = registry
            .set_resolver(&owner, "ethstars", Address::repeat_byte(9))
            .unwrap_err();
        assert!(matches!(err, NamespaceRegistryError::Expired { .. }));
        assert!(matches!(
            registry.owner_of("ethstars"),
            Err(NamespaceRegistryError::Expired { .. })
        ));
    }

    #[test]
    fn test_expired_namespace_can_be_registered_again() {
        let (registry, clock) = setup();
        let first = Address::repeat_byte(1);
        let second = Address::repeat_byte(2);
        admit(&registry, &clock, reveal("ethstars", first));
        clock.advance(registry.config().registration_duration_secs);

        let node = admit(&registry, &clock, reveal("ethstars", second));
        assert_eq!(registry.entry(&node).unwrap().owner, second);
        assert!(registry.list_owner_namespaces(&first).is_empty());
    }

    #[test]
    fn test_transfer_moves_ownership() {
        let (registry, clock) = setup();
        let owner = Address::repeat_byte(1);
        let heir = Address::repeat_byte(2);
        let node = admit(&registry, &clock, reveal("ethstars", owner));

        registry.transfer(&owner, "ethstars", heir).unwrap();
        assert_eq!(registry.owner_of("ethstars").unwrap(), heir);
        assert_eq!(registry.list_owner_namespaces(&heir), vec![node]);
        assert!(registry.list_owner_namespaces(&owner).is_empty());
        assert!(matches!(
            registry.transfer(&owner, "ethstars", owner),
            Err(NamespaceRegistryError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_chained_transfers_keep_owner_index_consistent() {
        let (registry, clock) = setup();
        let (a, b, c) = (Address::repeat_byte(1), Address::repeat_byte(2), Address::repeat_byte(3));
        let node = admit(&registry, &clock, reveal("ethstars", a));

        registry.transfer(&a, "ethstars", b).unwrap();
        registry.transfer(&b, "ethstars", c).unwrap();
        assert!(registry.list_owner_namespaces(&a).is_empty());
        assert!(registry.list_owner_namespaces(&b).is_empty());
        assert_eq!(registry.list_owner_namespaces(&c), vec![node]);
    }

    #[test]
    fn test_former_owner_cannot_relinquish_readmitted_namespace() {
        let (registry, clock) = setup();
        let first = Address::repeat_byte(1);
        let second = Address::repeat_byte(2);
        admit(&registry, &clock, reveal("ethstars", first));
        clock.advance(registry.config().registration_duration_secs);
        let node = admit(&registry, &clock, reveal("ethstars", second));

        assert!(matches!(
            registry.relinquish(&first, "ethstars"),
            Err(NamespaceRegistryError::Unauthorized { .. })
        ));
        assert_eq!(registry.entry(&node).unwrap().owner, second);
        assert_eq!(registry.list_owner_namespaces(&second), vec![node]);
    }

    #[test]
    fn test_renew_extends_from_current_expiry() {
        let (registry, clock) = setup();
        let owner = Address::repeat_byte(1);
        let node = admit(&registry, &clock, reveal("ethstars", owner));
        let before = registry.entry(&node).unwrap().expires_at;

        let after = registry.renew(&owner, "ethstars").unwrap();
        assert_eq!(after, before + registry.config().registration_duration_secs);
    }

    #[test]
    fn test_relinquish_frees_namespace() {
        let (registry, clock) = setup();
        let owner = Address::repeat_byte(1);
        let node = admit(&registry, &clock, reveal("ethstars", owner));

        registry.relinquish(&owner, "ethstars").unwrap();
        assert!(registry.entry(&node).is_none());
        assert!(!registry.is_active(&node));
        assert!(matches!(
            registry.get("ethstars"),
            Err(NamespaceRegistryError::NamespaceNotFound { .. })
        ));
    }

    #[test]
    fn test_invalid_namespace_rejected_at_reveal() {
        let (registry, _) = setup();
        let err = registry
            .register(reveal("Bad Name", Address::repeat_byte(1)))
            .unwrap_err();
        assert!(matches!(err, NamespaceRegistryError::InvalidNamespace { .. }));
    }
}
