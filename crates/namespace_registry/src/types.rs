//! Types for the namespace registry

use crate::commitment::Secret;
use crate::errors::*;
use namecred_dns_wire::{encode, namehash};
use namecred_types::{Address, Node};
use serde::{Deserialize, Serialize};

/// Validate a namespace name and compute its namespace hash.
///
/// Namespaces are dotted names whose labels use lowercase ASCII letters,
/// digits, `-` and `_`, so that they can appear verbatim as key prefixes.
pub fn namespace_node(namespace: &str) -> Result<Node> {
    let invalid = |reason: &str| NamespaceRegistryError::InvalidNamespace {
        namespace: namespace.to_string(),
        reason: reason.to_string(),
    };

    if namespace.is_empty() {
        return Err(invalid("empty namespace"));
    }
    let allowed = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_';
    if !namespace.chars().all(|c| allowed(c) || c == '.') {
        return Err(invalid("labels may only contain [a-z0-9_-]"));
    }

    let wire = encode(namespace).map_err(|e| invalid(&e.to_string()))?;
    Ok(namehash(&wire))
}

/// Registry record for an admitted namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceEntry {
    /// Dotted namespace name
    pub namespace: String,
    pub owner: Address,
    /// Zero when no resolver is bound
    pub resolver: Address,
    pub registered_at: u64,
    pub expires_at: u64,
}

impl NamespaceEntry {
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }

    pub fn has_resolver(&self) -> bool {
        !self.resolver.is_zero()
    }
}

/// Plaintext revealed in the second registration phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reveal {
    pub namespace: String,
    pub owner: Address,
    pub secret: Secret,
    /// Initial resolver, zero for none
    pub resolver: Address,
}

impl Reveal {
    pub fn commitment(&self) -> [u8; 32] {
        crate::commitment::make_commitment(&self.namespace, &self.owner, &self.secret, &self.resolver)
    }
}

/// Observational events; they never feed back into registry behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegistryEvent {
    CommitmentSubmitted {
        commitment: [u8; 32],
        at: u64,
    },
    NamespaceRegistered {
        namespace: String,
        node: Node,
        owner: Address,
        resolver: Address,
        expires_at: u64,
    },
    ResolverUpdated {
        node: Node,
        resolver: Address,
    },
    ResolverRemoved {
        node: Node,
    },
    OwnershipTransferred {
        node: Node,
        from: Address,
        to: Address,
    },
    NamespaceRenewed {
        node: Node,
        expires_at: u64,
    },
    NamespaceRelinquished {
        node: Node,
    },
}

/// Timing parameters of the commit-reveal protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Minimum age of a commitment before it can be revealed
    pub min_commitment_age_secs: u64,
    /// Age after which a commitment can no longer be revealed
    pub max_commitment_age_secs: u64,
    /// Lifetime granted by a registration or renewal
    pub registration_duration_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            min_commitment_age_secs: 60,
            max_commitment_age_secs: 24 * 60 * 60,
            registration_duration_secs: 365 * 24 * 60 * 60,
        }
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_commitment_age_secs >= self.max_commitment_age_secs {
            return Err(NamespaceRegistryError::InvalidConfig(format!(
                "min_commitment_age_secs ({}) must be below max_commitment_age_secs ({})",
                self.min_commitment_age_secs, self.max_commitment_age_secs
            )));
        }
        if self.registration_duration_secs == 0 {
            return Err(NamespaceRegistryError::InvalidConfig(
                "registration_duration_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_validation() {
        assert!(namespace_node("ethstars").is_ok());
        assert!(namespace_node("a.b-c_d").is_ok());
        assert!(namespace_node("").is_err());
        assert!(namespace_node("Upper").is_err());
        assert!(namespace_node("a..b").is_err());
        assert!(namespace_node("with space").is_err());
        assert!(namespace_node("colon:key").is_err());
    }

    #[test]
    fn nested_namespace_hash_is_recursive() {
        let parent = namespace_node("a").unwrap();
        let child = namespace_node("b.a").unwrap();
        assert_eq!(child, parent.child(b"b"));
    }

    #[test]
    fn default_config_is_valid() {
        assert!(RegistryConfig::default().validate().is_ok());
        let bad = RegistryConfig {
            min_commitment_age_secs: 10,
            max_commitment_age_secs: 10,
            ..Default::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(NamespaceRegistryError::InvalidConfig(_))
        ));
    }

    #[test]
    fn events_serialize_with_kind_tag() {
        let event = RegistryEvent::ResolverRemoved { node: Node::ROOT };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "resolver_removed");
    }

    #[test]
    fn expiry_is_inclusive() {
        let entry = NamespaceEntry {
            namespace: "a".into(),
            owner: Address::repeat_byte(1),
            resolver: Address::ZERO,
            registered_at: 0,
            expires_at: 100,
        };
        assert!(!entry.is_expired(99));
        assert!(entry.is_expired(100));
        assert!(!entry.has_resolver());
    }
}
