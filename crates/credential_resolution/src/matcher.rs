//! Namespace/key matching
//!
//! Keys carry their namespace as a prefix, with segments separated by `.` or
//! `:` (`stars.rating`, `a.b:count`). The most specific bound namespace that
//! is a prefix of the key wins.

use namecred_dns_wire::namehash_dotted;
use namecred_types::{Address, Node};
use std::collections::HashMap;
use tracing::trace;

/// Characters separating key segments.
pub const KEY_DELIMITERS: [char; 2] = ['.', ':'];

/// Prefixes of `key` eligible as namespaces, most specific first.
///
/// The whole key comes first, followed by every prefix that ends right
/// before a delimiter.
pub fn key_candidates(key: &str) -> Vec<&str> {
    let mut candidates = vec![key];
    candidates.extend(
        key.char_indices()
            .rev()
            .filter(|(_, c)| KEY_DELIMITERS.contains(c))
            .map(|(i, _)| &key[..i]),
    );
    candidates
}

/// Namespace hash of a key prefix, with `:` treated as a label separator.
pub fn candidate_node(candidate: &str) -> Option<Node> {
    namehash_dotted(&candidate.replace(':', ".")).ok()
}

/// Resolver bound to the most specific namespace prefix of `key`, or the
/// zero address when no prefix is bound.
pub fn select_resolver(key: &str, bindings: &HashMap<Node, Address>) -> Address {
    select_resolver_with(key, bindings, |_| true)
}

/// Like [`select_resolver`], skipping bindings for which `eligible` is false.
pub fn select_resolver_with(
    key: &str,
    bindings: &HashMap<Node, Address>,
    eligible: impl Fn(&Node) -> bool,
) -> Address {
    select_resolver_by(key, |node| {
        bindings.get(node).copied().filter(|_| eligible(node))
    })
}

/// Resolver of the most specific prefix of `key` for which `lookup` yields
/// one, or the zero address.
pub fn select_resolver_by(key: &str, lookup: impl Fn(&Node) -> Option<Address>) -> Address {
    for candidate in key_candidates(key) {
        let Some(node) = candidate_node(candidate) else {
            continue;
        };
        if let Some(resolver) = lookup(&node) {
            trace!(key, namespace = candidate, resolver = %resolver, "key matched namespace");
            return resolver;
        }
    }
    Address::ZERO
}
