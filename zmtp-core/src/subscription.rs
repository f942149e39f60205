//! Per-connection subscription store for the PUB side.
//!
//! A hash-set over topic prefixes plus a `match_all` flag (§3, §4.6). Set
//! semantics are the only invariant the wire format requires; a linear-scan
//! set is correct, a trie is an optional optimisation this crate does not
//! need at the scale of a handful of subscriptions per connection (§9).

use bytes::Bytes;
use hashbrown::HashSet;

/// The subscription state for one PUB-side connection.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    topics: HashSet<Bytes>,
    match_all: bool,
}

impl SubscriptionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Harvest a SUBSCRIBE (`add_subscription`, §4.6): an empty prefix sets
    /// `match_all`; otherwise the topic is inserted if not already present.
    pub fn add(&mut self, prefix: Bytes) {
        if prefix.is_empty() {
            self.match_all = true;
        } else {
            self.topics.insert(prefix);
        }
    }

    /// Harvest a CANCEL (`remove_subscription`, §4.6): an empty prefix
    /// clears `match_all`; otherwise the matching topic is removed if present.
    pub fn remove(&mut self, prefix: &[u8]) {
        if prefix.is_empty() {
            self.match_all = false;
        } else {
            self.topics.remove(prefix);
        }
    }

    /// `matches(conn, data)` from §4.5: true if `match_all` is set, or if
    /// any stored prefix is a prefix of `data`.
    #[must_use]
    pub fn matches(&self, data: &[u8]) -> bool {
        self.match_all || self.topics.iter().any(|t| data.starts_with(t.as_ref()))
    }

    #[must_use]
    pub fn match_all(&self) -> bool {
        self.match_all
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty() && !self.match_all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_match() {
        let mut s = SubscriptionSet::new();
        s.add(Bytes::from_static(b"weather"));
        assert!(s.matches(b"weather: 25C"));
        assert!(!s.matches(b"news"));
    }

    #[test]
    fn empty_prefix_matches_all() {
        let mut s = SubscriptionSet::new();
        s.add(Bytes::new());
        assert!(s.matches(b"anything"));
        assert!(s.matches(b""));
    }

    #[test]
    fn empty_prefix_remove_clears_match_all() {
        let mut s = SubscriptionSet::new();
        s.add(Bytes::new());
        assert!(s.match_all());
        s.remove(b"");
        assert!(!s.match_all());
        assert!(!s.matches(b"anything"));
    }

    #[test]
    fn duplicate_add_leaves_one_entry() {
        let mut s = SubscriptionSet::new();
        s.add(Bytes::from_static(b"topic"));
        s.add(Bytes::from_static(b"topic"));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn match_all_and_prefixes_coexist() {
        let mut s = SubscriptionSet::new();
        s.add(Bytes::from_static(b"weather"));
        s.add(Bytes::new());
        assert!(s.matches(b"news")); // via match_all
        s.remove(b""); // clear match_all, prefix survives
        assert!(s.matches(b"weather: 1"));
        assert!(!s.matches(b"news"));
    }
}
