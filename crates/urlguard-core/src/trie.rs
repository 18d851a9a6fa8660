//! Generic sorted-prefix trie (spec §3 `Trie<T,V>`), used by the host-glob
//! matcher. Built bulk from sorted entries; immutable after construction.

use std::collections::BTreeMap;

/// A trie node keyed by `T`-sequences, storing an optional value at the
/// node reached by consuming the full key.
#[derive(Debug, Clone)]
pub struct Trie<T, V> {
    children: BTreeMap<T, Trie<T, V>>,
    value: Option<V>,
}

impl<T: Ord + Clone, V> Trie<T, V> {
    pub fn new() -> Self {
        Self { children: BTreeMap::new(), value: None }
    }

    /// Builds a trie from `(key, value)` pairs; order of `entries` does not
    /// matter, insertion just walks/creates nodes per key.
    pub fn build<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: IntoIterator<Item = T>,
    {
        let mut root = Self::new();
        for (key, value) in entries {
            root.insert(key, value);
        }
        root
    }

    fn insert<K: IntoIterator<Item = T>>(&mut self, key: K, value: V) {
        let mut node = self;
        for token in key {
            node = node.children.entry(token).or_insert_with(Trie::new);
        }
        node.value = Some(value);
    }

    pub fn child(&self, token: &T) -> Option<&Trie<T, V>> {
        self.children.get(token)
    }

    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.value.is_none()
    }
}

impl<T: Ord + Clone, V> Default for Trie<T, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_inserted_keys() {
        let trie: Trie<&str, bool> =
            Trie::build([(vec!["com", "example"], true), (vec!["com", "example", "www"], true)]);
        let com = trie.child(&"com").expect("com node");
        let example = com.child(&"example").expect("example node");
        assert_eq!(example.value(), Some(&true));
        let www = example.child(&"www").expect("www node");
        assert_eq!(www.value(), Some(&true));
    }

    #[test]
    fn missing_path_returns_none() {
        let trie: Trie<&str, bool> = Trie::build([(vec!["com", "example"], true)]);
        assert!(trie.child(&"org").is_none());
    }

    #[test]
    fn empty_trie_has_no_children_or_value() {
        let trie: Trie<&str, bool> = Trie::new();
        assert!(trie.is_empty());
    }
}
