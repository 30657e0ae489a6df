//! Disjoint set over string keys
//!
//! Union by rank with path compression. Classes are reported in the order
//! their first member was inserted so output is deterministic.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct DisjointSet {
    index: HashMap<String, usize>,
    keys: Vec<String>,
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key as its own singleton class; no-op if present
    pub fn insert(&mut self, key: &str) -> usize {
        if let Some(&slot) = self.index.get(key) {
            return slot;
        }
        let slot = self.keys.len();
        self.index.insert(key.to_string(), slot);
        self.keys.push(key.to_string());
        self.parent.push(slot);
        self.rank.push(0);
        slot
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Representative slot of a key's class
    pub fn find(&mut self, key: &str) -> Option<usize> {
        let slot = *self.index.get(key)?;
        Some(self.root(slot))
    }

    fn root(&mut self, slot: usize) -> usize {
        let mut root = slot;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Path compression
        let mut current = slot;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    /// Merge the classes of two keys, inserting either if new
    pub fn union(&mut self, a: &str, b: &str) {
        let a = self.insert(a);
        let b = self.insert(b);
        let (ra, rb) = (self.root(a), self.root(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }

    pub fn same(&mut self, a: &str, b: &str) -> bool {
        match (self.find(a), self.find(b)) {
            (Some(ra), Some(rb)) => ra == rb,
            _ => false,
        }
    }

    /// Every class with its members in insertion order
    pub fn classes(&mut self) -> Vec<Vec<String>> {
        let mut by_root: HashMap<usize, usize> = HashMap::new();
        let mut classes: Vec<Vec<String>> = Vec::new();

        for slot in 0..self.keys.len() {
            let root = self.root(slot);
            let class = *by_root.entry(root).or_insert_with(|| {
                classes.push(Vec::new());
                classes.len() - 1
            });
            classes[class].push(self.keys[slot].clone());
        }
        classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singletons() {
        let mut set = DisjointSet::new();
        set.insert("a");
        set.insert("b");
        assert!(!set.same("a", "b"));
        assert_eq!(set.classes().len(), 2);
    }

    #[test]
    fn test_union_is_transitive_and_symmetric() {
        let mut set = DisjointSet::new();
        set.union("a", "b");
        set.union("c", "b");
        assert!(set.same("a", "c"));
        assert!(set.same("c", "a"));
        assert_eq!(set.classes(), vec![vec!["a", "b", "c"]]);
    }

    #[test]
    fn test_union_is_idempotent() {
        let mut set = DisjointSet::new();
        set.union("a", "b");
        set.union("a", "b");
        set.union("b", "a");
        assert_eq!(set.len(), 2);
        assert_eq!(set.classes().len(), 1);
    }

    #[test]
    fn test_path_compression_flattens_chain() {
        let mut set = DisjointSet::new();
        for (a, b) in [("a", "b"), ("c", "d"), ("a", "c"), ("e", "f"), ("a", "e")] {
            set.union(a, b);
        }
        let root = set.find("f").unwrap();
        for key in ["a", "b", "c", "d", "e"] {
            assert_eq!(set.find(key), Some(root));
        }
        let slot = set.index["f"];
        assert_eq!(set.parent[slot], root);
    }

    #[test]
    fn test_unknown_key() {
        let mut set = DisjointSet::new();
        assert_eq!(set.find("missing"), None);
        assert!(!set.same("missing", "missing"));
    }
}
