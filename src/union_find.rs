//! Union-Find (disjoint set) with path compression and union by rank.
//!
//! Backbone of friendship clustering: every pair of campers connected by a
//! chain of friend requests ends up under the same root.

use std::collections::HashMap;
use std::hash::Hash;

/// Disjoint-set forest keyed by arbitrary hashable ids.
#[derive(Debug, Clone, Default)]
pub struct UnionFind<T: Clone + Eq + Hash> {
    parent: HashMap<T, T>,
    rank: HashMap<T, u32>,
}

impl<T: Clone + Eq + Hash> UnionFind<T> {
    /// Create an empty forest.
    pub fn new() -> Self {
        Self {
            parent: HashMap::new(),
            rank: HashMap::new(),
        }
    }

    /// Create an empty forest with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            parent: HashMap::with_capacity(capacity),
            rank: HashMap::with_capacity(capacity),
        }
    }

    /// Add `x` as a singleton set. No-op if `x` is already present.
    pub fn make_set(&mut self, x: T) {
        if !self.parent.contains_key(&x) {
            self.parent.insert(x.clone(), x.clone());
            self.rank.insert(x, 0);
        }
    }

    /// Whether `x` has been added.
    pub fn contains(&self, x: &T) -> bool {
        self.parent.contains_key(x)
    }

    /// Number of elements (not sets).
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Find the root of `x`, compressing the path on the way.
    ///
    /// Unknown elements are added as singletons first.
    pub fn find(&mut self, x: &T) -> T {
        if !self.parent.contains_key(x) {
            self.make_set(x.clone());
            return x.clone();
        }

        // Walk to the root
        let mut root = x.clone();
        loop {
            let next = &self.parent[&root];
            if *next == root {
                break;
            }
            root = next.clone();
        }

        // Point every node on the path directly at the root
        let mut current = x.clone();
        while current != root {
            let next = self.parent[&current].clone();
            self.parent.insert(current, root.clone());
            current = next;
        }

        root
    }

    /// Merge the sets containing `a` and `b`.
    ///
    /// Returns `true` if two distinct sets were merged.
    pub fn union(&mut self, a: &T, b: &T) -> bool {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return false;
        }

        let rank_a = self.rank[&root_a];
        let rank_b = self.rank[&root_b];
        if rank_a < rank_b {
            self.parent.insert(root_a, root_b);
        } else if rank_a > rank_b {
            self.parent.insert(root_b, root_a);
        } else {
            self.parent.insert(root_b, root_a.clone());
            self.rank.insert(root_a, rank_a + 1);
        }
        true
    }

    /// Whether `a` and `b` are in the same set.
    pub fn connected(&mut self, a: &T, b: &T) -> bool {
        self.find(a) == self.find(b)
    }

    /// Components in first-seen order of `order`.
    ///
    /// Each component lists its members in the order they appear in `order`.
    /// Elements of `order` that were never added become singletons.
    pub fn components_in_order(&mut self, order: &[T]) -> Vec<Vec<T>> {
        let mut index_of_root: HashMap<T, usize> = HashMap::new();
        let mut components: Vec<Vec<T>> = Vec::new();

        for item in order {
            let root = self.find(item);
            match index_of_root.get(&root) {
                Some(&idx) => components[idx].push(item.clone()),
                None => {
                    index_of_root.insert(root, components.len());
                    components.push(vec![item.clone()]);
                }
            }
        }

        components
    }
}

impl<T: Clone + Eq + Hash + Ord> UnionFind<T> {
    /// All sets keyed by root, members sorted for deterministic output.
    pub fn groups(&mut self) -> HashMap<T, Vec<T>> {
        let keys: Vec<T> = self.parent.keys().cloned().collect();
        let mut groups: HashMap<T, Vec<T>> = HashMap::new();
        for key in keys {
            let root = self.find(&key);
            groups.entry(root).or_default().push(key);
        }
        for members in groups.values_mut() {
            members.sort();
        }
        groups
    }
}
