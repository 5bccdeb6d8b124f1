//! Fixed-capacity node sets backed by a bit vector.
//!
//! Dominator sets are dense: almost every node of a small function dominates a large
//! share of the others, and the fixpoint repeatedly intersects whole sets. A word-wise
//! representation keeps each intersection at `capacity / 64` operations.
//!
//! ```rust
//! use brilopt::utils::{graph::NodeId, BitSet};
//!
//! let mut a = BitSet::full(4);
//! let b = BitSet::from_nodes(4, [NodeId::new(0), NodeId::new(2)]);
//!
//! assert!(a.intersect_with(&b));
//! assert_eq!(a.iter().collect::<Vec<_>>(), vec![NodeId::new(0), NodeId::new(2)]);
//! ```

use std::fmt;

use crate::utils::graph::NodeId;

const WORD_BITS: usize = 64;

/// A set of [`NodeId`]s with a fixed universe `0..capacity`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BitSet {
    words: Vec<u64>,
    capacity: usize,
}

impl BitSet {
    /// Creates an empty set over `capacity` nodes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        BitSet {
            words: vec![0; capacity.div_ceil(WORD_BITS)],
            capacity,
        }
    }

    /// Creates a set containing every node of the universe.
    #[must_use]
    pub fn full(capacity: usize) -> Self {
        let mut set = BitSet {
            words: vec![u64::MAX; capacity.div_ceil(WORD_BITS)],
            capacity,
        };
        set.clear_tail();
        set
    }

    /// Creates a set from the given nodes. Nodes outside the universe are ignored.
    #[must_use]
    pub fn from_nodes(capacity: usize, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        let mut set = BitSet::new(capacity);
        for node in nodes {
            set.insert(node);
        }
        set
    }

    /// Returns the size of the universe.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns `true` if the set has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Adds `node`, returning `true` if it was not already present.
    pub fn insert(&mut self, node: NodeId) -> bool {
        let Some((word, mask)) = self.locate(node) else {
            return false;
        };
        let fresh = self.words[word] & mask == 0;
        self.words[word] |= mask;
        fresh
    }

    /// Removes `node`, returning `true` if it was present.
    pub fn remove(&mut self, node: NodeId) -> bool {
        let Some((word, mask)) = self.locate(node) else {
            return false;
        };
        let present = self.words[word] & mask != 0;
        self.words[word] &= !mask;
        present
    }

    /// Returns `true` if `node` is a member.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.locate(node)
            .is_some_and(|(word, mask)| self.words[word] & mask != 0)
    }

    /// Returns `true` if every member of `self` is also in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.words
            .iter()
            .zip(&other.words)
            .all(|(a, b)| a & !b == 0)
    }

    /// Intersects in place. Returns `true` if `self` changed.
    pub fn intersect_with(&mut self, other: &Self) -> bool {
        self.combine(other, |a, b| a & b)
    }

    /// Unions in place. Returns `true` if `self` changed.
    pub fn union_with(&mut self, other: &Self) -> bool {
        self.combine(other, |a, b| a | b)
    }

    /// Iterates members in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            let mut rest = word;
            std::iter::from_fn(move || {
                if rest == 0 {
                    return None;
                }
                let bit = rest.trailing_zeros() as usize;
                rest &= rest - 1;
                Some(NodeId::new(i * WORD_BITS + bit))
            })
        })
    }

    fn combine(&mut self, other: &Self, op: impl Fn(u64, u64) -> u64) -> bool {
        let mut changed = false;
        for (mine, theirs) in self.words.iter_mut().zip(&other.words) {
            let next = op(*mine, *theirs);
            changed |= next != *mine;
            *mine = next;
        }
        changed
    }

    fn locate(&self, node: NodeId) -> Option<(usize, u64)> {
        let index = node.index();
        (index < self.capacity).then(|| (index / WORD_BITS, 1u64 << (index % WORD_BITS)))
    }

    fn clear_tail(&mut self) {
        let used = self.capacity % WORD_BITS;
        if used != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << used) - 1;
            }
        }
    }
}

impl fmt::Debug for BitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(set: &BitSet) -> Vec<usize> {
        set.iter().map(NodeId::index).collect()
    }

    #[test]
    fn test_full_respects_capacity() {
        let set = BitSet::full(70);
        assert_eq!(set.len(), 70);
        assert!(set.contains(NodeId::new(69)));
        assert!(!set.contains(NodeId::new(70)));
    }

    #[test]
    fn test_insert_remove() {
        let mut set = BitSet::new(10);
        assert!(set.is_empty());
        assert!(set.insert(NodeId::new(3)));
        assert!(!set.insert(NodeId::new(3)));
        assert!(!set.insert(NodeId::new(42)));
        assert_eq!(ids(&set), vec![3]);
        assert!(set.remove(NodeId::new(3)));
        assert!(set.is_empty());
    }

    #[test]
    fn test_intersect_reports_change() {
        let mut set = BitSet::full(5);
        let other = BitSet::from_nodes(5, [NodeId::new(1), NodeId::new(4)]);
        assert!(set.intersect_with(&other));
        assert!(!set.intersect_with(&other));
        assert_eq!(ids(&set), vec![1, 4]);
    }

    #[test]
    fn test_union_and_subset() {
        let mut a = BitSet::from_nodes(130, [NodeId::new(0), NodeId::new(128)]);
        let b = BitSet::from_nodes(130, [NodeId::new(64)]);
        assert!(!b.is_subset(&a));
        assert!(a.union_with(&b));
        assert!(b.is_subset(&a));
        assert_eq!(ids(&a), vec![0, 64, 128]);
    }
}
