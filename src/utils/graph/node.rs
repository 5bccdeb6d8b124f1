//! Node identifiers for the arena graph.

use std::fmt;

/// A strongly-typed index of a node within a [`DirectedGraph`](crate::utils::graph::DirectedGraph).
///
/// Ids are handed out sequentially from 0 by
/// [`DirectedGraph::add_node`](crate::utils::graph::DirectedGraph::add_node) and are never
/// reused, so they double as indices into per-node side tables (dominator sets,
/// dataflow facts).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Creates a `NodeId` from a raw index.
    ///
    /// Intended for tests and side tables; normal code obtains ids from the graph.
    #[must_use]
    #[inline]
    pub const fn new(index: usize) -> Self {
        NodeId(index)
    }

    /// Returns the raw 0-based index.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl From<usize> for NodeId {
    #[inline]
    fn from(index: usize) -> Self {
        NodeId(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_and_display() {
        let node = NodeId::new(3);
        assert_eq!(node.index(), 3);
        assert_eq!(format!("{node}"), "n3");
        assert_eq!(format!("{node:?}"), "NodeId(3)");
        assert_eq!(NodeId::from(3), node);
    }

    #[test]
    fn test_ordering_follows_index() {
        assert!(NodeId::new(1) < NodeId::new(2));
    }
}
