//! Core directed graph implementation.
//!
//! [`DirectedGraph`] stores node payloads in an arena indexed by [`NodeId`] and keeps
//! both adjacency directions as lists of ids. Nodes never own references to each
//! other, so cyclic control flow needs no shared ownership.
//!
//! Edges carry no data. Parallel edges collapse into one and self-loops are allowed,
//! matching how control transfers between basic blocks are counted.

use crate::{
    utils::graph::{
        node::NodeId,
        traits::{GraphBase, Predecessors, Successors},
    },
    Error, Result,
};

/// A directed graph with typed node data and reversible adjacency.
///
/// # Invariants
///
/// - Adjacency is symmetric: `b` is in `successors(a)` iff `a` is in `predecessors(b)`.
/// - Adjacency lists keep insertion order and contain no duplicates.
/// - [`reverse`](Self::reverse) swaps the two directions in place; calling it twice
///   restores the original graph exactly.
///
/// # Examples
///
/// ```rust
/// use brilopt::utils::graph::DirectedGraph;
///
/// let mut graph: DirectedGraph<&str> = DirectedGraph::new();
/// let a = graph.add_node("A");
/// let b = graph.add_node("B");
/// graph.add_edge(a, b)?;
///
/// assert_eq!(graph.successors(a).collect::<Vec<_>>(), vec![b]);
/// graph.reverse();
/// assert_eq!(graph.successors(b).collect::<Vec<_>>(), vec![a]);
/// # Ok::<(), brilopt::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct DirectedGraph<N> {
    nodes: Vec<N>,
    outgoing: Vec<Vec<NodeId>>,
    incoming: Vec<Vec<NodeId>>,
    edge_count: usize,
}

impl<N> Default for DirectedGraph<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> DirectedGraph<N> {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty graph with room for `nodes` nodes.
    #[must_use]
    pub fn with_capacity(nodes: usize) -> Self {
        DirectedGraph {
            nodes: Vec::with_capacity(nodes),
            outgoing: Vec::with_capacity(nodes),
            incoming: Vec::with_capacity(nodes),
            edge_count: 0,
        }
    }

    /// Adds a node and returns its id.
    pub fn add_node(&mut self, data: N) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(data);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        id
    }

    /// Adds the edge `source -> target`.
    ///
    /// Returns `false` if the edge was already present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphError`] if either endpoint does not exist in the graph.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId) -> Result<bool> {
        for (role, node) in [("source", source), ("target", target)] {
            if !self.contains_node(node) {
                return Err(Error::GraphError(format!(
                    "{role} node {node} does not exist in graph with {} nodes",
                    self.nodes.len()
                )));
            }
        }

        if self.outgoing[source.index()].contains(&target) {
            return Ok(false);
        }

        self.outgoing[source.index()].push(target);
        self.incoming[target.index()].push(source);
        self.edge_count += 1;
        Ok(true)
    }

    /// Removes the edge `source -> target` if present.
    ///
    /// Returns `true` if an edge was removed.
    pub fn remove_edge(&mut self, source: NodeId, target: NodeId) -> bool {
        let Some(out) = self.outgoing.get_mut(source.index()) else {
            return false;
        };
        let Some(pos) = out.iter().position(|&n| n == target) else {
            return false;
        };
        out.remove(pos);
        if let Some(inc) = self.incoming.get_mut(target.index()) {
            inc.retain(|&n| n != source);
        }
        self.edge_count -= 1;
        true
    }

    /// Swaps predecessor and successor lists on every node.
    pub fn reverse(&mut self) {
        std::mem::swap(&mut self.outgoing, &mut self.incoming);
    }

    /// Returns the payload of `node`.
    #[must_use]
    pub fn node(&self, node: NodeId) -> Option<&N> {
        self.nodes.get(node.index())
    }

    /// Returns the payload of `node` mutably.
    pub fn node_mut(&mut self, node: NodeId) -> Option<&mut N> {
        self.nodes.get_mut(node.index())
    }

    /// Consumes the graph and returns the payloads in id order.
    #[must_use]
    pub fn into_nodes(self) -> Vec<N> {
        self.nodes
    }

    /// Returns `(id, payload)` pairs in id order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &N)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId::new(i), n))
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of distinct edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Returns `true` if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` if `node` belongs to this graph.
    #[must_use]
    pub fn contains_node(&self, node: NodeId) -> bool {
        node.index() < self.nodes.len()
    }

    /// Returns `true` if the edge `source -> target` exists.
    #[must_use]
    pub fn contains_edge(&self, source: NodeId, target: NodeId) -> bool {
        self.outgoing
            .get(source.index())
            .is_some_and(|out| out.contains(&target))
    }

    /// Returns the targets of edges leaving `node`, in insertion order.
    pub fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.outgoing
            .get(node.index())
            .into_iter()
            .flat_map(|v| v.iter().copied())
    }

    /// Returns the sources of edges entering `node`, in insertion order.
    pub fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.incoming
            .get(node.index())
            .into_iter()
            .flat_map(|v| v.iter().copied())
    }

    /// Returns the number of edges entering `node`.
    #[must_use]
    pub fn in_degree(&self, node: NodeId) -> usize {
        self.incoming.get(node.index()).map_or(0, Vec::len)
    }

    /// Returns the number of edges leaving `node`.
    #[must_use]
    pub fn out_degree(&self, node: NodeId) -> usize {
        self.outgoing.get(node.index()).map_or(0, Vec::len)
    }
}

impl<N> GraphBase for DirectedGraph<N> {
    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId::new)
    }
}

impl<N> Successors for DirectedGraph<N> {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        DirectedGraph::successors(self, node)
    }
}

impl<N> Predecessors for DirectedGraph<N> {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        DirectedGraph::predecessors(self, node)
    }
}
