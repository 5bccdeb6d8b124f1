//! Graph traversal algorithms.
//!
//! - [`dfs`] - iterative depth-first search in pre-order
//! - [`postorder`] - depth-first post-order
//! - [`reverse_postorder`] - the canonical visiting order for forward problems
//! - [`reachable`] - the set of nodes reachable from a start node
//!
//! [`dfs`] is lazy; the ordering functions collect because they need the complete
//! traversal anyway.

use crate::utils::{
    graph::{NodeId, Successors},
    BitSet,
};

/// Depth-first pre-order iterator, created by [`dfs`].
pub struct DfsIterator<'g, G: Successors> {
    graph: &'g G,
    stack: Vec<NodeId>,
    visited: BitSet,
}

impl<G: Successors> Iterator for DfsIterator<'_, G> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;

        // Reverse so successors are visited in their listed order
        let successors: Vec<NodeId> = self.graph.successors(node).collect();
        for &succ in successors.iter().rev() {
            if self.visited.insert(succ) {
                self.stack.push(succ);
            }
        }

        Some(node)
    }
}

/// Returns a depth-first pre-order iterator over the nodes reachable from `start`.
///
/// An invalid `start` yields nothing.
///
/// # Examples
///
/// ```rust
/// use brilopt::utils::graph::{algorithms::dfs, DirectedGraph};
///
/// let mut graph: DirectedGraph<&str> = DirectedGraph::new();
/// let a = graph.add_node("A");
/// let b = graph.add_node("B");
/// let c = graph.add_node("C");
/// graph.add_edge(a, b)?;
/// graph.add_edge(b, c)?;
///
/// assert_eq!(dfs(&graph, a).collect::<Vec<_>>(), vec![a, b, c]);
/// # Ok::<(), brilopt::Error>(())
/// ```
pub fn dfs<G: Successors>(graph: &G, start: NodeId) -> DfsIterator<'_, G> {
    let mut visited = BitSet::new(graph.node_count());
    let stack = if visited.insert(start) {
        vec![start]
    } else {
        Vec::new()
    };

    DfsIterator {
        graph,
        stack,
        visited,
    }
}

/// Returns the set of nodes reachable from `start`, including `start` itself.
pub fn reachable<G: Successors>(graph: &G, start: NodeId) -> BitSet {
    BitSet::from_nodes(graph.node_count(), dfs(graph, start))
}

/// Returns the nodes reachable from `start` in depth-first post-order.
///
/// Uses an explicit stack of `(node, next successor index)` frames so deep graphs
/// cannot overflow the call stack.
pub fn postorder<G: Successors>(graph: &G, start: NodeId) -> Vec<NodeId> {
    let mut visited = BitSet::new(graph.node_count());
    let mut order = Vec::new();
    if !visited.insert(start) {
        return order;
    }

    let mut stack: Vec<(NodeId, Vec<NodeId>, usize)> =
        vec![(start, graph.successors(start).collect(), 0)];

    while let Some((node, succs, next)) = stack.last_mut() {
        if let Some(&succ) = succs.get(*next) {
            *next += 1;
            if visited.insert(succ) {
                let children = graph.successors(succ).collect();
                stack.push((succ, children, 0));
            }
        } else {
            order.push(*node);
            stack.pop();
        }
    }

    order
}

/// Returns the nodes reachable from `start` in reverse post-order.
///
/// Every node appears before its successors, back edges excepted.
pub fn reverse_postorder<G: Successors>(graph: &G, start: NodeId) -> Vec<NodeId> {
    let mut order = postorder(graph, start);
    order.reverse();
    order
}
