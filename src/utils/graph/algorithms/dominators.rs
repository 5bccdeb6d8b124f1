//! Dominator analysis.
//!
//! Node `a` dominates node `b` if every path from the entry to `b` passes through
//! `a`. This module computes, for a [`RootedGraph`]:
//!
//! - dominator sets, by the iterative data-flow formulation
//!   `Dom(entry) = {entry}`, `Dom(n) = {n} ∪ ⋂ Dom(p)` over predecessors `p`
//! - immediate dominators and the dominator tree
//! - dominance frontiers
//!
//! The iterative formulation is quadratic in the worst case but the sets stay tiny for
//! the functions this crate handles, and it makes the relation easy to inspect.
//!
//! Only nodes reachable from the entry take part. An unreachable node is dominated by
//! itself alone, has no immediate dominator and an empty frontier.
//!
//! [`dominates_by_paths`] answers the same question by brute-force path search and is
//! meant for cross-checking the fixpoint.

use tracing::trace;

use crate::utils::{
    graph::{
        algorithms::traversal::{reachable, reverse_postorder},
        NodeId, RootedGraph, Successors,
    },
    BitSet,
};

/// Dominance facts for every node of a rooted graph.
///
/// # Examples
///
/// ```rust
/// use brilopt::utils::graph::{algorithms::compute_dominance, DirectedGraph, NodeId, RootedGraph};
/// # struct Rooted(DirectedGraph<&'static str>);
/// # impl brilopt::utils::graph::GraphBase for Rooted {
/// #     fn node_count(&self) -> usize { self.0.node_count() }
/// #     fn node_ids(&self) -> impl Iterator<Item = NodeId> { (0..self.0.node_count()).map(NodeId::new) }
/// # }
/// # impl brilopt::utils::graph::Successors for Rooted {
/// #     fn successors(&self, n: NodeId) -> impl Iterator<Item = NodeId> { self.0.successors(n) }
/// # }
/// # impl brilopt::utils::graph::Predecessors for Rooted {
/// #     fn predecessors(&self, n: NodeId) -> impl Iterator<Item = NodeId> { self.0.predecessors(n) }
/// # }
/// # impl RootedGraph for Rooted { fn entry(&self) -> NodeId { NodeId::new(0) } }
///
/// let mut graph = DirectedGraph::new();
/// let entry = graph.add_node("entry");
/// let left = graph.add_node("left");
/// let right = graph.add_node("right");
/// let join = graph.add_node("join");
/// graph.add_edge(entry, left)?;
/// graph.add_edge(entry, right)?;
/// graph.add_edge(left, join)?;
/// graph.add_edge(right, join)?;
///
/// let dom = compute_dominance(&Rooted(graph));
/// assert_eq!(dom.immediate_dominator(join), Some(entry));
/// assert!(dom.frontier(left).contains(join));
/// # Ok::<(), brilopt::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Dominance {
    entry: NodeId,
    dominators: Vec<BitSet>,
    idom: Vec<Option<NodeId>>,
    children: Vec<Vec<NodeId>>,
    frontiers: Vec<BitSet>,
    iterations: usize,
}

impl Dominance {
    /// Returns the entry node the facts are relative to.
    #[must_use]
    pub fn entry(&self) -> NodeId {
        self.entry
    }

    /// Returns the number of nodes covered.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.dominators.len()
    }

    /// Returns the number of full passes the fixpoint needed.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Returns the dominator set of `node` (always containing `node`).
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of bounds.
    #[must_use]
    pub fn dominators(&self, node: NodeId) -> &BitSet {
        &self.dominators[node.index()]
    }

    /// Returns `true` if `a` dominates `b`. Every node dominates itself.
    #[must_use]
    pub fn dominates(&self, a: NodeId, b: NodeId) -> bool {
        self.dominators
            .get(b.index())
            .is_some_and(|set| set.contains(a))
    }

    /// Returns `true` if `a` dominates `b` and `a != b`.
    #[must_use]
    pub fn strictly_dominates(&self, a: NodeId, b: NodeId) -> bool {
        a != b && self.dominates(a, b)
    }

    /// Returns the set of nodes that `node` dominates, including itself.
    #[must_use]
    pub fn dominatees(&self, node: NodeId) -> BitSet {
        let capacity = self.dominators.len();
        BitSet::from_nodes(
            capacity,
            (0..capacity)
                .map(NodeId::new)
                .filter(|&other| self.dominates(node, other)),
        )
    }

    /// Returns the closest strict dominator of `node`; `None` for the entry and
    /// for unreachable nodes.
    #[must_use]
    pub fn immediate_dominator(&self, node: NodeId) -> Option<NodeId> {
        self.idom.get(node.index()).copied().flatten()
    }

    /// Returns the dominator-tree children of `node` in id order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.children.get(node.index()).map_or(&[], Vec::as_slice)
    }

    /// Returns the dominance frontier of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of bounds.
    #[must_use]
    pub fn frontier(&self, node: NodeId) -> &BitSet {
        &self.frontiers[node.index()]
    }

    /// Returns the iterated dominance frontier of `seeds`.
    ///
    /// Every block added to the result is treated as a further seed until nothing
    /// new appears. This is where a variable defined in `seeds` needs phi nodes.
    #[must_use]
    pub fn iterated_frontier(&self, seeds: impl IntoIterator<Item = NodeId>) -> BitSet {
        let capacity = self.dominators.len();
        let mut result = BitSet::new(capacity);
        let mut seen = BitSet::new(capacity);
        let mut work: Vec<NodeId> = seeds.into_iter().filter(|&n| seen.insert(n)).collect();

        while let Some(node) = work.pop() {
            for target in self.frontier(node).iter() {
                if result.insert(target) && seen.insert(target) {
                    work.push(target);
                }
            }
        }

        result
    }
}

/// Computes dominator sets, immediate dominators and frontiers for `graph`.
pub fn compute_dominance<G: RootedGraph>(graph: &G) -> Dominance {
    let entry = graph.entry();
    let (dominators, iterations) = compute_dominator_sets(graph, entry);
    let idom = immediate_dominators(&dominators, entry);

    let mut children = vec![Vec::new(); dominators.len()];
    for (index, parent) in idom.iter().enumerate() {
        if let Some(parent) = parent {
            children[parent.index()].push(NodeId::new(index));
        }
    }

    let mut dominance = Dominance {
        entry,
        dominators,
        idom,
        children,
        frontiers: Vec::new(),
        iterations,
    };
    dominance.frontiers = dominance_frontiers(graph, &dominance);
    dominance
}

/// Computes the dominator set of every node by iterating to a fixpoint.
///
/// Returns the sets indexed by node id and the number of passes performed. The loop
/// stops only after a complete pass in which no set changed.
pub fn compute_dominator_sets<G: RootedGraph>(graph: &G, entry: NodeId) -> (Vec<BitSet>, usize) {
    let count = graph.node_count();
    let live = reachable(graph, entry);
    let order = reverse_postorder(graph, entry);

    let mut sets: Vec<BitSet> = (0..count)
        .map(NodeId::new)
        .map(|node| {
            if node == entry || !live.contains(node) {
                BitSet::from_nodes(count, [node])
            } else {
                live.clone()
            }
        })
        .collect();

    let mut iterations = 0;
    loop {
        iterations += 1;
        let mut changed = false;

        for &node in &order {
            if node == entry {
                continue;
            }

            let mut next = live.clone();
            for pred in graph.predecessors(node) {
                if live.contains(pred) {
                    next.intersect_with(&sets[pred.index()]);
                }
            }
            next.insert(node);

            if next != sets[node.index()] {
                sets[node.index()] = next;
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }

    trace!(nodes = count, iterations, "dominator sets converged");
    (sets, iterations)
}

/// Derives immediate dominators from dominator sets.
///
/// Strict dominators of a node form a chain, so the closest one is the strict
/// dominator whose own dominator set is the largest.
#[must_use]
pub fn immediate_dominators(sets: &[BitSet], entry: NodeId) -> Vec<Option<NodeId>> {
    sets.iter()
        .enumerate()
        .map(|(index, set)| {
            let node = NodeId::new(index);
            if node == entry || !set.contains(entry) {
                return None;
            }
            set.iter()
                .filter(|&d| d != node)
                .max_by_key(|d| sets[d.index()].len())
        })
        .collect()
}

/// Computes dominance frontiers.
///
/// `s` is in `DF(n)` if `s` is a successor of some node dominated by `n` and `n`
/// does not strictly dominate `s`. This includes `s == n` for loop headers reached by
/// a back edge.
pub fn dominance_frontiers<G: Successors>(graph: &G, dominance: &Dominance) -> Vec<BitSet> {
    let count = dominance.node_count();
    (0..count)
        .map(NodeId::new)
        .map(|node| {
            let mut frontier = BitSet::new(count);
            if !dominance.dominates(dominance.entry(), node) {
                return frontier;
            }
            for inner in dominance.dominatees(node).iter() {
                for succ in graph.successors(inner) {
                    if !dominance.strictly_dominates(node, succ) {
                        frontier.insert(succ);
                    }
                }
            }
            frontier
        })
        .collect()
}

/// Checks by path search whether every path from `root` to `target` passes through
/// `candidate`.
///
/// Searches from `root` without entering `candidate`; dominance holds iff `target`
/// stays unreached. A node always dominates itself, and `root` dominates everything.
pub fn dominates_by_paths<G: Successors>(
    graph: &G,
    root: NodeId,
    candidate: NodeId,
    target: NodeId,
) -> bool {
    if candidate == target || candidate == root {
        return true;
    }

    let mut visited = BitSet::new(graph.node_count());
    visited.insert(candidate);
    let mut stack = Vec::new();
    if visited.insert(root) {
        stack.push(root);
    }

    while let Some(node) = stack.pop() {
        if node == target {
            return false;
        }
        for succ in graph.successors(node) {
            if visited.insert(succ) {
                stack.push(succ);
            }
        }
    }

    true
}
