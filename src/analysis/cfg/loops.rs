//! Natural loop detection.
//!
//! A back edge is an edge `latch -> header` where `header` dominates `latch`. The
//! natural loop of that edge is the header plus every block that reaches the latch
//! without passing through the header. Back edges sharing a header are merged into
//! one loop.
//!
//! ```text
//!     [preheader]     <- inserted by loop-invariant code motion
//!          |
//!          v
//!     [header] <------+
//!          |          |
//!          v          |
//!     [body ...]      |
//!          |          |
//!          v          |
//!     [latch] --------+
//! ```
//!
//! [`detect_loops`] works on any graph implementing the traits in
//! [`crate::utils::graph`], given dominance facts for it.

use crate::utils::{
    graph::{algorithms::Dominance, NodeId, Predecessors, Successors},
    BitSet,
};

/// One natural loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopInfo {
    /// The single entry block, which dominates every block of the loop.
    pub header: NodeId,
    /// Every block of the loop, header included.
    pub body: BitSet,
    /// Sources of the back edges into the header.
    pub latches: Vec<NodeId>,
    /// Number of enclosing loops (0 = outermost).
    pub depth: usize,
}

impl LoopInfo {
    fn new(header: NodeId, capacity: usize) -> Self {
        LoopInfo {
            header,
            body: BitSet::from_nodes(capacity, [header]),
            latches: Vec::new(),
            depth: 0,
        }
    }

    /// Returns `true` if `node` belongs to the loop.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.body.contains(node)
    }

    /// Returns the number of blocks in the loop.
    #[must_use]
    pub fn size(&self) -> usize {
        self.body.len()
    }

    /// Returns predecessors of the header that lie outside the loop.
    ///
    /// These are the edges a preheader must take over.
    pub fn entering_blocks<'g, G: Predecessors>(
        &'g self,
        graph: &'g G,
    ) -> impl Iterator<Item = NodeId> + 'g {
        graph
            .predecessors(self.header)
            .filter(move |&pred| !self.contains(pred))
    }

    /// Returns blocks outside the loop that have a predecessor inside it.
    #[must_use]
    pub fn exit_blocks<G: Successors>(&self, graph: &G) -> Vec<NodeId> {
        let mut exits = BitSet::new(self.body.capacity());
        for node in self.body.iter() {
            for succ in graph.successors(node) {
                if !self.contains(succ) {
                    exits.insert(succ);
                }
            }
        }
        exits.iter().collect()
    }

    /// Adds the natural loop of the back edge `latch -> header`.
    fn absorb<G: Predecessors>(&mut self, graph: &G, latch: NodeId) {
        self.latches.push(latch);
        let mut work = vec![latch];
        while let Some(node) = work.pop() {
            if self.body.insert(node) {
                work.extend(graph.predecessors(node).filter(|p| !self.contains(*p)));
            }
        }
    }
}

/// All natural loops of a graph, ordered by header id.
#[derive(Debug, Clone, Default)]
pub struct LoopForest {
    loops: Vec<LoopInfo>,
}

impl LoopForest {
    /// Returns the loops ordered by header id.
    #[must_use]
    pub fn loops(&self) -> &[LoopInfo] {
        &self.loops
    }

    /// Returns the number of loops.
    #[must_use]
    pub fn len(&self) -> usize {
        self.loops.len()
    }

    /// Returns `true` if the graph is acyclic (ignoring unreachable code).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    /// Returns the loop headed by `header`.
    #[must_use]
    pub fn loop_for_header(&self, header: NodeId) -> Option<&LoopInfo> {
        self.loops.iter().find(|l| l.header == header)
    }

    /// Returns the innermost loop containing `node`.
    #[must_use]
    pub fn innermost_loop(&self, node: NodeId) -> Option<&LoopInfo> {
        self.loops
            .iter()
            .filter(|l| l.contains(node))
            .max_by_key(|l| l.depth)
    }

    /// Returns how many loops contain `node`.
    #[must_use]
    pub fn loop_depth(&self, node: NodeId) -> usize {
        self.loops.iter().filter(|l| l.contains(node)).count()
    }

    /// Returns the loops outermost first; ties keep header order.
    #[must_use]
    pub fn outermost_first(&self) -> Vec<&LoopInfo> {
        let mut ordered: Vec<&LoopInfo> = self.loops.iter().collect();
        ordered.sort_by_key(|l| (l.depth, l.header));
        ordered
    }
}

/// Finds every natural loop of `graph`.
///
/// Only edges between blocks reachable from the entry are considered, so
/// unreachable cycles never form loops.
pub fn detect_loops<G>(graph: &G, dominance: &Dominance) -> LoopForest
where
    G: Successors + Predecessors,
{
    let capacity = graph.node_count();
    let mut loops: Vec<LoopInfo> = Vec::new();

    for node in graph.node_ids() {
        if !dominance.dominates(dominance.entry(), node) {
            continue;
        }
        for succ in graph.successors(node) {
            if !dominance.dominates(succ, node) {
                continue;
            }
            match loops.iter_mut().find(|l| l.header == succ) {
                Some(existing) => existing.absorb(graph, node),
                None => {
                    let mut info = LoopInfo::new(succ, capacity);
                    info.absorb(graph, node);
                    loops.push(info);
                }
            }
        }
    }

    let depths: Vec<usize> = loops
        .iter()
        .map(|inner| {
            loops
                .iter()
                .filter(|outer| outer.header != inner.header && outer.contains(inner.header))
                .count()
        })
        .collect();
    for (info, depth) in loops.iter_mut().zip(depths) {
        info.depth = depth;
    }

    loops.sort_by_key(|l| l.header);
    LoopForest { loops }
}
