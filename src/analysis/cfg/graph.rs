//! Control Flow Graph implementation.
//!
//! [`ControlFlowGraph`] wraps the blocks of one function in a [`DirectedGraph`] and
//! keeps a name index next to it, so blocks can be addressed both by [`NodeId`] and by
//! block name. Dominance and loop information are computed on first request and
//! cached.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt::Write,
    sync::OnceLock,
};

use tracing::debug;

use crate::{
    analysis::cfg::{
        loops::{detect_loops, LoopForest},
        node::CfgNode,
    },
    ir::{split_blocks, Block, Instruction},
    utils::{
        graph::{
            algorithms::{self, Dominance},
            DirectedGraph, GraphBase, NodeId, Predecessors, RootedGraph, Successors,
        },
        DotWriter,
    },
    Error, Result,
};

/// Default name prefix for synthesized entry blocks.
pub const DEFAULT_ENTRY_PREFIX: &str = "entry";

/// A control-flow graph over the basic blocks of one function.
///
/// # Construction
///
/// One node is created per block, in block order, followed by one edge for every
/// label named by a `jmp` or `br` in the block (self-loops included). If the first
/// block already has a predecessor, a fresh entry block holding a single `jmp` to it is
/// inserted in front so the graph has a unique predecessor-free root.
///
/// # Invariants
///
/// - Block names are unique; every branch target names an existing block.
/// - Edges are symmetric.
/// - Apart from [`switch_directions`](Self::switch_directions) the graph is immutable
///   after construction.
///
/// # Lazy Computation
///
/// [`dominance`](Self::dominance) and [`loops`](Self::loops) are computed on first
/// access and cached in [`OnceLock`]s. Both always describe the forward graph, even
/// when they are first requested while the graph is reversed.
///
/// # Examples
///
/// ```rust
/// use brilopt::{analysis::ControlFlowGraph, ir::Instruction};
///
/// let cfg = ControlFlowGraph::from_instructions(&[
///     Instruction::label("top"),
///     Instruction::branch("c", "top", "done"),
///     Instruction::label("done"),
///     Instruction::ret(&[]),
/// ])?;
///
/// // "top" has a back edge, so an entry block was synthesized in front of it
/// assert_eq!(cfg.block_count(), 3);
/// assert_eq!(cfg.entry_name(), "entry.0");
/// assert!(cfg.dominates("top", "done")?);
/// # Ok::<(), brilopt::Error>(())
/// ```
#[derive(Debug)]
pub struct ControlFlowGraph {
    graph: DirectedGraph<CfgNode>,
    names: HashMap<String, NodeId>,
    order: Vec<NodeId>,
    entry: NodeId,
    reversed: bool,
    dominance: OnceLock<Dominance>,
    loops: OnceLock<LoopForest>,
}

impl ControlFlowGraph {
    /// Splits `instrs` into blocks and builds the graph.
    ///
    /// # Errors
    ///
    /// See [`from_blocks`](Self::from_blocks).
    pub fn from_instructions(instrs: &[Instruction]) -> Result<Self> {
        Self::from_blocks(split_blocks(instrs)?)
    }

    /// Builds the graph from blocks in function order.
    ///
    /// # Errors
    ///
    /// - [`Error::DuplicateBlock`] if two blocks share a name
    /// - [`Error::UnknownLabel`] if a branch names a block that does not exist
    /// - [`Error::Malformed`] if `blocks` is empty
    pub fn from_blocks(blocks: Vec<Block>) -> Result<Self> {
        Self::from_blocks_with_prefix(blocks, DEFAULT_ENTRY_PREFIX)
    }

    /// Builds the graph, naming a synthesized entry block `<prefix>.<n>`.
    ///
    /// # Errors
    ///
    /// See [`from_blocks`](Self::from_blocks).
    pub fn from_blocks_with_prefix(blocks: Vec<Block>, entry_prefix: &str) -> Result<Self> {
        if blocks.is_empty() {
            return Err(malformed_error!(
                "Cannot create a control flow graph from an empty block list"
            ));
        }

        let mut names = HashMap::with_capacity(blocks.len() + 1);
        for block in &blocks {
            if names.insert(block.name().to_string(), NodeId::new(0)).is_some() {
                return Err(Error::DuplicateBlock(block.name().to_string()));
            }
        }

        let targets: Vec<Vec<String>> = blocks
            .iter()
            .map(|b| b.targets().into_iter().map(str::to_string).collect())
            .collect();
        for (block, labels) in blocks.iter().zip(&targets) {
            if let Some(label) = labels.iter().find(|l| !names.contains_key(l.as_str())) {
                return Err(Error::UnknownLabel {
                    block: block.name().to_string(),
                    label: label.clone(),
                });
            }
        }

        let first_has_predecessor = targets
            .iter()
            .flatten()
            .any(|label| label == blocks[0].name());

        let mut graph = DirectedGraph::with_capacity(blocks.len() + 1);
        let mut order = Vec::with_capacity(blocks.len() + 1);

        if first_has_predecessor {
            let name = fresh_name(entry_prefix, &names);
            debug!(entry = %name, header = blocks[0].name(), "synthesizing entry block");
            let block = Block::labeled(name.clone(), vec![Instruction::jump(blocks[0].name())]);
            let id = graph.add_node(CfgNode::new(block, BTreeMap::new(), true));
            names.insert(name, id);
            order.push(id);
        }

        // Versions count redefinitions across blocks in block order
        let mut versions: HashMap<String, u32> = HashMap::new();
        for block in blocks {
            let mut annotated = BTreeMap::new();
            for var in block.defined_vars() {
                let version = *versions
                    .entry(var.to_string())
                    .and_modify(|v| *v += 1)
                    .or_insert(0);
                annotated.insert(var.to_string(), version);
            }
            let name = block.name().to_string();
            let id = graph.add_node(CfgNode::new(block, annotated, false));
            names.insert(name, id);
            order.push(id);
        }

        let first_real = usize::from(first_has_predecessor);
        if first_has_predecessor {
            graph.add_edge(order[0], order[1])?;
        }
        for (offset, labels) in targets.iter().enumerate() {
            let source = order[first_real + offset];
            for label in labels {
                graph.add_edge(source, names[label.as_str()])?;
            }
        }

        debug!(
            blocks = graph.node_count(),
            edges = graph.edge_count(),
            "built control flow graph"
        );

        Ok(ControlFlowGraph {
            graph,
            names,
            entry: order[0],
            order,
            reversed: false,
            dominance: OnceLock::new(),
            loops: OnceLock::new(),
        })
    }

    /// Returns the root node.
    #[must_use]
    pub fn entry(&self) -> NodeId {
        self.entry
    }

    /// Returns the name of the root block.
    #[must_use]
    pub fn entry_name(&self) -> &str {
        self.name_of(self.entry)
    }

    /// Returns `true` if the root was synthesized during construction.
    #[must_use]
    pub fn has_synthetic_entry(&self) -> bool {
        self.node(self.entry).is_some_and(CfgNode::is_synthetic)
    }

    /// Returns the number of blocks, synthesized entry included.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns node ids in block order.
    #[must_use]
    pub fn node_ids(&self) -> &[NodeId] {
        &self.order
    }

    /// Returns the node for `id`.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&CfgNode> {
        self.graph.node(id)
    }

    /// Returns the nodes in block order.
    pub fn nodes(&self) -> impl Iterator<Item = &CfgNode> + '_ {
        self.order.iter().filter_map(|&id| self.graph.node(id))
    }

    /// Returns the block names in block order.
    pub fn block_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.nodes().map(CfgNode::name)
    }

    /// Looks up a node id by block name.
    #[must_use]
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// Looks up a node id by block name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BlockNotFound`] if no block has that name.
    pub fn require(&self, name: &str) -> Result<NodeId> {
        self.node_id(name)
            .ok_or_else(|| Error::BlockNotFound(name.to_string()))
    }

    /// Returns the block name of `id`, or `""` for an unknown id.
    #[must_use]
    pub fn name_of(&self, id: NodeId) -> &str {
        self.graph.node(id).map_or("", CfgNode::name)
    }

    /// Returns the successors of `id` in the current orientation.
    pub fn successors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.successors(id)
    }

    /// Returns the predecessors of `id` in the current orientation.
    pub fn predecessors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.predecessors(id)
    }

    /// Returns the names of the successors of block `name`, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BlockNotFound`] if no block has that name.
    pub fn successor_names(&self, name: &str) -> Result<BTreeSet<&str>> {
        let id = self.require(name)?;
        Ok(self.successors(id).map(|s| self.name_of(s)).collect())
    }

    /// Returns the names of the predecessors of block `name`, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BlockNotFound`] if no block has that name.
    pub fn predecessor_names(&self, name: &str) -> Result<BTreeSet<&str>> {
        let id = self.require(name)?;
        Ok(self.predecessors(id).map(|p| self.name_of(p)).collect())
    }

    /// Returns `true` if the graph is currently reversed.
    #[must_use]
    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Swaps predecessors and successors on every node.
    ///
    /// Used by backward analyses. Calling it twice restores the original graph.
    /// Cached dominance and loop information are kept, they describe the forward
    /// orientation.
    pub fn switch_directions(&mut self) {
        self.graph.reverse();
        self.reversed = !self.reversed;
    }

    /// Returns the dominance facts, computing them on first access.
    ///
    /// Dominance is always computed over the forward edges from the entry block.
    #[must_use]
    pub fn dominance(&self) -> &Dominance {
        self.dominance.get_or_init(|| {
            if self.reversed {
                algorithms::compute_dominance(&Forward(self))
            } else {
                algorithms::compute_dominance(self)
            }
        })
    }

    /// Returns every block's dominator set by name.
    #[must_use]
    pub fn dominators(&self) -> BTreeMap<String, BTreeSet<String>> {
        let dominance = self.dominance();
        self.by_name(|id| self.names_of(dominance.dominators(id).iter()))
    }

    /// Returns, for every block, the set of blocks it dominates (itself included).
    #[must_use]
    pub fn dominatees(&self) -> BTreeMap<String, BTreeSet<String>> {
        let dominance = self.dominance();
        self.by_name(|id| self.names_of(dominance.dominatees(id).iter()))
    }

    /// Returns, for every block, its children in the dominator tree sorted by name.
    #[must_use]
    pub fn immediate_dominators(&self) -> BTreeMap<String, Vec<String>> {
        let dominance = self.dominance();
        self.by_name(|id| {
            self.names_of(dominance.children(id).iter().copied())
                .into_iter()
                .collect()
        })
    }

    /// Returns every block's dominance frontier by name.
    #[must_use]
    pub fn dominance_frontiers(&self) -> BTreeMap<String, BTreeSet<String>> {
        let dominance = self.dominance();
        self.by_name(|id| self.names_of(dominance.frontier(id).iter()))
    }

    /// Returns `true` if block `a` dominates block `b`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BlockNotFound`] if either block does not exist.
    pub fn dominates(&self, a: &str, b: &str) -> Result<bool> {
        let (a, b) = (self.require(a)?, self.require(b)?);
        Ok(self.dominance().dominates(a, b))
    }

    /// Checks dominance by searching for a path from the entry to `target` that
    /// avoids `candidate`. Slow; meant for verification.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BlockNotFound`] if either block does not exist.
    pub fn dominates_by_paths(&self, candidate: &str, target: &str) -> Result<bool> {
        let (candidate, target) = (self.require(candidate)?, self.require(target)?);
        Ok(if self.reversed {
            algorithms::dominates_by_paths(&Forward(self), self.entry, candidate, target)
        } else {
            algorithms::dominates_by_paths(self, self.entry, candidate, target)
        })
    }

    /// Returns the natural loops, computing them on first access.
    ///
    /// Like [`dominance`](Self::dominance), loops always follow the forward edges.
    #[must_use]
    pub fn loops(&self) -> &LoopForest {
        self.loops.get_or_init(|| {
            if self.reversed {
                detect_loops(&Forward(self), self.dominance())
            } else {
                detect_loops(self, self.dominance())
            }
        })
    }

    /// Consumes the graph and returns its blocks in block order.
    #[must_use]
    pub fn into_blocks(self) -> Vec<Block> {
        let mut slots: Vec<Option<CfgNode>> =
            self.graph.into_nodes().into_iter().map(Some).collect();
        self.order
            .iter()
            .filter_map(|id| slots[id.index()].take())
            .map(CfgNode::into_block)
            .collect()
    }

    /// Renders the graph in Graphviz DOT format.
    #[must_use]
    pub fn to_dot(&self, title: Option<&str>) -> String {
        let mut dot = DotWriter::new(title.unwrap_or("cfg"));
        for node in self.nodes() {
            let mut label = format!("{}\n", node.name());
            for instr in node.block().operations() {
                let _ = writeln!(label, "{instr}");
            }
            dot.node(node.name(), &label);
        }
        for &id in &self.order {
            for succ in self.successors(id) {
                dot.edge(self.name_of(id), self.name_of(succ));
            }
        }
        dot.finish()
    }

    fn names_of(&self, ids: impl Iterator<Item = NodeId>) -> BTreeSet<String> {
        ids.map(|id| self.name_of(id).to_string()).collect()
    }

    fn by_name<T>(&self, f: impl Fn(NodeId) -> T) -> BTreeMap<String, T> {
        self.order
            .iter()
            .map(|&id| (self.name_of(id).to_string(), f(id)))
            .collect()
    }
}

/// Returns the first `<prefix>.<n>` not already used as a block name.
fn fresh_name(prefix: &str, names: &HashMap<String, NodeId>) -> String {
    (0..)
        .map(|n| format!("{prefix}.{n}"))
        .find(|candidate| !names.contains_key(candidate))
        .unwrap_or_else(|| prefix.to_string())
}

impl GraphBase for ControlFlowGraph {
    fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        self.order.iter().copied()
    }
}

impl Successors for ControlFlowGraph {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.graph.successors(node)
    }
}

impl Predecessors for ControlFlowGraph {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.graph.predecessors(node)
    }
}

impl RootedGraph for ControlFlowGraph {
    fn entry(&self) -> NodeId {
        self.entry
    }
}

/// The forward orientation of a graph that is currently reversed.
struct Forward<'a>(&'a ControlFlowGraph);

impl GraphBase for Forward<'_> {
    fn node_count(&self) -> usize {
        self.0.graph.node_count()
    }

    fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        self.0.order.iter().copied()
    }
}

impl Successors for Forward<'_> {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.0.graph.predecessors(node)
    }
}

impl Predecessors for Forward<'_> {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.0.graph.successors(node)
    }
}

impl RootedGraph for Forward<'_> {
    fn entry(&self) -> NodeId {
        self.0.entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Type;

    fn int() -> Type {
        Type::primitive("int")
    }

    /// entry branches to left/right, both jump to join
    fn diamond() -> Vec<Instruction> {
        vec![
            Instruction::label("entry"),
            Instruction::constant("c", Type::primitive("bool"), true),
            Instruction::branch("c", "left", "right"),
            Instruction::label("left"),
            Instruction::constant("x", int(), 1),
            Instruction::jump("join"),
            Instruction::label("right"),
            Instruction::constant("x", int(), 2),
            Instruction::jump("join"),
            Instruction::label("join"),
            Instruction::effect("print", &["x"]),
        ]
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_edges_are_symmetric() {
        let cfg = ControlFlowGraph::from_instructions(&diamond()).unwrap();
        for id in cfg.node_ids().to_vec() {
            for succ in cfg.successors(id) {
                assert!(cfg.predecessors(succ).any(|p| p == id));
            }
        }
        assert_eq!(
            cfg.successor_names("entry").unwrap(),
            ["left", "right"].into_iter().collect()
        );
        assert!(!cfg.has_synthetic_entry());
    }

    #[test]
    fn test_unknown_label() {
        let result = ControlFlowGraph::from_instructions(&[
            Instruction::label("a"),
            Instruction::jump("missing"),
        ]);
        match result {
            Err(Error::UnknownLabel { block, label }) => {
                assert_eq!(block, "a");
                assert_eq!(label, "missing");
            }
            other => panic!("expected UnknownLabel, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_block_list() {
        assert!(matches!(
            ControlFlowGraph::from_blocks(Vec::new()),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn test_entry_synthesis() {
        let cfg = ControlFlowGraph::from_instructions(&[
            Instruction::label("loop"),
            Instruction::branch("c", "loop", "out"),
            Instruction::label("out"),
            Instruction::ret(&[]),
        ])
        .unwrap();

        assert!(cfg.has_synthetic_entry());
        assert_eq!(cfg.entry_name(), "entry.0");
        assert!(cfg.predecessor_names("entry.0").unwrap().is_empty());
        assert_eq!(
            cfg.predecessor_names("loop").unwrap(),
            ["entry.0", "loop"].into_iter().collect()
        );
        assert_eq!(cfg.dominators()["loop"], set(&["entry.0", "loop"]));
    }

    #[test]
    fn test_entry_name_avoids_collision() {
        let blocks = vec![
            Block::labeled("entry.0", vec![Instruction::jump("entry.0")]),
        ];
        let cfg = ControlFlowGraph::from_blocks(blocks).unwrap();
        assert_eq!(cfg.entry_name(), "entry.1");
    }

    #[test]
    fn test_annotated_definitions() {
        let cfg = ControlFlowGraph::from_instructions(&diamond()).unwrap();
        let version = |block: &str| {
            let id = cfg.node_id(block).unwrap();
            cfg.node(id).unwrap().annotated_definitions().get("x").copied()
        };
        assert_eq!(version("left"), Some(0));
        assert_eq!(version("right"), Some(1));
        assert_eq!(version("join"), None);
    }

    #[test]
    fn test_diamond_dominance() {
        let cfg = ControlFlowGraph::from_instructions(&diamond()).unwrap();

        assert_eq!(cfg.dominators()["join"], set(&["entry", "join"]));
        assert_eq!(cfg.dominance_frontiers()["left"], set(&["join"]));
        assert_eq!(cfg.dominance_frontiers()["right"], set(&["join"]));
        assert_eq!(
            cfg.immediate_dominators()["entry"],
            vec!["join".to_string(), "left".to_string(), "right".to_string()]
        );
        assert_eq!(cfg.dominatees()["left"], set(&["left"]));
        assert!(cfg.dominates_by_paths("entry", "join").unwrap());
        assert!(!cfg.dominates_by_paths("left", "join").unwrap());
    }

    #[test]
    fn test_switch_directions_round_trip() {
        let mut cfg = ControlFlowGraph::from_instructions(&diamond()).unwrap();
        cfg.switch_directions();
        assert!(cfg.is_reversed());
        assert_eq!(
            cfg.successor_names("join").unwrap(),
            ["left", "right"].into_iter().collect()
        );
        cfg.switch_directions();
        assert_eq!(
            cfg.predecessor_names("join").unwrap(),
            ["left", "right"].into_iter().collect()
        );
        assert_eq!(cfg.dominators()["join"], set(&["entry", "join"]));
    }

    #[test]
    fn test_dominance_while_reversed_follows_forward_edges() {
        let forward = ControlFlowGraph::from_instructions(&diamond()).unwrap();
        let mut cfg = ControlFlowGraph::from_instructions(&diamond()).unwrap();
        cfg.switch_directions();

        assert_eq!(cfg.dominators(), forward.dominators());
        assert_eq!(cfg.dominance_frontiers(), forward.dominance_frontiers());
        assert!(cfg.dominates_by_paths("entry", "join").unwrap());
        assert!(!cfg.dominates_by_paths("left", "join").unwrap());

        cfg.switch_directions();
        assert_eq!(cfg.immediate_dominators(), forward.immediate_dominators());
    }

    #[test]
    fn test_loops_while_reversed_follow_forward_edges() {
        let mut cfg = ControlFlowGraph::from_instructions(&[
            Instruction::label("start"),
            Instruction::jump("head"),
            Instruction::label("head"),
            Instruction::branch("c", "body", "done"),
            Instruction::label("body"),
            Instruction::jump("head"),
            Instruction::label("done"),
            Instruction::ret(&[]),
        ])
        .unwrap();
        cfg.switch_directions();

        let head = cfg.node_id("head").unwrap();
        let body = cfg.node_id("body").unwrap();
        let forest = cfg.loops();
        assert_eq!(forest.len(), 1);
        let info = forest.loop_for_header(head).unwrap();
        assert!(info.contains(body));
        assert_eq!(info.size(), 2);
    }

    #[test]
    fn test_to_dot() {
        let cfg = ControlFlowGraph::from_instructions(&diamond()).unwrap();
        let dot = cfg.to_dot(Some("main"));
        assert!(dot.contains("\"entry\" -> \"left\";"));
        assert!(dot.contains("x: int = const 1;"));
    }

    #[test]
    fn test_into_blocks_keeps_order() {
        let cfg = ControlFlowGraph::from_instructions(&diamond()).unwrap();
        let names: Vec<String> = cfg
            .into_blocks()
            .iter()
            .map(|b| b.name().to_string())
            .collect();
        assert_eq!(names, vec!["entry", "left", "right", "join"]);
    }
}
