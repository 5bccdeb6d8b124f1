//! Control-flow graph nodes.

use std::collections::BTreeMap;

use crate::ir::Block;

/// A basic block placed in a [`ControlFlowGraph`](crate::analysis::ControlFlowGraph).
///
/// Besides the block itself a node carries its *annotated definitions*: for each
/// variable the block assigns, a version number drawn from a per-graph counter that
/// increases every time a block earlier in block order redefined the same name. This
/// is a cheap, order-dependent proxy for reaching definitions, not an SSA numbering.
///
/// Adjacency lives in the graph, keyed by node id; see
/// [`ControlFlowGraph::predecessor_names`](crate::analysis::ControlFlowGraph::predecessor_names).
#[derive(Debug, Clone)]
pub struct CfgNode {
    block: Block,
    annotated: BTreeMap<String, u32>,
    synthetic: bool,
}

impl CfgNode {
    pub(crate) fn new(block: Block, annotated: BTreeMap<String, u32>, synthetic: bool) -> Self {
        CfgNode {
            block,
            annotated,
            synthetic,
        }
    }

    /// Returns the block name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.block.name()
    }

    /// Returns the wrapped block.
    #[must_use]
    pub fn block(&self) -> &Block {
        &self.block
    }

    /// Returns the annotated definitions of this block: variable to version.
    #[must_use]
    pub fn annotated_definitions(&self) -> &BTreeMap<String, u32> {
        &self.annotated
    }

    /// Returns `true` for an entry block created during graph construction.
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    pub(crate) fn into_block(self) -> Block {
        self.block
    }
}
