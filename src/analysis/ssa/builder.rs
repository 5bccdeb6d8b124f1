//! SSA construction (Cytron et al.).
//!
//! This module implements the classic construction from:
//!
//! > Cytron et al., "Efficiently Computing Static Single Assignment Form and the
//! > Control Dependence Graph", ACM TOPLAS 1991
//!
//! # Algorithm Overview
//!
//! 1. **Definition Sites**: collect, per variable, the blocks that assign it
//! 2. **Phi Placement**: insert a phi for the variable in every block of the iterated
//!    dominance frontier of its definition sites
//! 3. **Variable Renaming**: walk the dominator tree from the root, giving every
//!    definition a fresh `name.N` version and rewriting uses to the version on top of
//!    the per-variable stack
//!
//! Function parameters start out bound to their own names. A use with no binding on
//! the current path reads the undefined sentinel (see
//! [`SsaBuilder::with_undefined_name`]) instead of failing.
//!
//! # Usage
//!
//! ```rust
//! use brilopt::analysis::{ssa::SsaBuilder, ControlFlowGraph};
//! use brilopt::ir::{Instruction, Type};
//!
//! let int = Type::primitive("int");
//! let cfg = ControlFlowGraph::from_instructions(&[
//!     Instruction::label("top"),
//!     Instruction::constant("x", int.clone(), 1),
//!     Instruction::value_op("add", "x", int, &["x", "x"]),
//!     Instruction::effect("print", &["x"]),
//! ])?;
//!
//! let ssa = SsaBuilder::new(&cfg).build::<&str>(&[])?;
//! let dests: Vec<_> = ssa.blocks[0].destinations().collect();
//! assert_eq!(dests, vec!["x.0", "x.1"]);
//! # Ok::<(), brilopt::Error>(())
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, trace};

use crate::{
    analysis::{cfg::ControlFlowGraph, ssa::phi::PhiSet},
    ir::{flatten, Block, Instruction, Type},
    utils::graph::NodeId,
    Result,
};

/// Default name read by uses that have no reaching definition.
pub const DEFAULT_UNDEFINED_NAME: &str = "__undefined";

/// The outcome of SSA construction for one function.
#[derive(Debug, Clone, Default)]
pub struct SsaForm {
    /// Rewritten blocks in block order, synthesized entry included
    pub blocks: Vec<Block>,
    /// Materialized phis per block, sorted by variable
    pub phis: BTreeMap<String, Vec<PhiSet>>,
    /// Number of definitions given a fresh version (phis included)
    pub renamed: usize,
    /// Number of reads that fell back to the undefined sentinel
    pub undefined_uses: usize,
}

impl SsaForm {
    /// Returns the total number of phi instructions inserted.
    #[must_use]
    pub fn phi_count(&self) -> usize {
        self.phis.values().map(Vec::len).sum()
    }

    /// Flattens the blocks back into a single instruction stream.
    #[must_use]
    pub fn into_instructions(self) -> Vec<Instruction> {
        flatten(self.blocks)
    }
}

/// Builds SSA form over an already constructed [`ControlFlowGraph`].
///
/// Version counters and name stacks are owned by the builder, so separate builders
/// never influence each other's names.
pub struct SsaBuilder<'cfg> {
    cfg: &'cfg ControlFlowGraph,
    undefined: String,
    /// Next version per variable
    counters: HashMap<String, u32>,
    /// Current binding stack per variable
    stacks: HashMap<String, Vec<String>>,
    /// Phis per node index, keyed by variable
    phis: Vec<BTreeMap<String, PhiSet>>,
    /// Renamed instructions per node index; `None` for unreachable blocks
    renamed: Vec<Option<Vec<Instruction>>>,
    definitions: usize,
    undefined_uses: usize,
}

impl<'cfg> SsaBuilder<'cfg> {
    /// Creates a builder for `cfg`.
    #[must_use]
    pub fn new(cfg: &'cfg ControlFlowGraph) -> Self {
        let count = cfg.block_count();
        SsaBuilder {
            cfg,
            undefined: DEFAULT_UNDEFINED_NAME.to_string(),
            counters: HashMap::new(),
            stacks: HashMap::new(),
            phis: vec![BTreeMap::new(); count],
            renamed: vec![None; count],
            definitions: 0,
            undefined_uses: 0,
        }
    }

    /// Sets the name read by uses without a reaching definition.
    #[must_use]
    pub fn with_undefined_name(mut self, name: impl Into<String>) -> Self {
        self.undefined = name.into();
        self
    }

    /// Places phis, renames every definition and use, and returns the rewritten
    /// blocks. `params` are the enclosing function's parameter names.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`](crate::Error::Malformed) if the graph is currently
    /// reversed.
    pub fn build<S: AsRef<str>>(mut self, params: &[S]) -> Result<SsaForm> {
        if self.cfg.is_reversed() {
            return Err(malformed_error!(
                "SSA construction requires a forward control flow graph"
            ));
        }

        for param in params {
            let param = param.as_ref();
            self.stacks
                .insert(param.to_string(), vec![param.to_string()]);
        }

        self.place_phis();
        self.rename(self.cfg.entry());
        Ok(self.materialize())
    }

    /// Returns, per variable, its definition blocks in block order and the type of
    /// its first definition.
    fn definition_sites(&self) -> BTreeMap<String, (Vec<NodeId>, Option<Type>)> {
        let mut sites: BTreeMap<String, (Vec<NodeId>, Option<Type>)> = BTreeMap::new();
        for &id in self.cfg.node_ids() {
            let Some(node) = self.cfg.node(id) else {
                continue;
            };
            for instr in node.block().instructions() {
                let Some(dest) = instr.dest.as_deref() else {
                    continue;
                };
                let (blocks, ty) = sites
                    .entry(dest.to_string())
                    .or_insert_with(|| (Vec::new(), instr.ty.clone()));
                if blocks.last() != Some(&id) {
                    blocks.push(id);
                }
                if ty.is_none() {
                    ty.clone_from(&instr.ty);
                }
            }
        }
        sites
    }

    fn place_phis(&mut self) {
        let cfg = self.cfg;
        let dominance = cfg.dominance();
        let mut placed = 0usize;

        for (variable, (blocks, ty)) in self.definition_sites() {
            for site in dominance.iterated_frontier(blocks.iter().copied()).iter() {
                trace!(
                    variable = %variable,
                    block = cfg.name_of(site),
                    "placing phi"
                );
                self.phis[site.index()]
                    .insert(variable.clone(), PhiSet::new(&variable, ty.clone()));
                placed += 1;
            }
        }

        debug!(phis = placed, "placed phi instructions");
    }

    /// Pushes and returns a fresh version of `variable`.
    fn push_fresh(&mut self, variable: &str) -> String {
        let counter = self.counters.entry(variable.to_string()).or_insert(0);
        let name = format!("{variable}.{counter}");
        *counter += 1;
        self.stacks
            .entry(variable.to_string())
            .or_default()
            .push(name.clone());
        self.definitions += 1;
        name
    }

    /// Returns the binding of `variable` on the current path.
    fn current(&mut self, variable: &str, block: &str) -> String {
        match self.stacks.get(variable).and_then(|stack| stack.last()) {
            Some(name) => name.clone(),
            None => {
                debug!(variable, block, "use without a reaching definition");
                self.undefined_uses += 1;
                self.undefined.clone()
            }
        }
    }

    fn rename(&mut self, node: NodeId) {
        let cfg = self.cfg;
        let Some(cfg_node) = cfg.node(node) else {
            return;
        };
        let name = cfg_node.name();
        let snapshot = self.stacks.clone();

        let phi_vars: Vec<String> = self.phis[node.index()].keys().cloned().collect();
        for variable in phi_vars {
            let dest = self.push_fresh(&variable);
            if let Some(phi) = self.phis[node.index()].get_mut(&variable) {
                phi.set_dest(dest);
            }
        }

        let mut instrs = cfg_node.block().instructions().to_vec();
        for instr in &mut instrs {
            for arg in &mut instr.args {
                *arg = self.current(arg, name);
            }
            if let Some(dest) = instr.dest.as_mut() {
                *dest = self.push_fresh(dest);
            }
        }
        self.renamed[node.index()] = Some(instrs);

        for succ in cfg.successors(node) {
            let phi_vars: Vec<String> = self.phis[succ.index()].keys().cloned().collect();
            for variable in phi_vars {
                let value = self.current(&variable, name);
                if let Some(phi) = self.phis[succ.index()].get_mut(&variable) {
                    phi.add_operand(name, value);
                }
            }
        }

        let mut children = cfg.dominance().children(node).to_vec();
        children.sort_by(|a, b| cfg.name_of(*a).cmp(cfg.name_of(*b)));
        for child in children {
            self.rename(child);
        }

        self.stacks = snapshot;
    }

    fn materialize(mut self) -> SsaForm {
        let cfg = self.cfg;

        // Every block a phi names as a source must carry a label
        let sources: BTreeSet<String> = self
            .phis
            .iter()
            .flat_map(BTreeMap::values)
            .flat_map(|phi| phi.operands().iter().map(|op| op.predecessor.clone()))
            .collect();

        let mut blocks = Vec::with_capacity(cfg.block_count());
        let mut phis = BTreeMap::new();

        for &id in cfg.node_ids() {
            let Some(node) = cfg.node(id) else {
                continue;
            };
            let instrs = self.renamed[id.index()]
                .take()
                .unwrap_or_else(|| node.block().instructions().to_vec());
            let mut block = Block::new(node.name(), instrs);
            if sources.contains(node.name()) {
                block.ensure_label();
            }

            let placed = std::mem::take(&mut self.phis[id.index()]);
            if !placed.is_empty() {
                let at = block.body_start();
                let instrs = block.instructions_mut();
                for (offset, phi) in placed.values().enumerate() {
                    instrs.insert(at + offset, phi.to_instruction());
                }
                phis.insert(node.name().to_string(), placed.into_values().collect());
            }
            blocks.push(block);
        }

        debug!(
            blocks = blocks.len(),
            renamed = self.definitions,
            undefined_uses = self.undefined_uses,
            "built ssa form"
        );

        SsaForm {
            blocks,
            phis,
            renamed: self.definitions,
            undefined_uses: self.undefined_uses,
        }
    }
}
