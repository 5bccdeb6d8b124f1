//! Loop Invariant Code Motion (LICM) Pass.
//!
//! This pass moves computations that produce the same value on every iteration out
//! of natural loops and into a freshly synthesized preheader block.
//!
//! # Algorithm
//!
//! An instruction is loop-invariant if:
//! 1. It has a destination and no side effects
//! 2. Its destination is assigned exactly once inside the loop
//! 3. Its destination is not live on entry to the header
//! 4. Every argument is either not assigned inside the loop, or assigned by exactly
//!    one instruction of the loop that is itself invariant
//!
//! Rule 3 keeps values that the loop or a zero-trip exit reads before the assignment
//! in place. Phi operands count as reads at the end of the block they are labelled
//! with, so SSA input is not held back by its own header phis.
//!
//! Marking repeats until a scan over the loop adds nothing. Loops are processed
//! outermost first and an instruction is hoisted only once, into the outermost loop
//! it is invariant in.
//!
//! # Example
//!
//! ```text
//! // Before LICM                  // After LICM
//! .start:                         .start:
//!     x: int = const 0;               x: int = const 0;
//!     jmp .header;                    jmp .preheader.0;
//!                                 .preheader.0:
//!                                     y: int = const 5;
//!                                     jmp .header;
//! .header:                        .header:
//!     br c .body .exit;               br c .body .exit;
//! .body:                          .body:
//!     x: int = add x one;             x: int = add x one;
//!     y: int = const 5;               jmp .header;
//!     jmp .header;
//! ```
//!
//! Fallthrough is made explicit before the graph is built. Every edge entering the
//! header from outside the loop is then retargeted to the preheader.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, trace};

use crate::{
    analysis::{
        cfg::{ControlFlowGraph, LoopInfo, DEFAULT_ENTRY_PREFIX},
        dataflow::{AnalysisResults, DataFlowAnalysis, DataFlowSolver, Direction, Fact, FactMap},
        CfgNode,
    },
    compiler::{
        events::{EventKind, EventLog},
        pass::Pass,
    },
    config::DEFAULT_PREHEADER_PREFIX,
    ir::{
        add_terminators, flatten, instruction::OP_PHI, split_blocks, Block, Function,
        Instruction,
    },
    utils::graph::NodeId,
    Result,
};

/// An instruction moved out of a loop.
#[derive(Debug, Clone, PartialEq)]
pub struct HoistedInstruction {
    /// Block the instruction was taken from
    pub block: String,
    /// Preheader it was moved to
    pub preheader: String,
    /// The instruction itself
    pub instr: Instruction,
}

/// The result of one LICM round over a function.
#[derive(Debug, Clone, Default)]
pub struct LicmOutcome {
    /// Rewritten blocks in order
    pub blocks: Vec<Block>,
    /// `(preheader, header)` for every inserted preheader
    pub preheaders: Vec<(String, String)>,
    /// Moved instructions in preheader order
    pub hoisted: Vec<HoistedInstruction>,
    /// `(block, preheader)` for every branch redirected away from a header
    pub retargeted: Vec<(String, String)>,
    /// Headers of loops with invariants that were left alone
    pub skipped: Vec<String>,
}

impl LicmOutcome {
    /// Returns true if any instruction moved.
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.hoisted.is_empty()
    }
}

/// What to do for one loop, expressed by block name so it survives
/// consuming the graph.
struct LoopPlan {
    header: String,
    body: HashSet<String>,
    entering: Vec<String>,
    hoist: Vec<(String, usize)>,
}

/// Loop Invariant Code Motion Pass.
#[derive(Debug, Clone)]
pub struct LicmPass {
    entry_prefix: String,
    preheader_prefix: String,
    rounds: usize,
}

impl Default for LicmPass {
    fn default() -> Self {
        Self::new()
    }
}

impl LicmPass {
    /// Creates a new LICM pass running a single round.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entry_prefix: DEFAULT_ENTRY_PREFIX.to_string(),
            preheader_prefix: DEFAULT_PREHEADER_PREFIX.to_string(),
            rounds: 1,
        }
    }

    /// Sets the prefixes for synthesized entry and preheader blocks.
    #[must_use]
    pub fn with_prefixes(
        mut self,
        entry_prefix: impl Into<String>,
        preheader_prefix: impl Into<String>,
    ) -> Self {
        self.entry_prefix = entry_prefix.into();
        self.preheader_prefix = preheader_prefix.into();
        self
    }

    /// Sets the maximum number of rounds per function. Later rounds only run while
    /// the previous one changed something.
    #[must_use]
    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds.max(1);
        self
    }

    /// Runs one round of code motion over `blocks`.
    ///
    /// Fallthrough is made explicit first, so the returned blocks end in terminators.
    /// A synthesized entry block is used for the analysis only and never emitted.
    ///
    /// # Errors
    ///
    /// Returns graph construction errors, see [`ControlFlowGraph::from_blocks`].
    pub fn hoist(&self, mut blocks: Vec<Block>) -> Result<LicmOutcome> {
        add_terminators(&mut blocks);
        let mut cfg = ControlFlowGraph::from_blocks_with_prefix(blocks, &self.entry_prefix)?;
        let live = DataFlowSolver::new(EdgeLiveness::new(&cfg)).solve(&mut cfg);
        let (plans, skipped) = plan_loops(&cfg, &live);
        let synthetic = cfg.has_synthetic_entry();

        let mut blocks = cfg.into_blocks();
        if synthetic && !blocks.is_empty() {
            blocks.remove(0);
        }

        let mut outcome = LicmOutcome {
            skipped,
            ..LicmOutcome::default()
        };
        if plans.is_empty() {
            outcome.blocks = blocks;
            return Ok(outcome);
        }

        self.apply(blocks, plans, &mut outcome);
        Ok(outcome)
    }

    fn apply(&self, mut blocks: Vec<Block>, plans: Vec<LoopPlan>, outcome: &mut LicmOutcome) {
        let mut used: HashSet<String> = blocks.iter().map(|b| b.name().to_string()).collect();
        let mut next_id = 0usize;

        // Copy every hoisted instruction out before any index shifts
        let mut staged: Vec<Vec<(String, Instruction)>> = Vec::with_capacity(plans.len());
        let mut removals: HashSet<(String, usize)> = HashSet::new();
        for plan in &plans {
            let mut moved = Vec::with_capacity(plan.hoist.len());
            for (block, index) in &plan.hoist {
                let instr = blocks
                    .iter()
                    .find(|b| b.name() == block)
                    .and_then(|b| b.instructions().get(*index));
                if let Some(instr) = instr {
                    moved.push((block.clone(), instr.clone()));
                    removals.insert((block.clone(), *index));
                }
            }
            staged.push(moved);
        }

        for block in &mut blocks {
            let name = block.name().to_string();
            let mut index = 0usize;
            block.instructions_mut().retain(|_| {
                let keep = !removals.contains(&(name.clone(), index));
                index += 1;
                keep
            });
        }

        for (plan, moved) in plans.into_iter().zip(staged) {
            if moved.is_empty() {
                continue;
            }
            let preheader = loop {
                let candidate = format!("{}.{next_id}", self.preheader_prefix);
                next_id += 1;
                if used.insert(candidate.clone()) {
                    break candidate;
                }
            };

            for block in blocks.iter_mut() {
                let entering = plan.entering.iter().any(|e| e == block.name());
                let name = block.name().to_string();
                let is_header = name == plan.header;
                for instr in block.instructions_mut() {
                    if entering && instr.is_branch() {
                        for label in instr.labels.iter_mut().filter(|l| **l == plan.header) {
                            *label = preheader.clone();
                            outcome.retargeted.push((name.clone(), preheader.clone()));
                        }
                    } else if is_header && instr.op() == Some(OP_PHI) {
                        // the preheader is now the only way in from outside
                        for label in instr.labels.iter_mut() {
                            if plan.entering.contains(label) {
                                *label = preheader.clone();
                            }
                        }
                    }
                }
            }

            let Some(position) = blocks.iter().position(|b| b.name() == plan.header) else {
                continue;
            };

            debug!(
                header = %plan.header,
                preheader = %preheader,
                hoisted = moved.len(),
                "inserting preheader"
            );

            let mut body = Vec::with_capacity(moved.len() + 1);
            for (block, instr) in moved {
                trace!(from = %block, instr = %instr, "hoisting");
                outcome.hoisted.push(HoistedInstruction {
                    block,
                    preheader: preheader.clone(),
                    instr: instr.clone(),
                });
                body.push(instr);
            }
            body.push(Instruction::jump(plan.header.clone()));
            blocks.insert(position, Block::labeled(preheader.clone(), body));
            outcome.preheaders.push((preheader, plan.header));
        }

        outcome.blocks = blocks;
    }
}

/// Decides, outermost loop first, which instructions move where.
///
/// Returns the plans of loops with something to hoist, and the headers of loops that
/// had invariants but could not be given a preheader.
fn plan_loops(cfg: &ControlFlowGraph, live: &AnalysisResults) -> (Vec<LoopPlan>, Vec<String>) {
    let mut claimed: HashSet<(NodeId, usize)> = HashSet::new();
    let mut plans = Vec::new();
    let mut skipped = Vec::new();
    let empty = FactMap::new();

    for info in cfg.loops().outermost_first() {
        let live_in = live.input(cfg.name_of(info.header)).unwrap_or(&empty);
        let hoist: Vec<(NodeId, usize)> = mark_invariants(cfg, info, live_in)
            .into_iter()
            .filter(|site| !claimed.contains(site))
            .collect();
        if hoist.is_empty() {
            continue;
        }

        let header = cfg.name_of(info.header).to_string();
        let entering_ids: Vec<NodeId> = info.entering_blocks(cfg).collect();
        let header_has_phi = cfg.node(info.header).is_some_and(|node| {
            node.block()
                .operations()
                .any(|instr| instr.op() == Some(OP_PHI))
        });
        // One preheader cannot stand in for several phi sources
        if header_has_phi && entering_ids.len() > 1 {
            debug!(header = %header, "header phis merge several entries, not hoisting");
            skipped.push(header);
            continue;
        }

        claimed.extend(hoist.iter().copied());
        plans.push(LoopPlan {
            body: info
                .body
                .iter()
                .map(|id| cfg.name_of(id).to_string())
                .collect(),
            entering: entering_ids
                .into_iter()
                .filter(|&id| !cfg.node(id).is_some_and(CfgNode::is_synthetic))
                .map(|id| cfg.name_of(id).to_string())
                .collect(),
            hoist: hoist
                .into_iter()
                .map(|(id, index)| (cfg.name_of(id).to_string(), index))
                .collect(),
            header,
        });
    }

    (plans, skipped)
}

/// Returns `true` for instructions that may move at all.
fn is_movable(instr: &Instruction) -> bool {
    !instr.is_label() && instr.op().is_some() && instr.dest.is_some() && !instr.has_side_effects()
}

/// Marks the invariant instructions of one loop, in the order they were marked.
///
/// Marking order respects dependencies: an instruction is only marked after the
/// definitions it reads from. Destinations in `live_in` are never marked.
fn mark_invariants(
    cfg: &ControlFlowGraph,
    info: &LoopInfo,
    live_in: &FactMap,
) -> Vec<(NodeId, usize)> {
    let mut defs: HashMap<&str, Vec<(NodeId, usize)>> = HashMap::new();
    for id in info.body.iter() {
        let Some(node) = cfg.node(id) else {
            continue;
        };
        for (index, instr) in node.block().instructions().iter().enumerate() {
            if let Some(dest) = instr.dest.as_deref() {
                defs.entry(dest).or_default().push((id, index));
            }
        }
    }

    let mut invariant: HashSet<(NodeId, usize)> = HashSet::new();
    let mut marked = Vec::new();
    loop {
        let mut changed = false;
        for id in info.body.iter() {
            let Some(node) = cfg.node(id) else {
                continue;
            };
            for (index, instr) in node.block().instructions().iter().enumerate() {
                if invariant.contains(&(id, index)) || !is_movable(instr) {
                    continue;
                }
                let movable_dest = instr.dest.as_deref().is_some_and(|dest| {
                    !live_in.contains_key(dest) && defs.get(dest).is_some_and(|s| s.len() == 1)
                });
                let args_invariant = instr.args.iter().all(|arg| match defs.get(arg.as_str()) {
                    None => true,
                    Some(sites) => sites.len() == 1 && invariant.contains(&sites[0]),
                });
                if movable_dest && args_invariant {
                    invariant.insert((id, index));
                    marked.push((id, index));
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
    marked
}

/// Liveness that reads phi operands at the end of the block they are labelled with.
///
/// Without phis this agrees with [`LiveVariables`](crate::analysis::dataflow::LiveVariables).
struct EdgeLiveness {
    phi_operands: HashMap<String, BTreeSet<String>>,
}

impl EdgeLiveness {
    fn new(cfg: &ControlFlowGraph) -> Self {
        let mut phi_operands: HashMap<String, BTreeSet<String>> = HashMap::new();
        for node in cfg.nodes() {
            let phis = node
                .block()
                .operations()
                .filter(|instr| instr.op() == Some(OP_PHI));
            for phi in phis {
                for (arg, label) in phi.args.iter().zip(&phi.labels) {
                    phi_operands
                        .entry(label.clone())
                        .or_default()
                        .insert(arg.clone());
                }
            }
        }
        Self { phi_operands }
    }
}

impl DataFlowAnalysis for EdgeLiveness {
    const DIRECTION: Direction = Direction::Backward;

    fn merge(&self, inputs: &[&FactMap]) -> FactMap {
        inputs
            .iter()
            .flat_map(|facts| facts.iter())
            .map(|(var, fact)| (var.clone(), fact.clone()))
            .collect()
    }

    fn transfer(&self, node: &CfgNode, input: &FactMap) -> FactMap {
        let mut live = input.clone();
        if let Some(operands) = self.phi_operands.get(node.name()) {
            live.extend(operands.iter().map(|var| (var.clone(), Fact::Live)));
        }
        for instr in node.block().instructions().iter().rev() {
            if let Some(dest) = &instr.dest {
                live.remove(dest);
            }
            if instr.op() != Some(OP_PHI) {
                live.extend(instr.args.iter().map(|var| (var.clone(), Fact::Live)));
            }
        }
        live
    }
}

impl Pass for LicmPass {
    fn name(&self) -> &'static str {
        "licm"
    }

    fn description(&self) -> &'static str {
        "Moves loop-invariant computations to loop preheaders"
    }

    fn run_on_function(&self, function: &mut Function, events: &EventLog) -> Result<bool> {
        let mut changed = false;

        for round in 0..self.rounds {
            let outcome = self.hoist(split_blocks(&function.instrs)?)?;

            for header in &outcome.skipped {
                events
                    .record(EventKind::Warning)
                    .at(function.name.as_str(), header.as_str())
                    .message(format!("loop at {header} left in place"))
                    .pass(self.name());
            }
            for (preheader, header) in &outcome.preheaders {
                events
                    .record(EventKind::PreheaderInserted)
                    .at(function.name.as_str(), preheader.as_str())
                    .message(format!("{preheader} precedes {header}"))
                    .pass(self.name());
            }
            for hoisted in &outcome.hoisted {
                events
                    .record(EventKind::InstructionHoisted)
                    .at(function.name.as_str(), hoisted.block.as_str())
                    .message(hoisted.instr.to_string())
                    .pass(self.name());
            }
            for (block, preheader) in &outcome.retargeted {
                events
                    .record(EventKind::EdgeRetargeted)
                    .at(function.name.as_str(), block.as_str())
                    .message(format!("now jumps to {preheader}"))
                    .pass(self.name());
            }

            if !outcome.changed() {
                break;
            }
            debug!(
                function = %function.name,
                round,
                hoisted = outcome.hoisted.len(),
                "licm round finished"
            );
            function.instrs = flatten(outcome.blocks);
            changed = true;
        }

        Ok(changed)
    }
}
