//! Worklist-based data flow solver.
//!
//! # Algorithm
//!
//! 1. Every block starts with empty input and output mappings.
//! 2. All blocks are queued in block order.
//! 3. While the queue is non-empty:
//!    a. take a block and merge the outputs of its current predecessors (a block
//!       without predecessors merges a single empty mapping)
//!    b. store the merged mapping as the block's input and apply the transfer function
//!    c. if the result differs from the stored output, store it and queue every
//!       successor that is not already queued
//!
//! A backward analysis runs the same loop on the reversed graph and swaps the
//! resulting input/output pair back into program order. The graph is restored before
//! the solver returns.

use std::collections::{BTreeMap, VecDeque};

use tracing::trace;

use crate::{
    analysis::{
        cfg::ControlFlowGraph,
        dataflow::framework::{AnalysisResults, DataFlowAnalysis, Direction, FactMap},
    },
    utils::BitSet,
};

/// Iterative worklist solver for a [`DataFlowAnalysis`].
///
/// # Example
///
/// ```rust
/// use brilopt::analysis::{
///     dataflow::{DataFlowSolver, LiveVariables},
///     ControlFlowGraph,
/// };
/// use brilopt::ir::{Instruction, Type};
///
/// let mut cfg = ControlFlowGraph::from_instructions(&[
///     Instruction::label("top"),
///     Instruction::constant("x", Type::primitive("int"), 1),
///     Instruction::jump("use"),
///     Instruction::label("use"),
///     Instruction::effect("print", &["x"]),
/// ])?;
///
/// let results = DataFlowSolver::new(LiveVariables).solve(&mut cfg);
/// assert!(results.outputs["top"].contains_key("x"));
/// assert!(!results.inputs["top"].contains_key("x"));
/// # Ok::<(), brilopt::Error>(())
/// ```
pub struct DataFlowSolver<A: DataFlowAnalysis> {
    analysis: A,
    direction: Direction,
}

impl<A: DataFlowAnalysis> DataFlowSolver<A> {
    /// Creates a solver running `analysis` in its natural direction.
    #[must_use]
    pub fn new(analysis: A) -> Self {
        Self {
            analysis,
            direction: A::DIRECTION,
        }
    }

    /// Creates a solver running `analysis` in an explicit direction.
    #[must_use]
    pub fn with_direction(analysis: A, direction: Direction) -> Self {
        Self {
            analysis,
            direction,
        }
    }

    /// Returns the direction this solver runs in.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Runs the analysis to a fixpoint over `cfg`.
    ///
    /// The graph is temporarily reversed for backward analyses and left exactly as it
    /// was found.
    pub fn solve(&self, cfg: &mut ControlFlowGraph) -> AnalysisResults {
        let backward = self.direction == Direction::Backward;
        if backward {
            cfg.switch_directions();
        }

        let (inputs, outputs, iterations) = self.iterate(cfg);

        if backward {
            cfg.switch_directions();
        }

        let keyed = |facts: Vec<FactMap>| -> BTreeMap<String, FactMap> {
            cfg.node_ids()
                .iter()
                .map(|&id| (cfg.name_of(id).to_string(), facts[id.index()].clone()))
                .collect()
        };

        let (inputs, outputs) = if backward {
            (keyed(outputs), keyed(inputs))
        } else {
            (keyed(inputs), keyed(outputs))
        };

        AnalysisResults {
            inputs,
            outputs,
            iterations,
        }
    }

    fn iterate(&self, cfg: &ControlFlowGraph) -> (Vec<FactMap>, Vec<FactMap>, usize) {
        let count = cfg.block_count();
        let mut inputs = vec![FactMap::new(); count];
        let mut outputs = vec![FactMap::new(); count];

        let mut queued = BitSet::full(count);
        let mut worklist: VecDeque<_> = cfg.node_ids().iter().copied().collect();
        let mut iterations = 0;
        let empty = FactMap::new();

        while let Some(id) = worklist.pop_front() {
            queued.remove(id);
            iterations += 1;

            let mut incoming: Vec<&FactMap> = cfg
                .predecessors(id)
                .map(|pred| &outputs[pred.index()])
                .collect();
            if incoming.is_empty() {
                incoming.push(&empty);
            }
            let merged = self.analysis.merge(&incoming);

            let Some(node) = cfg.node(id) else {
                continue;
            };
            let output = self.analysis.transfer(node, &merged);
            inputs[id.index()] = merged;

            if output != outputs[id.index()] {
                outputs[id.index()] = output;
                for succ in cfg.successors(id) {
                    if queued.insert(succ) {
                        worklist.push_back(succ);
                    }
                }
            }
        }

        trace!(blocks = count, iterations, direction = %self.direction, "dataflow converged");
        (inputs, outputs, iterations)
    }
}
