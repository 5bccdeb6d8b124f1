//! Data flow analysis framework.
//!
//! A generic worklist solver computes fixpoints of analyses described by a merge
//! function, a transfer function and a [`Direction`].
//!
//! # Architecture
//!
//! - **Facts**: [`FactMap`], a mapping from variable name to [`Fact`]
//! - **Analysis**: the [`DataFlowAnalysis`] trait
//! - **Solver**: [`DataFlowSolver`], iterating a worklist until no output changes
//!
//! # Analyses Provided
//!
//! - [`ReachingDefinitions`] - which block version of each variable reaches a block
//! - [`DefinedVariables`] - which variables are defined on the way to a block
//! - [`LiveVariables`] - which variables are read later
//! - [`ConstantPropagation`] - which variables hold a known literal
//!
//! # Example
//!
//! ```rust
//! use brilopt::analysis::dataflow::{solve, AnalysisKind, Fact};
//! use brilopt::ir::{split_blocks, Instruction, Type};
//!
//! let int = Type::primitive("int");
//! let blocks = split_blocks(&[
//!     Instruction::label("a"),
//!     Instruction::constant("x", int.clone(), 1),
//!     Instruction::jump("b"),
//!     Instruction::label("b"),
//!     Instruction::constant("x", int, 2),
//!     Instruction::ret(&[]),
//! ])?;
//!
//! let kind = AnalysisKind::Reaching;
//! let results = solve(&blocks, kind, kind.direction())?;
//! assert_eq!(results.outputs["b"]["x"], Fact::Version(1));
//! # Ok::<(), brilopt::Error>(())
//! ```

mod constants;
mod framework;
mod liveness;
mod reaching;
mod solver;

pub use constants::ConstantPropagation;
pub use framework::{AnalysisKind, AnalysisResults, DataFlowAnalysis, Direction, Fact, FactMap};
pub use liveness::LiveVariables;
pub use reaching::{DefinedVariables, ReachingDefinitions};
pub use solver::DataFlowSolver;

use crate::{analysis::cfg::ControlFlowGraph, ir::Block, Result};

/// Builds a graph over `blocks` and runs the analysis `kind` in `direction`.
///
/// `direction` normally equals [`AnalysisKind::direction`]; passing the other one
/// runs the same merge and transfer functions against the edges.
///
/// # Errors
///
/// Returns graph construction errors, see
/// [`ControlFlowGraph::from_blocks`](crate::analysis::ControlFlowGraph::from_blocks).
pub fn solve(blocks: &[Block], kind: AnalysisKind, direction: Direction) -> Result<AnalysisResults> {
    let mut cfg = ControlFlowGraph::from_blocks(blocks.to_vec())?;
    Ok(solve_cfg(&mut cfg, kind, direction))
}

/// Runs the analysis `kind` in `direction` over an existing graph.
pub fn solve_cfg(
    cfg: &mut ControlFlowGraph,
    kind: AnalysisKind,
    direction: Direction,
) -> AnalysisResults {
    match kind {
        AnalysisKind::Reaching => {
            DataFlowSolver::with_direction(ReachingDefinitions, direction).solve(cfg)
        }
        AnalysisKind::Defined => {
            DataFlowSolver::with_direction(DefinedVariables, direction).solve(cfg)
        }
        AnalysisKind::Live => DataFlowSolver::with_direction(LiveVariables, direction).solve(cfg),
        AnalysisKind::ConstantPropagation => {
            DataFlowSolver::with_direction(ConstantPropagation, direction).solve(cfg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{split_blocks, Instruction, Type};

    #[test]
    fn test_every_kind_runs() {
        let int = Type::primitive("int");
        let blocks = split_blocks(&[
            Instruction::label("a"),
            Instruction::constant("x", int.clone(), 1),
            Instruction::branch("x", "b", "c"),
            Instruction::label("b"),
            Instruction::value_op("add", "y", int.clone(), &["x", "x"]),
            Instruction::jump("c"),
            Instruction::label("c"),
            Instruction::effect("print", &["x"]),
        ])
        .unwrap();

        for kind in [
            AnalysisKind::Reaching,
            AnalysisKind::Defined,
            AnalysisKind::Live,
            AnalysisKind::ConstantPropagation,
        ] {
            let results = solve(&blocks, kind, kind.direction()).unwrap();
            assert_eq!(results.inputs.len(), 3, "{kind}");
            assert_eq!(results.outputs.len(), 3, "{kind}");
        }
    }

    #[test]
    fn test_unknown_label_propagates() {
        let blocks = split_blocks(&[Instruction::jump("nowhere")]).unwrap();
        assert!(solve(&blocks, AnalysisKind::Live, Direction::Backward).is_err());
    }
}
