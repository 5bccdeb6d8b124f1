//! Data flow analysis framework trait, fact model and direction.
//!
//! An analysis is fully described by a merge function, a transfer function and a
//! direction. Facts are mappings from variable name to a [`Fact`] value; the solver
//! keeps one input and one output mapping per block.

use std::{collections::BTreeMap, fmt};

use strum::{Display, EnumCount, EnumIter, EnumString};

use crate::{analysis::cfg::CfgNode, ir::Literal};

/// Direction of a data flow analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    /// Facts flow from the entry along edges; a block merges its predecessors.
    Forward,
    /// Facts flow against the edges; a block merges its successors.
    ///
    /// The solver reverses the graph in place for the duration of the run.
    Backward,
}

/// The value attached to a variable in a fact mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum Fact {
    /// Version number of the definition that reaches (reaching / defined analyses).
    Version(u32),
    /// The variable holds this literal on every path.
    Const(Literal),
    /// Paths disagree about the variable's value, or it is computed.
    NotConst,
    /// The variable is live.
    Live,
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fact::Version(v) => write!(f, "{v}"),
            Fact::Const(lit) => write!(f, "{lit}"),
            Fact::NotConst => f.write_str("?"),
            Fact::Live => f.write_str("live"),
        }
    }
}

/// Facts at one program point: variable name to value.
pub type FactMap = BTreeMap<String, Fact>;

/// A data flow analysis the [`DataFlowSolver`](crate::analysis::dataflow::DataFlowSolver)
/// can run.
///
/// Termination relies on `merge` and `transfer` being monotone over a finite set of
/// values. An instantiation that violates this is a bug in that instantiation; the
/// solver does not detect it.
///
/// # Example
///
/// ```rust
/// use brilopt::analysis::{
///     dataflow::{DataFlowAnalysis, Direction, Fact, FactMap},
///     CfgNode,
/// };
///
/// /// Variables assigned anywhere on some path to a block.
/// struct Assigned;
///
/// impl DataFlowAnalysis for Assigned {
///     const DIRECTION: Direction = Direction::Forward;
///
///     fn merge(&self, inputs: &[&FactMap]) -> FactMap {
///         inputs.iter().flat_map(|m| (*m).clone()).collect()
///     }
///
///     fn transfer(&self, node: &CfgNode, input: &FactMap) -> FactMap {
///         let mut out = input.clone();
///         for var in node.block().defined_vars() {
///             out.insert(var.to_string(), Fact::Live);
///         }
///         out
///     }
/// }
/// ```
pub trait DataFlowAnalysis {
    /// The natural direction of this analysis.
    const DIRECTION: Direction;

    /// Combines the facts flowing in from several neighbours.
    ///
    /// A block without neighbours receives exactly one empty mapping.
    fn merge(&self, inputs: &[&FactMap]) -> FactMap;

    /// Computes the facts leaving `node` given the merged facts entering it.
    fn transfer(&self, node: &CfgNode, input: &FactMap) -> FactMap;
}

/// Per-block results of a solver run, keyed by block name.
///
/// `inputs` and `outputs` are given in program order: for a backward analysis the
/// input of a block is the fact *before* its first instruction, as for a forward one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisResults {
    /// Facts at block entry
    pub inputs: BTreeMap<String, FactMap>,
    /// Facts at block exit
    pub outputs: BTreeMap<String, FactMap>,
    /// Number of blocks processed before the worklist emptied
    pub iterations: usize,
}

impl AnalysisResults {
    /// Returns the facts at entry of `block`.
    #[must_use]
    pub fn input(&self, block: &str) -> Option<&FactMap> {
        self.inputs.get(block)
    }

    /// Returns the facts at exit of `block`.
    #[must_use]
    pub fn output(&self, block: &str) -> Option<&FactMap> {
        self.outputs.get(block)
    }
}

/// The built-in analyses selectable by name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, EnumCount,
)]
pub enum AnalysisKind {
    /// Which version of each variable reaches a block.
    #[strum(serialize = "reaching")]
    Reaching,
    /// Which variables have been defined on some path, block versions yielding to
    /// incoming ones.
    #[strum(serialize = "defined")]
    Defined,
    /// Which variables are read later without an intervening redefinition.
    #[strum(serialize = "live")]
    Live,
    /// Which variables hold a known literal.
    #[strum(serialize = "cprop")]
    ConstantPropagation,
}

impl AnalysisKind {
    /// Returns the natural direction of the analysis.
    #[must_use]
    pub fn direction(self) -> Direction {
        match self {
            AnalysisKind::Live => Direction::Backward,
            AnalysisKind::Reaching | AnalysisKind::Defined | AnalysisKind::ConstantPropagation => {
                Direction::Forward
            }
        }
    }
}
