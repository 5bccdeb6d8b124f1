//! # brilopt Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the brilopt library. Import this module to get quick access to the program
//! model, the analyses and the pass pipeline.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all brilopt operations
pub use crate::Error;

/// The result type used throughout brilopt
pub use crate::Result;

/// Pipeline configuration
pub use crate::OptimizerConfig;

// ================================================================================================
// Program Model
// ================================================================================================

/// Bril records and blocks
pub use crate::ir::{
    add_terminators, flatten, split_blocks, Argument, Block, Function, Instruction, Literal,
    Program, Type,
};

// ================================================================================================
// Analyses
// ================================================================================================

/// Control flow graphs and loops
pub use crate::analysis::{CfgNode, ControlFlowGraph, LoopForest, LoopInfo};

/// Data flow framework
pub use crate::analysis::dataflow::{
    solve, AnalysisKind, AnalysisResults, DataFlowAnalysis, DataFlowSolver, Direction, Fact,
    FactMap,
};

/// SSA construction
pub use crate::analysis::ssa::{build_ssa, is_ssa, PhiSet, SsaBuilder, SsaForm};

// ================================================================================================
// Passes
// ================================================================================================

/// Pass pipeline and change tracking
pub use crate::compiler::{
    Event, EventKind, EventLog, LicmOutcome, LicmPass, Pass, PassScheduler, SsaConstructionPass,
};
