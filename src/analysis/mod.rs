//! Program analysis infrastructure for Bril functions.
//!
//! This module builds on the generic graph infrastructure in [`crate::utils::graph`]
//! to provide the analyses the optimization passes rely on.
//!
//! # Architecture
//!
//! - [`cfg`] - control flow graph construction, dominance queries and natural loops
//! - [`dataflow`] - the generic worklist solver and its instantiations
//! - [`ssa`] - SSA construction and single-assignment checks
//!
//! # Usage
//!
//! ```rust
//! use brilopt::analysis::ControlFlowGraph;
//! use brilopt::ir::Instruction;
//!
//! let cfg = ControlFlowGraph::from_instructions(&[
//!     Instruction::label("a"),
//!     Instruction::branch("c", "b", "a"),
//!     Instruction::label("b"),
//!     Instruction::ret(&[]),
//! ])?;
//!
//! // Dominance is computed on first use and cached
//! assert!(cfg.dominates("a", "b")?);
//! assert_eq!(cfg.loops().len(), 1);
//! # Ok::<(), brilopt::Error>(())
//! ```

pub mod cfg;
pub mod dataflow;
pub mod ssa;

pub use cfg::{CfgNode, ControlFlowGraph, LoopForest, LoopInfo};
