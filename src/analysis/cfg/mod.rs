//! Control Flow Graph (CFG) construction and analysis.
//!
//! # Key Components
//!
//! - [`ControlFlowGraph`] - name-keyed graph of basic blocks with entry synthesis,
//!   direction reversal and cached dominance queries
//! - [`CfgNode`] - a block plus its annotated definition versions
//! - [`LoopForest`] / [`LoopInfo`] - natural loops found through back edges
//!
//! # Examples
//!
//! ```rust
//! use brilopt::{analysis::ControlFlowGraph, ir::Instruction};
//!
//! let cfg = ControlFlowGraph::from_instructions(&[
//!     Instruction::label("head"),
//!     Instruction::branch("c", "left", "right"),
//!     Instruction::label("left"),
//!     Instruction::jump("join"),
//!     Instruction::label("right"),
//!     Instruction::jump("join"),
//!     Instruction::label("join"),
//!     Instruction::ret(&[]),
//! ])?;
//!
//! let frontiers = cfg.dominance_frontiers();
//! assert!(frontiers["left"].contains("join"));
//! assert!(cfg.loops().is_empty());
//! # Ok::<(), brilopt::Error>(())
//! ```

mod graph;
mod loops;
mod node;

pub use graph::{ControlFlowGraph, DEFAULT_ENTRY_PREFIX};
pub use loops::{detect_loops, LoopForest, LoopInfo};
pub use node::CfgNode;
