//! Static Single Assignment (SSA) form for Bril functions.
//!
//! Converts a function so that every variable is assigned exactly once, inserting
//! `phi` instructions where control flow merges different versions of a variable.
//!
//! # Architecture
//!
//! - [`phi`] - phi-sets accumulating one incoming value per predecessor
//! - [`builder`] - the construction itself (Cytron et al.)
//! - [`verify`] - single-assignment checks used by tests and drivers
//!
//! # Transformation
//!
//! 1. **Phi Placement**: iterated dominance frontiers of each variable's definitions
//! 2. **Variable Renaming**: `name.N` versions assigned in a dominator tree walk
//! 3. **Materialization**: phis are emitted right after each block's label, sorted by
//!    variable, with `args` and `labels` kept parallel
//!
//! # Usage
//!
//! ```rust
//! use brilopt::analysis::ssa::{build_ssa, is_ssa_function};
//! use brilopt::ir::{Function, Instruction, Type};
//!
//! let int = Type::primitive("int");
//! let mut function = Function::new(
//!     "main",
//!     vec![
//!         Instruction::constant("x", int.clone(), 1),
//!         Instruction::value_op("add", "x", int, &["x", "x"]),
//!         Instruction::effect("print", &["x"]),
//!     ],
//! );
//! assert!(!is_ssa_function(&function));
//!
//! function.instrs = build_ssa(&function)?.into_instructions();
//! assert!(is_ssa_function(&function));
//! # Ok::<(), brilopt::Error>(())
//! ```

pub mod builder;
pub mod phi;
pub mod verify;

pub use builder::{SsaBuilder, SsaForm, DEFAULT_UNDEFINED_NAME};
pub use phi::{PhiOperand, PhiSet};
pub use verify::{is_ssa, is_ssa_function};

use crate::{
    analysis::cfg::ControlFlowGraph,
    ir::{add_terminators, split_blocks, Function},
    Error, Result,
};

/// Converts `function` to SSA form with default naming.
///
/// Fallthrough is made explicit first, so the result does not depend on block order.
///
/// # Errors
///
/// - [`Error::EmptyFunction`] if the function has no instructions
/// - graph construction errors, see [`ControlFlowGraph::from_blocks`]
pub fn build_ssa(function: &Function) -> Result<SsaForm> {
    if function.instrs.is_empty() {
        return Err(Error::EmptyFunction(function.name.clone()));
    }

    let mut blocks = split_blocks(&function.instrs)?;
    add_terminators(&mut blocks);
    let cfg = ControlFlowGraph::from_blocks(blocks)?;
    let params: Vec<&str> = function.arg_names().collect();
    SsaBuilder::new(&cfg).build(&params)
}
