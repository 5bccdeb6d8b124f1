//! The instruction-level program model.
//!
//! - [`instruction`] - serde records for instructions, functions and programs
//! - [`block`] - basic blocks, block splitting and definition extraction

pub mod block;
pub mod instruction;

pub use block::{add_terminators, flatten, split_blocks, Block, Definition, DefinitionIds};
pub use instruction::{Argument, Function, Instruction, Literal, Program, Type};
