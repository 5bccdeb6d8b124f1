//! Single-assignment checks.

use std::collections::HashSet;

use crate::ir::{Function, Program};

/// Returns `true` if every variable of `function` is assigned by at most one
/// instruction.
///
/// Parameters are not counted as assignments.
#[must_use]
pub fn is_ssa_function(function: &Function) -> bool {
    let mut seen = HashSet::new();
    function
        .instrs
        .iter()
        .filter_map(|instr| instr.dest.as_deref())
        .all(|dest| seen.insert(dest))
}

/// Returns `true` if [`is_ssa_function`] holds for every function of `program`.
///
/// # Examples
///
/// ```rust
/// use brilopt::analysis::ssa::is_ssa;
/// use brilopt::ir::{Function, Instruction, Program, Type};
///
/// let int = Type::primitive("int");
/// let program = Program {
///     functions: vec![Function::new(
///         "main",
///         vec![
///             Instruction::constant("x", int.clone(), 1),
///             Instruction::constant("x", int, 2),
///         ],
///     )],
/// };
/// assert!(!is_ssa(&program));
/// ```
#[must_use]
pub fn is_ssa(program: &Program) -> bool {
    program.functions.iter().all(is_ssa_function)
}
