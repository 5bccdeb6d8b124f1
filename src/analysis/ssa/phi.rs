//! Phi-sets: phi instructions under construction.
//!
//! During renaming each predecessor of a block contributes one `(block, value)` pair
//! per phi. Once renaming finishes a [`PhiSet`] is materialized as a single `phi`
//! instruction whose `args` and `labels` are parallel lists.

use std::fmt;

use crate::ir::{Instruction, Type};

/// One incoming value of a phi: the value flowing in from `predecessor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhiOperand {
    /// Versioned name (or the undefined sentinel) carried along the edge
    pub value: String,
    /// Name of the predecessor block
    pub predecessor: String,
}

impl fmt::Display for PhiOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <- .{}", self.value, self.predecessor)
    }
}

/// A phi for one variable in one block, accumulating operands.
#[derive(Debug, Clone, PartialEq)]
pub struct PhiSet {
    variable: String,
    dest: Option<String>,
    ty: Option<Type>,
    operands: Vec<PhiOperand>,
}

impl PhiSet {
    /// Creates an empty phi for `variable`.
    #[must_use]
    pub fn new(variable: impl Into<String>, ty: Option<Type>) -> Self {
        PhiSet {
            variable: variable.into(),
            dest: None,
            ty,
            operands: Vec::new(),
        }
    }

    /// Returns the original (unversioned) variable.
    #[must_use]
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Returns the versioned destination, once renaming assigned one.
    #[must_use]
    pub fn dest(&self) -> Option<&str> {
        self.dest.as_deref()
    }

    /// Sets the versioned destination.
    pub fn set_dest(&mut self, dest: impl Into<String>) {
        self.dest = Some(dest.into());
    }

    /// Returns the operands in insertion order.
    #[must_use]
    pub fn operands(&self) -> &[PhiOperand] {
        &self.operands
    }

    /// Records the value arriving from `predecessor`, replacing an earlier value
    /// from the same block.
    pub fn add_operand(&mut self, predecessor: impl Into<String>, value: impl Into<String>) {
        let predecessor = predecessor.into();
        let value = value.into();
        match self
            .operands
            .iter_mut()
            .find(|op| op.predecessor == predecessor)
        {
            Some(existing) => existing.value = value,
            None => self.operands.push(PhiOperand { value, predecessor }),
        }
    }

    /// Returns the operand coming from `predecessor`.
    #[must_use]
    pub fn operand_from(&self, predecessor: &str) -> Option<&PhiOperand> {
        self.operands.iter().find(|op| op.predecessor == predecessor)
    }

    /// Builds the `phi` instruction. Falls back to the variable name if no
    /// destination was assigned.
    #[must_use]
    pub fn to_instruction(&self) -> Instruction {
        let (args, labels) = self
            .operands
            .iter()
            .map(|op| (op.value.clone(), op.predecessor.clone()))
            .unzip();
        Instruction::phi(
            self.dest.clone().unwrap_or_else(|| self.variable.clone()),
            self.ty.clone(),
            args,
            labels,
        )
    }
}

impl fmt::Display for PhiSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = phi(", self.dest().unwrap_or(&self.variable))?;
        for (i, op) in self.operands.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{op}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operands_stay_parallel() {
        let mut phi = PhiSet::new("x", Some(Type::primitive("int")));
        phi.set_dest("x.2");
        phi.add_operand("left", "x.0");
        phi.add_operand("right", "x.1");

        let instr = phi.to_instruction();
        assert_eq!(instr.op(), Some("phi"));
        assert_eq!(instr.dest.as_deref(), Some("x.2"));
        assert_eq!(instr.args, vec!["x.0", "x.1"]);
        assert_eq!(instr.labels, vec!["left", "right"]);
    }

    #[test]
    fn test_operand_replaced_per_predecessor() {
        let mut phi = PhiSet::new("x", None);
        phi.add_operand("body", "x.0");
        phi.add_operand("body", "x.3");
        assert_eq!(phi.operands().len(), 1);
        assert_eq!(phi.operand_from("body").map(|op| op.value.as_str()), Some("x.3"));
    }

    #[test]
    fn test_display() {
        let mut phi = PhiSet::new("x", None);
        phi.add_operand("a", "x.0");
        phi.add_operand("b", "__undefined");
        assert_eq!(phi.to_string(), "x = phi(x.0 <- .a, __undefined <- .b)");
    }
}
