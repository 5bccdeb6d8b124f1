//! Basic blocks and definition extraction.
//!
//! A function's instruction stream is split into [`Block`]s at label boundaries by
//! [`split_blocks`]. Instructions inside a block execute in order; control leaves a
//! block through its branch/jump targets or falls through to the next block when the
//! last instruction is not a terminator. Fallthrough is never an implicit graph edge,
//! so [`add_terminators`] can make it explicit before any graph pass runs.

use std::collections::{BTreeSet, HashSet};

use crate::{
    ir::instruction::{Instruction, Literal},
    Error, Result,
};

/// An ordered run of instructions with a name unique within its function.
///
/// The name is taken from a leading label instruction or synthesized when the block
/// has none. It never changes after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    name: String,
    instrs: Vec<Instruction>,
}

impl Block {
    /// Creates a block. The name should match a leading label, if there is one.
    #[must_use]
    pub fn new(name: impl Into<String>, instrs: Vec<Instruction>) -> Self {
        Block {
            name: name.into(),
            instrs,
        }
    }

    /// Creates a block that starts with its own label instruction.
    #[must_use]
    pub fn labeled(name: impl Into<String>, body: Vec<Instruction>) -> Self {
        let name = name.into();
        let mut instrs = Vec::with_capacity(body.len() + 1);
        instrs.push(Instruction::label(name.clone()));
        instrs.extend(body);
        Block { name, instrs }
    }

    /// Returns the block name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the instructions, label included.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instrs
    }

    /// Returns the instructions mutably.
    pub fn instructions_mut(&mut self) -> &mut Vec<Instruction> {
        &mut self.instrs
    }

    /// Consumes the block and returns its instructions.
    #[must_use]
    pub fn into_instructions(self) -> Vec<Instruction> {
        self.instrs
    }

    /// Returns the operations, skipping label pseudo-instructions.
    pub fn operations(&self) -> impl Iterator<Item = &Instruction> {
        self.instrs.iter().filter(|i| !i.is_label())
    }

    /// Returns the leading label, if the block has one.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.instrs.first().and_then(|i| i.label.as_deref())
    }

    /// Returns the last instruction if it transfers control.
    #[must_use]
    pub fn terminator(&self) -> Option<&Instruction> {
        self.instrs.last().filter(|i| i.is_terminator())
    }

    /// Returns `true` if control can fall off the end of this block.
    #[must_use]
    pub fn falls_through(&self) -> bool {
        self.terminator().is_none()
    }

    /// Returns every label named by a `jmp` or `br` in this block, in order,
    /// without duplicates.
    #[must_use]
    pub fn targets(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.instrs
            .iter()
            .filter(|i| i.is_branch())
            .flat_map(|i| i.labels.iter().map(String::as_str))
            .filter(|label| seen.insert(*label))
            .collect()
    }

    /// Inserts a label instruction carrying the block name if the block has none.
    pub fn ensure_label(&mut self) {
        if self.label().is_none() {
            self.instrs.insert(0, Instruction::label(self.name.clone()));
        }
    }

    /// Returns the index at which instructions can be inserted after the label.
    #[must_use]
    pub fn body_start(&self) -> usize {
        usize::from(self.label().is_some())
    }

    /// Returns the destination of every instruction, in order (repeats included).
    pub fn destinations(&self) -> impl Iterator<Item = &str> {
        self.instrs.iter().filter_map(|i| i.dest.as_deref())
    }

    /// Returns the distinct variables defined in this block, in first-definition order.
    #[must_use]
    pub fn defined_vars(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.destinations().filter(|d| seen.insert(*d)).collect()
    }

    /// Returns every argument read in this block, in order (repeats included).
    pub fn uses(&self) -> impl Iterator<Item = &str> {
        self.instrs
            .iter()
            .flat_map(|i| i.args.iter().map(String::as_str))
    }

    /// Returns the variables read before any local redefinition.
    ///
    /// These are the uses that observe a value flowing into the block.
    #[must_use]
    pub fn upward_exposed_uses(&self) -> BTreeSet<String> {
        let mut written = HashSet::new();
        let mut exposed = BTreeSet::new();
        for instr in &self.instrs {
            for arg in &instr.args {
                if !written.contains(arg.as_str()) {
                    exposed.insert(arg.clone());
                }
            }
            if let Some(dest) = &instr.dest {
                written.insert(dest.as_str());
            }
        }
        exposed
    }

    /// Extracts one [`Definition`] per instruction with a destination.
    ///
    /// Ids are drawn from `ids` so they stay unique across every block that shares
    /// the allocator.
    pub fn definitions(&self, ids: &mut DefinitionIds) -> Vec<Definition> {
        self.instrs
            .iter()
            .filter_map(|instr| {
                let name = instr.dest.clone()?;
                Some(Definition {
                    name,
                    value: instr.constant_value().cloned(),
                    uid: ids.next_id(),
                })
            })
            .collect()
    }
}

/// One static assignment: variable, literal value if known, and a unique id.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    /// Assigned variable
    pub name: String,
    /// Literal value for `const` definitions, `None` otherwise
    pub value: Option<Literal>,
    /// Unique id, never reused by the allocator that produced it
    pub uid: u64,
}

impl Definition {
    /// Returns `"name.uid"`, a name that distinguishes this definition from all others.
    #[must_use]
    pub fn annotated_name(&self) -> String {
        format!("{}.{}", self.name, self.uid)
    }
}

/// Monotonic allocator for [`Definition`] ids.
///
/// Each function (or analysis run) owns its allocator, so ids never leak between
/// unrelated graphs.
#[derive(Debug, Default, Clone)]
pub struct DefinitionIds {
    next: u64,
}

impl DefinitionIds {
    /// Creates an allocator starting at 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh id.
    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Splits a function body into blocks at label boundaries.
///
/// Every label instruction starts a new block named after it. A run of instructions
/// before the first label (or any block without one) receives a synthesized name
/// `b<n>` that does not collide with any label of the function. Empty runs produce no
/// block.
///
/// # Errors
///
/// Returns [`Error::DuplicateBlock`] if two labels carry the same name.
///
/// # Examples
///
/// ```rust
/// use brilopt::ir::{split_blocks, Instruction, Type};
///
/// let int = Type::primitive("int");
/// let blocks = split_blocks(&[
///     Instruction::constant("x", int.clone(), 1),
///     Instruction::label("next"),
///     Instruction::effect("print", &["x"]),
/// ])?;
///
/// assert_eq!(blocks.len(), 2);
/// assert_eq!(blocks[0].name(), "b0");
/// assert_eq!(blocks[1].name(), "next");
/// # Ok::<(), brilopt::Error>(())
/// ```
pub fn split_blocks(instrs: &[Instruction]) -> Result<Vec<Block>> {
    let labels: HashSet<&str> = instrs.iter().filter_map(|i| i.label.as_deref()).collect();
    let mut fresh = 0usize;
    let mut fresh_name = || loop {
        let candidate = format!("b{fresh}");
        fresh += 1;
        if !labels.contains(candidate.as_str()) {
            break candidate;
        }
    };

    let mut runs: Vec<Vec<Instruction>> = Vec::new();
    let mut current = Vec::new();
    for instr in instrs {
        if instr.is_label() && !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
        current.push(instr.clone());
    }
    if !current.is_empty() {
        runs.push(current);
    }

    let mut seen = HashSet::new();
    let mut blocks = Vec::with_capacity(runs.len());
    for run in runs {
        let name = match run.first().and_then(|i| i.label.clone()) {
            Some(label) => label,
            None => fresh_name(),
        };
        if !seen.insert(name.clone()) {
            return Err(Error::DuplicateBlock(name));
        }
        blocks.push(Block::new(name, run));
    }

    Ok(blocks)
}

/// Makes fallthrough explicit.
///
/// Every block that does not end in a terminator and is followed by another block
/// gets a trailing `jmp` to that block. If the next block has no label instruction,
/// one carrying its name is inserted. The last block is left unchanged.
pub fn add_terminators(blocks: &mut [Block]) {
    for index in 1..blocks.len() {
        if !blocks[index - 1].falls_through() {
            continue;
        }
        let (head, tail) = blocks.split_at_mut(index);
        let next = &mut tail[0];
        next.ensure_label();
        head[index - 1]
            .instrs
            .push(Instruction::jump(next.name.clone()));
    }
}

/// Concatenates blocks back into a single instruction stream.
#[must_use]
pub fn flatten(blocks: Vec<Block>) -> Vec<Instruction> {
    blocks.into_iter().flat_map(Block::into_instructions).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::instruction::Type;

    fn int() -> Type {
        Type::primitive("int")
    }

    #[test]
    fn test_split_at_labels() {
        let blocks = split_blocks(&[
            Instruction::label("start"),
            Instruction::constant("x", int(), 1),
            Instruction::jump("end"),
            Instruction::label("end"),
            Instruction::effect("print", &["x"]),
        ])
        .unwrap();

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].name(), "start");
        assert_eq!(blocks[0].instructions().len(), 3);
        assert_eq!(blocks[0].targets(), vec!["end"]);
        assert!(blocks[1].falls_through());
    }

    #[test]
    fn test_synthesized_names_avoid_labels() {
        let blocks = split_blocks(&[
            Instruction::constant("x", int(), 1),
            Instruction::label("b0"),
            Instruction::ret(&[]),
        ])
        .unwrap();

        assert_eq!(blocks[0].name(), "b1");
        assert_eq!(blocks[0].label(), None);
        assert_eq!(blocks[1].name(), "b0");
    }

    #[test]
    fn test_duplicate_label() {
        let result = split_blocks(&[Instruction::label("a"), Instruction::label("a")]);
        assert!(matches!(result, Err(Error::DuplicateBlock(name)) if name == "a"));
    }

    #[test]
    fn test_upward_exposed_uses() {
        let block = Block::new(
            "b",
            vec![
                Instruction::value_op("add", "x", int(), &["a", "b"]),
                Instruction::value_op("add", "y", int(), &["x", "c"]),
                Instruction::value_op("add", "a", int(), &["y", "a"]),
            ],
        );
        let exposed: Vec<_> = block.upward_exposed_uses().into_iter().collect();
        assert_eq!(exposed, vec!["a", "b", "c"]);
        assert_eq!(block.defined_vars(), vec!["x", "y", "a"]);
        assert_eq!(block.uses().count(), 6);
    }

    #[test]
    fn test_definitions_have_unique_ids() {
        let block = Block::new(
            "b",
            vec![
                Instruction::constant("x", int(), 4),
                Instruction::value_op("add", "x", int(), &["x", "x"]),
                Instruction::effect("print", &["x"]),
            ],
        );
        let mut ids = DefinitionIds::new();
        let defs = block.definitions(&mut ids);
        let again = block.definitions(&mut ids);

        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].value, Some(Literal::Int(4)));
        assert_eq!(defs[1].value, None);
        assert_eq!(defs[1].annotated_name(), "x.1");
        assert_eq!(again[0].uid, 2);
    }

    #[test]
    fn test_add_terminators() {
        let mut blocks = split_blocks(&[
            Instruction::constant("x", int(), 1),
            Instruction::label("mid"),
            Instruction::effect("print", &["x"]),
            Instruction::ret(&[]),
            Instruction::label("last"),
            Instruction::effect("print", &["x"]),
        ])
        .unwrap();
        add_terminators(&mut blocks);

        assert_eq!(blocks[0].terminator(), Some(&Instruction::jump("mid")));
        assert_eq!(blocks[1].terminator(), Some(&Instruction::ret(&[])));
        assert!(blocks[2].falls_through());
    }

    #[test]
    fn test_add_terminators_labels_next_block() {
        let mut blocks = vec![
            Block::new("first", vec![Instruction::effect("print", &["x"])]),
            Block::new("second", vec![Instruction::ret(&[])]),
        ];
        add_terminators(&mut blocks);

        assert_eq!(blocks[1].label(), Some("second"));
        assert_eq!(blocks[0].targets(), vec!["second"]);
        assert_eq!(flatten(blocks).len(), 4);
    }
}
