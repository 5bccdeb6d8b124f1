//! Instruction, function and program records.
//!
//! These types mirror the structured (JSON) form of a Bril program. The analysis
//! core treats an [`Instruction`] as an opaque record and only ever looks at its
//! optional fields: operator, destination, arguments, branch labels, literal value,
//! type tag and entry label.
//!
//! Parsing the textual representation is left to external tooling; the records here
//! are loaded from and written back to the structured form with `serde`.
//!
//! # Examples
//!
//! ```rust
//! use brilopt::ir::{Instruction, Literal, Program};
//!
//! let json = r#"{"functions":[{"name":"main","instrs":[
//!     {"op":"const","dest":"x","type":"int","value":1},
//!     {"op":"print","args":["x"]}
//! ]}]}"#;
//!
//! let program = Program::from_json(json)?;
//! let first = &program.functions[0].instrs[0];
//! assert_eq!(first.dest.as_deref(), Some("x"));
//! assert_eq!(first.value, Some(Literal::Int(1)));
//! # Ok::<(), brilopt::Error>(())
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Unconditional jump.
pub const OP_JMP: &str = "jmp";
/// Two-way conditional branch.
pub const OP_BR: &str = "br";
/// Function return.
pub const OP_RET: &str = "ret";
/// Literal load.
pub const OP_CONST: &str = "const";
/// SSA phi instruction.
pub const OP_PHI: &str = "phi";

/// Operators whose evaluation observes or changes state beyond their destination.
///
/// None of these may be moved across loop boundaries.
const SIDE_EFFECT_OPS: &[&str] = &[
    "call", "print", "store", "load", "alloc", "free", "phi", "jmp", "br", "ret", "nop",
    "speculate", "guard", "commit",
];

/// A literal value carried by `const` instructions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    /// Boolean literal
    Bool(bool),
    /// Integer literal
    Int(i64),
    /// Floating point literal
    Float(f64),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// A type tag, either a primitive name (`int`, `bool`) or a parameterized pointer type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Type {
    /// Primitive type such as `int` or `bool`
    Primitive(String),
    /// Pointer to another type, serialized as `{"ptr": <type>}`
    Pointer {
        /// The pointee type
        ptr: Box<Type>,
    },
}

impl Type {
    /// Creates a primitive type tag.
    #[must_use]
    pub fn primitive(name: impl Into<String>) -> Self {
        Self::Primitive(name.into())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(name) => f.write_str(name),
            Self::Pointer { ptr } => write!(f, "ptr<{ptr}>"),
        }
    }
}

/// A single instruction record.
///
/// Every field is optional. A record with only `label` set marks the start of a
/// block; every other record is an operation. The analysis passes mutate records in
/// place (SSA renaming rewrites `dest` and `args`, loop-invariant code motion moves
/// whole records and retargets `labels`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// Entry label; set only on label pseudo-instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Operator name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,
    /// Destination variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    /// Type tag of the destination.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<Type>,
    /// Argument variable names, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Callee names for `call`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub funcs: Vec<String>,
    /// Target labels for branching operators (and source labels for `phi`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    /// Literal value for `const`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Literal>,
}

impl Instruction {
    /// Creates a label pseudo-instruction.
    #[must_use]
    pub fn label(name: impl Into<String>) -> Self {
        Self {
            label: Some(name.into()),
            ..Self::default()
        }
    }

    /// Creates a `const` instruction.
    #[must_use]
    pub fn constant(dest: impl Into<String>, ty: Type, value: impl Into<Literal>) -> Self {
        Self {
            op: Some(OP_CONST.to_string()),
            dest: Some(dest.into()),
            ty: Some(ty),
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// Creates a value operation `dest: ty = op args...`.
    #[must_use]
    pub fn value_op(op: &str, dest: impl Into<String>, ty: Type, args: &[&str]) -> Self {
        Self {
            op: Some(op.to_string()),
            dest: Some(dest.into()),
            ty: Some(ty),
            args: args.iter().map(|a| (*a).to_string()).collect(),
            ..Self::default()
        }
    }

    /// Creates an effect operation (no destination), e.g. `print`.
    #[must_use]
    pub fn effect(op: &str, args: &[&str]) -> Self {
        Self {
            op: Some(op.to_string()),
            args: args.iter().map(|a| (*a).to_string()).collect(),
            ..Self::default()
        }
    }

    /// Creates an unconditional jump.
    #[must_use]
    pub fn jump(target: impl Into<String>) -> Self {
        Self {
            op: Some(OP_JMP.to_string()),
            labels: vec![target.into()],
            ..Self::default()
        }
    }

    /// Creates a conditional branch on `cond`.
    #[must_use]
    pub fn branch(cond: &str, if_true: impl Into<String>, if_false: impl Into<String>) -> Self {
        Self {
            op: Some(OP_BR.to_string()),
            args: vec![cond.to_string()],
            labels: vec![if_true.into(), if_false.into()],
            ..Self::default()
        }
    }

    /// Creates a return, optionally carrying a value.
    #[must_use]
    pub fn ret(args: &[&str]) -> Self {
        Self::effect(OP_RET, args)
    }

    /// Creates a phi instruction. `args` and `labels` are parallel.
    #[must_use]
    pub fn phi(
        dest: impl Into<String>,
        ty: Option<Type>,
        args: Vec<String>,
        labels: Vec<String>,
    ) -> Self {
        Self {
            op: Some(OP_PHI.to_string()),
            dest: Some(dest.into()),
            ty,
            args,
            labels,
            ..Self::default()
        }
    }

    /// Returns the operator, if this record is an operation.
    #[must_use]
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Returns `true` for label pseudo-instructions.
    #[must_use]
    pub fn is_label(&self) -> bool {
        self.label.is_some()
    }

    /// Returns `true` for operators that transfer control (`jmp`, `br`, `ret`).
    #[must_use]
    pub fn is_terminator(&self) -> bool {
        matches!(self.op(), Some(OP_JMP | OP_BR | OP_RET))
    }

    /// Returns `true` for operators that name target labels (`jmp`, `br`).
    #[must_use]
    pub fn is_branch(&self) -> bool {
        matches!(self.op(), Some(OP_JMP | OP_BR))
    }

    /// Returns `true` if moving or duplicating this instruction could change behavior.
    #[must_use]
    pub fn has_side_effects(&self) -> bool {
        self.op().is_some_and(|op| SIDE_EFFECT_OPS.contains(&op))
    }

    /// Returns the literal value if this is a `const` instruction.
    #[must_use]
    pub fn constant_value(&self) -> Option<&Literal> {
        if self.op() == Some(OP_CONST) {
            self.value.as_ref()
        } else {
            None
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = &self.label {
            return write!(f, ".{label}:");
        }

        if let Some(dest) = &self.dest {
            write!(f, "{dest}")?;
            if let Some(ty) = &self.ty {
                write!(f, ": {ty}")?;
            }
            write!(f, " = ")?;
        }
        write!(f, "{}", self.op().unwrap_or("nop"))?;
        for func in &self.funcs {
            write!(f, " @{func}")?;
        }
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        for label in &self.labels {
            write!(f, " .{label}")?;
        }
        if let Some(value) = &self.value {
            write!(f, " {value}")?;
        }
        write!(f, ";")
    }
}

/// A formal parameter of a [`Function`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    /// Parameter name
    pub name: String,
    /// Parameter type
    #[serde(rename = "type")]
    pub ty: Type,
}

/// A function: an ordered instruction stream plus its parameter list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    /// Function name
    pub name: String,
    /// Ordered parameters
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Argument>,
    /// Return type
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<Type>,
    /// Ordered instruction stream
    #[serde(default)]
    pub instrs: Vec<Instruction>,
}

impl Function {
    /// Creates a function without parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, instrs: Vec<Instruction>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            ty: None,
            instrs,
        }
    }

    /// Returns the parameter names in declaration order.
    pub fn arg_names(&self) -> impl Iterator<Item = &str> {
        self.args.iter().map(|a| a.name.as_str())
    }
}

/// A whole program: an ordered list of functions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// The program's functions
    pub functions: Vec<Function>,
}

impl Program {
    /// Loads a program from its structured JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if the input is not a valid program record.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Writes the program back to its structured JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
