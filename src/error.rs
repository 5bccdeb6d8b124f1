use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Every error is local to a single function: nothing in this crate retries or recovers.
/// Callers decide whether to abort the whole program or skip the offending function.
///
/// # Error Categories
///
/// ## Graph construction
/// - [`Error::UnknownLabel`] - A branch or jump names a block that does not exist
/// - [`Error::DuplicateBlock`] - Two blocks carry the same name
/// - [`Error::EmptyFunction`] - A graph was requested for a function without instructions
/// - [`Error::BlockNotFound`] - A query referenced a block that is not part of the graph
/// - [`Error::GraphError`] - Low-level adjacency errors from the generic graph
///
/// ## Internal
/// - [`Error::Malformed`] - An internal invariant was violated
///
/// ## Serialization
/// - [`Error::Json`] - Program records could not be (de)serialized
///
/// # Examples
///
/// ```rust
/// use brilopt::{analysis::ControlFlowGraph, ir::Instruction, Error};
///
/// let instrs = vec![Instruction::jump("nowhere")];
/// match ControlFlowGraph::from_instructions(&instrs) {
///     Err(Error::UnknownLabel { block, label }) => {
///         eprintln!("{block} jumps to missing label {label}");
///     }
///     Err(e) => eprintln!("Other error: {e}"),
///     Ok(_) => unreachable!(),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A branch or jump instruction names a label with no matching block.
    ///
    /// This is fatal for the function being processed: no partial graph is
    /// returned because every later analysis relies on complete edge sets.
    #[error("Block '{block}' targets unknown label '{label}'")]
    UnknownLabel {
        /// The block containing the offending terminator
        block: String,
        /// The label that could not be resolved
        label: String,
    },

    /// Two blocks of the same function carry the same name.
    #[error("Duplicate block name '{0}'")]
    DuplicateBlock(String),

    /// A control flow graph was requested for a function without instructions.
    #[error("Function '{0}' has no instructions")]
    EmptyFunction(String),

    /// A query referenced a block that is not part of the graph.
    #[error("Block '{0}' not found")]
    BlockNotFound(String),

    /// An internal invariant was violated.
    ///
    /// The error includes the source location where the problem was detected.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Error raised by the generic graph layer, e.g. an edge between unknown nodes.
    #[error("{0}")]
    GraphError(String),

    /// Program records could not be serialized or deserialized.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}
