//! DOT format utilities for graph visualization.
//!
//! This module provides utilities for generating DOT format output,
//! which can be rendered using Graphviz tools.

use std::fmt::Write;

/// Escapes a string for safe use in DOT format labels and identifiers.
///
/// Quotes, backslashes, newlines and angle brackets have special meaning in
/// record labels and are escaped. Carriage returns are dropped.
///
/// # Examples
///
/// ```rust
/// use brilopt::utils::escape_dot;
///
/// assert_eq!(escape_dot("x: ptr<int>"), "x: ptr\\<int\\>");
/// ```
#[must_use]
pub fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "")
        .replace('<', "\\<")
        .replace('>', "\\>")
}

/// Minimal builder for `digraph` documents.
///
/// Node identifiers and labels are escaped on insertion. Lines are emitted in the
/// order they were added so the output is deterministic.
#[derive(Debug)]
pub struct DotWriter {
    out: String,
}

impl DotWriter {
    /// Starts a new `digraph` with the given title.
    #[must_use]
    pub fn new(title: &str) -> Self {
        let mut out = String::new();
        let _ = writeln!(out, "digraph \"{}\" {{", escape_dot(title));
        let _ = writeln!(out, "    node [shape=box, fontname=\"monospace\"];");
        Self { out }
    }

    /// Adds a node with a (possibly multi-line) label.
    pub fn node(&mut self, id: &str, label: &str) {
        let _ = writeln!(
            self.out,
            "    \"{}\" [label=\"{}\"];",
            escape_dot(id),
            escape_dot(label)
        );
    }

    /// Adds a directed edge.
    pub fn edge(&mut self, from: &str, to: &str) {
        let _ = writeln!(
            self.out,
            "    \"{}\" -> \"{}\";",
            escape_dot(from),
            escape_dot(to)
        );
    }

    /// Closes the graph and returns the document.
    #[must_use]
    pub fn finish(mut self) -> String {
        self.out.push_str("}\n");
        self.out
    }
}
