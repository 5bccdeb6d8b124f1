//! Shared utilities: node bit sets, the generic graph and DOT output.

mod bitset;
mod dot;
pub mod graph;

pub use bitset::BitSet;
pub use dot::{escape_dot, DotWriter};
