//! Generic directed graph infrastructure.
//!
//! The control-flow graph in [`crate::analysis::cfg`] is a thin, name-keyed layer over
//! [`DirectedGraph`]. Nodes live in an arena and refer to each other by [`NodeId`], so
//! loops in the program never turn into ownership cycles.
//!
//! Algorithms are written against the traits in [`traits`] and live in [`algorithms`].

pub mod algorithms;
mod directed;
mod node;
mod traits;

pub use directed::DirectedGraph;
pub use node::NodeId;
pub use traits::{GraphBase, Predecessors, RootedGraph, Successors};
