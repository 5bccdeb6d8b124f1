//! Graph algorithms used by the control-flow analyses.
//!
//! # Traversal
//!
//! - [`dfs`] - depth-first pre-order iterator
//! - [`postorder`] / [`reverse_postorder`] - depth-first orderings
//! - [`reachable`] - nodes reachable from a start node
//!
//! # Dominance
//!
//! - [`compute_dominance`] - dominator sets, immediate dominators and frontiers
//! - [`compute_dominator_sets`] - the raw iterative fixpoint
//! - [`dominates_by_paths`] - brute-force cross-check by path search
//!
//! All algorithms are generic over the traits in [`crate::utils::graph`].

mod dominators;
mod traversal;

pub use dominators::{
    compute_dominance, compute_dominator_sets, dominance_frontiers, dominates_by_paths,
    immediate_dominators, Dominance,
};
pub use traversal::{dfs, postorder, reachable, reverse_postorder, DfsIterator};
