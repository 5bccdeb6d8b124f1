//! Transformation passes.
//!
//! - [`SsaConstructionPass`] rewrites a function into SSA form
//! - [`LicmPass`] hoists loop-invariant instructions into preheaders

mod licm;
mod ssa;

pub use licm::{HoistedInstruction, LicmOutcome, LicmPass};
pub use ssa::SsaConstructionPass;
