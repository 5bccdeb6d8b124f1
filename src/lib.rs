// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # brilopt
//!
//! Control flow analysis, data flow analysis, SSA construction and loop-invariant code
//! motion for programs in the Bril intermediate language.
//!
//! Programs are read from and written to Bril's structured JSON form. Every analysis
//! works on one function at a time and identifies blocks by name.
//!
//! ## Features
//!
//! - **Control flow graphs** - block splitting, entry synthesis, reversible edges, DOT output
//! - **Dominance** - dominator sets, dominator tree, dominance frontiers, path-based checks
//! - **Data flow** - a generic worklist solver with reaching definitions, defined
//!   variables, liveness and constant propagation
//! - **SSA** - phi placement on iterated dominance frontiers and dominator-tree renaming
//! - **LICM** - natural loop detection, preheader synthesis, invariant hoisting
//!
//! ## Quick Start
//!
//! ### Using the Prelude
//!
//! ```rust
//! use brilopt::prelude::*;
//!
//! let program = Program::from_json(r#"{"functions":[{"name":"main","instrs":[
//!     {"op":"const","dest":"n","type":"int","value":3},
//!     {"label":"loop"},
//!     {"op":"const","dest":"one","type":"int","value":1},
//!     {"op":"sub","dest":"n","type":"int","args":["n","one"]},
//!     {"op":"br","args":["n"],"labels":["loop","done"]},
//!     {"label":"done"},
//!     {"op":"ret"}
//! ]}]}"#)?;
//!
//! let (program, events) = PassScheduler::default().run(program);
//! assert_eq!(events.count_kind(EventKind::InstructionHoisted), 1);
//! assert!(program.to_json()?.contains("preheader.0"));
//! # Ok::<(), brilopt::Error>(())
//! ```
//!
//! ### Analyses Directly
//!
//! ```rust
//! use brilopt::{analysis::ControlFlowGraph, ir::Instruction};
//!
//! let cfg = ControlFlowGraph::from_instructions(&[
//!     Instruction::label("a"),
//!     Instruction::branch("c", "b", "a"),
//!     Instruction::label("b"),
//!     Instruction::ret(&[]),
//! ])?;
//!
//! // `a` has a predecessor, so an entry block was synthesized in front of it
//! assert!(cfg.has_synthetic_entry());
//! assert!(cfg.dominates("a", "b")?);
//! # Ok::<(), brilopt::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`ir`] - Bril records, block splitting, explicit fallthrough
//! - [`analysis`] - CFG, dominance, loops, data flow, SSA
//! - [`compiler`] - passes, the pass scheduler and the event log
//! - [`config`] - pipeline configuration
//! - [`utils`] - generic graph, dominator and bitset machinery
//! - [`Error`] and [`Result`] - error handling
//!
//! ## Logging
//!
//! Diagnostics are emitted through [`tracing`] at `debug` and `trace` level. The
//! library never installs a subscriber.

#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use brilopt::prelude::*;
///
/// let config = OptimizerConfig::new().with_ssa(true);
/// let scheduler = PassScheduler::from_config(&config);
/// assert_eq!(scheduler.pass_names().count(), 2);
/// ```
pub mod prelude;

/// Bril program representation.
///
/// - [`ir::Instruction`], [`ir::Function`], [`ir::Program`] - the JSON records
/// - [`ir::Block`] and [`ir::split_blocks`] - basic blocks
/// - [`ir::add_terminators`] - explicit fallthrough
pub mod ir;

/// Program analyses over control flow graphs.
pub mod analysis;

/// Transformation passes and their scheduling.
pub mod compiler;

/// Pipeline configuration.
pub mod config;

/// Generic graph infrastructure shared by the analyses.
pub mod utils;

pub use config::OptimizerConfig;

/// `brilopt` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always
/// [`Error`]. This is used consistently throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// `brilopt` Error type
///
/// The main error type for all operations in this crate.
pub use error::Error;
