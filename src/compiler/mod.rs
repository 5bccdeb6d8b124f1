//! Pass infrastructure for rewriting Bril functions.
//!
//! This module sits on top of [`crate::analysis`]:
//!
//! - [`crate::analysis`] - CFG, dominance, dataflow, SSA construction
//! - [`compiler`](self) - passes, scheduling, change tracking
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Pass Pipeline                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  PassScheduler               Runs passes per function        │
//! │    ├─ add_terminators         (explicit fallthrough)         │
//! │    ├─ passes in order         (sequential or rayon)          │
//! │    └─ restore on error        (function left unchanged)      │
//! │                                                              │
//! │  Pass trait                  Interface for all passes        │
//! │    ├─ should_run()                                           │
//! │    └─ run_on_function()                                      │
//! │                                                              │
//! │  Passes                                                      │
//! │    ├─ SsaConstructionPass     phi placement + renaming       │
//! │    └─ LicmPass                preheaders + hoisting          │
//! │                                                              │
//! │  EventLog                    Change tracking and diagnostics │
//! │                                                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod events;
mod pass;
mod passes;
mod scheduler;

pub use events::{Event, EventBuilder, EventKind, EventLog, EventLogIter};
pub use pass::Pass;
pub use passes::{HoistedInstruction, LicmOutcome, LicmPass, SsaConstructionPass};
pub use scheduler::PassScheduler;
