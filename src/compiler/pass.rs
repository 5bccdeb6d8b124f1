//! The pass trait.

use crate::{compiler::events::EventLog, ir::Function, Result};

/// A transformation over one function.
///
/// All passes must be thread-safe (`Send + Sync`) so the
/// [`PassScheduler`](crate::compiler::PassScheduler) can run them on several functions
/// at once. Changes are reported through the shared [`EventLog`].
pub trait Pass: Send + Sync {
    /// Unique name for logging and debugging.
    fn name(&self) -> &'static str;

    /// Should this pass run on `function`?
    ///
    /// Called before [`run_on_function`](Self::run_on_function). The default skips
    /// functions without instructions.
    fn should_run(&self, function: &Function) -> bool {
        !function.instrs.is_empty()
    }

    /// Runs the pass on a single function.
    ///
    /// Returns `true` if any change was made.
    ///
    /// # Errors
    ///
    /// Returns an error if the function's control flow is malformed. The function is
    /// left unchanged in that case.
    fn run_on_function(&self, function: &mut Function, events: &EventLog) -> Result<bool>;

    /// Get a description of what this pass does.
    fn description(&self) -> &'static str {
        "No description available"
    }
}
