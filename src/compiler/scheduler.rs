//! Pass scheduler for running the configured passes over a program.
//!
//! The `PassScheduler` normalizes every function (optional explicit fallthrough),
//! then runs its passes in registration order. Functions are independent, so they
//! can be processed in parallel with rayon.

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::{
    compiler::{
        events::{EventKind, EventLog},
        pass::Pass,
        passes::{LicmPass, SsaConstructionPass},
    },
    config::OptimizerConfig,
    ir::{add_terminators, flatten, split_blocks, Function, Program},
    Result,
};

/// Runs a sequence of passes over every function of a program.
///
/// A pass that fails on a function leaves that function exactly as it was before the
/// pipeline touched it; the failure is recorded as an [`EventKind::Error`] and the
/// remaining functions are still processed.
pub struct PassScheduler {
    passes: Vec<Box<dyn Pass>>,
    add_terminators: bool,
    parallel: bool,
}

impl Default for PassScheduler {
    fn default() -> Self {
        Self::from_config(&OptimizerConfig::default())
    }
}

impl PassScheduler {
    /// Creates a scheduler without passes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            passes: Vec::new(),
            add_terminators: true,
            parallel: false,
        }
    }

    /// Creates a scheduler running the passes `config` enables.
    ///
    /// SSA construction runs before LICM when both are enabled.
    #[must_use]
    pub fn from_config(config: &OptimizerConfig) -> Self {
        let mut scheduler = Self::new()
            .with_terminators(config.add_terminators)
            .with_parallel(config.parallel);

        if config.enable_ssa {
            scheduler.add_pass(Box::new(SsaConstructionPass::new(
                config.undefined_name.as_str(),
                config.entry_prefix.as_str(),
            )));
        }
        if config.enable_licm {
            scheduler.add_pass(Box::new(
                LicmPass::new()
                    .with_prefixes(
                        config.entry_prefix.as_str(),
                        config.preheader_prefix.as_str(),
                    )
                    .with_rounds(config.max_licm_rounds),
            ));
        }
        scheduler
    }

    /// Enables or disables explicit fallthrough before the passes run.
    #[must_use]
    pub fn with_terminators(mut self, enabled: bool) -> Self {
        self.add_terminators = enabled;
        self
    }

    /// Enables or disables parallel processing of functions.
    #[must_use]
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Appends a pass to the pipeline.
    pub fn add_pass(&mut self, pass: Box<dyn Pass>) {
        self.passes.push(pass);
    }

    /// Returns the names of the registered passes in execution order.
    pub fn pass_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.passes.iter().map(|p| p.name())
    }

    /// Runs the pipeline over `program`.
    ///
    /// Returns the rewritten program and the log of everything that changed.
    #[must_use]
    pub fn run(&self, mut program: Program) -> (Program, EventLog) {
        let events = EventLog::new();
        self.run_in_place(&mut program, &events);
        (program, events)
    }

    /// Runs the pipeline over `program`, recording into an existing log.
    ///
    /// Returns the number of functions that changed.
    pub fn run_in_place(&self, program: &mut Program, events: &EventLog) -> usize {
        for pass in &self.passes {
            events
                .record(EventKind::PassStarted)
                .message(pass.description())
                .pass(pass.name());
        }

        let changed = AtomicUsize::new(0);
        let process = |function: &mut Function| {
            if self.process_function(function, events) {
                changed.fetch_add(1, Ordering::Relaxed);
            }
        };
        if self.parallel {
            program.functions.par_iter_mut().for_each(process);
        } else {
            program.functions.iter_mut().for_each(process);
        }

        let changed = changed.load(Ordering::Relaxed);
        debug!(
            functions = program.functions.len(),
            changed,
            "pipeline finished"
        );
        changed
    }

    /// Processes one function, restoring it if anything fails.
    fn process_function(&self, function: &mut Function, events: &EventLog) -> bool {
        let mut working = function.clone();
        match self.run_passes(&mut working, events) {
            Ok(changed) => {
                *function = working;
                changed
            }
            Err(err) => {
                warn!(function = %function.name, error = %err, "function left unchanged");
                events
                    .record(EventKind::Error)
                    .function(function.name.as_str())
                    .message(err.to_string());
                false
            }
        }
    }

    fn run_passes(&self, function: &mut Function, events: &EventLog) -> Result<bool> {
        let mut changed = false;

        if self.add_terminators && !function.instrs.is_empty() {
            let mut blocks = split_blocks(&function.instrs)?;
            add_terminators(&mut blocks);
            let explicit = flatten(blocks);
            changed |= explicit != function.instrs;
            function.instrs = explicit;
        }

        for pass in &self.passes {
            if !pass.should_run(function) {
                events
                    .record(EventKind::FunctionSkipped)
                    .function(function.name.as_str())
                    .pass(pass.name());
                continue;
            }
            if pass.run_on_function(function, events)? {
                changed = true;
                events
                    .record(EventKind::PassCompleted)
                    .function(function.name.as_str())
                    .message("changed")
                    .pass(pass.name());
            }
        }

        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::ssa::is_ssa,
        ir::{Instruction, Type},
    };

    struct FailingPass;

    impl Pass for FailingPass {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn run_on_function(&self, function: &mut Function, _events: &EventLog) -> Result<bool> {
            function.instrs.clear();
            Err(crate::Error::BlockNotFound("missing".to_string()))
        }
    }

    fn loop_function(name: &str) -> Function {
        let int = Type::primitive("int");
        Function::new(
            name,
            vec![
                Instruction::constant("i", int.clone(), 0),
                Instruction::label("loop"),
                Instruction::constant("k", int.clone(), 4),
                Instruction::value_op("add", "i", int, &["i", "k"]),
                Instruction::branch("i", "loop", "done"),
                Instruction::label("done"),
                Instruction::ret(&["i"]),
            ],
        )
    }

    #[test]
    fn test_default_pipeline() {
        let scheduler = PassScheduler::default();
        assert_eq!(scheduler.pass_names().collect::<Vec<_>>(), vec!["licm"]);

        let all = PassScheduler::from_config(&OptimizerConfig::new().with_ssa(true));
        assert_eq!(all.pass_names().collect::<Vec<_>>(), vec!["ssa", "licm"]);

        let none = PassScheduler::from_config(&OptimizerConfig::disabled());
        assert_eq!(none.pass_names().count(), 0);
    }

    #[test]
    fn test_fallthrough_made_explicit() {
        let scheduler = PassScheduler::from_config(&OptimizerConfig::disabled());
        let program = Program {
            functions: vec![loop_function("main")],
        };
        let (program, events) = scheduler.run(program);

        // b0 now jumps to loop explicitly
        assert_eq!(program.functions[0].instrs[1], Instruction::jump("loop"));
        assert!(!events.has(EventKind::Error));
    }

    #[test]
    fn test_licm_through_pipeline() {
        let program = Program {
            functions: vec![loop_function("main"), loop_function("other")],
        };
        let (program, events) = PassScheduler::default().with_parallel(true).run(program);

        for function in &program.functions {
            assert!(function
                .instrs
                .iter()
                .any(|i| i.label.as_deref() == Some("preheader.0")));
        }
        assert_eq!(events.count_kind(EventKind::InstructionHoisted), 2);
        assert_eq!(events.count_kind(EventKind::PassCompleted), 2);
    }

    #[test]
    fn test_ssa_then_licm() {
        let config = OptimizerConfig::new().with_ssa(true);
        let program = Program {
            functions: vec![loop_function("main")],
        };
        let (program, events) = PassScheduler::from_config(&config).run(program);

        assert!(is_ssa(&program));
        assert!(events.has(EventKind::PhiInserted));
        assert!(events.has(EventKind::InstructionHoisted));
    }

    #[test]
    fn test_failure_restores_function() {
        let mut scheduler = PassScheduler::new();
        scheduler.add_pass(Box::new(FailingPass));
        let original = loop_function("main");
        let program = Program {
            functions: vec![original.clone()],
        };

        let (program, events) = scheduler.run(program);
        assert_eq!(program.functions[0], original);
        assert_eq!(events.count_kind(EventKind::Error), 1);
    }

    #[test]
    fn test_empty_function_skipped() {
        let program = Program {
            functions: vec![Function::new("empty", Vec::new())],
        };
        let (_, events) = PassScheduler::default().run(program);
        assert_eq!(events.count_kind(EventKind::FunctionSkipped), 1);
    }
}
