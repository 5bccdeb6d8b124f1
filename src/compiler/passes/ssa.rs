//! SSA construction pass.
//!
//! Rewrites a function into SSA form with [`SsaBuilder`] and reports every inserted
//! phi to the event log. Fallthrough is made explicit before the graph is built, so
//! the pass gives the same result with or without the scheduler's normalization.

use tracing::debug;

use crate::{
    analysis::{
        cfg::{ControlFlowGraph, DEFAULT_ENTRY_PREFIX},
        ssa::{SsaBuilder, DEFAULT_UNDEFINED_NAME},
    },
    compiler::{
        events::{EventKind, EventLog},
        pass::Pass,
    },
    ir::{add_terminators, split_blocks, Function},
    Result,
};

/// Converts functions to SSA form.
#[derive(Debug, Clone)]
pub struct SsaConstructionPass {
    undefined_name: String,
    entry_prefix: String,
}

impl Default for SsaConstructionPass {
    fn default() -> Self {
        Self::new(DEFAULT_UNDEFINED_NAME, DEFAULT_ENTRY_PREFIX)
    }
}

impl SsaConstructionPass {
    /// Creates the pass with explicit naming for the undefined sentinel and
    /// synthesized entry blocks.
    #[must_use]
    pub fn new(undefined_name: impl Into<String>, entry_prefix: impl Into<String>) -> Self {
        Self {
            undefined_name: undefined_name.into(),
            entry_prefix: entry_prefix.into(),
        }
    }
}

impl Pass for SsaConstructionPass {
    fn name(&self) -> &'static str {
        "ssa"
    }

    fn description(&self) -> &'static str {
        "Places phi instructions and renames every definition to a unique version"
    }

    fn run_on_function(&self, function: &mut Function, events: &EventLog) -> Result<bool> {
        let mut blocks = split_blocks(&function.instrs)?;
        add_terminators(&mut blocks);
        let cfg = ControlFlowGraph::from_blocks_with_prefix(blocks, &self.entry_prefix)?;
        let params: Vec<&str> = function.arg_names().collect();

        let form = SsaBuilder::new(&cfg)
            .with_undefined_name(self.undefined_name.as_str())
            .build(&params)?;

        if cfg.has_synthetic_entry() {
            events
                .record(EventKind::EntryBlockSynthesized)
                .at(function.name.as_str(), cfg.entry_name())
                .pass(self.name());
        }
        for (block, phis) in &form.phis {
            for phi in phis {
                events
                    .record(EventKind::PhiInserted)
                    .at(function.name.as_str(), block.as_str())
                    .message(phi.to_string())
                    .pass(self.name());
            }
        }
        if form.renamed > 0 {
            events
                .record(EventKind::VariableRenamed)
                .function(function.name.as_str())
                .message(format!("{} definitions renamed", form.renamed))
                .pass(self.name());
        }
        if form.undefined_uses > 0 {
            events.warn(format!(
                "{}: {} uses read {}",
                function.name, form.undefined_uses, self.undefined_name
            ));
        }

        debug!(
            function = %function.name,
            phis = form.phi_count(),
            renamed = form.renamed,
            "ssa construction finished"
        );

        let instrs = form.into_instructions();
        let changed = instrs != function.instrs;
        function.instrs = instrs;
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::ssa::is_ssa_function,
        ir::{Argument, Instruction, Type},
    };

    #[test]
    fn test_pass_metadata() {
        let pass = SsaConstructionPass::default();
        assert_eq!(pass.name(), "ssa");
        assert!(!pass.description().is_empty());
        assert!(!pass.should_run(&Function::new("empty", Vec::new())));
    }

    #[test]
    fn test_rewrites_function() {
        let int = Type::primitive("int");
        let mut function = Function::new(
            "main",
            vec![
                Instruction::label("top"),
                Instruction::constant("i", int.clone(), 0),
                Instruction::jump("loop"),
                Instruction::label("loop"),
                Instruction::value_op("add", "i", int, &["i", "i"]),
                Instruction::branch("i", "loop", "out"),
                Instruction::label("out"),
                Instruction::ret(&["i"]),
            ],
        );
        let events = EventLog::new();
        let changed = SsaConstructionPass::default()
            .run_on_function(&mut function, &events)
            .unwrap();

        assert!(changed);
        assert!(is_ssa_function(&function));
        assert_eq!(events.count_kind(EventKind::PhiInserted), 1);
        assert_eq!(events.count_kind(EventKind::VariableRenamed), 1);
        assert!(!events.has(EventKind::EntryBlockSynthesized));
    }

    #[test]
    fn test_fallthrough_join_gets_phi() {
        let boolean = Type::primitive("bool");
        let mut function = Function::new(
            "main",
            vec![
                Instruction::branch("p", "then", "join"),
                Instruction::label("then"),
                Instruction::constant("p", boolean.clone(), false),
                Instruction::label("join"),
                Instruction::value_op("id", "r", boolean.clone(), &["p"]),
                Instruction::ret(&["r"]),
            ],
        );
        function.args = vec![Argument {
            name: "p".to_string(),
            ty: boolean,
        }];

        let events = EventLog::new();
        assert!(SsaConstructionPass::default()
            .run_on_function(&mut function, &events)
            .unwrap());
        assert!(is_ssa_function(&function));

        let then_def = function
            .instrs
            .iter()
            .find(|i| i.op() == Some("const"))
            .and_then(|i| i.dest.clone())
            .unwrap();
        let phi = function
            .instrs
            .iter()
            .find(|i| i.op() == Some("phi"))
            .unwrap();
        let mut sources = phi.args.clone();
        sources.sort();
        let mut expected = vec!["p".to_string(), then_def];
        expected.sort();
        assert_eq!(sources, expected);

        let read = function
            .instrs
            .iter()
            .find(|i| i.op() == Some("id"))
            .unwrap();
        assert_eq!(read.args, vec![phi.dest.clone().unwrap()]);
        assert_eq!(events.count_kind(EventKind::PhiInserted), 1);
    }
}
