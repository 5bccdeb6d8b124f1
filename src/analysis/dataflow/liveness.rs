//! Live variable analysis.
//!
//! A variable is live at a point if some path from there reads it before any
//! redefinition. This is a backward analysis: a block's live-in set is its live-out
//! set minus the variables it defines, plus the variables it reads before defining.

use crate::analysis::{
    cfg::CfgNode,
    dataflow::{
        framework::{DataFlowAnalysis, Direction, Fact, FactMap},
        reaching::union,
    },
};

/// Live variables, reported as [`Fact::Live`] entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveVariables;

impl DataFlowAnalysis for LiveVariables {
    const DIRECTION: Direction = Direction::Backward;

    fn merge(&self, inputs: &[&FactMap]) -> FactMap {
        union(inputs)
    }

    fn transfer(&self, node: &CfgNode, input: &FactMap) -> FactMap {
        let defined = node.annotated_definitions();
        let mut out: FactMap = input
            .iter()
            .filter(|(var, _)| !defined.contains_key(*var))
            .map(|(var, fact)| (var.clone(), fact.clone()))
            .collect();
        for var in node.block().upward_exposed_uses() {
            out.insert(var, Fact::Live);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::ControlFlowGraph,
        ir::{Instruction, Type},
    };

    #[test]
    fn test_transfer_kills_and_generates() {
        let int = Type::primitive("int");
        let cfg = ControlFlowGraph::from_instructions(&[
            Instruction::value_op("add", "x", int.clone(), &["a", "b"]),
            Instruction::value_op("add", "a", int, &["x", "x"]),
            Instruction::ret(&["a"]),
        ])
        .unwrap();
        let node = cfg.node(cfg.entry()).unwrap();

        let live_out: FactMap = [
            ("a".to_string(), Fact::Live),
            ("z".to_string(), Fact::Live),
        ]
        .into();
        let live_in = LiveVariables.transfer(node, &live_out);

        assert_eq!(
            live_in.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["a", "b", "z"]
        );
    }
}
