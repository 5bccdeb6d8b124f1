//! Reaching and defined variable analyses.
//!
//! Both are forward analyses over the annotated definitions of each block (see
//! [`CfgNode::annotated_definitions`]). They differ only in which side wins when a
//! variable is both defined in the block and flowing in:
//!
//! - [`ReachingDefinitions`]: the block's own version replaces the incoming one
//!   (kill and gen in a single step)
//! - [`DefinedVariables`]: the incoming version is kept

use crate::analysis::{
    cfg::CfgNode,
    dataflow::framework::{DataFlowAnalysis, Direction, Fact, FactMap},
};

/// Merges mappings by union; on a key collision the later mapping wins.
pub(crate) fn union(inputs: &[&FactMap]) -> FactMap {
    let mut merged = FactMap::new();
    for facts in inputs {
        merged.extend(facts.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged
}

fn versions(node: &CfgNode) -> impl Iterator<Item = (String, Fact)> + '_ {
    node.annotated_definitions()
        .iter()
        .map(|(var, &version)| (var.clone(), Fact::Version(version)))
}

/// Which version of each variable reaches each block.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReachingDefinitions;

impl DataFlowAnalysis for ReachingDefinitions {
    const DIRECTION: Direction = Direction::Forward;

    fn merge(&self, inputs: &[&FactMap]) -> FactMap {
        union(inputs)
    }

    fn transfer(&self, node: &CfgNode, input: &FactMap) -> FactMap {
        let mut out = input.clone();
        out.extend(versions(node));
        out
    }
}

/// Which variables are defined on some path into or through each block.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefinedVariables;

impl DataFlowAnalysis for DefinedVariables {
    const DIRECTION: Direction = Direction::Forward;

    fn merge(&self, inputs: &[&FactMap]) -> FactMap {
        union(inputs)
    }

    fn transfer(&self, node: &CfgNode, input: &FactMap) -> FactMap {
        let mut out: FactMap = versions(node).collect();
        out.extend(input.iter().map(|(k, v)| (k.clone(), v.clone())));
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

    fn two_blocks() -> ControlFlowGraph {
        let int = Type::primitive("int");
        ControlFlowGraph::from_instructions(&[
            Instruction::label("a"),
            Instruction::constant("x", int.clone(), 1),
            Instruction::jump("b"),
            Instruction::label("b"),
            Instruction::constant("x", int, 2),
            Instruction::ret(&[]),
        ])
        .unwrap()
    }

    #[test]
    fn test_union_later_wins() {
        let first: FactMap = [("x".to_string(), Fact::Version(0))].into();
        let second: FactMap = [("x".to_string(), Fact::Version(3))].into();
        assert_eq!(union(&[&first, &second])["x"], Fact::Version(3));
    }

    #[test]
    fn test_reaching_kills_incoming() {
        let cfg = two_blocks();
        let b = cfg.node(cfg.node_id("b").unwrap()).unwrap();
        let input: FactMap = [("x".to_string(), Fact::Version(0))].into();
        assert_eq!(ReachingDefinitions.transfer(b, &input)["x"], Fact::Version(1));
    }

    #[test]
    fn test_defined_keeps_incoming() {
        let cfg = two_blocks();
        let b = cfg.node(cfg.node_id("b").unwrap()).unwrap();
        let input: FactMap = [("x".to_string(), Fact::Version(0))].into();
        assert_eq!(DefinedVariables.transfer(b, &input)["x"], Fact::Version(0));
        assert_eq!(
            DefinedVariables.transfer(b, &FactMap::new())["x"],
            Fact::Version(1)
        );
    }
}
