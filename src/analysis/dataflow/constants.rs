//! Constant propagation.
//!
//! Tracks, for every variable, whether it holds the same literal on all paths. When
//! two sources disagree the variable becomes [`Fact::NotConst`]; once a variable is
//! marked it never becomes constant again, which bounds the number of changes per
//! block and guarantees termination.

use std::collections::btree_map::Entry;

use crate::analysis::{
    cfg::CfgNode,
    dataflow::framework::{DataFlowAnalysis, Direction, Fact, FactMap},
};

/// Folds `incoming` into `into`, turning disagreements into [`Fact::NotConst`].
fn merge_conflicting(into: &mut FactMap, incoming: &FactMap) {
    for (var, fact) in incoming {
        match into.entry(var.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(fact.clone());
            }
            Entry::Occupied(mut slot) => {
                if slot.get() != fact {
                    slot.insert(Fact::NotConst);
                }
            }
        }
    }
}

/// Forward constant propagation over block-level definitions.
///
/// The transfer function starts from the block's own definitions (the last
/// assignment of each variable: its literal for `const`, otherwise
/// [`Fact::NotConst`]) and folds the incoming facts in with the same conflict rule as
/// the merge. A variable redefined to a different literal than the one flowing in is
/// therefore reported as not constant.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantPropagation;

impl DataFlowAnalysis for ConstantPropagation {
    const DIRECTION: Direction = Direction::Forward;

    fn merge(&self, inputs: &[&FactMap]) -> FactMap {
        let mut merged = FactMap::new();
        for facts in inputs {
            merge_conflicting(&mut merged, facts);
        }
        merged
    }

    fn transfer(&self, node: &CfgNode, input: &FactMap) -> FactMap {
        let mut out = FactMap::new();
        for instr in node.block().instructions() {
            if let Some(dest) = &instr.dest {
                let fact = instr
                    .constant_value()
                    .map_or(Fact::NotConst, |lit| Fact::Const(lit.clone()));
                out.insert(dest.clone(), fact);
            }
        }
        merge_conflicting(&mut out, input);
        out
    }
}
