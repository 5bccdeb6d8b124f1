//! Dominance queries over named blocks.

mod common;

use std::collections::BTreeSet;

use brilopt::analysis::ControlFlowGraph;
use common::function;
use serde_json::json;

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| (*n).to_string()).collect()
}

fn diamond() -> ControlFlowGraph {
    let f = function(json!([
        { "label": "entry" },
        { "op": "jmp", "labels": ["header"] },
        { "label": "header" },
        { "op": "br", "args": ["c"], "labels": ["left", "right"] },
        { "label": "left" },
        { "op": "jmp", "labels": ["join"] },
        { "label": "right" },
        { "op": "jmp", "labels": ["join"] },
        { "label": "join" },
        { "op": "ret" }
    ]));
    ControlFlowGraph::from_instructions(&f.instrs).unwrap()
}

fn nested_loops() -> ControlFlowGraph {
    let f = function(json!([
        { "label": "entry" },
        { "op": "jmp", "labels": ["outer"] },
        { "label": "outer" },
        { "op": "br", "args": ["c"], "labels": ["inner", "exit"] },
        { "label": "inner" },
        { "op": "br", "args": ["c"], "labels": ["inner", "latch"] },
        { "label": "latch" },
        { "op": "br", "args": ["c"], "labels": ["outer", "side"] },
        { "label": "side" },
        { "op": "jmp", "labels": ["exit"] },
        { "label": "exit" },
        { "op": "ret" }
    ]));
    ControlFlowGraph::from_instructions(&f.instrs).unwrap()
}

#[test]
fn diamond_dominators() {
    let cfg = diamond();
    let doms = cfg.dominators();

    assert_eq!(doms["entry"], set(&["entry"]));
    assert_eq!(doms["left"], set(&["entry", "header", "left"]));
    assert_eq!(doms["join"], set(&["entry", "header", "join"]));
}

#[test]
fn diamond_frontiers() {
    let cfg = diamond();
    let frontiers = cfg.dominance_frontiers();

    assert_eq!(frontiers["left"], set(&["join"]));
    assert_eq!(frontiers["right"], set(&["join"]));
    assert!(frontiers["header"].is_empty());
    assert!(frontiers["join"].is_empty());
}

#[test]
fn diamond_dominator_tree() {
    let cfg = diamond();
    let tree = cfg.immediate_dominators();

    assert_eq!(tree["entry"], vec!["header"]);
    // join's closest dominator is header, not one of its predecessors
    assert_eq!(tree["header"], vec!["join", "left", "right"]);
    assert!(tree["left"].is_empty());
}

#[test]
fn loop_header_in_own_frontier() {
    let cfg = nested_loops();
    let frontiers = cfg.dominance_frontiers();

    assert!(frontiers["inner"].contains("inner"));
    assert!(frontiers["outer"].contains("outer"));
    assert_eq!(frontiers["side"], set(&["exit"]));
}

#[test]
fn dominator_sets_contain_self_and_root() {
    for cfg in [diamond(), nested_loops()] {
        let root = cfg.entry_name().to_string();
        let doms = cfg.dominators();
        assert_eq!(doms[&root], set(&[root.as_str()]));
        for (block, dominators) in &doms {
            assert!(dominators.contains(block), "{block}");
            assert!(dominators.contains(&root), "{block}");
        }
    }
}

#[test]
fn dominance_is_antisymmetric_and_transitive() {
    let cfg = nested_loops();
    let names: Vec<String> = cfg.block_names().map(str::to_string).collect();

    for a in &names {
        for b in &names {
            let ab = cfg.dominates(a, b).unwrap();
            if a != b && ab {
                assert!(!cfg.dominates(b, a).unwrap(), "{a} <-> {b}");
            }
            for c in &names {
                if ab && cfg.dominates(b, c).unwrap() {
                    assert!(cfg.dominates(a, c).unwrap(), "{a} {b} {c}");
                }
            }
        }
    }
}

#[test]
fn frontier_membership_matches_definition() {
    let cfg = nested_loops();
    let frontiers = cfg.dominance_frontiers();

    for (n, frontier) in &frontiers {
        for s in frontier {
            let preds = cfg.predecessor_names(s).unwrap();
            assert!(
                preds.iter().any(|p| cfg.dominates(n, p).unwrap()),
                "{n} dominates no predecessor of {s}"
            );
            let strictly = n != s && cfg.dominates(n, s).unwrap();
            assert!(!strictly, "{n} strictly dominates {s}");
        }
    }
}

#[test]
fn path_check_agrees_with_sets() {
    for cfg in [diamond(), nested_loops()] {
        let names: Vec<String> = cfg.block_names().map(str::to_string).collect();
        for a in &names {
            for b in &names {
                assert_eq!(
                    cfg.dominates(a, b).unwrap(),
                    cfg.dominates_by_paths(a, b).unwrap(),
                    "{a} dom {b}"
                );
            }
        }
    }
}

#[test]
fn synthesized_entry_roots_the_tree() {
    let f = function(json!([
        { "label": "top" },
        { "op": "br", "args": ["c"], "labels": ["top", "done"] },
        { "label": "done" },
        { "op": "ret" }
    ]));
    let cfg = ControlFlowGraph::from_instructions(&f.instrs).unwrap();

    assert!(cfg.has_synthetic_entry());
    assert_eq!(cfg.entry_name(), "entry.0");
    assert_eq!(cfg.dominators()["done"], set(&["entry.0", "top", "done"]));
    assert_eq!(cfg.immediate_dominators()["entry.0"], vec!["top"]);
}

#[test]
fn unknown_block_query_fails() {
    let cfg = diamond();
    assert!(cfg.dominates("entry", "nowhere").is_err());
}
