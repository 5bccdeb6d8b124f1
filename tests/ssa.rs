//! SSA construction end to end.

mod common;

use brilopt::{
    analysis::ssa::{build_ssa, is_ssa, is_ssa_function},
    compiler::{EventKind, PassScheduler},
    ir::Program,
    OptimizerConfig,
};
use common::{function, function_with_args, program};
use serde_json::json;

fn diamond() -> brilopt::ir::Function {
    function_with_args(
        json!([
            { "label": "top" },
            { "op": "const", "dest": "y", "type": "int", "value": 3 },
            { "op": "br", "args": ["c"], "labels": ["left", "right"] },
            { "label": "left" },
            { "op": "const", "dest": "x", "type": "int", "value": 1 },
            { "op": "jmp", "labels": ["join"] },
            { "label": "right" },
            { "op": "const", "dest": "x", "type": "int", "value": 2 },
            { "op": "jmp", "labels": ["join"] },
            { "label": "join" },
            { "op": "print", "args": ["x", "y"] }
        ]),
        json!([{ "name": "c", "type": "bool" }]),
    )
}

#[test]
fn join_gets_phi_only_for_diverging_variable() {
    let form = build_ssa(&diamond()).unwrap();

    assert_eq!(form.phi_count(), 1);
    let phi = &form.phis["join"][0];
    assert_eq!(phi.variable(), "x");

    let left = phi.operand_from("left").unwrap();
    let right = phi.operand_from("right").unwrap();
    assert_ne!(left.value, right.value);
    assert_ne!(Some(left.value.as_str()), phi.dest());
    assert_eq!(form.undefined_uses, 0);
}

#[test]
fn phi_sits_after_label_and_feeds_uses() {
    let form = build_ssa(&diamond()).unwrap();
    let join = form.blocks.iter().find(|b| b.name() == "join").unwrap();
    let instrs = join.instructions();

    assert_eq!(instrs[0].label.as_deref(), Some("join"));
    assert_eq!(instrs[1].op(), Some("phi"));
    assert_eq!(instrs[1].args.len(), instrs[1].labels.len());

    let print = &instrs[2];
    assert_eq!(print.args[0].as_str(), instrs[1].dest.as_deref().unwrap());
}

#[test]
fn single_assignment_after_construction() {
    let before = program(vec![diamond()]);
    assert!(!is_ssa(&before));

    let config = OptimizerConfig::new().with_ssa(true).with_licm(false);
    let (after, events) = PassScheduler::from_config(&config).run(before);

    assert!(is_ssa(&after));
    assert_eq!(events.count_kind(EventKind::PhiInserted), 1);
    assert!(!events.has(EventKind::Error));
}

#[test]
fn parameters_are_their_own_first_version() {
    let f = function_with_args(
        json!([
            { "op": "const", "dest": "one", "type": "int", "value": 1 },
            { "label": "loop" },
            { "op": "sub", "dest": "n", "type": "int", "args": ["n", "one"] },
            { "op": "br", "args": ["n"], "labels": ["loop", "done"] },
            { "label": "done" },
            { "op": "ret", "args": ["n"] }
        ]),
        json!([{ "name": "n", "type": "int" }]),
    );
    let form = build_ssa(&f).unwrap();

    let phis = &form.phis["loop"];
    assert_eq!(phis.len(), 1);
    assert_eq!(phis[0].variable(), "n");
    assert_eq!(phis[0].operand_from("b0").unwrap().value, "n");
    assert_eq!(form.undefined_uses, 0);
}

#[test]
fn missing_definition_reads_sentinel() {
    let f = function_with_args(
        json!([
            { "label": "top" },
            { "op": "br", "args": ["c"], "labels": ["left", "join"] },
            { "label": "left" },
            { "op": "const", "dest": "x", "type": "int", "value": 1 },
            { "op": "jmp", "labels": ["join"] },
            { "label": "join" },
            { "op": "print", "args": ["x"] }
        ]),
        json!([{ "name": "c", "type": "bool" }]),
    );
    let form = build_ssa(&f).unwrap();

    let phi = &form.phis["join"][0];
    assert_eq!(phi.operand_from("top").unwrap().value, "__undefined");
    assert!(form.undefined_uses >= 1);
}

#[test]
fn straight_line_needs_no_phis() {
    let f = function(json!([
        { "op": "const", "dest": "x", "type": "int", "value": 1 },
        { "op": "add", "dest": "x", "type": "int", "args": ["x", "x"] },
        { "op": "print", "args": ["x"] }
    ]));
    assert!(!is_ssa_function(&f));

    let form = build_ssa(&f).unwrap();
    assert_eq!(form.phi_count(), 0);

    let instrs = form.into_instructions();
    assert_eq!(instrs[0].dest.as_deref(), Some("x.0"));
    assert_eq!(instrs[1].args, vec!["x.0", "x.0"]);
    assert_eq!(instrs[1].dest.as_deref(), Some("x.1"));
    assert_eq!(instrs[2].args, vec!["x.1"]);
}

#[test]
fn ssa_output_round_trips_through_json() {
    let config = OptimizerConfig::disabled().with_ssa(true);
    let (after, _) = PassScheduler::from_config(&config).run(program(vec![diamond()]));

    let json = after.to_json().unwrap();
    assert!(json.contains("\"phi\""));
    assert_eq!(Program::from_json(&json).unwrap(), after);
}

#[test]
fn empty_function_is_rejected() {
    let f = function(json!([]));
    assert!(build_ssa(&f).is_err());
}
