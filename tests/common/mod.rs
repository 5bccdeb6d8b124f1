//! Shared helpers for building programs from JSON literals.
#![allow(dead_code)]

use brilopt::ir::{split_blocks, Block, Function, Program};
use serde_json::{json, Value};

/// Builds a function named `main` from a JSON instruction array.
pub fn function(instrs: Value) -> Function {
    function_with_args(instrs, json!([]))
}

/// Builds a function named `main` with parameters, e.g. `[{"name":"n","type":"int"}]`.
pub fn function_with_args(instrs: Value, args: Value) -> Function {
    serde_json::from_value(json!({ "name": "main", "args": args, "instrs": instrs }))
        .expect("valid function record")
}

/// Wraps functions into a program.
pub fn program(functions: Vec<Function>) -> Program {
    Program { functions }
}

/// Splits a JSON instruction array into blocks.
pub fn blocks(instrs: Value) -> Vec<Block> {
    split_blocks(&function(instrs).instrs).expect("unique block names")
}

/// The header/body loop used across the loop tests.
pub fn counting_loop() -> Value {
    json!([
        { "label": "start" },
        { "op": "const", "dest": "x", "type": "int", "value": 0 },
        { "op": "const", "dest": "ten", "type": "int", "value": 10 },
        { "op": "const", "dest": "one", "type": "int", "value": 1 },
        { "op": "jmp", "labels": ["header"] },
        { "label": "header" },
        { "op": "lt", "dest": "c", "type": "bool", "args": ["x", "ten"] },
        { "op": "br", "args": ["c"], "labels": ["body", "exit"] },
        { "label": "body" },
        { "op": "add", "dest": "x", "type": "int", "args": ["x", "one"] },
        { "op": "const", "dest": "y", "type": "int", "value": 5 },
        { "op": "jmp", "labels": ["header"] },
        { "label": "exit" },
        { "op": "print", "args": ["x"] },
        { "op": "ret" }
    ])
}
