//! Benchmarks for the graph analyses and passes.
//!
//! All benchmarks run over a synthetic function made of a chain of nested loops:
//! - CFG construction and dominance
//! - Live variables and constant propagation
//! - SSA construction
//! - Loop-invariant code motion

extern crate brilopt;

use brilopt::{
    analysis::{
        dataflow::{solve, AnalysisKind},
        ssa::build_ssa,
        ControlFlowGraph,
    },
    compiler::LicmPass,
    ir::{add_terminators, split_blocks, Block, Function, Instruction, Type},
};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

/// Builds `depth` nested loops, each with a counter, an invariant and a body
/// redefining a shared accumulator.
fn nested_loops(depth: usize) -> Function {
    let int = Type::primitive("int");
    let mut instrs = vec![
        Instruction::constant("acc", int.clone(), 0),
        Instruction::constant("one", int.clone(), 1),
    ];

    for level in 0..depth {
        let i = format!("i{level}");
        instrs.push(Instruction::constant(i.as_str(), int.clone(), 0));
        instrs.push(Instruction::label(format!("head{level}")));
        instrs.push(Instruction::constant(format!("k{level}"), int.clone(), 7));
        instrs.push(Instruction::value_op(
            "add",
            i.as_str(),
            int.clone(),
            &[i.as_str(), "one"],
        ));
        instrs.push(Instruction::value_op(
            "add",
            "acc",
            int.clone(),
            &["acc", i.as_str()],
        ));
    }
    for level in (0..depth).rev() {
        let i = format!("i{level}");
        instrs.push(Instruction::branch(
            &i,
            format!("head{level}"),
            format!("exit{level}"),
        ));
        instrs.push(Instruction::label(format!("exit{level}")));
    }
    instrs.push(Instruction::effect("print", &["acc"]));

    Function::new("bench", instrs)
}

fn blocks(function: &Function) -> Vec<Block> {
    let mut blocks = split_blocks(&function.instrs).unwrap();
    add_terminators(&mut blocks);
    blocks
}

/// Benchmark graph construction plus the dominance fixpoint.
fn bench_dominance(c: &mut Criterion) {
    let blocks = blocks(&nested_loops(24));

    c.bench_function("cfg_dominance_frontiers", |b| {
        b.iter(|| {
            let cfg = ControlFlowGraph::from_blocks(black_box(blocks.clone())).unwrap();
            black_box(cfg.dominance_frontiers())
        });
    });
}

/// Benchmark the worklist solver on a backward and a forward analysis.
fn bench_dataflow(c: &mut Criterion) {
    let blocks = blocks(&nested_loops(24));

    c.bench_function("dataflow_live", |b| {
        b.iter(|| {
            let kind = AnalysisKind::Live;
            black_box(solve(black_box(&blocks), kind, kind.direction()).unwrap())
        });
    });

    c.bench_function("dataflow_cprop", |b| {
        b.iter(|| {
            let kind = AnalysisKind::ConstantPropagation;
            black_box(solve(black_box(&blocks), kind, kind.direction()).unwrap())
        });
    });
}

/// Benchmark phi placement and renaming.
fn bench_ssa(c: &mut Criterion) {
    let function = nested_loops(24);

    c.bench_function("ssa_build", |b| {
        b.iter(|| black_box(build_ssa(black_box(&function)).unwrap()));
    });
}

/// Benchmark one LICM round.
fn bench_licm(c: &mut Criterion) {
    let blocks = blocks(&nested_loops(24));
    let pass = LicmPass::new();

    c.bench_function("licm_hoist", |b| {
        b.iter(|| black_box(pass.hoist(black_box(blocks.clone())).unwrap()));
    });
}

criterion_group!(benches, bench_dominance, bench_dataflow, bench_ssa, bench_licm);
criterion_main!(benches);
