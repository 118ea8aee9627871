//! Benchmarks for the core graph algorithms.
//!
//! Measures the analyses on synthesized control-flow shapes:
//! - Dominator computation on deep diamond ladders
//! - SCC detection on one big cycle and on many small ones
//! - Loop identification on nested loop nests
//! - Bounded path enumeration on branching ladders

extern crate flowscope;

use criterion::{criterion_group, criterion_main, Criterion};
use flowscope::prelude::*;
use std::hint::black_box;

/// Builds a ladder of `rungs` stacked diamonds: each rung branches and re-joins.
/// 2 + 3 * rungs nodes, single entry and exit.
fn diamond_ladder(rungs: usize) -> (ProgramGraph, NodeId, NodeId) {
    let mut graph = ProgramGraph::new();
    let entry = graph.add_node(Attrs::named("entry"));
    let mut tail = entry;
    for i in 0..rungs {
        let left = graph.add_node(Attrs::named(&format!("l{i}")));
        let right = graph.add_node(Attrs::named(&format!("r{i}")));
        let join = graph.add_node(Attrs::named(&format!("j{i}")));
        graph.add_edge(tail, left, EdgeRecord::control_flow()).unwrap();
        graph.add_edge(tail, right, EdgeRecord::control_flow()).unwrap();
        graph.add_edge(left, join, EdgeRecord::control_flow()).unwrap();
        graph.add_edge(right, join, EdgeRecord::control_flow()).unwrap();
        tail = join;
    }
    let exit = graph.add_node(Attrs::named("exit"));
    graph.add_edge(tail, exit, EdgeRecord::control_flow()).unwrap();
    (graph, entry, exit)
}

/// Builds a nest of `depth` loops, each headed inside the previous one.
fn loop_nest(depth: usize) -> ProgramGraph {
    let mut graph = ProgramGraph::new();
    let entry = graph.add_node(Attrs::named("entry"));
    let mut headers = Vec::with_capacity(depth);
    let mut tail = entry;
    for i in 0..depth {
        let header = graph.add_node(Attrs::named(&format!("h{i}")));
        graph.add_edge(tail, header, EdgeRecord::control_flow()).unwrap();
        headers.push(header);
        tail = header;
    }
    let latch = graph.add_node(Attrs::named("latch"));
    graph.add_edge(tail, latch, EdgeRecord::control_flow()).unwrap();
    for &header in headers.iter().rev() {
        graph.add_edge(latch, header, EdgeRecord::control_flow()).unwrap();
    }
    let exit = graph.add_node(Attrs::named("exit"));
    graph.add_edge(latch, exit, EdgeRecord::control_flow()).unwrap();
    graph
}

fn bench_dominators_ladder(c: &mut Criterion) {
    let (graph, _, _) = diamond_ladder(500);
    let normalized = normalize(graph).unwrap();

    c.bench_function("dominators_ladder_500", |b| {
        b.iter(|| {
            let tree = compute_dominators(black_box(&normalized)).unwrap();
            black_box(tree)
        });
    });
}

fn bench_post_dominators_ladder(c: &mut Criterion) {
    let (graph, _, exit) = diamond_ladder(500);
    let normalized = normalize(graph).unwrap();

    c.bench_function("post_dominators_ladder_500", |b| {
        b.iter(|| {
            let tree = flowscope::graph::algorithms::compute_post_dominators(
                black_box(&normalized),
                exit,
            )
            .unwrap();
            black_box(tree)
        });
    });
}

fn bench_scc_single_cycle(c: &mut Criterion) {
    let mut graph = ProgramGraph::new();
    let n = 10_000;
    let ids: Vec<NodeId> = (0..n)
        .map(|i| graph.add_node(Attrs::named(&format!("n{i}"))))
        .collect();
    for i in 0..n {
        graph
            .add_edge(ids[i], ids[(i + 1) % n], EdgeRecord::control_flow())
            .unwrap();
    }

    c.bench_function("scc_cycle_10k", |b| {
        b.iter(|| {
            let sccs = strongly_connected_components(black_box(&graph)).unwrap();
            black_box(sccs)
        });
    });
}

fn bench_loop_identification(c: &mut Criterion) {
    let graph = loop_nest(50);
    let normalized = normalize(graph).unwrap();

    c.bench_function("loops_nest_50", |b| {
        b.iter(|| {
            let forest = identify_loops(black_box(&normalized)).unwrap();
            black_box(forest)
        });
    });
}

fn bench_path_enumeration(c: &mut Criterion) {
    // 2^20 simple paths through the ladder; the bound keeps it honest
    let (graph, entry, exit) = diamond_ladder(20);
    let bounds = PathBounds::new(1_000, usize::MAX);

    c.bench_function("paths_ladder_20_bounded_1k", |b| {
        b.iter(|| {
            let paths: Vec<Path> =
                enumerate_paths(black_box(&graph), &[entry], &[exit], bounds)
                    .unwrap()
                    .collect();
            black_box(paths)
        });
    });
}

criterion_group!(
    benches,
    bench_dominators_ladder,
    bench_post_dominators_ladder,
    bench_scc_single_cycle,
    bench_loop_identification,
    bench_path_enumeration
);
criterion_main!(benches);
