//! End-to-end pipeline: store -> sandbox -> flush -> snapshot -> analyses.
//!
//! Builds a small program in a backing store through an editing session, then runs
//! the whole analysis stack over the flushed result: normalization, dominance,
//! loops, SCCs, path enumeration, and ICFG construction.

use std::sync::Arc;

use flowscope::prelude::*;

/// Stages a function body in a fresh sandbox and flushes it:
///
/// ```text
/// entry -> header -> body -> header   (loop)
///          header -> exit
/// ```
fn seed_looping_function(store: &Arc<MemoryStore>) -> Vec<StoreNodeId> {
    let mut sandbox = Sandbox::new(Arc::clone(store));

    let entry = sandbox.create_node(Attrs::named("entry"));
    let header = sandbox.create_node(Attrs::named("header"));
    let body = sandbox.create_node(Attrs::named("body"));
    let exit = sandbox.create_node(Attrs::named("exit"));

    sandbox
        .create_edge(entry, header, EdgeRecord::control_flow())
        .unwrap();
    sandbox
        .create_edge(header, body, EdgeRecord::control_flow())
        .unwrap();
    sandbox
        .create_edge(body, header, EdgeRecord::control_flow())
        .unwrap();
    sandbox
        .create_edge(header, exit, EdgeRecord::control_flow())
        .unwrap();

    let report = sandbox.flush().unwrap();
    assert!(report.is_complete());
    assert!(!sandbox.is_dirty());

    [entry, header, body, exit]
        .into_iter()
        .map(|r| report.node_binding(r).unwrap())
        .collect()
}

#[test]
fn store_to_loop_analysis() {
    let store = Arc::new(MemoryStore::new());
    seed_looping_function(&store);

    // A fresh session sees the flushed graph
    let sandbox = Sandbox::new(Arc::clone(&store));
    assert_eq!(sandbox.node_count(), 4);
    assert_eq!(sandbox.edge_count(), 4);

    let snapshot = sandbox.snapshot();
    let normalized = normalize(snapshot.into_graph()).unwrap();
    assert!(!normalized.has_synthetic_entry());
    assert!(!normalized.has_synthetic_exit());

    let dominators = compute_dominators(&normalized).unwrap();
    let graph = normalized.graph();
    let by_name = |name: &str| -> NodeId {
        graph
            .nodes_matching(|_, attrs| attrs.get_str(keys::NAME) == Some(name))
            .next()
            .unwrap()
    };

    let header = by_name("header");
    let body = by_name("body");
    let exit = by_name("exit");
    assert!(dominators.dominates(header, body));
    assert!(dominators.dominates(header, exit));
    assert!(!dominators.dominates(body, exit));

    let loops = identify_loops(&normalized).unwrap();
    assert_eq!(loops.len(), 1);
    let l = &loops.loops()[0];
    assert_eq!(l.header(), header);
    assert!(l.contains(body));
    assert!(!l.contains(exit));
    assert_eq!(l.depth(), 1);

    let sccs = strongly_connected_components(normalized.graph()).unwrap();
    assert!(sccs.same_component(header, body));
    let non_trivial = sccs.non_trivial(normalized.graph());
    assert_eq!(non_trivial.len(), 1);
}

#[test]
fn sandbox_edits_stay_invisible_until_flush() {
    let store = Arc::new(MemoryStore::new());
    let ids = seed_looping_function(&store);
    let header = ids[1];

    let mut editor = Sandbox::new(Arc::clone(&store));
    let reader = Sandbox::new(Arc::clone(&store));

    let mut renamed = Attrs::named("rotated-header");
    renamed.set("visited", true);
    editor
        .set_node_attrs(SandboxNodeRef::Backing(header), renamed)
        .unwrap();

    // reader and store still see the original
    assert_eq!(
        reader
            .node_attrs(SandboxNodeRef::Backing(header))
            .unwrap()
            .get_str(keys::NAME),
        Some("header")
    );

    editor.flush().unwrap();
    assert_eq!(
        store.node_attrs(header).unwrap().get_str(keys::NAME),
        Some("rotated-header")
    );
    assert_eq!(store.node_attrs(header).unwrap().get_bool("visited"), Some(true));
}

#[test]
fn path_enumeration_over_flushed_graph() {
    let store = Arc::new(MemoryStore::new());
    seed_looping_function(&store);

    let sandbox = Sandbox::new(Arc::clone(&store));
    let snapshot = sandbox.snapshot();
    let graph = snapshot.graph();

    let by_name = |name: &str| -> NodeId {
        graph
            .nodes_matching(|_, attrs| attrs.get_str(keys::NAME) == Some(name))
            .next()
            .unwrap()
    };
    let entry = by_name("entry");
    let exit = by_name("exit");

    // the loop contributes no extra simple paths: entry -> header -> exit only
    let mut paths = enumerate_paths(graph, &[entry], &[exit], PathBounds::unbounded()).unwrap();
    let found: Vec<Path> = paths.by_ref().collect();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].nodes().len(), 3);
    assert!(!paths.truncated());
}

#[test]
fn icfg_over_two_functions() {
    // main: a -> call-site -> b ; callee "leaf": single block
    let mut main_cfg = ProgramGraph::new();
    let a = main_cfg.add_node(Attrs::named("a"));
    let mut call = Attrs::named("call-site");
    call.set(keys::CALLEE, "leaf");
    let site = main_cfg.add_node(call);
    let b = main_cfg.add_node(Attrs::named("b"));
    main_cfg.add_edge(a, site, EdgeRecord::control_flow()).unwrap();
    main_cfg.add_edge(site, b, EdgeRecord::control_flow()).unwrap();

    let mut leaf_cfg = ProgramGraph::new();
    leaf_cfg.add_node(Attrs::named("leaf0"));

    let functions = vec![
        FunctionCfg::new("main", main_cfg),
        FunctionCfg::new("leaf", leaf_cfg),
    ];
    let strategy = NameResolution::new(&functions);
    let icfg = build_icfg(&functions, &strategy).unwrap();

    // the stitched graph normalizes and the call site dominates the callee
    let normalized = normalize(icfg.graph().clone()).unwrap();
    let dominators = compute_dominators(&normalized).unwrap();

    let site_global = icfg.global_node(FunctionId::new(0), site).unwrap();
    let leaf_global = icfg
        .global_node(FunctionId::new(1), NodeId::new(0))
        .unwrap();
    assert!(dominators.dominates(site_global, leaf_global));
    assert!(icfg.unknown_callee().is_none());
}

#[test]
fn batch_normalization_in_parallel() {
    let make = |blocks: usize| -> ProgramGraph {
        let mut graph = ProgramGraph::new();
        let ids: Vec<NodeId> = (0..blocks)
            .map(|i| graph.add_node(Attrs::named(&format!("b{i}"))))
            .collect();
        for pair in ids.windows(2) {
            graph
                .add_edge(pair[0], pair[1], EdgeRecord::control_flow())
                .unwrap();
        }
        graph
    };

    let results = normalize_all((2..30).map(make).collect());
    assert_eq!(results.len(), 28);
    for result in results {
        let normalized = result.unwrap();
        assert!(!normalized.has_synthetic_entry());
    }
}
