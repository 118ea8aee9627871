//! Interprocedural control flow graph construction.
//!
//! An ICFG stitches the per-function control flow graphs of a program into one
//! graph by splicing call sites: the intraprocedural successor edges of a call
//! site are replaced by a `Call` edge into each resolved callee's entry nodes and
//! a `CallReturn` edge from each callee's exit nodes back to the former
//! successors. Each function is materialized exactly once, so recursion - direct
//! or mutual - simply produces edges back into already-present nodes.
//!
//! # Call Resolution
//!
//! Which callees a call site reaches is the business of a pluggable
//! [`CallResolutionStrategy`]. [`NameResolution`] matches the call site's
//! `callee` attribute against function names; [`FixedResolution`] serves a
//! precomputed table, which is how points-to or devirtualization results plug in.
//!
//! A call site whose resolution comes back empty is wired through the shared
//! synthetic unknown-callee node, so the graph never silently drops a call: the
//! call and return legs are both present, they just pass through a node marking
//! the callee as unknown.

use std::collections::BTreeMap;

use crate::graph::{keys, Attrs, EdgeKind, EdgeRecord, GraphBase, NodeId, ProgramGraph};
use crate::Result;

/// Identifier of a function within one ICFG construction.
///
/// Indexes into the function list handed to [`build_icfg`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionId(usize);

impl FunctionId {
    /// Creates a function identifier from its index in the function list.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        FunctionId(index)
    }

    /// Returns the index of this function in the function list.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for FunctionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// A function's control flow graph, as handed to [`build_icfg`].
///
/// Call sites are the nodes carrying a `callee` attribute. The graph need not be
/// normalized; entry and exit candidates are its zero-in-degree and
/// zero-out-degree nodes.
#[derive(Debug, Clone)]
pub struct FunctionCfg {
    name: String,
    cfg: ProgramGraph,
}

impl FunctionCfg {
    /// Wraps a function body under the given name.
    #[must_use]
    pub fn new(name: impl Into<String>, cfg: ProgramGraph) -> Self {
        FunctionCfg {
            name: name.into(),
            cfg,
        }
    }

    /// Returns the function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the function body.
    #[must_use]
    pub fn cfg(&self) -> &ProgramGraph {
        &self.cfg
    }

    /// Returns the call-site nodes of this function, ascending.
    #[must_use]
    pub fn call_sites(&self) -> Vec<NodeId> {
        self.cfg
            .nodes_matching(|_, attrs| attrs.contains(keys::CALLEE))
            .collect()
    }
}

/// Strategy deciding which functions a call site may reach.
pub trait CallResolutionStrategy {
    /// Resolves a call site to its possible callees.
    ///
    /// An empty result routes the call through the synthetic unknown-callee node.
    fn resolve(&self, caller: FunctionId, call_site: NodeId, attrs: &Attrs) -> Vec<FunctionId>;
}

/// Resolves call sites by matching their `callee` attribute against function
/// names. The standard strategy for direct calls.
pub struct NameResolution {
    by_name: BTreeMap<String, FunctionId>,
}

impl NameResolution {
    /// Builds the name table from the function list handed to [`build_icfg`].
    ///
    /// A duplicated name resolves to its first occurrence.
    #[must_use]
    pub fn new(functions: &[FunctionCfg]) -> Self {
        let mut by_name = BTreeMap::new();
        for (index, function) in functions.iter().enumerate() {
            by_name
                .entry(function.name().to_string())
                .or_insert(FunctionId::new(index));
        }
        NameResolution { by_name }
    }
}

impl CallResolutionStrategy for NameResolution {
    fn resolve(&self, _caller: FunctionId, _call_site: NodeId, attrs: &Attrs) -> Vec<FunctionId> {
        attrs
            .get_str(keys::CALLEE)
            .and_then(|name| self.by_name.get(name))
            .map(|&id| vec![id])
            .unwrap_or_default()
    }
}

/// Serves call resolutions from a precomputed table keyed by caller and call
/// site. Entries absent from the table resolve to nothing (unknown callee).
#[derive(Default)]
pub struct FixedResolution {
    table: BTreeMap<(FunctionId, NodeId), Vec<FunctionId>>,
}

impl FixedResolution {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        FixedResolution::default()
    }

    /// Records the callees of a call site.
    pub fn insert(&mut self, caller: FunctionId, call_site: NodeId, callees: Vec<FunctionId>) {
        self.table.insert((caller, call_site), callees);
    }
}

impl CallResolutionStrategy for FixedResolution {
    fn resolve(&self, caller: FunctionId, call_site: NodeId, _attrs: &Attrs) -> Vec<FunctionId> {
        self.table
            .get(&(caller, call_site))
            .cloned()
            .unwrap_or_default()
    }
}

/// An interprocedural control flow graph plus its construction bookkeeping.
#[derive(Debug, Clone)]
pub struct Icfg {
    graph: ProgramGraph,
    /// Per function: local node id -> global node id, dense by local index.
    node_maps: Vec<Vec<Option<NodeId>>>,
    unknown_callee: Option<NodeId>,
}

impl Icfg {
    /// Returns the stitched graph.
    #[must_use]
    pub fn graph(&self) -> &ProgramGraph {
        &self.graph
    }

    /// Consumes the ICFG, yielding the stitched graph.
    #[must_use]
    pub fn into_graph(self) -> ProgramGraph {
        self.graph
    }

    /// Translates a function-local node into the stitched graph.
    #[must_use]
    pub fn global_node(&self, function: FunctionId, local: NodeId) -> Option<NodeId> {
        self.node_maps
            .get(function.index())
            .and_then(|map| map.get(local.index()))
            .copied()
            .flatten()
    }

    /// Returns the shared unknown-callee node, if any call site needed one.
    #[must_use]
    pub fn unknown_callee(&self) -> Option<NodeId> {
        self.unknown_callee
    }

    /// Returns the number of functions materialized.
    #[must_use]
    pub fn function_count(&self) -> usize {
        self.node_maps.len()
    }
}

/// Stitches per-function control flow graphs into one interprocedural graph.
///
/// Every function is materialized once; call sites are then spliced per the
/// module docs, consulting `strategy` for callees.
///
/// # Errors
///
/// Returns [`Error::GraphError`](crate::Error::GraphError) if a strategy
/// resolves a call to a function index outside the function list.
pub fn build_icfg<S: CallResolutionStrategy>(
    functions: &[FunctionCfg],
    strategy: &S,
) -> Result<Icfg> {
    let mut graph = ProgramGraph::new();
    let mut node_maps: Vec<Vec<Option<NodeId>>> = Vec::with_capacity(functions.len());

    // Materialize every function body once, tagging nodes with their owner
    for function in functions {
        let cfg = function.cfg();
        let mut map: Vec<Option<NodeId>> = vec![None; cfg.node_bound()];
        for local in cfg.node_ids() {
            let Some(attrs) = cfg.node(local) else {
                continue;
            };
            let mut attrs = attrs.clone();
            attrs.set(keys::FUNCTION, function.name());
            map[local.index()] = Some(graph.add_node(attrs));
        }
        for edge_id in cfg.edge_ids() {
            let Some((src, dst)) = cfg.edge_endpoints(edge_id) else {
                continue;
            };
            let (Some(gsrc), Some(gdst)) = (map[src.index()], map[dst.index()]) else {
                continue;
            };
            let record = cfg.edge(edge_id).cloned().unwrap_or_default();
            graph.add_edge(gsrc, gdst, record)?;
        }
        node_maps.push(map);
    }

    let mut unknown_callee: Option<NodeId> = None;

    // Splice call sites
    for (index, function) in functions.iter().enumerate() {
        let caller = FunctionId::new(index);
        let cfg = function.cfg();

        for call_site in function.call_sites() {
            let Some(attrs) = cfg.node(call_site) else {
                continue;
            };
            let Some(global_site) = node_maps[caller.index()][call_site.index()] else {
                continue;
            };

            let callees = strategy.resolve(caller, call_site, attrs);
            for &callee in &callees {
                if callee.index() >= functions.len() {
                    return Err(crate::Error::GraphError(format!(
                        "call resolution produced out-of-range function {callee}"
                    )));
                }
            }

            // Former intraprocedural successors become return sites. Only
            // control-flow edges are replaced; call legs spliced onto this node
            // earlier (when it doubles as a callee exit) stay put.
            let outgoing: Vec<_> = graph.outgoing_edges(global_site).collect();
            let mut return_sites = Vec::new();
            for edge_id in outgoing {
                if graph.edge(edge_id).map(|r| r.kind) != Some(EdgeKind::ControlFlow) {
                    continue;
                }
                if let Some((_, dst)) = graph.edge_endpoints(edge_id) {
                    return_sites.push(dst);
                }
                graph.remove_edge(edge_id)?;
            }

            if callees.is_empty() {
                // Route through the shared unknown-callee node, both legs
                let unknown = match unknown_callee {
                    Some(node) => node,
                    None => {
                        let mut attrs = Attrs::named("unknown-callee");
                        attrs.set(keys::SYNTHETIC, true);
                        let node = graph.add_node(attrs);
                        unknown_callee = Some(node);
                        node
                    }
                };
                graph.add_edge(global_site, unknown, EdgeRecord::new(EdgeKind::Call))?;
                for &ret in &return_sites {
                    graph.add_edge(unknown, ret, EdgeRecord::new(EdgeKind::CallReturn))?;
                }
                continue;
            }

            for &callee in &callees {
                let callee_cfg = functions[callee.index()].cfg();
                for root in callee_cfg.entry_nodes() {
                    if let Some(entry) = node_maps[callee.index()][root.index()] {
                        graph.add_edge(global_site, entry, EdgeRecord::new(EdgeKind::Call))?;
                    }
                }
                for leaf in callee_cfg.exit_nodes() {
                    let Some(exit) = node_maps[callee.index()][leaf.index()] else {
                        continue;
                    };
                    for &ret in &return_sites {
                        graph.add_edge(exit, ret, EdgeRecord::new(EdgeKind::CallReturn))?;
                    }
                }
            }
        }
    }

    Ok(Icfg {
        graph,
        node_maps,
        unknown_callee,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphBase, Successors};

    /// Builds a function body: a chain of named blocks, with the node at
    /// `call_at` carrying a `callee` attribute.
    fn chain(name: &str, blocks: usize, call: Option<(usize, &str)>) -> FunctionCfg {
        let mut cfg = ProgramGraph::new();
        let ids: Vec<NodeId> = (0..blocks)
            .map(|i| {
                let mut attrs = Attrs::named(&format!("{name}{i}"));
                if let Some((at, callee)) = call {
                    if at == i {
                        attrs.set(keys::CALLEE, callee);
                    }
                }
                cfg.add_node(attrs)
            })
            .collect();
        for pair in ids.windows(2) {
            cfg.add_edge(pair[0], pair[1], EdgeRecord::control_flow())
                .unwrap();
        }
        FunctionCfg::new(name, cfg)
    }

    fn kinds_between(graph: &ProgramGraph, src: NodeId, dst: NodeId) -> Vec<EdgeKind> {
        graph
            .outgoing_edges(src)
            .filter_map(|e| {
                let (_, target) = graph.edge_endpoints(e)?;
                if target == dst {
                    graph.edge(e).map(|r| r.kind)
                } else {
                    None
                }
            })
            .collect()
    }

    #[test]
    fn test_direct_call_spliced() {
        // main: m0 -> m1(call g) -> m2 ; g: g0 -> g1
        let main = chain("m", 3, Some((1, "g")));
        let g = chain("g", 2, None);
        let functions = vec![main, g];
        let strategy = NameResolution::new(&functions);

        let icfg = build_icfg(&functions, &strategy).unwrap();
        let graph = icfg.graph();
        assert_eq!(graph.node_count(), 5);

        let main_id = FunctionId::new(0);
        let g_id = FunctionId::new(1);
        let site = icfg.global_node(main_id, NodeId::new(1)).unwrap();
        let ret = icfg.global_node(main_id, NodeId::new(2)).unwrap();
        let g_entry = icfg.global_node(g_id, NodeId::new(0)).unwrap();
        let g_exit = icfg.global_node(g_id, NodeId::new(1)).unwrap();

        // call leg in, return leg out, direct edge gone
        assert_eq!(kinds_between(graph, site, g_entry), vec![EdgeKind::Call]);
        assert_eq!(kinds_between(graph, g_exit, ret), vec![EdgeKind::CallReturn]);
        assert!(kinds_between(graph, site, ret).is_empty());
        assert!(icfg.unknown_callee().is_none());
    }

    #[test]
    fn test_unresolved_call_gets_unknown_node() {
        let main = chain("m", 3, Some((1, "mystery")));
        let functions = vec![main];
        let strategy = NameResolution::new(&functions);

        let icfg = build_icfg(&functions, &strategy).unwrap();
        let graph = icfg.graph();
        let unknown = icfg.unknown_callee().unwrap();

        assert!(graph.node(unknown).unwrap().is_synthetic());

        let site = icfg.global_node(FunctionId::new(0), NodeId::new(1)).unwrap();
        let ret = icfg.global_node(FunctionId::new(0), NodeId::new(2)).unwrap();
        assert_eq!(kinds_between(graph, site, unknown), vec![EdgeKind::Call]);
        assert_eq!(
            kinds_between(graph, unknown, ret),
            vec![EdgeKind::CallReturn]
        );
    }

    #[test]
    fn test_unknown_node_is_shared() {
        let f = chain("f", 3, Some((1, "ghost1")));
        let g = chain("g", 3, Some((1, "ghost2")));
        let functions = vec![f, g];
        let strategy = NameResolution::new(&functions);

        let icfg = build_icfg(&functions, &strategy).unwrap();
        let unknown = icfg.unknown_callee().unwrap();

        // both call sites feed the same node
        assert_eq!(
            icfg.graph()
                .incoming_edges(unknown)
                .count(),
            2
        );
    }

    #[test]
    fn test_recursion_allowed() {
        // f calls itself: f0 -> f1(call f) -> f2
        let f = chain("f", 3, Some((1, "f")));
        let functions = vec![f];
        let strategy = NameResolution::new(&functions);

        let icfg = build_icfg(&functions, &strategy).unwrap();
        let graph = icfg.graph();

        let site = icfg.global_node(FunctionId::new(0), NodeId::new(1)).unwrap();
        let entry = icfg.global_node(FunctionId::new(0), NodeId::new(0)).unwrap();
        assert_eq!(kinds_between(graph, site, entry), vec![EdgeKind::Call]);
        // function materialized exactly once
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn test_fixed_resolution_multiple_targets() {
        let main = chain("m", 3, Some((1, "virtual")));
        let a = chain("a", 2, None);
        let b = chain("b", 2, None);
        let functions = vec![main, a, b];

        let mut strategy = FixedResolution::new();
        strategy.insert(
            FunctionId::new(0),
            NodeId::new(1),
            vec![FunctionId::new(1), FunctionId::new(2)],
        );

        let icfg = build_icfg(&functions, &strategy).unwrap();
        let graph = icfg.graph();
        let site = icfg.global_node(FunctionId::new(0), NodeId::new(1)).unwrap();

        let call_targets: Vec<NodeId> = graph.successors(site).collect();
        assert_eq!(call_targets.len(), 2);
        assert!(call_targets.contains(&icfg.global_node(FunctionId::new(1), NodeId::new(0)).unwrap()));
        assert!(call_targets.contains(&icfg.global_node(FunctionId::new(2), NodeId::new(0)).unwrap()));
    }

    #[test]
    fn test_nodes_tagged_with_function() {
        let main = chain("m", 2, None);
        let functions = vec![main];
        let strategy = NameResolution::new(&functions);
        let icfg = build_icfg(&functions, &strategy).unwrap();

        let node = icfg.global_node(FunctionId::new(0), NodeId::new(0)).unwrap();
        assert_eq!(
            icfg.graph().node(node).unwrap().get_str(keys::FUNCTION),
            Some("m")
        );
    }

    #[test]
    fn test_out_of_range_resolution_rejected() {
        let main = chain("m", 3, Some((1, "x")));
        let functions = vec![main];
        let mut strategy = FixedResolution::new();
        strategy.insert(FunctionId::new(0), NodeId::new(1), vec![FunctionId::new(7)]);

        assert!(build_icfg(&functions, &strategy).is_err());
    }

    #[test]
    fn test_call_site_without_successor_has_no_return_leg() {
        // call in tail position: m0 -> m1(call g); g: g0
        let main = chain("m", 2, Some((1, "g")));
        let g = chain("g", 1, None);
        let functions = vec![main, g];
        let strategy = NameResolution::new(&functions);

        let icfg = build_icfg(&functions, &strategy).unwrap();
        let graph = icfg.graph();
        let g_exit = icfg.global_node(FunctionId::new(1), NodeId::new(0)).unwrap();
        assert_eq!(graph.out_degree(g_exit), 0);
    }

    #[test]
    fn test_deterministic() {
        let main = chain("m", 3, Some((1, "g")));
        let g = chain("g", 2, None);
        let functions = vec![main, g];
        let strategy = NameResolution::new(&functions);

        let first = build_icfg(&functions, &strategy).unwrap();
        let second = build_icfg(&functions, &strategy).unwrap();
        assert_eq!(first.graph(), second.graph());
    }
}
