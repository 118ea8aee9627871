//! Natural loop identification.
//!
//! A back edge is an edge `u -> v` whose target dominates its source; `v` is the
//! loop header. The natural loop of a back edge is the header plus every node that
//! reaches `u` without passing through `v`. Back edges sharing a header contribute
//! to one merged loop, so each header owns exactly one [`NaturalLoop`].
//!
//! Loops nest: a loop whose header lies in another loop's body is nested inside it.
//! Each loop carries its nesting depth (outermost is 1) and the index of its
//! innermost enclosing loop.
//!
//! # Irreducible Control Flow
//!
//! Cycles that no back edge explains - classic multi-entry loops - have no natural
//! loop. They are detected by comparing loop bodies against the non-trivial
//! strongly connected components: a cyclic node that no loop body covers makes the
//! graph irreducible, reported as
//! [`Error::Irreducible`](crate::Error::Irreducible) with the offending nodes.

use std::collections::{BTreeMap, BTreeSet};

use crate::graph::algorithms::{
    compute_dominators_with, strongly_connected_components_with, CancellationToken,
};
use crate::graph::{NodeId, RootedGraph};
use crate::Result;

/// A natural loop: a header and the merged bodies of its back edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaturalLoop {
    header: NodeId,
    body: BTreeSet<NodeId>,
    back_edge_sources: Vec<NodeId>,
    depth: usize,
    parent: Option<usize>,
}

impl NaturalLoop {
    /// Returns the loop header (the target of the back edges).
    #[must_use]
    pub fn header(&self) -> NodeId {
        self.header
    }

    /// Returns the loop body, header included, ascending.
    #[must_use]
    pub fn body(&self) -> &BTreeSet<NodeId> {
        &self.body
    }

    /// Returns the sources of the back edges into this header, ascending.
    #[must_use]
    pub fn back_edge_sources(&self) -> &[NodeId] {
        &self.back_edge_sources
    }

    /// Returns the nesting depth; an outermost loop has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the index of the innermost enclosing loop, if any.
    #[must_use]
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Returns `true` if the loop body contains `node`.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.body.contains(&node)
    }

    /// Returns the number of nodes in the body.
    #[must_use]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Returns `true` if the body is empty (never the case for a real loop).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// All natural loops of a graph, ordered by header id.
#[derive(Debug, Clone, Default)]
pub struct LoopForest {
    loops: Vec<NaturalLoop>,
}

impl LoopForest {
    /// Returns the loops, ordered by header id.
    #[must_use]
    pub fn loops(&self) -> &[NaturalLoop] {
        &self.loops
    }

    /// Returns the number of loops.
    #[must_use]
    pub fn len(&self) -> usize {
        self.loops.len()
    }

    /// Returns `true` if the graph has no loops.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    /// Returns the loop headed at `header`, if any.
    #[must_use]
    pub fn loop_at(&self, header: NodeId) -> Option<&NaturalLoop> {
        self.loops
            .binary_search_by_key(&header, NaturalLoop::header)
            .ok()
            .map(|i| &self.loops[i])
    }

    /// Returns the index of the innermost loop containing `node`, if any.
    #[must_use]
    pub fn innermost(&self, node: NodeId) -> Option<usize> {
        self.loops
            .iter()
            .enumerate()
            .filter(|(_, l)| l.contains(node))
            .max_by_key(|(_, l)| l.depth)
            .map(|(i, _)| i)
    }

    /// Returns the nesting depth of `node`: 0 outside any loop, otherwise the depth
    /// of its innermost loop.
    #[must_use]
    pub fn depth_of(&self, node: NodeId) -> usize {
        self.innermost(node)
            .map_or(0, |i| self.loops[i].depth)
    }
}

/// Identifies the natural loops of a rooted graph.
///
/// Equivalent to [`identify_loops_with`] with a token that never cancels.
///
/// # Errors
///
/// - [`Error::Disconnected`](crate::Error::Disconnected) if some node is
///   unreachable from the entry (dominance is undefined there)
/// - [`Error::Irreducible`](crate::Error::Irreducible) if the graph contains
///   cycles no natural loop explains
pub fn identify_loops<G: RootedGraph>(graph: &G) -> Result<LoopForest> {
    identify_loops_with(graph, &CancellationToken::new())
}

/// Identifies the natural loops of a rooted graph, polling a cancellation token.
///
/// # Errors
///
/// As [`identify_loops`], plus [`Error::Cancelled`](crate::Error::Cancelled) if
/// the token trips.
pub fn identify_loops_with<G: RootedGraph>(
    graph: &G,
    token: &CancellationToken,
) -> Result<LoopForest> {
    let dom = compute_dominators_with(graph, token)?;

    // Collect back edges, merged per header
    let mut back_edges: BTreeMap<NodeId, BTreeSet<NodeId>> = BTreeMap::new();
    for node in graph.node_ids() {
        if token.is_cancelled() {
            return Err(crate::Error::Cancelled);
        }
        for succ in graph.successors(node) {
            if dom.dominates(succ, node) {
                back_edges.entry(succ).or_default().insert(node);
            }
        }
    }

    // Grow each merged body backwards from the back-edge sources
    let mut loops: Vec<NaturalLoop> = Vec::with_capacity(back_edges.len());
    for (header, sources) in back_edges {
        let mut body: BTreeSet<NodeId> = BTreeSet::new();
        body.insert(header);
        let mut worklist: Vec<NodeId> = Vec::new();
        for &source in &sources {
            if body.insert(source) {
                worklist.push(source);
            }
        }
        while let Some(node) = worklist.pop() {
            for pred in graph.predecessors(node) {
                if body.insert(pred) {
                    worklist.push(pred);
                }
            }
        }
        loops.push(NaturalLoop {
            header,
            body,
            back_edge_sources: sources.into_iter().collect(),
            depth: 1,
            parent: None,
        });
    }

    // Any cyclic node outside every body witnesses irreducibility
    let sccs = strongly_connected_components_with(graph, token)?;
    let mut unexplained: Vec<NodeId> = Vec::new();
    for &component in &sccs.non_trivial(graph) {
        for &node in &sccs.components()[component] {
            if !loops.iter().any(|l| l.contains(node)) {
                unexplained.push(node);
            }
        }
    }
    if !unexplained.is_empty() {
        unexplained.sort_unstable();
        return Err(crate::Error::Irreducible { nodes: unexplained });
    }

    // Nesting: a loop is inside every loop whose body holds its header
    let enclosing: Vec<Vec<usize>> = loops
        .iter()
        .map(|inner| {
            loops
                .iter()
                .enumerate()
                .filter(|(_, outer)| {
                    outer.header != inner.header && outer.contains(inner.header)
                })
                .map(|(i, _)| i)
                .collect()
        })
        .collect();
    for (i, outer_indices) in enclosing.iter().enumerate() {
        loops[i].depth = outer_indices.len() + 1;
    }
    for (i, outer_indices) in enclosing.iter().enumerate() {
        loops[i].parent = outer_indices
            .iter()
            .copied()
            .max_by_key(|&j| loops[j].depth);
    }

    Ok(LoopForest { loops })
}
