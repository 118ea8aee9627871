//! Bounded lazy enumeration of simple paths.
//!
//! This module provides [`PathEnumerator`], a lazy iterator over all simple paths
//! from a set of source nodes to a set of target nodes. The search is a depth-first
//! walk over outgoing edge lists with a per-path visited set, so paths through shared
//! nodes reached from different branches are all found, while no individual path ever
//! repeats a node — even on cyclic graphs.
//!
//! # Boundedness
//!
//! Simple-path counts blow up combinatorially, so every enumeration carries
//! [`PathBounds`]: a maximum number of emitted paths and a maximum path depth (in
//! edges). Hitting either bound stops the search and raises the enumerator's
//! [`truncated`](PathEnumerator::truncated) flag; a fully explored search space
//! leaves the flag unset. Truncation is a property of the result, not an error.
//!
//! # Determinism
//!
//! Sources are processed in ascending order and edges in adjacency order, so repeated
//! enumerations over the same graph and bounds yield the same path sequence. Parallel
//! edges produce distinct paths. Constructing a new enumerator with the same inputs
//! restarts the identical sequence.

use std::collections::BTreeSet;

use crate::graph::algorithms::CancellationToken;
use crate::graph::{DirectedGraph, EdgeId, GraphBase, NodeId};
use crate::Result;

/// Bounds for a path enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathBounds {
    /// Maximum number of paths to emit.
    pub max_paths: usize,
    /// Maximum path length, counted in edges.
    pub max_depth: usize,
}

impl PathBounds {
    /// Creates bounds with the given limits.
    #[must_use]
    pub fn new(max_paths: usize, max_depth: usize) -> Self {
        PathBounds {
            max_paths,
            max_depth,
        }
    }

    /// Creates effectively unlimited bounds.
    ///
    /// Only reasonable for graphs known to be small; simple-path counts grow
    /// exponentially with graph size.
    #[must_use]
    pub fn unbounded() -> Self {
        PathBounds {
            max_paths: usize::MAX,
            max_depth: usize::MAX,
        }
    }
}

impl Default for PathBounds {
    fn default() -> Self {
        PathBounds::unbounded()
    }
}

/// A simple path: a walk from a source to a target that visits each node at most once.
///
/// Stores both the node sequence and the edge sequence realizing it; on multigraphs
/// the edges disambiguate which of several parallel edges the path took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    nodes: Vec<NodeId>,
    edges: Vec<EdgeId>,
}

impl Path {
    /// Returns the nodes of the path in walk order (always non-empty).
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Returns the edges of the path in walk order (one fewer than nodes).
    #[must_use]
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    /// Returns the first node of the path.
    #[must_use]
    pub fn source(&self) -> NodeId {
        self.nodes[0]
    }

    /// Returns the last node of the path.
    #[must_use]
    pub fn target(&self) -> NodeId {
        self.nodes[self.nodes.len() - 1]
    }

    /// Returns the path length in edges. A source that is itself a target yields a
    /// zero-length path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` if the path has no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Returns `true` if the path visits `node`.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }
}

struct Frame {
    node: NodeId,
    out: Vec<EdgeId>,
    next: usize,
}

/// Lazy iterator over simple paths; see the module docs for semantics.
///
/// Drive it like any iterator, then ask [`truncated`](PathEnumerator::truncated)
/// whether the emitted sequence is exhaustive:
///
/// ```rust,ignore
/// let mut paths = enumerate_paths(&graph, &[entry], &[exit], PathBounds::new(100, 64))?;
/// let found: Vec<Path> = paths.by_ref().collect();
/// if paths.truncated() {
///     // more paths exist beyond the bounds
/// }
/// # Ok::<(), flowscope::Error>(())
/// ```
pub struct PathEnumerator<'g, N, E> {
    graph: &'g DirectedGraph<N, E>,
    targets: BTreeSet<NodeId>,
    bounds: PathBounds,
    token: CancellationToken,
    sources: Vec<NodeId>,
    next_source: usize,
    stack: Vec<Frame>,
    on_path: Vec<bool>,
    current_nodes: Vec<NodeId>,
    current_edges: Vec<EdgeId>,
    emitted: usize,
    truncated: bool,
    finished: bool,
}

impl<'g, N, E> PathEnumerator<'g, N, E> {
    fn new(
        graph: &'g DirectedGraph<N, E>,
        sources: &[NodeId],
        targets: &[NodeId],
        bounds: PathBounds,
        token: CancellationToken,
    ) -> Result<Self> {
        for &node in sources.iter().chain(targets) {
            if !graph.contains_node(node) {
                return Err(crate::Error::GraphError(format!(
                    "path endpoint {node} is not in the graph"
                )));
            }
        }

        let mut sources: Vec<NodeId> = sources.to_vec();
        sources.sort_unstable();
        sources.dedup();

        Ok(PathEnumerator {
            graph,
            targets: targets.iter().copied().collect(),
            bounds,
            token,
            sources,
            next_source: 0,
            stack: Vec::new(),
            on_path: vec![false; graph.node_bound()],
            current_nodes: Vec::new(),
            current_edges: Vec::new(),
            emitted: 0,
            truncated: false,
            finished: false,
        })
    }

    /// Returns `true` if the enumeration was cut short by its bounds.
    ///
    /// Only meaningful once the iterator has been driven to completion; while paths
    /// are still pending the flag may not have settled.
    #[must_use]
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Returns the number of paths emitted so far.
    #[must_use]
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    fn push(&mut self, node: NodeId, via: Option<EdgeId>) {
        self.on_path[node.index()] = true;
        self.current_nodes.push(node);
        if let Some(edge) = via {
            self.current_edges.push(edge);
        }
        self.stack.push(Frame {
            node,
            out: self.graph.outgoing_edges(node).collect(),
            next: 0,
        });
    }

    fn pop(&mut self) {
        if let Some(frame) = self.stack.pop() {
            self.on_path[frame.node.index()] = false;
            self.current_nodes.pop();
            // the root of the walk carries no incoming edge
            if !self.stack.is_empty() {
                self.current_edges.pop();
            }
        }
    }

    /// Emits the current path, or ends the enumeration if the count bound is already
    /// exhausted (in which case more paths provably exist).
    fn emit(&mut self) -> Option<Path> {
        if self.emitted >= self.bounds.max_paths {
            self.truncated = true;
            self.finished = true;
            return None;
        }
        self.emitted += 1;
        Some(Path {
            nodes: self.current_nodes.clone(),
            edges: self.current_edges.clone(),
        })
    }
}

impl<N, E> Iterator for PathEnumerator<'_, N, E> {
    type Item = Path;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            if self.token.is_cancelled() {
                // cancellation of a lazy sequence reads as truncation
                self.truncated = true;
                self.finished = true;
                return None;
            }

            if self.stack.is_empty() {
                let Some(&source) = self.sources.get(self.next_source) else {
                    self.finished = true;
                    return None;
                };
                self.next_source += 1;
                self.push(source, None);
                if self.targets.contains(&source) {
                    match self.emit() {
                        Some(path) => return Some(path),
                        None => return None,
                    }
                }
                continue;
            }

            let Some(frame) = self.stack.last_mut() else {
                continue;
            };

            if frame.next >= frame.out.len() {
                self.pop();
                continue;
            }

            let edge = frame.out[frame.next];
            frame.next += 1;

            let Some((_, dst)) = self.graph.edge_endpoints(edge) else {
                continue;
            };
            if self.on_path[dst.index()] {
                continue; // revisiting would break simplicity
            }
            if self.current_edges.len() >= self.bounds.max_depth {
                self.truncated = true;
                continue;
            }

            self.push(dst, Some(edge));
            if self.targets.contains(&dst) {
                match self.emit() {
                    Some(path) => return Some(path),
                    None => return None,
                }
            }
        }
    }
}

/// Enumerates simple paths from any of `sources` to any of `targets`.
///
/// Equivalent to [`enumerate_paths_with`] with a token that never cancels.
///
/// # Errors
///
/// Returns [`Error::GraphError`](crate::Error::GraphError) if a source or target is
/// not a live node of the graph.
pub fn enumerate_paths<'g, N, E>(
    graph: &'g DirectedGraph<N, E>,
    sources: &[NodeId],
    targets: &[NodeId],
    bounds: PathBounds,
) -> Result<PathEnumerator<'g, N, E>> {
    PathEnumerator::new(graph, sources, targets, bounds, CancellationToken::new())
}

/// Enumerates simple paths, polling a cancellation token between steps.
///
/// A cancelled enumeration ends early with the truncation flag raised.
///
/// # Errors
///
/// Returns [`Error::GraphError`](crate::Error::GraphError) if a source or target is
/// not a live node of the graph.
pub fn enumerate_paths_with<'g, N, E>(
    graph: &'g DirectedGraph<N, E>,
    sources: &[NodeId],
    targets: &[NodeId],
    bounds: PathBounds,
    token: CancellationToken,
) -> Result<PathEnumerator<'g, N, E>> {
    PathEnumerator::new(graph, sources, targets, bounds, token)
}
