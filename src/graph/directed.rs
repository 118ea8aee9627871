//! Mutable directed multigraph implementation.
//!
//! This module provides [`DirectedGraph`], the core graph container used throughout the
//! crate. It supports incremental construction *and* removal: removing a node detaches
//! every edge touching it in the same call, so the graph never holds a dangling edge.
//!
//! # Identifier Stability
//!
//! Nodes and edges live in slot vectors; removal leaves a tombstone behind and slot
//! indices are never reused. An id handed out once stays valid-or-dead forever, which
//! lets analyses cache ids across mutations without risk of aliasing.
//!
//! # Determinism
//!
//! All iteration (node ids, edge ids, adjacency) is in ascending id order. Analyses
//! built on top inherit reproducible results from this.

use crate::graph::{EdgeId, GraphBase, NodeId, Predecessors, Successors};
use crate::Result;

/// Internal edge representation storing endpoints and user data.
#[derive(Debug, Clone, PartialEq, Eq)]
struct EdgeData<E> {
    source: NodeId,
    target: NodeId,
    data: E,
}

/// A mutable directed multigraph with typed node and edge payloads.
///
/// `DirectedGraph` stores nodes and edges in slot vectors indexed by [`NodeId`] /
/// [`EdgeId`] and keeps outgoing/incoming adjacency lists per node. Multiple edges
/// between the same pair of nodes are permitted.
///
/// Adding a node is idempotent in the sense that every call mints a fresh identity;
/// element identity is the id, not the payload. Removal is atomic: a node leaves
/// together with all of its incident edges.
///
/// # Examples
///
/// ```rust,ignore
/// use flowscope::graph::DirectedGraph;
///
/// let mut graph: DirectedGraph<&str, ()> = DirectedGraph::new();
/// let a = graph.add_node("A");
/// let b = graph.add_node("B");
/// let ab = graph.add_edge(a, b, ())?;
///
/// assert_eq!(graph.node_count(), 2);
/// graph.remove_node(b)?;
/// assert!(!graph.contains_edge(ab)); // cascade removed the edge
/// # Ok::<(), flowscope::Error>(())
/// ```
///
/// # Thread Safety
///
/// `DirectedGraph` is [`Send`] and [`Sync`] when `N` and `E` are; shared references
/// allow concurrent read-only analysis.
///
/// Equality compares the full slot history (tombstones included), so two graphs are
/// equal only when built by the same sequence of mutations. Deterministic algorithms
/// rely on this to assert reproducible construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectedGraph<N, E> {
    nodes: Vec<Option<N>>,
    edges: Vec<Option<EdgeData<E>>>,
    outgoing: Vec<Vec<EdgeId>>,
    incoming: Vec<Vec<EdgeId>>,
    live_nodes: usize,
    live_edges: usize,
}

impl<N, E> Default for DirectedGraph<N, E> {
    fn default() -> Self {
        DirectedGraph::new()
    }
}

impl<N, E> DirectedGraph<N, E> {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        DirectedGraph {
            nodes: Vec::new(),
            edges: Vec::new(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
            live_nodes: 0,
            live_edges: 0,
        }
    }

    /// Creates an empty graph with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        DirectedGraph {
            nodes: Vec::with_capacity(nodes),
            edges: Vec::with_capacity(edges),
            outgoing: Vec::with_capacity(nodes),
            incoming: Vec::with_capacity(nodes),
            live_nodes: 0,
            live_edges: 0,
        }
    }

    /// Adds a node with the given payload and returns its fresh identifier.
    pub fn add_node(&mut self, data: N) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(data));
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        self.live_nodes += 1;
        id
    }

    /// Adds a directed edge from `source` to `target` carrying `data`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphError`](crate::Error::GraphError) if either endpoint is
    /// not a live node of this graph.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId, data: E) -> Result<EdgeId> {
        if !self.contains_node(source) {
            return Err(crate::Error::GraphError(format!(
                "edge source {source} is not in the graph"
            )));
        }
        if !self.contains_node(target) {
            return Err(crate::Error::GraphError(format!(
                "edge target {target} is not in the graph"
            )));
        }

        let id = EdgeId(self.edges.len());
        self.edges.push(Some(EdgeData {
            source,
            target,
            data,
        }));
        self.outgoing[source.index()].push(id);
        self.incoming[target.index()].push(id);
        self.live_edges += 1;
        Ok(id)
    }

    /// Removes a node and all edges touching it, returning the node payload.
    ///
    /// The cascade is atomic: after this call returns no edge references the removed
    /// node. The node's id is retired and never reused.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphError`](crate::Error::GraphError) if the node is not live.
    pub fn remove_node(&mut self, node: NodeId) -> Result<N> {
        if !self.contains_node(node) {
            return Err(crate::Error::GraphError(format!(
                "cannot remove {node}: not in the graph"
            )));
        }

        let mut incident: Vec<EdgeId> = self.outgoing[node.index()].clone();
        incident.extend_from_slice(&self.incoming[node.index()]);
        incident.sort_unstable();
        incident.dedup(); // self-loops appear in both lists
        for edge in incident {
            self.remove_edge(edge)?;
        }

        let data = self.nodes[node.index()]
            .take()
            .ok_or_else(|| malformed_error!("node {} vanished during cascade", node))?;
        self.live_nodes -= 1;
        Ok(data)
    }

    /// Removes an edge, returning its payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphError`](crate::Error::GraphError) if the edge is not live.
    pub fn remove_edge(&mut self, edge: EdgeId) -> Result<E> {
        let slot = self
            .edges
            .get_mut(edge.index())
            .and_then(Option::take)
            .ok_or_else(|| {
                crate::Error::GraphError(format!("cannot remove {edge}: not in the graph"))
            })?;
        self.outgoing[slot.source.index()].retain(|&e| e != edge);
        self.incoming[slot.target.index()].retain(|&e| e != edge);
        self.live_edges -= 1;
        Ok(slot.data)
    }

    /// Returns a reference to a node's payload, or `None` if it is not live.
    #[must_use]
    pub fn node(&self, node: NodeId) -> Option<&N> {
        self.nodes.get(node.index()).and_then(Option::as_ref)
    }

    /// Returns a mutable reference to a node's payload, or `None` if it is not live.
    pub fn node_mut(&mut self, node: NodeId) -> Option<&mut N> {
        self.nodes.get_mut(node.index()).and_then(Option::as_mut)
    }

    /// Returns a reference to an edge's payload, or `None` if it is not live.
    #[must_use]
    pub fn edge(&self, edge: EdgeId) -> Option<&E> {
        self.edges
            .get(edge.index())
            .and_then(Option::as_ref)
            .map(|e| &e.data)
    }

    /// Returns a mutable reference to an edge's payload, or `None` if it is not live.
    pub fn edge_mut(&mut self, edge: EdgeId) -> Option<&mut E> {
        self.edges
            .get_mut(edge.index())
            .and_then(Option::as_mut)
            .map(|e| &mut e.data)
    }

    /// Returns the `(source, target)` endpoints of an edge, or `None` if it is not live.
    #[must_use]
    pub fn edge_endpoints(&self, edge: EdgeId) -> Option<(NodeId, NodeId)> {
        self.edges
            .get(edge.index())
            .and_then(Option::as_ref)
            .map(|e| (e.source, e.target))
    }

    /// Returns `true` if `node` is a live node of this graph.
    #[must_use]
    pub fn contains_node(&self, node: NodeId) -> bool {
        matches!(self.nodes.get(node.index()), Some(Some(_)))
    }

    /// Returns `true` if `edge` is a live edge of this graph.
    #[must_use]
    pub fn contains_edge(&self, edge: EdgeId) -> bool {
        matches!(self.edges.get(edge.index()), Some(Some(_)))
    }

    /// Returns the number of live edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.live_edges
    }

    /// Returns an exclusive upper bound on edge indices (tombstones included).
    #[must_use]
    pub fn edge_bound(&self) -> usize {
        self.edges.len()
    }

    /// Returns an iterator over all live edge identifiers, in ascending order.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| EdgeId(index))
    }

    /// Returns an iterator over the identifiers of edges leaving `node`.
    pub fn outgoing_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.outgoing.get(node.index()).into_iter().flatten().copied()
    }

    /// Returns an iterator over the identifiers of edges entering `node`.
    pub fn incoming_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.incoming.get(node.index()).into_iter().flatten().copied()
    }

    /// Returns the number of edges entering `node`.
    #[must_use]
    pub fn in_degree(&self, node: NodeId) -> usize {
        self.incoming.get(node.index()).map_or(0, Vec::len)
    }

    /// Returns the number of edges leaving `node`.
    #[must_use]
    pub fn out_degree(&self, node: NodeId) -> usize {
        self.outgoing.get(node.index()).map_or(0, Vec::len)
    }

    /// Returns all live nodes with no incoming edges, in ascending order.
    #[must_use]
    pub fn entry_nodes(&self) -> Vec<NodeId> {
        self.node_ids_impl()
            .filter(|&n| self.in_degree(n) == 0)
            .collect()
    }

    /// Returns all live nodes with no outgoing edges, in ascending order.
    #[must_use]
    pub fn exit_nodes(&self) -> Vec<NodeId> {
        self.node_ids_impl()
            .filter(|&n| self.out_degree(n) == 0)
            .collect()
    }

    /// Returns the live nodes whose `(id, payload)` satisfies the predicate.
    pub fn nodes_matching<'a, F>(&'a self, mut predicate: F) -> impl Iterator<Item = NodeId> + 'a
    where
        F: FnMut(NodeId, &N) -> bool + 'a,
    {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(move |(index, slot)| match slot {
                Some(data) if predicate(NodeId(index), data) => Some(NodeId(index)),
                _ => None,
            })
    }

    /// Returns the live edges whose `(id, endpoints, payload)` satisfies the predicate.
    pub fn edges_matching<'a, F>(&'a self, mut predicate: F) -> impl Iterator<Item = EdgeId> + 'a
    where
        F: FnMut(EdgeId, (NodeId, NodeId), &E) -> bool + 'a,
    {
        self.edges
            .iter()
            .enumerate()
            .filter_map(move |(index, slot)| match slot {
                Some(e) if predicate(EdgeId(index), (e.source, e.target), &e.data) => {
                    Some(EdgeId(index))
                }
                _ => None,
            })
    }

    /// Returns `true` if the graph has no live nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live_nodes == 0
    }

    fn node_ids_impl(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| NodeId(index))
    }
}

impl<N, E> GraphBase for DirectedGraph<N, E> {
    fn node_count(&self) -> usize {
        self.live_nodes
    }

    fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        self.node_ids_impl()
    }

    fn node_bound(&self) -> usize {
        self.nodes.len()
    }
}

impl<N, E> Successors for DirectedGraph<N, E> {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.outgoing_edges(node)
            .filter_map(|e| self.edge_endpoints(e).map(|(_, target)| target))
    }
}

impl<N, E> Predecessors for DirectedGraph<N, E> {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.incoming_edges(node)
            .filter_map(|e| self.edge_endpoints(e).map(|(source, _)| source))
    }
}
