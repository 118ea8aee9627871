//! Backing stores for program graphs.
//!
//! A [`GraphStore`] is the durable home of a program graph: nodes and edges live
//! here under stable store-assigned identifiers, and editing sessions
//! ([`Sandbox`](crate::sandbox::Sandbox)) stage changes against it before flushing.
//! The store is the authority on element identity - a sandbox never invents a
//! [`StoreNodeId`], it receives one when the store admits a created node during
//! flush.
//!
//! # Components
//!
//! - [`GraphStore`] - The storage abstraction sandboxes and flush providers target
//! - [`MemoryStore`] - In-memory reference implementation
//! - [`StoreNodeId`] / [`StoreEdgeId`] - Store-scoped element identifiers
//! - [`StoreEdge`] - An edge as the store records it (endpoints plus payload)
//!
//! # Thread Safety
//!
//! [`MemoryStore`] takes `&self` for every operation, including mutations:
//! primary storage sits in lock-free skip lists, adjacency indices in concurrent
//! hash maps, and identifier generation in atomic counters. Multiple readers and
//! writers can work the store concurrently without external locking.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;

use crate::graph::{Attrs, EdgeRecord};
use crate::Result;

/// Identifier of a node inside a [`GraphStore`].
///
/// Assigned by the store on creation, never reused after removal. Distinct from
/// [`NodeId`](crate::graph::NodeId), which identifies nodes of an in-memory
/// [`DirectedGraph`](crate::graph::DirectedGraph) snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StoreNodeId(u64);

impl StoreNodeId {
    /// Creates a node identifier from its raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        StoreNodeId(raw)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for StoreNodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "N{}", self.0)
    }
}

/// Identifier of an edge inside a [`GraphStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StoreEdgeId(u64);

impl StoreEdgeId {
    /// Creates an edge identifier from its raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        StoreEdgeId(raw)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for StoreEdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// An edge as recorded by a store: its endpoints and its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEdge {
    /// Source node of the edge.
    pub source: StoreNodeId,
    /// Target node of the edge.
    pub target: StoreNodeId,
    /// Kind and attributes of the edge.
    pub record: EdgeRecord,
}

/// The storage abstraction behind editing sessions.
///
/// Implementations own element identity and the durable copy of the graph.
/// Mutating methods take `&self`; implementations provide their own interior
/// synchronization (see [`MemoryStore`]).
///
/// # Errors
///
/// Operations addressing an element the store does not hold fail with
/// [`Error::StaleElement`](crate::Error::StaleElement). A sandbox holding ids
/// from before a concurrent removal observes exactly this error at flush time.
pub trait GraphStore: Send + Sync {
    /// Returns all node identifiers, ascending.
    fn node_ids(&self) -> Vec<StoreNodeId>;

    /// Returns all edge identifiers, ascending.
    fn edge_ids(&self) -> Vec<StoreEdgeId>;

    /// Returns the attributes of a node, if present.
    fn node_attrs(&self, node: StoreNodeId) -> Option<Arc<Attrs>>;

    /// Returns an edge, if present.
    fn edge(&self, edge: StoreEdgeId) -> Option<Arc<StoreEdge>>;

    /// Returns `true` if the store holds the node.
    fn contains_node(&self, node: StoreNodeId) -> bool;

    /// Returns `true` if the store holds the edge.
    fn contains_edge(&self, edge: StoreEdgeId) -> bool;

    /// Returns the edges leaving a node, ascending by edge id.
    fn outgoing(&self, node: StoreNodeId) -> Vec<StoreEdgeId>;

    /// Returns the edges entering a node, ascending by edge id.
    fn incoming(&self, node: StoreNodeId) -> Vec<StoreEdgeId>;

    /// Admits a new node and returns its store-assigned identifier.
    ///
    /// # Errors
    ///
    /// Implementation-specific; [`MemoryStore`] cannot fail here.
    fn create_node(&self, attrs: Attrs) -> Result<StoreNodeId>;

    /// Admits a new edge between two existing nodes.
    ///
    /// # Errors
    ///
    /// [`Error::StaleElement`](crate::Error::StaleElement) if either endpoint is
    /// not in the store.
    fn create_edge(
        &self,
        source: StoreNodeId,
        target: StoreNodeId,
        record: EdgeRecord,
    ) -> Result<StoreEdgeId>;

    /// Replaces the attributes of an existing node wholesale.
    ///
    /// # Errors
    ///
    /// [`Error::StaleElement`](crate::Error::StaleElement) if the node is not in
    /// the store.
    fn replace_node_attrs(&self, node: StoreNodeId, attrs: Attrs) -> Result<()>;

    /// Replaces the payload of an existing edge wholesale; endpoints are fixed.
    ///
    /// # Errors
    ///
    /// [`Error::StaleElement`](crate::Error::StaleElement) if the edge is not in
    /// the store.
    fn replace_edge_record(&self, edge: StoreEdgeId, record: EdgeRecord) -> Result<()>;

    /// Removes a node and every edge incident to it.
    ///
    /// # Errors
    ///
    /// [`Error::StaleElement`](crate::Error::StaleElement) if the node is not in
    /// the store.
    fn remove_node(&self, node: StoreNodeId) -> Result<()>;

    /// Removes an edge.
    ///
    /// # Errors
    ///
    /// [`Error::StaleElement`](crate::Error::StaleElement) if the edge is not in
    /// the store.
    fn remove_edge(&self, edge: StoreEdgeId) -> Result<()>;
}

/// In-memory [`GraphStore`].
///
/// Primary storage is a pair of lock-free skip lists keyed by element id;
/// adjacency is indexed per node in concurrent hash maps; identifiers come from
/// atomic counters and are never reused. This mirrors the layered design of a
/// registry: ordered primary storage, hash-indexed secondary lookups.
pub struct MemoryStore {
    /// Primary node storage, ordered by id.
    nodes: SkipMap<StoreNodeId, Arc<Attrs>>,
    /// Primary edge storage, ordered by id.
    edges: SkipMap<StoreEdgeId, Arc<StoreEdge>>,
    /// Secondary index: edges leaving each node.
    outgoing: DashMap<StoreNodeId, Vec<StoreEdgeId>>,
    /// Secondary index: edges entering each node.
    incoming: DashMap<StoreNodeId, Vec<StoreEdgeId>>,
    next_node: AtomicU64,
    next_edge: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        MemoryStore {
            nodes: SkipMap::new(),
            edges: SkipMap::new(),
            outgoing: DashMap::new(),
            incoming: DashMap::new(),
            next_node: AtomicU64::new(0),
            next_edge: AtomicU64::new(0),
        }
    }

    /// Returns the number of nodes in the store.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges in the store.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn drop_from_index(index: &DashMap<StoreNodeId, Vec<StoreEdgeId>>, node: StoreNodeId, edge: StoreEdgeId) {
        if let Some(mut entry) = index.get_mut(&node) {
            entry.retain(|&e| e != edge);
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

impl GraphStore for MemoryStore {
    fn node_ids(&self) -> Vec<StoreNodeId> {
        self.nodes.iter().map(|entry| *entry.key()).collect()
    }

    fn edge_ids(&self) -> Vec<StoreEdgeId> {
        self.edges.iter().map(|entry| *entry.key()).collect()
    }

    fn node_attrs(&self, node: StoreNodeId) -> Option<Arc<Attrs>> {
        self.nodes.get(&node).map(|entry| entry.value().clone())
    }

    fn edge(&self, edge: StoreEdgeId) -> Option<Arc<StoreEdge>> {
        self.edges.get(&edge).map(|entry| entry.value().clone())
    }

    fn contains_node(&self, node: StoreNodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    fn contains_edge(&self, edge: StoreEdgeId) -> bool {
        self.edges.contains_key(&edge)
    }

    fn outgoing(&self, node: StoreNodeId) -> Vec<StoreEdgeId> {
        let mut edges = self
            .outgoing
            .get(&node)
            .map(|entry| entry.clone())
            .unwrap_or_default();
        edges.sort_unstable();
        edges
    }

    fn incoming(&self, node: StoreNodeId) -> Vec<StoreEdgeId> {
        let mut edges = self
            .incoming
            .get(&node)
            .map(|entry| entry.clone())
            .unwrap_or_default();
        edges.sort_unstable();
        edges
    }

    fn create_node(&self, attrs: Attrs) -> Result<StoreNodeId> {
        let id = StoreNodeId(self.next_node.fetch_add(1, Ordering::Relaxed));
        self.nodes.insert(id, Arc::new(attrs));
        Ok(id)
    }

    fn create_edge(
        &self,
        source: StoreNodeId,
        target: StoreNodeId,
        record: EdgeRecord,
    ) -> Result<StoreEdgeId> {
        if !self.contains_node(source) {
            return Err(crate::Error::StaleElement(format!(
                "edge source {source} is not in the store"
            )));
        }
        if !self.contains_node(target) {
            return Err(crate::Error::StaleElement(format!(
                "edge target {target} is not in the store"
            )));
        }

        let id = StoreEdgeId(self.next_edge.fetch_add(1, Ordering::Relaxed));
        self.edges.insert(
            id,
            Arc::new(StoreEdge {
                source,
                target,
                record,
            }),
        );
        self.outgoing.entry(source).or_default().push(id);
        self.incoming.entry(target).or_default().push(id);
        Ok(id)
    }

    fn replace_node_attrs(&self, node: StoreNodeId, attrs: Attrs) -> Result<()> {
        if !self.contains_node(node) {
            return Err(crate::Error::StaleElement(format!(
                "node {node} is not in the store"
            )));
        }
        self.nodes.insert(node, Arc::new(attrs));
        Ok(())
    }

    fn replace_edge_record(&self, edge: StoreEdgeId, record: EdgeRecord) -> Result<()> {
        let Some(existing) = self.edge(edge) else {
            return Err(crate::Error::StaleElement(format!(
                "edge {edge} is not in the store"
            )));
        };
        self.edges.insert(
            edge,
            Arc::new(StoreEdge {
                source: existing.source,
                target: existing.target,
                record,
            }),
        );
        Ok(())
    }

    fn remove_node(&self, node: StoreNodeId) -> Result<()> {
        if self.nodes.remove(&node).is_none() {
            return Err(crate::Error::StaleElement(format!(
                "node {node} is not in the store"
            )));
        }

        // Cascade: drop every incident edge, then the adjacency rows themselves
        let mut incident: Vec<StoreEdgeId> = Vec::new();
        if let Some((_, edges)) = self.outgoing.remove(&node) {
            incident.extend(edges);
        }
        if let Some((_, edges)) = self.incoming.remove(&node) {
            incident.extend(edges);
        }
        incident.sort_unstable();
        incident.dedup(); // self-loops appear in both rows

        for edge_id in incident {
            if let Some(entry) = self.edges.remove(&edge_id) {
                let edge = entry.value();
                Self::drop_from_index(&self.outgoing, edge.source, edge_id);
                Self::drop_from_index(&self.incoming, edge.target, edge_id);
            }
        }
        Ok(())
    }

    fn remove_edge(&self, edge: StoreEdgeId) -> Result<()> {
        let Some(entry) = self.edges.remove(&edge) else {
            return Err(crate::Error::StaleElement(format!(
                "edge {edge} is not in the store"
            )));
        };
        let removed = entry.value();
        Self::drop_from_index(&self.outgoing, removed.source, edge);
        Self::drop_from_index(&self.incoming, removed.target, edge);
        Ok(())
    }
}
