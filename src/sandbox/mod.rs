//! Copy-on-write editing sessions over a backing store.
//!
//! A [`Sandbox`] stages graph edits against a [`GraphStore`](crate::store::GraphStore)
//! without touching it: created elements exist only in the session, attribute edits
//! shadow the backing copies, and removals hide backing elements from the merged
//! view. The store sees nothing until [`Sandbox::flush`] pushes the staged changes
//! through a [`FlushProvider`].
//!
//! # Element Identity
//!
//! Elements staged in a session are addressed by [`SandboxNodeRef`] /
//! [`SandboxEdgeRef`]: either a `Backing` reference to a store element, or a
//! `Minted` reference to an element created in this session. Minted elements have
//! no store identity until flush admits them - the [`FlushReport`] carries the
//! minted-to-store rebinding.
//!
//! # Merged View
//!
//! Every query answers from the merged view: backing elements minus staged
//! removals, with staged attribute overrides applied, plus minted elements.
//! [`Sandbox::snapshot`] materializes that view as a
//! [`ProgramGraph`](crate::graph::ProgramGraph) for running algorithms.
//!
//! # Isolation
//!
//! Two sandboxes over the same store never observe each other's staged changes;
//! only a flush makes changes visible, and then to every later reader.

mod flush;

pub use flush::{DefaultFlushProvider, FlushElement, FlushFailure, FlushProvider, FlushReport};

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use bitflags::bitflags;

use crate::graph::{Attrs, EdgeRecord, NodeId, ProgramGraph};
use crate::store::{GraphStore, StoreEdgeId, StoreNodeId};
use crate::Result;

/// Reference to a node visible in a sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SandboxNodeRef {
    /// A node that exists in the backing store.
    Backing(StoreNodeId),
    /// A node created in this session, not yet admitted by the store.
    Minted(u64),
}

impl std::fmt::Display for SandboxNodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SandboxNodeRef::Backing(id) => write!(f, "{id}"),
            SandboxNodeRef::Minted(mint) => write!(f, "minted-n{mint}"),
        }
    }
}

/// Reference to an edge visible in a sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SandboxEdgeRef {
    /// An edge that exists in the backing store.
    Backing(StoreEdgeId),
    /// An edge created in this session, not yet admitted by the store.
    Minted(u64),
}

impl std::fmt::Display for SandboxEdgeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SandboxEdgeRef::Backing(id) => write!(f, "{id}"),
            SandboxEdgeRef::Minted(mint) => write!(f, "minted-e{mint}"),
        }
    }
}

bitflags! {
    /// Staged state of an element touched by a session.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ElementState: u8 {
        /// Created in this session; unknown to the store.
        const MINTED = 1 << 0;
        /// Backing element whose payload was edited in this session.
        const DIRTY = 1 << 1;
        /// Hidden from the merged view; removal pending at flush.
        const REMOVED = 1 << 2;
    }
}

/// An edge as the merged view presents it: sandbox endpoints plus payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxEdge {
    /// Source node of the edge.
    pub source: SandboxNodeRef,
    /// Target node of the edge.
    pub target: SandboxNodeRef,
    /// Kind and attributes of the edge.
    pub record: EdgeRecord,
}

/// A materialized merged view: the graph plus the ref-to-id correspondence.
#[derive(Debug, Clone)]
pub struct Snapshot {
    graph: ProgramGraph,
    node_index: BTreeMap<SandboxNodeRef, NodeId>,
    node_refs: Vec<SandboxNodeRef>,
}

impl Snapshot {
    /// Returns the materialized graph.
    #[must_use]
    pub fn graph(&self) -> &ProgramGraph {
        &self.graph
    }

    /// Consumes the snapshot, yielding the graph.
    #[must_use]
    pub fn into_graph(self) -> ProgramGraph {
        self.graph
    }

    /// Returns the graph node corresponding to a sandbox reference.
    #[must_use]
    pub fn node_id(&self, node: SandboxNodeRef) -> Option<NodeId> {
        self.node_index.get(&node).copied()
    }

    /// Returns the sandbox reference behind a graph node.
    #[must_use]
    pub fn node_ref(&self, node: NodeId) -> Option<SandboxNodeRef> {
        self.node_refs.get(node.index()).copied()
    }
}

struct MintedEdge {
    source: SandboxNodeRef,
    target: SandboxNodeRef,
    record: EdgeRecord,
}

/// A copy-on-write editing session; see the module docs for semantics.
pub struct Sandbox<S: GraphStore> {
    store: Arc<S>,
    minted_nodes: BTreeMap<u64, Attrs>,
    minted_edges: BTreeMap<u64, MintedEdge>,
    node_overrides: BTreeMap<StoreNodeId, Attrs>,
    edge_overrides: BTreeMap<StoreEdgeId, EdgeRecord>,
    removed_nodes: BTreeSet<StoreNodeId>,
    removed_edges: BTreeSet<StoreEdgeId>,
    next_mint: u64,
}

impl<S: GraphStore> Sandbox<S> {
    /// Opens a session over the given store.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Sandbox {
            store,
            minted_nodes: BTreeMap::new(),
            minted_edges: BTreeMap::new(),
            node_overrides: BTreeMap::new(),
            edge_overrides: BTreeMap::new(),
            removed_nodes: BTreeSet::new(),
            removed_edges: BTreeSet::new(),
            next_mint: 0,
        }
    }

    /// Returns the backing store of this session.
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Returns the staged state of a node, or `None` for untouched elements.
    #[must_use]
    pub fn node_state(&self, node: SandboxNodeRef) -> Option<ElementState> {
        match node {
            SandboxNodeRef::Minted(mint) => self
                .minted_nodes
                .contains_key(&mint)
                .then_some(ElementState::MINTED),
            SandboxNodeRef::Backing(id) => {
                let mut state = ElementState::empty();
                if self.node_overrides.contains_key(&id) {
                    state |= ElementState::DIRTY;
                }
                if self.removed_nodes.contains(&id) {
                    state |= ElementState::REMOVED;
                }
                (!state.is_empty()).then_some(state)
            }
        }
    }

    /// Returns the staged state of an edge, or `None` for untouched elements.
    #[must_use]
    pub fn edge_state(&self, edge: SandboxEdgeRef) -> Option<ElementState> {
        match edge {
            SandboxEdgeRef::Minted(mint) => self
                .minted_edges
                .contains_key(&mint)
                .then_some(ElementState::MINTED),
            SandboxEdgeRef::Backing(id) => {
                let mut state = ElementState::empty();
                if self.edge_overrides.contains_key(&id) {
                    state |= ElementState::DIRTY;
                }
                if self.removed_edges.contains(&id) {
                    state |= ElementState::REMOVED;
                }
                (!state.is_empty()).then_some(state)
            }
        }
    }

    /// Returns `true` if the session has staged changes awaiting flush.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !(self.minted_nodes.is_empty()
            && self.minted_edges.is_empty()
            && self.node_overrides.is_empty()
            && self.edge_overrides.is_empty()
            && self.removed_nodes.is_empty()
            && self.removed_edges.is_empty())
    }

    /// Returns `true` if the merged view contains the node.
    #[must_use]
    pub fn contains_node(&self, node: SandboxNodeRef) -> bool {
        match node {
            SandboxNodeRef::Minted(mint) => self.minted_nodes.contains_key(&mint),
            SandboxNodeRef::Backing(id) => {
                !self.removed_nodes.contains(&id) && self.store.contains_node(id)
            }
        }
    }

    /// Returns `true` if the merged view contains the edge.
    #[must_use]
    pub fn contains_edge(&self, edge: SandboxEdgeRef) -> bool {
        match edge {
            SandboxEdgeRef::Minted(mint) => self.minted_edges.contains_key(&mint),
            SandboxEdgeRef::Backing(id) => {
                !self.removed_edges.contains(&id) && self.store.contains_edge(id)
            }
        }
    }

    /// Returns every node of the merged view: backing nodes first (ascending),
    /// then minted nodes (in creation order).
    #[must_use]
    pub fn node_refs(&self) -> Vec<SandboxNodeRef> {
        let mut nodes: Vec<SandboxNodeRef> = self
            .store
            .node_ids()
            .into_iter()
            .filter(|id| !self.removed_nodes.contains(id))
            .map(SandboxNodeRef::Backing)
            .collect();
        nodes.extend(self.minted_nodes.keys().map(|&m| SandboxNodeRef::Minted(m)));
        nodes
    }

    /// Returns every edge of the merged view: backing edges first (ascending),
    /// then minted edges (in creation order).
    #[must_use]
    pub fn edge_refs(&self) -> Vec<SandboxEdgeRef> {
        let mut edges: Vec<SandboxEdgeRef> = self
            .store
            .edge_ids()
            .into_iter()
            .filter(|id| !self.removed_edges.contains(id))
            .map(SandboxEdgeRef::Backing)
            .collect();
        edges.extend(self.minted_edges.keys().map(|&m| SandboxEdgeRef::Minted(m)));
        edges
    }

    /// Returns the number of nodes in the merged view.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_refs().len()
    }

    /// Returns the number of edges in the merged view.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_refs().len()
    }

    /// Returns the attributes of a node as the merged view sees them.
    ///
    /// Overrides shadow backing copies; removed nodes answer `None`.
    #[must_use]
    pub fn node_attrs(&self, node: SandboxNodeRef) -> Option<Attrs> {
        match node {
            SandboxNodeRef::Minted(mint) => self.minted_nodes.get(&mint).cloned(),
            SandboxNodeRef::Backing(id) => {
                if self.removed_nodes.contains(&id) {
                    return None;
                }
                if let Some(attrs) = self.node_overrides.get(&id) {
                    return Some(attrs.clone());
                }
                self.store.node_attrs(id).map(|attrs| (*attrs).clone())
            }
        }
    }

    /// Returns an edge as the merged view sees it.
    #[must_use]
    pub fn edge(&self, edge: SandboxEdgeRef) -> Option<SandboxEdge> {
        match edge {
            SandboxEdgeRef::Minted(mint) => {
                self.minted_edges.get(&mint).map(|minted| SandboxEdge {
                    source: minted.source,
                    target: minted.target,
                    record: minted.record.clone(),
                })
            }
            SandboxEdgeRef::Backing(id) => {
                if self.removed_edges.contains(&id) {
                    return None;
                }
                let stored = self.store.edge(id)?;
                let record = self
                    .edge_overrides
                    .get(&id)
                    .cloned()
                    .unwrap_or_else(|| stored.record.clone());
                Some(SandboxEdge {
                    source: SandboxNodeRef::Backing(stored.source),
                    target: SandboxNodeRef::Backing(stored.target),
                    record,
                })
            }
        }
    }

    /// Returns the edges leaving a node in the merged view.
    #[must_use]
    pub fn outgoing(&self, node: SandboxNodeRef) -> Vec<SandboxEdgeRef> {
        let mut edges: Vec<SandboxEdgeRef> = match node {
            SandboxNodeRef::Backing(id) if !self.removed_nodes.contains(&id) => self
                .store
                .outgoing(id)
                .into_iter()
                .filter(|e| !self.removed_edges.contains(e))
                .map(SandboxEdgeRef::Backing)
                .collect(),
            _ => Vec::new(),
        };
        edges.extend(
            self.minted_edges
                .iter()
                .filter(|(_, e)| e.source == node)
                .map(|(&m, _)| SandboxEdgeRef::Minted(m)),
        );
        edges
    }

    /// Returns the edges entering a node in the merged view.
    #[must_use]
    pub fn incoming(&self, node: SandboxNodeRef) -> Vec<SandboxEdgeRef> {
        let mut edges: Vec<SandboxEdgeRef> = match node {
            SandboxNodeRef::Backing(id) if !self.removed_nodes.contains(&id) => self
                .store
                .incoming(id)
                .into_iter()
                .filter(|e| !self.removed_edges.contains(e))
                .map(SandboxEdgeRef::Backing)
                .collect(),
            _ => Vec::new(),
        };
        edges.extend(
            self.minted_edges
                .iter()
                .filter(|(_, e)| e.target == node)
                .map(|(&m, _)| SandboxEdgeRef::Minted(m)),
        );
        edges
    }

    /// Stages a new node. The reference stays `Minted` until a flush admits it.
    pub fn create_node(&mut self, attrs: Attrs) -> SandboxNodeRef {
        let mint = self.next_mint;
        self.next_mint += 1;
        self.minted_nodes.insert(mint, attrs);
        SandboxNodeRef::Minted(mint)
    }

    /// Stages a new edge between two nodes of the merged view.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleElement`](crate::Error::StaleElement) if either
    /// endpoint is absent from the merged view.
    pub fn create_edge(
        &mut self,
        source: SandboxNodeRef,
        target: SandboxNodeRef,
        record: EdgeRecord,
    ) -> Result<SandboxEdgeRef> {
        if !self.contains_node(source) {
            return Err(crate::Error::StaleElement(format!(
                "edge source {source} is not visible in this session"
            )));
        }
        if !self.contains_node(target) {
            return Err(crate::Error::StaleElement(format!(
                "edge target {target} is not visible in this session"
            )));
        }
        let mint = self.next_mint;
        self.next_mint += 1;
        self.minted_edges.insert(
            mint,
            MintedEdge {
                source,
                target,
                record,
            },
        );
        Ok(SandboxEdgeRef::Minted(mint))
    }

    /// Stages a wholesale attribute replacement for a node.
    ///
    /// For backing nodes this is the copy-on-write step: the backing copy stays
    /// untouched and the session shadows it until flush.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleElement`](crate::Error::StaleElement) if the node is
    /// absent from the merged view.
    pub fn set_node_attrs(&mut self, node: SandboxNodeRef, attrs: Attrs) -> Result<()> {
        if !self.contains_node(node) {
            return Err(crate::Error::StaleElement(format!(
                "node {node} is not visible in this session"
            )));
        }
        match node {
            SandboxNodeRef::Minted(mint) => {
                self.minted_nodes.insert(mint, attrs);
            }
            SandboxNodeRef::Backing(id) => {
                self.node_overrides.insert(id, attrs);
            }
        }
        Ok(())
    }

    /// Stages a wholesale payload replacement for an edge.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleElement`](crate::Error::StaleElement) if the edge is
    /// absent from the merged view.
    pub fn set_edge_record(&mut self, edge: SandboxEdgeRef, record: EdgeRecord) -> Result<()> {
        if !self.contains_edge(edge) {
            return Err(crate::Error::StaleElement(format!(
                "edge {edge} is not visible in this session"
            )));
        }
        match edge {
            SandboxEdgeRef::Minted(mint) => {
                if let Some(minted) = self.minted_edges.get_mut(&mint) {
                    minted.record = record;
                }
            }
            SandboxEdgeRef::Backing(id) => {
                self.edge_overrides.insert(id, record);
            }
        }
        Ok(())
    }

    /// Stages the removal of a node and every edge incident to it in the merged
    /// view.
    ///
    /// Minted elements vanish from the session outright; backing elements are
    /// hidden and their removal is pushed to the store at flush.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleElement`](crate::Error::StaleElement) if the node is
    /// absent from the merged view.
    pub fn remove_node(&mut self, node: SandboxNodeRef) -> Result<()> {
        if !self.contains_node(node) {
            return Err(crate::Error::StaleElement(format!(
                "node {node} is not visible in this session"
            )));
        }

        // Cascade over the merged view before hiding the node itself
        let incident: BTreeSet<SandboxEdgeRef> = self
            .outgoing(node)
            .into_iter()
            .chain(self.incoming(node))
            .collect();
        for edge in incident {
            self.remove_edge(edge)?;
        }

        match node {
            SandboxNodeRef::Minted(mint) => {
                self.minted_nodes.remove(&mint);
            }
            SandboxNodeRef::Backing(id) => {
                self.node_overrides.remove(&id);
                self.removed_nodes.insert(id);
            }
        }
        Ok(())
    }

    /// Stages the removal of an edge.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleElement`](crate::Error::StaleElement) if the edge is
    /// absent from the merged view.
    pub fn remove_edge(&mut self, edge: SandboxEdgeRef) -> Result<()> {
        if !self.contains_edge(edge) {
            return Err(crate::Error::StaleElement(format!(
                "edge {edge} is not visible in this session"
            )));
        }
        match edge {
            SandboxEdgeRef::Minted(mint) => {
                self.minted_edges.remove(&mint);
            }
            SandboxEdgeRef::Backing(id) => {
                self.edge_overrides.remove(&id);
                self.removed_edges.insert(id);
            }
        }
        Ok(())
    }

    /// Materializes the merged view as a [`ProgramGraph`].
    ///
    /// Node and edge insertion order is the merged-view order (backing ascending,
    /// then minted), so snapshots of the same session state are identical. Edges
    /// whose endpoints left the store mid-session are skipped.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let mut graph = ProgramGraph::new();
        let mut node_index = BTreeMap::new();
        let mut node_refs = Vec::new();

        for node in self.node_refs() {
            let Some(attrs) = self.node_attrs(node) else {
                continue;
            };
            let id = graph.add_node(attrs);
            node_index.insert(node, id);
            node_refs.push(node);
        }

        for edge_ref in self.edge_refs() {
            let Some(edge) = self.edge(edge_ref) else {
                continue;
            };
            let (Some(&src), Some(&dst)) =
                (node_index.get(&edge.source), node_index.get(&edge.target))
            else {
                continue;
            };
            // endpoints come from node_index, add_edge cannot fail on them
            let _ = graph.add_edge(src, dst, edge.record);
        }

        Snapshot {
            graph,
            node_index,
            node_refs,
        }
    }

    /// Flushes staged changes through the [`DefaultFlushProvider`].
    ///
    /// # Errors
    ///
    /// Fails only on wholesale flush breakdown; per-element trouble is reported
    /// in the [`FlushReport`] and the affected changes stay staged for a retry.
    pub fn flush(&mut self) -> Result<FlushReport> {
        DefaultFlushProvider.flush(self)
    }

    /// Flushes staged changes through a caller-supplied provider.
    ///
    /// # Errors
    ///
    /// Whatever the provider surfaces as a wholesale failure.
    pub fn flush_with<P: FlushProvider<S>>(&mut self, provider: &P) -> Result<FlushReport> {
        provider.flush(self)
    }
}
