//! Flushing staged sandbox changes into the backing store.
//!
//! A [`FlushProvider`] pushes a session's staged changes into its store and
//! reports what happened per element. The [`DefaultFlushProvider`] applies
//! changes in dependency order:
//!
//! 1. minted nodes - admitted first so the store assigns their identities
//! 2. minted edges - endpoints rebound from minted to store identities
//! 3. attribute overrides - nodes, then edges
//! 4. removals - edges before nodes, so node removal never races its own cascade
//!
//! A failing element never aborts the flush: the failure lands in the
//! [`FlushReport`] and the change stays staged in the session, so a later flush
//! retries exactly the leftovers. An edge whose endpoint node failed to flush is
//! itself reported as failed (a dependency failure) and retained. Flushing a
//! clean session is a no-op with an empty report.

use std::collections::BTreeMap;

use crate::graph::Attrs;
use crate::sandbox::{Sandbox, SandboxEdgeRef, SandboxNodeRef};
use crate::store::{GraphStore, StoreEdgeId, StoreNodeId};
use crate::Result;

/// The element a flush failure concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushElement {
    /// A node-level change failed.
    Node(SandboxNodeRef),
    /// An edge-level change failed.
    Edge(SandboxEdgeRef),
}

impl std::fmt::Display for FlushElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlushElement::Node(node) => write!(f, "node {node}"),
            FlushElement::Edge(edge) => write!(f, "edge {edge}"),
        }
    }
}

/// One element-level flush failure; the change stays staged for retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushFailure {
    /// The element whose staged change could not be applied.
    pub element: FlushElement,
    /// Why the store rejected it.
    pub reason: String,
}

/// Outcome of a flush: applied-change count, identity rebindings, and failures.
#[derive(Debug, Clone, Default)]
pub struct FlushReport {
    flushed: usize,
    node_bindings: BTreeMap<u64, StoreNodeId>,
    edge_bindings: BTreeMap<u64, StoreEdgeId>,
    failures: Vec<FlushFailure>,
}

impl FlushReport {
    /// Returns the number of staged changes the store accepted.
    #[must_use]
    pub fn flushed(&self) -> usize {
        self.flushed
    }

    /// Returns the element-level failures, in application order.
    #[must_use]
    pub fn failures(&self) -> &[FlushFailure] {
        &self.failures
    }

    /// Returns `true` if every staged change was applied.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns the store identity a minted node was bound to.
    #[must_use]
    pub fn node_binding(&self, node: SandboxNodeRef) -> Option<StoreNodeId> {
        match node {
            SandboxNodeRef::Minted(mint) => self.node_bindings.get(&mint).copied(),
            SandboxNodeRef::Backing(id) => Some(id),
        }
    }

    /// Returns the store identity a minted edge was bound to.
    #[must_use]
    pub fn edge_binding(&self, edge: SandboxEdgeRef) -> Option<StoreEdgeId> {
        match edge {
            SandboxEdgeRef::Minted(mint) => self.edge_bindings.get(&mint).copied(),
            SandboxEdgeRef::Backing(id) => Some(id),
        }
    }
}

/// Strategy for pushing a session's staged changes into its store.
pub trait FlushProvider<S: GraphStore> {
    /// Applies the staged changes of `sandbox` to its store.
    ///
    /// # Errors
    ///
    /// Implementations fail only on wholesale breakdown; element-level trouble
    /// belongs in the [`FlushReport`].
    fn flush(&self, sandbox: &mut Sandbox<S>) -> Result<FlushReport>;
}

/// The standard flush strategy; see the module docs for ordering and retry
/// semantics.
pub struct DefaultFlushProvider;

impl<S: GraphStore> FlushProvider<S> for DefaultFlushProvider {
    fn flush(&self, sandbox: &mut Sandbox<S>) -> Result<FlushReport> {
        let mut report = FlushReport::default();

        flush_minted_nodes(sandbox, &mut report);
        flush_minted_edges(sandbox, &mut report);
        flush_overrides(sandbox, &mut report);
        flush_removals(sandbox, &mut report);

        Ok(report)
    }
}

fn flush_minted_nodes<S: GraphStore>(sandbox: &mut Sandbox<S>, report: &mut FlushReport) {
    let staged = std::mem::take(&mut sandbox.minted_nodes);
    let mut retained: BTreeMap<u64, Attrs> = BTreeMap::new();

    for (mint, attrs) in staged {
        match sandbox.store.create_node(attrs.clone()) {
            Ok(id) => {
                report.node_bindings.insert(mint, id);
                report.flushed += 1;
            }
            Err(err) => {
                report.failures.push(FlushFailure {
                    element: FlushElement::Node(SandboxNodeRef::Minted(mint)),
                    reason: err.to_string(),
                });
                retained.insert(mint, attrs);
            }
        }
    }

    sandbox.minted_nodes = retained;
}

fn flush_minted_edges<S: GraphStore>(sandbox: &mut Sandbox<S>, report: &mut FlushReport) {
    // Rebind endpoints that were admitted in this flush before touching edges
    for edge in sandbox.minted_edges.values_mut() {
        if let SandboxNodeRef::Minted(mint) = edge.source {
            if let Some(&id) = report.node_bindings.get(&mint) {
                edge.source = SandboxNodeRef::Backing(id);
            }
        }
        if let SandboxNodeRef::Minted(mint) = edge.target {
            if let Some(&id) = report.node_bindings.get(&mint) {
                edge.target = SandboxNodeRef::Backing(id);
            }
        }
    }

    let staged = std::mem::take(&mut sandbox.minted_edges);
    let mut retained = BTreeMap::new();

    for (mint, edge) in staged {
        let (SandboxNodeRef::Backing(source), SandboxNodeRef::Backing(target)) =
            (edge.source, edge.target)
        else {
            // an endpoint node failed to flush; the edge cannot go in yet
            report.failures.push(FlushFailure {
                element: FlushElement::Edge(SandboxEdgeRef::Minted(mint)),
                reason: "endpoint node is not yet in the store".to_string(),
            });
            retained.insert(mint, edge);
            continue;
        };

        match sandbox
            .store
            .create_edge(source, target, edge.record.clone())
        {
            Ok(id) => {
                report.edge_bindings.insert(mint, id);
                report.flushed += 1;
            }
            Err(err) => {
                report.failures.push(FlushFailure {
                    element: FlushElement::Edge(SandboxEdgeRef::Minted(mint)),
                    reason: err.to_string(),
                });
                retained.insert(mint, edge);
            }
        }
    }

    sandbox.minted_edges = retained;
}

fn flush_overrides<S: GraphStore>(sandbox: &mut Sandbox<S>, report: &mut FlushReport) {
    let staged_nodes = std::mem::take(&mut sandbox.node_overrides);
    let mut retained_nodes = BTreeMap::new();
    for (id, attrs) in staged_nodes {
        match sandbox.store.replace_node_attrs(id, attrs.clone()) {
            Ok(()) => report.flushed += 1,
            Err(err) => {
                report.failures.push(FlushFailure {
                    element: FlushElement::Node(SandboxNodeRef::Backing(id)),
                    reason: err.to_string(),
                });
                retained_nodes.insert(id, attrs);
            }
        }
    }
    sandbox.node_overrides = retained_nodes;

    let staged_edges = std::mem::take(&mut sandbox.edge_overrides);
    let mut retained_edges = BTreeMap::new();
    for (id, record) in staged_edges {
        match sandbox.store.replace_edge_record(id, record.clone()) {
            Ok(()) => report.flushed += 1,
            Err(err) => {
                report.failures.push(FlushFailure {
                    element: FlushElement::Edge(SandboxEdgeRef::Backing(id)),
                    reason: err.to_string(),
                });
                retained_edges.insert(id, record);
            }
        }
    }
    sandbox.edge_overrides = retained_edges;
}

fn flush_removals<S: GraphStore>(sandbox: &mut Sandbox<S>, report: &mut FlushReport) {
    // Edges first: a node removal in the store cascades, and racing that
    // cascade with explicit edge removals would miscount.
    let staged_edges = std::mem::take(&mut sandbox.removed_edges);
    for id in staged_edges {
        if !sandbox.store.contains_edge(id) {
            // already gone; the staged removal is satisfied
            report.flushed += 1;
            continue;
        }
        match sandbox.store.remove_edge(id) {
            Ok(()) => report.flushed += 1,
            Err(err) => {
                report.failures.push(FlushFailure {
                    element: FlushElement::Edge(SandboxEdgeRef::Backing(id)),
                    reason: err.to_string(),
                });
                sandbox.removed_edges.insert(id);
            }
        }
    }

    let staged_nodes = std::mem::take(&mut sandbox.removed_nodes);
    for id in staged_nodes {
        if !sandbox.store.contains_node(id) {
            report.flushed += 1;
            continue;
        }
        match sandbox.store.remove_node(id) {
            Ok(()) => report.flushed += 1,
            Err(err) => {
                report.failures.push(FlushFailure {
                    element: FlushElement::Node(SandboxNodeRef::Backing(id)),
                    reason: err.to_string(),
                });
                sandbox.removed_nodes.insert(id);
            }
        }
    }
}
