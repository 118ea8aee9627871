//! Unique-entry/unique-exit normalization of control flow graphs.
//!
//! Dominance, post-dominance, and loop analysis all want a control flow graph with
//! exactly one entry and exactly one exit. Real graphs rarely oblige: multiple
//! returns, dead blocks, several zero-in-degree heads. [`normalize`] repairs that:
//!
//! - A unique zero-in-degree node is adopted as the entry; several of them get a
//!   synthetic master entry node (named `⊤`) wired to each with synthetic edges.
//! - Nodes unreachable from the entry are pruned and reported.
//! - A unique zero-out-degree node is adopted as the exit; several of them get a
//!   synthetic master exit node (named `⊥`) wired from each.
//!
//! Normalization is idempotent: a graph that already has a unique entry and exit
//! passes through untouched, synthetic masters from an earlier run included.
//!
//! # Errors
//!
//! A graph where every node has a predecessor offers nothing to adopt or wire an
//! entry to; one where some node cannot reach the exit (an inescapable cycle) has
//! no meaningful post-dominance. Both surface as
//! [`Error::Disconnected`](crate::Error::Disconnected) naming the offending nodes.

use crate::graph::algorithms::dfs;
use crate::graph::{
    keys, Attrs, EdgeRecord, GraphBase, NodeId, Predecessors, ProgramGraph, Reversed, RootedGraph,
    Successors,
};
use crate::Result;

/// Name of the synthetic master entry node.
pub const MASTER_ENTRY: &str = "⊤";
/// Name of the synthetic master exit node.
pub const MASTER_EXIT: &str = "⊥";

/// A control flow graph with a unique entry and a unique exit.
///
/// Produced by [`normalize`]; implements the traversal traits, so the dominance
/// and loop machinery runs on it directly.
#[derive(Debug, Clone)]
pub struct UniqueEntryExitGraph {
    graph: ProgramGraph,
    entry: NodeId,
    exit: NodeId,
    synthetic_entry: bool,
    synthetic_exit: bool,
    removed: Vec<NodeId>,
}

impl UniqueEntryExitGraph {
    /// Returns the normalized graph.
    #[must_use]
    pub fn graph(&self) -> &ProgramGraph {
        &self.graph
    }

    /// Consumes the wrapper, yielding the normalized graph.
    #[must_use]
    pub fn into_graph(self) -> ProgramGraph {
        self.graph
    }

    /// Returns the unique exit node.
    #[must_use]
    pub fn exit(&self) -> NodeId {
        self.exit
    }

    /// Returns `true` if this run fabricated the entry node.
    #[must_use]
    pub fn has_synthetic_entry(&self) -> bool {
        self.synthetic_entry
    }

    /// Returns `true` if this run fabricated the exit node.
    #[must_use]
    pub fn has_synthetic_exit(&self) -> bool {
        self.synthetic_exit
    }

    /// Returns the nodes pruned as unreachable from the entry, ascending.
    #[must_use]
    pub fn removed_unreachable(&self) -> &[NodeId] {
        &self.removed
    }
}

impl GraphBase for UniqueEntryExitGraph {
    fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        self.graph.node_ids()
    }

    fn node_bound(&self) -> usize {
        self.graph.node_bound()
    }
}

impl Successors for UniqueEntryExitGraph {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.graph.successors(node)
    }
}

impl Predecessors for UniqueEntryExitGraph {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.graph.predecessors(node)
    }
}

impl RootedGraph for UniqueEntryExitGraph {
    fn entry(&self) -> NodeId {
        self.entry
    }
}

fn synthetic_attrs(name: &str) -> Attrs {
    let mut attrs = Attrs::named(name);
    attrs.set(keys::SYNTHETIC, true);
    attrs
}

/// Normalizes a control flow graph to a unique entry and a unique exit.
///
/// See the module docs for the wiring rules. The input graph is consumed; the
/// pruned and wired result comes back inside the [`UniqueEntryExitGraph`].
///
/// # Errors
///
/// - [`Error::GraphError`](crate::Error::GraphError) if the graph is empty
/// - [`Error::Disconnected`](crate::Error::Disconnected) if no node can serve as
///   entry, or some node cannot reach the exit
pub fn normalize(mut graph: ProgramGraph) -> Result<UniqueEntryExitGraph> {
    if graph.is_empty() {
        return Err(crate::Error::GraphError(
            "cannot normalize an empty graph".to_string(),
        ));
    }

    // Entry: adopt the unique head, or fabricate a master over several
    let heads = graph.entry_nodes();
    let (entry, synthetic_entry) = match heads.as_slice() {
        [] => {
            return Err(crate::Error::Disconnected {
                nodes: graph.node_ids().collect(),
            })
        }
        [only] => (*only, false),
        _ => {
            let master = graph.add_node(synthetic_attrs(MASTER_ENTRY));
            for &head in &heads {
                graph.add_edge(master, head, EdgeRecord::synthetic())?;
            }
            (master, true)
        }
    };

    // Prune whatever the entry cannot see
    let mut reachable = vec![false; graph.node_bound()];
    for node in dfs(&graph, entry) {
        reachable[node.index()] = true;
    }
    let unreachable: Vec<NodeId> = graph
        .node_ids()
        .filter(|n| !reachable[n.index()])
        .collect();
    for &node in &unreachable {
        graph.remove_node(node)?;
    }

    // Exit: adopt the unique tail, or fabricate a master under several
    let tails = graph.exit_nodes();
    let (exit, synthetic_exit) = match tails.as_slice() {
        [] => {
            return Err(crate::Error::Disconnected {
                nodes: graph.node_ids().collect(),
            })
        }
        [only] => (*only, false),
        _ => {
            let master = graph.add_node(synthetic_attrs(MASTER_EXIT));
            for &tail in &tails {
                graph.add_edge(tail, master, EdgeRecord::synthetic())?;
            }
            (master, true)
        }
    };

    // Every node must reach the exit, or post-dominance is meaningless
    let reversed = Reversed::new(&graph, exit);
    let mut reaches_exit = vec![false; graph.node_bound()];
    for node in dfs(&reversed, exit) {
        reaches_exit[node.index()] = true;
    }
    let stranded: Vec<NodeId> = graph
        .node_ids()
        .filter(|n| !reaches_exit[n.index()])
        .collect();
    if !stranded.is_empty() {
        return Err(crate::Error::Disconnected { nodes: stranded });
    }

    Ok(UniqueEntryExitGraph {
        graph,
        entry,
        exit,
        synthetic_entry,
        synthetic_exit,
        removed: unreachable,
    })
}
