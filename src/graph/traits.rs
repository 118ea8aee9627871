//! Trait definitions for graph abstractions.
//!
//! This module defines the core traits that enable graph algorithms to work with
//! different graph implementations. By programming against these traits, algorithms
//! can be reused across various graph types without modification.
//!
//! # Architecture
//!
//! The trait hierarchy is minimal and composable:
//!
//! - [`GraphBase`] - Core properties: node count, node iteration, index bound
//! - [`Successors`] - Forward edge traversal (outgoing edges)
//! - [`Predecessors`] - Backward edge traversal (incoming edges)
//! - [`RootedGraph`] - Graphs with a designated entry node (for dominator computation)
//!
//! The [`Reversed`] adapter flips a graph's edge direction and designates a root,
//! which is how post-dominance reuses the dominator machinery unchanged.
//!
//! # Design Principles
//!
//! All adjacency queries return iterators rather than collections, enabling lazy
//! evaluation and avoiding unnecessary allocations for simple traversals. Iteration
//! order must be deterministic for a given graph so analyses are reproducible.

use crate::graph::NodeId;

/// Base trait providing core graph properties.
pub trait GraphBase {
    /// Returns the number of live nodes in the graph.
    fn node_count(&self) -> usize;

    /// Returns an iterator over all live node identifiers, in ascending index order.
    fn node_ids(&self) -> impl Iterator<Item = NodeId>;

    /// Returns an exclusive upper bound on node indices.
    ///
    /// Removals leave gaps in the index space, so `node_bound()` may exceed
    /// [`node_count`](GraphBase::node_count). Algorithms use this to size dense
    /// per-node side tables.
    fn node_bound(&self) -> usize {
        self.node_count()
    }
}

/// Trait for graphs that support forward edge traversal.
pub trait Successors: GraphBase {
    /// Returns an iterator over the successor nodes of the given node.
    ///
    /// For a directed edge `(u, v)`, node `v` is a successor of `u`. Parallel edges
    /// yield the target once per edge.
    ///
    /// # Panics
    ///
    /// May panic if `node` is not a valid node in the graph.
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId>;
}

/// Trait for graphs that support backward edge traversal.
pub trait Predecessors: GraphBase {
    /// Returns an iterator over the predecessor nodes of the given node.
    ///
    /// For a directed edge `(u, v)`, node `u` is a predecessor of `v`.
    ///
    /// # Panics
    ///
    /// May panic if `node` is not a valid node in the graph.
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId>;
}

/// Trait for graphs with a designated entry (root) node.
///
/// The entry node is the starting point for forward traversals and the root of the
/// dominator tree. In a normalized control flow graph this is the unique entry.
pub trait RootedGraph: Successors + Predecessors {
    /// Returns the entry (root) node of the graph.
    fn entry(&self) -> NodeId;
}

/// A view of a graph with all edges reversed and an explicit root.
///
/// Successors and predecessors swap roles; the designated root (typically the unique
/// exit of a normalized graph) becomes the entry. Running the dominator computation
/// on a `Reversed` view yields the post-dominator tree of the underlying graph.
pub struct Reversed<'a, G> {
    graph: &'a G,
    root: NodeId,
}

impl<'a, G> Reversed<'a, G> {
    /// Creates a reversed view of `graph` rooted at `root`.
    pub fn new(graph: &'a G, root: NodeId) -> Self {
        Reversed { graph, root }
    }
}

impl<G: GraphBase> GraphBase for Reversed<'_, G> {
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

impl<G: Successors + Predecessors> Successors for Reversed<'_, G> {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.graph.predecessors(node)
    }
}

impl<G: Successors + Predecessors> Predecessors for Reversed<'_, G> {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.graph.successors(node)
    }
}

impl<G: Successors + Predecessors> RootedGraph for Reversed<'_, G> {
    fn entry(&self) -> NodeId {
        self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestGraph {
        node_count: usize,
        edges: Vec<(NodeId, NodeId)>,
        entry: NodeId,
    }

    impl GraphBase for TestGraph {
        fn node_count(&self) -> usize {
            self.node_count
        }

        fn node_ids(&self) -> impl Iterator<Item = NodeId> {
            (0..self.node_count).map(NodeId::new)
        }
    }

    impl Successors for TestGraph {
        fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
            self.edges
                .iter()
                .filter(move |(src, _)| *src == node)
                .map(|(_, dst)| *dst)
        }
    }

    impl Predecessors for TestGraph {
        fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
            self.edges
                .iter()
                .filter(move |(_, dst)| *dst == node)
                .map(|(src, _)| *src)
        }
    }

    impl RootedGraph for TestGraph {
        fn entry(&self) -> NodeId {
            self.entry
        }
    }

    fn diamond() -> TestGraph {
        TestGraph {
            node_count: 4,
            edges: vec![
                (NodeId::new(0), NodeId::new(1)),
                (NodeId::new(0), NodeId::new(2)),
                (NodeId::new(1), NodeId::new(3)),
                (NodeId::new(2), NodeId::new(3)),
            ],
            entry: NodeId::new(0),
        }
    }

    #[test]
    fn test_graph_base_defaults() {
        let graph = diamond();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.node_bound(), 4);
        assert_eq!(graph.node_ids().count(), 4);
    }

    #[test]
    fn test_successors_and_predecessors() {
        let graph = diamond();
        let succ: Vec<NodeId> = graph.successors(NodeId::new(0)).collect();
        assert_eq!(succ, vec![NodeId::new(1), NodeId::new(2)]);

        let pred: Vec<NodeId> = graph.predecessors(NodeId::new(3)).collect();
        assert_eq!(pred, vec![NodeId::new(1), NodeId::new(2)]);

        assert!(graph.predecessors(NodeId::new(0)).next().is_none());
    }

    #[test]
    fn test_reversed_swaps_directions() {
        let graph = diamond();
        let reversed = Reversed::new(&graph, NodeId::new(3));

        assert_eq!(reversed.entry(), NodeId::new(3));

        let succ: Vec<NodeId> = reversed.successors(NodeId::new(3)).collect();
        assert_eq!(succ, vec![NodeId::new(1), NodeId::new(2)]);

        let pred: Vec<NodeId> = reversed.predecessors(NodeId::new(3)).collect();
        assert!(pred.is_empty());

        assert_eq!(reversed.node_count(), 4);
        assert_eq!(reversed.node_bound(), 4);
    }
}
