//! Strongly connected component detection.
//!
//! This module implements Tarjan's single-pass SCC algorithm with an explicit frame
//! stack instead of recursion, so stack depth stays bounded on arbitrarily deep
//! graphs. Discovery indices and low-links are tracked per node; a component is
//! sealed whenever a node's low-link equals its own discovery index.
//!
//! # Output Guarantees
//!
//! - The returned components partition the node set exactly: every live node belongs
//!   to exactly one component, with no overlaps and no omissions.
//! - Components are emitted in reverse topological order of the condensation (a
//!   component appears before any component that can reach it).
//! - Node lists inside a component are sorted ascending; the whole result is
//!   deterministic for a given graph.
//!
//! Trivial components (a single node without a self-loop) carry no cycle information;
//! [`SccPartition::non_trivial`] filters them out for consumers like loop detection.

use crate::graph::algorithms::CancellationToken;
use crate::graph::{NodeId, Successors};
use crate::Result;

/// The strongly-connected-component partition of a graph.
#[derive(Debug, Clone)]
pub struct SccPartition {
    components: Vec<Vec<NodeId>>,
    /// Component index per node index; tombstoned indices stay `None`.
    membership: Vec<Option<usize>>,
}

impl SccPartition {
    /// Returns all components, in reverse topological order of the condensation.
    #[must_use]
    pub fn components(&self) -> &[Vec<NodeId>] {
        &self.components
    }

    /// Returns the number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns `true` if the partition holds no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Returns the index of the component containing `node`, if the node was part of
    /// the analyzed graph.
    #[must_use]
    pub fn component_of(&self, node: NodeId) -> Option<usize> {
        self.membership.get(node.index()).copied().flatten()
    }

    /// Returns `true` if `a` and `b` lie on a common cycle (or are the same node).
    #[must_use]
    pub fn same_component(&self, a: NodeId, b: NodeId) -> bool {
        match (self.component_of(a), self.component_of(b)) {
            (Some(ca), Some(cb)) => ca == cb,
            _ => false,
        }
    }

    /// Returns the indices of the non-trivial components: size greater than one, or a
    /// single node carrying a self-loop.
    ///
    /// These are exactly the components that witness cycles.
    #[must_use]
    pub fn non_trivial<G: Successors>(&self, graph: &G) -> Vec<usize> {
        self.components
            .iter()
            .enumerate()
            .filter(|(_, nodes)| {
                nodes.len() > 1
                    || nodes
                        .first()
                        .is_some_and(|&n| graph.successors(n).any(|s| s == n))
            })
            .map(|(index, _)| index)
            .collect()
    }
}

/// Per-node DFS frame for the explicit-stack Tarjan walk.
struct Frame {
    node: NodeId,
    successors: Vec<NodeId>,
    next: usize,
}

/// Computes the strongly connected components of a graph.
///
/// Equivalent to [`strongly_connected_components_with`] with a token that never
/// cancels.
///
/// # Errors
///
/// Only [`Error::Cancelled`](crate::Error::Cancelled) through the cancellable variant;
/// this wrapper cannot fail in practice but shares the signature for uniformity.
pub fn strongly_connected_components<G: Successors>(graph: &G) -> Result<SccPartition> {
    strongly_connected_components_with(graph, &CancellationToken::new())
}

/// Computes the strongly connected components of a graph, polling a cancellation
/// token.
///
/// Tarjan's algorithm, non-recursive: an explicit frame stack replaces the call
/// stack, and a parent's low-link is refined when a child's frame pops.
///
/// # Errors
///
/// - [`Error::Cancelled`](crate::Error::Cancelled) if the token trips mid-walk
pub fn strongly_connected_components_with<G: Successors>(
    graph: &G,
    token: &CancellationToken,
) -> Result<SccPartition> {
    let bound = graph.node_bound();

    let mut index: Vec<Option<usize>> = vec![None; bound];
    let mut lowlink: Vec<usize> = vec![0; bound];
    let mut on_stack: Vec<bool> = vec![false; bound];
    let mut tarjan_stack: Vec<NodeId> = Vec::new();
    let mut next_index = 0usize;

    let mut components: Vec<Vec<NodeId>> = Vec::new();
    let mut membership: Vec<Option<usize>> = vec![None; bound];

    let mut call_stack: Vec<Frame> = Vec::new();

    let enter = |node: NodeId,
                 index: &mut Vec<Option<usize>>,
                 lowlink: &mut Vec<usize>,
                 on_stack: &mut Vec<bool>,
                 tarjan_stack: &mut Vec<NodeId>,
                 next_index: &mut usize|
     -> Frame {
        index[node.index()] = Some(*next_index);
        lowlink[node.index()] = *next_index;
        *next_index += 1;
        on_stack[node.index()] = true;
        tarjan_stack.push(node);
        Frame {
            node,
            successors: graph.successors(node).collect(),
            next: 0,
        }
    };

    for root in graph.node_ids() {
        if index[root.index()].is_some() {
            continue;
        }
        if token.is_cancelled() {
            return Err(crate::Error::Cancelled);
        }

        call_stack.push(enter(
            root,
            &mut index,
            &mut lowlink,
            &mut on_stack,
            &mut tarjan_stack,
            &mut next_index,
        ));

        while let Some(frame) = call_stack.last_mut() {
            if frame.next < frame.successors.len() {
                let target = frame.successors[frame.next];
                frame.next += 1;

                match index[target.index()] {
                    None => {
                        let child = enter(
                            target,
                            &mut index,
                            &mut lowlink,
                            &mut on_stack,
                            &mut tarjan_stack,
                            &mut next_index,
                        );
                        call_stack.push(child);
                    }
                    Some(target_index) => {
                        if on_stack[target.index()] {
                            let node = frame.node;
                            lowlink[node.index()] = lowlink[node.index()].min(target_index);
                        }
                    }
                }
                continue;
            }

            // All successors explored: seal or propagate
            let node = frame.node;
            call_stack.pop();

            if lowlink[node.index()] == index[node.index()].unwrap_or(usize::MAX) {
                let mut component = Vec::new();
                loop {
                    let member = match tarjan_stack.pop() {
                        Some(member) => member,
                        None => break,
                    };
                    on_stack[member.index()] = false;
                    membership[member.index()] = Some(components.len());
                    component.push(member);
                    if member == node {
                        break;
                    }
                }
                component.sort_unstable();
                components.push(component);
            }

            if let Some(parent) = call_stack.last() {
                let parent_node = parent.node;
                lowlink[parent_node.index()] =
                    lowlink[parent_node.index()].min(lowlink[node.index()]);
            }
        }
    }

    Ok(SccPartition {
        components,
        membership,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DirectedGraph, GraphBase};

    fn build(node_count: usize, edges: &[(usize, usize)]) -> DirectedGraph<usize, ()> {
        let mut graph = DirectedGraph::new();
        let ids: Vec<NodeId> = (0..node_count).map(|i| graph.add_node(i)).collect();
        for &(src, dst) in edges {
            graph.add_edge(ids[src], ids[dst], ()).unwrap();
        }
        graph
    }

    #[test]
    fn test_two_node_cycle() {
        let graph = build(2, &[(0, 1), (1, 0)]);
        let sccs = strongly_connected_components(&graph).unwrap();

        assert_eq!(sccs.len(), 1);
        assert_eq!(sccs.components()[0], vec![NodeId::new(0), NodeId::new(1)]);
        assert!(sccs.same_component(NodeId::new(0), NodeId::new(1)));
    }

    #[test]
    fn test_acyclic_graph_only_singletons() {
        let graph = build(4, &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        let sccs = strongly_connected_components(&graph).unwrap();

        assert_eq!(sccs.len(), 4);
        for component in sccs.components() {
            assert_eq!(component.len(), 1);
        }
        assert!(sccs.non_trivial(&graph).is_empty());
    }

    #[test]
    fn test_partition_is_exact() {
        let graph = build(6, &[(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 3), (4, 5)]);
        let sccs = strongly_connected_components(&graph).unwrap();

        let mut seen = vec![0usize; 6];
        for component in sccs.components() {
            for node in component {
                seen[node.index()] += 1;
            }
        }
        assert_eq!(seen, vec![1; 6]); // no overlaps, no omissions

        for node in graph.node_ids() {
            assert!(sccs.component_of(node).is_some());
        }
    }

    #[test]
    fn test_reverse_topological_emission() {
        // {0,1,2} -> {3,4} -> {5}
        let graph = build(6, &[(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 3), (4, 5)]);
        let sccs = strongly_connected_components(&graph).unwrap();

        let c_cycle1 = sccs.component_of(NodeId::new(0)).unwrap();
        let c_cycle2 = sccs.component_of(NodeId::new(3)).unwrap();
        let c_sink = sccs.component_of(NodeId::new(5)).unwrap();
        // a component is sealed only after everything it reaches
        assert!(c_sink < c_cycle2);
        assert!(c_cycle2 < c_cycle1);
    }

    #[test]
    fn test_self_loop_is_non_trivial() {
        let graph = build(3, &[(0, 1), (1, 1), (1, 2)]);
        let sccs = strongly_connected_components(&graph).unwrap();

        assert_eq!(sccs.len(), 3);
        let non_trivial = sccs.non_trivial(&graph);
        assert_eq!(non_trivial.len(), 1);
        assert_eq!(
            sccs.components()[non_trivial[0]],
            vec![NodeId::new(1)]
        );
    }

    #[test]
    fn test_survives_node_removal() {
        let mut graph = build(4, &[(0, 1), (1, 2), (2, 1), (2, 3)]);
        graph.remove_node(NodeId::new(3)).unwrap();
        let sccs = strongly_connected_components(&graph).unwrap();

        assert_eq!(sccs.len(), 2);
        assert!(sccs.component_of(NodeId::new(3)).is_none());
        assert!(sccs.same_component(NodeId::new(1), NodeId::new(2)));
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        // 10k-node chain closed into one big cycle; recursion would blow the stack
        let n = 10_000;
        let mut edges: Vec<(usize, usize)> = (0..n - 1).map(|i| (i, i + 1)).collect();
        edges.push((n - 1, 0));
        let graph = build(n, &edges);

        let sccs = strongly_connected_components(&graph).unwrap();
        assert_eq!(sccs.len(), 1);
        assert_eq!(sccs.components()[0].len(), n);
    }

    #[test]
    fn test_cancellation() {
        let graph = build(2, &[(0, 1)]);
        let token = CancellationToken::new();
        token.cancel();
        assert!(matches!(
            strongly_connected_components_with(&graph, &token),
            Err(crate::Error::Cancelled)
        ));
    }
}
