//! Dominator tree, post-dominator tree, and dominance frontier computation.
//!
//! This module implements dominance analysis for rooted directed graphs using the
//! iterative dataflow formulation of Cooper, Harvey, and Kennedy ("A Simple, Fast
//! Dominance Algorithm"): immediate dominators are refined to a fixpoint while
//! iterating over nodes in reverse postorder, intersecting dominator chains with a
//! two-finger walk over reverse-postorder numbers.
//!
//! # Key Concepts
//!
//! - **Dominance**: Node X dominates node Y if every path from the entry to Y passes
//!   through X. Every node dominates itself.
//! - **Immediate Dominator**: The closest strict dominator of a node; the idom links
//!   form the dominator tree.
//! - **Dominance Frontier**: DF(X) is the set of nodes where X's dominance ends —
//!   nodes M with a predecessor dominated by X while M itself is not strictly
//!   dominated by X.
//! - **Post-Dominance**: The same relation on the edge-reversed graph rooted at the
//!   exit; computed here by running the identical fixpoint on a [`Reversed`] view.
//!
//! # Determinism and Termination
//!
//! Iteration order is fixed (reverse postorder; predecessors in adjacency order), so
//! results are reproducible. The fixpoint converges in a small number of passes for
//! reducible graphs and is cut off by a safety bound of `node_count + 2` passes;
//! exceeding the bound indicates a broken graph implementation and is reported as an
//! internal error rather than looping forever.
//!
//! Nodes unreachable from the root are never assigned a dominator: they are reported
//! via [`Error::Disconnected`](crate::Error::Disconnected) up front.

use std::collections::BTreeSet;

use crate::graph::algorithms::{reverse_postorder, CancellationToken};
use crate::graph::{NodeId, Predecessors, Reversed, RootedGraph, Successors};
use crate::Result;

/// A dominator tree over a rooted graph.
///
/// Stores the immediate-dominator link for every reachable node. All query walks are
/// loop-based; no recursion, regardless of tree depth.
///
/// # Examples
///
/// ```rust,ignore
/// use flowscope::graph::algorithms::compute_dominators;
///
/// let tree = compute_dominators(&cfg)?;
/// assert!(tree.dominates(entry, exit));
/// let idom = tree.immediate_dominator(merge_point);
/// # Ok::<(), flowscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct DominatorTree {
    entry: NodeId,
    /// Immediate dominator per node index; `idom[entry] == entry`, unreachable
    /// indices (tombstones) stay `None`.
    idom: Vec<Option<NodeId>>,
}

/// A post-dominator tree: the dominator tree of the reversed graph, rooted at the exit.
///
/// Queries read the same but in the post-dominance sense: `dominates(a, b)` means
/// every path from `b` to the exit passes through `a`.
pub type PostDominatorTree = DominatorTree;

impl DominatorTree {
    /// Returns the root of this tree (the graph entry, or the exit for post-dominance).
    #[must_use]
    pub fn entry(&self) -> NodeId {
        self.entry
    }

    /// Returns the immediate dominator of `node`.
    ///
    /// The root has no immediate dominator. Returns `None` for the root and for
    /// indices that never belonged to the analyzed graph.
    #[must_use]
    pub fn immediate_dominator(&self, node: NodeId) -> Option<NodeId> {
        if node == self.entry {
            return None;
        }
        self.idom.get(node.index()).copied().flatten()
    }

    /// Returns `true` if `a` dominates `b` (every node dominates itself).
    #[must_use]
    pub fn dominates(&self, a: NodeId, b: NodeId) -> bool {
        let mut current = b;
        loop {
            if current == a {
                return true;
            }
            match self.immediate_dominator(current) {
                Some(next) => current = next,
                None => return false,
            }
        }
    }

    /// Returns `true` if `a` dominates `b` and `a != b`.
    #[must_use]
    pub fn strictly_dominates(&self, a: NodeId, b: NodeId) -> bool {
        a != b && self.dominates(a, b)
    }

    /// Returns an iterator over the dominators of `node`, from the node itself up to
    /// the root.
    pub fn dominators(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        DominatorIterator {
            tree: self,
            current: if self.contains(node) { Some(node) } else { None },
        }
    }

    /// Returns the depth of `node` in the tree (the root has depth 0).
    ///
    /// Returns `None` if `node` was not part of the analyzed graph.
    #[must_use]
    pub fn depth(&self, node: NodeId) -> Option<usize> {
        if !self.contains(node) {
            return None;
        }
        let mut depth = 0;
        let mut current = node;
        while let Some(next) = self.immediate_dominator(current) {
            depth += 1;
            current = next;
        }
        Some(depth)
    }

    /// Returns the children of `node` in the dominator tree, ascending.
    #[must_use]
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.idom
            .iter()
            .enumerate()
            .filter(|&(index, idom)| *idom == Some(node) && index != node.index())
            .map(|(index, _)| NodeId::new(index))
            .collect()
    }

    /// Returns `true` if `node` was part of the analyzed graph.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        matches!(self.idom.get(node.index()), Some(Some(_)))
    }
}

struct DominatorIterator<'a> {
    tree: &'a DominatorTree,
    current: Option<NodeId>,
}

impl Iterator for DominatorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.current?;
        self.current = self.tree.immediate_dominator(node);
        Some(node)
    }
}

/// Computes the dominator tree of a rooted graph.
///
/// Equivalent to [`compute_dominators_with`] with a token that never cancels.
///
/// # Errors
///
/// - [`Error::Disconnected`](crate::Error::Disconnected) if some nodes are not
///   reachable from the entry; the offending nodes are listed.
pub fn compute_dominators<G: RootedGraph>(graph: &G) -> Result<DominatorTree> {
    compute_dominators_with(graph, &CancellationToken::new())
}

/// Computes the dominator tree of a rooted graph, polling a cancellation token.
///
/// Iterative Cooper–Harvey–Kennedy fixpoint: nodes are processed in reverse postorder
/// from the entry; each node's immediate dominator is the intersection (over the
/// dominator chains, compared by reverse-postorder number) of the already-processed
/// predecessors. The entry dominates only itself.
///
/// # Errors
///
/// - [`Error::Disconnected`](crate::Error::Disconnected) if some nodes are not
///   reachable from the entry
/// - [`Error::Cancelled`](crate::Error::Cancelled) if the token trips between passes
/// - [`Error::Malformed`](crate::Error::Malformed) if the fixpoint fails to converge
///   within the safety bound (indicates a broken graph implementation)
pub fn compute_dominators_with<G: RootedGraph>(
    graph: &G,
    token: &CancellationToken,
) -> Result<DominatorTree> {
    let entry = graph.entry();
    let bound = graph.node_bound();
    let rpo = reverse_postorder(graph, entry);

    if rpo.len() < graph.node_count() {
        let mut seen = vec![false; bound];
        for &node in &rpo {
            seen[node.index()] = true;
        }
        let nodes: Vec<NodeId> = graph.node_ids().filter(|n| !seen[n.index()]).collect();
        return Err(crate::Error::Disconnected { nodes });
    }

    let mut rpo_number = vec![usize::MAX; bound];
    for (number, &node) in rpo.iter().enumerate() {
        rpo_number[node.index()] = number;
    }

    let mut idom: Vec<Option<NodeId>> = vec![None; bound];
    idom[entry.index()] = Some(entry);

    let intersect = |idom: &[Option<NodeId>], mut a: NodeId, mut b: NodeId| -> NodeId {
        while a != b {
            while rpo_number[a.index()] > rpo_number[b.index()] {
                a = idom[a.index()].unwrap_or(a);
            }
            while rpo_number[b.index()] > rpo_number[a.index()] {
                b = idom[b.index()].unwrap_or(b);
            }
        }
        a
    };

    let max_passes = rpo.len() + 2;
    let mut converged = false;
    for _ in 0..max_passes {
        if token.is_cancelled() {
            return Err(crate::Error::Cancelled);
        }

        let mut changed = false;
        for &node in rpo.iter().skip(1) {
            let mut new_idom: Option<NodeId> = None;
            for pred in graph.predecessors(node) {
                if idom[pred.index()].is_none() {
                    continue; // not yet processed this pass
                }
                new_idom = Some(match new_idom {
                    None => pred,
                    Some(current) => intersect(&idom, pred, current),
                });
            }
            if new_idom.is_some() && idom[node.index()] != new_idom {
                idom[node.index()] = new_idom;
                changed = true;
            }
        }

        if !changed {
            converged = true;
            break;
        }
    }

    if !converged {
        return Err(malformed_error!(
            "dominance fixpoint did not converge within {} passes",
            max_passes
        ));
    }

    Ok(DominatorTree { entry, idom })
}

/// Computes the post-dominator tree of a graph, rooted at `exit`.
///
/// Runs the dominator fixpoint on a [`Reversed`] view of the graph: successors and
/// predecessors swap, and the exit acts as the entry.
///
/// # Errors
///
/// - [`Error::Disconnected`](crate::Error::Disconnected) if some nodes cannot reach
///   the exit
pub fn compute_post_dominators<G: Successors + Predecessors>(
    graph: &G,
    exit: NodeId,
) -> Result<PostDominatorTree> {
    compute_dominators(&Reversed::new(graph, exit))
}

/// Computes the post-dominator tree of a graph, polling a cancellation token.
///
/// # Errors
///
/// As [`compute_post_dominators`], plus [`Error::Cancelled`](crate::Error::Cancelled).
pub fn compute_post_dominators_with<G: Successors + Predecessors>(
    graph: &G,
    exit: NodeId,
    token: &CancellationToken,
) -> Result<PostDominatorTree> {
    compute_dominators_with(&Reversed::new(graph, exit), token)
}

/// Computes the dominance frontier of every node.
///
/// DF(X) = nodes M such that X dominates a predecessor of M but does not strictly
/// dominate M. Computed with the standard join-point runner walk: only nodes with two
/// or more distinct predecessors contribute, and for each such node the runner climbs
/// each predecessor's dominator chain up to (excluding) the node's immediate
/// dominator, adding the join node to every frontier along the way.
///
/// Returns one ordered set per node index (indices without a node stay empty). Pass a
/// [`Reversed`] view together with a post-dominator tree to obtain post-dominance
/// frontiers.
#[must_use]
pub fn compute_dominance_frontiers<G: Predecessors>(
    graph: &G,
    tree: &DominatorTree,
) -> Vec<BTreeSet<NodeId>> {
    let bound = graph.node_bound();
    let mut frontiers: Vec<BTreeSet<NodeId>> = vec![BTreeSet::new(); bound];

    for node in graph.node_ids() {
        let preds: BTreeSet<NodeId> = graph.predecessors(node).collect();
        if preds.len() < 2 {
            continue;
        }
        let Some(idom) = tree.immediate_dominator(node) else {
            continue; // the root is never a join point
        };

        for &pred in &preds {
            if !tree.contains(pred) {
                continue;
            }
            let mut runner = pred;
            while runner != idom {
                frontiers[runner.index()].insert(node);
                match tree.immediate_dominator(runner) {
                    Some(next) => runner = next,
                    None => break,
                }
            }
        }
    }

    frontiers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DirectedGraph, GraphBase};

    struct Rooted {
        graph: DirectedGraph<&'static str, ()>,
        entry: NodeId,
    }

    impl GraphBase for Rooted {
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

    impl Successors for Rooted {
        fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
            self.graph.successors(node)
        }
    }

    impl Predecessors for Rooted {
        fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
            self.graph.predecessors(node)
        }
    }

    impl RootedGraph for Rooted {
        fn entry(&self) -> NodeId {
            self.entry
        }
    }

    fn build(names: &[&'static str], edges: &[(usize, usize)]) -> Rooted {
        let mut graph = DirectedGraph::new();
        let ids: Vec<NodeId> = names.iter().map(|n| graph.add_node(*n)).collect();
        for &(src, dst) in edges {
            graph.add_edge(ids[src], ids[dst], ()).unwrap();
        }
        Rooted {
            graph,
            entry: ids[0],
        }
    }

    #[test]
    fn test_linear_chain() {
        // e -> a -> b -> c
        let g = build(&["e", "a", "b", "c"], &[(0, 1), (1, 2), (2, 3)]);
        let tree = compute_dominators(&g).unwrap();

        assert_eq!(tree.immediate_dominator(NodeId::new(0)), None);
        assert_eq!(tree.immediate_dominator(NodeId::new(1)), Some(NodeId::new(0)));
        assert_eq!(tree.immediate_dominator(NodeId::new(2)), Some(NodeId::new(1)));
        assert_eq!(tree.immediate_dominator(NodeId::new(3)), Some(NodeId::new(2)));
        assert!(tree.dominates(NodeId::new(1), NodeId::new(3)));
        assert!(!tree.dominates(NodeId::new(3), NodeId::new(1)));
        assert_eq!(tree.depth(NodeId::new(3)), Some(3));
    }

    #[test]
    fn test_diamond_join_dominated_by_entry() {
        // e -> {a, b} -> c
        let g = build(&["e", "a", "b", "c"], &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        let tree = compute_dominators(&g).unwrap();

        assert_eq!(tree.immediate_dominator(NodeId::new(3)), Some(NodeId::new(0)));
        assert!(!tree.dominates(NodeId::new(1), NodeId::new(3)));
        assert!(!tree.dominates(NodeId::new(2), NodeId::new(3)));
        assert!(tree.strictly_dominates(NodeId::new(0), NodeId::new(3)));

        let mut children = tree.children(NodeId::new(0));
        children.sort();
        assert_eq!(children, vec![NodeId::new(1), NodeId::new(2), NodeId::new(3)]);
    }

    #[test]
    fn test_diamond_frontiers() {
        let g = build(&["e", "a", "b", "c"], &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        let tree = compute_dominators(&g).unwrap();
        let df = compute_dominance_frontiers(&g, &tree);

        assert!(df[0].is_empty());
        assert_eq!(df[1], BTreeSet::from([NodeId::new(3)]));
        assert_eq!(df[2], BTreeSet::from([NodeId::new(3)]));
        assert!(df[3].is_empty());
    }

    #[test]
    fn test_loop_header_in_own_frontier() {
        // e -> h -> b -> h, b -> x
        let g = build(&["e", "h", "b", "x"], &[(0, 1), (1, 2), (2, 1), (2, 3)]);
        let tree = compute_dominators(&g).unwrap();

        assert_eq!(tree.immediate_dominator(NodeId::new(2)), Some(NodeId::new(1)));
        assert!(tree.dominates(NodeId::new(1), NodeId::new(3)));

        let df = compute_dominance_frontiers(&g, &tree);
        // the back edge puts the header in its own frontier
        assert!(df[1].contains(&NodeId::new(1)));
        assert!(df[2].contains(&NodeId::new(1)));
    }

    #[test]
    fn test_dominator_chain_iterator() {
        let g = build(&["e", "a", "b"], &[(0, 1), (1, 2)]);
        let tree = compute_dominators(&g).unwrap();
        let chain: Vec<NodeId> = tree.dominators(NodeId::new(2)).collect();
        assert_eq!(chain, vec![NodeId::new(2), NodeId::new(1), NodeId::new(0)]);
    }

    #[test]
    fn test_unreachable_nodes_reported() {
        // c is never reachable from e
        let g = build(&["e", "a", "c"], &[(0, 1)]);
        match compute_dominators(&g) {
            Err(crate::Error::Disconnected { nodes }) => {
                assert_eq!(nodes, vec![NodeId::new(2)]);
            }
            other => panic!("expected Disconnected, got {other:?}"),
        }
    }

    #[test]
    fn test_post_dominators_diamond() {
        let g = build(&["e", "a", "b", "x"], &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        let post = compute_post_dominators(&g.graph, NodeId::new(3)).unwrap();

        assert_eq!(post.entry(), NodeId::new(3));
        assert_eq!(post.immediate_dominator(NodeId::new(0)), Some(NodeId::new(3)));
        // x post-dominates everything
        assert!(post.dominates(NodeId::new(3), NodeId::new(0)));
        assert!(post.dominates(NodeId::new(3), NodeId::new(1)));
        // a does not post-dominate e (the path through b avoids it)
        assert!(!post.dominates(NodeId::new(1), NodeId::new(0)));
    }

    #[test]
    fn test_cancellation() {
        let g = build(&["e", "a"], &[(0, 1)]);
        let token = CancellationToken::new();
        token.cancel();
        match compute_dominators_with(&g, &token) {
            Err(crate::Error::Cancelled) => {}
            other => panic!("expected Cancelled, got {other:?}"),
        }
    }

    #[test]
    fn test_deterministic_across_runs() {
        let edges = [(0, 1), (0, 2), (1, 3), (2, 3), (3, 1), (3, 4)];
        let g = build(&["e", "a", "b", "c", "x"], &edges);
        let t1 = compute_dominators(&g).unwrap();
        let t2 = compute_dominators(&g).unwrap();
        for node in g.node_ids() {
            assert_eq!(t1.immediate_dominator(node), t2.immediate_dominator(node));
        }
    }
}
