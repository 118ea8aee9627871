//! Graph algorithms for program analysis.
//!
//! This module provides the algorithmic core of the crate, built on the abstraction
//! traits in [`crate::graph`]:
//!
//! - [`traversal`] - DFS/BFS iterators, postorder and reverse postorder
//! - [`dominators`] - Dominator/post-dominator trees and dominance frontiers
//!   (iterative dataflow fixpoint)
//! - [`scc`] - Strongly connected components (non-recursive Tarjan)
//! - [`paths`] - Bounded, lazy simple-path enumeration
//!
//! # Determinism
//!
//! Every algorithm iterates nodes and edges in a fixed order (ascending ids,
//! adjacency order), so repeated runs over the same graph produce identical results.
//!
//! # Cancellation
//!
//! Program graphs can be arbitrarily large, so the potentially long-running
//! algorithms (the dominance fixpoint, the SCC walk, path enumeration) poll an
//! explicit [`CancellationToken`]. A tripped token surfaces as
//! [`Error::Cancelled`](crate::Error::Cancelled); there is no silent partial result.

mod dominators;
mod paths;
mod scc;
mod traversal;

pub use dominators::{
    compute_dominance_frontiers, compute_dominators, compute_dominators_with,
    compute_post_dominators, compute_post_dominators_with, DominatorTree, PostDominatorTree,
};
pub use paths::{enumerate_paths, enumerate_paths_with, Path, PathBounds, PathEnumerator};
pub use scc::{
    strongly_connected_components, strongly_connected_components_with, SccPartition,
};
pub use traversal::{bfs, dfs, postorder, reverse_postorder, BfsIterator, DfsIterator};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable cancellation flag polled by long-running traversals.
///
/// Clones share the underlying flag: cancel from any thread, observe everywhere.
/// A token never un-cancels.
///
/// # Examples
///
/// ```rust,ignore
/// use flowscope::graph::algorithms::{compute_dominators_with, CancellationToken};
///
/// let token = CancellationToken::new();
/// let watchdog = token.clone();
/// std::thread::spawn(move || {
///     std::thread::sleep(std::time::Duration::from_secs(5));
///     watchdog.cancel();
/// });
/// let result = compute_dominators_with(&cfg, &token);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a fresh, un-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        CancellationToken {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Trips the token. All clones observe the cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Returns `true` if the token has been tripped.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}
