//! # flowscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the flowscope library. Import this module to get quick access to the essential
//! types for program-graph analysis.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all flowscope operations
pub use crate::Error;

/// The result type used throughout flowscope
pub use crate::Result;

// ================================================================================================
// Graph Model
// ================================================================================================

/// The directed multigraph and its strongly-typed identifiers
pub use crate::graph::{DirectedGraph, EdgeId, NodeId};

/// Program-graph payloads: attribute maps and edge records
pub use crate::graph::{keys, AttrValue, Attrs, EdgeKind, EdgeRecord, ProgramGraph};

/// Graph abstraction traits and the edge-reversal adapter
pub use crate::graph::{GraphBase, Predecessors, Reversed, RootedGraph, Successors};

// ================================================================================================
// Algorithms
// ================================================================================================

/// Traversal building blocks
pub use crate::graph::algorithms::{bfs, dfs, postorder, reverse_postorder};

/// Dominance analysis
pub use crate::graph::algorithms::{
    compute_dominance_frontiers, compute_dominators, compute_post_dominators, DominatorTree,
    PostDominatorTree,
};

/// Strongly connected components
pub use crate::graph::algorithms::{strongly_connected_components, SccPartition};

/// Bounded simple-path enumeration
pub use crate::graph::algorithms::{enumerate_paths, Path, PathBounds, PathEnumerator};

/// Cancellation of long-running traversals
pub use crate::graph::algorithms::CancellationToken;

// ================================================================================================
// Stores and Sandboxes
// ================================================================================================

/// The backing-store contract and the in-memory implementation
pub use crate::store::{GraphStore, MemoryStore, StoreEdge, StoreEdgeId, StoreNodeId};

/// Copy-on-write editing sessions and flush machinery
pub use crate::sandbox::{
    DefaultFlushProvider, FlushProvider, FlushReport, Sandbox, SandboxEdgeRef, SandboxNodeRef,
    Snapshot,
};

// ================================================================================================
// Analyses
// ================================================================================================

/// Unique-entry/unique-exit normalization
pub use crate::analysis::{normalize, normalize_all, UniqueEntryExitGraph};

/// Natural loop identification
pub use crate::analysis::{identify_loops, LoopForest, NaturalLoop};

/// Interprocedural control flow graph construction
pub use crate::analysis::{
    build_icfg, CallResolutionStrategy, FixedResolution, FunctionCfg, FunctionId, Icfg,
    NameResolution,
};
