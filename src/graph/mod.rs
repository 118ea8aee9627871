//! Generic directed graph infrastructure for program analysis.
//!
//! This module provides the directed multigraph model the rest of the crate is built
//! on: control flow graphs, interprocedural graphs, and sandbox snapshots are all
//! instances of [`DirectedGraph`]. The implementation prioritizes correctness, clear
//! semantics, and deterministic iteration over raw performance.
//!
//! # Architecture
//!
//! - **Core Types**: [`NodeId`], [`EdgeId`], and [`DirectedGraph`] provide the
//!   fundamental building blocks for graph representation
//! - **Program-Graph Payloads**: [`Attrs`] attribute maps, [`EdgeKind`] relation tags,
//!   and the [`ProgramGraph`] alias combining them
//! - **Algorithms**: Traversal, dominance, strongly connected components, and bounded
//!   path enumeration in [`algorithms`]
//! - **Traits**: [`GraphBase`], [`Successors`], [`Predecessors`], [`RootedGraph`] and
//!   the [`Reversed`] adapter enable algorithms to work with any graph shape
//!
//! # Design Principles
//!
//! ## Strongly-Typed Identifiers
//!
//! Node and edge identifiers use newtype wrappers to prevent accidental mixing of
//! indices, and stay stable across removals (slots are tombstoned, never reused).
//!
//! ## Deterministic Iteration
//!
//! Every iterator in this module yields elements in ascending id order, and attribute
//! maps iterate in key order. Analyses are reproducible run to run by construction.
//!
//! ## Thread Safety
//!
//! All graph types are [`Send`] and [`Sync`] when their node and edge data types are,
//! enabling concurrent read-only analysis across threads.

mod attrs;
mod directed;
mod edge;
mod node;
mod traits;

pub mod algorithms;

pub use attrs::{keys, AttrValue, Attrs};
pub use directed::DirectedGraph;
pub use edge::{EdgeId, EdgeKind, EdgeRecord};
pub use node::NodeId;
pub use traits::{GraphBase, Predecessors, Reversed, RootedGraph, Successors};

/// The program-graph instantiation used by the analyses in this crate: nodes carry
/// attribute maps, edges carry an [`EdgeKind`] plus attributes.
pub type ProgramGraph = DirectedGraph<Attrs, EdgeRecord>;
