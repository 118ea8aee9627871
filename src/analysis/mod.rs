//! Control-flow and interprocedural analyses.
//!
//! The modules here consume the graph model and algorithms from [`crate::graph`]
//! and produce the higher-level structures a static analyzer works with:
//!
//! - [`normalize`] - Unique-entry/unique-exit normalization of control flow graphs
//! - [`loops`] - Natural loop identification with nesting and irreducibility
//!   detection
//! - [`icfg`] - Interprocedural control flow graph construction with pluggable
//!   call resolution
//!
//! Normalization is the usual first step: the dominance and loop machinery wants
//! a single entry and exit, and [`normalize_all`] runs it across a whole
//! program's worth of function bodies in parallel.

pub mod icfg;
pub mod loops;
pub mod normalize;

pub use icfg::{
    build_icfg, CallResolutionStrategy, FixedResolution, FunctionCfg, FunctionId, Icfg,
    NameResolution,
};
pub use loops::{identify_loops, identify_loops_with, LoopForest, NaturalLoop};
pub use normalize::{normalize, UniqueEntryExitGraph, MASTER_ENTRY, MASTER_EXIT};

use rayon::prelude::*;

use crate::graph::ProgramGraph;
use crate::Result;

/// Normalizes a batch of control flow graphs in parallel.
///
/// Each graph is normalized independently on the rayon thread pool; results come
/// back in input order, one per graph, failures included. A graph that cannot be
/// normalized does not disturb its neighbors.
#[must_use]
pub fn normalize_all(graphs: Vec<ProgramGraph>) -> Vec<Result<UniqueEntryExitGraph>> {
    graphs.into_par_iter().map(normalize::normalize).collect()
}
