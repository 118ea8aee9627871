// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # flowscope
//!
//! A graph-algorithms toolbox for static program analysis. `flowscope` models a program's
//! structure as a directed multigraph (functions, blocks, statements as nodes; control-flow,
//! call, and synthetic relations as edges) and provides the classical compiler analyses that
//! higher-level tooling is built on.
//!
//! ## Features
//!
//! - **Generic graph model** - Strongly-typed node/edge identifiers, attribute maps,
//!   multigraph semantics, predicate queries
//! - **Sandboxed mutation** - Copy-on-write overlay over an immutable backing store with
//!   per-element flush semantics
//! - **Dominance analysis** - Iterative dataflow dominator/post-dominator trees and
//!   dominance frontiers
//! - **Cycle analysis** - Non-recursive Tarjan strongly connected components
//! - **Loop identification** - Natural loops, nesting forests, irreducibility detection
//! - **ICFG construction** - Interprocedural control flow with pluggable call resolution
//! - **Path enumeration** - Lazy, bounded, deterministic simple-path search
//!
//! ## Quick Start
//!
//! Add `flowscope` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! flowscope = "0.1"
//! ```
//!
//! ### Using the Prelude
//!
//! ```rust
//! use flowscope::prelude::*;
//!
//! let mut graph = ProgramGraph::new();
//! let entry = graph.add_node(Attrs::named("entry"));
//! let body = graph.add_node(Attrs::named("body"));
//! let exit = graph.add_node(Attrs::named("exit"));
//! graph.add_edge(entry, body, EdgeRecord::control_flow())?;
//! graph.add_edge(body, body, EdgeRecord::control_flow())?;
//! graph.add_edge(body, exit, EdgeRecord::control_flow())?;
//!
//! let normalized = normalize(graph)?;
//! let dominators = compute_dominators(&normalized)?;
//! assert!(dominators.dominates(entry, exit));
//!
//! let loops = identify_loops(&normalized)?;
//! assert_eq!(loops.len(), 1);
//! # Ok::<(), flowscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `flowscope` is organized into several key modules:
//!
//! - [`graph`] - The directed multigraph model, traversal, dominance, SCC, and path
//!   enumeration algorithms
//! - [`store`] - The backing-store contract ([`store::GraphStore`]) and an in-memory
//!   reference implementation shared read-only across analyses
//! - [`sandbox`] - Isolated, mutable overlays over a backing store with explicit flush
//! - [`analysis`] - Graph-shape analyses: unique-entry-exit normalization, loop
//!   identification, and interprocedural CFG construction
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`Error`] and [`Result`] - Comprehensive error handling
//!
//! ## Concurrency
//!
//! A backing store is a shared, read-mostly resource: any number of sandboxes and analyses
//! may query it concurrently. Each [`sandbox::Sandbox`] is exclusive to one analysis. All
//! algorithms are synchronous computations over immutable snapshots, so independent analyses
//! parallelize freely; long-running traversals accept an explicit
//! [`graph::algorithms::CancellationToken`].

#[macro_use]
mod error;

pub mod analysis;
pub mod graph;
pub mod prelude;
pub mod sandbox;
pub mod store;

pub use error::Error;

/// Convenience `Result` type used throughout this library.
pub type Result<T> = std::result::Result<T, Error>;
