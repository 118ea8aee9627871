//! Edge identifier and edge payload types for directed graphs.
//!
//! This module provides [`EdgeId`], the strongly-typed identifier for edges, together
//! with the program-graph edge payload: [`EdgeKind`] classifies the relation an edge
//! represents and [`EdgeRecord`] pairs a kind with an attribute map.

use std::fmt;

use strum::{Display, EnumIter, EnumString};

use crate::graph::Attrs;

/// A strongly-typed identifier for edges within a directed graph.
///
/// `EdgeId` wraps a `usize` slot index. Identifiers are assigned sequentially when
/// edges are added and remain stable for the lifetime of the graph; slots of removed
/// edges are never reused. Because graphs are multigraphs, several edges may connect
/// the same pair of nodes, each with its own `EdgeId`.
///
/// # Thread Safety
///
/// `EdgeId` is [`Copy`], [`Send`], and [`Sync`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(pub(crate) usize);

impl EdgeId {
    /// Creates a new `EdgeId` from a raw index value.
    ///
    /// Primarily intended for internal use and testing. Normal usage obtains
    /// `EdgeId` values from [`DirectedGraph::add_edge`](crate::graph::DirectedGraph::add_edge).
    #[must_use]
    #[inline]
    pub const fn new(index: usize) -> Self {
        EdgeId(index)
    }

    /// Returns the raw 0-based index of this edge identifier.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

impl From<usize> for EdgeId {
    #[inline]
    fn from(index: usize) -> Self {
        EdgeId(index)
    }
}

impl From<EdgeId> for usize {
    #[inline]
    fn from(edge: EdgeId) -> Self {
        edge.0
    }
}

/// The relation a program-graph edge represents.
///
/// Kinds round-trip through their string form (via [`std::str::FromStr`] and
/// [`std::fmt::Display`]) so backing stores can persist them as plain attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum EdgeKind {
    /// Intraprocedural control flow between two code elements.
    ControlFlow,
    /// A call from a call site to a callee entry.
    Call,
    /// The return leg of a call, from a callee exit back to the return site.
    CallReturn,
    /// An edge fabricated by an analysis (entry/exit wiring, unknown callees).
    Synthetic,
}

/// Payload carried by every program-graph edge: its [`EdgeKind`] plus attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EdgeRecord {
    /// The relation this edge represents.
    pub kind: EdgeKind,
    /// Attribute map of this edge.
    pub attrs: Attrs,
}

impl Default for EdgeKind {
    fn default() -> Self {
        EdgeKind::ControlFlow
    }
}

impl EdgeRecord {
    /// Creates an edge record with the given kind and empty attributes.
    #[must_use]
    pub fn new(kind: EdgeKind) -> Self {
        EdgeRecord {
            kind,
            attrs: Attrs::new(),
        }
    }

    /// Creates a plain control-flow edge record.
    #[must_use]
    pub fn control_flow() -> Self {
        EdgeRecord::new(EdgeKind::ControlFlow)
    }

    /// Creates a synthetic edge record.
    #[must_use]
    pub fn synthetic() -> Self {
        EdgeRecord::new(EdgeKind::Synthetic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_edge_id_roundtrip() {
        let edge = EdgeId::new(3);
        assert_eq!(edge.index(), 3);

        let from: EdgeId = 9usize.into();
        let back: usize = from.into();
        assert_eq!(back, 9);
    }

    #[test]
    fn test_edge_id_formats() {
        let edge = EdgeId::new(7);
        assert_eq!(format!("{edge:?}"), "EdgeId(7)");
        assert_eq!(format!("{edge}"), "e7");
    }

    #[test]
    fn test_edge_kind_string_roundtrip() {
        for kind in EdgeKind::iter() {
            let text = kind.to_string();
            assert_eq!(EdgeKind::from_str(&text).unwrap(), kind);
        }
        assert_eq!(EdgeKind::Call.to_string(), "call");
        assert_eq!(EdgeKind::CallReturn.to_string(), "call-return");
    }

    #[test]
    fn test_edge_record_constructors() {
        assert_eq!(EdgeRecord::control_flow().kind, EdgeKind::ControlFlow);
        assert_eq!(EdgeRecord::synthetic().kind, EdgeKind::Synthetic);
        assert!(EdgeRecord::new(EdgeKind::Call).attrs.is_empty());
    }
}
