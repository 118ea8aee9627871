//! Attribute maps for program-graph elements.
//!
//! Every node and edge of a program graph carries an [`Attrs`] map from string keys to
//! [`AttrValue`]s. The map is ordered (keys ascending) so that queries, snapshots, and
//! store flushes iterate deterministically.

use std::collections::BTreeMap;
use std::fmt;

/// Well-known attribute keys used by the analyses in this crate.
pub mod keys {
    /// Human-readable element name.
    pub const NAME: &str = "name";
    /// Marks nodes and edges fabricated by an analysis (entry/exit wiring, unknown callees).
    pub const SYNTHETIC: &str = "synthetic";
    /// On call-site nodes: the name of the called function.
    pub const CALLEE: &str = "callee";
    /// On interprocedural-graph nodes: the name of the owning function.
    pub const FUNCTION: &str = "function";
}

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttrValue {
    /// A string value.
    Str(String),
    /// A signed integer value.
    Int(i64),
    /// A boolean value.
    Bool(bool),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(s) => write!(f, "{s}"),
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

/// An ordered attribute map (key → [`AttrValue`], keys unique).
///
/// Iteration order is ascending by key, which keeps every consumer of attribute data
/// (predicate queries, sandbox flushes, DOT output) deterministic across runs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Attrs(BTreeMap<String, AttrValue>);

impl Attrs {
    /// Creates an empty attribute map.
    #[must_use]
    pub fn new() -> Self {
        Attrs(BTreeMap::new())
    }

    /// Creates an attribute map holding only a `name` attribute.
    #[must_use]
    pub fn named(name: &str) -> Self {
        let mut attrs = Attrs::new();
        attrs.set(keys::NAME, name);
        attrs
    }

    /// Sets an attribute, replacing any previous value under the same key.
    pub fn set(&mut self, key: &str, value: impl Into<AttrValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Removes an attribute, returning the previous value if any.
    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        self.0.remove(key)
    }

    /// Returns the value stored under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.0.get(key)
    }

    /// Returns the string value stored under `key`, if present and a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(AttrValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns the integer value stored under `key`, if present and an integer.
    #[must_use]
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.0.get(key) {
            Some(AttrValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    /// Returns the boolean value stored under `key`, if present and a boolean.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.0.get(key) {
            Some(AttrValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Returns `true` if an attribute is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns `true` if this element is marked as fabricated by an analysis.
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.get_bool(keys::SYNTHETIC).unwrap_or(false)
    }

    /// Returns the number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no attributes are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(key, value)` pairs in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for Attrs {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Attrs(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
