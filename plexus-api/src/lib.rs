use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Property value attached to a node or an edge.
///
/// A closed sum: pattern filters and WHERE literals parse into exactly these
/// four shapes, and comparisons are defined per shape:
/// - Str: UTF-8 strings
/// - Int: 64-bit signed integers
/// - Float: 64-bit floating point
/// - Bool: true/false
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Str(s.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Int(i)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

/// A node in the graph.
///
/// `id` is the user-assigned identifier, unique across the graph. `kind` is
/// the node's type tag (exposed as `type` in queries, e.g. `alice:Person`),
/// `label` a display name. Everything else lives in `properties`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: String,
    pub label: String,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            label: label.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// A directed typed edge between two nodes.
///
/// `(src, kind, dst)` is the edge's identity; parallel edges of different
/// kinds between the same endpoints are distinct.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    pub src: String,
    pub kind: String,
    pub dst: String,
}

/// Read access to a typed directed multigraph.
///
/// This is the narrow contract the query engine consumes. Implementors must
/// not mutate the graph while a query over it is in flight; the engine takes
/// no isolation measures of its own.
pub trait GraphSource {
    /// Iterator type for neighbor id lookups.
    type Neighbors<'a>: Iterator<Item = &'a str> + 'a
    where
        Self: 'a;

    /// Iterator type for per-direction edge-kind enumeration.
    type EdgeKinds<'a>: Iterator<Item = &'a str> + 'a
    where
        Self: 'a;

    /// Look up a node by id.
    fn node(&self, id: &str) -> Option<&Node>;

    /// Whether a node with this id exists.
    fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Iterate all node ids. Order is unspecified.
    fn node_ids(&self) -> Box<dyn Iterator<Item = &str> + '_>;

    /// Destinations of edges `id -[kind]-> ?`.
    fn out_neighbors(&self, id: &str, kind: &str) -> Self::Neighbors<'_>;

    /// Sources of edges `? -[kind]-> id`.
    fn in_neighbors(&self, id: &str, kind: &str) -> Self::Neighbors<'_>;

    /// Edge kinds present on outgoing edges of `id`.
    ///
    /// Used to expand wildcard (untyped) connections without scanning the
    /// whole edge-kind universe.
    fn out_edge_kinds(&self, id: &str) -> Self::EdgeKinds<'_>;

    /// Edge kinds present on incoming edges of `id`.
    fn in_edge_kinds(&self, id: &str) -> Self::EdgeKinds<'_>;

    /// Whether the edge `src -[kind]-> dst` exists.
    fn has_edge(&self, src: &str, kind: &str, dst: &str) -> bool;

    /// Properties of the edge `src -[kind]-> dst`, if the edge exists.
    ///
    /// An existing edge with no properties may return `None` or an empty
    /// map; callers treat both alike.
    fn edge_properties(&self, src: &str, kind: &str, dst: &str)
    -> Option<&BTreeMap<String, PropertyValue>>;
}
