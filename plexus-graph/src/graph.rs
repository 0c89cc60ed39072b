use crate::error::{Error, Result};
use plexus_api::{EdgeKey, GraphSource, Node, PropertyValue};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// In-memory typed directed multigraph.
///
/// Adjacency is indexed per node and edge kind in both directions, so
/// neighbor lookups and wildcard kind enumeration are map probes rather
/// than scans. Parallel edges between the same endpoints are allowed as
/// long as their kinds differ.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    nodes: HashMap<String, Node>,
    // node -> edge kind -> neighbor ids
    out: HashMap<String, BTreeMap<String, BTreeSet<String>>>,
    inn: HashMap<String, BTreeMap<String, BTreeSet<String>>>,
    edge_properties: HashMap<EdgeKey, BTreeMap<String, PropertyValue>>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node. Fails if a node with the same id already exists.
    pub fn add_node(&mut self, node: Node) -> Result<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(Error::DuplicateNode(node.id));
        }
        log::trace!("add node {} ({})", node.id, node.kind);
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Insert an edge `src -[kind]-> dst`. Both endpoints must exist.
    ///
    /// Re-inserting an existing edge is a no-op that keeps its properties.
    pub fn add_edge(&mut self, src: &str, kind: &str, dst: &str) -> Result<()> {
        self.add_edge_with_properties(src, kind, dst, BTreeMap::new())
    }

    /// Insert an edge with properties, replacing any previous property map
    /// if the edge already exists.
    pub fn add_edge_with_properties(
        &mut self,
        src: &str,
        kind: &str,
        dst: &str,
        properties: BTreeMap<String, PropertyValue>,
    ) -> Result<()> {
        if kind.is_empty() {
            return Err(Error::EmptyEdgeKind);
        }
        if !self.nodes.contains_key(src) {
            return Err(Error::UnknownNode(src.to_string()));
        }
        if !self.nodes.contains_key(dst) {
            return Err(Error::UnknownNode(dst.to_string()));
        }
        log::trace!("add edge {src} -[{kind}]-> {dst}");
        self.out
            .entry(src.to_string())
            .or_default()
            .entry(kind.to_string())
            .or_default()
            .insert(dst.to_string());
        self.inn
            .entry(dst.to_string())
            .or_default()
            .entry(kind.to_string())
            .or_default()
            .insert(src.to_string());
        if !properties.is_empty() {
            self.edge_properties.insert(
                EdgeKey {
                    src: src.to_string(),
                    kind: kind.to_string(),
                    dst: dst.to_string(),
                },
                properties,
            );
        }
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.out
            .values()
            .flat_map(|by_kind| by_kind.values())
            .map(|dsts| dsts.len())
            .sum()
    }
}

impl GraphSource for MemoryGraph {
    type Neighbors<'a>
        = Box<dyn Iterator<Item = &'a str> + 'a>
    where
        Self: 'a;
    type EdgeKinds<'a>
        = Box<dyn Iterator<Item = &'a str> + 'a>
    where
        Self: 'a;

    fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    fn node_ids(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.nodes.keys().map(String::as_str))
    }

    fn out_neighbors(&self, id: &str, kind: &str) -> Self::Neighbors<'_> {
        Box::new(
            self.out
                .get(id)
                .and_then(|by_kind| by_kind.get(kind))
                .into_iter()
                .flatten()
                .map(String::as_str),
        )
    }

    fn in_neighbors(&self, id: &str, kind: &str) -> Self::Neighbors<'_> {
        Box::new(
            self.inn
                .get(id)
                .and_then(|by_kind| by_kind.get(kind))
                .into_iter()
                .flatten()
                .map(String::as_str),
        )
    }

    fn out_edge_kinds(&self, id: &str) -> Self::EdgeKinds<'_> {
        Box::new(
            self.out
                .get(id)
                .into_iter()
                .flat_map(|by_kind| by_kind.keys())
                .map(String::as_str),
        )
    }

    fn in_edge_kinds(&self, id: &str) -> Self::EdgeKinds<'_> {
        Box::new(
            self.inn
                .get(id)
                .into_iter()
                .flat_map(|by_kind| by_kind.keys())
                .map(String::as_str),
        )
    }

    fn has_edge(&self, src: &str, kind: &str, dst: &str) -> bool {
        self.out
            .get(src)
            .and_then(|by_kind| by_kind.get(kind))
            .is_some_and(|dsts| dsts.contains(dst))
    }

    fn edge_properties(
        &self,
        src: &str,
        kind: &str,
        dst: &str,
    ) -> Option<&BTreeMap<String, PropertyValue>> {
        self.edge_properties.get(&EdgeKey {
            src: src.to_string(),
            kind: kind.to_string(),
            dst: dst.to_string(),
        })
    }
}
