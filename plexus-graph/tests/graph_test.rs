//! MemoryGraph storage tests.

use plexus_api::{GraphSource, Node, PropertyValue};
use plexus_graph::{Error, MemoryGraph};

fn collect<'a>(iter: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut out: Vec<&str> = iter.collect();
    out.sort();
    out
}

#[test]
fn add_and_look_up_nodes() {
    let mut graph = MemoryGraph::new();
    graph
        .add_node(Node::new("alice", "Person", "Alice").with_property("age", 34i64))
        .unwrap();

    assert_eq!(graph.node_count(), 1);
    let node = graph.node("alice").unwrap();
    assert_eq!(node.kind, "Person");
    assert_eq!(node.properties["age"], PropertyValue::Int(34));
    assert!(graph.node("bob").is_none());
}

#[test]
fn duplicate_node_is_rejected() {
    let mut graph = MemoryGraph::new();
    graph.add_node(Node::new("a", "N", "A")).unwrap();
    let err = graph.add_node(Node::new("a", "N", "A")).unwrap_err();
    assert!(matches!(err, Error::DuplicateNode(_)));
}

#[test]
fn edges_require_existing_endpoints() {
    let mut graph = MemoryGraph::new();
    graph.add_node(Node::new("a", "N", "A")).unwrap();
    let err = graph.add_edge("a", "T", "ghost").unwrap_err();
    assert!(matches!(err, Error::UnknownNode(_)));
    let err = graph.add_edge("ghost", "T", "a").unwrap_err();
    assert!(matches!(err, Error::UnknownNode(_)));
}

#[test]
fn adjacency_is_indexed_in_both_directions() {
    let mut graph = MemoryGraph::new();
    for id in ["a", "b", "c"] {
        graph.add_node(Node::new(id, "N", id)).unwrap();
    }
    graph.add_edge("a", "X", "b").unwrap();
    graph.add_edge("a", "X", "c").unwrap();
    graph.add_edge("a", "Y", "c").unwrap();

    assert_eq!(collect(graph.out_neighbors("a", "X")), vec!["b", "c"]);
    assert_eq!(collect(graph.in_neighbors("c", "X")), vec!["a"]);
    assert!(collect(graph.out_neighbors("b", "X")).is_empty());

    assert_eq!(collect(graph.out_edge_kinds("a")), vec!["X", "Y"]);
    assert_eq!(collect(graph.in_edge_kinds("c")), vec!["X", "Y"]);
    assert!(collect(graph.in_edge_kinds("a")).is_empty());

    assert!(graph.has_edge("a", "X", "b"));
    assert!(!graph.has_edge("b", "X", "a"));
    assert_eq!(graph.edge_count(), 3);
}

#[test]
fn parallel_edges_of_different_kinds_coexist() {
    let mut graph = MemoryGraph::new();
    graph.add_node(Node::new("a", "N", "A")).unwrap();
    graph.add_node(Node::new("b", "N", "B")).unwrap();
    graph.add_edge("a", "X", "b").unwrap();
    graph.add_edge("a", "Y", "b").unwrap();

    assert!(graph.has_edge("a", "X", "b"));
    assert!(graph.has_edge("a", "Y", "b"));
    assert_eq!(graph.edge_count(), 2);
}

#[test]
fn edge_properties_round_trip() {
    let mut graph = MemoryGraph::new();
    graph.add_node(Node::new("a", "N", "A")).unwrap();
    graph.add_node(Node::new("b", "N", "B")).unwrap();
    graph
        .add_edge_with_properties(
            "a",
            "T",
            "b",
            [("w".to_string(), PropertyValue::Float(0.5))].into(),
        )
        .unwrap();

    let props = graph.edge_properties("a", "T", "b").unwrap();
    assert_eq!(props["w"], PropertyValue::Float(0.5));
    assert!(graph.edge_properties("b", "T", "a").is_none());
}

#[test]
fn reinserting_an_edge_is_idempotent() {
    let mut graph = MemoryGraph::new();
    graph.add_node(Node::new("a", "N", "A")).unwrap();
    graph.add_node(Node::new("b", "N", "B")).unwrap();
    graph.add_edge("a", "T", "b").unwrap();
    graph.add_edge("a", "T", "b").unwrap();
    assert_eq!(graph.edge_count(), 1);
}
