use crate::ast::Direction;
use crate::executor::{Binding, Row, TracedEdge, Tracer};
use crate::plan::{ConnectionStep, HopRange, Plan};
use plexus_api::{GraphSource, PropertyValue};
use std::collections::{BTreeMap, HashSet};

/// One concrete traversed edge of a reconstructed path.
///
/// `from`/`to` are the edge's true graph orientation, so
/// `has_edge(from, kind, to)` always holds; `from_variable`/`to_variable`
/// name the pattern aliases bound to the endpoints, where any are.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PathEdge {
    pub from: String,
    pub to: String,
    pub kind: String,
    pub from_variable: Option<String>,
    pub to_variable: Option<String>,
    pub properties: BTreeMap<String, PropertyValue>,
}

/// A completed row rendered as node bindings plus its ordered edge list.
/// Edge variables and internal trace keys are stripped.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PathMatch {
    pub bindings: BTreeMap<String, String>,
    pub edges: Vec<PathEdge>,
}

/// Rebuild the concrete edge sequence behind a completed row.
///
/// Fixed-length connections pick the row-bound kind, or the first allowed
/// (or present) kind for which the edge truly exists. Variable-length
/// connections prefer the tracer's stored path and fall back to a bounded
/// simple-path search. Returns `None` when no concrete sequence exists.
pub fn reconstruct<S: GraphSource>(
    plan: &Plan,
    row: &Row,
    tracer: &Tracer,
    source: &S,
) -> Option<PathMatch> {
    let mut edges = Vec::new();

    for (index, conn) in plan.connections.iter().enumerate() {
        let left = row.node(&plan.segments[index].alias)?;
        let right = row.node(&plan.segments[index + 1].alias)?;

        if let Some(hops) = conn.hops {
            let path = match row.trace(index).and_then(|id| tracer.path(id)) {
                Some(path) => path.to_vec(),
                None => simple_path(source, conn, hops, left, right)?,
            };
            for edge in path {
                edges.push(path_edge(source, row, plan, edge.src, edge.kind, edge.dst));
            }
        } else {
            let (src, dst) = match conn.direction {
                Direction::Out => (left, right),
                Direction::In => (right, left),
            };
            let kind = fixed_edge_kind(source, conn, row, src, dst)?;
            edges.push(path_edge(
                source,
                row,
                plan,
                src.to_string(),
                kind,
                dst.to_string(),
            ));
        }
    }

    let mut bindings = BTreeMap::new();
    for segment in &plan.segments {
        if let Some(id) = row.node(&segment.alias) {
            bindings.insert(segment.alias.clone(), id.to_string());
        }
    }

    Some(PathMatch { bindings, edges })
}

fn path_edge<S: GraphSource>(
    source: &S,
    row: &Row,
    plan: &Plan,
    src: String,
    kind: String,
    dst: String,
) -> PathEdge {
    let properties = source
        .edge_properties(&src, &kind, &dst)
        .cloned()
        .unwrap_or_default();
    PathEdge {
        from_variable: alias_of(row, plan, &src),
        to_variable: alias_of(row, plan, &dst),
        from: src,
        to: dst,
        kind,
        properties,
    }
}

/// Pattern alias bound to this node id, if any. Intermediate nodes of a
/// variable-length hop have no alias.
fn alias_of(row: &Row, plan: &Plan, id: &str) -> Option<String> {
    plan.segments
        .iter()
        .find(|segment| row.node(&segment.alias) == Some(id))
        .map(|segment| segment.alias.clone())
}

/// Kind of the single edge behind a fixed-length connection.
fn fixed_edge_kind<S: GraphSource>(
    source: &S,
    conn: &ConnectionStep,
    row: &Row,
    src: &str,
    dst: &str,
) -> Option<String> {
    if let Some(variable) = &conn.variable
        && let Some(Binding::EdgeKind(kind)) = row.get(variable)
        && source.has_edge(src, kind, dst)
    {
        return Some(kind.clone());
    }
    if conn.kinds.is_empty() {
        return source
            .out_edge_kinds(src)
            .find(|kind| source.has_edge(src, kind, dst))
            .map(str::to_string);
    }
    conn.kinds
        .iter()
        .find(|kind| source.has_edge(src, kind, dst))
        .cloned()
}

/// Bounded simple-path search between the connection's endpoints, used when
/// a row carries no trace (e.g. it was produced by a different execution).
///
/// Depth-first with an owned visited set and path, both restored on
/// backtrack; the first path whose length lands in the hop range wins.
fn simple_path<S: GraphSource>(
    source: &S,
    conn: &ConnectionStep,
    hops: HopRange,
    left: &str,
    right: &str,
) -> Option<Vec<TracedEdge>> {
    let forward = conn.direction == Direction::Out;
    let mut visited = HashSet::new();
    visited.insert(left.to_string());
    let mut path = Vec::new();
    if search(
        source, conn, hops, forward, left, right, 0, &mut visited, &mut path,
    ) {
        Some(path)
    } else {
        None
    }
}

#[allow(clippy::too_many_arguments)]
fn search<S: GraphSource>(
    source: &S,
    conn: &ConnectionStep,
    hops: HopRange,
    forward: bool,
    current: &str,
    target: &str,
    depth: u32,
    visited: &mut HashSet<String>,
    path: &mut Vec<TracedEdge>,
) -> bool {
    if current == target && depth >= hops.min {
        return true;
    }
    if depth == hops.max {
        return false;
    }

    let kinds: Vec<String> = if conn.kinds.is_empty() {
        if forward {
            source.out_edge_kinds(current).map(str::to_string).collect()
        } else {
            source.in_edge_kinds(current).map(str::to_string).collect()
        }
    } else {
        conn.kinds.clone()
    };

    for kind in kinds {
        let neighbors: Vec<String> = if forward {
            source
                .out_neighbors(current, &kind)
                .map(str::to_string)
                .collect()
        } else {
            source
                .in_neighbors(current, &kind)
                .map(str::to_string)
                .collect()
        };
        for neighbor in neighbors {
            if !visited.insert(neighbor.clone()) {
                continue;
            }
            let edge = if forward {
                TracedEdge {
                    src: current.to_string(),
                    kind: kind.clone(),
                    dst: neighbor.clone(),
                }
            } else {
                TracedEdge {
                    src: neighbor.clone(),
                    kind: kind.clone(),
                    dst: current.to_string(),
                }
            };
            path.push(edge);
            if search(
                source, conn, hops, forward, &neighbor, target, depth + 1, visited, path,
            ) {
                return true;
            }
            path.pop();
            visited.remove(&neighbor);
        }
    }
    false
}
