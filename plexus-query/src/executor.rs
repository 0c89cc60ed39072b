use crate::ast::Direction;
use crate::error::Result;
use crate::evaluator;
use crate::plan::{ConnectionStep, Plan, SegmentStep};
use plexus_api::{GraphSource, PropertyValue};
use serde::ser::SerializeSeq;
use std::collections::{HashMap, HashSet, VecDeque};

/// Runtime value produced by projection.
///
/// Extends the property sum with `Null` (missing bindings/properties) and
/// `List` (per-edge values of a variable-length edge variable).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    List(Vec<Value>),
}

impl From<PropertyValue> for Value {
    fn from(value: PropertyValue) -> Self {
        match value {
            PropertyValue::Str(s) => Value::Str(s),
            PropertyValue::Int(i) => Value::Int(i),
            PropertyValue::Float(f) => Value::Float(f),
            PropertyValue::Bool(b) => Value::Bool(b),
        }
    }
}

impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Str(s) => serializer.serialize_str(s),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Null => serializer.serialize_none(),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

/// Value bound to a visible row variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// Segment alias bound to a node id.
    Node(String),
    /// Edge variable of a fixed-length connection bound to the matched kind.
    EdgeKind(String),
}

impl Binding {
    pub fn as_str(&self) -> &str {
        match self {
            Binding::Node(id) => id,
            Binding::EdgeKind(kind) => kind,
        }
    }
}

/// One concrete traversed edge in its true graph orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct TracedEdge {
    pub src: String,
    pub kind: String,
    pub dst: String,
}

/// Per-execution store mapping trace ids to the concrete edge sequence
/// behind a variable-length binding.
///
/// Owned by one `Executor`; ids are unique within that execution only, so
/// the store must never be shared across concurrent runs.
#[derive(Debug, Default)]
pub struct Tracer {
    next: u64,
    paths: HashMap<u64, Vec<TracedEdge>>,
}

impl Tracer {
    fn record(&mut self, path: Vec<TracedEdge>) -> u64 {
        let id = self.next;
        self.next += 1;
        self.paths.insert(id, path);
        id
    }

    pub fn path(&self, id: u64) -> Option<&[TracedEdge]> {
        self.paths.get(&id).map(Vec::as_slice)
    }
}

/// One complete or partial binding of pattern variables.
///
/// Visible bindings (projection input) are kept apart from the hidden
/// per-connection trace ids by type, not by key naming.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    // Small row: linear search is fine.
    bindings: Vec<(String, Binding)>,
    traces: Vec<(usize, u64)>,
}

impl Row {
    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn node(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Binding::Node(id)) => Some(id),
            _ => None,
        }
    }

    pub fn bindings(&self) -> &[(String, Binding)] {
        &self.bindings
    }

    pub fn with(mut self, name: impl Into<String>, binding: Binding) -> Self {
        let name = name.into();
        if let Some((_, v)) = self.bindings.iter_mut().find(|(k, _)| *k == name) {
            *v = binding;
        } else {
            self.bindings.push((name, binding));
        }
        self
    }

    pub fn trace(&self, connection: usize) -> Option<u64> {
        self.traces
            .iter()
            .find(|(c, _)| *c == connection)
            .map(|(_, id)| *id)
    }

    fn with_trace(mut self, connection: usize, id: u64) -> Self {
        self.traces.push((connection, id));
        self
    }

    /// Canonical form of the visible bindings, independent of the order
    /// they were discovered in. Trace ids are excluded.
    pub fn signature(&self) -> String {
        let mut parts: Vec<String> = self
            .bindings
            .iter()
            .map(|(k, v)| format!("{k}={}", v.as_str()))
            .collect();
        parts.sort();
        parts.join("|")
    }
}

/// Row executor for one compiled pattern.
///
/// Created fresh per top-level call: the tracer it owns hands out ids that
/// are only meaningful for rows produced by this execution.
pub struct Executor<'a, S: GraphSource> {
    source: &'a S,
    plan: &'a Plan,
    tracer: Tracer,
}

impl<'a, S: GraphSource> Executor<'a, S> {
    pub fn new(source: &'a S, plan: &'a Plan) -> Self {
        Self {
            source,
            plan,
            tracer: Tracer::default(),
        }
    }

    pub fn into_tracer(self) -> Tracer {
        self.tracer
    }

    /// Execute the pattern and apply its WHERE clause.
    ///
    /// With explicit starts, every segment position is tried as the anchor;
    /// without, all nodes matching the first segment seed the traversal.
    /// "No match" is an empty vec, never an error.
    pub fn run(
        &mut self,
        starts: Option<&[String]>,
        start_kind: Option<&str>,
    ) -> Result<Vec<Row>> {
        let rows = match starts {
            Some(ids) => self.run_anchored(ids, start_kind)?,
            None => self.run_scan()?,
        };

        let rows = match &self.plan.where_clause {
            Some(expr) => rows
                .into_iter()
                .filter(|row| {
                    evaluator::evaluate(expr, row, self.source, self.plan, &self.tracer)
                })
                .collect(),
            None => rows,
        };
        Ok(rows)
    }

    fn run_scan(&mut self) -> Result<Vec<Row>> {
        let source = self.source;
        let Some(first) = self.plan.segments.first() else {
            return Ok(Vec::new());
        };
        let mut rows: Vec<Row> = Vec::new();
        for id in source.node_ids() {
            if node_matches(source, id, first) {
                rows.push(Row::default().with(first.alias.clone(), Binding::Node(id.to_string())));
            }
        }
        log::debug!("scan seeded {} rows for '{}'", rows.len(), first.alias);

        for index in 0..self.plan.connections.len() {
            if rows.is_empty() {
                break;
            }
            rows = self.expand(rows, index, false)?;
        }
        Ok(dedupe(rows))
    }

    fn run_anchored(&mut self, ids: &[String], start_kind: Option<&str>) -> Result<Vec<Row>> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();

        for id in ids {
            if let Some(kind) = start_kind {
                match self.source.node(id) {
                    Some(node) if node.kind == kind => {}
                    _ => continue,
                }
            }

            for anchor in 0..self.plan.segments.len() {
                if !node_matches(self.source, id, &self.plan.segments[anchor]) {
                    continue;
                }
                let alias = self.plan.segments[anchor].alias.clone();
                let mut rows = vec![Row::default().with(alias, Binding::Node(id.clone()))];

                // Connections left of the anchor run with their direction
                // flipped, then the remainder runs as written.
                for index in (0..anchor).rev() {
                    if rows.is_empty() {
                        break;
                    }
                    rows = self.expand(rows, index, true)?;
                }
                for index in anchor..self.plan.connections.len() {
                    if rows.is_empty() {
                        break;
                    }
                    rows = self.expand(rows, index, false)?;
                }

                for row in rows {
                    if seen.insert(row.signature()) {
                        out.push(row);
                    }
                }
            }
        }
        log::debug!("anchored seeding produced {} rows", out.len());
        Ok(out)
    }

    fn expand(&mut self, rows: Vec<Row>, index: usize, reversed: bool) -> Result<Vec<Row>> {
        let conn = &self.plan.connections[index];
        let (cur_seg, next_seg) = if reversed {
            (&self.plan.segments[index + 1], &self.plan.segments[index])
        } else {
            (&self.plan.segments[index], &self.plan.segments[index + 1])
        };

        if conn.hops.is_some() {
            Ok(self.expand_var_length(rows, index, conn, cur_seg, next_seg, reversed))
        } else {
            Ok(expand_single(self.source, rows, conn, cur_seg, next_seg, reversed))
        }
    }

    /// Bounded BFS from each row's current binding.
    ///
    /// Tracks the first (shortest) discovery per node, which makes cyclic
    /// graphs safe; the realized edge path lands in the tracer keyed by a
    /// fresh id attached to the row.
    fn expand_var_length(
        &mut self,
        rows: Vec<Row>,
        index: usize,
        conn: &ConnectionStep,
        cur_seg: &SegmentStep,
        next_seg: &SegmentStep,
        reversed: bool,
    ) -> Vec<Row> {
        let source = self.source;
        let Some(hops) = conn.hops else {
            return Vec::new();
        };
        let forward = (conn.direction == Direction::Out) != reversed;
        let mut out = Vec::new();
        let mut seen = HashSet::new();

        for row in rows {
            let Some(start) = row.node(&cur_seg.alias).map(str::to_string) else {
                continue;
            };

            // node -> (hop count, edge path); first discovery wins.
            let mut reached: HashMap<String, (u32, Vec<TracedEdge>)> = HashMap::new();
            reached.insert(start.clone(), (0, Vec::new()));
            let mut queue = VecDeque::new();
            queue.push_back(start.clone());

            while let Some(node) = queue.pop_front() {
                let (depth, path) = reached[&node].clone();
                if depth == hops.max {
                    continue;
                }
                for kind in connection_kinds(source, conn, &node, forward) {
                    for neighbor in neighbor_ids(source, &node, &kind, forward) {
                        if reached.contains_key(&neighbor) {
                            continue;
                        }
                        let mut next_path = path.clone();
                        next_path.push(traced_edge(&node, &kind, &neighbor, forward));
                        reached.insert(neighbor.clone(), (depth + 1, next_path));
                        queue.push_back(neighbor);
                    }
                }
            }

            for (node, (depth, path)) in reached {
                if depth < hops.min || depth > hops.max {
                    continue;
                }
                // The source itself only matches a zero-hop lower bound.
                if node == start && hops.min != 0 {
                    continue;
                }
                if !node_matches(source, &node, next_seg) {
                    continue;
                }
                let mut path = path;
                if reversed {
                    // Traces are stored in pattern order (left to right).
                    path.reverse();
                }
                let trace_id = self.tracer.record(path);
                let new_row = row
                    .clone()
                    .with(next_seg.alias.clone(), Binding::Node(node))
                    .with_trace(index, trace_id);
                if seen.insert(new_row.signature()) {
                    out.push(new_row);
                }
            }
        }
        out
    }
}

/// Expand one fixed-length connection for every row.
///
/// Wildcard connections enumerate the kinds actually present on the bound
/// node in the travel direction; edge property constraints are evaluated on
/// the true (src, kind, dst) triple regardless of the pattern's arrow.
fn expand_single<S: GraphSource>(
    source: &S,
    rows: Vec<Row>,
    conn: &ConnectionStep,
    cur_seg: &SegmentStep,
    next_seg: &SegmentStep,
    reversed: bool,
) -> Vec<Row> {
    let forward = (conn.direction == Direction::Out) != reversed;
    let mut out = Vec::new();
    let mut seen = HashSet::new();

    for row in rows {
        let Some(cur) = row.node(&cur_seg.alias).map(str::to_string) else {
            continue;
        };
        for kind in connection_kinds(source, conn, &cur, forward) {
            for neighbor in neighbor_ids(source, &cur, &kind, forward) {
                if !node_matches(source, &neighbor, next_seg) {
                    continue;
                }
                let (src, dst) = if forward {
                    (cur.as_str(), neighbor.as_str())
                } else {
                    (neighbor.as_str(), cur.as_str())
                };
                if !edge_matches(source, src, &kind, dst, &conn.filters) {
                    continue;
                }
                let mut new_row = row
                    .clone()
                    .with(next_seg.alias.clone(), Binding::Node(neighbor.clone()));
                if let Some(var) = &conn.variable {
                    new_row = new_row.with(var.clone(), Binding::EdgeKind(kind.clone()));
                }
                if seen.insert(new_row.signature()) {
                    out.push(new_row);
                }
            }
        }
    }
    out
}

/// Edge kinds a connection tries from `node`: its explicit kind set, or for
/// a wildcard whatever is present on the node in the travel direction.
fn connection_kinds<S: GraphSource>(
    source: &S,
    conn: &ConnectionStep,
    node: &str,
    forward: bool,
) -> Vec<String> {
    if conn.kinds.is_empty() {
        if forward {
            source.out_edge_kinds(node).map(str::to_string).collect()
        } else {
            source.in_edge_kinds(node).map(str::to_string).collect()
        }
    } else {
        conn.kinds.clone()
    }
}

fn neighbor_ids<S: GraphSource>(source: &S, node: &str, kind: &str, forward: bool) -> Vec<String> {
    if forward {
        source.out_neighbors(node, kind).map(str::to_string).collect()
    } else {
        source.in_neighbors(node, kind).map(str::to_string).collect()
    }
}

fn traced_edge(node: &str, kind: &str, neighbor: &str, forward: bool) -> TracedEdge {
    if forward {
        TracedEdge {
            src: node.to_string(),
            kind: kind.to_string(),
            dst: neighbor.to_string(),
        }
    } else {
        TracedEdge {
            src: neighbor.to_string(),
            kind: kind.to_string(),
            dst: node.to_string(),
        }
    }
}

/// Whether a node satisfies a segment's kind and property constraints.
pub fn node_matches<S: GraphSource>(source: &S, id: &str, segment: &SegmentStep) -> bool {
    let Some(node) = source.node(id) else {
        return false;
    };
    if let Some(kind) = &segment.kind
        && node.kind != *kind
    {
        return false;
    }
    segment.filters.iter().all(|filter| {
        evaluator::filter_matches(evaluator::node_property(node, &filter.key).as_ref(), filter)
    })
}

/// Whether the true (src, kind, dst) edge satisfies a connection's inline
/// property constraints.
fn edge_matches<S: GraphSource>(
    source: &S,
    src: &str,
    kind: &str,
    dst: &str,
    filters: &[crate::ast::PropertyFilter],
) -> bool {
    filters.iter().all(|filter| {
        evaluator::filter_matches(
            evaluator::edge_property(source, src, kind, dst, &filter.key).as_ref(),
            filter,
        )
    })
}

fn dedupe(rows: Vec<Row>) -> Vec<Row> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(row.signature()))
        .collect()
}
