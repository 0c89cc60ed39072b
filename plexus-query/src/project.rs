use crate::ast::{ReturnExpr, ReturnItem};
use crate::error::{Error, Result};
use crate::evaluator;
use crate::executor::{Binding, Row, Tracer, Value};
use crate::plan::Plan;
use plexus_api::GraphSource;
use std::collections::{BTreeMap, HashSet};

/// Validate RETURN items against the compiled plan.
///
/// Checks run before any row is produced: an unknown variable or a
/// duplicated explicit alias fails the whole call, matches or not.
pub fn validate(items: &[ReturnItem], plan: &Plan) -> Result<()> {
    let known = plan.known_variables();
    let mut aliases = HashSet::new();

    for item in items {
        let variable = match &item.expr {
            ReturnExpr::Variable(v) => v,
            ReturnExpr::Property { variable, .. } => variable,
        };
        if !known.contains(&variable.as_str()) {
            return Err(Error::Semantic(format!(
                "unknown variable '{variable}' in RETURN; known variables: {{{}}}",
                known.join(", ")
            )));
        }
        if let Some(alias) = &item.alias
            && !aliases.insert(alias.as_str())
        {
            return Err(Error::Semantic(format!("duplicate RETURN alias '{alias}'")));
        }
    }
    Ok(())
}

/// Project one row through the RETURN items.
pub fn project_row<S: GraphSource>(
    items: &[ReturnItem],
    row: &Row,
    source: &S,
    plan: &Plan,
    tracer: &Tracer,
) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    for item in items {
        let value = match &item.expr {
            ReturnExpr::Variable(variable) => project_variable(variable, row, plan, tracer),
            ReturnExpr::Property { variable, key } => {
                project_property(variable, key, row, source, plan, tracer)
            }
        };
        out.insert(item.column(), value);
    }
    out
}

/// All visible bindings of a row, for patterns without a RETURN clause.
/// Variable-length edge variables surface as their kind lists.
pub fn visible_row(row: &Row, plan: &Plan, tracer: &Tracer) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    for (name, binding) in row.bindings() {
        out.insert(name.clone(), Value::Str(binding.as_str().to_string()));
    }
    for (index, conn) in plan.connections.iter().enumerate() {
        if let Some(variable) = &conn.variable
            && conn.hops.is_some()
        {
            out.insert(variable.clone(), trace_kinds(index, row, tracer));
        }
    }
    out
}

fn project_variable(variable: &str, row: &Row, plan: &Plan, tracer: &Tracer) -> Value {
    if let Some(index) = plan.connection_index(variable)
        && plan.connections[index].hops.is_some()
    {
        return trace_kinds(index, row, tracer);
    }
    match row.get(variable) {
        Some(binding) => Value::Str(binding.as_str().to_string()),
        None => Value::Null,
    }
}

fn project_property<S: GraphSource>(
    variable: &str,
    key: &str,
    row: &Row,
    source: &S,
    plan: &Plan,
    tracer: &Tracer,
) -> Value {
    if plan.segment_index(variable).is_some() {
        return row
            .node(variable)
            .and_then(|id| source.node(id))
            .and_then(|node| evaluator::node_property(node, key))
            .map(Value::from)
            .unwrap_or(Value::Null);
    }

    let Some(index) = plan.connection_index(variable) else {
        return Value::Null;
    };
    let conn = &plan.connections[index];

    if conn.hops.is_some() {
        // One entry per edge on the traced path, not a quantified boolean.
        let Some(path) = row.trace(index).and_then(|id| tracer.path(id)) else {
            return Value::Null;
        };
        return Value::List(
            path.iter()
                .map(|edge| {
                    evaluator::edge_property(source, &edge.src, &edge.kind, &edge.dst, key)
                        .map(Value::from)
                        .unwrap_or(Value::Null)
                })
                .collect(),
        );
    }

    let Some(Binding::EdgeKind(kind)) = row.get(variable) else {
        return Value::Null;
    };
    let (Some(left), Some(right)) = (
        row.node(&plan.segments[index].alias),
        row.node(&plan.segments[index + 1].alias),
    ) else {
        return Value::Null;
    };
    let (src, dst) = match conn.direction {
        crate::ast::Direction::Out => (left, right),
        crate::ast::Direction::In => (right, left),
    };
    evaluator::edge_property(source, src, kind, dst, key)
        .map(Value::from)
        .unwrap_or(Value::Null)
}

fn trace_kinds(index: usize, row: &Row, tracer: &Tracer) -> Value {
    match row.trace(index).and_then(|id| tracer.path(id)) {
        Some(path) => Value::List(
            path.iter()
                .map(|edge| Value::Str(edge.kind.clone()))
                .collect(),
        ),
        None => Value::Null,
    }
}
