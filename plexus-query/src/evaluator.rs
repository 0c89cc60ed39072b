use crate::ast::{CmpOp, Comparison, Direction, FilterOp, Operand, PropertyFilter, WhereExpr};
use crate::executor::{Binding, Row, Tracer};
use crate::plan::Plan;
use plexus_api::{GraphSource, Node, PropertyValue};

/// Evaluate a WHERE tree over one bound row.
///
/// Missing variables and properties make the enclosing comparison false
/// rather than raising; WHERE never errors on a well-compiled plan.
pub fn evaluate<S: GraphSource>(
    expr: &WhereExpr,
    row: &Row,
    source: &S,
    plan: &Plan,
    tracer: &Tracer,
) -> bool {
    match expr {
        WhereExpr::Or(terms) => terms.iter().any(|t| evaluate(t, row, source, plan, tracer)),
        WhereExpr::And(terms) => terms.iter().all(|t| evaluate(t, row, source, plan, tracer)),
        WhereExpr::Cmp(cmp) => evaluate_comparison(cmp, row, source, plan, tracer),
    }
}

/// Operand resolution result.
///
/// `Each` carries the per-edge values of a variable-length edge variable;
/// a comparison over it must hold for every edge on the path.
enum Resolved {
    One(PropertyValue),
    Each(Vec<Option<PropertyValue>>),
    Missing,
}

fn evaluate_comparison<S: GraphSource>(
    cmp: &Comparison,
    row: &Row,
    source: &S,
    plan: &Plan,
    tracer: &Tracer,
) -> bool {
    let left = resolve_operand(&cmp.left, row, source, plan, tracer);
    let right = resolve_operand(&cmp.right, row, source, plan, tracer);

    match (left, right) {
        (Resolved::One(l), Resolved::One(r)) => compare(&l, cmp.op, &r),
        (Resolved::Each(values), Resolved::One(r)) => values
            .iter()
            .all(|v| v.as_ref().is_some_and(|v| compare(v, cmp.op, &r))),
        (Resolved::One(l), Resolved::Each(values)) => values
            .iter()
            .all(|v| v.as_ref().is_some_and(|v| compare(&l, cmp.op, v))),
        // Two path-quantified operands in one comparison are unsupported.
        _ => false,
    }
}

fn resolve_operand<S: GraphSource>(
    operand: &Operand,
    row: &Row,
    source: &S,
    plan: &Plan,
    tracer: &Tracer,
) -> Resolved {
    match operand {
        Operand::Literal(value) => Resolved::One(value.clone()),
        Operand::Property { variable, key } => {
            if plan.segment_index(variable).is_some() {
                let Some(id) = row.node(variable) else {
                    return Resolved::Missing;
                };
                let Some(node) = source.node(id) else {
                    return Resolved::Missing;
                };
                return match node_property(node, key) {
                    Some(value) => Resolved::One(value),
                    None => Resolved::Missing,
                };
            }
            if let Some(index) = plan.connection_index(variable) {
                return resolve_edge_property(index, variable, key, row, source, plan, tracer);
            }
            Resolved::Missing
        }
        Operand::EdgeKind(variable) => {
            let Some(index) = plan.connection_index(variable) else {
                return Resolved::Missing;
            };
            let conn = &plan.connections[index];
            if conn.hops.is_some() {
                let Some(path) = row.trace(index).and_then(|id| tracer.path(id)) else {
                    return Resolved::Missing;
                };
                return Resolved::Each(
                    path.iter()
                        .map(|edge| Some(PropertyValue::Str(edge.kind.clone())))
                        .collect(),
                );
            }
            match row.get(variable) {
                Some(Binding::EdgeKind(kind)) => Resolved::One(PropertyValue::Str(kind.clone())),
                _ => Resolved::Missing,
            }
        }
    }
}

fn resolve_edge_property<S: GraphSource>(
    index: usize,
    variable: &str,
    key: &str,
    row: &Row,
    source: &S,
    plan: &Plan,
    tracer: &Tracer,
) -> Resolved {
    let conn = &plan.connections[index];

    if conn.hops.is_some() {
        // Variable-length: one value per edge on the traced path; the
        // comparison quantifies over all of them.
        let Some(path) = row.trace(index).and_then(|id| tracer.path(id)) else {
            return Resolved::Missing;
        };
        return Resolved::Each(
            path.iter()
                .map(|edge| edge_property(source, &edge.src, &edge.kind, &edge.dst, key))
                .collect(),
        );
    }

    let Some(Binding::EdgeKind(kind)) = row.get(variable) else {
        return Resolved::Missing;
    };
    let (Some(left), Some(right)) = (
        row.node(&plan.segments[index].alias),
        row.node(&plan.segments[index + 1].alias),
    ) else {
        return Resolved::Missing;
    };
    // The row binds the pattern's endpoints; the edge's true orientation
    // follows the connection direction.
    let (src, dst) = match conn.direction {
        Direction::Out => (left, right),
        Direction::In => (right, left),
    };
    match edge_property(source, src, kind, dst, key) {
        Some(value) => Resolved::One(value),
        None => Resolved::Missing,
    }
}

/// Node property lookup with the reserved keys `id`, `type`, and `label`;
/// everything else reads the free-form property map.
pub fn node_property(node: &Node, key: &str) -> Option<PropertyValue> {
    match key {
        "id" => Some(PropertyValue::Str(node.id.clone())),
        "type" => Some(PropertyValue::Str(node.kind.clone())),
        "label" => Some(PropertyValue::Str(node.label.clone())),
        _ => node.properties.get(key).cloned(),
    }
}

/// Edge property lookup with the reserved keys `type`, `src`, and `dst`.
pub fn edge_property<S: GraphSource>(
    source: &S,
    src: &str,
    kind: &str,
    dst: &str,
    key: &str,
) -> Option<PropertyValue> {
    match key {
        "type" => Some(PropertyValue::Str(kind.to_string())),
        "src" => Some(PropertyValue::Str(src.to_string())),
        "dst" => Some(PropertyValue::Str(dst.to_string())),
        _ => source
            .edge_properties(src, kind, dst)
            .and_then(|props| props.get(key).cloned()),
    }
}

/// Whether a property value satisfies an inline `{...}` filter.
/// A missing value never matches.
pub fn filter_matches(value: Option<&PropertyValue>, filter: &PropertyFilter) -> bool {
    let Some(value) = value else {
        return false;
    };
    match filter.op {
        FilterOp::Eq => compare(value, CmpOp::Eq, &filter.value),
        FilterOp::ContainsCi => compare(value, CmpOp::Contains, &filter.value),
    }
}

/// Typed comparison; unsupported operator/type pairs are false.
///
/// Booleans support equality only; numbers (with int/float coercion) the
/// full ordering set; strings equality, case-insensitive CONTAINS, and
/// case-sensitive STARTS WITH.
pub fn compare(left: &PropertyValue, op: CmpOp, right: &PropertyValue) -> bool {
    use PropertyValue::*;
    match (left, right) {
        (Bool(l), Bool(r)) => match op {
            CmpOp::Eq => l == r,
            CmpOp::Ne => l != r,
            _ => false,
        },
        (Str(l), Str(r)) => match op {
            CmpOp::Eq => l == r,
            CmpOp::Ne => l != r,
            CmpOp::Contains => l.to_lowercase().contains(&r.to_lowercase()),
            CmpOp::StartsWith => l.starts_with(r.as_str()),
            _ => false,
        },
        (Int(_) | Float(_), Int(_) | Float(_)) => {
            let l = as_f64(left);
            let r = as_f64(right);
            match op {
                CmpOp::Eq => l == r,
                CmpOp::Ne => l != r,
                CmpOp::Lt => l < r,
                CmpOp::Le => l <= r,
                CmpOp::Gt => l > r,
                CmpOp::Ge => l >= r,
                _ => false,
            }
        }
        _ => false,
    }
}

fn as_f64(value: &PropertyValue) -> f64 {
    match value {
        PropertyValue::Int(i) => *i as f64,
        PropertyValue::Float(f) => *f,
        _ => 0.0,
    }
}
