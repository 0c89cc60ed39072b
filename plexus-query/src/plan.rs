use crate::ast::{
    Connection, Direction, Pattern, PropertyFilter, ReturnItem, Segment, WhereExpr,
};
use crate::error::{Error, Result};
use std::collections::HashSet;

/// Hop cap applied when a variable-length connection leaves its upper bound
/// open (`*`, `*N..`). The only guard against unbounded cyclic exploration.
pub const DEFAULT_MAX_HOPS: u32 = 10;

/// A compiled pattern: the segment/connection lists in execution order plus
/// the optional WHERE tree and RETURN projection. Built once per pattern
/// string, immutable afterwards.
#[derive(Debug, Clone)]
pub struct Plan {
    pub segments: Vec<SegmentStep>,
    pub connections: Vec<ConnectionStep>,
    pub where_clause: Option<WhereExpr>,
    pub return_items: Option<Vec<ReturnItem>>,
}

#[derive(Debug, Clone)]
pub struct SegmentStep {
    pub alias: String,
    pub kind: Option<String>,
    pub filters: Vec<PropertyFilter>,
}

#[derive(Debug, Clone)]
pub struct ConnectionStep {
    pub direction: Direction,
    pub kinds: Vec<String>,
    pub variable: Option<String>,
    /// Present on variable-length connections; bounds are normalized.
    pub hops: Option<HopRange>,
    /// Edge property constraints, checked against the edge's true
    /// (src, kind, dst) orientation. Fixed-length connections only.
    pub filters: Vec<PropertyFilter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HopRange {
    pub min: u32,
    pub max: u32,
}

impl Plan {
    /// All variables a RETURN item may reference: segment aliases plus
    /// edge variables.
    pub fn known_variables(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.segments.iter().map(|s| s.alias.as_str()).collect();
        for conn in &self.connections {
            if let Some(var) = &conn.variable {
                out.push(var);
            }
        }
        out
    }

    /// Segment index an alias is bound at, if any.
    pub fn segment_index(&self, alias: &str) -> Option<usize> {
        self.segments.iter().position(|s| s.alias == alias)
    }

    /// Connection index owning an edge variable, if any.
    pub fn connection_index(&self, variable: &str) -> Option<usize> {
        self.connections
            .iter()
            .position(|c| c.variable.as_deref() == Some(variable))
    }
}

/// Compile a parsed pattern into an executable plan.
///
/// Fails fast on constructs the executor does not support: property filters
/// on variable-length connections, duplicate aliases, and inverted hop
/// ranges. Never fails on "no match" conditions.
pub fn compile(pattern: Pattern) -> Result<Plan> {
    let Pattern {
        segments,
        connections,
        where_clause,
        return_items,
    } = pattern;

    let mut seen = HashSet::new();
    for segment in &segments {
        if !seen.insert(segment.alias.as_str()) {
            return Err(Error::Plan(format!(
                "alias '{}' is bound more than once",
                segment.alias
            )));
        }
    }
    for connection in &connections {
        if let Some(var) = &connection.variable
            && !seen.insert(var.as_str())
        {
            return Err(Error::Plan(format!(
                "edge variable '{var}' collides with another binding"
            )));
        }
    }

    let connections = connections
        .into_iter()
        .map(compile_connection)
        .collect::<Result<Vec<_>>>()?;

    let segments = segments.into_iter().map(compile_segment).collect();

    Ok(Plan {
        segments,
        connections,
        where_clause,
        return_items,
    })
}

fn compile_segment(segment: Segment) -> SegmentStep {
    SegmentStep {
        alias: segment.alias,
        kind: segment.kind,
        filters: segment.filters,
    }
}

fn compile_connection(connection: Connection) -> Result<ConnectionStep> {
    let Connection {
        direction,
        kinds,
        variable,
        var_length,
        filters,
    } = connection;

    let hops = match var_length {
        Some(spec) => {
            if !filters.is_empty() {
                return Err(Error::Plan(
                    "property filters on variable-length connections are not supported".into(),
                ));
            }
            let min = spec.min.unwrap_or(1);
            let max = spec.max.unwrap_or(DEFAULT_MAX_HOPS);
            if max < min {
                return Err(Error::Plan(format!(
                    "invalid hop range: *{min}..{max}"
                )));
            }
            Some(HopRange { min, max })
        }
        None => None,
    };

    Ok(ConnectionStep {
        direction,
        kinds,
        variable,
        hops,
        filters,
    })
}
