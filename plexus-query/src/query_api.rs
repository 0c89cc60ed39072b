use crate::error::{Error, Result};
use crate::executor::{Executor, Row, Tracer, Value};
use crate::parser::Parser;
use crate::paths::{PathMatch, reconstruct};
use crate::plan::{Plan, compile};
use crate::project;
use plexus_api::GraphSource;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Options for one match call.
///
/// `start_id` and `start_ids` are mutually exclusive; setting both is a
/// usage error. `start_kind` additionally restricts which start ids may
/// seed the traversal. A start id absent from the graph is not an error,
/// it simply contributes no rows.
#[derive(Debug, Clone, Default)]
pub struct MatchOptions {
    pub start_id: Option<String>,
    pub start_ids: Option<Vec<String>>,
    pub start_kind: Option<String>,
}

impl MatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_id(mut self, id: impl Into<String>) -> Self {
        self.start_id = Some(id.into());
        self
    }

    pub fn with_start_ids(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.start_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_start_kind(mut self, kind: impl Into<String>) -> Self {
        self.start_kind = Some(kind.into());
        self
    }

    fn start_list(&self) -> Result<Option<Vec<String>>> {
        match (&self.start_id, &self.start_ids) {
            (Some(_), Some(_)) => Err(Error::Usage(
                "pass either a single start id or a start id list, not both".into(),
            )),
            (Some(id), None) => Ok(Some(vec![id.clone()])),
            (None, Some(ids)) => Ok(Some(ids.clone())),
            (None, None) => Ok(None),
        }
    }
}

/// A parsed and compiled pattern, executable any number of times.
///
/// Created by [`prepare()`]. Each execution allocates its own trace store,
/// so one prepared pattern may serve sequential calls freely.
#[derive(Debug, Clone)]
pub struct PreparedPattern {
    plan: Plan,
}

impl PreparedPattern {
    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    /// Row-wise match: one map per surviving row. RETURN projection applies
    /// when present, otherwise every visible binding is a column.
    pub fn rows<S: GraphSource>(
        &self,
        source: &S,
        options: &MatchOptions,
    ) -> Result<Vec<BTreeMap<String, Value>>> {
        if let Some(items) = &self.plan.return_items {
            project::validate(items, &self.plan)?;
        }
        let (rows, tracer) = self.execute(source, options)?;
        let out = rows
            .iter()
            .map(|row| match &self.plan.return_items {
                Some(items) => project::project_row(items, row, source, &self.plan, &tracer),
                None => project::visible_row(row, &self.plan, &tracer),
            })
            .collect();
        Ok(out)
    }

    /// Grouped match: output column to de-duplicated values, discovery
    /// order preserved.
    pub fn groups<S: GraphSource>(
        &self,
        source: &S,
        options: &MatchOptions,
    ) -> Result<BTreeMap<String, Vec<Value>>> {
        let mut out: BTreeMap<String, Vec<Value>> = BTreeMap::new();
        for row in self.rows(source, options)? {
            for (column, value) in row {
                let values = out.entry(column).or_default();
                if !values.contains(&value) {
                    values.push(value);
                }
            }
        }
        Ok(out)
    }

    /// Path match: each surviving row rebuilt as node bindings plus its
    /// ordered concrete edge sequence.
    pub fn paths<S: GraphSource>(
        &self,
        source: &S,
        options: &MatchOptions,
    ) -> Result<Vec<PathMatch>> {
        let (rows, tracer) = self.execute(source, options)?;
        Ok(rows
            .iter()
            .filter_map(|row| reconstruct(&self.plan, row, &tracer, source))
            .collect())
    }

    /// Render the compiled plan as an indented tree. No execution.
    pub fn explain(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Pattern");
        for (index, segment) in self.plan.segments.iter().enumerate() {
            let kind = segment.kind.as_deref().unwrap_or("*");
            let _ = writeln!(
                out,
                "  Segment({}:{kind}, filters={})",
                segment.alias,
                segment.filters.len()
            );
            if let Some(conn) = self.plan.connections.get(index) {
                let arrow = match conn.direction {
                    crate::ast::Direction::Out => "->",
                    crate::ast::Direction::In => "<-",
                };
                let kinds = if conn.kinds.is_empty() {
                    "*".to_string()
                } else {
                    conn.kinds.join("|")
                };
                let hops = match conn.hops {
                    Some(range) => format!(", hops={}..{}", range.min, range.max),
                    None => String::new(),
                };
                let variable = match &conn.variable {
                    Some(v) => format!(", var={v}"),
                    None => String::new(),
                };
                let _ = writeln!(out, "  Connection({arrow} {kinds}{variable}{hops})");
            }
        }
        if self.plan.where_clause.is_some() {
            let _ = writeln!(out, "  Filter(where)");
        }
        if let Some(items) = &self.plan.return_items {
            let columns: Vec<String> = items.iter().map(|item| item.column()).collect();
            let _ = writeln!(out, "  Project({})", columns.join(", "));
        }
        out.trim_end().to_string()
    }

    fn execute<S: GraphSource>(
        &self,
        source: &S,
        options: &MatchOptions,
    ) -> Result<(Vec<Row>, Tracer)> {
        let starts = options.start_list()?;
        let mut executor = Executor::new(source, &self.plan);
        let rows = executor.run(starts.as_deref(), options.start_kind.as_deref())?;
        Ok((rows, executor.into_tracer()))
    }
}

/// Parse and compile a pattern for repeated execution.
pub fn prepare(pattern: &str) -> Result<PreparedPattern> {
    let ast = Parser::parse(pattern)?;
    Ok(PreparedPattern {
        plan: compile(ast)?,
    })
}

/// One-shot row-wise match.
pub fn match_rows<S: GraphSource>(
    source: &S,
    pattern: &str,
    options: &MatchOptions,
) -> Result<Vec<BTreeMap<String, Value>>> {
    prepare(pattern)?.rows(source, options)
}

/// One-shot grouped match.
pub fn match_groups<S: GraphSource>(
    source: &S,
    pattern: &str,
    options: &MatchOptions,
) -> Result<BTreeMap<String, Vec<Value>>> {
    prepare(pattern)?.groups(source, options)
}

/// One-shot path match.
pub fn match_paths<S: GraphSource>(
    source: &S,
    pattern: &str,
    options: &MatchOptions,
) -> Result<Vec<PathMatch>> {
    prepare(pattern)?.paths(source, options)
}

/// Row-wise match across several patterns: results are concatenated in
/// pattern order and de-duplicated by row signature. The first failing
/// pattern aborts the whole call.
pub fn match_rows_many<S: GraphSource>(
    source: &S,
    patterns: &[impl AsRef<str>],
    options: &MatchOptions,
) -> Result<Vec<BTreeMap<String, Value>>> {
    let mut out: Vec<BTreeMap<String, Value>> = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for pattern in patterns {
        for row in match_rows(source, pattern.as_ref(), options)? {
            if seen.insert(row_signature(&row)) {
                out.push(row);
            }
        }
    }
    Ok(out)
}

/// Grouped match across several patterns: group maps are merged with
/// value de-duplication. The first failing pattern aborts the whole call.
pub fn match_groups_many<S: GraphSource>(
    source: &S,
    patterns: &[impl AsRef<str>],
    options: &MatchOptions,
) -> Result<BTreeMap<String, Vec<Value>>> {
    let mut out: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    for pattern in patterns {
        for (column, values) in match_groups(source, pattern.as_ref(), options)? {
            let merged = out.entry(column).or_default();
            for value in values {
                if !merged.contains(&value) {
                    merged.push(value);
                }
            }
        }
    }
    Ok(out)
}

/// Path match across several patterns: concatenation with exact-duplicate
/// removal. The first failing pattern aborts the whole call.
pub fn match_paths_many<S: GraphSource>(
    source: &S,
    patterns: &[impl AsRef<str>],
    options: &MatchOptions,
) -> Result<Vec<PathMatch>> {
    let mut out: Vec<PathMatch> = Vec::new();
    for pattern in patterns {
        for path in match_paths(source, pattern.as_ref(), options)? {
            if !out.contains(&path) {
                out.push(path);
            }
        }
    }
    Ok(out)
}

fn row_signature(row: &BTreeMap<String, Value>) -> String {
    // BTreeMap keys iterate sorted, so the debug form is canonical.
    format!("{row:?}")
}
