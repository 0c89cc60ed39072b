use plexus_api::PropertyValue;
use serde::{Deserialize, Serialize};

/// A parsed pattern: segments joined by connections, with optional WHERE
/// and RETURN clauses. `segments.len() == connections.len() + 1`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pattern {
    pub segments: Vec<Segment>,
    pub connections: Vec<Connection>,
    pub where_clause: Option<WhereExpr>,
    pub return_items: Option<Vec<ReturnItem>>,
}

/// One node occurrence: `alias[:Kind]{filters}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Segment {
    pub alias: String,
    pub kind: Option<String>,
    pub filters: Vec<PropertyFilter>,
}

/// One edge occurrence joining two adjacent segments.
///
/// `kinds` empty means wildcard (any edge kind present on the node);
/// multiple kinds are OR-matched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Connection {
    pub direction: Direction,
    pub kinds: Vec<String>,
    pub variable: Option<String>,
    pub var_length: Option<VarLength>,
    pub filters: Vec<PropertyFilter>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Direction {
    /// `-[...]->`: left segment is the edge source.
    Out,
    /// `<-[...]-`: left segment is the edge destination.
    In,
}

/// Hop bounds of a `*[min][..max]` suffix; unset fields take the
/// compiler's defaults (min 1, max the hop cap).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct VarLength {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

/// Inline `{key(=|:|~)value}` constraint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyFilter {
    pub key: String,
    pub op: FilterOp,
    pub value: PropertyValue,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FilterOp {
    /// `=` or `:` — equality.
    Eq,
    /// `~` — case-insensitive substring containment.
    ContainsCi,
}

/// WHERE tree with Or(And(Primary)) precedence; parenthesised groups
/// recurse, so no dedicated node is needed for them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum WhereExpr {
    Or(Vec<WhereExpr>),
    And(Vec<WhereExpr>),
    Cmp(Comparison),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comparison {
    pub left: Operand,
    pub op: CmpOp,
    pub right: Operand,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Operand {
    Literal(PropertyValue),
    /// `var.prop`
    Property { variable: String, key: String },
    /// `type(edgeVar)`
    EdgeKind(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Contains,
    StartsWith,
}

/// One RETURN item; the output column is `alias` when given, otherwise a
/// name derived from the expression.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReturnItem {
    pub expr: ReturnExpr,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ReturnExpr {
    Variable(String),
    Property { variable: String, key: String },
}

impl ReturnItem {
    /// Output column name: the explicit alias, or `var` / `var.prop`.
    pub fn column(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        match &self.expr {
            ReturnExpr::Variable(v) => v.clone(),
            ReturnExpr::Property { variable, key } => format!("{variable}.{key}"),
        }
    }
}
