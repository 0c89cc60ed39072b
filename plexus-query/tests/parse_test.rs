//! Pattern grammar tests: segments, connections, filters, variable-length
//! suffixes, WHERE precedence, and syntax/compile failures.

use plexus_api::PropertyValue;
use plexus_query::ast::{CmpOp, Direction, FilterOp, Operand, ReturnExpr, WhereExpr};
use plexus_query::error::Error;
use plexus_query::{parse, prepare};

#[test]
fn parses_minimal_segment_chain() {
    let pattern = parse("person:Person-[:WORKS_FOR]->team:Team").unwrap();
    assert_eq!(pattern.segments.len(), 2);
    assert_eq!(pattern.connections.len(), 1);

    assert_eq!(pattern.segments[0].alias, "person");
    assert_eq!(pattern.segments[0].kind.as_deref(), Some("Person"));
    assert_eq!(pattern.segments[1].alias, "team");

    let conn = &pattern.connections[0];
    assert_eq!(conn.direction, Direction::Out);
    assert_eq!(conn.kinds, vec!["WORKS_FOR".to_string()]);
    assert!(conn.variable.is_none());
    assert!(conn.var_length.is_none());
}

#[test]
fn leading_match_keyword_is_optional() {
    let with = parse("MATCH a-[:T]->b").unwrap();
    let without = parse("a-[:T]->b").unwrap();
    assert_eq!(with, without);
}

#[test]
fn parses_backward_connection() {
    let pattern = parse("doc<-[:OWNS]-owner").unwrap();
    assert_eq!(pattern.connections[0].direction, Direction::In);
    assert_eq!(pattern.segments[0].alias, "doc");
    assert_eq!(pattern.segments[1].alias, "owner");
}

#[test]
fn parses_edge_variable_and_type_alternatives() {
    let pattern = parse("a-[r:KNOWS|LIKES]->b").unwrap();
    let conn = &pattern.connections[0];
    assert_eq!(conn.variable.as_deref(), Some("r"));
    assert_eq!(conn.kinds, vec!["KNOWS".to_string(), "LIKES".to_string()]);
}

#[test]
fn empty_brackets_mean_wildcard() {
    let pattern = parse("x-[]->other").unwrap();
    assert!(pattern.connections[0].kinds.is_empty());
}

#[test]
fn parses_property_filters() {
    let pattern = parse("n:Person{name='Alice', age=30, active=true, score=1.5}-[:T]->m").unwrap();
    let filters = &pattern.segments[0].filters;
    assert_eq!(filters.len(), 4);
    assert_eq!(filters[0].key, "name");
    assert_eq!(filters[0].op, FilterOp::Eq);
    assert_eq!(filters[0].value, PropertyValue::Str("Alice".into()));
    assert_eq!(filters[1].value, PropertyValue::Int(30));
    assert_eq!(filters[2].value, PropertyValue::Bool(true));
    assert_eq!(filters[3].value, PropertyValue::Float(1.5));
}

#[test]
fn filter_values_respect_quoted_commas_and_colon_op() {
    let pattern = parse("n{title:'a, b', city~\"york\"}").unwrap();
    let filters = &pattern.segments[0].filters;
    assert_eq!(filters[0].op, FilterOp::Eq);
    assert_eq!(filters[0].value, PropertyValue::Str("a, b".into()));
    assert_eq!(filters[1].op, FilterOp::ContainsCi);
}

#[test]
fn parses_variable_length_suffix_forms() {
    let bounds = |input: &str| {
        let pattern = parse(input).unwrap();
        pattern.connections[0].var_length.unwrap()
    };

    let open = bounds("a-[:T*]->b");
    assert_eq!((open.min, open.max), (None, None));

    let exact = bounds("a-[:T*3]->b");
    assert_eq!((exact.min, exact.max), (Some(3), Some(3)));

    let from = bounds("a-[:T*2..]->b");
    assert_eq!((from.min, from.max), (Some(2), None));

    let to = bounds("a-[:T*..4]->b");
    assert_eq!((to.min, to.max), (None, Some(4)));

    let range = bounds("a-[:T*1..5]->b");
    assert_eq!((range.min, range.max), (Some(1), Some(5)));
}

#[test]
fn parses_where_with_precedence_and_parens() {
    let pattern =
        parse("a-[:T]->b WHERE a.x = 1 AND b.y = 2 OR a.z = 3").unwrap();
    // OR binds loosest: Or[And[x, y], z]
    let Some(WhereExpr::Or(terms)) = pattern.where_clause else {
        panic!("expected OR at the root");
    };
    assert_eq!(terms.len(), 2);
    assert!(matches!(terms[0], WhereExpr::And(_)));
    assert!(matches!(terms[1], WhereExpr::Cmp(_)));

    let grouped = parse("a-[:T]->b WHERE a.x = 1 AND (b.y = 2 OR a.z = 3)").unwrap();
    let Some(WhereExpr::And(terms)) = grouped.where_clause else {
        panic!("expected AND at the root");
    };
    assert!(matches!(terms[1], WhereExpr::Or(_)));
}

#[test]
fn parses_type_function_and_operators() {
    let pattern = parse("a-[r:T]->b WHERE type(r) = 'T' AND a.name STARTS WITH 'Al'").unwrap();
    let Some(WhereExpr::And(terms)) = pattern.where_clause else {
        panic!("expected AND");
    };
    let WhereExpr::Cmp(first) = &terms[0] else {
        panic!("expected comparison");
    };
    assert_eq!(first.left, Operand::EdgeKind("r".into()));
    let WhereExpr::Cmp(second) = &terms[1] else {
        panic!("expected comparison");
    };
    assert_eq!(second.op, CmpOp::StartsWith);
}

#[test]
fn parses_return_items_with_aliases() {
    let pattern = parse("a-[r:T]->b RETURN a, r.strength AS s, b.name").unwrap();
    let items = pattern.return_items.unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].expr, ReturnExpr::Variable("a".into()));
    assert_eq!(items[0].column(), "a");
    assert_eq!(items[1].alias.as_deref(), Some("s"));
    assert_eq!(items[1].column(), "s");
    assert_eq!(items[2].column(), "b.name");
}

#[test]
fn syntax_errors_carry_positions() {
    let err = parse("a-[:T->b").unwrap_err();
    match err {
        Error::Syntax { line, column, .. } => {
            assert_eq!(line, 1);
            assert!(column > 1);
        }
        other => panic!("expected syntax error, got {other:?}"),
    }

    assert!(matches!(
        parse("a-[:T]->b WHERE a.x ="),
        Err(Error::Syntax { .. })
    ));
    assert!(matches!(parse("a{open='x'"), Err(Error::Syntax { .. })));
    assert!(matches!(parse("a-[:T]->"), Err(Error::Syntax { .. })));
    assert!(matches!(parse("a-[:T]->b RETURN"), Err(Error::Syntax { .. })));
}

#[test]
fn unterminated_string_is_a_syntax_error() {
    assert!(matches!(
        parse("n{name='Alice}"),
        Err(Error::Syntax { .. })
    ));
}

#[test]
fn empty_pattern_parses_to_nothing() {
    let pattern = parse("").unwrap();
    assert!(pattern.segments.is_empty());
    let pattern = parse("MATCH").unwrap();
    assert!(pattern.segments.is_empty());
}

#[test]
fn compile_rejects_filters_on_variable_length() {
    let err = prepare("a-[:T*1..3{w=1}]->b").unwrap_err();
    assert!(matches!(err, Error::Plan(_)));
}

#[test]
fn compile_rejects_duplicate_aliases() {
    assert!(matches!(prepare("a-[:T]->a"), Err(Error::Plan(_))));
    assert!(matches!(prepare("a-[a:T]->b"), Err(Error::Plan(_))));
}

#[test]
fn compile_rejects_inverted_hop_range() {
    assert!(matches!(prepare("a-[:T*3..1]->b"), Err(Error::Plan(_))));
}

#[test]
fn compile_normalizes_hop_defaults() {
    let prepared = prepare("a-[:T*]->b").unwrap();
    let hops = prepared.plan().connections[0].hops.unwrap();
    assert_eq!(hops.min, 1);
    assert_eq!(hops.max, plexus_query::DEFAULT_MAX_HOPS);
}
