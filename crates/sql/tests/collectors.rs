//! Collectors driven over resolved commands

mod common;

use common::{TestFixture, select};
use weave_sql::ast::{Command, Expression, FromClause, GroupSymbol, Operator, QueryCommand, Select};
use weave_sql::collect::{elements, functions, groups, predicates, references, subqueries};
use weave_sql::types::Value;

fn order_report_command() -> Command {
    let view = QueryCommand::Select(Box::new(select(
        vec![Expression::element("part_id"), Expression::element("qty")],
        &["orders"],
    )));
    Command::select(Select {
        select: vec![
            (Expression::element("v.part_id"), None),
            (
                Expression::function("greatest", vec![Expression::element("v.qty")]),
                None,
            ),
        ],
        from: vec![FromClause::DerivedTable {
            query: Box::new(view),
            group: GroupSymbol::new("v"),
        }],
        r#where: Some(
            Operator::And(
                Box::new(
                    Operator::GreaterThan(
                        Box::new(Expression::element("v.qty")),
                        Box::new(Expression::Reference(0)),
                    )
                    .into(),
                ),
                Box::new(
                    Operator::InList {
                        expr: Box::new(Expression::element("v.part_id")),
                        list: vec![Value::integer(1).into(), Value::integer(2).into()],
                        negated: false,
                    }
                    .into(),
                ),
            )
            .into(),
        ),
        ..Select::default()
    })
}

#[test]
fn collectors_agree_before_and_after_resolution() {
    let fixture = TestFixture::new();
    let mut command = order_report_command();

    let groups_before = groups::collect(&command, true);
    fixture.resolve(&mut command).unwrap();
    let groups_after = groups::collect(&command, true);

    // Resolution attaches bindings but the collected structure is the same.
    assert_eq!(groups_before, groups_after);
    assert_eq!(groups_after.len(), 2); // v and orders
}

#[test]
fn group_collection_respects_inline_view_flag() {
    let command = order_report_command();
    let shallow = groups::collect_ignore_inline_views(&command, true);
    assert_eq!(shallow, vec![GroupSymbol::new("v")]);
}

#[test]
fn element_collection_spans_scopes() {
    let command = order_report_command();
    let all = elements::collect(&command, true);
    // v.part_id, v.qty (outer), part_id, qty (inner view body).
    assert_eq!(all.len(), 4);
}

#[test]
fn function_predicate_reference_and_subquery_collection() {
    let command = order_report_command();

    let calls = functions::collect(&command, false, None);
    assert_eq!(calls.len(), 1);
    assert!(calls[0].name.eq_ignore_ascii_case("greatest"));

    let criteria = predicates::collect(&command, false);
    assert_eq!(criteria.len(), 2); // the comparison and the IN list

    assert_eq!(references::collect(&command), vec![0]);

    assert_eq!(subqueries::collect(&command).len(), 1); // the inline view body
}
