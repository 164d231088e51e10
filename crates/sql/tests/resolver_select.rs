//! Resolution of SELECT commands: binding, qualification, typing

mod common;

use common::{TestFixture, select, select_command};
use weave_sql::ast::{
    Command, Direction, ElementBinding, Expression, FromClause, GroupBinding, GroupSymbol,
    Operator, QueryCommand, Select,
};
use weave_sql::metadata::TempMetadataType;
use weave_sql::types::{DataType, Value};
use weave_sql::{CommandContext, Determinism};

#[test]
fn resolves_and_fully_qualifies_bare_elements() {
    let fixture = TestFixture::new();
    let mut command = select_command(vec![Expression::element("color")], &["parts"]);
    fixture.resolve(&mut command).unwrap();

    let Command::Query(QueryCommand::Select(resolved)) = &command else {
        panic!("expected a select");
    };
    let Expression::Element(symbol) = &resolved.select[0].0 else {
        panic!("expected an element");
    };
    assert_eq!(symbol.qualified_name(), "parts.color");
    assert_eq!(symbol.data_type(), Some(DataType::String));
    assert!(matches!(
        symbol.binding(),
        Some(ElementBinding::Catalog { column: 2, .. })
    ));

    let Some(FromClause::Group(group)) = resolved.from.first() else {
        panic!("expected a group");
    };
    assert!(matches!(group.binding(), Some(GroupBinding::Catalog(t)) if t.name == "parts"));
}

#[test]
fn qualification_is_idempotent() {
    let fixture = TestFixture::new();
    let inner = QueryCommand::Select(Box::new(Select {
        select: vec![(Expression::element("qty"), Some("total".into()))],
        from: vec![FromClause::Group(GroupSymbol::new("orders"))],
        ..Select::default()
    }));
    let mut command = Command::select(Select {
        select: vec![(Expression::element("t.total"), None)],
        from: vec![FromClause::DerivedTable {
            query: Box::new(inner),
            group: GroupSymbol::new("t"),
        }],
        r#where: Some(
            Operator::GreaterThan(
                Box::new(Expression::element("t.total")),
                Box::new(Value::integer(10).into()),
            )
            .into(),
        ),
        ..Select::default()
    });

    fixture.resolve(&mut command).unwrap();
    let once = command.clone();

    // Resolving the already fully qualified tree is a fixed point.
    fixture.resolve(&mut command).unwrap();
    assert_eq!(command, once);
}

#[test]
fn star_expands_to_scope_elements_in_order() {
    let fixture = TestFixture::new();
    let mut command = select_command(vec![Expression::All], &["orders"]);
    fixture.resolve(&mut command).unwrap();

    let Command::Query(QueryCommand::Select(resolved)) = &command else {
        panic!("expected a select");
    };
    let names: Vec<String> = resolved.projected_names();
    assert_eq!(names, vec!["id", "part_id", "qty", "placed"]);
    assert!(
        resolved
            .select
            .iter()
            .all(|(expr, _)| matches!(expr, Expression::Element(s) if s.is_resolved()))
    );
}

#[test]
fn derived_table_binds_to_fresh_virtual_identity() {
    let fixture = TestFixture::new();
    let inner = QueryCommand::Select(Box::new(Select {
        select: vec![
            (Expression::element("id"), None),
            (Expression::element("qty"), Some("total".into())),
        ],
        from: vec![FromClause::Group(GroupSymbol::new("orders"))],
        ..Select::default()
    }));
    let mut command = Command::select(Select {
        select: vec![(Expression::element("t.total"), None)],
        from: vec![FromClause::DerivedTable {
            query: Box::new(inner),
            group: GroupSymbol::new("t"),
        }],
        ..Select::default()
    });

    let temp = fixture.resolve(&mut command).unwrap();

    // The alias registered a VIRTUAL identity whose elements mirror the
    // inner projection, in order.
    let id = temp.temp_group("t").unwrap();
    assert_eq!(id.metadata_type(), TempMetadataType::Virtual);
    let elements = id.elements();
    assert_eq!(elements.len(), 2);
    assert_eq!(elements[0].name(), "ID");
    assert_eq!(elements[1].name(), "TOTAL");
    assert_eq!(elements[0].position(), 1);
    assert_eq!(elements[1].position(), 2);
    assert_eq!(elements[1].value_type(), Some(DataType::Integer));
    assert!(id.query_definition().is_some());

    // And the reference through the alias picked up the element's type.
    let Command::Query(QueryCommand::Select(resolved)) = &command else {
        panic!("expected a select");
    };
    let Expression::Element(symbol) = &resolved.select[0].0 else {
        panic!("expected an element");
    };
    assert_eq!(symbol.data_type(), Some(DataType::Integer));
    assert!(matches!(symbol.binding(), Some(ElementBinding::Temp(_))));
}

#[test]
fn correlated_subquery_sees_outer_scope() {
    let fixture = TestFixture::new();
    let subquery = QueryCommand::Select(Box::new(Select {
        select: vec![(Expression::element("o.id"), None)],
        from: vec![FromClause::Group(GroupSymbol::aliased("o", "orders"))],
        r#where: Some(
            Operator::Equal(
                Box::new(Expression::element("o.part_id")),
                Box::new(Expression::element("parts.id")),
            )
            .into(),
        ),
        ..Select::default()
    }));
    let mut command = Command::select(Select {
        select: vec![(Expression::element("name"), None)],
        from: vec![FromClause::Group(GroupSymbol::new("parts"))],
        r#where: Some(Expression::ExistsSubquery(Box::new(subquery))),
        ..Select::default()
    });

    fixture.resolve(&mut command).unwrap();
}

#[test]
fn inner_scope_shadows_outer() {
    let fixture = TestFixture::new();
    // Bare `id` inside the subquery binds to the subquery's own group, not
    // the outer one, so this resolves without ambiguity.
    let subquery = QueryCommand::Select(Box::new(Select {
        select: vec![(Expression::element("id"), None)],
        from: vec![FromClause::Group(GroupSymbol::new("orders"))],
        ..Select::default()
    }));
    let mut command = Command::select(Select {
        select: vec![(Expression::element("parts.id"), None)],
        from: vec![FromClause::Group(GroupSymbol::new("parts"))],
        r#where: Some(Expression::InSubquery {
            expr: Box::new(Expression::element("parts.id")),
            query: Box::new(subquery),
            negated: false,
        }),
        ..Select::default()
    });

    fixture.resolve(&mut command).unwrap();
}

#[test]
fn join_predicates_resolve_in_scope() {
    let fixture = TestFixture::new();
    let mut command = Command::select(Select {
        select: vec![(Expression::element("parts.name"), None)],
        from: vec![FromClause::Join {
            left: Box::new(FromClause::Group(GroupSymbol::new("parts"))),
            right: Box::new(FromClause::Group(GroupSymbol::new("orders"))),
            join_type: weave_sql::ast::JoinType::Inner,
            predicate: Some(
                Operator::Equal(
                    Box::new(Expression::element("parts.id")),
                    Box::new(Expression::element("orders.part_id")),
                )
                .into(),
            ),
        }],
        ..Select::default()
    });

    fixture.resolve(&mut command).unwrap();
}

#[test]
fn function_overload_assigns_return_type() {
    let fixture = TestFixture::new();
    let mut command = select_command(
        vec![Expression::function(
            "ucase",
            vec![Expression::element("name")],
        )],
        &["parts"],
    );
    fixture.resolve(&mut command).unwrap();

    let Command::Query(QueryCommand::Select(resolved)) = &command else {
        panic!("expected a select");
    };
    let Expression::Function(call) = &resolved.select[0].0 else {
        panic!("expected a function");
    };
    assert_eq!(call.return_type, Some(DataType::String));
}

#[test]
fn arithmetic_widens_through_the_lattice() {
    let fixture = TestFixture::new();
    let sum: Expression = Operator::Add(
        Box::new(Expression::element("qty")),
        Box::new(Expression::Constant(Value::BigInt(1))),
    )
    .into();
    let mut command = select_command(vec![sum], &["orders"]);
    fixture.resolve(&mut command).unwrap();

    let Command::Query(QueryCommand::Select(resolved)) = &command else {
        panic!("expected a select");
    };
    assert_eq!(resolved.select[0].0.result_type(), Some(DataType::BigInt));
}

#[test]
fn nondeterministic_function_lowers_context_level() {
    let fixture = TestFixture::new();
    let mut context = CommandContext::new();
    let mut command = select_command(vec![Expression::function("rand", vec![])], &["parts"]);
    fixture
        .resolve_with_context(&mut command, &mut context)
        .unwrap();
    assert_eq!(context.determinism_level(), Determinism::Nondeterministic);
}

#[test]
fn deterministic_command_keeps_context_level() {
    let fixture = TestFixture::new();
    let mut context = CommandContext::new();
    let mut command = select_command(vec![Expression::element("name")], &["parts"]);
    fixture
        .resolve_with_context(&mut command, &mut context)
        .unwrap();
    assert_eq!(context.determinism_level(), Determinism::Deterministic);
}

#[test]
fn set_query_order_by_resolves_against_projection() {
    let fixture = TestFixture::new();
    let left = QueryCommand::Select(Box::new(select(
        vec![Expression::element("name")],
        &["parts"],
    )));
    let right = QueryCommand::Select(Box::new(select(
        vec![Expression::element("name")],
        &["suppliers"],
    )));
    let mut command = Command::set_query(weave_sql::ast::SetQuery {
        operation: weave_sql::ast::SetOperation::Union,
        all: false,
        left,
        right,
        order_by: vec![(Expression::element("name"), Direction::Asc)],
    });

    fixture.resolve(&mut command).unwrap();
}

#[test]
fn exec_binds_result_set_pseudo_group() {
    let fixture = TestFixture::new();
    let mut command = Command::exec("orders_by_part", vec![Value::integer(7).into()]);
    let temp = fixture.resolve(&mut command).unwrap();

    let Command::Exec(procedure) = &command else {
        panic!("expected an exec");
    };
    assert!(procedure.is_resolved());
    let group = procedure.result_group.as_ref().unwrap();
    assert!(matches!(group.binding(), Some(GroupBinding::Temp(_))));

    let id = temp.temp_group("orders_by_part").unwrap();
    assert_eq!(id.metadata_type(), TempMetadataType::Virtual);
    assert_eq!(id.elements().len(), 2);
}
