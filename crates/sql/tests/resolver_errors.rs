//! Resolution failure modes

mod common;

use common::{TestFixture, select_command};
use std::sync::Arc;
use weave_sql::ast::{Command, Expression, FromClause, GroupSymbol, InsertSource, Select};
use weave_sql::dialect::{Dialect, DialectVersion};
use weave_sql::metadata::{MetadataStore, ProcedureMetadata, TableMetadata};
use weave_sql::types::{DataType, Value};
use weave_sql::{CommandContext, Error, Resolver};

#[test]
fn unresolved_group_names_the_group() {
    let fixture = TestFixture::new();
    let mut command = select_command(vec![Expression::element("x")], &["NoSuchTable"]);
    let err = fixture.resolve(&mut command).unwrap_err();
    assert_eq!(err, Error::UnresolvedGroup("NoSuchTable".into()));
}

#[test]
fn unresolved_element_names_the_element() {
    let fixture = TestFixture::new();
    let mut command = select_command(vec![Expression::element("nope")], &["parts"]);
    let err = fixture.resolve(&mut command).unwrap_err();
    assert_eq!(err, Error::UnresolvedElement("nope".into()));
}

#[test]
fn ambiguous_element_lists_all_candidate_groups() {
    let fixture = TestFixture::new();
    // Both parts and suppliers declare `name`.
    let mut command = select_command(vec![Expression::element("name")], &["parts", "suppliers"]);
    let err = fixture.resolve(&mut command).unwrap_err();
    match err {
        Error::AmbiguousElement { name, groups } => {
            assert_eq!(name, "name");
            assert_eq!(groups, vec!["parts".to_string(), "suppliers".to_string()]);
        }
        other => panic!("expected an ambiguity error, got {:?}", other),
    }
}

#[test]
fn unknown_qualifier_is_an_unresolved_group() {
    let fixture = TestFixture::new();
    let mut command = select_command(vec![Expression::element("zz.name")], &["parts"]);
    let err = fixture.resolve(&mut command).unwrap_err();
    assert_eq!(err, Error::UnresolvedGroup("zz".into()));
}

#[test]
fn duplicate_scope_names_are_rejected() {
    let fixture = TestFixture::new();
    let mut command = select_command(vec![Expression::element("id")], &["parts", "parts"]);
    let err = fixture.resolve(&mut command).unwrap_err();
    assert_eq!(err, Error::DuplicateGroup("parts".into()));
}

#[test]
fn unresolved_function_reports_signature() {
    let fixture = TestFixture::new();
    let mut command = select_command(
        vec![Expression::function(
            "length",
            vec![Expression::element("placed")],
        )],
        &["orders"],
    );
    let err = fixture.resolve(&mut command).unwrap_err();
    match err {
        Error::UnresolvedFunction { name, arg_types } => {
            assert_eq!(name, "length");
            assert_eq!(arg_types, "timestamp");
        }
        other => panic!("expected an unresolved function, got {:?}", other),
    }
}

#[test]
fn merge_requires_dialect_v2() {
    let fixture = TestFixture::new().with_dialect(Dialect::new(DialectVersion::V1));
    let mut command = Command::merge(
        GroupSymbol::new("parts"),
        vec![],
        InsertSource::Values(vec![vec![Value::integer(1).into()]]),
    );
    let err = fixture.resolve(&mut command).unwrap_err();
    assert!(matches!(err, Error::UnsupportedConstruct { .. }));

    // The same command resolves at V2.
    let fixture = TestFixture::new();
    let mut command = Command::merge(
        GroupSymbol::new("parts"),
        vec![weave_sql::ast::ElementSymbol::parse("id")],
        InsertSource::Values(vec![vec![Value::integer(1).into()]]),
    );
    fixture.resolve(&mut command).unwrap();
}

#[test]
fn variadic_invocation_requires_dialect_v2() {
    let fixture = TestFixture::new().with_dialect(Dialect::new(DialectVersion::V1));
    let mut command = select_command(
        vec![Expression::function(
            "greatest",
            vec![
                Expression::element("id"),
                Expression::element("part_id"),
                Expression::element("qty"),
            ],
        )],
        &["orders"],
    );
    let err = fixture.resolve(&mut command).unwrap_err();
    assert!(matches!(err, Error::UnsupportedConstruct { .. }));
}

#[test]
fn update_type_mismatch_is_fatal() {
    let fixture = TestFixture::new();
    let mut command = Command::update(
        GroupSymbol::new("orders"),
        vec![(
            weave_sql::ast::ElementSymbol::parse("qty"),
            Value::string("many").into(),
        )],
        None,
    );
    let err = fixture.resolve(&mut command).unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }));
}

#[test]
fn exec_of_unknown_procedure_fails() {
    let fixture = TestFixture::new();
    let mut command = Command::exec("no_such_proc", vec![]);
    let err = fixture.resolve(&mut command).unwrap_err();
    assert_eq!(err, Error::UnresolvedProcedure("no_such_proc".into()));
}

#[test]
fn exec_argument_arity_is_checked() {
    let fixture = TestFixture::new();
    let mut command = Command::exec("orders_by_part", vec![]);
    let err = fixture.resolve(&mut command).unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }));
}

/// A store whose lookups fail outright, as opposed to returning "not
/// found": the two must stay distinguishable.
struct UnavailableStore;

impl MetadataStore for UnavailableStore {
    fn group(&self, _name: &str) -> weave_sql::Result<Option<Arc<TableMetadata>>> {
        Err(Error::MetadataUnavailable("catalog offline".into()))
    }

    fn procedure(&self, _name: &str) -> weave_sql::Result<Option<Arc<ProcedureMetadata>>> {
        Err(Error::MetadataUnavailable("catalog offline".into()))
    }
}

#[test]
fn metadata_unavailable_is_not_not_found() {
    let library = weave_sql::functions::FunctionLibrary::with_builtins();
    let resolver = Resolver::new(&UnavailableStore, &library, Dialect::default());
    let mut context = CommandContext::new();
    let mut command = select_command(vec![Expression::element("id")], &["parts"]);

    let err = resolver.resolve(&mut command, &mut context).unwrap_err();
    assert_eq!(err, Error::MetadataUnavailable("catalog offline".into()));
}

#[test]
fn no_partial_state_is_published_on_failure() {
    let fixture = TestFixture::new();
    // The derived table resolves first, then the unknown element fails the
    // pass; the caller sees only the error, and the pristine original can
    // be retried.
    let inner = weave_sql::ast::QueryCommand::Select(Box::new(Select {
        select: vec![(Expression::element("qty"), None)],
        from: vec![FromClause::Group(GroupSymbol::new("orders"))],
        ..Select::default()
    }));
    let pristine = Command::select(Select {
        select: vec![(Expression::element("t.nope"), None)],
        from: vec![FromClause::DerivedTable {
            query: Box::new(inner),
            group: GroupSymbol::new("t"),
        }],
        ..Select::default()
    });

    let mut command = pristine.clone();
    assert!(fixture.resolve(&mut command).is_err());

    // Retrying from the untouched original still fails identically rather
    // than observing leftovers from the abandoned attempt.
    let mut retry = pristine.clone();
    let err = fixture.resolve(&mut retry).unwrap_err();
    assert_eq!(err, Error::UnresolvedElement("t.nope".into()));
}
