//! Common test utilities for front-end integration tests
#![allow(dead_code)]

use weave_sql::ast::{Command, Expression, FromClause, GroupSymbol, Select};
use weave_sql::functions::FunctionLibrary;
use weave_sql::metadata::{
    Catalog, ColumnMetadata, ParamDirection, ProcedureMetadata, TableMetadata, TempMetadataStore,
};
use weave_sql::types::DataType;
use weave_sql::{CommandContext, Dialect, Resolver, Result};

/// A catalog, function library and dialect for driving the resolver.
pub struct TestFixture {
    pub catalog: Catalog,
    pub library: FunctionLibrary,
    pub dialect: Dialect,
}

impl TestFixture {
    /// Catalog fixture: `parts` and `suppliers` both declare a `name`
    /// column, which makes bare `name` references ambiguous across the two.
    pub fn new() -> Self {
        let mut catalog = Catalog::new();
        catalog.add_table(
            TableMetadata::new(
                "parts",
                vec![
                    ColumnMetadata::new("id", DataType::Integer).nullable(false),
                    ColumnMetadata::new("name", DataType::String),
                    ColumnMetadata::new("color", DataType::String),
                    ColumnMetadata::new("weight", DataType::Double),
                ],
            )
            .with_primary_key(vec!["id".into()])
            .with_cardinality(1000),
        );
        catalog.add_table(
            TableMetadata::new(
                "orders",
                vec![
                    ColumnMetadata::new("id", DataType::Integer).nullable(false),
                    ColumnMetadata::new("part_id", DataType::Integer),
                    ColumnMetadata::new("qty", DataType::Integer),
                    ColumnMetadata::new("placed", DataType::Timestamp),
                ],
            )
            .with_primary_key(vec!["id".into()]),
        );
        catalog.add_table(TableMetadata::new(
            "suppliers",
            vec![
                ColumnMetadata::new("id", DataType::Integer).nullable(false),
                ColumnMetadata::new("name", DataType::String),
            ],
        ));
        catalog.add_procedure(
            ProcedureMetadata::new("orders_by_part")
                .with_param("part_id", DataType::Integer, ParamDirection::In)
                .with_result_set(vec![
                    ColumnMetadata::new("id", DataType::Integer),
                    ColumnMetadata::new("qty", DataType::Integer),
                ]),
        );

        Self {
            catalog,
            library: FunctionLibrary::with_builtins(),
            dialect: Dialect::default(),
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Resolve with a throwaway context.
    pub fn resolve(&self, command: &mut Command) -> Result<TempMetadataStore> {
        let mut context = CommandContext::new();
        self.resolve_with_context(command, &mut context)
    }

    pub fn resolve_with_context(
        &self,
        command: &mut Command,
        context: &mut CommandContext,
    ) -> Result<TempMetadataStore> {
        let resolver = Resolver::new(&self.catalog, &self.library, self.dialect);
        resolver.resolve(command, context)
    }
}

/// `SELECT <projection> FROM <groups>`.
pub fn select(projection: Vec<Expression>, groups: &[&str]) -> Select {
    Select {
        select: projection.into_iter().map(|expr| (expr, None)).collect(),
        from: groups
            .iter()
            .map(|name| FromClause::Group(GroupSymbol::new(*name)))
            .collect(),
        ..Select::default()
    }
}

/// `SELECT <projection> FROM <groups>` as a command.
pub fn select_command(projection: Vec<Expression>, groups: &[&str]) -> Command {
    Command::select(select(projection, groups))
}
