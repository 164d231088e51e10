//! Command structures: queries, DML and procedure invocation

use super::common::{Direction, FromClause};
use super::expressions::Expression;
use super::symbols::{ElementSymbol, GroupSymbol};
use crate::metadata::ProcedureMetadata;
use crate::types::DataType;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A query-shaped command: a plain SELECT or a set operation over two of
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryCommand {
    Select(Box<Select>),
    SetQuery(Box<SetQuery>),
}

impl QueryCommand {
    /// Output column names, in projection order. An alias wins; a bare
    /// element contributes its short name; anything else gets a positional
    /// name.
    pub fn projected_names(&self) -> Vec<String> {
        match self {
            QueryCommand::Select(select) => select.projected_names(),
            QueryCommand::SetQuery(set_query) => set_query.left.projected_names(),
        }
    }

    /// Output column types, in projection order. `None` where unresolved.
    pub fn projected_types(&self) -> Vec<Option<DataType>> {
        match self {
            QueryCommand::Select(select) => select.projected_types(),
            QueryCommand::SetQuery(set_query) => set_query.left.projected_types(),
        }
    }
}

/// SELECT statement structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Select {
    /// Whether to deduplicate result rows.
    pub distinct: bool,
    /// Expressions to select, each with an optional output alias.
    pub select: Vec<(Expression, Option<String>)>,
    /// FROM items.
    pub from: Vec<FromClause>,
    /// WHERE criteria.
    pub r#where: Option<Expression>,
    /// GROUP BY expressions.
    pub group_by: Vec<Expression>,
    /// HAVING criteria.
    pub having: Option<Expression>,
    /// ORDER BY expressions with direction.
    pub order_by: Vec<(Expression, Direction)>,
    /// LIMIT row count.
    pub limit: Option<Expression>,
    /// OFFSET row count.
    pub offset: Option<Expression>,
}

impl Select {
    pub fn projected_names(&self) -> Vec<String> {
        self.select
            .iter()
            .enumerate()
            .map(|(index, (expr, alias))| match (alias, expr) {
                (Some(alias), _) => alias.clone(),
                (None, Expression::Element(symbol)) => symbol.short_name().to_string(),
                _ => format!("expr{}", index + 1),
            })
            .collect()
    }

    pub fn projected_types(&self) -> Vec<Option<DataType>> {
        self.select
            .iter()
            .map(|(expr, _)| expr.result_type())
            .collect()
    }

    /// Mutable access to this SELECT's own clause expressions, in clause
    /// order: projections, FROM join predicates, WHERE, GROUP BY, HAVING,
    /// ORDER BY, LIMIT, and OFFSET.
    pub fn expressions_mut(&mut self) -> Vec<&mut Expression> {
        let mut out = Vec::new();
        out.extend(self.select.iter_mut().map(|(expr, _)| expr));
        for from in &mut self.from {
            out.extend(from.predicates_mut());
        }
        out.extend(self.r#where.iter_mut());
        out.extend(self.group_by.iter_mut());
        out.extend(self.having.iter_mut());
        out.extend(self.order_by.iter_mut().map(|(expr, _)| expr));
        out.extend(self.limit.iter_mut());
        out.extend(self.offset.iter_mut());
        out
    }
}

/// Set operations over two query branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetOperation {
    Union,
    Intersect,
    Except,
}

/// A set query: `left op [ALL] right`, with an optional trailing ORDER BY.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SetQuery {
    pub operation: SetOperation,
    pub all: bool,
    pub left: QueryCommand,
    pub right: QueryCommand,
    pub order_by: Vec<(Expression, Direction)>,
}

/// Source of rows for INSERT/MERGE.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InsertSource {
    /// Explicit rows of values.
    Values(Vec<Vec<Expression>>),
    /// Rows produced by a query.
    Query(QueryCommand),
}

/// INSERT (or, with the merge flag, MERGE/upsert - a dialect-gated form).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Insert {
    pub group: GroupSymbol,
    /// Target columns. Empty means all columns in declaration order.
    pub columns: Vec<ElementSymbol>,
    pub source: InsertSource,
    /// True for the MERGE form: update rows whose key already exists.
    pub merge: bool,
}

/// UPDATE.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Update {
    pub group: GroupSymbol,
    /// Change list in declaration order.
    pub set: Vec<(ElementSymbol, Expression)>,
    pub r#where: Option<Expression>,
}

/// DELETE.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Delete {
    pub group: GroupSymbol,
    pub r#where: Option<Expression>,
}

/// EXEC of a stored procedure.
///
/// Resolution attaches the procedure's metadata and a pseudo-group standing
/// for its result set; structural equality considers only the name and
/// arguments.
#[derive(Debug, Clone)]
pub struct StoredProcedure {
    pub name: String,
    pub args: Vec<Expression>,
    pub resolved: Option<Arc<ProcedureMetadata>>,
    pub result_group: Option<GroupSymbol>,
}

impl StoredProcedure {
    pub fn new(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Self {
            name: name.into(),
            args,
            resolved: None,
            result_group: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }
}

impl PartialEq for StoredProcedure {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name) && self.args == other.args
    }
}

impl Eq for StoredProcedure {}

impl Hash for StoredProcedure {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.to_ascii_uppercase().hash(state);
        self.args.hash(state);
    }
}
