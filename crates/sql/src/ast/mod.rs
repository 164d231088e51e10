//! The language object model
//!
//! Commands, criteria, expressions and symbols are closed tagged unions;
//! traversals pattern-match exhaustively, so every node kind is handled by
//! construction. Built by the parser, rewritten in place by the resolver,
//! read by the validator and every collector.

pub mod common;
pub mod dml;
pub mod expressions;
pub mod symbols;

pub use common::{Direction, FromClause, JoinType};
pub use dml::{
    Delete, Insert, InsertSource, QueryCommand, Select, SetOperation, SetQuery, StoredProcedure,
    Update,
};
pub use expressions::{Expression, FunctionCall, Operator};
pub use symbols::{ElementBinding, ElementSymbol, GroupBinding, GroupSymbol};

/// A top-level command. The root node of the language object tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    /// SELECT or a set query.
    Query(QueryCommand),
    /// INSERT, or MERGE when the merge flag is set.
    Insert(Insert),
    /// UPDATE.
    Update(Update),
    /// DELETE.
    Delete(Delete),
    /// EXEC of a stored procedure.
    Exec(StoredProcedure),
}

/// How an inner command hangs off its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubqueryKind {
    /// A derived table (inline view) in a FROM clause.
    InlineView,
    /// A container in expression position: scalar, EXISTS or IN subquery.
    Expression,
    /// A structural branch: a set-query arm or an INSERT source query.
    Branch,
}

/// A borrowed inner command plus how it is attached.
#[derive(Debug, Clone, Copy)]
pub struct SubqueryRef<'a> {
    pub query: &'a QueryCommand,
    pub kind: SubqueryKind,
}

impl Command {
    /// Creates a SELECT command.
    pub fn select(select: Select) -> Self {
        Command::Query(QueryCommand::Select(Box::new(select)))
    }

    /// Creates a set-query command.
    pub fn set_query(set_query: SetQuery) -> Self {
        Command::Query(QueryCommand::SetQuery(Box::new(set_query)))
    }

    /// Creates an INSERT command.
    pub fn insert(group: GroupSymbol, columns: Vec<ElementSymbol>, source: InsertSource) -> Self {
        Command::Insert(Insert {
            group,
            columns,
            source,
            merge: false,
        })
    }

    /// Creates a MERGE (upsert) command.
    pub fn merge(group: GroupSymbol, columns: Vec<ElementSymbol>, source: InsertSource) -> Self {
        Command::Insert(Insert {
            group,
            columns,
            source,
            merge: true,
        })
    }

    /// Creates an UPDATE command.
    pub fn update(
        group: GroupSymbol,
        set: Vec<(ElementSymbol, Expression)>,
        r#where: Option<Expression>,
    ) -> Self {
        Command::Update(Update {
            group,
            set,
            r#where,
        })
    }

    /// Creates a DELETE command.
    pub fn delete(group: GroupSymbol, r#where: Option<Expression>) -> Self {
        Command::Delete(Delete { group, r#where })
    }

    /// Creates an EXEC command.
    pub fn exec(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Command::Exec(StoredProcedure::new(name, args))
    }

    /// This command's own clause expressions, in clause order. Inner
    /// commands are not entered; see [`Command::subqueries`].
    pub fn expressions(&self) -> Vec<&Expression> {
        let mut out = Vec::new();
        match self {
            Command::Query(query) => query_expressions(query, &mut out),
            Command::Insert(insert) => {
                if let InsertSource::Values(rows) = &insert.source {
                    for row in rows {
                        out.extend(row.iter());
                    }
                }
            }
            Command::Update(update) => {
                out.extend(update.set.iter().map(|(_, expr)| expr));
                out.extend(update.r#where.iter());
            }
            Command::Delete(delete) => out.extend(delete.r#where.iter()),
            Command::Exec(procedure) => out.extend(procedure.args.iter()),
        }
        out
    }

    /// Mutable access to the same expressions as [`Command::expressions`].
    pub fn expressions_mut(&mut self) -> Vec<&mut Expression> {
        let mut out = Vec::new();
        match self {
            Command::Query(query) => query_expressions_mut(query, &mut out),
            Command::Insert(insert) => {
                if let InsertSource::Values(rows) = &mut insert.source {
                    for row in rows {
                        out.extend(row.iter_mut());
                    }
                }
            }
            Command::Update(update) => {
                out.extend(update.set.iter_mut().map(|(_, expr)| expr));
                out.extend(update.r#where.iter_mut());
            }
            Command::Delete(delete) => out.extend(delete.r#where.iter_mut()),
            Command::Exec(procedure) => out.extend(procedure.args.iter_mut()),
        }
        out
    }

    /// Every inner command directly attached to this one, tagged by how it
    /// is attached. Structural containers come before expression-position
    /// ones.
    pub fn subqueries(&self) -> Vec<SubqueryRef<'_>> {
        match self {
            Command::Query(query) => query.subqueries(),
            _ => {
                let mut out = Vec::new();
                if let Command::Insert(insert) = self
                    && let InsertSource::Query(query) = &insert.source
                {
                    out.push(SubqueryRef {
                        query,
                        kind: SubqueryKind::Branch,
                    });
                }
                for expr in self.expressions() {
                    for query in expr.subquery_containers() {
                        out.push(SubqueryRef {
                            query,
                            kind: SubqueryKind::Expression,
                        });
                    }
                }
                out
            }
        }
    }
}

impl QueryCommand {
    /// This query's own clause expressions. See [`Command::expressions`].
    pub fn expressions(&self) -> Vec<&Expression> {
        let mut out = Vec::new();
        query_expressions(self, &mut out);
        out
    }

    /// Mutable access to the same expressions as
    /// [`QueryCommand::expressions`].
    pub fn expressions_mut(&mut self) -> Vec<&mut Expression> {
        let mut out = Vec::new();
        query_expressions_mut(self, &mut out);
        out
    }

    /// Every inner command directly attached to this query.
    pub fn subqueries(&self) -> Vec<SubqueryRef<'_>> {
        let mut out = Vec::new();
        query_subqueries(self, &mut out);
        for expr in self.expressions() {
            for query in expr.subquery_containers() {
                out.push(SubqueryRef {
                    query,
                    kind: SubqueryKind::Expression,
                });
            }
        }
        out
    }
}

fn query_expressions<'a>(query: &'a QueryCommand, out: &mut Vec<&'a Expression>) {
    match query {
        QueryCommand::Select(select) => {
            out.extend(select.select.iter().map(|(expr, _)| expr));
            for from in &select.from {
                out.extend(from.predicates());
            }
            out.extend(select.r#where.iter());
            out.extend(select.group_by.iter());
            out.extend(select.having.iter());
            out.extend(select.order_by.iter().map(|(expr, _)| expr));
            out.extend(select.limit.iter());
            out.extend(select.offset.iter());
        }
        QueryCommand::SetQuery(set_query) => {
            out.extend(set_query.order_by.iter().map(|(expr, _)| expr));
        }
    }
}

fn query_expressions_mut<'a>(query: &'a mut QueryCommand, out: &mut Vec<&'a mut Expression>) {
    match query {
        QueryCommand::Select(select) => {
            out.extend(select.select.iter_mut().map(|(expr, _)| expr));
            for from in &mut select.from {
                out.extend(from.predicates_mut());
            }
            out.extend(select.r#where.iter_mut());
            out.extend(select.group_by.iter_mut());
            out.extend(select.having.iter_mut());
            out.extend(select.order_by.iter_mut().map(|(expr, _)| expr));
            out.extend(select.limit.iter_mut());
            out.extend(select.offset.iter_mut());
        }
        QueryCommand::SetQuery(set_query) => {
            out.extend(set_query.order_by.iter_mut().map(|(expr, _)| expr));
        }
    }
}

fn query_subqueries<'a>(query: &'a QueryCommand, out: &mut Vec<SubqueryRef<'a>>) {
    match query {
        QueryCommand::Select(select) => {
            for from in &select.from {
                from_subqueries(from, out);
            }
        }
        QueryCommand::SetQuery(set_query) => {
            out.push(SubqueryRef {
                query: &set_query.left,
                kind: SubqueryKind::Branch,
            });
            out.push(SubqueryRef {
                query: &set_query.right,
                kind: SubqueryKind::Branch,
            });
        }
    }
}

fn from_subqueries<'a>(from: &'a FromClause, out: &mut Vec<SubqueryRef<'a>>) {
    match from {
        FromClause::DerivedTable { query, .. } => out.push(SubqueryRef {
            query,
            kind: SubqueryKind::InlineView,
        }),
        FromClause::Join { left, right, .. } => {
            from_subqueries(left, out);
            from_subqueries(right, out);
        }
        FromClause::Group(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    fn simple_select() -> Select {
        Select {
            select: vec![(Expression::element("t.a"), None)],
            from: vec![FromClause::Group(GroupSymbol::new("t"))],
            r#where: Some(
                Operator::Equal(
                    Box::new(Expression::element("t.b")),
                    Box::new(Value::integer(1).into()),
                )
                .into(),
            ),
            ..Select::default()
        }
    }

    #[test]
    fn test_expressions_cover_clauses() {
        let command = Command::select(simple_select());
        // The projected element and the where criteria.
        assert_eq!(command.expressions().len(), 2);
    }

    #[test]
    fn test_subqueries_tagged_by_kind() {
        let inner = QueryCommand::Select(Box::new(simple_select()));
        let select = Select {
            select: vec![(Expression::element("v.a"), None)],
            from: vec![FromClause::DerivedTable {
                query: Box::new(inner.clone()),
                group: GroupSymbol::new("v"),
            }],
            r#where: Some(Expression::ExistsSubquery(Box::new(inner))),
            ..Select::default()
        };
        let command = Command::select(select);

        let subqueries = command.subqueries();
        assert_eq!(subqueries.len(), 2);
        assert_eq!(subqueries[0].kind, SubqueryKind::InlineView);
        assert_eq!(subqueries[1].kind, SubqueryKind::Expression);
    }

    #[test]
    fn test_structural_equality_survives_clone() {
        let command = Command::select(simple_select());
        assert_eq!(command, command.clone());
    }
}
