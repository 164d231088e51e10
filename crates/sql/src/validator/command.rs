//! Structural rules over resolved commands

use super::report::{ValidationCode, ValidatorReport};
use crate::ast::{
    Command, ElementBinding, Expression, Insert, InsertSource, QueryCommand, Select, Update,
};

/// Aggregate function names, for the grouping rules.
const AGGREGATES: [&str; 5] = ["COUNT", "SUM", "AVG", "MIN", "MAX"];

fn is_aggregate(name: &str) -> bool {
    AGGREGATES
        .iter()
        .any(|aggregate| name.eq_ignore_ascii_case(aggregate))
}

pub(super) fn validate_command(command: &Command, report: &mut ValidatorReport) {
    match command {
        Command::Query(query) => validate_query(query, false, report),
        Command::Insert(insert) => {
            validate_insert(insert, report);
            for subquery in command.subqueries() {
                validate_query(subquery.query, true, report);
            }
        }
        Command::Update(update) => {
            validate_update(update, report);
            for subquery in command.subqueries() {
                validate_query(subquery.query, true, report);
            }
        }
        Command::Delete(_) | Command::Exec(_) => {
            validate_expression_containers(&command.expressions(), report);
            for subquery in command.subqueries() {
                validate_query(subquery.query, true, report);
            }
        }
    }
}

fn validate_query(query: &QueryCommand, is_subquery: bool, report: &mut ValidatorReport) {
    match query {
        QueryCommand::Select(select) => {
            validate_select(select, is_subquery, report);
            for subquery in query.subqueries() {
                validate_query(subquery.query, true, report);
            }
        }
        QueryCommand::SetQuery(set_query) => {
            let left = set_query.left.projected_names().len();
            let right = set_query.right.projected_names().len();
            if left != right {
                report.error(
                    ValidationCode::SetQueryArity,
                    format!("{:?}", set_query.operation),
                    format!(
                        "set query branches project {} and {} columns; they must match",
                        left, right
                    ),
                );
            }
            for subquery in query.subqueries() {
                validate_query(subquery.query, true, report);
            }
        }
    }
}

fn validate_select(select: &Select, is_subquery: bool, report: &mut ValidatorReport) {
    if select.select.is_empty() {
        report.error(
            ValidationCode::EmptySelect,
            "SELECT",
            "the select list must name at least one expression",
        );
    }

    // Duplicate names in scope are also caught fatally at resolution; a
    // validation-only pass over an unresolved tree still reports them.
    let mut seen = Vec::new();
    for from in &select.from {
        for group in from.scope_groups() {
            let name = group.canonical_name();
            if seen.contains(&name) {
                report.error(
                    ValidationCode::DuplicateAlias,
                    group.name(),
                    format!("the name {} appears more than once in FROM", group.name()),
                );
            } else {
                seen.push(name);
            }
        }
    }

    validate_grouping(select, report);

    if select.having.is_some() && select.group_by.is_empty() && !has_aggregate_projection(select) {
        report.error(
            ValidationCode::HavingWithoutGroupBy,
            "HAVING",
            "HAVING requires GROUP BY or an aggregate function",
        );
    }

    if is_subquery && !select.order_by.is_empty() && select.limit.is_none() {
        report.warn(
            ValidationCode::OrderByWithoutLimit,
            "ORDER BY",
            "ORDER BY in a subquery has no effect without LIMIT",
        );
    }

    let exprs: Vec<&Expression> = select.select.iter().map(|(expr, _)| expr).collect();
    validate_expression_containers(&exprs, report);
    if let Some(criteria) = &select.r#where {
        validate_expression_containers(&[criteria], report);
    }
    if let Some(criteria) = &select.having {
        validate_expression_containers(&[criteria], report);
    }
}

fn has_aggregate_projection(select: &Select) -> bool {
    select.select.iter().any(|(expr, _)| {
        !expr.walk(&mut |node| {
            !matches!(node, Expression::Function(call) if is_aggregate(&call.name))
        })
    })
}

/// With aggregates present, every projected element outside an aggregate
/// must appear in GROUP BY.
fn validate_grouping(select: &Select, report: &mut ValidatorReport) {
    if !has_aggregate_projection(select) {
        return;
    }
    let grouped: Vec<&Expression> = select.group_by.iter().collect();
    for (expr, _) in &select.select {
        check_grouped(expr, &grouped, report);
    }
}

fn check_grouped(expr: &Expression, grouped: &[&Expression], report: &mut ValidatorReport) {
    if grouped.iter().any(|g| *g == expr) {
        return;
    }
    match expr {
        Expression::Element(symbol) => report.error(
            ValidationCode::UngroupedColumn,
            symbol.qualified_name(),
            format!(
                "{} must appear in GROUP BY or inside an aggregate function",
                symbol.qualified_name()
            ),
        ),
        // Aggregate arguments are exempt from grouping.
        Expression::Function(call) if is_aggregate(&call.name) => {}
        Expression::Function(call) => {
            for arg in &call.args {
                check_grouped(arg, grouped, report);
            }
        }
        Expression::Operator(op) => {
            for child in op.children() {
                check_grouped(child, grouped, report);
            }
        }
        Expression::Case {
            operand,
            when_clauses,
            else_clause,
        } => {
            if let Some(operand) = operand {
                check_grouped(operand, grouped, report);
            }
            for (condition, result) in when_clauses {
                check_grouped(condition, grouped, report);
                check_grouped(result, grouped, report);
            }
            if let Some(else_expr) = else_clause {
                check_grouped(else_expr, grouped, report);
            }
        }
        _ => {}
    }
}

/// Scalar and IN subqueries must project exactly one column.
fn validate_expression_containers(exprs: &[&Expression], report: &mut ValidatorReport) {
    for expr in exprs {
        expr.walk(&mut |node| {
            match node {
                Expression::ScalarSubquery(query) | Expression::InSubquery { query, .. } => {
                    let width = query.projected_names().len();
                    if width != 1 {
                        report.error(
                            ValidationCode::SubqueryProjection,
                            "subquery",
                            format!("subquery must project exactly one column, found {}", width),
                        );
                    }
                }
                _ => {}
            }
            true
        });
    }
}

fn validate_insert(insert: &Insert, report: &mut ValidatorReport) {
    match &insert.source {
        InsertSource::Values(rows) => {
            if !insert.columns.is_empty() {
                for row in rows {
                    if row.len() != insert.columns.len() {
                        report.error(
                            ValidationCode::InsertArity,
                            insert.group.name(),
                            format!(
                                "INSERT names {} columns but a row supplies {} values",
                                insert.columns.len(),
                                row.len()
                            ),
                        );
                    }
                }
            }
        }
        InsertSource::Query(query) => {
            if !insert.columns.is_empty() {
                let width = query.projected_names().len();
                if width != insert.columns.len() {
                    report.error(
                        ValidationCode::InsertArity,
                        insert.group.name(),
                        format!(
                            "INSERT names {} columns but the query projects {}",
                            insert.columns.len(),
                            width
                        ),
                    );
                }
            }
        }
    }

    for expr in &insert.columns {
        check_updatable(expr, report);
    }
}

fn validate_update(update: &Update, report: &mut ValidatorReport) {
    if update.set.is_empty() {
        report.error(
            ValidationCode::EmptyUpdateSet,
            update.group.name(),
            "UPDATE must set at least one element",
        );
    }
    for (target, _) in &update.set {
        check_updatable(target, report);
    }
    if let Some(criteria) = &update.r#where {
        validate_expression_containers(&[criteria], report);
    }
}

fn check_updatable(symbol: &crate::ast::ElementSymbol, report: &mut ValidatorReport) {
    if let Some(ElementBinding::Catalog { table, column }) = symbol.binding()
        && let Some(column) = table.columns.get(*column)
        && !column.updatable
    {
        report.error(
            ValidationCode::ReadOnlyElement,
            symbol.qualified_name(),
            format!("{} is not updatable", symbol.qualified_name()),
        );
    }
}
