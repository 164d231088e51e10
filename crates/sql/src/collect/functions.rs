//! Function collection

use super::push;
use crate::ast::{Command, Expression, FunctionCall, QueryCommand};

/// All function calls in `command`, in pre-order. With `name_filter`, only
/// calls whose name matches case-insensitively are reported.
pub fn collect(
    command: &Command,
    remove_duplicates: bool,
    name_filter: Option<&str>,
) -> Vec<FunctionCall> {
    let mut out = Vec::new();
    for expr in command.expressions() {
        gather_expression(expr, remove_duplicates, name_filter, &mut out);
    }
    for subquery in command.subqueries() {
        gather_query(subquery.query, remove_duplicates, name_filter, &mut out);
    }
    out
}

fn gather_query(
    query: &QueryCommand,
    remove_duplicates: bool,
    name_filter: Option<&str>,
    out: &mut Vec<FunctionCall>,
) {
    for expr in query.expressions() {
        gather_expression(expr, remove_duplicates, name_filter, out);
    }
    for subquery in query.subqueries() {
        gather_query(subquery.query, remove_duplicates, name_filter, out);
    }
}

fn gather_expression(
    expr: &Expression,
    remove_duplicates: bool,
    name_filter: Option<&str>,
    out: &mut Vec<FunctionCall>,
) {
    expr.walk(&mut |node| {
        if let Expression::Function(call) = node {
            let matches = name_filter
                .map(|name| call.name.eq_ignore_ascii_case(name))
                .unwrap_or(true);
            if matches {
                push(out, call.clone(), remove_duplicates);
            }
        }
        true
    });
}
