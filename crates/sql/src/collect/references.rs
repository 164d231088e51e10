//! Positional parameter reference collection

use crate::ast::{Command, Expression, QueryCommand};

/// The positions of every parameter reference in `command`, in pre-order.
/// Duplicates are kept: each occurrence is one binding site.
pub fn collect(command: &Command) -> Vec<usize> {
    let mut out = Vec::new();
    for expr in command.expressions() {
        gather_expression(expr, &mut out);
    }
    for subquery in command.subqueries() {
        gather_query(subquery.query, &mut out);
    }
    out
}

fn gather_query(query: &QueryCommand, out: &mut Vec<usize>) {
    for expr in query.expressions() {
        gather_expression(expr, out);
    }
    for subquery in query.subqueries() {
        gather_query(subquery.query, out);
    }
}

fn gather_expression(expr: &Expression, out: &mut Vec<usize>) {
    expr.walk(&mut |node| {
        if let Expression::Reference(position) = node {
            out.push(*position);
        }
        true
    });
}
