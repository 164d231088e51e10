//! Element collection

use super::push;
use crate::ast::{Command, ElementSymbol, Expression, QueryCommand};

/// All element references in `command`, in pre-order, including INSERT
/// target columns and UPDATE change-list targets.
pub fn collect(command: &Command, remove_duplicates: bool) -> Vec<ElementSymbol> {
    let mut out = Vec::new();
    gather_command(command, remove_duplicates, &mut out);
    out
}

/// Element references within one expression tree (subquery bodies
/// included).
pub fn collect_in_expression(expr: &Expression, remove_duplicates: bool) -> Vec<ElementSymbol> {
    let mut out = Vec::new();
    gather_expression(expr, remove_duplicates, &mut out);
    out
}

fn gather_command(command: &Command, remove_duplicates: bool, out: &mut Vec<ElementSymbol>) {
    match command {
        Command::Insert(insert) => {
            for column in &insert.columns {
                push(out, column.clone(), remove_duplicates);
            }
        }
        Command::Update(update) => {
            for (target, _) in &update.set {
                push(out, target.clone(), remove_duplicates);
            }
        }
        _ => {}
    }
    for expr in command.expressions() {
        gather_expression(expr, remove_duplicates, out);
    }
    for subquery in command.subqueries() {
        gather_query(subquery.query, remove_duplicates, out);
    }
}

fn gather_query(query: &QueryCommand, remove_duplicates: bool, out: &mut Vec<ElementSymbol>) {
    for expr in query.expressions() {
        gather_expression(expr, remove_duplicates, out);
    }
    for subquery in query.subqueries() {
        gather_query(subquery.query, remove_duplicates, out);
    }
}

fn gather_expression(expr: &Expression, remove_duplicates: bool, out: &mut Vec<ElementSymbol>) {
    expr.walk(&mut |node| {
        if let Expression::Element(symbol) = node {
            push(out, symbol.clone(), remove_duplicates);
        }
        true
    });
}
