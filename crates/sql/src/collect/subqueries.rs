//! Subquery container collection

use crate::ast::{Command, QueryCommand, SubqueryKind};

/// All inner commands reachable from `command`, pre-order: each container's
/// command is reported before the containers nested inside it.
pub fn collect(command: &Command) -> Vec<QueryCommand> {
    let mut out = Vec::new();
    for subquery in command.subqueries() {
        gather(subquery.query, &mut out);
    }
    out
}

/// Only the inner commands of expression-position containers (scalar,
/// EXISTS, IN), the ones that produce values during evaluation.
pub fn collect_expression_containers(command: &Command) -> Vec<QueryCommand> {
    let mut out = Vec::new();
    for subquery in command.subqueries() {
        if subquery.kind == SubqueryKind::Expression {
            out.push(subquery.query.clone());
        }
        gather_expression_containers(subquery.query, &mut out);
    }
    out
}

fn gather(query: &QueryCommand, out: &mut Vec<QueryCommand>) {
    out.push(query.clone());
    for subquery in query.subqueries() {
        gather(subquery.query, out);
    }
}

fn gather_expression_containers(query: &QueryCommand, out: &mut Vec<QueryCommand>) {
    for subquery in query.subqueries() {
        if subquery.kind == SubqueryKind::Expression {
            out.push(subquery.query.clone());
        }
        gather_expression_containers(subquery.query, out);
    }
}
