//! Predicate collection

use super::push;
use crate::ast::{Command, Expression, QueryCommand};

/// All predicates (criteria-forming operators and boolean subquery
/// containers) in `command`, in pre-order.
pub fn collect(command: &Command, remove_duplicates: bool) -> Vec<Expression> {
    let mut out = Vec::new();
    for expr in command.expressions() {
        gather_expression(expr, remove_duplicates, &mut out);
    }
    for subquery in command.subqueries() {
        gather_query(subquery.query, remove_duplicates, &mut out);
    }
    out
}

fn gather_query(query: &QueryCommand, remove_duplicates: bool, out: &mut Vec<Expression>) {
    for expr in query.expressions() {
        gather_expression(expr, remove_duplicates, out);
    }
    for subquery in query.subqueries() {
        gather_query(subquery.query, remove_duplicates, out);
    }
}

fn gather_expression(expr: &Expression, remove_duplicates: bool, out: &mut Vec<Expression>) {
    expr.walk(&mut |node| {
        if node.is_predicate() {
            push(out, node.clone(), remove_duplicates);
        }
        true
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{FromClause, GroupSymbol, Operator, Select};
    use crate::types::Value;

    #[test]
    fn test_collects_nested_predicates() {
        let criteria: Expression = Operator::And(
            Box::new(
                Operator::Equal(
                    Box::new(Expression::element("t.a")),
                    Box::new(Value::integer(1).into()),
                )
                .into(),
            ),
            Box::new(
                Operator::IsNull {
                    expr: Box::new(Expression::element("t.b")),
                    negated: false,
                }
                .into(),
            ),
        )
        .into();
        let select = Select {
            select: vec![(Expression::element("t.a"), None)],
            from: vec![FromClause::Group(GroupSymbol::new("t"))],
            r#where: Some(criteria),
            ..Select::default()
        };

        // AND is a connector, not a predicate; the comparison and IS NULL are.
        let predicates = collect(&Command::select(select), false);
        assert_eq!(predicates.len(), 2);
    }

    #[test]
    fn test_no_criteria_yields_empty() {
        let select = Select {
            select: vec![(Expression::element("t.a"), None)],
            from: vec![FromClause::Group(GroupSymbol::new("t"))],
            ..Select::default()
        };
        assert!(collect(&Command::select(select), false).is_empty());
    }
}
