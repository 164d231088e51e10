//! Group collection

use super::push;
use crate::ast::{Command, GroupSymbol, QueryCommand, SubqueryKind};

/// All groups referenced by `command`, in pre-order.
pub fn collect(command: &Command, remove_duplicates: bool) -> Vec<GroupSymbol> {
    let mut out = Vec::new();
    gather_command(command, false, remove_duplicates, &mut out);
    out
}

/// Like [`collect`], but does not descend into derived-table bodies. The
/// derived table's alias group itself is still reported.
pub fn collect_ignore_inline_views(command: &Command, remove_duplicates: bool) -> Vec<GroupSymbol> {
    let mut out = Vec::new();
    gather_command(command, true, remove_duplicates, &mut out);
    out
}

fn gather_command(
    command: &Command,
    ignore_inline_views: bool,
    remove_duplicates: bool,
    out: &mut Vec<GroupSymbol>,
) {
    match command {
        Command::Query(query) => {
            gather_query(query, ignore_inline_views, remove_duplicates, out);
            return;
        }
        Command::Insert(insert) => push(out, insert.group.clone(), remove_duplicates),
        Command::Update(update) => push(out, update.group.clone(), remove_duplicates),
        Command::Delete(delete) => push(out, delete.group.clone(), remove_duplicates),
        Command::Exec(procedure) => {
            if let Some(group) = &procedure.result_group {
                push(out, group.clone(), remove_duplicates);
            }
        }
    }
    for subquery in command.subqueries() {
        if ignore_inline_views && subquery.kind == SubqueryKind::InlineView {
            continue;
        }
        gather_query(subquery.query, ignore_inline_views, remove_duplicates, out);
    }
}

fn gather_query(
    query: &QueryCommand,
    ignore_inline_views: bool,
    remove_duplicates: bool,
    out: &mut Vec<GroupSymbol>,
) {
    if let QueryCommand::Select(select) = query {
        for from in &select.from {
            for group in from.scope_groups() {
                push(out, group.clone(), remove_duplicates);
            }
        }
    }
    for subquery in query.subqueries() {
        if ignore_inline_views && subquery.kind == SubqueryKind::InlineView {
            continue;
        }
        gather_query(subquery.query, ignore_inline_views, remove_duplicates, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expression, FromClause, Select};

    fn select_from(groups: &[&str]) -> Select {
        Select {
            select: vec![(Expression::element("a"), None)],
            from: groups
                .iter()
                .map(|g| FromClause::Group(GroupSymbol::new(*g)))
                .collect(),
            ..Select::default()
        }
    }

    #[test]
    fn test_collects_from_groups() {
        let command = Command::select(select_from(&["t1", "t2"]));
        let groups = collect(&command, true);
        assert_eq!(groups.len(), 2);
        assert!(groups.contains(&GroupSymbol::new("t1")));
        assert!(groups.contains(&GroupSymbol::new("t2")));
    }

    #[test]
    fn test_duplicate_policy() {
        let command = Command::select(select_from(&["t1", "T1"]));
        assert_eq!(collect(&command, true).len(), 1);
        assert_eq!(collect(&command, false).len(), 2);
    }

    #[test]
    fn test_ignore_inline_views() {
        let inner = QueryCommand::Select(Box::new(select_from(&["hidden"])));
        let outer = Select {
            select: vec![(Expression::element("v.a"), None)],
            from: vec![FromClause::DerivedTable {
                query: Box::new(inner),
                group: GroupSymbol::new("v"),
            }],
            ..Select::default()
        };
        let command = Command::select(outer);

        let all = collect(&command, true);
        assert!(all.contains(&GroupSymbol::new("hidden")));
        assert!(all.contains(&GroupSymbol::new("v")));

        let shallow = collect_ignore_inline_views(&command, true);
        assert!(!shallow.contains(&GroupSymbol::new("hidden")));
        assert!(shallow.contains(&GroupSymbol::new("v")));
    }

    #[test]
    fn test_exists_subquery_groups_always_collected() {
        let inner = QueryCommand::Select(Box::new(select_from(&["sub"])));
        let outer = Select {
            select: vec![(Expression::element("t.a"), None)],
            from: vec![FromClause::Group(GroupSymbol::new("t"))],
            r#where: Some(Expression::ExistsSubquery(Box::new(inner))),
            ..Select::default()
        };
        let command = Command::select(outer);

        let shallow = collect_ignore_inline_views(&command, true);
        assert!(shallow.contains(&GroupSymbol::new("sub")));
    }

    #[test]
    fn test_empty_command_yields_empty_container() {
        let command = Command::select(Select::default());
        assert!(collect(&command, true).is_empty());
    }
}
