//! Common structures used across AST modules

use super::dml::QueryCommand;
use super::expressions::Expression;
use super::symbols::GroupSymbol;

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Asc,
    Desc,
}

/// Join types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinType {
    Cross,
    Inner,
    Left,
    Right,
    Full,
}

/// A FROM item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FromClause {
    /// A named group (table or view), possibly aliased.
    Group(GroupSymbol),
    /// A derived table: an inline view with a mandatory alias group.
    DerivedTable {
        query: Box<QueryCommand>,
        group: GroupSymbol,
    },
    /// A join of two from items (may be nested).
    Join {
        left: Box<FromClause>,
        right: Box<FromClause>,
        join_type: JoinType,
        /// The join condition. None for a cross join.
        predicate: Option<Expression>,
    },
}

impl FromClause {
    /// The group symbols this item contributes to the enclosing scope.
    pub fn scope_groups(&self) -> Vec<&GroupSymbol> {
        match self {
            FromClause::Group(group) => vec![group],
            FromClause::DerivedTable { group, .. } => vec![group],
            FromClause::Join { left, right, .. } => {
                let mut groups = left.scope_groups();
                groups.extend(right.scope_groups());
                groups
            }
        }
    }

    /// Join predicates nested anywhere in this item.
    pub(crate) fn predicates(&self) -> Vec<&Expression> {
        let mut out = Vec::new();
        self.collect_predicates(&mut out);
        out
    }

    fn collect_predicates<'a>(&'a self, out: &mut Vec<&'a Expression>) {
        if let FromClause::Join {
            left,
            right,
            predicate,
            ..
        } = self
        {
            left.collect_predicates(out);
            right.collect_predicates(out);
            if let Some(predicate) = predicate {
                out.push(predicate);
            }
        }
    }

    pub(crate) fn predicates_mut(&mut self) -> Vec<&mut Expression> {
        let mut out = Vec::new();
        self.collect_predicates_mut(&mut out);
        out
    }

    fn collect_predicates_mut<'a>(&'a mut self, out: &mut Vec<&'a mut Expression>) {
        if let FromClause::Join {
            left,
            right,
            predicate,
            ..
        } = self
        {
            left.collect_predicates_mut(out);
            right.collect_predicates_mut(out);
            if let Some(predicate) = predicate {
                out.push(predicate);
            }
        }
    }
}
