//! Expressions and criteria
//!
//! Criteria are expressions of boolean type; both live in one recursive
//! enum so a single traversal covers the whole tree. Subquery containers
//! (`ScalarSubquery`, `ExistsSubquery`, `InSubquery`) carry whole inner
//! commands; expression-level walks stop at them and leave descent into the
//! inner command to the caller.

use super::dml::QueryCommand;
use super::symbols::ElementSymbol;
use crate::types::{DataType, Value};

/// Expressions, e.g. `a + 7 > b`. Can be nested.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expression {
    /// All columns, i.e. `*`. Expanded to element references during
    /// resolution.
    All,
    /// A column reference.
    Element(ElementSymbol),
    /// A constant value.
    Constant(Value),
    /// A function call.
    Function(FunctionCall),
    /// An operator over child expressions.
    Operator(Operator),
    /// A positional parameter placeholder (0-indexed).
    Reference(usize),
    /// CASE WHEN expression.
    Case {
        /// Expression to compare against (simple CASE), if any.
        operand: Option<Box<Expression>>,
        /// WHEN conditions and their results.
        when_clauses: Vec<(Expression, Expression)>,
        /// ELSE result, if any.
        else_clause: Option<Box<Expression>>,
    },
    /// A subquery in scalar position.
    ScalarSubquery(Box<QueryCommand>),
    /// EXISTS (query).
    ExistsSubquery(Box<QueryCommand>),
    /// expr [NOT] IN (query).
    InSubquery {
        expr: Box<Expression>,
        query: Box<QueryCommand>,
        negated: bool,
    },
}

/// A function call. The return type is assigned when the resolver picks the
/// overload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expression>,
    pub return_type: Option<DataType>,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Self {
            name: name.into(),
            args,
            return_type: None,
        }
    }
}

/// Expression operators. Each recursive child is boxed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    And(Box<Expression>, Box<Expression>), // a AND b
    Or(Box<Expression>, Box<Expression>),  // a OR b
    Not(Box<Expression>),                  // NOT a

    Equal(Box<Expression>, Box<Expression>),       // a = b
    NotEqual(Box<Expression>, Box<Expression>),    // a <> b
    GreaterThan(Box<Expression>, Box<Expression>), // a > b
    GreaterThanOrEqual(Box<Expression>, Box<Expression>), // a >= b
    LessThan(Box<Expression>, Box<Expression>),    // a < b
    LessThanOrEqual(Box<Expression>, Box<Expression>), // a <= b

    Like(Box<Expression>, Box<Expression>), // a LIKE b
    IsNull {
        expr: Box<Expression>,
        negated: bool,
    }, // a IS [NOT] NULL
    InList {
        expr: Box<Expression>,
        list: Vec<Expression>,
        negated: bool,
    }, // a [NOT] IN (b, c)
    Between {
        expr: Box<Expression>,
        low: Box<Expression>,
        high: Box<Expression>,
        negated: bool,
    }, // a [NOT] BETWEEN b AND c

    Add(Box<Expression>, Box<Expression>),      // a + b
    Subtract(Box<Expression>, Box<Expression>), // a - b
    Multiply(Box<Expression>, Box<Expression>), // a * b
    Divide(Box<Expression>, Box<Expression>),   // a / b
    Negate(Box<Expression>),                    // -a
}

impl Operator {
    /// The operator's direct child expressions, left to right.
    pub fn children(&self) -> Vec<&Expression> {
        use Operator::*;
        match self {
            Add(lhs, rhs)
            | And(lhs, rhs)
            | Divide(lhs, rhs)
            | Equal(lhs, rhs)
            | GreaterThan(lhs, rhs)
            | GreaterThanOrEqual(lhs, rhs)
            | LessThan(lhs, rhs)
            | LessThanOrEqual(lhs, rhs)
            | Like(lhs, rhs)
            | Multiply(lhs, rhs)
            | NotEqual(lhs, rhs)
            | Or(lhs, rhs)
            | Subtract(lhs, rhs) => vec![lhs, rhs],
            Negate(expr) | Not(expr) | IsNull { expr, .. } => vec![expr],
            InList { expr, list, .. } => {
                let mut children = vec![expr.as_ref()];
                children.extend(list.iter());
                children
            }
            Between {
                expr, low, high, ..
            } => vec![expr, low, high],
        }
    }
}

impl From<Value> for Expression {
    fn from(value: Value) -> Self {
        Expression::Constant(value)
    }
}

impl From<Operator> for Expression {
    fn from(operator: Operator) -> Self {
        Expression::Operator(operator)
    }
}

impl From<ElementSymbol> for Expression {
    fn from(symbol: ElementSymbol) -> Self {
        Expression::Element(symbol)
    }
}

impl Expression {
    /// A column reference from `group.element` or bare `element` text.
    pub fn element(text: &str) -> Self {
        Expression::Element(ElementSymbol::parse(text))
    }

    /// A function call expression.
    pub fn function(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::Function(FunctionCall::new(name, args))
    }

    /// Walks the expression tree depth-first, calling a closure for every
    /// node. Halts and returns false if the closure returns false. Does not
    /// descend into subquery containers' inner commands.
    pub fn walk<'a>(&'a self, visitor: &mut impl FnMut(&'a Expression) -> bool) -> bool {
        use Operator::*;

        if !visitor(self) {
            return false;
        }

        match self {
            Self::Operator(op) => match op {
                Add(lhs, rhs)
                | And(lhs, rhs)
                | Divide(lhs, rhs)
                | Equal(lhs, rhs)
                | GreaterThan(lhs, rhs)
                | GreaterThanOrEqual(lhs, rhs)
                | LessThan(lhs, rhs)
                | LessThanOrEqual(lhs, rhs)
                | Like(lhs, rhs)
                | Multiply(lhs, rhs)
                | NotEqual(lhs, rhs)
                | Or(lhs, rhs)
                | Subtract(lhs, rhs) => lhs.walk(visitor) && rhs.walk(visitor),

                Negate(expr) | Not(expr) | IsNull { expr, .. } => expr.walk(visitor),

                InList { expr, list, .. } => {
                    expr.walk(visitor) && list.iter().all(|e| e.walk(visitor))
                }

                Between {
                    expr, low, high, ..
                } => expr.walk(visitor) && low.walk(visitor) && high.walk(visitor),
            },

            Self::Function(call) => call.args.iter().all(|arg| arg.walk(visitor)),

            Self::Case {
                operand,
                when_clauses,
                else_clause,
            } => {
                if let Some(operand) = operand
                    && !operand.walk(visitor)
                {
                    return false;
                }
                for (condition, result) in when_clauses {
                    if !condition.walk(visitor) || !result.walk(visitor) {
                        return false;
                    }
                }
                if let Some(else_expr) = else_clause
                    && !else_expr.walk(visitor)
                {
                    return false;
                }
                true
            }

            Self::InSubquery { expr, .. } => expr.walk(visitor),

            _ => true,
        }
    }

    /// Transforms the expression tree depth-first, applying a closure to
    /// every node, children before parents. Does not descend into subquery
    /// containers' inner commands.
    pub fn transform<E>(
        &mut self,
        transformer: &mut impl FnMut(&mut Expression) -> std::result::Result<(), E>,
    ) -> std::result::Result<(), E> {
        use Operator::*;

        match self {
            Self::Operator(op) => match op {
                Add(lhs, rhs)
                | And(lhs, rhs)
                | Divide(lhs, rhs)
                | Equal(lhs, rhs)
                | GreaterThan(lhs, rhs)
                | GreaterThanOrEqual(lhs, rhs)
                | LessThan(lhs, rhs)
                | LessThanOrEqual(lhs, rhs)
                | Like(lhs, rhs)
                | Multiply(lhs, rhs)
                | NotEqual(lhs, rhs)
                | Or(lhs, rhs)
                | Subtract(lhs, rhs) => {
                    lhs.transform(transformer)?;
                    rhs.transform(transformer)?;
                }

                Negate(expr) | Not(expr) | IsNull { expr, .. } => expr.transform(transformer)?,

                InList { expr, list, .. } => {
                    expr.transform(transformer)?;
                    for item in list {
                        item.transform(transformer)?;
                    }
                }

                Between {
                    expr, low, high, ..
                } => {
                    expr.transform(transformer)?;
                    low.transform(transformer)?;
                    high.transform(transformer)?;
                }
            },

            Self::Function(call) => {
                for arg in &mut call.args {
                    arg.transform(transformer)?;
                }
            }

            Self::Case {
                operand,
                when_clauses,
                else_clause,
            } => {
                if let Some(operand) = operand {
                    operand.transform(transformer)?;
                }
                for (condition, result) in when_clauses {
                    condition.transform(transformer)?;
                    result.transform(transformer)?;
                }
                if let Some(else_expr) = else_clause {
                    else_expr.transform(transformer)?;
                }
            }

            Self::InSubquery { expr, .. } => expr.transform(transformer)?,

            _ => {}
        }

        transformer(self)
    }

    /// The inner commands of every subquery container in this expression,
    /// pre-order.
    pub fn subquery_containers(&self) -> Vec<&QueryCommand> {
        let mut containers = Vec::new();
        self.walk(&mut |expr| {
            match expr {
                Expression::ScalarSubquery(query) | Expression::ExistsSubquery(query) => {
                    containers.push(query.as_ref())
                }
                Expression::InSubquery { query, .. } => containers.push(query.as_ref()),
                _ => {}
            }
            true
        });
        containers
    }

    /// Whether this node is a predicate (a criteria-forming operator or
    /// subquery container).
    pub fn is_predicate(&self) -> bool {
        matches!(
            self,
            Expression::Operator(
                Operator::Equal(_, _)
                    | Operator::NotEqual(_, _)
                    | Operator::GreaterThan(_, _)
                    | Operator::GreaterThanOrEqual(_, _)
                    | Operator::LessThan(_, _)
                    | Operator::LessThanOrEqual(_, _)
                    | Operator::Like(_, _)
                    | Operator::IsNull { .. }
                    | Operator::InList { .. }
                    | Operator::Between { .. }
            ) | Expression::ExistsSubquery(_)
                | Expression::InSubquery { .. }
        )
    }

    /// The result type of a resolved expression. `None` for nodes whose
    /// type is unknowable (unresolved symbols, bare parameter references).
    pub fn result_type(&self) -> Option<DataType> {
        use Operator::*;

        match self {
            Expression::All => None,
            Expression::Element(symbol) => symbol.data_type(),
            Expression::Constant(value) => Some(value.data_type()),
            Expression::Function(call) => call.return_type,
            Expression::Reference(_) => None,
            Expression::Operator(op) => match op {
                And(_, _) | Or(_, _) | Not(_) | Equal(_, _) | NotEqual(_, _)
                | GreaterThan(_, _) | GreaterThanOrEqual(_, _) | LessThan(_, _)
                | LessThanOrEqual(_, _) | Like(_, _) | IsNull { .. } | InList { .. }
                | Between { .. } => Some(DataType::Boolean),
                Add(lhs, rhs) | Subtract(lhs, rhs) | Multiply(lhs, rhs) | Divide(lhs, rhs) => {
                    DataType::common_type(&lhs.result_type()?, &rhs.result_type()?)
                }
                Negate(expr) => expr.result_type(),
            },
            Expression::Case {
                when_clauses,
                else_clause,
                ..
            } => {
                let mut result: Option<DataType> = None;
                let branches = when_clauses
                    .iter()
                    .map(|(_, then)| then)
                    .chain(else_clause.iter().map(|e| e.as_ref()));
                for branch in branches {
                    let branch_type = branch.result_type()?;
                    result = Some(match result {
                        None => branch_type,
                        Some(current) => DataType::common_type(&current, &branch_type)?,
                    });
                }
                result
            }
            Expression::ScalarSubquery(query) => {
                query.projected_types().first().copied().flatten()
            }
            Expression::ExistsSubquery(_) | Expression::InSubquery { .. } => {
                Some(DataType::Boolean)
            }
        }
    }

    /// Whether the expression is constant: no element references anywhere.
    pub fn is_constant(&self) -> bool {
        !self.walk(&mut |expr| !matches!(expr, Self::Element(_)))
    }
}
