//! Bottom-up type assignment
//!
//! Runs after names are bound: verifies operator operand compatibility
//! through the implicit-conversion lattice, picks function overloads (which
//! also lowers the context's determinism level), and leaves every resolvable
//! node with a result type.

use crate::ast::{Expression, Operator};
use crate::context::CommandContext;
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::functions::FunctionLibrary;
use crate::types::DataType;

/// Resolve the type of `expr` and everything under it. Returns `None` for
/// nodes whose type cannot be known (bare parameter references).
pub(super) fn resolve_types(
    expr: &mut Expression,
    library: &FunctionLibrary,
    dialect: &Dialect,
    context: &mut CommandContext,
) -> Result<Option<DataType>> {
    match expr {
        Expression::All => Ok(None),
        Expression::Element(symbol) => Ok(symbol.data_type()),
        Expression::Constant(value) => Ok(Some(value.data_type())),
        Expression::Reference(_) => Ok(None),
        Expression::Function(call) => {
            let mut arg_types = Vec::with_capacity(call.args.len());
            for arg in &mut call.args {
                arg_types.push(resolve_types(arg, library, dialect, context)?);
            }
            let method = library.resolve(&call.name, &arg_types, dialect)?;
            call.return_type = Some(method.returns);
            context.set_determinism_level(method.determinism);
            Ok(Some(method.returns))
        }
        Expression::Operator(op) => resolve_operator(op, library, dialect, context),
        Expression::Case {
            operand,
            when_clauses,
            else_clause,
        } => {
            let operand_type = match operand {
                Some(operand) => resolve_types(operand, library, dialect, context)?,
                None => None,
            };
            let mut result: Option<DataType> = None;
            for (condition, then) in when_clauses.iter_mut() {
                let condition_type = resolve_types(condition, library, dialect, context)?;
                if operand.is_some() {
                    check_comparable(operand_type, condition_type)?;
                } else {
                    check_boolean(condition_type)?;
                }
                let then_type = resolve_types(then, library, dialect, context)?;
                result = merge_branch_type(result, then_type)?;
            }
            if let Some(else_expr) = else_clause {
                let else_type = resolve_types(else_expr, library, dialect, context)?;
                result = merge_branch_type(result, else_type)?;
            }
            Ok(result)
        }
        Expression::ScalarSubquery(query) => Ok(query.projected_types().first().copied().flatten()),
        Expression::ExistsSubquery(_) => Ok(Some(DataType::Boolean)),
        Expression::InSubquery { expr, query, .. } => {
            let left = resolve_types(expr, library, dialect, context)?;
            let right = query.projected_types().first().copied().flatten();
            check_comparable(left, right)?;
            Ok(Some(DataType::Boolean))
        }
    }
}

fn resolve_operator(
    op: &mut Operator,
    library: &FunctionLibrary,
    dialect: &Dialect,
    context: &mut CommandContext,
) -> Result<Option<DataType>> {
    use Operator::*;

    match op {
        And(lhs, rhs) | Or(lhs, rhs) => {
            let left = resolve_types(lhs, library, dialect, context)?;
            let right = resolve_types(rhs, library, dialect, context)?;
            check_boolean(left)?;
            check_boolean(right)?;
            Ok(Some(DataType::Boolean))
        }
        Not(operand) => {
            let operand_type = resolve_types(operand, library, dialect, context)?;
            check_boolean(operand_type)?;
            Ok(Some(DataType::Boolean))
        }
        Equal(lhs, rhs)
        | NotEqual(lhs, rhs)
        | GreaterThan(lhs, rhs)
        | GreaterThanOrEqual(lhs, rhs)
        | LessThan(lhs, rhs)
        | LessThanOrEqual(lhs, rhs) => {
            let left = resolve_types(lhs, library, dialect, context)?;
            let right = resolve_types(rhs, library, dialect, context)?;
            check_comparable(left, right)?;
            Ok(Some(DataType::Boolean))
        }
        Like(lhs, rhs) => {
            let left = resolve_types(lhs, library, dialect, context)?;
            let right = resolve_types(rhs, library, dialect, context)?;
            check_string(left)?;
            check_string(right)?;
            Ok(Some(DataType::Boolean))
        }
        IsNull { expr, .. } => {
            resolve_types(expr, library, dialect, context)?;
            Ok(Some(DataType::Boolean))
        }
        InList { expr, list, .. } => {
            let left = resolve_types(expr, library, dialect, context)?;
            for item in list {
                let item_type = resolve_types(item, library, dialect, context)?;
                check_comparable(left, item_type)?;
            }
            Ok(Some(DataType::Boolean))
        }
        Between {
            expr, low, high, ..
        } => {
            let value = resolve_types(expr, library, dialect, context)?;
            let low_type = resolve_types(low, library, dialect, context)?;
            let high_type = resolve_types(high, library, dialect, context)?;
            check_comparable(value, low_type)?;
            check_comparable(value, high_type)?;
            Ok(Some(DataType::Boolean))
        }
        Add(lhs, rhs) | Subtract(lhs, rhs) | Multiply(lhs, rhs) | Divide(lhs, rhs) => {
            let left = resolve_types(lhs, library, dialect, context)?;
            let right = resolve_types(rhs, library, dialect, context)?;
            check_numeric(left)?;
            check_numeric(right)?;
            match (left, right) {
                (Some(left), Some(right)) => {
                    let result =
                        DataType::common_type(&left, &right).ok_or(Error::TypeMismatch {
                            expected: left.to_string(),
                            found: right.to_string(),
                        })?;
                    Ok(Some(result))
                }
                _ => Ok(None),
            }
        }
        Negate(operand) => {
            let operand_type = resolve_types(operand, library, dialect, context)?;
            check_numeric(operand_type)?;
            Ok(operand_type)
        }
    }
}

fn merge_branch_type(
    current: Option<DataType>,
    branch: Option<DataType>,
) -> Result<Option<DataType>> {
    match (current, branch) {
        (Some(current), Some(branch)) => {
            let merged = DataType::common_type(&current, &branch).ok_or(Error::TypeMismatch {
                expected: current.to_string(),
                found: branch.to_string(),
            })?;
            Ok(Some(merged))
        }
        (Some(current), None) => Ok(Some(current)),
        (None, branch) => Ok(branch),
    }
}

fn check_comparable(left: Option<DataType>, right: Option<DataType>) -> Result<()> {
    if let (Some(left), Some(right)) = (left, right)
        && DataType::common_type(&left, &right).is_none()
    {
        return Err(Error::TypeMismatch {
            expected: left.to_string(),
            found: right.to_string(),
        });
    }
    Ok(())
}

fn check_boolean(operand: Option<DataType>) -> Result<()> {
    match operand {
        Some(data_type) if !data_type.is_boolean_compatible() => Err(Error::TypeMismatch {
            expected: DataType::Boolean.to_string(),
            found: data_type.to_string(),
        }),
        _ => Ok(()),
    }
}

fn check_string(operand: Option<DataType>) -> Result<()> {
    match operand {
        Some(data_type) if !matches!(data_type, DataType::String | DataType::Null) => {
            Err(Error::TypeMismatch {
                expected: DataType::String.to_string(),
                found: data_type.to_string(),
            })
        }
        _ => Ok(()),
    }
}

fn check_numeric(operand: Option<DataType>) -> Result<()> {
    match operand {
        Some(data_type) if !data_type.is_numeric() && data_type != DataType::Null => {
            Err(Error::TypeMismatch {
                expected: "a numeric type".to_string(),
                found: data_type.to_string(),
            })
        }
        _ => Ok(()),
    }
}
