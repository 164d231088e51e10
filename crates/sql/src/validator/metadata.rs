//! Rules over metadata objects: tables, procedures and function methods
//!
//! These run when a virtual schema is deployed, gating the deployment on
//! the aggregate outcome.

use super::report::{ValidationCode, ValidatorReport};
use crate::functions::{FunctionKind, FunctionMethod};
use crate::metadata::{ParamDirection, ProcedureMetadata, TableMetadata};

pub(super) fn validate_table(table: &TableMetadata, report: &mut ValidatorReport) {
    if table.name.trim().is_empty() {
        report.error(
            ValidationCode::EmptyName,
            "<table>",
            "table name must not be empty",
        );
    }

    let mut seen: Vec<String> = Vec::new();
    for column in &table.columns {
        if column.name.trim().is_empty() {
            report.error(
                ValidationCode::EmptyName,
                &table.name,
                "column name must not be empty",
            );
            continue;
        }
        let canonical = column.name.to_ascii_uppercase();
        if seen.contains(&canonical) {
            report.error(
                ValidationCode::DuplicateColumn,
                &table.name,
                format!("duplicate column name {}", column.name),
            );
        } else {
            seen.push(canonical);
        }
    }

    validate_key_columns(table, &table.primary_key, "primary key", false, report);
    for key in &table.unique_keys {
        validate_key_columns(table, key, "unique key", false, report);
    }
    for pattern in &table.access_patterns {
        validate_key_columns(table, pattern, "access pattern", true, report);
    }
    for index in &table.indexes {
        validate_key_columns(table, index, "index", true, report);
    }

    if table.cardinality < -1 {
        report.warn(
            ValidationCode::SuspiciousCardinality,
            &table.name,
            format!("cardinality {} is not meaningful", table.cardinality),
        );
    }
}

/// Key-ish column lists: structurally required lists (keys) error when
/// empty, merely unusual ones (access patterns, indexes) warn. Unknown and
/// duplicate column references are always errors.
fn validate_key_columns(
    table: &TableMetadata,
    columns: &[String],
    kind: &str,
    merely_unusual: bool,
    report: &mut ValidatorReport,
) {
    // Primary keys are represented as an always-present list, where empty
    // means "none declared" - only the explicitly declared collections can
    // be empty in a meaningful way.
    if columns.is_empty() {
        if kind == "primary key" {
            return;
        }
        if merely_unusual {
            report.warn(
                ValidationCode::EmptyAccessPatternColumns,
                &table.name,
                format!("{} declares no columns", kind),
            );
        } else {
            report.error(
                ValidationCode::EmptyKeyColumns,
                &table.name,
                format!("{} declares no columns", kind),
            );
        }
        return;
    }

    let mut seen: Vec<String> = Vec::new();
    for column in columns {
        if table.column(column).is_none() {
            report.error(
                ValidationCode::UnknownKeyColumn,
                &table.name,
                format!("{} references unknown column {}", kind, column),
            );
        }
        let canonical = column.to_ascii_uppercase();
        if seen.contains(&canonical) {
            report.error(
                ValidationCode::DuplicateKeyColumn,
                &table.name,
                format!("{} references column {} more than once", kind, column),
            );
        } else {
            seen.push(canonical);
        }
    }
}

pub(super) fn validate_procedure(procedure: &ProcedureMetadata, report: &mut ValidatorReport) {
    if procedure.name.trim().is_empty() {
        report.error(
            ValidationCode::EmptyName,
            "<procedure>",
            "procedure name must not be empty",
        );
    }

    let mut seen: Vec<String> = Vec::new();
    let mut returns = 0;
    for param in &procedure.params {
        if param.name.trim().is_empty() {
            report.error(
                ValidationCode::EmptyName,
                &procedure.name,
                "parameter name must not be empty",
            );
            continue;
        }
        let canonical = param.name.to_ascii_uppercase();
        if seen.contains(&canonical) {
            report.error(
                ValidationCode::DuplicateParameter,
                &procedure.name,
                format!("duplicate parameter name {}", param.name),
            );
        } else {
            seen.push(canonical);
        }
        if param.direction == ParamDirection::ReturnValue {
            returns += 1;
        }
    }
    if returns > 1 {
        report.error(
            ValidationCode::MultipleReturnParameters,
            &procedure.name,
            format!("{} RETURN parameters declared; at most one is allowed", returns),
        );
    }

    let mut result_seen: Vec<String> = Vec::new();
    for column in &procedure.result_set {
        if column.name.trim().is_empty() {
            report.error(
                ValidationCode::EmptyName,
                &procedure.name,
                "result set column name must not be empty",
            );
            continue;
        }
        let canonical = column.name.to_ascii_uppercase();
        if result_seen.contains(&canonical) {
            report.error(
                ValidationCode::DuplicateColumn,
                &procedure.name,
                format!("duplicate result set column {}", column.name),
            );
        } else {
            result_seen.push(canonical);
        }
    }
}

pub(super) fn validate_function_method(method: &FunctionMethod, report: &mut ValidatorReport) {
    if method.name.trim().is_empty() {
        report.error(
            ValidationCode::EmptyName,
            "<function>",
            "function name must not be empty",
        );
    }

    if method.kind == FunctionKind::UserDefined {
        if method.category.as_deref().map(str::trim).unwrap_or("").is_empty() {
            report.error(
                ValidationCode::UdfMissingCategory,
                &method.name,
                "user-defined function must declare a category",
            );
        }
        if method
            .invocation_class
            .as_deref()
            .map(str::trim)
            .unwrap_or("")
            .is_empty()
        {
            report.error(
                ValidationCode::UdfMissingClass,
                &method.name,
                "user-defined function must declare an invocation class",
            );
        }
        if method
            .invocation_method
            .as_deref()
            .map(str::trim)
            .unwrap_or("")
            .is_empty()
        {
            report.error(
                ValidationCode::UdfMissingMethod,
                &method.name,
                "user-defined function must declare an invocation method",
            );
        }
    }

    if method.variadic && method.params.is_empty() {
        report.error(
            ValidationCode::VariadicNotLast,
            &method.name,
            "a variadic function must declare the repeated parameter",
        );
    }

    let mut seen: Vec<String> = Vec::new();
    for param in &method.params {
        let canonical = param.name.to_ascii_uppercase();
        if seen.contains(&canonical) {
            report.error(
                ValidationCode::DuplicateParameter,
                &method.name,
                format!("duplicate parameter name {}", param.name),
            );
        } else {
            seen.push(canonical);
        }
    }
}
