//! Post-resolution semantic validation
//!
//! A pure function of a resolved command (or a metadata object) plus
//! metadata: every applicable rule runs, findings accumulate into one
//! report, and the aggregate outcome is the caller's policy decision. The
//! planner treats `Error` as fatal and `Warning` as advisory; the admin
//! deployment client gates schema deployment on [`validate_schema`].

mod command;
mod metadata;
pub mod report;

pub use report::{Finding, Severity, ValidationCode, ValidatorReport};

use crate::ast::Command;
use crate::functions::{FunctionLibrary, FunctionMethod};
use crate::metadata::{Catalog, ProcedureMetadata, TableMetadata};
use tracing::debug;

/// Validate a resolved command.
pub fn validate(command: &Command) -> ValidatorReport {
    let mut report = ValidatorReport::new();
    command::validate_command(command, &mut report);
    debug!(outcome = ?report.outcome(), findings = report.findings().len(), "command validated");
    report
}

/// Validate one table's metadata.
pub fn validate_table(table: &TableMetadata) -> ValidatorReport {
    let mut report = ValidatorReport::new();
    metadata::validate_table(table, &mut report);
    report
}

/// Validate one procedure's metadata.
pub fn validate_procedure(procedure: &ProcedureMetadata) -> ValidatorReport {
    let mut report = ValidatorReport::new();
    metadata::validate_procedure(procedure, &mut report);
    report
}

/// Validate one function method's metadata (UDF completeness and parameter
/// shape).
pub fn validate_function(method: &FunctionMethod) -> ValidatorReport {
    let mut report = ValidatorReport::new();
    metadata::validate_function_method(method, &mut report);
    report
}

/// Validate every object in a catalog plus the function library: the
/// deployment gate. Consumers act on the aggregate outcome.
pub fn validate_schema(catalog: &Catalog, library: &FunctionLibrary) -> ValidatorReport {
    let mut report = ValidatorReport::new();
    for table in catalog.tables() {
        metadata::validate_table(table, &mut report);
    }
    for procedure in catalog.procedures() {
        metadata::validate_procedure(procedure, &mut report);
    }
    for method in library.methods() {
        metadata::validate_function_method(method, &mut report);
    }
    debug!(outcome = ?report.outcome(), findings = report.findings().len(), "schema validated");
    report
}
