//! Validation findings and the aggregate report

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a finding, and of a whole report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Ok,
    Warning,
    Error,
}

/// Stable message keys, one per rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationCode {
    EmptyName,
    EmptySelect,
    DuplicateAlias,
    UngroupedColumn,
    HavingWithoutGroupBy,
    SubqueryProjection,
    OrderByWithoutLimit,
    InsertArity,
    EmptyUpdateSet,
    ReadOnlyElement,
    SetQueryArity,
    DuplicateColumn,
    DuplicateParameter,
    MultipleReturnParameters,
    EmptyKeyColumns,
    EmptyAccessPatternColumns,
    DuplicateKeyColumn,
    UnknownKeyColumn,
    SuspiciousCardinality,
    UdfMissingCategory,
    UdfMissingClass,
    UdfMissingMethod,
    VariadicNotLast,
}

/// One rule violation: severity, message key, the offending object and a
/// human-readable message.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub severity: Severity,
    pub code: ValidationCode,
    /// Name of the object the finding is about.
    pub object: String,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} [{:?}] {}: {}",
            self.severity, self.code, self.object, self.message
        )
    }
}

/// The accumulated outcome of a validation pass. Every applicable rule
/// runs; nothing short-circuits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatorReport {
    findings: Vec<Finding>,
}

impl ValidatorReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(
        &mut self,
        code: ValidationCode,
        object: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.findings.push(Finding {
            severity: Severity::Warning,
            code,
            object: object.into(),
            message: message.into(),
        });
    }

    pub fn error(
        &mut self,
        code: ValidationCode,
        object: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.findings.push(Finding {
            severity: Severity::Error,
            code,
            object: object.into(),
            message: message.into(),
        });
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// `Error` if any finding is an error, else `Warning` if any warning,
    /// else `Ok`.
    pub fn outcome(&self) -> Severity {
        self.findings
            .iter()
            .map(|finding| finding.severity)
            .max()
            .unwrap_or(Severity::Ok)
    }

    pub fn has_errors(&self) -> bool {
        self.outcome() == Severity::Error
    }

    pub fn is_ok(&self) -> bool {
        self.findings.is_empty()
    }

    /// Fold another report's findings into this one.
    pub fn merge(&mut self, other: ValidatorReport) {
        self.findings.extend(other.findings);
    }
}

impl fmt::Display for ValidatorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.findings.is_empty() {
            return write!(f, "OK");
        }
        for (index, finding) in self.findings.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", finding)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_is_ok() {
        let report = ValidatorReport::new();
        assert_eq!(report.outcome(), Severity::Ok);
        assert!(report.is_ok());
    }

    #[test]
    fn test_aggregate_severity() {
        let mut report = ValidatorReport::new();
        report.warn(ValidationCode::OrderByWithoutLimit, "q", "unusual");
        assert_eq!(report.outcome(), Severity::Warning);

        report.error(ValidationCode::EmptySelect, "q", "empty");
        assert_eq!(report.outcome(), Severity::Error);
        assert!(report.has_errors());
        // The warning is still present; nothing short-circuits.
        assert_eq!(report.findings().len(), 2);
    }

    #[test]
    fn test_merge() {
        let mut a = ValidatorReport::new();
        a.warn(ValidationCode::SuspiciousCardinality, "t", "negative");
        let mut b = ValidatorReport::new();
        b.error(ValidationCode::DuplicateColumn, "t", "dup");
        a.merge(b);
        assert_eq!(a.findings().len(), 2);
        assert_eq!(a.outcome(), Severity::Error);
    }
}
