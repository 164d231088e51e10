//! Error types for the query front end

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while resolving or preparing a command.
///
/// Resolution errors are fatal to the command being resolved: the pipeline
/// aborts at the first one and no partially resolved tree is returned.
/// Validation findings are *not* errors - they accumulate in a
/// [`ValidatorReport`](crate::validator::ValidatorReport) and fatality is the
/// caller's policy.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Resolution errors
    #[error("Group does not exist: {0}")]
    UnresolvedGroup(String),

    #[error("Element \"{0}\" is not defined by any relevant group")]
    UnresolvedElement(String),

    #[error("Element \"{name}\" is ambiguous, it exists in more than one group: {}", .groups.join(", "))]
    AmbiguousElement { name: String, groups: Vec<String> },

    #[error("The function {name}({arg_types}) could not be resolved")]
    UnresolvedFunction { name: String, arg_types: String },

    #[error("Procedure does not exist: {0}")]
    UnresolvedProcedure(String),

    #[error("Duplicate group in scope: {0}")]
    DuplicateGroup(String),

    // Type errors
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    // Dialect errors
    #[error("{construct} is not supported by dialect version {version}")]
    UnsupportedConstruct { construct: String, version: String },

    // Collaborator errors
    #[error("Metadata is unavailable: {0}")]
    MetadataUnavailable(String),

    // Format errors
    #[error("Invalid format pattern: {0}")]
    InvalidFormat(String),

    // System errors
    #[error("Internal error: {0}")]
    Internal(String),
}
