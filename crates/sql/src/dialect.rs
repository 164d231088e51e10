//! Dialect revisions and the capability table
//!
//! Version-gated language behavior is decided in exactly one place: the
//! capability table below. Adding a dialect revision means adding table
//! entries, not new branches in the resolver.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A revision of the command dialect accepted by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DialectVersion {
    V1,
    V2,
}

impl fmt::Display for DialectVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialectVersion::V1 => write!(f, "1"),
            DialectVersion::V2 => write!(f, "2"),
        }
    }
}

/// Optional language constructs whose legality depends on the dialect
/// revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// MERGE (upsert) commands.
    MergeStatement,
    /// Calling a function through its variadic parameter form.
    VariadicFunctions,
}

impl Capability {
    /// Human-readable construct name, used in error messages.
    pub fn construct_name(&self) -> &'static str {
        match self {
            Capability::MergeStatement => "MERGE command",
            Capability::VariadicFunctions => "variadic function invocation",
        }
    }
}

/// The earliest revision in which each capability is legal.
fn minimum_version(capability: Capability) -> DialectVersion {
    match capability {
        Capability::MergeStatement => DialectVersion::V2,
        Capability::VariadicFunctions => DialectVersion::V2,
    }
}

/// The active dialect for a resolution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    version: DialectVersion,
}

impl Dialect {
    pub fn new(version: DialectVersion) -> Self {
        Self { version }
    }

    pub fn version(&self) -> DialectVersion {
        self.version
    }

    /// Whether the given construct is legal at this revision.
    pub fn supports(&self, capability: Capability) -> bool {
        self.version >= minimum_version(capability)
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::new(DialectVersion::V2)
    }
}
