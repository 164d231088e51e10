//! Group and element symbols
//!
//! A symbol starts life as nothing but a textual name produced by the
//! parser. Resolution attaches a metadata binding: either a permanent
//! catalog identity or a temporary one. Structural equality and hashing are
//! case-insensitive over names and never consider bindings, so resolved and
//! unresolved forms of the same reference compare equal and symbols stay
//! stable as set/map keys across resolution.

use crate::metadata::{TableMetadata, TempMetadataId};
use crate::types::DataType;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// What a resolved group symbol points at.
#[derive(Debug, Clone)]
pub enum GroupBinding {
    /// A permanent catalog group.
    Catalog(Arc<TableMetadata>),
    /// A temporary identity (derived table, temp table, procedure result
    /// set).
    Temp(TempMetadataId),
}

impl GroupBinding {
    /// Ordered `(short name, type)` pairs for the group's elements.
    pub fn columns(&self) -> Vec<(String, DataType)> {
        match self {
            GroupBinding::Catalog(table) => table
                .columns
                .iter()
                .map(|c| (c.name.clone(), c.data_type))
                .collect(),
            GroupBinding::Temp(id) => id
                .elements()
                .iter()
                .map(|e| (e.name().to_string(), e.value_type().unwrap_or(DataType::Null)))
                .collect(),
        }
    }

    /// Estimated row count, `UNKNOWN_CARDINALITY` when not known. Permanent
    /// and temporary identities answer in the same shape.
    pub fn cardinality(&self) -> i64 {
        match self {
            GroupBinding::Catalog(table) => table.cardinality,
            GroupBinding::Temp(id) => id.cardinality(),
        }
    }

    /// The declared type of a column, if the group has it. Case-insensitive.
    pub fn column_type(&self, name: &str) -> Option<DataType> {
        match self {
            GroupBinding::Catalog(table) => table.column(name).map(|(_, c)| c.data_type),
            GroupBinding::Temp(id) => id.element_by_name(name).and_then(|e| e.value_type()),
        }
    }
}

/// A named table, view, derived-table or result-set reference in a command.
#[derive(Debug, Clone)]
pub struct GroupSymbol {
    /// The name the command refers to the group by (an alias, if one was
    /// written).
    name: String,
    /// The underlying object name when `name` is an alias.
    definition: Option<String>,
    binding: Option<GroupBinding>,
}

impl GroupSymbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definition: None,
            binding: None,
        }
    }

    /// A group referenced through an alias: `FROM <definition> AS <name>`.
    pub fn aliased(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definition: Some(definition.into()),
            binding: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definition(&self) -> Option<&str> {
        self.definition.as_deref()
    }

    /// The catalog name to look this group up under.
    pub fn lookup_name(&self) -> &str {
        self.definition.as_deref().unwrap_or(&self.name)
    }

    /// Upper-cased form of the in-scope name, the shape temporary identities
    /// are keyed by.
    pub fn canonical_name(&self) -> String {
        self.name.to_ascii_uppercase()
    }

    pub fn binding(&self) -> Option<&GroupBinding> {
        self.binding.as_ref()
    }

    pub fn set_binding(&mut self, binding: GroupBinding) {
        self.binding = Some(binding);
    }

    pub fn is_resolved(&self) -> bool {
        self.binding.is_some()
    }

    /// Whether a qualifier written in a command refers to this group.
    pub fn matches(&self, qualifier: &str) -> bool {
        self.name.eq_ignore_ascii_case(qualifier)
    }
}

impl PartialEq for GroupSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
            && match (&self.definition, &other.definition) {
                (None, None) => true,
                (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                _ => false,
            }
    }
}

impl Eq for GroupSymbol {}

impl Hash for GroupSymbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.to_ascii_uppercase().hash(state);
        self.definition
            .as_ref()
            .map(|d| d.to_ascii_uppercase())
            .hash(state);
    }
}

impl fmt::Display for GroupSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.definition {
            Some(definition) => write!(f, "{} AS {}", definition, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// What a resolved element symbol points at.
#[derive(Debug, Clone)]
pub enum ElementBinding {
    /// A column of a permanent catalog group.
    Catalog {
        table: Arc<TableMetadata>,
        column: usize,
    },
    /// An element of a temporary identity.
    Temp(TempMetadataId),
}

/// A column reference within a command.
#[derive(Debug, Clone)]
pub struct ElementSymbol {
    /// Short (unqualified) element name.
    name: String,
    /// The governing group; present once the reference is qualified.
    group: Option<GroupSymbol>,
    data_type: Option<DataType>,
    binding: Option<ElementBinding>,
}

impl ElementSymbol {
    /// An unqualified reference.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: None,
            data_type: None,
            binding: None,
        }
    }

    /// A reference qualified by a group name.
    pub fn qualified(group: GroupSymbol, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: Some(group),
            data_type: None,
            binding: None,
        }
    }

    /// Parse `group.element` or bare `element` text into a symbol.
    pub fn parse(text: &str) -> Self {
        match text.rsplit_once('.') {
            Some((group, name)) => Self::qualified(GroupSymbol::new(group), name),
            None => Self::new(text),
        }
    }

    pub fn short_name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> Option<&GroupSymbol> {
        self.group.as_ref()
    }

    pub fn set_group(&mut self, group: GroupSymbol) {
        self.group = Some(group);
    }

    /// `group.element` once qualified, bare `element` before.
    pub fn qualified_name(&self) -> String {
        match &self.group {
            Some(group) => format!("{}.{}", group.name(), self.name),
            None => self.name.clone(),
        }
    }

    pub fn data_type(&self) -> Option<DataType> {
        self.data_type
    }

    pub fn set_data_type(&mut self, data_type: DataType) {
        self.data_type = Some(data_type);
    }

    pub fn binding(&self) -> Option<&ElementBinding> {
        self.binding.as_ref()
    }

    pub fn set_binding(&mut self, binding: ElementBinding) {
        self.binding = Some(binding);
    }

    pub fn is_resolved(&self) -> bool {
        self.binding.is_some()
    }
}

impl PartialEq for ElementSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
            && match (&self.group, &other.group) {
                (None, None) => true,
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
    }
}

impl Eq for ElementSymbol {}

impl Hash for ElementSymbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.to_ascii_uppercase().hash(state);
        self.group.hash(state);
    }
}

impl fmt::Display for ElementSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified_name())
    }
}
