//! The permanent metadata catalog and its lookup contract

use crate::error::Result;
use crate::metadata::temp_id::UNKNOWN_CARDINALITY;
use crate::types::{DataType, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Read-only lookup contract the resolver and validator depend on.
///
/// "Not found" is `Ok(None)`, never an error, so the resolver can fall
/// through to temporary binding. `Err` is reserved for collaborator failure
/// ([`Error::MetadataUnavailable`](crate::Error::MetadataUnavailable)), which
/// callers may retry.
pub trait MetadataStore {
    /// Look up a permanent group (table or view) by name.
    fn group(&self, name: &str) -> Result<Option<Arc<TableMetadata>>>;

    /// Look up a stored procedure by name.
    fn procedure(&self, name: &str) -> Result<Option<Arc<ProcedureMetadata>>>;
}

/// Schema and statistics for a permanent group. Exposes primary key, unique
/// keys, access patterns and cardinality in the same shape as a temporary
/// identity, so downstream consumers treat both uniformly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Qualified table name. Can't be empty.
    pub name: String,
    /// The table's columns, in declaration order.
    pub columns: Vec<ColumnMetadata>,
    /// Primary key column names. Empty if none declared.
    pub primary_key: Vec<String>,
    /// Additional unique keys, each an ordered column-name list.
    pub unique_keys: Vec<Vec<String>>,
    /// Access patterns: column sets that must be constrained to query the
    /// group at all.
    pub access_patterns: Vec<Vec<String>>,
    /// Secondary indexes, each an ordered column-name list.
    pub indexes: Vec<Vec<String>>,
    /// Estimated row count; [`UNKNOWN_CARDINALITY`] when not known.
    pub cardinality: i64,
}

impl TableMetadata {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnMetadata>) -> Self {
        Self {
            name: name.into(),
            columns,
            primary_key: Vec::new(),
            unique_keys: Vec::new(),
            access_patterns: Vec::new(),
            indexes: Vec::new(),
            cardinality: UNKNOWN_CARDINALITY,
        }
    }

    pub fn with_primary_key(mut self, columns: Vec<String>) -> Self {
        self.primary_key = columns;
        self
    }

    pub fn with_unique_key(mut self, columns: Vec<String>) -> Self {
        self.unique_keys.push(columns);
        self
    }

    pub fn with_access_pattern(mut self, columns: Vec<String>) -> Self {
        self.access_patterns.push(columns);
        self
    }

    pub fn with_index(mut self, columns: Vec<String>) -> Self {
        self.indexes.push(columns);
        self
    }

    pub fn with_cardinality(mut self, cardinality: i64) -> Self {
        self.cardinality = cardinality;
        self
    }

    /// The column with the given name, if declared. Case-insensitive.
    pub fn column(&self, name: &str) -> Option<(usize, &ColumnMetadata)> {
        self.columns
            .iter()
            .enumerate()
            .find(|(_, c)| c.name.eq_ignore_ascii_case(name))
    }
}

/// A column of a permanent group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Column name. Can't be empty.
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub auto_increment: bool,
    pub updatable: bool,
    /// Default value, if the column declares one.
    pub default: Option<Value>,
}

impl ColumnMetadata {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            auto_increment: false,
            updatable: true,
            default: None,
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self.updatable = false;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.updatable = false;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// Direction of a procedure parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamDirection {
    In,
    Out,
    InOut,
    ReturnValue,
}

impl fmt::Display for ParamDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamDirection::In => "IN",
            ParamDirection::Out => "OUT",
            ParamDirection::InOut => "INOUT",
            ParamDirection::ReturnValue => "RETURN",
        };
        write!(f, "{}", name)
    }
}

/// A stored procedure's callable shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureMetadata {
    pub name: String,
    pub params: Vec<ProcedureParam>,
    /// Result-set columns; empty when the procedure returns no rows.
    pub result_set: Vec<ColumnMetadata>,
}

impl ProcedureMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            result_set: Vec::new(),
        }
    }

    pub fn with_param(
        mut self,
        name: impl Into<String>,
        data_type: DataType,
        direction: ParamDirection,
    ) -> Self {
        self.params.push(ProcedureParam {
            name: name.into(),
            data_type,
            direction,
        });
        self
    }

    pub fn with_result_set(mut self, columns: Vec<ColumnMetadata>) -> Self {
        self.result_set = columns;
        self
    }

    /// Input parameters only, in declaration order.
    pub fn input_params(&self) -> impl Iterator<Item = &ProcedureParam> {
        self.params
            .iter()
            .filter(|p| matches!(p.direction, ParamDirection::In | ParamDirection::InOut))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureParam {
    pub name: String,
    pub data_type: DataType,
    pub direction: ParamDirection,
}

/// In-memory catalog of permanent metadata, keyed case-insensitively.
///
/// An explicit object handed to the resolver and validator by the caller;
/// there is no process-wide registry.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: HashMap<String, Arc<TableMetadata>>,
    procedures: HashMap<String, Arc<ProcedureMetadata>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&mut self, table: TableMetadata) {
        self.tables
            .insert(table.name.to_ascii_uppercase(), Arc::new(table));
    }

    pub fn add_procedure(&mut self, procedure: ProcedureMetadata) {
        self.procedures
            .insert(procedure.name.to_ascii_uppercase(), Arc::new(procedure));
    }

    pub fn tables(&self) -> impl Iterator<Item = &Arc<TableMetadata>> {
        self.tables.values()
    }

    pub fn procedures(&self) -> impl Iterator<Item = &Arc<ProcedureMetadata>> {
        self.procedures.values()
    }
}

impl MetadataStore for Catalog {
    fn group(&self, name: &str) -> Result<Option<Arc<TableMetadata>>> {
        Ok(self.tables.get(&name.to_ascii_uppercase()).cloned())
    }

    fn procedure(&self, name: &str) -> Result<Option<Arc<ProcedureMetadata>>> {
        Ok(self.procedures.get(&name.to_ascii_uppercase()).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lookup_is_case_insensitive() {
        let mut catalog = Catalog::new();
        catalog.add_table(TableMetadata::new(
            "Parts",
            vec![ColumnMetadata::new("id", DataType::Integer)],
        ));

        assert!(catalog.group("parts").unwrap().is_some());
        assert!(catalog.group("PARTS").unwrap().is_some());
        assert!(catalog.group("orders").unwrap().is_none());
    }

    #[test]
    fn test_column_lookup() {
        let table = TableMetadata::new(
            "t",
            vec![
                ColumnMetadata::new("a", DataType::Integer),
                ColumnMetadata::new("b", DataType::String),
            ],
        );
        let (index, column) = table.column("B").unwrap();
        assert_eq!(index, 1);
        assert_eq!(column.data_type, DataType::String);
        assert!(table.column("c").is_none());
    }

    #[test]
    fn test_procedure_input_params() {
        let proc = ProcedureMetadata::new("sp")
            .with_param("a", DataType::Integer, ParamDirection::In)
            .with_param("b", DataType::String, ParamDirection::Out)
            .with_param("c", DataType::Integer, ParamDirection::InOut);
        let inputs: Vec<&str> = proc.input_params().map(|p| p.name.as_str()).collect();
        assert_eq!(inputs, vec!["a", "c"]);
    }
}
