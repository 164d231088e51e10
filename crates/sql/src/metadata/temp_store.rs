//! Registry of temporary metadata created during a resolution pass

use crate::error::{Error, Result};
use crate::metadata::temp_id::{TempMetadataId, TempMetadataType};
use crate::types::DataType;
use std::collections::HashMap;
use tracing::trace;

/// The temporary groups known to one command resolution.
///
/// Entries live exactly as long as the resolution pass unless the caller
/// keeps the store (or a group's shared table data) alive - e.g. for a
/// schema-wide temp table reused across commands.
#[derive(Debug, Default)]
pub struct TempMetadataStore {
    groups: HashMap<String, TempMetadataId>,
}

impl TempMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a group identity from `(column, type)` pairs without
    /// registering it. Positions are assigned 1-based in list order.
    pub fn create_group_id(
        name: &str,
        columns: Vec<(String, DataType)>,
        metadata_type: TempMetadataType,
    ) -> TempMetadataId {
        let key = name.to_ascii_uppercase();
        let elements = columns
            .into_iter()
            .map(|(column, data_type)| {
                TempMetadataId::element(format!("{}.{}", key, column), data_type)
            })
            .collect();
        TempMetadataId::group_with_type(&key, elements, metadata_type)
    }

    /// Register a group under `name` with the given ordered columns. Fails
    /// if the name is already registered.
    pub fn add_temp_group(
        &mut self,
        name: &str,
        columns: Vec<(String, DataType)>,
        metadata_type: TempMetadataType,
    ) -> Result<TempMetadataId> {
        let key = name.to_ascii_uppercase();
        if self.groups.contains_key(&key) {
            return Err(Error::DuplicateGroup(name.to_string()));
        }
        let group = Self::create_group_id(&key, columns, metadata_type);
        trace!(group = %group.id(), "registered temporary group");
        self.groups.insert(key, group.clone());
        Ok(group)
    }

    /// The registered group with the given name, if any.
    pub fn temp_group(&self, name: &str) -> Option<TempMetadataId> {
        self.groups.get(&name.to_ascii_uppercase()).cloned()
    }

    /// An element of a registered group, by group and element short name.
    pub fn temp_element(&self, group: &str, element: &str) -> Option<TempMetadataId> {
        self.temp_group(group)?.element_by_name(element)
    }

    /// Drop a group from the registry, marking its shared data as removed so
    /// cost-dependent consumers see the staleness sentinel.
    pub fn remove_temp_group(&mut self, name: &str) -> Option<TempMetadataId> {
        let group = self.groups.remove(&name.to_ascii_uppercase())?;
        group.removed();
        Some(group)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn groups(&self) -> impl Iterator<Item = &TempMetadataId> {
        self.groups.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::temp_id::REMOVED;

    #[test]
    fn test_register_and_lookup() {
        let mut store = TempMetadataStore::new();
        let group = store
            .add_temp_group(
                "sess.tmp",
                vec![
                    ("a".to_string(), DataType::Integer),
                    ("b".to_string(), DataType::String),
                ],
                TempMetadataType::Temp,
            )
            .unwrap();
        assert!(group.is_temp_table());

        let found = store.temp_group("SESS.TMP").unwrap();
        assert_eq!(found, group);

        let element = store.temp_element("sess.tmp", "B").unwrap();
        assert_eq!(element.value_type(), Some(DataType::String));
        assert_eq!(element.position(), 2);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut store = TempMetadataStore::new();
        store
            .add_temp_group("t", vec![], TempMetadataType::Virtual)
            .unwrap();
        assert!(matches!(
            store.add_temp_group("T", vec![], TempMetadataType::Virtual),
            Err(Error::DuplicateGroup(_))
        ));
    }

    #[test]
    fn test_removal_marks_staleness() {
        let mut store = TempMetadataStore::new();
        let group = store
            .add_temp_group("t", vec![], TempMetadataType::Temp)
            .unwrap();
        let kept = group.clone();

        store.remove_temp_group("t").unwrap();
        assert!(store.temp_group("t").is_none());
        // The surviving copy observes the sentinel through the shared data.
        assert_eq!(kept.last_modified(), REMOVED);
    }
}
