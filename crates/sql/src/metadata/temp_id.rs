//! Temporary metadata identities
//!
//! A [`TempMetadataId`] does not exist in a real metadata source. It stands
//! in for a group or element that only exists in the context of processing a
//! command: a derived-table alias, a procedure result set, a temp table, a
//! computed index. Identity is the upper-cased fully qualified name alone;
//! everything else hangs off a shared, mutable [`TableData`] record so that
//! every copy of the identity observes the same facts as resolution learns
//! them.

use crate::ast::QueryCommand;
use crate::types::DataType;
use chrono::Utc;
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};

/// Capacity of the per-group property cache.
const LOCAL_CACHE_SIZE: usize = 8;

/// Accumulated update count that must be exceeded before the cost-estimate
/// timestamp refreshes. Deliberately kept at the historical value; dependent
/// cost caches are tuned against it.
const MOD_COUNT_FOR_COST_UPDATE: u32 = 8;

/// Cardinality value meaning "unknown".
pub const UNKNOWN_CARDINALITY: i64 = -1;

/// Timestamp sentinel marking an identity whose backing object was removed.
pub const REMOVED: i64 = -1;

/// The kind of object a temporary identity stands in for. Variants are
/// mutually exclusive and change only through an explicit setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TempMetadataType {
    Virtual,
    Temp,
    Scalar,
    Xml,
    Index,
}

/// A property value stored in the local cache.
pub type CachedValue = Arc<dyn Any + Send + Sync>;

/// Mutable extension record for a group identity, shared by reference across
/// all copies of the identity. Safe for concurrent use: the record proper is
/// lock-guarded and the timestamps are atomics, so independent resolution
/// threads may notify data modifications without coordination.
pub struct TableData {
    inner: Mutex<TableDataInner>,
    last_modified: AtomicI64,
    last_data_modification: AtomicI64,
}

impl fmt::Debug for TableData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableData")
            .field("last_modified", &self.last_modified())
            .field("last_data_modification", &self.last_data_modification())
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct TableDataInner {
    elements: Option<Vec<TempMetadataId>>,
    cardinality: i64,
    primary_key: Option<Vec<TempMetadataId>>,
    unique_keys: Vec<Vec<TempMetadataId>>,
    access_patterns: Vec<TempMetadataId>,
    indexes: Vec<TempMetadataId>,
    query_definition: Option<QueryCommand>,
    local_cache: Option<LruCache<String, CachedValue>>,
    mod_count: u32,
}

impl TableData {
    fn new(elements: Option<Vec<TempMetadataId>>) -> Self {
        Self {
            inner: Mutex::new(TableDataInner {
                elements,
                cardinality: UNKNOWN_CARDINALITY,
                ..TableDataInner::default()
            }),
            last_modified: AtomicI64::new(now_millis()),
            last_data_modification: AtomicI64::new(0),
        }
    }

    pub fn last_modified(&self) -> i64 {
        self.last_modified.load(Ordering::Relaxed)
    }

    pub fn last_data_modification(&self) -> i64 {
        self.last_data_modification.load(Ordering::Relaxed)
    }

    /// Mark the backing object as removed. Identity equality is unaffected;
    /// cost-dependent consumers read the sentinel and treat their estimates
    /// as stale.
    pub fn removed(&self) {
        self.last_modified.store(REMOVED, Ordering::Relaxed);
    }

    /// Record `update_count` modified rows. A zero count is a strict no-op.
    /// The data-modification timestamp refreshes on every nonzero call; the
    /// cost-estimate timestamp refreshes only once the accumulated count
    /// exceeds [`MOD_COUNT_FOR_COST_UPDATE`], which throttles invalidation
    /// under high-frequency small updates.
    pub fn data_modified(&self, update_count: u32) {
        if update_count == 0 {
            return;
        }
        let ts = now_millis();
        {
            let mut inner = self.inner.lock();
            inner.mod_count += update_count;
            if inner.mod_count > MOD_COUNT_FOR_COST_UPDATE {
                self.last_modified.store(ts, Ordering::Relaxed);
                inner.mod_count = 0;
            }
        }
        self.last_data_modification.store(ts, Ordering::Relaxed);
    }
}

impl Default for TableData {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Shared immutable fallback for identities that never allocated table data.
/// Reads against it yield defaults; writes are rejected at the id layer.
static DUMMY_DATA: LazyLock<Arc<TableData>> = LazyLock::new(|| Arc::new(TableData::default()));

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[derive(Debug, Default)]
struct ElementFlags {
    auto_increment: bool,
    not_null: bool,
    updatable: bool,
}

/// State shared by every copy of one identity.
#[derive(Debug)]
struct IdState {
    metadata_type: Mutex<TempMetadataType>,
    position: AtomicUsize,
    value_type: Option<DataType>,
    flags: Mutex<ElementFlags>,
    original: Mutex<Option<String>>,
    data: Option<Arc<TableData>>,
}

/// A temporary metadata identity, in group form (ordered element list) or
/// element form (value type plus column attributes).
///
/// Equality and hashing consider only the canonical id string, never the
/// mutable state, so an identity remains a valid key in hash-based
/// registries while its [`TableData`] mutates concurrently.
#[derive(Debug, Clone)]
pub struct TempMetadataId {
    id: Arc<str>,
    state: Arc<IdState>,
}

impl TempMetadataId {
    /// Group form, VIRTUAL variant. Each element is assigned its 1-based
    /// position in list order.
    pub fn group(id: impl AsRef<str>, elements: Vec<TempMetadataId>) -> Self {
        Self::group_with_type(id, elements, TempMetadataType::Virtual)
    }

    /// Group form with an explicit variant.
    pub fn group_with_type(
        id: impl AsRef<str>,
        elements: Vec<TempMetadataId>,
        metadata_type: TempMetadataType,
    ) -> Self {
        for (index, element) in elements.iter().enumerate() {
            element.set_position(index + 1);
        }
        Self {
            id: canonical(id.as_ref()),
            state: Arc::new(IdState {
                metadata_type: Mutex::new(metadata_type),
                position: AtomicUsize::new(0),
                value_type: None,
                flags: Mutex::new(ElementFlags::default()),
                original: Mutex::new(None),
                data: Some(Arc::new(TableData::new(Some(elements)))),
            }),
        }
    }

    /// Element form.
    pub fn element(id: impl AsRef<str>, value_type: DataType) -> Self {
        Self {
            id: canonical(id.as_ref()),
            state: Arc::new(IdState {
                metadata_type: Mutex::new(TempMetadataType::Virtual),
                position: AtomicUsize::new(0),
                value_type: Some(value_type),
                flags: Mutex::new(ElementFlags::default()),
                original: Mutex::new(None),
                data: None,
            }),
        }
    }

    /// Element form carrying a back-reference to the original catalog
    /// identity it shadows.
    pub fn element_with_original(
        id: impl AsRef<str>,
        value_type: DataType,
        original: impl Into<String>,
    ) -> Self {
        let element = Self::element(id, value_type);
        *element.state.original.lock() = Some(original.into());
        element
    }

    /// The canonical (upper-cased, fully qualified) id string.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Short name: the segment after the final dot.
    pub fn name(&self) -> &str {
        self.id.rsplit('.').next().unwrap_or(&self.id)
    }

    pub fn metadata_type(&self) -> TempMetadataType {
        *self.state.metadata_type.lock()
    }

    pub fn set_metadata_type(&self, metadata_type: TempMetadataType) {
        *self.state.metadata_type.lock() = metadata_type;
    }

    pub fn is_virtual(&self) -> bool {
        self.metadata_type() == TempMetadataType::Virtual
    }

    pub fn is_temp_table(&self) -> bool {
        self.metadata_type() == TempMetadataType::Temp
    }

    pub fn is_scalar_group(&self) -> bool {
        self.metadata_type() == TempMetadataType::Scalar
    }

    /// Toggle between the TEMP and VIRTUAL variants.
    pub fn set_temp_table(&self, temp: bool) {
        self.set_metadata_type(if temp {
            TempMetadataType::Temp
        } else {
            TempMetadataType::Virtual
        });
    }

    /// Ordered element identities. Empty for element-form identities.
    pub fn elements(&self) -> Vec<TempMetadataId> {
        self.table_data()
            .inner
            .lock()
            .elements
            .clone()
            .unwrap_or_default()
    }

    /// Element identity with the given short name, if the group declares it.
    pub fn element_by_name(&self, name: &str) -> Option<TempMetadataId> {
        self.elements()
            .into_iter()
            .find(|element| element.name().eq_ignore_ascii_case(name))
    }

    /// Append one element: it takes the next position and the local cache is
    /// invalidated, since derived lookups may depend on the element list.
    pub fn add_element(&self, element: TempMetadataId) {
        let data = self.table_data();
        let mut inner = data.inner.lock();
        if let Some(elements) = inner.elements.as_mut() {
            elements.push(element.clone());
            element.set_position(elements.len());
        }
        if let Some(cache) = inner.local_cache.as_mut() {
            cache.clear();
        }
    }

    /// 1-based ordinal within the owning group. Zero when unassigned.
    pub fn position(&self) -> usize {
        self.state.position.load(Ordering::Relaxed)
    }

    pub fn set_position(&self, position: usize) {
        self.state.position.store(position, Ordering::Relaxed);
    }

    /// Value type. `None` for group-form identities.
    pub fn value_type(&self) -> Option<DataType> {
        self.state.value_type
    }

    pub fn is_auto_increment(&self) -> bool {
        self.state.flags.lock().auto_increment
    }

    pub fn set_auto_increment(&self, auto_increment: bool) {
        self.state.flags.lock().auto_increment = auto_increment;
    }

    pub fn is_not_null(&self) -> bool {
        self.state.flags.lock().not_null
    }

    pub fn set_not_null(&self, not_null: bool) {
        self.state.flags.lock().not_null = not_null;
    }

    pub fn is_updatable(&self) -> bool {
        self.state.flags.lock().updatable
    }

    pub fn set_updatable(&self, updatable: bool) {
        self.state.flags.lock().updatable = updatable;
    }

    pub fn original_metadata_id(&self) -> Option<String> {
        self.state.original.lock().clone()
    }

    pub fn set_original_metadata_id(&self, original: impl Into<String>) {
        *self.state.original.lock() = Some(original.into());
    }

    pub fn cardinality(&self) -> i64 {
        self.table_data().inner.lock().cardinality
    }

    pub fn set_cardinality(&self, cardinality: i64) {
        if let Some(data) = self.state.data.as_ref() {
            data.inner.lock().cardinality = cardinality;
        }
    }

    pub fn primary_key(&self) -> Option<Vec<TempMetadataId>> {
        self.table_data().inner.lock().primary_key.clone()
    }

    pub fn set_primary_key(&self, primary_key: Vec<TempMetadataId>) {
        if let Some(data) = self.state.data.as_ref() {
            data.inner.lock().primary_key = Some(primary_key);
        }
    }

    pub fn unique_keys(&self) -> Vec<Vec<TempMetadataId>> {
        self.table_data().inner.lock().unique_keys.clone()
    }

    pub fn add_unique_key(&self, key: Vec<TempMetadataId>) {
        if let Some(data) = self.state.data.as_ref() {
            data.inner.lock().unique_keys.push(key);
        }
    }

    pub fn access_patterns(&self) -> Vec<TempMetadataId> {
        self.table_data().inner.lock().access_patterns.clone()
    }

    pub fn set_access_patterns(&self, access_patterns: Vec<TempMetadataId>) {
        if let Some(data) = self.state.data.as_ref() {
            data.inner.lock().access_patterns = access_patterns;
        }
    }

    pub fn indexes(&self) -> Vec<TempMetadataId> {
        self.table_data().inner.lock().indexes.clone()
    }

    /// Record a computed index over this group: a nested INDEX-variant
    /// identity holding the indexed columns.
    pub fn add_index(&self, original: Option<String>, columns: Vec<TempMetadataId>) {
        let Some(data) = self.state.data.as_ref() else {
            return;
        };
        let index = TempMetadataId::group_with_type(&*self.id, columns, TempMetadataType::Index);
        if let Some(original) = original {
            index.set_original_metadata_id(original);
        }
        data.inner.lock().indexes.push(index);
    }

    /// Defining query for a virtual group.
    pub fn query_definition(&self) -> Option<QueryCommand> {
        self.table_data().inner.lock().query_definition.clone()
    }

    pub fn set_query_definition(&self, query: QueryCommand) {
        if let Some(data) = self.state.data.as_ref() {
            data.inner.lock().query_definition = Some(query);
        }
    }

    /// Look up a cached property. Promotes the entry in LRU order.
    pub fn get_property(&self, key: &str) -> Option<CachedValue> {
        let data = self.table_data();
        let mut inner = data.inner.lock();
        inner.local_cache.as_mut()?.get(key).cloned()
    }

    /// Cache a property, creating the bounded cache on first use. Returns
    /// the displaced value, if any.
    pub fn set_property(&self, key: impl Into<String>, value: CachedValue) -> Option<CachedValue> {
        let data = self.state.data.as_ref()?;
        let mut inner = data.inner.lock();
        let cache = inner.local_cache.get_or_insert_with(|| {
            LruCache::new(NonZeroUsize::new(LOCAL_CACHE_SIZE).expect("cache size is nonzero"))
        });
        cache.put(key.into(), value)
    }

    pub fn last_modified(&self) -> i64 {
        self.table_data().last_modified()
    }

    pub fn last_data_modification(&self) -> i64 {
        self.table_data().last_data_modification()
    }

    pub fn removed(&self) {
        self.table_data_shared().removed();
    }

    pub fn data_modified(&self, update_count: u32) {
        self.table_data_shared().data_modified(update_count);
    }

    /// The shared table data, for callers that keep a group alive beyond one
    /// command (e.g. a schema-wide temp table).
    pub fn table_data_shared(&self) -> Arc<TableData> {
        self.table_data().clone()
    }

    fn table_data(&self) -> &Arc<TableData> {
        self.state.data.as_ref().unwrap_or_else(|| &*DUMMY_DATA)
    }
}

fn canonical(id: &str) -> Arc<str> {
    Arc::from(id.to_ascii_uppercase())
}

impl PartialEq for TempMetadataId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TempMetadataId {}

impl Hash for TempMetadataId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TempMetadataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn element(id: &str) -> TempMetadataId {
        TempMetadataId::element(id, DataType::Integer)
    }

    fn hash_of(id: &TempMetadataId) -> u64 {
        let mut hasher = DefaultHasher::new();
        id.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_identity_is_the_id_string_alone() {
        let a = TempMetadataId::group("t", vec![element("t.x")]);
        let b = TempMetadataId::group("T", vec![element("T.y"), element("T.z")]);
        b.set_cardinality(500);

        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a.elements().len(), b.elements().len());
    }

    #[test]
    fn test_position_assignment() {
        let group = TempMetadataId::group("g", vec![element("g.a"), element("g.b"), element("g.c")]);
        let positions: Vec<usize> = group.elements().iter().map(|e| e.position()).collect();
        assert_eq!(positions, vec![1, 2, 3]);

        group.add_element(element("g.d"));
        let appended = group.element_by_name("d").unwrap();
        assert_eq!(appended.position(), 4);
    }

    #[test]
    fn test_append_invalidates_local_cache() {
        let group = TempMetadataId::group("g", vec![element("g.a")]);
        group.set_property("cost", Arc::new(10u32));
        assert!(group.get_property("cost").is_some());

        group.add_element(element("g.b"));
        assert!(group.get_property("cost").is_none());
    }

    #[test]
    fn test_local_cache_is_bounded() {
        let group = TempMetadataId::group("g", vec![]);
        for i in 0..12 {
            group.set_property(format!("k{}", i), Arc::new(i));
        }
        // Oldest entries were evicted at the capacity of 8.
        assert!(group.get_property("k0").is_none());
        assert!(group.get_property("k11").is_some());
    }

    #[test]
    fn test_element_form_degrades_to_defaults() {
        let id = element("g.a");
        assert_eq!(id.cardinality(), UNKNOWN_CARDINALITY);
        assert!(id.elements().is_empty());
        assert!(id.primary_key().is_none());
        assert!(id.unique_keys().is_empty());
        assert!(id.access_patterns().is_empty());
        assert!(id.indexes().is_empty());
        // Writes against the missing record are rejected, not stored.
        id.set_cardinality(10);
        assert_eq!(id.cardinality(), UNKNOWN_CARDINALITY);
    }

    #[test]
    fn test_variant_toggle() {
        let group = TempMetadataId::group("g", vec![]);
        assert!(group.is_virtual());
        group.set_temp_table(true);
        assert!(group.is_temp_table());
        group.set_temp_table(false);
        assert!(group.is_virtual());
        group.set_metadata_type(TempMetadataType::Scalar);
        assert!(group.is_scalar_group());
    }

    #[test]
    fn test_modification_throttling() {
        let group = TempMetadataId::group("g", vec![]);
        // Pin the cost timestamp at the removed sentinel so a refresh is
        // observable regardless of clock granularity.
        group.removed();
        assert_eq!(group.last_modified(), REMOVED);

        for _ in 0..8 {
            group.data_modified(1);
            assert_eq!(group.last_modified(), REMOVED);
            assert!(group.last_data_modification() > 0);
        }

        // The ninth unit update pushes the accumulated count past the
        // threshold of 8 and finally promotes the cost timestamp.
        group.data_modified(1);
        assert!(group.last_modified() > 0);
    }

    #[test]
    fn test_zero_update_count_is_a_no_op() {
        let group = TempMetadataId::group("g", vec![]);
        group.removed();
        group.data_modified(0);
        assert_eq!(group.last_modified(), REMOVED);
        assert_eq!(group.last_data_modification(), 0);
    }

    #[test]
    fn test_table_data_shared_across_clones() {
        let group = TempMetadataId::group("g", vec![]);
        let copy = group.clone();
        copy.set_cardinality(42);
        assert_eq!(group.cardinality(), 42);
    }

    #[test]
    fn test_add_index() {
        let group = TempMetadataId::group("g", vec![element("g.a")]);
        group.add_index(Some("pm1.g.idx".into()), vec![element("g.a")]);
        let indexes = group.indexes();
        assert_eq!(indexes.len(), 1);
        assert_eq!(indexes[0].metadata_type(), TempMetadataType::Index);
        assert_eq!(
            indexes[0].original_metadata_id().as_deref(),
            Some("pm1.g.idx")
        );
    }
}
