//! Metadata identities: the permanent catalog contract and the temporary
//! identities synthesized during resolution

pub mod store;
pub mod temp_id;
pub mod temp_store;

pub use store::{
    Catalog, ColumnMetadata, MetadataStore, ParamDirection, ProcedureMetadata, ProcedureParam,
    TableMetadata,
};
pub use temp_id::{TableData, TempMetadataId, TempMetadataType, UNKNOWN_CARDINALITY};
pub use temp_store::TempMetadataStore;
