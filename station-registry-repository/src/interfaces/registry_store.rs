//! This module defines the `RegistryStore` trait, the only surface the
//! migration writer uses to persist canonical entities.
use crate::errors::RegistryStoreError;
use crate::types::{
    NewBand, NewCell, NewCellDetails, NewLocation, NewOperator, NewRegion, NewStation,
    StoredOperator,
};

/// A trait that defines the interface for writing into the normalized registry.
///
/// Every `insert_*` method is a single multi-row insert. Implementors must
/// return the generated ids in the same order as the input rows, and must
/// return exactly one id per row.
#[async_trait::async_trait]
pub trait RegistryStore: Send + Sync {
    /// Inserts regions and returns their generated ids in input order.
    async fn insert_regions(&self, rows: &[NewRegion]) -> Result<Vec<i64>, RegistryStoreError>;

    /// Inserts operators without parent links and returns their generated ids
    /// in input order.
    async fn insert_operators(
        &self,
        rows: &[NewOperator],
    ) -> Result<Vec<i64>, RegistryStoreError>;

    /// Inserts locations and returns their generated ids in input order.
    async fn insert_locations(
        &self,
        rows: &[NewLocation],
    ) -> Result<Vec<i64>, RegistryStoreError>;

    /// Inserts bands and returns their generated ids in input order.
    async fn insert_bands(&self, rows: &[NewBand]) -> Result<Vec<i64>, RegistryStoreError>;

    /// Inserts stations and returns their generated ids in input order.
    async fn insert_stations(
        &self,
        rows: &[NewStation],
    ) -> Result<Vec<i64>, RegistryStoreError>;

    /// Inserts base cell rows and returns their generated ids in input order.
    async fn insert_cells(&self, rows: &[NewCell]) -> Result<Vec<i64>, RegistryStoreError>;

    /// Inserts RAT-specific detail rows keyed by already written cell ids.
    ///
    /// Returns the number of rows written.
    async fn insert_cell_details(
        &self,
        rows: &[NewCellDetails],
    ) -> Result<u64, RegistryStoreError>;

    /// Reads back every operator currently in the store.
    async fn list_operators(&self) -> Result<Vec<StoredOperator>, RegistryStoreError>;

    /// Links an operator to its parent operator.
    async fn set_operator_parent(
        &self,
        operator_id: i64,
        parent_id: i64,
    ) -> Result<(), RegistryStoreError>;

    /// Releases the underlying connection resources.
    async fn close(&self);
}
