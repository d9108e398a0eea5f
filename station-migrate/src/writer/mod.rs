//! Dependency-ordered writer.
//!
//! Each `write_*` method persists one entity type in chunks of `batch_size`
//! and returns the id-map the next phase resolves its foreign keys through.
//! Batches are issued one after another; a failed batch aborts the phase with
//! its 1-based index while earlier batches stay committed.
//!
//! Drafts whose foreign keys do not resolve are rejected here rather than
//! sent to the store. They still count as processed for progress.
mod cells;
mod operators;

use std::collections::HashMap;

use async_trait::async_trait;
use station_registry_repository::types::{NewBand, NewCell, NewLocation, NewRegion, NewStation};
use station_registry_repository::{RegistryStore, RegistryStoreError};
use tracing::{debug, warn};

use crate::config::DEFAULT_BATCH_SIZE;
use crate::errors::{RowRejection, WriteError};
use crate::models::{BandDraft, BandKey, LocationDraft, RegionDraft, StationDraft};
use crate::progress::ProgressReporter;

pub use cells::CellWriteSummary;

/// Legacy id -> id generated by the target store.
pub type IdMap = HashMap<i64, i64>;

/// A canonical row type the store can bulk-insert.
#[async_trait]
pub trait InsertRows: Sized + Send + Sync {
    async fn insert(
        store: &dyn RegistryStore,
        rows: &[Self],
    ) -> Result<Vec<i64>, RegistryStoreError>;
}

#[async_trait]
impl InsertRows for NewRegion {
    async fn insert(
        store: &dyn RegistryStore,
        rows: &[Self],
    ) -> Result<Vec<i64>, RegistryStoreError> {
        store.insert_regions(rows).await
    }
}

#[async_trait]
impl InsertRows for NewLocation {
    async fn insert(
        store: &dyn RegistryStore,
        rows: &[Self],
    ) -> Result<Vec<i64>, RegistryStoreError> {
        store.insert_locations(rows).await
    }
}

#[async_trait]
impl InsertRows for NewBand {
    async fn insert(
        store: &dyn RegistryStore,
        rows: &[Self],
    ) -> Result<Vec<i64>, RegistryStoreError> {
        store.insert_bands(rows).await
    }
}

#[async_trait]
impl InsertRows for NewStation {
    async fn insert(
        store: &dyn RegistryStore,
        rows: &[Self],
    ) -> Result<Vec<i64>, RegistryStoreError> {
        store.insert_stations(rows).await
    }
}

#[async_trait]
impl InsertRows for NewCell {
    async fn insert(
        store: &dyn RegistryStore,
        rows: &[Self],
    ) -> Result<Vec<i64>, RegistryStoreError> {
        store.insert_cells(rows).await
    }
}

/// Number of chunks `len` items split into.
pub fn batch_count(len: usize, batch_size: usize) -> usize {
    len.div_ceil(batch_size)
}

/// Writes canonical entities to a registry store in dependency order.
pub struct RegistryWriter<'a> {
    store: &'a dyn RegistryStore,
    batch_size: usize,
}

impl<'a> RegistryWriter<'a> {
    /// A batch size of zero falls back to the default.
    pub fn new(store: &'a dyn RegistryStore, batch_size: usize) -> Self {
        let batch_size = if batch_size == 0 {
            DEFAULT_BATCH_SIZE
        } else {
            batch_size
        };
        Self { store, batch_size }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Resolves and inserts `drafts` chunk by chunk.
    ///
    /// `resolve` turns a draft into a row or a rejection. Returns each written
    /// draft with its new id, in input order.
    async fn insert_chunks<'d, D, R>(
        &self,
        entity: &'static str,
        drafts: &'d [D],
        progress: &mut dyn ProgressReporter,
        rejected: &mut Vec<RowRejection>,
        mut resolve: impl FnMut(&D) -> Result<R, RowRejection>,
    ) -> Result<Vec<(&'d D, i64)>, WriteError>
    where
        R: InsertRows,
    {
        let batches = batch_count(drafts.len(), self.batch_size);
        let mut written = Vec::with_capacity(drafts.len());

        for (batch_idx, chunk) in drafts.chunks(self.batch_size).enumerate() {
            let mut rows = Vec::with_capacity(chunk.len());
            let mut sources = Vec::with_capacity(chunk.len());
            for draft in chunk {
                match resolve(draft) {
                    Ok(row) => {
                        rows.push(row);
                        sources.push(draft);
                    }
                    Err(rejection) => {
                        warn!(%rejection, "Rejected row");
                        rejected.push(rejection);
                    }
                }
            }

            if !rows.is_empty() {
                let batch = batch_idx + 1;
                let ids = R::insert(self.store, &rows)
                    .await
                    .and_then(|ids| {
                        if ids.len() == rows.len() {
                            Ok(ids)
                        } else {
                            Err(RegistryStoreError::ResultCountMismatch {
                                table: entity,
                                expected: rows.len(),
                                actual: ids.len(),
                            })
                        }
                    })
                    .map_err(|source| WriteError {
                        entity,
                        batch,
                        batches,
                        source,
                    })?;
                debug!(entity, batch, batches, rows = rows.len(), "Wrote batch");
                written.extend(sources.into_iter().zip(ids));
            }

            progress.advance(chunk.len());
        }

        Ok(written)
    }

    /// Writes regions. Every legacy id folded into a region maps to its new id.
    pub async fn write_regions(
        &self,
        drafts: &[RegionDraft],
        progress: &mut dyn ProgressReporter,
        rejected: &mut Vec<RowRejection>,
    ) -> Result<IdMap, WriteError> {
        let written = self
            .insert_chunks("region", drafts, progress, rejected, |draft| {
                Ok(NewRegion {
                    name: draft.name.clone(),
                })
            })
            .await?;

        Ok(written
            .into_iter()
            .flat_map(|(draft, id)| draft.legacy_ids.iter().map(move |legacy| (*legacy, id)))
            .collect())
    }

    pub async fn write_locations(
        &self,
        drafts: &[LocationDraft],
        regions: &IdMap,
        progress: &mut dyn ProgressReporter,
        rejected: &mut Vec<RowRejection>,
    ) -> Result<IdMap, WriteError> {
        let written = self
            .insert_chunks("location", drafts, progress, rejected, |draft| {
                let region_id = regions.get(&draft.legacy_region_id).ok_or_else(|| {
                    RowRejection::new(
                        "location",
                        draft.legacy_id,
                        format!("unresolved region {}", draft.legacy_region_id),
                    )
                })?;
                Ok(NewLocation {
                    legacy_id: draft.legacy_id,
                    region_id: *region_id,
                    city: draft.city.clone(),
                    address: draft.address.clone(),
                    latitude: draft.latitude,
                    longitude: draft.longitude,
                })
            })
            .await?;

        Ok(written
            .into_iter()
            .map(|(draft, id)| (draft.legacy_id, id))
            .collect())
    }

    /// Writes bands and returns their ids keyed by composite band key.
    pub async fn write_bands(
        &self,
        drafts: &[BandDraft],
        progress: &mut dyn ProgressReporter,
        rejected: &mut Vec<RowRejection>,
    ) -> Result<HashMap<BandKey, i64>, WriteError> {
        let written = self
            .insert_chunks("band", drafts, progress, rejected, |draft| Ok(draft.to_row()))
            .await?;

        Ok(written
            .into_iter()
            .map(|(draft, id)| (draft.key, id))
            .collect())
    }

    pub async fn write_stations(
        &self,
        drafts: &[StationDraft],
        operators: &IdMap,
        locations: &IdMap,
        progress: &mut dyn ProgressReporter,
        rejected: &mut Vec<RowRejection>,
    ) -> Result<IdMap, WriteError> {
        let written = self
            .insert_chunks("station", drafts, progress, rejected, |draft| {
                let unresolved = |what: &str, id: i64| {
                    RowRejection::new("station", draft.legacy_id, format!("unresolved {what} {id}"))
                };
                let operator_id = operators
                    .get(&draft.legacy_network_id)
                    .ok_or_else(|| unresolved("operator", draft.legacy_network_id))?;
                let location_id = locations
                    .get(&draft.legacy_location_id)
                    .ok_or_else(|| unresolved("location", draft.legacy_location_id))?;
                Ok(NewStation {
                    legacy_id: draft.legacy_id,
                    operator_id: *operator_id,
                    location_id: *location_id,
                    station_code: draft.station_code.clone(),
                    status: draft.status,
                    edit_status: draft.edit_status,
                    rats: draft.rats.clone(),
                    notes: draft.notes.clone(),
                })
            })
            .await?;

        Ok(written
            .into_iter()
            .map(|(draft, id)| (draft.legacy_id, id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use station_registry_repository::types::{EditStatus, Rat, StationStatus};
    use station_registry_repository::InMemoryRegistryStore;

    use super::*;
    use crate::progress::RecordingProgress;

    fn regions(count: usize) -> Vec<RegionDraft> {
        (0..count)
            .map(|i| RegionDraft {
                name: format!("Region {i}"),
                legacy_ids: vec![i as i64 + 1],
            })
            .collect()
    }

    #[tokio::test]
    async fn drafts_are_split_into_fixed_size_batches() {
        let store = InMemoryRegistryStore::new();
        let writer = RegistryWriter::new(&store, 500);
        let mut progress = RecordingProgress::new();
        progress.begin_phase("regions", 1234);
        let mut rejected = Vec::new();

        let ids = writer
            .write_regions(&regions(1234), &mut progress, &mut rejected)
            .await
            .unwrap();

        assert_eq!(ids.len(), 1234);
        assert_eq!(store.batch_sizes("regions"), vec![500, 500, 234]);
        let advances = progress.advances("regions");
        assert_eq!(advances.len(), 3);
        assert_eq!(advances.iter().sum::<usize>(), 1234);
    }

    #[tokio::test]
    async fn failed_batch_reports_its_index_and_keeps_earlier_batches() {
        let store = InMemoryRegistryStore::new().failing_on("regions", 2);
        let writer = RegistryWriter::new(&store, 500);
        let mut progress = RecordingProgress::new();
        let mut rejected = Vec::new();

        let err = writer
            .write_regions(&regions(1234), &mut progress, &mut rejected)
            .await
            .unwrap_err();

        assert_eq!(err.entity, "region");
        assert_eq!(err.batch, 2);
        assert_eq!(err.batches, 3);
        assert_eq!(store.regions().len(), 500);
    }

    #[tokio::test]
    async fn folded_regions_map_every_legacy_id() {
        let store = InMemoryRegistryStore::new();
        let writer = RegistryWriter::new(&store, 0);
        let drafts = vec![RegionDraft {
            name: "Mazowieckie".to_string(),
            legacy_ids: vec![4, 9],
        }];

        let ids = writer
            .write_regions(&drafts, &mut RecordingProgress::new(), &mut Vec::new())
            .await
            .unwrap();

        assert_eq!(writer.batch_size(), DEFAULT_BATCH_SIZE);
        assert_eq!(ids.get(&4), ids.get(&9));
    }

    #[tokio::test]
    async fn stations_only_reference_written_operators_and_locations() {
        let store = InMemoryRegistryStore::new();
        let writer = RegistryWriter::new(&store, 2);
        let mut progress = RecordingProgress::new();
        let mut rejected = Vec::new();

        let region_ids = writer
            .write_regions(&regions(1), &mut progress, &mut rejected)
            .await
            .unwrap();
        let operator_ids = writer
            .write_operators(
                &[crate::models::OperatorDraft {
                    name: "Orange".to_string(),
                    mnc: "26003".to_string(),
                    parent_mnc: None,
                    legacy_ids: vec![7],
                }],
                &mut progress,
                &mut rejected,
            )
            .await
            .unwrap();
        let location_ids = writer
            .write_locations(
                &[LocationDraft {
                    legacy_id: 30,
                    legacy_region_id: 1,
                    city: Some("Warszawa".to_string()),
                    address: None,
                    latitude: 52.2,
                    longitude: 21.0,
                }],
                &region_ids,
                &mut progress,
                &mut rejected,
            )
            .await
            .unwrap();

        let station = |legacy_id, legacy_network_id| StationDraft {
            legacy_id,
            legacy_network_id,
            legacy_location_id: 30,
            station_code: format!("S{legacy_id}"),
            status: StationStatus::Active,
            edit_status: EditStatus::Published,
            rats: vec![Rat::Gsm],
            notes: None,
        };
        let drafts = vec![station(100, 7), station(101, 8), station(102, 7)];

        progress.begin_phase("stations", drafts.len());
        let station_ids = writer
            .write_stations(&drafts, &operator_ids, &location_ids, &mut progress, &mut rejected)
            .await
            .unwrap();

        assert_eq!(station_ids.len(), 2);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].legacy_id, Some(101));
        assert_eq!(progress.advances("stations"), vec![2, 1]);
        for (_, station) in store.stations() {
            assert!(operator_ids.values().any(|id| *id == station.operator_id));
            assert!(location_ids.values().any(|id| *id == station.location_id));
        }
    }
}
