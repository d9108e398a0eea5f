//! In-memory registry store for testing and dry runs.
//!
//! The `InMemoryRegistryStore` enforces the same uniqueness rules as the
//! PostgreSQL schema (region name, operator MNC, band key, one details row
//! per cell), checks foreign keys against hash indices, and records the size
//! of every insert batch it receives, so tests can assert on batching without
//! a database.
//!
//! # Example
//!
//! ```ignore
//! use station_registry_repository::{InMemoryRegistryStore, RegistryStore};
//!
//! let store = InMemoryRegistryStore::new().failing_on("stations", 2);
//! // The second insert into `stations` now returns an error.
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::types::{
    NewBand, NewCell, NewCellDetails, NewLocation, NewOperator, NewRegion, NewStation, Rat,
    StoredOperator,
};
use crate::{RegistryStore, RegistryStoreError};

/// Ids and unique keys of stored rows, so every check is a hash lookup.
#[derive(Default)]
struct Indices {
    region_ids: HashSet<i64>,
    region_names: HashSet<String>,
    operator_positions: HashMap<i64, usize>,
    operator_mncs: HashSet<String>,
    location_ids: HashSet<i64>,
    band_ids: HashSet<i64>,
    band_keys: HashSet<String>,
    station_ids: HashSet<i64>,
    cell_rats: HashMap<i64, Rat>,
    detailed_cells: HashSet<i64>,
}

#[derive(Default)]
struct State {
    next_id: i64,
    regions: Vec<(i64, NewRegion)>,
    operators: Vec<StoredOperator>,
    locations: Vec<(i64, NewLocation)>,
    bands: Vec<(i64, NewBand)>,
    stations: Vec<(i64, NewStation)>,
    cells: Vec<(i64, NewCell)>,
    cell_details: Vec<NewCellDetails>,
    index: Indices,
    batches: Vec<(&'static str, usize)>,
    fail_on: Option<(String, usize)>,
    closed: bool,
}

impl State {
    fn allocate(&mut self, count: usize) -> Vec<i64> {
        (0..count)
            .map(|_| {
                self.next_id += 1;
                self.next_id
            })
            .collect()
    }

    /// Records the batch and fails it if it is the configured one.
    fn record_batch(&mut self, table: &'static str, rows: usize) -> Result<(), RegistryStoreError> {
        self.batches.push((table, rows));
        let ordinal = self.batches.iter().filter(|(t, _)| *t == table).count();
        match &self.fail_on {
            Some((fail_table, fail_ordinal)) if fail_table == table && *fail_ordinal == ordinal => {
                Err(RegistryStoreError::Rejected(format!(
                    "injected failure on {table} batch {ordinal}"
                )))
            }
            _ => Ok(()),
        }
    }
}

fn require(ids: &HashSet<i64>, table: &'static str, id: i64) -> Result<(), RegistryStoreError> {
    if ids.contains(&id) {
        Ok(())
    } else {
        Err(RegistryStoreError::UnknownId { table, id })
    }
}

/// Fails on the first key already stored in `existing` or repeated in `keys`.
fn require_unique<'k>(
    existing: &HashSet<String>,
    table: &'static str,
    keys: impl IntoIterator<Item = &'k str>,
) -> Result<(), RegistryStoreError> {
    let mut batch = HashSet::new();
    for key in keys {
        if existing.contains(key) || !batch.insert(key) {
            return Err(RegistryStoreError::DuplicateKey {
                table,
                key: key.to_string(),
            });
        }
    }
    Ok(())
}

/// Registry store that keeps every written row in memory.
#[derive(Default)]
pub struct InMemoryRegistryStore {
    state: Mutex<State>,
}

impl InMemoryRegistryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `ordinal`-th (1-based) insert into `table` fail.
    pub fn failing_on(self, table: &str, ordinal: usize) -> Self {
        self.lock().fail_on = Some((table.to_string(), ordinal));
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn regions(&self) -> Vec<(i64, NewRegion)> {
        self.lock().regions.clone()
    }

    pub fn operators(&self) -> Vec<StoredOperator> {
        self.lock().operators.clone()
    }

    pub fn locations(&self) -> Vec<(i64, NewLocation)> {
        self.lock().locations.clone()
    }

    pub fn bands(&self) -> Vec<(i64, NewBand)> {
        self.lock().bands.clone()
    }

    pub fn stations(&self) -> Vec<(i64, NewStation)> {
        self.lock().stations.clone()
    }

    pub fn cells(&self) -> Vec<(i64, NewCell)> {
        self.lock().cells.clone()
    }

    pub fn cell_details(&self) -> Vec<NewCellDetails> {
        self.lock().cell_details.clone()
    }

    /// Sizes of every insert batch issued against `table`, in call order.
    pub fn batch_sizes(&self, table: &str) -> Vec<usize> {
        self.lock()
            .batches
            .iter()
            .filter(|(t, _)| *t == table)
            .map(|(_, rows)| *rows)
            .collect()
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

#[async_trait]
impl RegistryStore for InMemoryRegistryStore {
    async fn insert_regions(&self, rows: &[NewRegion]) -> Result<Vec<i64>, RegistryStoreError> {
        let mut state = self.lock();
        state.record_batch("regions", rows.len())?;
        require_unique(
            &state.index.region_names,
            "regions",
            rows.iter().map(|r| r.name.as_str()),
        )?;

        let ids = state.allocate(rows.len());
        for (id, row) in ids.iter().zip(rows) {
            state.index.region_ids.insert(*id);
            state.index.region_names.insert(row.name.clone());
            state.regions.push((*id, row.clone()));
        }
        Ok(ids)
    }

    async fn insert_operators(
        &self,
        rows: &[NewOperator],
    ) -> Result<Vec<i64>, RegistryStoreError> {
        let mut state = self.lock();
        state.record_batch("operators", rows.len())?;
        require_unique(
            &state.index.operator_mncs,
            "operators",
            rows.iter().map(|o| o.mnc.as_str()),
        )?;

        let ids = state.allocate(rows.len());
        for (id, row) in ids.iter().zip(rows) {
            let position = state.operators.len();
            state.index.operator_positions.insert(*id, position);
            state.index.operator_mncs.insert(row.mnc.clone());
            state.operators.push(StoredOperator {
                id: *id,
                name: row.name.clone(),
                mnc: row.mnc.clone(),
                parent_id: None,
            });
        }
        Ok(ids)
    }

    async fn insert_locations(
        &self,
        rows: &[NewLocation],
    ) -> Result<Vec<i64>, RegistryStoreError> {
        let mut state = self.lock();
        state.record_batch("locations", rows.len())?;
        for row in rows {
            require(&state.index.region_ids, "regions", row.region_id)?;
        }

        let ids = state.allocate(rows.len());
        for (id, row) in ids.iter().zip(rows) {
            state.index.location_ids.insert(*id);
            state.locations.push((*id, row.clone()));
        }
        Ok(ids)
    }

    async fn insert_bands(&self, rows: &[NewBand]) -> Result<Vec<i64>, RegistryStoreError> {
        let mut state = self.lock();
        state.record_batch("bands", rows.len())?;
        require_unique(&state.index.band_keys, "bands", rows.iter().map(|b| b.key.as_str()))?;

        let ids = state.allocate(rows.len());
        for (id, row) in ids.iter().zip(rows) {
            state.index.band_ids.insert(*id);
            state.index.band_keys.insert(row.key.clone());
            state.bands.push((*id, row.clone()));
        }
        Ok(ids)
    }

    async fn insert_stations(
        &self,
        rows: &[NewStation],
    ) -> Result<Vec<i64>, RegistryStoreError> {
        let mut state = self.lock();
        state.record_batch("stations", rows.len())?;
        for row in rows {
            if !state.index.operator_positions.contains_key(&row.operator_id) {
                return Err(RegistryStoreError::UnknownId {
                    table: "operators",
                    id: row.operator_id,
                });
            }
            require(&state.index.location_ids, "locations", row.location_id)?;
        }

        let ids = state.allocate(rows.len());
        for (id, row) in ids.iter().zip(rows) {
            state.index.station_ids.insert(*id);
            state.stations.push((*id, row.clone()));
        }
        Ok(ids)
    }

    async fn insert_cells(&self, rows: &[NewCell]) -> Result<Vec<i64>, RegistryStoreError> {
        let mut state = self.lock();
        state.record_batch("cells", rows.len())?;
        for row in rows {
            require(&state.index.station_ids, "stations", row.station_id)?;
            require(&state.index.band_ids, "bands", row.band_id)?;
        }

        let ids = state.allocate(rows.len());
        for (id, row) in ids.iter().zip(rows) {
            state.index.cell_rats.insert(*id, row.rat);
            state.cells.push((*id, row.clone()));
        }
        Ok(ids)
    }

    async fn insert_cell_details(
        &self,
        rows: &[NewCellDetails],
    ) -> Result<u64, RegistryStoreError> {
        let mut state = self.lock();
        state.record_batch("cell_details", rows.len())?;

        let mut batch = HashSet::new();
        for row in rows {
            let Some(rat) = state.index.cell_rats.get(&row.cell_id) else {
                return Err(RegistryStoreError::UnknownId {
                    table: "cells",
                    id: row.cell_id,
                });
            };
            if *rat != row.details.rat()
                || state.index.detailed_cells.contains(&row.cell_id)
                || !batch.insert(row.cell_id)
            {
                return Err(RegistryStoreError::DuplicateKey {
                    table: "cell_details",
                    key: row.cell_id.to_string(),
                });
            }
        }

        state.index.detailed_cells.extend(batch);
        state.cell_details.extend(rows.iter().cloned());
        Ok(rows.len() as u64)
    }

    async fn list_operators(&self) -> Result<Vec<StoredOperator>, RegistryStoreError> {
        Ok(self.lock().operators.clone())
    }

    async fn set_operator_parent(
        &self,
        operator_id: i64,
        parent_id: i64,
    ) -> Result<(), RegistryStoreError> {
        let mut state = self.lock();
        if !state.index.operator_positions.contains_key(&parent_id) {
            return Err(RegistryStoreError::UnknownId {
                table: "operators",
                id: parent_id,
            });
        }
        let Some(position) = state.index.operator_positions.get(&operator_id).copied() else {
            return Err(RegistryStoreError::UnknownId {
                table: "operators",
                id: operator_id,
            });
        };
        state.operators[position].parent_id = Some(parent_id);
        Ok(())
    }

    async fn close(&self) {
        self.lock().closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CellDetails, Duplex, EditStatus, GsmDetails, StationStatus};

    #[tokio::test]
    async fn ids_follow_input_order() {
        let store = InMemoryRegistryStore::new();
        let ids = store
            .insert_regions(&[
                NewRegion { name: "Mazowieckie".to_string() },
                NewRegion { name: "Pomorskie".to_string() },
            ])
            .await
            .unwrap();

        assert_eq!(ids.len(), 2);
        assert!(ids[0] < ids[1]);
        assert_eq!(store.regions()[1].1.name, "Pomorskie");
    }

    #[tokio::test]
    async fn duplicate_band_is_rejected() {
        let store = InMemoryRegistryStore::new();
        let band = NewBand {
            key: "GSM:900:FDD".to_string(),
            standard: Rat::Gsm,
            frequency: 900,
            duplex: Some(Duplex::Fdd),
        };
        let result = store.insert_bands(&[band.clone(), band]).await;
        assert!(matches!(
            result,
            Err(RegistryStoreError::DuplicateKey { table: "bands", .. })
        ));
    }

    #[tokio::test]
    async fn injected_failure_hits_only_the_configured_batch() {
        let store = InMemoryRegistryStore::new().failing_on("regions", 2);
        let first = store
            .insert_regions(&[NewRegion { name: "A".to_string() }])
            .await;
        let second = store
            .insert_regions(&[NewRegion { name: "B".to_string() }])
            .await;

        assert!(first.is_ok());
        assert!(matches!(second, Err(RegistryStoreError::Rejected(_))));
        assert_eq!(store.batch_sizes("regions"), vec![1, 1]);
        assert_eq!(store.regions().len(), 1);
    }

    #[tokio::test]
    async fn parent_link_requires_both_operators() {
        let store = InMemoryRegistryStore::new();
        let ids = store
            .insert_operators(&[NewOperator {
                name: "Orange".to_string(),
                mnc: "26003".to_string(),
            }])
            .await
            .unwrap();

        let result = store.set_operator_parent(ids[0], 999).await;
        assert!(matches!(result, Err(RegistryStoreError::UnknownId { id: 999, .. })));
    }

    async fn seed_station(store: &InMemoryRegistryStore) -> (i64, i64) {
        let region = store
            .insert_regions(&[NewRegion { name: "Opolskie".to_string() }])
            .await
            .unwrap()[0];
        let operator = store
            .insert_operators(&[NewOperator {
                name: "Play".to_string(),
                mnc: "26006".to_string(),
            }])
            .await
            .unwrap()[0];
        let location = store
            .insert_locations(&[NewLocation {
                legacy_id: 1,
                region_id: region,
                city: Some("Opole".to_string()),
                address: None,
                latitude: 50.67,
                longitude: 17.92,
            }])
            .await
            .unwrap()[0];
        let station = store
            .insert_stations(&[NewStation {
                legacy_id: 1,
                operator_id: operator,
                location_id: location,
                station_code: "OPO01".to_string(),
                status: StationStatus::Active,
                edit_status: EditStatus::Published,
                rats: vec![Rat::Gsm],
                notes: None,
            }])
            .await
            .unwrap()[0];
        let band = store
            .insert_bands(&[NewBand {
                key: "GSM:900:-".to_string(),
                standard: Rat::Gsm,
                frequency: 900,
                duplex: None,
            }])
            .await
            .unwrap()[0];
        (station, band)
    }

    fn cell(legacy_id: i64, station_id: i64, band_id: i64) -> NewCell {
        NewCell {
            legacy_id,
            station_id,
            band_id,
            rat: Rat::Gsm,
            lac: Some(1),
            cid: Some(legacy_id),
            azimuth: None,
            notes: None,
            is_confirmed: true,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn foreign_keys_are_checked_across_many_batches() {
        let store = InMemoryRegistryStore::new();
        let (station, band) = seed_station(&store).await;

        for batch in 0..40 {
            let rows: Vec<NewCell> = (0..500)
                .map(|i| cell(batch * 500 + i, station, band))
                .collect();
            store.insert_cells(&rows).await.unwrap();
        }
        let details: Vec<NewCellDetails> = store
            .cells()
            .iter()
            .map(|(id, _)| NewCellDetails {
                cell_id: *id,
                details: CellDetails::Gsm(GsmDetails { bsic: Some(1) }),
            })
            .collect();
        store.insert_cell_details(&details).await.unwrap();

        assert_eq!(store.cells().len(), 20_000);
        assert_eq!(store.cell_details().len(), 20_000);
        let result = store.insert_cells(&[cell(-1, station, band + 1_000_000)]).await;
        assert!(matches!(
            result,
            Err(RegistryStoreError::UnknownId { table: "bands", .. })
        ));
    }

    #[tokio::test]
    async fn second_details_row_for_a_cell_is_rejected() {
        let store = InMemoryRegistryStore::new();
        let (station, band) = seed_station(&store).await;
        let cell_id = store.insert_cells(&[cell(1, station, band)]).await.unwrap()[0];
        let details = NewCellDetails {
            cell_id,
            details: CellDetails::Gsm(GsmDetails::default()),
        };

        store.insert_cell_details(&[details.clone()]).await.unwrap();
        let result = store.insert_cell_details(&[details]).await;

        assert!(matches!(
            result,
            Err(RegistryStoreError::DuplicateKey { table: "cell_details", .. })
        ));
    }

    #[tokio::test]
    async fn parent_link_is_recorded_on_the_child() {
        let store = InMemoryRegistryStore::new();
        let ids = store
            .insert_operators(&[
                NewOperator {
                    name: "Polkomtel".to_string(),
                    mnc: "26001".to_string(),
                },
                NewOperator {
                    name: "Plus MVNO".to_string(),
                    mnc: "26011".to_string(),
                },
            ])
            .await
            .unwrap();

        store.set_operator_parent(ids[1], ids[0]).await.unwrap();

        let operators = store.list_operators().await.unwrap();
        assert_eq!(operators[0].parent_id, None);
        assert_eq!(operators[1].parent_id, Some(ids[0]));
    }
}
