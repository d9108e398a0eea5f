//! PostgreSQL implementation of the station registry store.
//!
//! Every insert is a single multi-row `INSERT ... VALUES ... RETURNING` built
//! with `sqlx::QueryBuilder`. `RETURNING` makes no ordering promise, so each
//! statement echoes a business key next to the id (`name`, `mnc`, `key` or
//! `legacy_id`) and ids are matched back to the input rows by that key.
//!
//! ## Database Tables
//!
//! - `regions`, `operators`, `locations`, `bands`, `stations`, `cells`
//! - `gsm_cells`, `umts_cells`, `lte_cells`, `nr_cells`: per-RAT cell details
use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::debug;

use crate::types::{
    CellDetails, GsmDetails, LteDetails, NewBand, NewCell, NewCellDetails, NewLocation,
    NewOperator, NewRegion, NewStation, NrDetails, StoredOperator, UmtsDetails,
};
use crate::{RegistryStore, RegistryStoreError};

/// PostgreSQL implementation of the registry store.
pub struct PostgresRegistryStore {
    pool: PgPool,
}

impl PostgresRegistryStore {
    /// Creates a new store on top of a configured connection pool.
    ///
    /// The pool must point at a database with the registry schema applied
    /// (see `migrations/`).
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs `builder` with `RETURNING id, <key_column>` and returns the ids in
    /// the order of `keys`, which holds the key of every inserted row.
    async fn fetch_ids(
        &self,
        mut builder: QueryBuilder<'_, Postgres>,
        table: &'static str,
        key_column: &'static str,
        keys: Vec<String>,
    ) -> Result<Vec<i64>, RegistryStoreError> {
        builder.push(format!(" RETURNING id, {key_column}::text"));
        let returned: Vec<(i64, String)> = builder
            .build_query_as::<(i64, String)>()
            .fetch_all(&self.pool)
            .await?;

        let ids = ids_in_input_order(table, &keys, returned)?;
        debug!(table, rows = ids.len(), "Inserted batch");
        Ok(ids)
    }

    async fn insert_gsm_details(
        &self,
        rows: &[(i64, &GsmDetails)],
    ) -> Result<u64, RegistryStoreError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO gsm_cells (cell_id, bsic)");
        builder.push_values(rows, |mut b, (cell_id, details)| {
            b.push_bind(*cell_id).push_bind(details.bsic);
        });
        Ok(builder.build().execute(&self.pool).await?.rows_affected())
    }

    async fn insert_umts_details(
        &self,
        rows: &[(i64, &UmtsDetails)],
    ) -> Result<u64, RegistryStoreError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut builder =
            QueryBuilder::<Postgres>::new("INSERT INTO umts_cells (cell_id, rnc, psc)");
        builder.push_values(rows, |mut b, (cell_id, details)| {
            b.push_bind(*cell_id)
                .push_bind(details.rnc)
                .push_bind(details.psc);
        });
        Ok(builder.build().execute(&self.pool).await?.rows_affected())
    }

    async fn insert_lte_details(
        &self,
        rows: &[(i64, &LteDetails)],
    ) -> Result<u64, RegistryStoreError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut builder =
            QueryBuilder::<Postgres>::new("INSERT INTO lte_cells (cell_id, enbid, pci, tac)");
        builder.push_values(rows, |mut b, (cell_id, details)| {
            b.push_bind(*cell_id)
                .push_bind(details.enbid)
                .push_bind(details.pci)
                .push_bind(details.tac);
        });
        Ok(builder.build().execute(&self.pool).await?.rows_affected())
    }

    async fn insert_nr_details(
        &self,
        rows: &[(i64, &NrDetails)],
    ) -> Result<u64, RegistryStoreError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut builder =
            QueryBuilder::<Postgres>::new("INSERT INTO nr_cells (cell_id, gnbid, pci, nr_type)");
        builder.push_values(rows, |mut b, (cell_id, details)| {
            b.push_bind(*cell_id)
                .push_bind(details.gnbid)
                .push_bind(details.pci)
                .push_bind(details.nr_type.clone());
        });
        Ok(builder.build().execute(&self.pool).await?.rows_affected())
    }
}

/// Matches `(id, key)` pairs from `RETURNING` to `keys`. Rows sharing a key
/// take their ids in the order they were returned.
fn ids_in_input_order(
    table: &'static str,
    keys: &[String],
    returned: Vec<(i64, String)>,
) -> Result<Vec<i64>, RegistryStoreError> {
    if returned.len() != keys.len() {
        return Err(RegistryStoreError::ResultCountMismatch {
            table,
            expected: keys.len(),
            actual: returned.len(),
        });
    }

    let mut by_key: HashMap<String, VecDeque<i64>> = HashMap::with_capacity(returned.len());
    for (id, key) in returned {
        by_key.entry(key).or_default().push_back(id);
    }

    keys.iter()
        .map(|key| {
            by_key
                .get_mut(key)
                .and_then(VecDeque::pop_front)
                .ok_or_else(|| RegistryStoreError::UnmatchedKey {
                    table,
                    key: key.clone(),
                })
        })
        .collect()
}

#[async_trait]
impl RegistryStore for PostgresRegistryStore {
    async fn insert_regions(&self, rows: &[NewRegion]) -> Result<Vec<i64>, RegistryStoreError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO regions (name)");
        builder.push_values(rows, |mut b, region| {
            b.push_bind(region.name.clone());
        });
        let keys = rows.iter().map(|r| r.name.clone()).collect();
        self.fetch_ids(builder, "regions", "name", keys).await
    }

    async fn insert_operators(
        &self,
        rows: &[NewOperator],
    ) -> Result<Vec<i64>, RegistryStoreError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO operators (name, mnc)");
        builder.push_values(rows, |mut b, operator| {
            b.push_bind(operator.name.clone())
                .push_bind(operator.mnc.clone());
        });
        let keys = rows.iter().map(|o| o.mnc.clone()).collect();
        self.fetch_ids(builder, "operators", "mnc", keys).await
    }

    async fn insert_locations(
        &self,
        rows: &[NewLocation],
    ) -> Result<Vec<i64>, RegistryStoreError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO locations (legacy_id, region_id, city, address, latitude, longitude)",
        );
        builder.push_values(rows, |mut b, location| {
            b.push_bind(location.legacy_id)
                .push_bind(location.region_id)
                .push_bind(location.city.clone())
                .push_bind(location.address.clone())
                .push_bind(location.latitude)
                .push_bind(location.longitude);
        });
        let keys = rows.iter().map(|l| l.legacy_id.to_string()).collect();
        self.fetch_ids(builder, "locations", "legacy_id", keys).await
    }

    async fn insert_bands(&self, rows: &[NewBand]) -> Result<Vec<i64>, RegistryStoreError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder =
            QueryBuilder::<Postgres>::new("INSERT INTO bands (key, standard, frequency, duplex)");
        builder.push_values(rows, |mut b, band| {
            b.push_bind(band.key.clone())
                .push_bind(band.standard.as_str())
                .push_bind(band.frequency)
                .push_bind(band.duplex.map(|d| d.as_str()));
        });
        let keys = rows.iter().map(|b| b.key.clone()).collect();
        self.fetch_ids(builder, "bands", "key", keys).await
    }

    async fn insert_stations(
        &self,
        rows: &[NewStation],
    ) -> Result<Vec<i64>, RegistryStoreError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO stations (legacy_id, operator_id, location_id, station_code, status, \
             edit_status, rats, notes)",
        );
        builder.push_values(rows, |mut b, station| {
            let rats: Vec<String> = station
                .rats
                .iter()
                .map(|r| r.as_str().to_string())
                .collect();
            b.push_bind(station.legacy_id)
                .push_bind(station.operator_id)
                .push_bind(station.location_id)
                .push_bind(station.station_code.clone())
                .push_bind(station.status.as_str())
                .push_bind(station.edit_status.as_str())
                .push_bind(rats)
                .push_bind(station.notes.clone());
        });
        let keys = rows.iter().map(|s| s.legacy_id.to_string()).collect();
        self.fetch_ids(builder, "stations", "legacy_id", keys).await
    }

    async fn insert_cells(&self, rows: &[NewCell]) -> Result<Vec<i64>, RegistryStoreError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO cells (legacy_id, station_id, band_id, rat, lac, cid, azimuth, notes, \
             is_confirmed, created_at, updated_at)",
        );
        builder.push_values(rows, |mut b, cell| {
            b.push_bind(cell.legacy_id)
                .push_bind(cell.station_id)
                .push_bind(cell.band_id)
                .push_bind(cell.rat.as_str())
                .push_bind(cell.lac)
                .push_bind(cell.cid)
                .push_bind(cell.azimuth)
                .push_bind(cell.notes.clone())
                .push_bind(cell.is_confirmed)
                .push_bind(cell.created_at)
                .push_bind(cell.updated_at);
        });
        let keys = rows.iter().map(|c| c.legacy_id.to_string()).collect();
        self.fetch_ids(builder, "cells", "legacy_id", keys).await
    }

    async fn insert_cell_details(
        &self,
        rows: &[NewCellDetails],
    ) -> Result<u64, RegistryStoreError> {
        let mut gsm = Vec::new();
        let mut umts = Vec::new();
        let mut lte = Vec::new();
        let mut nr = Vec::new();

        for row in rows {
            match &row.details {
                CellDetails::Gsm(details) => gsm.push((row.cell_id, details)),
                CellDetails::Umts(details) => umts.push((row.cell_id, details)),
                CellDetails::Lte(details) => lte.push((row.cell_id, details)),
                CellDetails::Nr(details) => nr.push((row.cell_id, details)),
            }
        }

        let written = self.insert_gsm_details(&gsm).await?
            + self.insert_umts_details(&umts).await?
            + self.insert_lte_details(&lte).await?
            + self.insert_nr_details(&nr).await?;
        Ok(written)
    }

    async fn list_operators(&self) -> Result<Vec<StoredOperator>, RegistryStoreError> {
        let rows = sqlx::query("SELECT id, name, mnc, parent_id FROM operators ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| StoredOperator {
                id: row.get("id"),
                name: row.get("name"),
                mnc: row.get("mnc"),
                parent_id: row.get("parent_id"),
            })
            .collect())
    }

    async fn set_operator_parent(
        &self,
        operator_id: i64,
        parent_id: i64,
    ) -> Result<(), RegistryStoreError> {
        let result = sqlx::query("UPDATE operators SET parent_id = $1 WHERE id = $2")
            .bind(parent_id)
            .bind(operator_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RegistryStoreError::UnknownId {
                table: "operators",
                id: operator_id,
            });
        }
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
