//! Legacy loader.
//!
//! Finds one dump file per legacy table, merges every matching `INSERT`
//! block into a single row set, renames legacy columns to canonical field
//! names and converts the rows into typed legacy structs.
//!
//! All blocks of a table are read with the column order of the first block
//! that has a column list. Blocks with a different order are not remapped;
//! the loader logs a warning and trusts the first order.

use std::path::Path;

use tracing::{info, warn};

use super::parser::{parse_sql_file, InsertRecord};
use crate::errors::{LoadError, RowRejection};
use crate::models::{FromLegacyRow, LegacyData, LegacyRow, SqlValue};

/// Logical legacy tables, each dumped to its own file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegacyTable {
    Regions,
    Networks,
    Locations,
    BaseStations,
    Cells,
}

impl LegacyTable {
    pub const ALL: [LegacyTable; 5] = [
        LegacyTable::Regions,
        LegacyTable::Networks,
        LegacyTable::Locations,
        LegacyTable::BaseStations,
        LegacyTable::Cells,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LegacyTable::Regions => "regions",
            LegacyTable::Networks => "networks",
            LegacyTable::Locations => "locations",
            LegacyTable::BaseStations => "base_stations",
            LegacyTable::Cells => "cells",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.sql", self.name())
    }

    /// Legacy column name -> canonical field name.
    fn renames(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            LegacyTable::Regions => &[("id_region", "id"), ("region_name", "name")],
            LegacyTable::Networks => &[
                ("id_network", "id"),
                ("network", "name"),
                ("network_name", "name"),
                ("mnc_code", "mnc"),
            ],
            LegacyTable::Locations => &[
                ("id_location", "id"),
                ("id_region", "region_id"),
                ("town", "city"),
                ("lat", "latitude"),
                ("lon", "longitude"),
                ("lng", "longitude"),
            ],
            LegacyTable::BaseStations => &[
                ("id_bts", "id"),
                ("id_network", "network_id"),
                ("id_location", "location_id"),
                ("stationid", "station_code"),
                ("station_id", "station_code"),
                ("is_gsm", "gsm"),
                ("is_umts", "umts"),
                ("is_cdma", "cdma"),
                ("is_lte", "lte"),
                ("is_5g", "nr"),
                ("is_nr", "nr"),
                ("is_iot", "iot"),
                ("edit_state", "edit_status"),
                ("comments", "notes"),
            ],
            LegacyTable::Cells => &[
                ("id_cell", "id"),
                ("id_bts", "base_station_id"),
                ("bts_id", "base_station_id"),
                ("std", "standard"),
                ("freq", "band"),
                ("clid", "cid"),
                ("cellid", "cid"),
                ("azi", "azimuth"),
                ("enbi", "enbid"),
                ("gnbi", "gnbid"),
                ("nrtype", "nr_type"),
                ("confirmed", "is_confirmed"),
                ("date_added", "created_at"),
                ("date_updated", "updated_at"),
                ("comments", "notes"),
            ],
        }
    }

    /// Maps a dump column to its canonical field name. Canonical and unknown
    /// names come back unchanged.
    pub fn canonical_column(&self, column: &str) -> String {
        self.renames()
            .iter()
            .find(|(legacy, _)| legacy.eq_ignore_ascii_case(column))
            .map(|(_, canonical)| canonical.to_string())
            .unwrap_or_else(|| column.to_string())
    }

    /// Whether a dump table name refers to this table, ignoring case and
    /// non-alphanumeric characters.
    pub fn matches(&self, table: &str) -> bool {
        normalize_name(table) == normalize_name(self.name())
    }
}

fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// All rows of one legacy table with canonical column names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl RowSet {
    /// Zips columns with values. Rows whose arity differs from the column
    /// list are rejected.
    pub fn into_legacy_rows(
        self,
        entity: &'static str,
        rejected: &mut Vec<RowRejection>,
    ) -> Vec<LegacyRow> {
        let columns = self.columns;
        let mut rows = Vec::with_capacity(self.rows.len());

        for values in self.rows {
            if values.len() != columns.len() {
                let legacy_id = match values.first() {
                    Some(SqlValue::Integer(id)) => Some(*id),
                    _ => None,
                };
                rejected.push(RowRejection::new(
                    entity,
                    legacy_id,
                    format!(
                        "row has {} values for {} columns",
                        values.len(),
                        columns.len()
                    ),
                ));
                continue;
            }
            rows.push(LegacyRow::from_pairs(columns.iter().cloned().zip(values)));
        }

        rows
    }
}

/// Merges the parsed records that belong to `table` into one row set.
///
/// Returns `None`, after logging a warning, when no record matches or no
/// matching record carries a column list.
pub fn merge_records(table: LegacyTable, records: Vec<InsertRecord>) -> Option<RowSet> {
    let matching: Vec<InsertRecord> = records
        .into_iter()
        .filter(|record| table.matches(&record.table))
        .collect();

    if matching.is_empty() {
        warn!(table = table.name(), "No INSERT statements for table");
        return None;
    }

    let Some(base) = matching.iter().find(|record| !record.columns.is_empty()) else {
        warn!(table = table.name(), "No INSERT statement for table has a column list");
        return None;
    };

    let disagreeing = matching
        .iter()
        .filter(|record| !record.columns.is_empty() && record.columns != base.columns)
        .count();
    if disagreeing > 0 {
        warn!(
            table = table.name(),
            blocks = disagreeing,
            "INSERT blocks disagree on column order; \
             reading all of them with the first block's order"
        );
    }

    let columns = base
        .columns
        .iter()
        .map(|column| table.canonical_column(column))
        .collect();
    let rows = matching.into_iter().flat_map(|record| record.rows).collect();

    Some(RowSet { columns, rows })
}

/// Loads the row set of one table from `dir`.
///
/// A missing file is not an error: the table simply has no rows. Any other
/// failure to check for the file is.
pub async fn load_row_set(dir: &Path, table: LegacyTable) -> Result<Option<RowSet>, LoadError> {
    let path = dir.join(table.file_name());
    let exists = tokio::fs::try_exists(&path)
        .await
        .map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
    if !exists {
        warn!(table = table.name(), path = %path.display(), "Dump file not found, skipping table");
        return Ok(None);
    }

    let records = parse_sql_file(&path).await?;
    Ok(merge_records(table, records))
}

async fn load_table<T: FromLegacyRow>(
    dir: &Path,
    table: LegacyTable,
    rejected: &mut Vec<RowRejection>,
) -> Result<Vec<T>, LoadError> {
    let Some(row_set) = load_row_set(dir, table).await? else {
        return Ok(Vec::new());
    };

    let rows = row_set.into_legacy_rows(T::ENTITY, rejected);
    let mut typed = Vec::with_capacity(rows.len());
    for row in rows {
        match T::from_row(&row) {
            Ok(value) => typed.push(value),
            Err(e) => rejected.push(RowRejection::new(
                T::ENTITY,
                row.int("id").ok().flatten(),
                e.to_string(),
            )),
        }
    }

    info!(table = table.name(), rows = typed.len(), "Loaded legacy table");
    Ok(typed)
}

/// Loads every legacy table from a dump directory.
pub async fn load_legacy_data(dir: &Path) -> Result<LegacyData, LoadError> {
    let is_dir = tokio::fs::metadata(dir)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return Err(LoadError::MissingDirectory(dir.to_path_buf()));
    }

    let mut rejected = Vec::new();
    let regions = load_table(dir, LegacyTable::Regions, &mut rejected).await?;
    let networks = load_table(dir, LegacyTable::Networks, &mut rejected).await?;
    let locations = load_table(dir, LegacyTable::Locations, &mut rejected).await?;
    let base_stations = load_table(dir, LegacyTable::BaseStations, &mut rejected).await?;
    let cells = load_table(dir, LegacyTable::Cells, &mut rejected).await?;

    Ok(LegacyData {
        regions,
        networks,
        locations,
        base_stations,
        cells,
        rejected,
    })
}
