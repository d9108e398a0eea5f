use chrono::NaiveDateTime;

use super::value::{FieldError, LegacyRow};
use crate::errors::RowRejection;

/// Statically typed view over a loaded [`LegacyRow`].
pub trait FromLegacyRow: Sized {
    /// Entity label used in logs and rejections.
    const ENTITY: &'static str;

    fn from_row(row: &LegacyRow) -> Result<Self, FieldError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyRegion {
    pub id: i64,
    pub name: Option<String>,
}

impl FromLegacyRow for LegacyRegion {
    const ENTITY: &'static str = "region";

    fn from_row(row: &LegacyRow) -> Result<Self, FieldError> {
        Ok(Self {
            id: row.required_int("id")?,
            name: row.text("name"),
        })
    }
}

/// A legacy mobile network, the ancestor of an operator.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyNetwork {
    pub id: i64,
    pub name: Option<String>,
    pub mnc: Option<String>,
}

impl FromLegacyRow for LegacyNetwork {
    const ENTITY: &'static str = "network";

    fn from_row(row: &LegacyRow) -> Result<Self, FieldError> {
        Ok(Self {
            id: row.required_int("id")?,
            name: row.text("name"),
            mnc: row.text("mnc"),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyLocation {
    pub id: i64,
    pub region_id: Option<i64>,
    pub city: Option<String>,
    pub address: Option<String>,
    /// Sexagesimal string such as `52N15'30"`.
    pub latitude: Option<String>,
    /// Sexagesimal string such as `21E00'00"`.
    pub longitude: Option<String>,
}

impl FromLegacyRow for LegacyLocation {
    const ENTITY: &'static str = "location";

    fn from_row(row: &LegacyRow) -> Result<Self, FieldError> {
        Ok(Self {
            id: row.required_int("id")?,
            region_id: row.int("region_id")?,
            city: row.text("city"),
            address: row.text("address"),
            latitude: row.text("latitude"),
            longitude: row.text("longitude"),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyBaseStation {
    pub id: i64,
    pub network_id: Option<i64>,
    pub location_id: Option<i64>,
    pub station_code: Option<String>,
    pub gsm: bool,
    pub umts: bool,
    pub cdma: bool,
    pub lte: bool,
    pub nr: bool,
    pub iot: bool,
    pub status: Option<String>,
    pub edit_status: Option<String>,
    pub notes: Option<String>,
}

impl FromLegacyRow for LegacyBaseStation {
    const ENTITY: &'static str = "base station";

    fn from_row(row: &LegacyRow) -> Result<Self, FieldError> {
        Ok(Self {
            id: row.required_int("id")?,
            network_id: row.int("network_id")?,
            location_id: row.int("location_id")?,
            station_code: row.text("station_code"),
            gsm: row.flag("gsm")?,
            umts: row.flag("umts")?,
            cdma: row.flag("cdma")?,
            lte: row.flag("lte")?,
            nr: row.flag("nr")?,
            iot: row.flag("iot")?,
            status: row.text("status"),
            edit_status: row.text("edit_status"),
            notes: row.text("notes"),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyCell {
    pub id: i64,
    pub base_station_id: Option<i64>,
    pub standard: Option<String>,
    pub band: Option<String>,
    pub duplex: Option<String>,
    pub lac: Option<i32>,
    pub cid: Option<i64>,
    pub azimuth: Option<i32>,
    pub bsic: Option<i32>,
    pub rnc: Option<i32>,
    pub psc: Option<i32>,
    pub enbid: Option<i32>,
    pub pci: Option<i32>,
    pub tac: Option<i32>,
    pub gnbid: Option<i64>,
    pub nr_type: Option<String>,
    pub notes: Option<String>,
    pub is_confirmed: bool,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl FromLegacyRow for LegacyCell {
    const ENTITY: &'static str = "cell";

    fn from_row(row: &LegacyRow) -> Result<Self, FieldError> {
        Ok(Self {
            id: row.required_int("id")?,
            base_station_id: row.int("base_station_id")?,
            standard: row.text("standard"),
            band: row.text("band"),
            duplex: row.text("duplex"),
            lac: row.int32("lac")?,
            cid: row.int("cid")?,
            azimuth: row.int32("azimuth")?,
            bsic: row.int32("bsic")?,
            rnc: row.int32("rnc")?,
            psc: row.int32("psc")?,
            enbid: row.int32("enbid")?,
            pci: row.int32("pci")?,
            tac: row.int32("tac")?,
            gnbid: row.int("gnbid")?,
            nr_type: row.text("nr_type"),
            notes: row.text("notes"),
            is_confirmed: row.flag("is_confirmed")?,
            created_at: row.timestamp("created_at")?,
            updated_at: row.timestamp("updated_at")?,
        })
    }
}

/// Every legacy row set the migration consumes.
#[derive(Debug, Clone, Default)]
pub struct LegacyData {
    pub regions: Vec<LegacyRegion>,
    pub networks: Vec<LegacyNetwork>,
    pub locations: Vec<LegacyLocation>,
    pub base_stations: Vec<LegacyBaseStation>,
    pub cells: Vec<LegacyCell>,
    /// Rows dropped while loading: arity mismatches and unusable field values.
    pub rejected: Vec<RowRejection>,
}
