use std::fmt;

use chrono::NaiveDateTime;
use station_registry_repository::types::{
    CellDetails, Duplex, EditStatus, NewBand, Rat, StationStatus,
};

/// A region folded from one or more legacy regions sharing a name.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionDraft {
    pub name: String,
    pub legacy_ids: Vec<i64>,
}

/// An operator folded from every legacy network sharing an MNC.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorDraft {
    pub name: String,
    pub mnc: String,
    /// Business key of the parent operator, linked after all operators exist.
    pub parent_mnc: Option<String>,
    pub legacy_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationDraft {
    pub legacy_id: i64,
    pub legacy_region_id: i64,
    pub city: Option<String>,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

/// Composite identity of a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BandKey {
    pub standard: Rat,
    pub frequency: i32,
    pub duplex: Option<Duplex>,
}

impl fmt::Display for BandKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.standard, self.frequency)?;
        match self.duplex {
            Some(duplex) => write!(f, ":{duplex}"),
            None => f.write_str(":-"),
        }
    }
}

/// A band synthesized from the cells that reference it.
#[derive(Debug, Clone, PartialEq)]
pub struct BandDraft {
    pub key: BandKey,
}

impl BandDraft {
    pub fn to_row(&self) -> NewBand {
        NewBand {
            key: self.key.to_string(),
            standard: self.key.standard,
            frequency: self.key.frequency,
            duplex: self.key.duplex,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationDraft {
    pub legacy_id: i64,
    pub legacy_network_id: i64,
    pub legacy_location_id: i64,
    pub station_code: String,
    pub status: StationStatus,
    pub edit_status: EditStatus,
    pub rats: Vec<Rat>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellDraft {
    pub legacy_id: i64,
    pub legacy_station_id: i64,
    /// Network of the parent station, carried for operator-scoped duplicate checks.
    pub legacy_network_id: Option<i64>,
    pub band: BandKey,
    pub rat: Rat,
    pub lac: Option<i32>,
    pub cid: Option<i64>,
    pub azimuth: Option<i32>,
    pub notes: Option<String>,
    pub is_confirmed: bool,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
    pub details: Option<CellDetails>,
}
