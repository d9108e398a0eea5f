use chrono::NaiveDateTime;

use super::enums::{Duplex, EditStatus, Rat, StationStatus};

#[derive(Debug, Clone, PartialEq)]
pub struct NewRegion {
    pub name: String,
}

/// An operator as first written. Parent links are set in a second pass once
/// both sides of the relationship have ids.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOperator {
    pub name: String,
    pub mnc: String,
}

/// An operator read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredOperator {
    pub id: i64,
    pub name: String,
    pub mnc: String,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLocation {
    pub legacy_id: i64,
    pub region_id: i64,
    pub city: Option<String>,
    pub address: Option<String>,
    /// Decimal degrees, positive north.
    pub latitude: f64,
    /// Decimal degrees, positive east.
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBand {
    /// Composite identity, e.g. `GSM:900:FDD`.
    pub key: String,
    pub standard: Rat,
    /// Nominal frequency in MHz.
    pub frequency: i32,
    pub duplex: Option<Duplex>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewStation {
    pub legacy_id: i64,
    pub operator_id: i64,
    pub location_id: i64,
    pub station_code: String,
    pub status: StationStatus,
    pub edit_status: EditStatus,
    pub rats: Vec<Rat>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCell {
    pub legacy_id: i64,
    pub station_id: i64,
    pub band_id: i64,
    pub rat: Rat,
    pub lac: Option<i32>,
    pub cid: Option<i64>,
    pub azimuth: Option<i32>,
    pub notes: Option<String>,
    pub is_confirmed: bool,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GsmDetails {
    pub bsic: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UmtsDetails {
    pub rnc: Option<i32>,
    pub psc: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LteDetails {
    pub enbid: Option<i32>,
    pub pci: Option<i32>,
    pub tac: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NrDetails {
    pub gnbid: Option<i64>,
    pub pci: Option<i32>,
    pub nr_type: Option<String>,
}

/// Fields that only exist for one radio access technology.
#[derive(Debug, Clone, PartialEq)]
pub enum CellDetails {
    Gsm(GsmDetails),
    Umts(UmtsDetails),
    Lte(LteDetails),
    Nr(NrDetails),
}

impl CellDetails {
    pub fn rat(&self) -> Rat {
        match self {
            CellDetails::Gsm(_) => Rat::Gsm,
            CellDetails::Umts(_) => Rat::Umts,
            CellDetails::Lte(_) => Rat::Lte,
            CellDetails::Nr(_) => Rat::Nr,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCellDetails {
    pub cell_id: i64,
    pub details: CellDetails,
}
