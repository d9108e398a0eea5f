//! Data models for the migration: dump values, typed legacy rows and the
//! canonical drafts produced by the transformers.
mod drafts;
mod legacy;
mod value;

pub use drafts::{
    BandDraft, BandKey, CellDraft, LocationDraft, OperatorDraft, RegionDraft, StationDraft,
};
pub use legacy::{
    FromLegacyRow, LegacyBaseStation, LegacyCell, LegacyData, LegacyLocation, LegacyNetwork,
    LegacyRegion,
};
pub use value::{FieldError, LegacyRow, SqlValue};
