//! Canonical row types of the normalized registry.
mod enums;
mod rows;

pub use enums::{Duplex, EditStatus, Rat, StationStatus};
pub use rows::{
    CellDetails, GsmDetails, LteDetails, NewBand, NewCell, NewCellDetails, NewLocation,
    NewOperator, NewRegion, NewStation, NrDetails, StoredOperator, UmtsDetails,
};
