//! Entity transformers.
//!
//! Pure functions from legacy rows to canonical drafts. Nothing here touches
//! the store; every function is deterministic in its input order.
//!
//! A row that fails validation is rejected, never coerced. Rejections carry
//! the legacy id and are returned next to the drafts so the executor can log
//! them for triage.
pub mod bands;
pub mod cells;
pub mod locations;
pub mod notes;
pub mod operators;
pub mod regions;
pub mod stations;

use crate::errors::RowRejection;

pub use bands::{band_key, classify_duplex, classify_standard, prepare_bands};
pub use cells::{prepare_cells, stations_by_id};
pub use locations::{parse_dms, prepare_locations, Axis, CoordinateError};
pub use notes::NotesCleaner;
pub use operators::prepare_operators;
pub use regions::prepare_regions;
pub use stations::prepare_stations;

/// Output of a transformer: the drafts plus the rows it refused.
#[derive(Debug, Clone, PartialEq)]
pub struct Prepared<T> {
    pub items: Vec<T>,
    pub rejected: Vec<RowRejection>,
}

impl<T> Default for Prepared<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

impl<T> Prepared<T> {
    fn reject(&mut self, rejection: RowRejection) {
        self.rejected.push(rejection);
    }
}
