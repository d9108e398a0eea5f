use std::collections::{BTreeMap, HashMap};
use std::fmt;

use station_registry_repository::types::{NewCell, NewCellDetails, Rat};
use tracing::debug;

use super::{batch_count, IdMap, RegistryWriter};
use crate::errors::{RowRejection, WriteError};
use crate::migration::MigrationPhase;
use crate::models::{BandKey, CellDraft};
use crate::progress::ProgressReporter;

/// Rows written by [`RegistryWriter::write_cells_and_details`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellWriteSummary {
    pub cells: usize,
    /// Detail rows written per RAT.
    pub details: BTreeMap<Rat, u64>,
}

impl RegistryWriter<'_> {
    /// Writes base cells, then their per-RAT detail rows keyed by the new
    /// cell ids.
    ///
    /// Expects `phase` at [`MigrationPhase::CellsBase`] and advances it
    /// through the detail sub-phases, each its own phase on `progress`. On
    /// error `phase` names the sub-phase that failed.
    pub async fn write_cells_and_details(
        &self,
        drafts: &[CellDraft],
        stations: &IdMap,
        bands: &HashMap<BandKey, i64>,
        phase: &mut MigrationPhase,
        progress: &mut dyn ProgressReporter,
        rejected: &mut Vec<RowRejection>,
    ) -> Result<CellWriteSummary, WriteError> {
        let written = self
            .insert_chunks("cell", drafts, progress, rejected, |draft| {
                let unresolved = |what: &str, key: &dyn fmt::Display| {
                    RowRejection::new("cell", draft.legacy_id, format!("unresolved {what} {key}"))
                };
                let station_id = stations
                    .get(&draft.legacy_station_id)
                    .ok_or_else(|| unresolved("station", &draft.legacy_station_id))?;
                let band_id = bands
                    .get(&draft.band)
                    .ok_or_else(|| unresolved("band", &draft.band))?;
                Ok(NewCell {
                    legacy_id: draft.legacy_id,
                    station_id: *station_id,
                    band_id: *band_id,
                    rat: draft.rat,
                    lac: draft.lac,
                    cid: draft.cid,
                    azimuth: draft.azimuth,
                    notes: draft.notes.clone(),
                    is_confirmed: draft.is_confirmed,
                    created_at: draft.created_at,
                    updated_at: draft.updated_at,
                })
            })
            .await?;

        let mut by_rat: BTreeMap<Rat, Vec<NewCellDetails>> = BTreeMap::new();
        for (draft, cell_id) in &written {
            if let Some(details) = &draft.details {
                by_rat.entry(details.rat()).or_default().push(NewCellDetails {
                    cell_id: *cell_id,
                    details: details.clone(),
                });
            }
        }

        let mut summary = CellWriteSummary {
            cells: written.len(),
            details: BTreeMap::new(),
        };
        while let Some(rat) = phase.next().detail_rat() {
            *phase = phase.next();
            let rows = by_rat.remove(&rat).unwrap_or_default();
            progress.begin_phase(phase.label(), rows.len().max(1));
            let count = self.write_details(*phase, &rows, progress).await?;
            summary.details.insert(rat, count);
        }

        Ok(summary)
    }

    async fn write_details(
        &self,
        phase: MigrationPhase,
        rows: &[NewCellDetails],
        progress: &mut dyn ProgressReporter,
    ) -> Result<u64, WriteError> {
        let entity = phase.label();
        let batches = batch_count(rows.len(), self.batch_size);
        let mut written = 0;

        for (batch_idx, chunk) in rows.chunks(self.batch_size).enumerate() {
            let batch = batch_idx + 1;
            written += self
                .store
                .insert_cell_details(chunk)
                .await
                .map_err(|source| WriteError {
                    entity,
                    batch,
                    batches,
                    source,
                })?;
            debug!(entity, batch, batches, rows = chunk.len(), "Wrote batch");
            progress.advance(chunk.len());
        }

        Ok(written)
    }
}
