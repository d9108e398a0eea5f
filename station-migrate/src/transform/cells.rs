use std::collections::HashMap;

use station_registry_repository::types::{
    CellDetails, GsmDetails, LteDetails, NrDetails, Rat, UmtsDetails,
};

use super::{band_key, NotesCleaner, Prepared};
use crate::errors::RowRejection;
use crate::models::{CellDraft, LegacyBaseStation, LegacyCell};

/// Legacy station id -> legacy station row. Built once per run.
pub fn stations_by_id(stations: &[LegacyBaseStation]) -> HashMap<i64, &LegacyBaseStation> {
    stations.iter().map(|station| (station.id, station)).collect()
}

fn details(cell: &LegacyCell, rat: Rat) -> Option<CellDetails> {
    match rat {
        Rat::Gsm => Some(CellDetails::Gsm(GsmDetails { bsic: cell.bsic })),
        Rat::Umts => Some(CellDetails::Umts(UmtsDetails {
            rnc: cell.rnc,
            psc: cell.psc,
        })),
        Rat::Lte => Some(CellDetails::Lte(LteDetails {
            enbid: cell.enbid,
            pci: cell.pci,
            tac: cell.tac,
        })),
        Rat::Nr => Some(CellDetails::Nr(NrDetails {
            gnbid: cell.gnbid,
            pci: cell.pci,
            nr_type: cell.nr_type.clone(),
        })),
        Rat::Cdma | Rat::Iot => None,
    }
}

fn prepare_cell(
    cell: &LegacyCell,
    stations: &HashMap<i64, &LegacyBaseStation>,
    cleaner: &NotesCleaner,
) -> Result<CellDraft, String> {
    let station_id = cell.base_station_id.ok_or("missing base station")?;
    let station = stations
        .get(&station_id)
        .ok_or_else(|| format!("unknown base station {station_id}"))?;
    let band = band_key(cell)?;

    if let Some(azimuth) = cell.azimuth {
        if !(0..=360).contains(&azimuth) {
            return Err(format!("azimuth {azimuth} outside 0..=360"));
        }
    }

    Ok(CellDraft {
        legacy_id: cell.id,
        legacy_station_id: station_id,
        legacy_network_id: station.network_id,
        band,
        rat: band.standard,
        lac: cell.lac,
        cid: cell.cid,
        azimuth: cell.azimuth,
        notes: cell.notes.as_deref().and_then(|n| cleaner.clean(n)),
        is_confirmed: cell.is_confirmed,
        created_at: cell.created_at,
        updated_at: cell.updated_at,
        details: details(cell, band.standard),
    })
}

/// Maps legacy cells to drafts, attributing each to its legacy station.
pub fn prepare_cells(
    cells: &[LegacyCell],
    stations: &HashMap<i64, &LegacyBaseStation>,
    cleaner: &NotesCleaner,
) -> Prepared<CellDraft> {
    let mut prepared = Prepared::default();

    for cell in cells {
        match prepare_cell(cell, stations, cleaner) {
            Ok(draft) => prepared.items.push(draft),
            Err(reason) => prepared.reject(RowRejection::new("cell", cell.id, reason)),
        }
    }

    prepared
}
